//! Interactive TUI (Terminal User Interface) for the game viewer.

use viewer_core::{GameTree, UciEngine};

use crate::tui;

/// Main TUI loop.
///
/// Runs the terminal user interface over `tree`, with engine analysis
/// available when `engine` is given.
///
/// # Arguments
/// * `tree` - The game to view
/// * `engine` - Optional UCI engine for analysis
/// * `always_show_menu` - Draw the variation rows even while the menu is closed
pub fn ui_loop(
    tree: GameTree,
    engine: Option<UciEngine>,
    always_show_menu: bool,
) -> Result<(), String> {
    tui::run(tree, engine, always_show_menu)
}
