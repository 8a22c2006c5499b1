//! TUI (Terminal User Interface) module for the chess viewer.
//!
//! This module provides a full-featured terminal interface using ratatui,
//! supporting keyboard navigation, mouse input, and live engine analysis.

use viewer_core::{GameTree, UciEngine};

mod app;
mod event;
mod render;
mod surface;
mod widgets;

use app::App;

/// Runs the TUI until the user quits.
pub fn run(
    tree: GameTree,
    engine: Option<UciEngine>,
    always_show_menu: bool,
) -> Result<(), String> {
    let app = App::new(tree, engine, always_show_menu);

    let terminal = ratatui::init();
    let result = app.run(terminal);
    ratatui::restore();

    result.map_err(|e| e.to_string())
}
