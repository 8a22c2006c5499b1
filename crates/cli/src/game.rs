//! Loading the game to view from command-line options.

use std::fs;

use log::debug;
use shakmaty::Chess;
use viewer_core::{GameTree, movetext};

use crate::GameParams;

/// Builds the game tree from the start position and movetext options.
///
/// # Errors
///
/// Returns an error message for an invalid FEN, an unreadable movetext file
/// or malformed movetext.
pub fn load(params: &GameParams) -> Result<GameTree, String> {
    let start = match params.fen.as_deref() {
        Some(fen) => movetext::position_from_fen(fen).map_err(|e| e.to_string())?,
        None => Chess::default(),
    };

    let text = match (&params.moves, &params.moves_file) {
        (Some(moves), _) => moves.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?,
        (None, None) => String::new(),
    };

    let tree = movetext::parse(&text, start).map_err(|e| e.to_string())?;
    debug!("loaded game with {} positions", tree.node_count());
    Ok(tree)
}
