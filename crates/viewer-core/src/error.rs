//! Error types for the viewer core.

use std::io;

use thiserror::Error;

/// Errors raised while loading games or talking to an analysis engine.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// I/O error while talking to the engine process
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The engine misbehaved or answered something unexpected
    #[error("Engine error: {0}")]
    Engine(String),

    /// The engine session is gone (process exited or pipe closed)
    #[error("Engine session closed")]
    Closed,

    /// A movetext token could not be parsed or played
    #[error("Movetext error at token {index}: {message}")]
    Movetext { index: usize, message: String },

    /// A FEN string or position was rejected
    #[error("Position error: {0}")]
    Position(String),
}

impl ViewerError {
    /// Returns true when the error means the engine went away underneath us.
    ///
    /// A background analysis task that hits one of these while being torn
    /// down has nothing left to report.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ViewerError::Closed => true,
            ViewerError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
            ),
            _ => false,
        }
    }
}

/// Result type alias for viewer operations.
pub type Result<T> = std::result::Result<T, ViewerError>;
