//! Analysis and navigation core of a chess game viewer.
//!
//! The crate models a game as a tree of variations, resolves which line is
//! shown from a [`VariationPath`], keeps a scrolling move-history window in
//! view of the current move, drives a variation selection menu, and streams
//! multi-PV engine analysis from a background thread into a sink.

pub mod analysis;
pub mod controller;
pub mod engine;
pub mod error;
pub mod game_tree;
pub mod history;
pub mod movetext;
pub mod surface;
pub mod variation_menu;
pub mod variation_path;
pub mod viewer;

pub use analysis::{AnalysisLine, AnalysisQueue, AnalysisSink, Score, SharedLines};
pub use controller::{AnalysisController, CancelToken};
pub use engine::{AnalysisUpdate, EngineSession, UciEngine};
pub use error::{Result, ViewerError};
pub use game_tree::{GameTree, NodeId};
pub use history::{HistoryLine, HistoryPane, MoveCursor};
pub use surface::{DrawSurface, PanelLayout, Point, Rect, Rgb};
pub use variation_menu::VariationMenu;
pub use variation_path::VariationPath;
pub use viewer::{Key, Viewer, ViewerOptions};
