//! Analysis line formatting, batching and display.
//!
//! Engine updates arrive one PV at a time. [`AnalysisQueue`] turns them into
//! display lines from White's point of view and hands them to an
//! [`AnalysisSink`] in complete batches of [`MULTI_PV`] lines, so the display
//! never shows a mix of old and new lines.

use std::fmt;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};

use shakmaty::{Chess, Color, Position, san::SanPlus, uci::UciMove};

pub use crate::engine::Score;
use crate::engine::AnalysisUpdate;
use crate::surface::{DrawSurface, PanelLayout, Point, palette};

/// Number of principal variations requested and shown per batch.
pub const MULTI_PV: usize = 3;

/// Swaps the first sign of a score text.
///
/// `"+35"` becomes `"-35"` and `"#-2"` becomes `"#+2"`. Text without a sign,
/// such as `"0"`, is returned unchanged.
pub fn flip_eval(text: &str) -> String {
    if text.contains('+') {
        text.replacen('+', "-", 1)
    } else if text.contains('-') {
        text.replacen('-', "+", 1)
    } else {
        text.to_string()
    }
}

/// Formats `pv` as numbered SAN starting from `position`.
///
/// A line starting with a black move is numbered `"N..."`. The line stops
/// at the first move that is not legal in its position.
pub fn variation_san(position: &Chess, pv: &[UciMove]) -> String {
    let mut position = position.clone();
    let mut parts = Vec::with_capacity(pv.len() * 3 / 2);

    for (i, uci) in pv.iter().enumerate() {
        let Ok(mv) = uci.to_move(&position) else {
            break;
        };
        let number = position.fullmoves().get();
        match position.turn() {
            Color::White => parts.push(format!("{number}.")),
            Color::Black if i == 0 => parts.push(format!("{number}...")),
            Color::Black => {}
        }
        parts.push(SanPlus::from_move_and_play_unchecked(&mut position, &mv).to_string());
    }

    parts.join(" ")
}

/// One displayed analysis line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisLine {
    /// Score text from White's point of view
    pub score: String,
    pub depth: u32,
    /// Principal variation in numbered SAN
    pub san: String,
}

impl AnalysisLine {
    /// Builds a display line from an engine update for `position`.
    ///
    /// Returns `None` if the update carries no score. Engines report scores
    /// for the side to move, so the sign is flipped when Black is to move.
    pub fn from_update(update: &AnalysisUpdate, position: &Chess) -> Option<Self> {
        let score = update.score?.to_string();
        let score = match position.turn() {
            Color::White => score,
            Color::Black => flip_eval(&score),
        };
        Some(Self {
            score,
            depth: update.depth,
            san: variation_san(position, &update.pv),
        })
    }
}

impl fmt::Display for AnalysisLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.score, self.depth, self.san)
    }
}

/// Receiver of complete analysis batches.
pub trait AnalysisSink: Send {
    /// Replaces whatever is displayed with `batch`.
    fn show(&mut self, batch: &[AnalysisLine]);

    /// Removes any displayed lines.
    fn clear(&mut self) {}
}

impl AnalysisSink for Sender<Vec<AnalysisLine>> {
    fn show(&mut self, batch: &[AnalysisLine]) {
        let _ = self.send(batch.to_vec());
    }
}

/// Display lines shared between the analysis thread and the renderer.
#[derive(Debug, Clone, Default)]
pub struct SharedLines {
    lines: Arc<Mutex<Vec<AnalysisLine>>>,
}

impl SharedLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the lines currently shown.
    pub fn snapshot(&self) -> Vec<AnalysisLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AnalysisSink for SharedLines {
    fn show(&mut self, batch: &[AnalysisLine]) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        lines.clear();
        lines.extend_from_slice(batch);
    }

    fn clear(&mut self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Collects analysis lines and flushes them to a sink in batches.
#[derive(Debug)]
pub struct AnalysisQueue<S> {
    pending: Vec<AnalysisLine>,
    sink: S,
}

impl<S: AnalysisSink> AnalysisQueue<S> {
    pub fn new(sink: S) -> Self {
        Self {
            pending: Vec::with_capacity(MULTI_PV),
            sink,
        }
    }

    /// Queues the line for `update`, flushing once [`MULTI_PV`] lines are
    /// pending.
    ///
    /// Updates without a score are ignored. Returns whether a line was queued.
    pub fn add(&mut self, update: &AnalysisUpdate, position: &Chess) -> bool {
        let Some(line) = AnalysisLine::from_update(update, position) else {
            return false;
        };
        self.pending.push(line);
        if self.pending.len() == MULTI_PV {
            self.sink.show(&self.pending);
            self.pending.clear();
        }
        true
    }

    /// Drops pending lines without showing them.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn pending(&self) -> &[AnalysisLine] {
        &self.pending
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Splits `text` into parts of at most `width` characters.
fn wrap(text: &str, width: usize) -> Vec<&str> {
    if text.is_empty() || width == 0 {
        return vec![text];
    }
    let mut parts = Vec::new();
    let mut start = 0;
    for (count, (offset, _)) in text.char_indices().enumerate() {
        if count > 0 && count % width == 0 {
            parts.push(&text[start..offset]);
            start = offset;
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Draws numbered analysis lines into the engine panel.
pub fn render_analysis<S: DrawSurface>(surface: &mut S, layout: &PanelLayout, lines: &[AnalysisLine]) {
    surface.fill_rect(layout.engine_panel, palette::PANEL);
    let origin = layout.engine_origin;
    for (i, line) in lines.iter().enumerate() {
        let text = format!("{} {line}", i + 1);
        let y = origin.y + (i as i32 + 1) * layout.engine_line_spacing;
        for (j, part) in wrap(&text, layout.engine_wrap_width).into_iter().enumerate() {
            surface.draw_text(
                part,
                Point::new(origin.x, y + j as i32 * layout.engine_wrap_spacing),
                palette::ENGINE_TEXT,
                palette::PANEL,
            );
        }
    }
}
