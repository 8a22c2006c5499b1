//! Move history formatting and the auto-scrolling history window.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::game_tree::{GameTree, NodeId};
use crate::surface::{DrawSurface, PanelLayout, Point, Rect, palette};

/// Number of rows the history panel shows.
pub const HISTORY_ROWS: usize = 15;

/// Pairs kept on each side of the current pair while centring.
const CENTER_RADIUS: i64 = 8;

/// Width of a blank padding row.
const BLANK_WIDTH: usize = 20;

/// Position of the viewer in the game, in full moves.
///
/// Each half-move advances the cursor by 0.5, so the value is always a
/// multiple of one half. It is stored as a ply count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MoveCursor {
    ply: u32,
}

impl MoveCursor {
    pub const fn from_ply(ply: u32) -> Self {
        Self { ply }
    }

    pub fn ply(self) -> u32 {
        self.ply
    }

    pub fn value(self) -> f64 {
        f64::from(self.ply) / 2.0
    }

    /// Moves forward by one half-move.
    pub fn advance(&mut self) {
        self.ply += 1;
    }

    /// Moves back by one half-move, stopping at zero.
    pub fn retreat(&mut self) {
        self.ply = self.ply.saturating_sub(1);
    }

    /// `floor(cursor)`: the number of completed full moves.
    pub fn full_moves(self) -> i64 {
        i64::from(self.ply / 2)
    }

    /// `floor(cursor - 0.5)`: index of the pair holding the current move.
    ///
    /// At the start of the game this is `-1`.
    pub fn current_pair(self) -> i64 {
        (i64::from(self.ply) - 1).div_euclid(2)
    }
}

impl From<f64> for MoveCursor {
    /// Rounds `value` to the nearest half-move; negative values clamp to zero.
    fn from(value: f64) -> Self {
        let ply = (value * 2.0).round().max(0.0);
        Self { ply: ply as u32 }
    }
}

impl fmt::Display for MoveCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// One row of the move history: a numbered move pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLine {
    /// Display text, `"*"`-prefixed when either move has alternatives
    pub text: String,
    /// Whether either move of the pair is a branch point
    pub branch: bool,
    /// Whether this row holds the current move
    pub current: bool,
}

impl HistoryLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            branch: false,
            current: false,
        }
    }

    /// A padding row of blank characters.
    pub fn blank() -> Self {
        Self::new(" ".repeat(BLANK_WIDTH))
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl fmt::Display for HistoryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Formats the visible line as numbered move pairs.
///
/// Pairs are numbered from 1 in the order they appear. A pair is prefixed
/// with `"*"` when either of its moves has more than one continuation.
/// Exactly one pair is marked current. When the cursor is at the start or
/// past the end of the line, the last pair is marked.
pub fn format_move_history<I>(tree: &GameTree, nodes: I, cursor: MoveCursor) -> Vec<HistoryLine>
where
    I: IntoIterator<Item = NodeId>,
{
    let nodes: Vec<NodeId> = nodes.into_iter().collect();
    let mut lines: Vec<HistoryLine> = nodes
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| {
            let branch = pair.iter().any(|&id| tree.variations(id).len() > 1);
            let moves: Vec<&str> = pair.iter().map(|&id| tree.san(id)).collect();
            let text = format!("{}. {}", i + 1, moves.join(" "));
            HistoryLine {
                text: if branch { format!("*{text}") } else { text },
                branch,
                current: false,
            }
        })
        .collect();

    let marked = usize::try_from(cursor.current_pair())
        .ok()
        .filter(|&pair| pair < lines.len())
        .or_else(|| lines.len().checked_sub(1));
    if let Some(line) = marked.and_then(|pair| lines.get_mut(pair)) {
        line.current = true;
    }
    lines
}

/// Selects the rows shown in the history panel.
///
/// Short histories are padded with blank rows to [`HISTORY_ROWS`]. Longer
/// ones show the first rows near the start of the game, a window centred on
/// the current pair in the middle, and the last rows near the end. The result
/// always has exactly [`HISTORY_ROWS`] entries.
pub fn history_window(lines: &[HistoryLine], cursor: MoveCursor) -> Vec<HistoryLine> {
    let total = lines.len();
    let full = cursor.full_moves();

    let mut window: Vec<HistoryLine> = if total < HISTORY_ROWS {
        let mut padded = lines.to_vec();
        padded.resize_with(HISTORY_ROWS, HistoryLine::blank);
        padded
    } else if CENTER_RADIUS <= full && full < total as i64 - CENTER_RADIUS {
        let pair = cursor.current_pair();
        let start = (pair - CENTER_RADIUS).clamp(0, total as i64) as usize;
        let end = (pair + CENTER_RADIUS).clamp(start as i64, total as i64) as usize;
        lines[start..end].to_vec()
    } else if full < CENTER_RADIUS {
        lines[..HISTORY_ROWS].to_vec()
    } else {
        lines.to_vec()
    };

    let excess = window.len().saturating_sub(HISTORY_ROWS);
    window.drain(..excess);
    window
}

/// Draws the history rows into the move panel.
///
/// Returns the top of the highlight bar drawn behind the current row, which
/// anchors the variation menu.
pub fn render_history<S: DrawSurface>(
    surface: &mut S,
    layout: &PanelLayout,
    rows: &[HistoryLine],
) -> Option<i32> {
    let panel = layout.moves_panel;
    surface.fill_rect(panel, palette::PANEL);

    let mut anchor = None;
    for (i, row) in rows.iter().enumerate() {
        let y = layout.first_row_y + i as i32 * layout.row_height;
        let background = if row.current {
            let top = y + layout.highlight_offset;
            surface.fill_rect(
                Rect::new(panel.left, top, panel.right, top + layout.row_height),
                palette::HIGHLIGHT,
            );
            anchor = Some(top);
            palette::HIGHLIGHT
        } else {
            palette::PANEL
        };
        let text = row.text.trim();
        let x = layout.centered_x(surface, text);
        surface.draw_text(text, Point::new(x, y), palette::TEXT, background);
    }
    anchor
}

/// Cached history rows, rebuilt only after the game state changed.
///
/// The lock covers the check and the rebuild together, so a render never
/// sees half-built rows.
#[derive(Debug)]
pub struct HistoryPane {
    cache: Mutex<HistoryCache>,
}

#[derive(Debug)]
struct HistoryCache {
    changed: bool,
    rows: Vec<HistoryLine>,
}

impl Default for HistoryPane {
    fn default() -> Self {
        Self {
            cache: Mutex::new(HistoryCache {
                changed: true,
                rows: Vec::new(),
            }),
        }
    }
}

impl HistoryPane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags the cached rows as stale.
    pub fn mark_changed(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .changed = true;
    }

    pub fn is_changed(&self) -> bool {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .changed
    }

    /// Returns the cached rows, rebuilding them with `rebuild` if stale.
    pub fn rows<F>(&self, rebuild: F) -> Vec<HistoryLine>
    where
        F: FnOnce() -> Vec<HistoryLine>,
    {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if cache.changed {
            cache.rows = rebuild();
            cache.changed = false;
        }
        cache.rows.clone()
    }
}
