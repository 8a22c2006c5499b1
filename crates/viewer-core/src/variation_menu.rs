//! Variation selection menu.
//!
//! The menu lists the variations of the current node as stacked rows that
//! start at the highlighted history row. It is either closed, or open with
//! one row emphasised.

use crate::game_tree::{GameTree, NodeId};
use crate::surface::{DrawSurface, PanelLayout, Point, Rect, palette};

/// Maximum number of rows the menu shows.
pub const MAX_MENU_ROWS: usize = 14;

/// Maximum number of upward shifts applied to fit the menu in the panel.
const MAX_SHIFTS: usize = 20;

/// State of the variation menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VariationMenu {
    open: bool,
    emphasis: Option<usize>,
    anchor_y: i32,
}

impl VariationMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Index of the emphasised row, if any.
    pub fn emphasis(&self) -> Option<usize> {
        self.emphasis
    }

    /// Top of the first row before any shifting.
    pub fn anchor_y(&self) -> i32 {
        self.anchor_y
    }

    /// Opens the menu at `anchor_y` with the first row emphasised.
    ///
    /// Nodes with fewer than two variations have nothing to choose from, and
    /// the menu stays closed. Returns whether the menu is open.
    pub fn open(&mut self, anchor_y: i32, variations: usize) -> bool {
        if variations < 2 {
            return false;
        }
        self.open = true;
        self.emphasis = Some(0);
        self.anchor_y = anchor_y;
        true
    }

    pub fn close(&mut self) {
        self.open = false;
        self.emphasis = None;
    }

    /// Emphasises the next row, wrapping after the last shown row.
    pub fn next(&mut self, variations: usize) {
        let shown = variations.min(MAX_MENU_ROWS);
        if !self.open || shown == 0 {
            return;
        }
        self.emphasis = Some(self.emphasis.map_or(0, |i| (i + 1) % shown));
    }

    /// Emphasises the previous row, wrapping before the first.
    pub fn previous(&mut self, variations: usize) {
        let shown = variations.min(MAX_MENU_ROWS);
        if !self.open || shown == 0 {
            return;
        }
        self.emphasis = Some(self.emphasis.map_or(0, |i| (i + shown - 1) % shown));
    }

    /// Sets the emphasis to whatever row is under `point`.
    pub fn hover(&mut self, point: Point, layout: &PanelLayout, variations: usize) {
        if self.open {
            self.emphasis = item_at(&self.row_rects(layout, variations), point);
        }
    }

    /// Row rectangles for `variations` rows starting at the anchor.
    pub fn row_rects(&self, layout: &PanelLayout, variations: usize) -> Vec<Rect> {
        menu_rows(layout, self.anchor_y, variations)
    }

    /// Draws rows labelled with `node`'s variations, starting at `top`.
    ///
    /// The open menu passes its anchor; a closed menu that is always shown
    /// passes the current highlight position.
    pub fn render<S: DrawSurface>(
        &self,
        surface: &mut S,
        layout: &PanelLayout,
        tree: &GameTree,
        node: NodeId,
        top: i32,
    ) {
        let variations = tree.variations(node);
        if variations.len() < 2 {
            return;
        }
        let rows = menu_rows(layout, top, variations.len());
        for (i, (&child, rect)) in variations.iter().zip(&rows).enumerate() {
            let color = if self.emphasis == Some(i) {
                palette::MENU_EMPHASIS
            } else {
                palette::MENU_ROW
            };
            surface.fill_rect(*rect, color);
            let label = tree.variation_label(child);
            let x = layout.centered_x(surface, &label);
            surface.draw_text(
                &label,
                Point::new(x, rect.top + layout.menu_text_offset),
                palette::TEXT,
                color,
            );
        }
    }
}

/// Lays out up to [`MAX_MENU_ROWS`] rows from `top`, shifted up until they
/// fit inside the move panel.
pub fn menu_rows(layout: &PanelLayout, top: i32, variations: usize) -> Vec<Rect> {
    let panel = layout.moves_panel;
    let height = layout.row_height;
    let mut rows: Vec<Rect> = (0..variations.min(MAX_MENU_ROWS) as i32)
        .map(|i| {
            let row_top = top + i * height;
            Rect::new(panel.left, row_top, panel.right, row_top + height)
        })
        .collect();

    for _ in 0..MAX_SHIFTS {
        match rows.last() {
            Some(last) if last.bottom > panel.bottom => {
                for row in &mut rows {
                    *row = row.shifted_up(height);
                }
            }
            _ => break,
        }
    }
    rows
}

/// Index of the first row containing `point`.
pub fn item_at(rows: &[Rect], point: Point) -> Option<usize> {
    rows.iter().position(|row| row.contains(point))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_requires_two_variations() {
        let mut menu = VariationMenu::new();
        assert!(!menu.open(75, 1));
        assert!(!menu.is_open());
        assert!(menu.open(75, 2));
        assert_eq!(menu.emphasis(), Some(0));
        assert_eq!(menu.anchor_y(), 75);
    }

    #[test]
    fn test_next_and_previous_wrap() {
        let mut menu = VariationMenu::new();
        menu.open(75, 5);
        let mut seen = Vec::new();
        for _ in 0..5 {
            menu.next(5);
            seen.push(menu.emphasis().unwrap());
        }
        assert_eq!(seen, [1, 2, 3, 4, 0]);
        menu.previous(5);
        assert_eq!(menu.emphasis(), Some(4));
    }

    #[test]
    fn test_cycling_is_limited_to_shown_rows() {
        let mut menu = VariationMenu::new();
        menu.open(75, 20);
        for _ in 0..13 {
            menu.next(20);
        }
        assert_eq!(menu.emphasis(), Some(13));
        menu.next(20);
        assert_eq!(menu.emphasis(), Some(0));
        menu.previous(20);
        assert_eq!(menu.emphasis(), Some(13));
    }

    #[test]
    fn test_next_from_no_emphasis_starts_at_first_row() {
        let layout = PanelLayout::default();
        let mut menu = VariationMenu::new();
        menu.open(75, 3);
        menu.hover(Point::new(0, 0), &layout, 3);
        assert_eq!(menu.emphasis(), None);
        menu.next(3);
        assert_eq!(menu.emphasis(), Some(0));
    }

    #[test]
    fn test_closed_menu_ignores_cycling() {
        let mut menu = VariationMenu::new();
        menu.next(4);
        assert_eq!(menu.emphasis(), None);
        menu.open(75, 4);
        menu.close();
        assert!(!menu.is_open());
        assert_eq!(menu.emphasis(), None);
    }

    #[test]
    fn test_rows_stack_from_anchor() {
        let layout = PanelLayout::default();
        let rows = menu_rows(&layout, 105, 3);
        assert_eq!(
            rows,
            [
                Rect::new(580, 105, 750, 135),
                Rect::new(580, 135, 750, 165),
                Rect::new(580, 165, 750, 195),
            ]
        );
    }

    #[test]
    fn test_rows_shift_up_to_fit_panel() {
        let layout = PanelLayout::default();
        let rows = menu_rows(&layout, 495, 4);
        assert_eq!(rows.len(), 4);
        assert!(rows.last().unwrap().bottom <= layout.moves_panel.bottom);
        assert_eq!(rows[0].top, 435);
    }

    #[test]
    fn test_shifting_is_bounded() {
        let layout = PanelLayout::default();
        let rows = menu_rows(&layout, 5_000, 2);
        assert_eq!(rows[0].top, 5_000 - 20 * 30);
    }

    #[test]
    fn test_menu_shows_at_most_fourteen_rows() {
        let layout = PanelLayout::default();
        assert_eq!(menu_rows(&layout, 75, 30).len(), MAX_MENU_ROWS);
    }

    #[test]
    fn test_item_at_uses_half_open_rows() {
        let layout = PanelLayout::default();
        let rows = menu_rows(&layout, 105, 3);
        assert_eq!(item_at(&rows, Point::new(600, 105)), Some(0));
        assert_eq!(item_at(&rows, Point::new(600, 135)), Some(1));
        assert_eq!(item_at(&rows, Point::new(600, 194)), Some(2));
        assert_eq!(item_at(&rows, Point::new(600, 195)), None);
        assert_eq!(item_at(&rows, Point::new(750, 120)), None);
    }
}
