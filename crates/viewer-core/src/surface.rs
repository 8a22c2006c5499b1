//! Drawing primitives shared by the panels.
//!
//! Panels never talk to a graphics backend directly. They draw through
//! [`DrawSurface`], which a frontend implements over pixels or terminal cells.
//! Coordinates are plain integers in whatever unit the frontend uses, and a
//! [`PanelLayout`] says where each panel lives in those units.

/// A point on the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle, half-open on the right and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Returns true if `point` lies inside the rectangle.
    ///
    /// Stacked rows share an edge, so the bottom edge belongs to the next row.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }

    /// Returns the rectangle moved up by `dy`.
    pub fn shifted_up(&self, dy: i32) -> Self {
        Self::new(self.left, self.top - dy, self.right, self.bottom - dy)
    }
}

/// An RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Colours used by the panels.
pub mod palette {
    use super::Rgb;

    pub const PANEL: Rgb = Rgb(21, 21, 21);
    pub const HIGHLIGHT: Rgb = Rgb(0, 0, 0);
    pub const MENU_ROW: Rgb = Rgb(0, 0, 0);
    pub const MENU_EMPHASIS: Rgb = Rgb(42, 42, 42);
    pub const TEXT: Rgb = Rgb(255, 255, 255);
    pub const ENGINE_TEXT: Rgb = Rgb(234, 234, 234);
}

/// A target the panels can draw on.
pub trait DrawSurface {
    /// Fills `rect` with a solid colour.
    fn fill_rect(&mut self, rect: Rect, color: Rgb);

    /// Draws a single line of text with its top-left corner at `origin`.
    fn draw_text(&mut self, text: &str, origin: Point, fg: Rgb, bg: Rgb);

    /// Width of `text` in surface units.
    fn text_width(&self, text: &str) -> i32 {
        text.chars().count() as i32
    }
}

/// Geometry of the move and analysis panels.
///
/// The defaults are the pixel layout of a 800x800 window; a terminal frontend
/// supplies its own values in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLayout {
    /// Area of the move history panel
    pub moves_panel: Rect,
    /// Top of the first history row
    pub first_row_y: i32,
    /// Height of one history row and of one menu row
    pub row_height: i32,
    /// Offset from a row's text to the top of its highlight bar
    pub highlight_offset: i32,
    /// Offset from a menu row's top to its label
    pub menu_text_offset: i32,
    /// Area of the engine analysis panel
    pub engine_panel: Rect,
    /// Origin of the analysis text
    pub engine_origin: Point,
    /// Vertical distance between analysis lines
    pub engine_line_spacing: i32,
    /// Vertical distance between wrapped parts of one analysis line
    pub engine_wrap_spacing: i32,
    /// Number of characters per wrapped analysis part
    pub engine_wrap_width: usize,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            moves_panel: Rect::new(580, 65, 750, 555),
            first_row_y: 80,
            row_height: 30,
            highlight_offset: -5,
            menu_text_offset: 5,
            engine_panel: Rect::new(35, 590, 515, 755),
            engine_origin: Point::new(40, 595),
            engine_line_spacing: 50,
            engine_wrap_spacing: 20,
            engine_wrap_width: 150,
        }
    }
}

impl PanelLayout {
    /// Left edge for `text` centred in the move panel.
    pub fn centered_x<S: DrawSurface + ?Sized>(&self, surface: &S, text: &str) -> i32 {
        self.moves_panel.left + (self.moves_panel.width() - surface.text_width(text)) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_is_half_open() {
        let rect = Rect::new(10, 20, 30, 40);
        assert!(rect.contains(Point::new(10, 20)));
        assert!(rect.contains(Point::new(29, 39)));
        assert!(!rect.contains(Point::new(30, 25)));
        assert!(!rect.contains(Point::new(15, 40)));
        assert!(!rect.contains(Point::new(9, 25)));
    }

    #[test]
    fn test_shifted_up() {
        let rect = Rect::new(0, 100, 10, 130).shifted_up(30);
        assert_eq!(rect, Rect::new(0, 70, 10, 100));
        assert_eq!(rect.height(), 30);
    }
}
