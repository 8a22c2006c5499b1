//! Draws the viewer panels into a ratatui buffer, one unit per cell.

use ratatui::{
    buffer::Buffer,
    layout::Position,
    style::{Color, Style},
};
use viewer_core::{DrawSurface, PanelLayout, Point, Rect, Rgb};

/// A [`DrawSurface`] over a terminal frame buffer.
pub struct TerminalSurface<'a> {
    buf: &'a mut Buffer,
}

impl<'a> TerminalSurface<'a> {
    pub fn new(buf: &'a mut Buffer) -> Self {
        Self { buf }
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

impl DrawSurface for TerminalSurface<'_> {
    fn fill_rect(&mut self, rect: Rect, fill: Rgb) {
        let area = self.buf.area;
        let style = Style::default().bg(color(fill));
        let top = rect.top.max(i32::from(area.top()));
        let bottom = rect.bottom.min(i32::from(area.bottom()));
        let left = rect.left.max(i32::from(area.left()));
        let right = rect.right.min(i32::from(area.right()));
        for y in top..bottom {
            for x in left..right {
                if let Some(cell) = self.buf.cell_mut(Position::new(x as u16, y as u16)) {
                    cell.set_symbol(" ").set_style(style);
                }
            }
        }
    }

    fn draw_text(&mut self, text: &str, origin: Point, fg: Rgb, bg: Rgb) {
        let area = self.buf.area;
        if origin.y < i32::from(area.top()) || origin.y >= i32::from(area.bottom()) {
            return;
        }
        // Drop the characters left of the buffer
        let skip = (i32::from(area.left()) - origin.x).max(0);
        let x = origin.x + skip;
        if x >= i32::from(area.right()) {
            return;
        }
        let visible: String = text.chars().skip(skip as usize).collect();
        let width = (i32::from(area.right()) - x) as usize;
        let style = Style::default().fg(color(fg)).bg(color(bg));
        self.buf
            .set_stringn(x as u16, origin.y as u16, visible, width, style);
    }
}

/// Panel geometry in cells for the inner areas of the moves and analysis
/// blocks.
pub fn terminal_layout(moves: ratatui::layout::Rect, analysis: ratatui::layout::Rect) -> PanelLayout {
    let spacing = 2;
    PanelLayout {
        moves_panel: to_rect(moves),
        first_row_y: i32::from(moves.y),
        row_height: 1,
        highlight_offset: 0,
        menu_text_offset: 0,
        engine_panel: to_rect(analysis),
        engine_origin: Point::new(i32::from(analysis.x), i32::from(analysis.y) - spacing),
        engine_line_spacing: spacing,
        engine_wrap_spacing: 1,
        engine_wrap_width: usize::from(analysis.width.max(1)),
    }
}

fn to_rect(area: ratatui::layout::Rect) -> Rect {
    Rect::new(
        i32::from(area.left()),
        i32::from(area.top()),
        i32::from(area.right()),
        i32::from(area.bottom()),
    )
}
