//! Board widget for rendering the chess position at the current node.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};
use shakmaty::{Chess, Color as Side, File, Move, Piece, Position, Rank, Square};

/// Widget for rendering a chess board.
pub struct BoardWidget<'a> {
    /// The position to render
    position: &'a Chess,
    /// Move that led to the position
    last_move: Option<&'a Move>,
}

impl<'a> BoardWidget<'a> {
    /// Creates a new board widget.
    pub fn new(position: &'a Chess) -> Self {
        Self {
            position,
            last_move: None,
        }
    }

    /// Sets the last move.
    pub fn last_move(mut self, mv: Option<&'a Move>) -> Self {
        self.last_move = mv;
        self
    }

    fn is_last_move_square(&self, sq: Square) -> bool {
        self.last_move
            .is_some_and(|mv| mv.from() == Some(sq) || mv.to() == sq)
    }
}

fn piece_span(piece: Option<Piece>) -> (String, Style) {
    match piece {
        Some(piece) => {
            let style = match piece.color {
                Side::White => Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
                Side::Black => Style::default().fg(Color::Green),
            };
            (format!(" {} ", piece.char()), style)
        }
        None => (" · ".to_string(), Style::default().fg(Color::DarkGray)),
    }
}

impl Widget for BoardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Minimum size check
        if area.width < 27 || area.height < 9 {
            return;
        }

        let board = self.position.board();

        for (row, rank) in Rank::ALL.iter().rev().enumerate() {
            let y = area.y + row as u16;
            buf.set_string(
                area.x,
                y,
                format!("{} ", rank.char()),
                Style::default().fg(Color::Cyan),
            );

            for (col, file) in File::ALL.iter().enumerate() {
                let sq = Square::from_coords(*file, *rank);
                let (content, mut style) = piece_span(board.piece_at(sq));

                if self.is_last_move_square(sq) {
                    style = style.bg(Color::Rgb(50, 50, 80));
                } else if sq.is_dark() {
                    style = style.bg(Color::Rgb(30, 30, 30));
                }

                let x = area.x + 2 + (col as u16) * 3;
                buf.set_string(x, y, content, style);
            }
        }

        // File letters
        let header: Vec<Span> = std::iter::once(Span::raw("  "))
            .chain(File::ALL.iter().map(|file| {
                Span::styled(format!(" {} ", file.char()), Style::default().fg(Color::Cyan))
            }))
            .collect();
        buf.set_line(area.x, area.y + 8, &Line::from(header), area.width);
    }
}
