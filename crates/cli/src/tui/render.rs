//! Rendering logic for the TUI.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use shakmaty::{Color as Side, Position};

use super::app::App;
use super::surface::{TerminalSurface, terminal_layout};
use super::widgets::BoardWidget;

/// Main render function.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Main layout: title, content, help bar
    let main_layout = Layout::vertical([
        Constraint::Length(3), // Title
        Constraint::Min(20),   // Content
        Constraint::Length(3), // Help bar
    ])
    .split(area);

    render_title(frame, main_layout[0]);
    render_content(frame, main_layout[1], app);
    render_help_bar(frame, main_layout[2], app);
}

/// Renders the title bar.
fn render_title(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            " Chess Viewer ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            concat!("v", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(panel_block(""));
    frame.render_widget(title, area);
}

fn panel_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title)
}

/// Renders the board, info and analysis column next to the move history.
fn render_content(frame: &mut Frame, area: Rect, app: &mut App) {
    let content_layout = Layout::horizontal([
        Constraint::Min(34),    // Board, info, analysis
        Constraint::Length(32), // Move history
    ])
    .split(area);

    let left_layout = Layout::vertical([
        Constraint::Length(12), // Board
        Constraint::Length(4),  // Info
        Constraint::Min(8),     // Analysis
    ])
    .split(content_layout[0]);

    render_board(frame, left_layout[0], app);
    render_info_panel(frame, left_layout[1], app);

    let moves_block = panel_block(" Moves ");
    let moves_area = moves_block.inner(content_layout[1]);
    frame.render_widget(moves_block, content_layout[1]);

    let analysis_block = panel_block(" Analysis ");
    let analysis_area = analysis_block.inner(left_layout[2]);
    frame.render_widget(analysis_block, left_layout[2]);

    app.viewer
        .set_layout(terminal_layout(moves_area, analysis_area));

    let mut surface = TerminalSurface::new(frame.buffer_mut());
    app.viewer.render_history_panel(&mut surface);
    if app.viewer.is_analysing() {
        app.viewer.render_analysis_lines(&mut surface);
    } else {
        let hint = if app.viewer.has_engine() {
            "Press [A] to analyse"
        } else {
            "No engine (use --engine)"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))),
            analysis_area,
        );
    }
}

/// Renders the board at the current node.
fn render_board(frame: &mut Frame, area: Rect, app: &App) {
    let board_block = panel_block(" Board ");
    let inner_area = board_block.inner(area);
    frame.render_widget(board_block, area);

    let tree = app.viewer.tree();
    let node = app.viewer.current_node();
    let board_widget = BoardWidget::new(tree.position(node)).last_move(tree.node(node).mv());

    frame.render_widget(board_widget, inner_area);
}

/// Renders the side to move, the last move and the engine.
fn render_info_panel(frame: &mut Frame, area: Rect, app: &App) {
    let info_block = panel_block(" Info ");
    let inner_area = info_block.inner(area);
    frame.render_widget(info_block, area);

    let tree = app.viewer.tree();
    let node = app.viewer.current_node();

    let turn = match tree.position(node).turn() {
        Side::White => Span::styled("White to move", Style::default().fg(Color::Yellow)),
        Side::Black => Span::styled("Black to move", Style::default().fg(Color::Green)),
    };
    let label = tree.variation_label(node);
    let mut first = vec![turn];
    if !label.is_empty() {
        first.push(Span::raw("  after "));
        first.push(Span::styled(label, Style::default().fg(Color::Magenta)));
    }

    let second = match &app.status_message {
        Some(message) => Line::from(Span::styled(
            message.as_str(),
            Style::default().fg(Color::Cyan),
        )),
        None => Line::from(vec![
            Span::raw("Engine: "),
            Span::styled(
                app.engine_name.as_deref().unwrap_or("none"),
                Style::default().fg(Color::Cyan),
            ),
        ]),
    };

    frame.render_widget(
        Paragraph::new(vec![Line::from(first), second]),
        inner_area,
    );
}

/// Renders the help bar.
fn render_help_bar(frame: &mut Frame, area: Rect, app: &App) {
    let help_items = if app.viewer.menu().is_open() {
        vec![
            ("↑↓", "Choose"),
            ("Enter", "Play"),
            ("Esc", "Close"),
            ("Q", "Quit"),
        ]
    } else {
        vec![
            ("←→", "Move"),
            ("Ctrl+→", "Variations"),
            ("Home/End", "Start/End"),
            ("A", "Analysis"),
            ("Q", "Quit"),
        ]
    };

    let spans: Vec<Span> = help_items
        .iter()
        .flat_map(|(key, desc)| {
            vec![
                Span::styled(
                    format!(" [{key}] "),
                    Style::default().fg(Color::Black).bg(Color::Cyan),
                ),
                Span::raw(format!("{desc} ")),
            ]
        })
        .collect();

    let help = Paragraph::new(Line::from(spans)).block(panel_block(""));
    frame.render_widget(help, area);
}
