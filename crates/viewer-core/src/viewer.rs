//! Viewer state and input handling.
//!
//! [`Viewer`] ties the game tree, the move history, the variation menu and
//! the analysis controller together. Frontends forward input to the
//! `handle_*` methods and call the `render_*` methods once per frame.

use log::debug;

use crate::analysis::{self, AnalysisLine, AnalysisSink, SharedLines};
use crate::controller::AnalysisController;
use crate::engine::EngineSession;
use crate::game_tree::{GameTree, NodeId};
use crate::history::{self, HistoryLine, HistoryPane, MoveCursor};
use crate::surface::{DrawSurface, PanelLayout, Point, Rect};
use crate::variation_menu::{self, VariationMenu};
use crate::variation_path::VariationPath;

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Home,
    End,
    Char(char),
}

/// Viewer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewerOptions {
    /// Panel geometry in surface units
    pub layout: PanelLayout,
    /// Draw the variation rows even while the menu is closed
    pub always_show_menu: bool,
}

/// A game being viewed, with optional engine analysis.
pub struct Viewer<E: EngineSession + 'static> {
    tree: GameTree,
    node: NodeId,
    cursor: MoveCursor,
    path: VariationPath,
    menu: VariationMenu,
    history: HistoryPane,
    /// Top of the current row's highlight bar from the last history render
    highlight_y: Option<i32>,
    analysis: Option<AnalysisController<E>>,
    lines: SharedLines,
    show_engine: bool,
    options: ViewerOptions,
}

impl<E: EngineSession + 'static> Viewer<E> {
    /// Creates a viewer at the start of `tree`.
    pub fn new(tree: GameTree, options: ViewerOptions) -> Self {
        let node = tree.root();
        Self {
            tree,
            node,
            cursor: MoveCursor::default(),
            path: VariationPath::new(),
            menu: VariationMenu::new(),
            history: HistoryPane::new(),
            highlight_y: None,
            analysis: None,
            lines: SharedLines::new(),
            show_engine: false,
            options,
        }
    }

    /// Attaches an engine session for analysis.
    pub fn with_engine(mut self, engine: E) -> Self {
        self.analysis = Some(AnalysisController::new(engine));
        self
    }

    pub fn tree(&self) -> &GameTree {
        &self.tree
    }

    pub fn current_node(&self) -> NodeId {
        self.node
    }

    pub fn cursor(&self) -> MoveCursor {
        self.cursor
    }

    pub fn variation_path(&self) -> &VariationPath {
        &self.path
    }

    pub fn menu(&self) -> &VariationMenu {
        &self.menu
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    pub fn has_engine(&self) -> bool {
        self.analysis.is_some()
    }

    /// Whether the analysis panel is shown.
    pub fn is_analysing(&self) -> bool {
        self.show_engine
    }

    /// The analysis lines currently shown.
    pub fn analysis_lines(&self) -> Vec<AnalysisLine> {
        self.lines.snapshot()
    }

    /// Replaces the panel geometry, e.g. after a terminal resize.
    pub fn set_layout(&mut self, layout: PanelLayout) {
        if self.options.layout != layout {
            self.options.layout = layout;
            self.history.mark_changed();
        }
    }

    /// Formatted history rows of the visible line, cached until the game
    /// state changes.
    pub fn history_lines(&self) -> Vec<HistoryLine> {
        self.history.rows(|| {
            history::format_move_history(
                &self.tree,
                self.tree.visible_nodes(&self.path),
                self.cursor,
            )
        })
    }

    /// The history rows currently in the window.
    pub fn visible_history(&self) -> Vec<HistoryLine> {
        history::history_window(&self.history_lines(), self.cursor)
    }

    /// Draws the move history panel, and the variation menu when it is open
    /// or always shown.
    pub fn render_history_panel<S: DrawSurface>(&mut self, surface: &mut S) {
        let rows = self.visible_history();
        self.highlight_y = history::render_history(surface, &self.options.layout, &rows);
        if self.menu.is_open() || self.options.always_show_menu {
            self.render_variation_menu(surface);
        }
    }

    /// Draws the rows of the variation menu for the current node.
    pub fn render_variation_menu<S: DrawSurface>(&self, surface: &mut S) {
        if self.at_root() {
            return;
        }
        self.menu.render(
            surface,
            &self.options.layout,
            &self.tree,
            self.node,
            self.menu_top(),
        );
    }

    /// Draws the analysis panel while analysis is shown.
    pub fn render_analysis_lines<S: DrawSurface>(&self, surface: &mut S) {
        if self.show_engine {
            analysis::render_analysis(surface, &self.options.layout, &self.lines.snapshot());
        }
    }

    /// Moves the menu emphasis to the row under the pointer.
    pub fn handle_mouse_move(&mut self, point: Point) {
        let layout = self.options.layout;
        let variations = self.variation_count();
        self.menu.hover(point, &layout, variations);
    }

    /// Handles a click.
    ///
    /// With the menu open, clicking a row selects that variation and clicking
    /// anywhere else closes the menu. With the menu closed, clicking the
    /// highlighted history row opens it.
    pub fn handle_mouse_click(&mut self, point: Point) {
        let hit = variation_menu::item_at(&self.menu_rows(), point);
        match (self.menu.is_open(), hit) {
            (true, Some(index)) => {
                self.select_variation(index);
            }
            (true, None) => {
                self.menu.close();
                self.history.mark_changed();
            }
            (false, Some(0)) => {
                self.open_menu();
            }
            _ => {}
        }
    }

    /// Handles a key press.
    ///
    /// `modifier_held` marks a modified key. The only modified key with a
    /// meaning is Right, which opens the variation menu.
    pub fn handle_key(&mut self, key: Key, modifier_held: bool) {
        if modifier_held {
            if key == Key::Right && !self.menu.is_open() {
                self.open_menu();
            }
            return;
        }

        if self.menu.is_open() {
            let variations = self.variation_count();
            match key {
                Key::Down => self.menu.next(variations),
                Key::Up => self.menu.previous(variations),
                Key::Enter | Key::Right => {
                    if let Some(index) = self.menu.emphasis() {
                        self.select_variation(index);
                    }
                }
                Key::Escape => {
                    self.menu.close();
                    self.history.mark_changed();
                }
                Key::Left => self.go_back(),
                Key::Home => self.go_start(),
                Key::End => self.go_end(),
                Key::Char(_) => {}
            }
            return;
        }

        match key {
            Key::Right => self.go_forward(),
            Key::Left => self.go_back(),
            Key::Home => self.go_start(),
            Key::End => self.go_end(),
            _ => {}
        }
    }

    /// Shows or hides engine analysis of the current position.
    ///
    /// Returns whether analysis is shown afterwards. Without an engine the
    /// panel stays hidden.
    pub fn toggle_analysis(&mut self) -> bool {
        if self.show_engine {
            self.show_engine = false;
            if let Some(controller) = self.analysis.as_mut() {
                controller.stop();
            }
            AnalysisSink::clear(&mut self.lines);
            debug!("analysis hidden");
        } else if let Some(controller) = self.analysis.as_mut() {
            self.show_engine = controller.start(self.tree.position(self.node), self.lines.clone());
        } else {
            debug!("no engine attached; analysis unavailable");
        }
        self.show_engine
    }

    /// Follows the visible line one move forward.
    pub fn go_forward(&mut self) {
        if let Some(next) = self.tree.next_on_path(self.node, &self.path) {
            self.node = next;
            self.cursor.advance();
            self.navigated();
        }
    }

    /// Steps back to the parent move. The path is kept, so going forward
    /// again returns along the same line.
    pub fn go_back(&mut self) {
        if let Some(parent) = self.tree.parent(self.node) {
            self.node = parent;
            self.cursor.retreat();
            self.navigated();
        }
    }

    pub fn go_start(&mut self) {
        if self.node != self.tree.root() {
            self.node = self.tree.root();
            self.cursor = MoveCursor::default();
            self.navigated();
        }
    }

    pub fn go_end(&mut self) {
        let end = self.tree.line_end(self.node, &self.path);
        if end != self.node {
            self.node = end;
            self.cursor = MoveCursor::from_ply(self.tree.ply(end));
            self.navigated();
        }
    }

    /// Descends into variation `index` of the current node and makes it the
    /// visible line. Returns whether the index was valid.
    ///
    /// The visible line always starts with the first move of the game, so no
    /// variation can be chosen at the start position.
    pub fn select_variation(&mut self, index: usize) -> bool {
        if self.at_root() {
            return false;
        }
        let Some(&child) = self.tree.variations(self.node).get(index) else {
            return false;
        };
        self.node = child;
        self.cursor.advance();
        self.path = self.tree.path_to(child);
        self.navigated();
        true
    }

    fn open_menu(&mut self) -> bool {
        let top = self.highlight_top();
        let variations = self.variation_count();
        let opened = self.menu.open(top, variations);
        if opened {
            self.history.mark_changed();
        }
        opened
    }

    fn at_root(&self) -> bool {
        self.node == self.tree.root()
    }

    fn variation_count(&self) -> usize {
        if self.at_root() {
            return 0;
        }
        self.tree.variations(self.node).len()
    }

    /// Top of the current row's highlight bar, or of the first row before
    /// anything was drawn.
    fn highlight_top(&self) -> i32 {
        let layout = &self.options.layout;
        self.highlight_y
            .unwrap_or(layout.first_row_y + layout.highlight_offset)
    }

    fn menu_top(&self) -> i32 {
        if self.menu.is_open() {
            self.menu.anchor_y()
        } else {
            self.highlight_top()
        }
    }

    fn menu_rows(&self) -> Vec<Rect> {
        variation_menu::menu_rows(&self.options.layout, self.menu_top(), self.variation_count())
    }

    /// Common bookkeeping after the current node changed.
    fn navigated(&mut self) {
        self.menu.close();
        self.history.mark_changed();
        if self.show_engine {
            self.restart_analysis();
        }
    }

    fn restart_analysis(&mut self) {
        let Some(controller) = self.analysis.as_mut() else {
            self.show_engine = false;
            return;
        };
        controller.stop();
        self.show_engine = controller.start(self.tree.position(self.node), self.lines.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use shakmaty::Chess;

    use super::*;
    use crate::engine::{AnalysisUpdate, Score};
    use crate::error::Result;
    use crate::movetext;
    use crate::surface::Rgb;

    /// Engine that reports one scored batch per analysis and then finishes.
    #[derive(Default)]
    struct BatchEngine {
        pending: Vec<AnalysisUpdate>,
        starts: Arc<Mutex<usize>>,
    }

    impl EngineSession for BatchEngine {
        fn start_analysis(&mut self, _position: &Chess, multipv: usize) -> Result<()> {
            *self.starts.lock().unwrap() += 1;
            self.pending = (1..=multipv)
                .map(|i| AnalysisUpdate {
                    score: Some(Score::Cp(10 * i as i32)),
                    depth: 12,
                    multipv: i,
                    pv: Vec::new(),
                })
                .collect();
            Ok(())
        }

        fn next_update(&mut self) -> Result<Option<AnalysisUpdate>> {
            Ok(self.pending.pop())
        }

        fn stop_analysis(&mut self) -> Result<()> {
            self.pending.clear();
            Ok(())
        }

        fn quit(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Canvas {
        fills: Vec<(Rect, Rgb)>,
        texts: Vec<(String, Point)>,
    }

    impl DrawSurface for Canvas {
        fn fill_rect(&mut self, rect: Rect, color: Rgb) {
            self.fills.push((rect, color));
        }

        fn draw_text(&mut self, text: &str, origin: Point, _fg: Rgb, _bg: Rgb) {
            self.texts.push((text.to_string(), origin));
        }
    }

    const GAME: &str = "1. e4 e5 (1... c5 2. Nf3 (2. Nc3) d6) (1... e6) 2. Nf3 Nc6 3. Bb5 a6";

    fn viewer() -> Viewer<BatchEngine> {
        let tree = movetext::parse(GAME, Chess::default()).unwrap();
        Viewer::new(tree, ViewerOptions::default())
    }

    fn current_san(viewer: &Viewer<BatchEngine>) -> &str {
        viewer.tree().san(viewer.current_node())
    }

    #[test]
    fn test_arrow_navigation_tracks_cursor() {
        let mut viewer = viewer();
        viewer.handle_key(Key::Right, false);
        viewer.handle_key(Key::Right, false);
        viewer.handle_key(Key::Right, false);
        assert_eq!(current_san(&viewer), "Nf3");
        assert_eq!(viewer.cursor().value(), 1.5);

        viewer.handle_key(Key::Left, false);
        assert_eq!(current_san(&viewer), "e5");
        assert_eq!(viewer.cursor().value(), 1.0);

        viewer.handle_key(Key::End, false);
        assert_eq!(current_san(&viewer), "a6");
        assert_eq!(viewer.cursor().ply(), 6);

        viewer.handle_key(Key::Home, false);
        assert_eq!(viewer.current_node(), viewer.tree().root());
        viewer.handle_key(Key::Left, false);
        assert_eq!(viewer.cursor().ply(), 0);
    }

    #[test]
    fn test_modified_right_opens_menu_and_keys_cycle() {
        let mut viewer = viewer();
        viewer.handle_key(Key::Right, false);
        viewer.handle_key(Key::Right, true);
        assert!(viewer.menu().is_open());
        assert_eq!(viewer.menu().emphasis(), Some(0));

        viewer.handle_key(Key::Down, false);
        viewer.handle_key(Key::Down, false);
        viewer.handle_key(Key::Down, false);
        assert_eq!(viewer.menu().emphasis(), Some(0));
        viewer.handle_key(Key::Up, false);
        assert_eq!(viewer.menu().emphasis(), Some(2));

        // modified keys other than Right do nothing
        viewer.handle_key(Key::Down, true);
        assert_eq!(viewer.menu().emphasis(), Some(2));

        viewer.handle_key(Key::Enter, false);
        assert!(!viewer.menu().is_open());
        assert_eq!(current_san(&viewer), "e6");
        assert_eq!(viewer.cursor().value(), 1.0);
    }

    #[test]
    fn test_committed_variation_becomes_visible_line() {
        let mut viewer = viewer();
        viewer.handle_key(Key::Right, false);
        viewer.handle_key(Key::Right, true);
        viewer.handle_key(Key::Down, false);
        viewer.handle_key(Key::Right, false);
        assert_eq!(current_san(&viewer), "c5");

        viewer.handle_key(Key::Right, true);
        viewer.handle_key(Key::Down, false);
        viewer.handle_key(Key::Enter, false);
        assert_eq!(current_san(&viewer), "Nc3");

        let rows: Vec<String> = viewer
            .history_lines()
            .into_iter()
            .map(|row| row.text)
            .collect();
        assert_eq!(rows, ["*1. e4 c5", "2. Nc3"]);
        assert!(viewer.history_lines()[1].current);
    }

    #[test]
    fn test_menu_does_not_open_without_alternatives() {
        let mut viewer = viewer();
        viewer.handle_key(Key::End, false);
        viewer.handle_key(Key::Right, true);
        assert!(!viewer.menu().is_open());
        // Enter with the menu closed is not a commit
        viewer.handle_key(Key::Enter, false);
        assert_eq!(current_san(&viewer), "a6");
    }

    #[test]
    fn test_menu_does_not_open_at_start_position() {
        let tree = movetext::parse("1. e4 (1. d4 d5) e5 (1... c5)", Chess::default()).unwrap();
        let mut viewer: Viewer<BatchEngine> = Viewer::new(tree, ViewerOptions::default());
        viewer.handle_key(Key::Right, true);
        assert!(!viewer.menu().is_open());
        assert!(!viewer.select_variation(1));
        assert_eq!(viewer.current_node(), viewer.tree().root());

        viewer.handle_key(Key::Right, false);
        viewer.handle_key(Key::Right, true);
        assert!(viewer.menu().is_open());
    }

    #[test]
    fn test_escape_closes_menu() {
        let mut viewer = viewer();
        viewer.handle_key(Key::Right, false);
        viewer.handle_key(Key::Right, true);
        viewer.handle_key(Key::Escape, false);
        assert!(!viewer.menu().is_open());
        assert_eq!(current_san(&viewer), "e4");
    }

    #[test]
    fn test_mouse_opens_hovers_and_commits() {
        let mut viewer = viewer();
        viewer.handle_key(Key::Right, false);
        let mut canvas = Canvas::default();
        viewer.render_history_panel(&mut canvas);

        // e4 is on the first row, whose highlight starts at 75
        let first_row = Point::new(600, 80);
        viewer.handle_mouse_click(first_row);
        assert!(viewer.menu().is_open());
        assert_eq!(viewer.menu().anchor_y(), 75);

        viewer.handle_mouse_move(Point::new(600, 75 + 30 + 10));
        assert_eq!(viewer.menu().emphasis(), Some(1));
        viewer.handle_mouse_move(Point::new(10, 10));
        assert_eq!(viewer.menu().emphasis(), None);

        viewer.handle_mouse_click(Point::new(600, 75 + 2 * 30));
        assert!(!viewer.menu().is_open());
        assert_eq!(current_san(&viewer), "e6");
    }

    #[test]
    fn test_click_outside_closes_menu() {
        let mut viewer = viewer();
        viewer.handle_key(Key::Right, false);
        viewer.handle_key(Key::Right, true);
        viewer.handle_mouse_click(Point::new(5, 5));
        assert!(!viewer.menu().is_open());
        assert_eq!(current_san(&viewer), "e4");
    }

    #[test]
    fn test_render_history_highlights_current_row() {
        let mut viewer = viewer();
        viewer.handle_key(Key::Right, false);
        viewer.handle_key(Key::Right, false);
        viewer.handle_key(Key::Right, false);
        let mut canvas = Canvas::default();
        viewer.render_history_panel(&mut canvas);

        let layout = PanelLayout::default();
        assert_eq!(canvas.fills[0].0, layout.moves_panel);
        assert!(
            canvas
                .fills
                .contains(&(Rect::new(580, 105, 750, 135), Rgb(0, 0, 0)))
        );
        assert_eq!(canvas.texts.len(), 15);
        assert_eq!(canvas.texts[0].0, "*1. e4 e5");
        assert_eq!(canvas.texts[1].0, "2. Nf3 Nc6");
        assert_eq!(canvas.texts[1].1.y, 110);
    }

    #[test]
    fn test_always_show_menu_draws_closed_menu() {
        let tree = movetext::parse(GAME, Chess::default()).unwrap();
        let mut viewer: Viewer<BatchEngine> = Viewer::new(
            tree,
            ViewerOptions {
                always_show_menu: true,
                ..ViewerOptions::default()
            },
        );
        viewer.handle_key(Key::Right, false);
        let mut canvas = Canvas::default();
        viewer.render_history_panel(&mut canvas);
        let labels: Vec<&str> = canvas.texts[15..].iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(labels, ["1... e5", "1... c5", "1... e6"]);
        assert!(!viewer.menu().is_open());
    }

    #[test]
    fn test_toggle_analysis_without_engine() {
        let mut viewer = viewer();
        assert!(!viewer.has_engine());
        assert!(!viewer.toggle_analysis());
        let mut canvas = Canvas::default();
        viewer.render_analysis_lines(&mut canvas);
        assert!(canvas.fills.is_empty());
    }

    #[test]
    fn test_analysis_restarts_on_navigation() {
        let engine = BatchEngine::default();
        let starts = Arc::clone(&engine.starts);
        let mut viewer = viewer().with_engine(engine);

        assert!(viewer.toggle_analysis());
        viewer.handle_key(Key::Right, false);
        viewer.handle_key(Key::Right, false);

        // hiding joins the last analysis thread
        assert!(!viewer.toggle_analysis());
        assert_eq!(*starts.lock().unwrap(), 3);
        viewer.handle_key(Key::Right, false);
        assert_eq!(*starts.lock().unwrap(), 3);
        assert!(viewer.analysis_lines().is_empty());
    }

    #[test]
    fn test_analysis_lines_render_numbered() {
        let mut viewer = viewer().with_engine(BatchEngine::default());
        viewer.handle_key(Key::Right, false);
        assert!(viewer.toggle_analysis());
        let controller = viewer.analysis.as_ref().unwrap();
        while controller.is_running() {
            thread::sleep(Duration::from_millis(1));
        }

        let lines = viewer.analysis_lines();
        let scores: Vec<&str> = lines.iter().map(|line| line.score.as_str()).collect();
        assert_eq!(scores, ["-30", "-20", "-10"]);

        let mut canvas = Canvas::default();
        viewer.render_analysis_lines(&mut canvas);
        assert_eq!(canvas.texts[0].0, "1 -30 12 ");
        assert_eq!(canvas.texts[0].1, Point::new(40, 645));
        assert_eq!(canvas.texts[2].1, Point::new(40, 745));
    }
}
