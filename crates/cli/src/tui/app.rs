//! Application state and main loop for the TUI.

use std::time::Duration;

use log::info;
use ratatui::DefaultTerminal;
use viewer_core::{GameTree, UciEngine, Viewer, ViewerOptions};

use super::event::{self, Event};
use super::render;

/// Main application state.
pub struct App {
    /// The game being viewed, with its menu and analysis state
    pub viewer: Viewer<UciEngine>,
    /// Name reported by the engine, if one is attached
    pub engine_name: Option<String>,
    /// Whether the application should quit
    pub should_quit: bool,
    /// Status message to display
    pub status_message: Option<String>,
}

impl App {
    /// Creates a new App instance.
    pub fn new(tree: GameTree, engine: Option<UciEngine>, always_show_menu: bool) -> Self {
        let options = ViewerOptions {
            always_show_menu,
            ..ViewerOptions::default()
        };
        let engine_name = engine
            .as_ref()
            .map(|engine| engine.name().unwrap_or("engine").to_string());
        let viewer = Viewer::new(tree, options);
        let viewer = match engine {
            Some(engine) => viewer.with_engine(engine),
            None => viewer,
        };

        Self {
            viewer,
            engine_name,
            should_quit: false,
            status_message: None,
        }
    }

    /// Runs the main TUI loop.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> std::io::Result<()> {
        // Enable mouse capture
        crossterm::execute!(std::io::stdout(), crossterm::event::EnableMouseCapture)?;

        loop {
            // Draw the UI
            terminal.draw(|frame| render::render(frame, &mut self))?;

            // Poll faster while analysis lines are streaming in
            let timeout = if self.viewer.is_analysing() {
                Duration::from_millis(50)
            } else {
                Duration::from_millis(100)
            };

            if let Some(event) = event::poll_event(timeout)? {
                self.handle_event(event);
            }

            if self.should_quit {
                break;
            }
        }

        // Disable mouse capture on exit
        crossterm::execute!(std::io::stdout(), crossterm::event::DisableMouseCapture)?;

        Ok(())
    }

    /// Handles an input event.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Quit | Event::ForceQuit => {
                if self.viewer.is_analysing() {
                    self.viewer.toggle_analysis();
                }
                self.should_quit = true;
            }
            Event::Key(key, modifier_held) => {
                self.status_message = None;
                self.viewer.handle_key(key, modifier_held);
            }
            Event::MouseMove(point) => {
                self.viewer.handle_mouse_move(point);
            }
            Event::Click(point) => {
                self.status_message = None;
                self.viewer.handle_mouse_click(point);
            }
            Event::ToggleAnalysis => self.toggle_analysis(),
        }
    }

    fn toggle_analysis(&mut self) {
        if !self.viewer.has_engine() {
            self.status_message = Some("No engine configured (use --engine)".to_string());
            return;
        }
        let shown = self.viewer.toggle_analysis();
        info!("analysis {}", if shown { "shown" } else { "hidden" });
        self.status_message = Some(
            if shown {
                "Analysis started"
            } else {
                "Analysis stopped"
            }
            .to_string(),
        );
    }
}
