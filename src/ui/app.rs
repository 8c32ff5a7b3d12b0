//! Main TUI application state and logic

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};

use crate::engine::Target;
use crate::model::MemoryModel;
use crate::step::StepDriver;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Stack,
    Heap,
    Stdout,
}

impl FocusedPane {
    /// Move focus to the next pane
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Stack,
            FocusedPane::Stack => FocusedPane::Heap,
            FocusedPane::Heap => FocusedPane::Stdout,
            FocusedPane::Stdout => FocusedPane::Source,
        }
    }
}

/// The inspector TUI: drives the step loop interactively and renders the
/// current memory model after every step.
pub struct App<T: Target> {
    driver: StepDriver<T>,
    model: MemoryModel,
    source: String,
    focused_pane: FocusedPane,
    source_scroll: usize,
    stack_scroll: usize,
    heap_scroll: usize,
    stdout_scroll: usize,
    steps_taken: usize,
    should_quit: bool,
    status_message: String,
}

impl<T: Target> App<T> {
    /// Create an app around a driver positioned at the initial breakpoint.
    /// `model` may already hold the text-section observation.
    pub fn new(driver: StepDriver<T>, model: MemoryModel, source: String) -> Self {
        App {
            driver,
            model,
            source,
            focused_pane: FocusedPane::Source,
            source_scroll: 0,
            stack_scroll: 0,
            heap_scroll: 0,
            stdout_scroll: 0,
            steps_taken: 0,
            should_quit: false,
            status_message: String::from("Press ENTER to advance one line"),
        }
    }

    /// Run the TUI event loop until quit.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(main_chunks[0]);

        // Left column: source over stdout
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
            .split(columns[0]);

        // Right column: heap over stack
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);

        let state = self.driver.execution_state();
        super::panes::render_source_pane(
            frame,
            left_rows[0],
            &self.source,
            state.file.as_deref().unwrap_or("(unknown)"),
            state.line,
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        super::panes::render_stdout_pane(
            frame,
            left_rows[1],
            &state.stdout,
            self.focused_pane == FocusedPane::Stdout,
            &mut self.stdout_scroll,
        );

        super::panes::render_memory_pane(
            frame,
            right_rows[0],
            "heap",
            &self.model.heap_values(),
            self.focused_pane == FocusedPane::Heap,
            &mut self.heap_scroll,
        );

        super::panes::render_memory_pane(
            frame,
            right_rows[1],
            "stack",
            &self.model.stack_values(),
            self.focused_pane == FocusedPane::Stack,
            &mut self.stack_scroll,
        );

        super::panes::render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            self.steps_taken,
            self.driver.has_exited(),
        );
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Enter | KeyCode::Right => {
                self.step_once();
            }
            KeyCode::Up => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_add(1);
            }
            _ => {}
        }
    }

    fn focused_scroll(&mut self) -> &mut usize {
        match self.focused_pane {
            FocusedPane::Source => &mut self.source_scroll,
            FocusedPane::Stack => &mut self.stack_scroll,
            FocusedPane::Heap => &mut self.heap_scroll,
            FocusedPane::Stdout => &mut self.stdout_scroll,
        }
    }

    fn step_once(&mut self) {
        if self.driver.has_exited() {
            self.status_message = "Target has exited".to_string();
            return;
        }
        match self.driver.step(1, &mut self.model) {
            Ok(()) => {
                self.steps_taken += 1;
                self.status_message = if self.driver.has_exited() {
                    "Target exited".to_string()
                } else {
                    format!("Stopped at line {}", self.driver.execution_state().line)
                };
                self.stdout_scroll = usize::MAX;
            }
            Err(e) => {
                self.status_message = format!("Error: {e}");
            }
        }
    }
}
