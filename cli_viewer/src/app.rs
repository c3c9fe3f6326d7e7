//! Viewer event loop: keys, mouse hover, and the playback tick.

use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use color_eyre::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode};
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use tracing::{info, warn};

use replay_core::{ReplayEngine, StepDirection};

use crate::surface::TerminalSurface;
use crate::ui::{self, TooltipUi, ViewState};

pub struct ViewerApp {
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
    engine: ReplayEngine<TerminalSurface>,
    status_rx: Receiver<String>,
    log_rx: Receiver<String>,
    view: ViewState,
}

impl ViewerApp {
    pub fn new(
        engine: ReplayEngine<TerminalSurface>,
        status_rx: Receiver<String>,
        log_rx: Receiver<String>,
        file_label: String,
    ) -> Result<Self> {
        let stdout = std::io::stdout();
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(std::io::stdout(), EnableMouseCapture)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(Self {
            terminal,
            engine,
            status_rx,
            log_rx,
            view: ViewState::new(file_label),
        })
    }

    pub fn run(mut self) -> Result<()> {
        let mut last_draw = Instant::now();

        loop {
            while let Ok(line) = self.status_rx.try_recv() {
                self.view.status_line = line;
            }
            while let Ok(line) = self.log_rx.try_recv() {
                self.view.push_log(line);
            }

            self.engine.tick(Instant::now());

            if last_draw.elapsed() >= Duration::from_millis(33) {
                self.draw()?;
                last_draw = Instant::now();
            }

            if event::poll(Duration::from_millis(15))? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key.code) {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }

        self.terminal.show_cursor()?;
        crossterm::execute!(std::io::stdout(), DisableMouseCapture)?;
        crossterm::terminal::disable_raw_mode()?;
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let area = self.terminal.size()?;
        self.view.canvas_inner = ui::canvas_inner(area);
        let engine = &self.engine;
        let view = &self.view;
        self.terminal.draw(|frame| ui::draw_ui(frame, engine, view))?;
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char(' ') => self.engine.toggle_play(Instant::now()),
            KeyCode::Char('.') | KeyCode::Right => self.engine.step(StepDirection::Forward),
            KeyCode::Char(',') | KeyCode::Left => self.engine.step(StepDirection::Backward),
            KeyCode::Char('s') => {
                let mut flags = self.engine.filter_flags();
                flags.show_scout = !flags.show_scout;
                self.engine.set_filter_flags(flags);
            }
            KeyCode::Char('c') => {
                let mut flags = self.engine.filter_flags();
                flags.show_chase = !flags.show_chase;
                self.engine.set_filter_flags(flags);
            }
            KeyCode::Char('f') => {
                let mut flags = self.engine.filter_flags();
                flags.show_follow = !flags.show_follow;
                self.engine.set_filter_flags(flags);
            }
            KeyCode::Char('a') => {
                let visible = !self.engine.agents_visible();
                self.engine.set_agents_visible(visible);
            }
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
        false
    }

    fn handle_mouse(&mut self, mouse: event::MouseEvent) {
        if mouse.kind == event::MouseEventKind::Moved {
            self.view.tooltip = self.tooltip_at(mouse.column, mouse.row);
        }
    }

    fn tooltip_at(&self, column: u16, row: u16) -> Option<TooltipUi> {
        let surface = self.engine.surface();
        let world = ui::cell_to_world(self.view.canvas_inner, surface.bounds(), column, row)?;
        let radius = ui::hit_radius(self.view.canvas_inner, surface.bounds());
        let node = surface.node_at(world, radius)?.clone();
        let lines = match self.engine.tooltip(&node) {
            Some(content) => content.to_lines(),
            None => vec![format!("Node {node}"), "No data for this step.".to_string()],
        };
        Some(TooltipUi {
            lines,
            pointer: (column, row),
        })
    }

    fn export(&mut self) {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        let filename = format!("simulation_data_{stamp}.json");
        match std::fs::write(&filename, self.engine.export_json()) {
            Ok(()) => {
                info!(target: "swarm_replay::viewer", file = %filename, "export.saved");
                self.view.push_log(format!("Saved {filename}"));
            }
            Err(err) => {
                warn!(target: "swarm_replay::viewer", error = %err, "export.failed");
                self.view.push_log(format!("Export failed: {err}"));
            }
        }
    }
}
