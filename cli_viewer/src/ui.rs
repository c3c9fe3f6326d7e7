//! TUI layout and drawing.

use std::collections::VecDeque;
use std::time::Instant;

use ratatui::layout::{Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use replay_core::{place_near_pointer, AgentColor, Phase, ReplayEngine, SettlementMark};
use replay_schema::Point;

use crate::surface::TerminalSurface;

/// Everything the draw pass needs besides the engine itself.
pub struct ViewState {
    pub status_line: String,
    pub logs: VecDeque<String>,
    pub max_logs: usize,
    pub tooltip: Option<TooltipUi>,
    pub canvas_inner: Rect,
    pub file_label: String,
}

impl ViewState {
    pub fn new(file_label: String) -> Self {
        Self {
            status_line: String::new(),
            logs: VecDeque::new(),
            max_logs: 6,
            tooltip: None,
            canvas_inner: Rect::default(),
            file_label,
        }
    }

    pub fn push_log<S: Into<String>>(&mut self, line: S) {
        let mut text: String = line.into();
        while text.ends_with('\n') || text.ends_with('\r') {
            text.pop();
        }
        if text.is_empty() {
            return;
        }
        self.logs.push_front(text);
        while self.logs.len() > self.max_logs {
            self.logs.pop_back();
        }
    }
}

/// Hover tooltip content anchored at a terminal cell.
pub struct TooltipUi {
    pub lines: Vec<String>,
    pub pointer: (u16, u16),
}

fn layout_chunks(area: Rect) -> [Rect; 4] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(4),
            Constraint::Length(8),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

/// Inner drawing area of the canvas pane, for pointer hit-testing.
pub fn canvas_inner(area: Rect) -> Rect {
    layout_chunks(area)[1].inner(&Margin {
        vertical: 1,
        horizontal: 1,
    })
}

/// Map a terminal cell back to world coordinates. None outside the canvas.
pub fn cell_to_world(
    inner: Rect,
    bounds: (Point, Point),
    column: u16,
    row: u16,
) -> Option<Point> {
    if inner.width == 0 || inner.height == 0 {
        return None;
    }
    if column < inner.x
        || column >= inner.x + inner.width
        || row < inner.y
        || row >= inner.y + inner.height
    {
        return None;
    }
    let (min, max) = bounds;
    let fx = (f64::from(column - inner.x) + 0.5) / f64::from(inner.width);
    let fy = (f64::from(row - inner.y) + 0.5) / f64::from(inner.height);
    Some(Point {
        x: min.x + fx * (max.x - min.x),
        // canvas y grows upward; terminal rows grow downward
        y: max.y - fy * (max.y - min.y),
    })
}

/// World-space hit radius roughly two terminal cells wide.
pub fn hit_radius(inner: Rect, bounds: (Point, Point)) -> f64 {
    if inner.width == 0 || inner.height == 0 {
        return 0.0;
    }
    let (min, max) = bounds;
    let per_column = (max.x - min.x) / f64::from(inner.width);
    let per_row = (max.y - min.y) / f64::from(inner.height);
    per_column.max(per_row) * 2.0
}

pub fn draw_ui(frame: &mut Frame, engine: &ReplayEngine<TerminalSurface>, view: &ViewState) {
    let chunks = layout_chunks(frame.size());
    draw_status(frame, chunks[0], engine, view);
    draw_canvas(frame, chunks[1], engine);
    draw_controls(frame, chunks[2], engine);
    draw_logs(frame, chunks[3], view);
    if let Some(tooltip) = &view.tooltip {
        draw_tooltip(frame, tooltip);
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::Ready => "ready",
        Phase::Playing => "playing",
        Phase::Paused => "paused",
        Phase::Finished => "done",
    }
}

fn draw_status(
    frame: &mut Frame,
    area: Rect,
    engine: &ReplayEngine<TerminalSurface>,
    view: &ViewState,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Swarm Replay — {}", view.file_label));
    let line = Line::from(vec![
        Span::styled(
            format!("[{}] ", phase_label(engine.phase())),
            Style::default().fg(Color::Green),
        ),
        Span::raw(view.status_line.clone()),
    ]);
    let text = Paragraph::new(line).wrap(Wrap { trim: true });
    frame.render_widget(block, area);
    frame.render_widget(
        text,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_canvas(frame: &mut Frame, area: Rect, engine: &ReplayEngine<TerminalSurface>) {
    let surface = engine.surface();
    let theme = surface.theme();
    let (min, max) = surface.bounds();
    let now = Instant::now();
    let node_radius = ((max.x - min.x).max(max.y - min.y) * 0.012).max(2.0);

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title("Graph"))
        .x_bounds([min.x, max.x])
        .y_bounds([min.y, max.y])
        .paint(|ctx: &mut Context| {
            for (from, to) in surface.static_edges() {
                ctx.draw(&CanvasLine {
                    x1: from.x,
                    y1: from.y,
                    x2: to.x,
                    y2: to.y,
                    color: theme.edge(),
                });
            }
            for segment in surface.overlay_segments() {
                ctx.draw(&CanvasLine {
                    x1: segment.from.x,
                    y1: segment.from.y,
                    x2: segment.to.x,
                    y2: segment.to.y,
                    color: theme.overlay_edge(),
                });
            }
            for (id, position, marked) in surface.nodes() {
                let color = if marked {
                    theme.node_marked()
                } else {
                    theme.node()
                };
                ctx.draw(&Circle {
                    x: position.x,
                    y: position.y,
                    radius: node_radius,
                    color,
                });
                ctx.print(
                    position.x,
                    position.y,
                    Line::styled(id.to_string(), Style::default().fg(color)),
                );
            }
            for sprite in surface.agent_sprites(now) {
                let color = agent_rgb(sprite.visual.color);
                match sprite.visual.settlement {
                    SettlementMark::Solid => ctx.draw(&Circle {
                        x: sprite.position.x,
                        y: sprite.position.y,
                        radius: node_radius * 0.8,
                        color: theme.settled_ring(),
                    }),
                    SettlementMark::Dashed => ctx.draw(&Circle {
                        x: sprite.position.x,
                        y: sprite.position.y,
                        radius: node_radius * 0.8,
                        color: theme.wait_ring(),
                    }),
                    SettlementMark::None => {}
                }
                ctx.print(
                    sprite.position.x,
                    sprite.position.y,
                    Line::styled(sprite.label.clone(), Style::default().fg(color)),
                );
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_controls(frame: &mut Frame, area: Rect, engine: &ReplayEngine<TerminalSurface>) {
    let flags = engine.filter_flags();
    let mark = |on: bool| if on { "x" } else { " " };
    let lines = vec![
        Line::from(vec![
            Span::styled("space", Style::default().fg(Color::Yellow)),
            Span::raw(" play/pause   "),
            Span::styled(". / ,", Style::default().fg(Color::Yellow)),
            Span::raw(" step fwd/back   "),
            Span::styled("a", Style::default().fg(Color::Yellow)),
            Span::raw(format!(
                " agents [{}]   ",
                mark(engine.agents_visible())
            )),
            Span::styled("e", Style::default().fg(Color::Yellow)),
            Span::raw(" export   "),
            Span::styled("q", Style::default().fg(Color::Yellow)),
            Span::raw(" quit"),
        ]),
        Line::from(vec![
            Span::styled("s", Style::default().fg(Color::Yellow)),
            Span::raw(format!(" scout [{}]   ", mark(flags.show_scout))),
            Span::styled("c", Style::default().fg(Color::Yellow)),
            Span::raw(format!(" chase [{}]   ", mark(flags.show_chase))),
            Span::styled("f", Style::default().fg(Color::Yellow)),
            Span::raw(format!(" follow [{}]", mark(flags.show_follow))),
        ]),
    ];
    let block = Block::default().borders(Borders::ALL).title("Controls");
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_logs(frame: &mut Frame, area: Rect, view: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title("Logs");
    let lines: Vec<Line> = view
        .logs
        .iter()
        .map(|entry| Line::from(Span::raw(entry)))
        .collect();
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_tooltip(frame: &mut Frame, tooltip: &TooltipUi) {
    let viewport = frame.size();
    let width = tooltip
        .lines
        .iter()
        .map(|line| line.len())
        .max()
        .unwrap_or(0) as u16
        + 2;
    let height = tooltip.lines.len() as u16 + 2;
    let placed = place_near_pointer(
        (f64::from(tooltip.pointer.0), f64::from(tooltip.pointer.1)),
        (f64::from(width), f64::from(height)),
        (f64::from(viewport.width), f64::from(viewport.height)),
        1.0,
    );
    let x = (placed.x as u16).min(viewport.width.saturating_sub(width));
    let y = (placed.y as u16).min(viewport.height.saturating_sub(height));
    let area = Rect {
        x,
        y,
        width: width.min(viewport.width),
        height: height.min(viewport.height),
    };
    let lines: Vec<Line> = tooltip
        .lines
        .iter()
        .map(|line| Line::from(line.clone()))
        .collect();
    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

/// HSL to terminal RGB.
pub fn agent_rgb(color: AgentColor) -> Color {
    let (r, g, b) = hsl_to_rgb(color.hue, color.saturation, color.lightness);
    Color::Rgb(r, g, b)
}

fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> (u8, u8, u8) {
    let h = hue.rem_euclid(360.0) / 360.0;
    let s = (saturation / 100.0).clamp(0.0, 1.0);
    let l = (lightness / 100.0).clamp(0.0, 1.0);
    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f32| -> u8 {
        let t = t.rem_euclid(1.0);
        let value = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (value * 255.0).round() as u8
    };
    (
        channel(h + 1.0 / 3.0),
        channel(h),
        channel(h - 1.0 / 3.0),
    )
}
