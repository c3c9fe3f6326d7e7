//! Terminal-canvas implementation of the rendering surface.
//!
//! Holds the graphical elements the engine manipulates (nodes, agents,
//! marks, overlay edges) and owns the interpolation clock: agent motion is
//! sampled at draw time, and halting freezes it mid-flight.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use ratatui::style::Color;

use replay_core::{AgentSeed, AgentVisual, RenderingSurface};
use replay_schema::{NodeId, Point, SimulationData};

/// Canvas palette, passed in explicitly at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn node(self) -> Color {
        match self {
            Theme::Light => Color::Rgb(147, 197, 253),
            Theme::Dark => Color::Rgb(59, 130, 246),
        }
    }

    pub fn node_marked(self) -> Color {
        match self {
            Theme::Light => Color::Rgb(251, 191, 36),
            Theme::Dark => Color::Rgb(250, 204, 21),
        }
    }

    pub fn edge(self) -> Color {
        match self {
            Theme::Light => Color::Rgb(203, 213, 225),
            Theme::Dark => Color::Rgb(100, 116, 139),
        }
    }

    pub fn overlay_edge(self) -> Color {
        match self {
            Theme::Light => Color::Rgb(22, 163, 74),
            Theme::Dark => Color::Rgb(34, 197, 94),
        }
    }

    pub fn settled_ring(self) -> Color {
        match self {
            Theme::Light => Color::Rgb(5, 150, 105),
            Theme::Dark => Color::Rgb(16, 185, 129),
        }
    }

    pub fn wait_ring(self) -> Color {
        match self {
            Theme::Light => Color::Rgb(217, 119, 6),
            Theme::Dark => Color::Rgb(245, 158, 11),
        }
    }

    pub fn text(self) -> Color {
        match self {
            Theme::Light => Color::Rgb(30, 41, 59),
            Theme::Dark => Color::Rgb(241, 245, 249),
        }
    }
}

#[derive(Debug, Clone)]
struct NodeElement {
    position: Point,
    marked: bool,
}

/// In-flight position interpolation, sampled on the surface's own clock.
#[derive(Debug, Clone)]
struct Motion {
    from: Point,
    to: Point,
    started: Instant,
    duration: Duration,
}

impl Motion {
    fn fixed(at: Point) -> Self {
        Self {
            from: at,
            to: at,
            started: Instant::now(),
            duration: Duration::ZERO,
        }
    }

    fn sample(&self, now: Instant) -> Point {
        if self.duration.is_zero() {
            return self.to;
        }
        let elapsed = now.saturating_duration_since(self.started).as_secs_f64();
        let t = (elapsed / self.duration.as_secs_f64()).clamp(0.0, 1.0);
        Point {
            x: self.from.x + (self.to.x - self.from.x) * t,
            y: self.from.y + (self.to.y - self.from.y) * t,
        }
    }
}

#[derive(Debug, Clone)]
struct AgentElement {
    label: String,
    visual: AgentVisual,
    motion: Motion,
}

/// Overlay edge with resolved endpoints, ready to draw.
#[derive(Debug, Clone)]
pub struct OverlaySegment {
    pub id: String,
    pub from: Point,
    pub to: Point,
}

/// Agent snapshot for one draw pass.
#[derive(Debug, Clone)]
pub struct AgentSprite {
    pub label: String,
    pub position: Point,
    pub visual: AgentVisual,
}

pub struct TerminalSurface {
    theme: Theme,
    nodes: HashMap<NodeId, NodeElement>,
    node_order: Vec<NodeId>,
    edges: Vec<(Point, Point)>,
    agents: Vec<Option<AgentElement>>,
    overlay: Vec<OverlaySegment>,
    agent_opacity: f32,
    bounds: (Point, Point),
}

impl TerminalSurface {
    /// Build node/edge elements from the run's graph descriptors. Nodes
    /// without a preset position fall back to a deterministic ring slot.
    pub fn new(data: &SimulationData, theme: Theme) -> Self {
        let count = data.nodes.len().max(1);
        let mut nodes = HashMap::with_capacity(data.nodes.len());
        let mut node_order = Vec::with_capacity(data.nodes.len());
        for (index, descriptor) in data.nodes.iter().enumerate() {
            let position = descriptor.position.unwrap_or_else(|| ring_slot(index, count));
            nodes.insert(
                descriptor.data.id.clone(),
                NodeElement {
                    position,
                    marked: false,
                },
            );
            node_order.push(descriptor.data.id.clone());
        }
        let edges = data
            .edges
            .iter()
            .filter_map(|edge| {
                let from = nodes.get(&edge.data.source)?.position;
                let to = nodes.get(&edge.data.target)?.position;
                Some((from, to))
            })
            .collect();
        let bounds = world_bounds(nodes.values().map(|node| node.position));
        Self {
            theme,
            nodes,
            node_order,
            edges,
            agents: Vec::new(),
            overlay: Vec::new(),
            agent_opacity: 1.0,
            bounds,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// World extents (with padding) for the canvas axes.
    pub fn bounds(&self) -> (Point, Point) {
        self.bounds
    }

    pub fn agents_visible(&self) -> bool {
        self.agent_opacity > 0.0
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, Point, bool)> {
        self.node_order.iter().filter_map(|id| {
            self.nodes
                .get(id)
                .map(|node| (id, node.position, node.marked))
        })
    }

    pub fn static_edges(&self) -> &[(Point, Point)] {
        &self.edges
    }

    pub fn overlay_segments(&self) -> &[OverlaySegment] {
        &self.overlay
    }

    /// Agents at their interpolated positions for this draw pass. Empty
    /// while the visibility toggle has them hidden.
    pub fn agent_sprites(&self, now: Instant) -> Vec<AgentSprite> {
        if !self.agents_visible() {
            return Vec::new();
        }
        self.agents
            .iter()
            .flatten()
            .map(|agent| AgentSprite {
                label: agent.label.clone(),
                position: agent.motion.sample(now),
                visual: agent.visual,
            })
            .collect()
    }

    /// Nearest node within `radius` of a world coordinate.
    pub fn node_at(&self, world: Point, radius: f64) -> Option<&NodeId> {
        let mut best: Option<(&NodeId, f64)> = None;
        for (id, node) in &self.nodes {
            let dx = node.position.x - world.x;
            let dy = node.position.y - world.y;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance <= radius && best.map_or(true, |(_, d)| distance < d) {
                best = Some((id, distance));
            }
        }
        best.map(|(id, _)| id)
    }
}

fn ring_slot(index: usize, count: usize) -> Point {
    let angle = (index as f64 / count as f64) * std::f64::consts::TAU;
    Point {
        x: 200.0 * angle.cos(),
        y: 200.0 * angle.sin(),
    }
}

fn world_bounds<I: Iterator<Item = Point>>(positions: I) -> (Point, Point) {
    let mut min = Point {
        x: f64::INFINITY,
        y: f64::INFINITY,
    };
    let mut max = Point {
        x: f64::NEG_INFINITY,
        y: f64::NEG_INFINITY,
    };
    let mut any = false;
    for position in positions {
        any = true;
        min.x = min.x.min(position.x);
        min.y = min.y.min(position.y);
        max.x = max.x.max(position.x);
        max.y = max.y.max(position.y);
    }
    if !any {
        return (Point { x: -100.0, y: -100.0 }, Point { x: 100.0, y: 100.0 });
    }
    let pad_x = ((max.x - min.x) * 0.12).max(40.0);
    let pad_y = ((max.y - min.y) * 0.12).max(40.0);
    (
        Point {
            x: min.x - pad_x,
            y: min.y - pad_y,
        },
        Point {
            x: max.x + pad_x,
            y: max.y + pad_y,
        },
    )
}

impl RenderingSurface for TerminalSurface {
    fn reset_agents(&mut self, seeds: &[AgentSeed]) {
        self.agents.clear();
        let slots = seeds
            .iter()
            .map(|seed| seed.agent + 1)
            .max()
            .unwrap_or(0);
        self.agents.resize_with(slots, || None);
        for seed in seeds {
            self.agents[seed.agent] = Some(AgentElement {
                label: seed.label.clone(),
                visual: seed.visual,
                motion: Motion::fixed(seed.position),
            });
        }
    }

    fn clear_agents(&mut self) {
        self.agents.clear();
    }

    fn agent_exists(&self, agent: usize) -> bool {
        matches!(self.agents.get(agent), Some(Some(_)))
    }

    fn node_position(&self, node: &NodeId) -> Option<Point> {
        self.nodes.get(node).map(|element| element.position)
    }

    fn apply_agent_visual(&mut self, agent: usize, visual: AgentVisual) {
        if let Some(Some(element)) = self.agents.get_mut(agent) {
            element.visual = visual;
        }
    }

    fn animate_agent_to(&mut self, agent: usize, target: Point, duration: Duration) {
        let now = Instant::now();
        if let Some(Some(element)) = self.agents.get_mut(agent) {
            let current = element.motion.sample(now);
            element.motion = Motion {
                from: current,
                to: target,
                started: now,
                duration,
            };
        }
    }

    fn halt_motion(&mut self) {
        let now = Instant::now();
        for element in self.agents.iter_mut().flatten() {
            let held = element.motion.sample(now);
            element.motion = Motion::fixed(held);
        }
    }

    fn set_agent_opacity(&mut self, opacity: f32) {
        self.agent_opacity = opacity;
    }

    fn clear_unsettled_marks(&mut self) {
        for element in self.nodes.values_mut() {
            element.marked = false;
        }
    }

    fn mark_unsettled(&mut self, node: &NodeId) -> bool {
        match self.nodes.get_mut(node) {
            Some(element) => {
                element.marked = true;
                true
            }
            None => false,
        }
    }

    fn clear_overlay_edges(&mut self) {
        self.overlay.clear();
    }

    fn add_overlay_edge(&mut self, id: &str, u: &NodeId, v: &NodeId) -> bool {
        let (Some(from), Some(to)) = (self.node_position(u), self.node_position(v)) else {
            return false;
        };
        self.overlay.push(OverlaySegment {
            id: id.to_string(),
            from,
            to,
        });
        true
    }
}
