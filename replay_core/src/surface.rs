//! Minimal rendering-surface contract the engine draws through.
//!
//! The engine never touches drawing primitives, layout, or hit-testing; it
//! only adds/removes/queries elements, applies styles, and requests
//! position animation. The surface owns the interpolation clock.

use std::time::Duration;

use replay_schema::{NodeId, Point};

use crate::render::AgentVisual;

/// Border treatment marking an agent's settlement status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SettlementMark {
    #[default]
    None,
    /// Settled for good: solid highlighted border.
    Solid,
    /// Settled but waiting on peers: dashed highlighted border.
    Dashed,
}

/// Initial agent element created when a run is (re)seeded.
#[derive(Debug, Clone)]
pub struct AgentSeed {
    pub agent: usize,
    pub label: String,
    pub position: Point,
    pub visual: AgentVisual,
}

pub trait RenderingSurface {
    /// Drop all agent elements and create one per seed.
    fn reset_agents(&mut self, seeds: &[AgentSeed]);

    /// Drop all agent elements.
    fn clear_agents(&mut self);

    fn agent_exists(&self, agent: usize) -> bool;

    /// Layout coordinate of a node element, if the node exists.
    fn node_position(&self, node: &NodeId) -> Option<Point>;

    fn apply_agent_visual(&mut self, agent: usize, visual: AgentVisual);

    /// Begin interpolating an agent toward `target` over `duration`.
    fn animate_agent_to(&mut self, agent: usize, target: Point, duration: Duration);

    /// Freeze all in-flight interpolation at its current value. Must not
    /// snap agents to their targets.
    fn halt_motion(&mut self);

    /// Uniform opacity applied to every agent element.
    fn set_agent_opacity(&mut self, opacity: f32);

    fn clear_unsettled_marks(&mut self);

    /// Mark a node as hosting at least one unsettled agent. Returns false
    /// when the node has no surface element.
    fn mark_unsettled(&mut self, node: &NodeId) -> bool;

    fn clear_overlay_edges(&mut self);

    /// Add one overlay edge for the current step. Returns false when an
    /// endpoint has no surface element.
    fn add_overlay_edge(&mut self, id: &str, u: &NodeId, v: &NodeId) -> bool;
}
