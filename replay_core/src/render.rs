//! Derived visual state, recomputed in full for every applied step.

use std::time::Duration;

use tracing::warn;

use replay_schema::AgentStatus;

use crate::filter::{FilteredLog, StepFrame};
use crate::surface::{AgentSeed, RenderingSurface, SettlementMark};

/// Hue stride between sibling leader ids; close to the golden angle so
/// consecutive leaders land far apart on the wheel.
const HUE_STRIDE: f64 = 137.5;
const SATURATION: f32 = 70.0;

/// HSL agent color derived from hierarchy metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentColor {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

/// `hue = (leader * 137.5) mod 360`, `lightness = clamp(80 - level*15,
/// 20, 80)`. Non-finite or missing inputs default to 0.
pub fn agent_color(leader: Option<f64>, level: Option<f64>) -> AgentColor {
    let id = leader.filter(|value| value.is_finite()).unwrap_or(0.0);
    let lvl = level.filter(|value| value.is_finite()).unwrap_or(0.0);
    let hue = (id * HUE_STRIDE).rem_euclid(360.0);
    let lightness = (80.0 - lvl * 15.0).clamp(20.0, 80.0);
    AgentColor {
        hue: hue as f32,
        saturation: SATURATION,
        lightness: lightness as f32,
    }
}

/// Full per-agent visual for one step. Never cached across steps:
/// leader/level can change discontinuously, so this is recomputed fresh
/// on every applied step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentVisual {
    pub color: AgentColor,
    pub settlement: SettlementMark,
}

pub fn agent_visual(frame: &StepFrame, agent: usize) -> AgentVisual {
    let color = agent_color(frame.leader(agent), frame.level(agent));
    let settlement = match frame.status(agent) {
        Some(AgentStatus::Settled) => SettlementMark::Solid,
        Some(AgentStatus::SettledWait) => SettlementMark::Dashed,
        _ => SettlementMark::None,
    };
    AgentVisual { color, settlement }
}

/// Applies one filtered step to the rendering surface, fully and
/// idempotently. Missing referenced elements are logged and skipped;
/// everything else still renders.
#[derive(Debug, Clone)]
pub struct StepRenderer {
    animation_duration: Duration,
}

impl StepRenderer {
    pub fn new(animation_duration: Duration) -> Self {
        Self { animation_duration }
    }

    /// Replace all agent elements with the step-0 population at its
    /// step-0 node positions.
    pub fn seed_agents<S: RenderingSurface>(&self, surface: &mut S, log: &FilteredLog) {
        let Some(frame) = log.frame(0) else {
            surface.clear_agents();
            return;
        };
        let mut seeds = Vec::with_capacity(frame.positions.len());
        for (agent, node) in frame.positions.iter().enumerate() {
            let Some(position) = surface.node_position(node) else {
                warn!(
                    target: "swarm_replay::render",
                    agent,
                    node = %node,
                    "seed.node_missing"
                );
                continue;
            };
            seeds.push(AgentSeed {
                agent,
                label: format!("A{agent}"),
                position,
                visual: agent_visual(frame, agent),
            });
        }
        surface.reset_agents(&seeds);
    }

    /// Apply step `index` in full: display attributes, node marks, overlay
    /// edges, and motion targets.
    pub fn apply_step<S: RenderingSurface>(
        &self,
        surface: &mut S,
        log: &FilteredLog,
        index: usize,
    ) {
        let Some(frame) = log.frame(index) else {
            return;
        };
        self.apply_node_marks(surface, frame);
        self.apply_overlay_edges(surface, frame, index);
        for (agent, node) in frame.positions.iter().enumerate() {
            if !surface.agent_exists(agent) {
                warn!(
                    target: "swarm_replay::render",
                    agent,
                    step = index,
                    "render.agent_missing"
                );
                continue;
            }
            surface.apply_agent_visual(agent, agent_visual(frame, agent));
            match surface.node_position(node) {
                Some(target) => surface.animate_agent_to(agent, target, self.animation_duration),
                None => warn!(
                    target: "swarm_replay::render",
                    agent,
                    node = %node,
                    step = index,
                    "render.target_missing"
                ),
            }
        }
    }

    /// Clear all "has unsettled agent" marks, then mark exactly the nodes
    /// currently hosting at least one unsettled agent.
    fn apply_node_marks<S: RenderingSurface>(&self, surface: &mut S, frame: &StepFrame) {
        surface.clear_unsettled_marks();
        for (agent, node) in frame.positions.iter().enumerate() {
            if frame.status(agent) == Some(AgentStatus::Unsettled)
                && !surface.mark_unsettled(node)
            {
                warn!(
                    target: "swarm_replay::render",
                    agent,
                    node = %node,
                    "render.mark_node_missing"
                );
            }
        }
    }

    /// Remove the previous step's overlay edges, add exactly the declared
    /// set for this step.
    fn apply_overlay_edges<S: RenderingSurface>(
        &self,
        surface: &mut S,
        frame: &StepFrame,
        index: usize,
    ) {
        surface.clear_overlay_edges();
        for (ordinal, edge) in frame.tree_edges.iter().enumerate() {
            let id = format!("tree_{index}_{ordinal}_{}_{}", edge.u, edge.v);
            if !surface.add_overlay_edge(&id, &edge.u, &edge.v) {
                warn!(
                    target: "swarm_replay::render",
                    edge = %id,
                    "render.overlay_endpoint_missing"
                );
            }
        }
    }
}
