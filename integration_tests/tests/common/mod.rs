//! Shared fixtures: a recording surface test double and run builders.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

use serde_json::{json, Value};

use replay_core::{
    AgentSeed, AgentVisual, ReplayConfig, ReplayEngine, RenderingSurface, StatusSink,
};
use replay_schema::{Dataset, NodeId, Point, SimulationData};

#[derive(Debug, Clone)]
pub struct AgentState {
    pub label: String,
    pub visual: AgentVisual,
    pub position: Point,
}

/// Test double recording every mutation the engine performs on it.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    nodes: BTreeMap<NodeId, Point>,
    pub agents: BTreeMap<usize, AgentState>,
    pub marked: BTreeSet<NodeId>,
    pub overlay: Vec<String>,
    pub opacity: f32,
    pub halt_calls: usize,
    pub animations: Vec<(usize, Point, Duration)>,
    pub reseeds: usize,
}

impl RecordingSurface {
    pub fn from_data(data: &SimulationData) -> Self {
        let mut surface = Self {
            opacity: 1.0,
            ..Self::default()
        };
        for descriptor in &data.nodes {
            surface.nodes.insert(
                descriptor.data.id.clone(),
                descriptor.position.unwrap_or_default(),
            );
        }
        surface
    }
}

impl RenderingSurface for RecordingSurface {
    fn reset_agents(&mut self, seeds: &[AgentSeed]) {
        self.agents.clear();
        self.reseeds += 1;
        for seed in seeds {
            self.agents.insert(
                seed.agent,
                AgentState {
                    label: seed.label.clone(),
                    visual: seed.visual,
                    position: seed.position,
                },
            );
        }
    }

    fn clear_agents(&mut self) {
        self.agents.clear();
    }

    fn agent_exists(&self, agent: usize) -> bool {
        self.agents.contains_key(&agent)
    }

    fn node_position(&self, node: &NodeId) -> Option<Point> {
        self.nodes.get(node).copied()
    }

    fn apply_agent_visual(&mut self, agent: usize, visual: AgentVisual) {
        if let Some(state) = self.agents.get_mut(&agent) {
            state.visual = visual;
        }
    }

    fn animate_agent_to(&mut self, agent: usize, target: Point, duration: Duration) {
        if let Some(state) = self.agents.get_mut(&agent) {
            state.position = target;
        }
        self.animations.push((agent, target, duration));
    }

    fn halt_motion(&mut self) {
        self.halt_calls += 1;
    }

    fn set_agent_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    fn clear_unsettled_marks(&mut self) {
        self.marked.clear();
    }

    fn mark_unsettled(&mut self, node: &NodeId) -> bool {
        if !self.nodes.contains_key(node) {
            return false;
        }
        self.marked.insert(node.clone());
        true
    }

    fn clear_overlay_edges(&mut self) {
        self.overlay.clear();
    }

    fn add_overlay_edge(&mut self, id: &str, u: &NodeId, v: &NodeId) -> bool {
        if !self.nodes.contains_key(u) || !self.nodes.contains_key(v) {
            return false;
        }
        self.overlay.push(id.to_string());
        true
    }
}

/// Four nodes in a row, two agents walking right, one phase per keyword.
pub fn four_step_run() -> Value {
    json!({
        "nodes": [
            {"data": {"id": "0"}, "position": {"x": 0.0, "y": 0.0}},
            {"data": {"id": "1"}, "position": {"x": 100.0, "y": 0.0}},
            {"data": {"id": "2"}, "position": {"x": 200.0, "y": 0.0}},
            {"data": {"id": "3"}, "position": {"x": 300.0, "y": 0.0}},
        ],
        "edges": [
            {"data": {"id": "0-1", "source": "0", "target": "1"}},
            {"data": {"id": "1-2", "source": "1", "target": "2"}},
            {"data": {"id": "2-3", "source": "2", "target": "3"}},
        ],
        "positions": [
            ["start", [0, 1]],
            ["scout_forward", [1, 2]],
            ["chase_leader", [2, 3]],
            ["follow_leader", [3, 3]],
        ],
        "statuses": [
            ["start", [1, 1]],
            ["scout_forward", [1, 1]],
            ["chase_leader", [1, 0]],
            ["follow_leader", [0, 0]],
        ],
        "homes": [
            ["start", [null, null]],
            ["scout_forward", [null, null]],
            ["chase_leader", [null, 3]],
            ["follow_leader", [3, 3]],
        ],
        "leaders": [
            ["start", [0, 0]],
            ["scout_forward", [0, 0]],
            ["chase_leader", [0, 0]],
            ["follow_leader", [0, 0]],
        ],
        "levels": [
            ["start", [0, 0]],
            ["scout_forward", [0, 1]],
            ["chase_leader", [0, 1]],
            ["follow_leader", [0, 1]],
        ],
        "tree_edges": [
            ["start", []],
            ["scout_forward", [["0", "1"]]],
            ["chase_leader", [{"u": "1", "v": "2"}, {"u": "2", "v": "3"}]],
            ["follow_leader", [{"u": "2", "v": "3"}]],
        ],
        "node_settled_states": [
            ["start", {"0": null, "1": null, "2": null, "3": null}],
            ["scout_forward", {"0": null, "1": null, "2": null, "3": null}],
            ["chase_leader", {"0": null, "1": null, "2": null, "3": {"settled_agent_id": 1}}],
            ["follow_leader", {"0": null, "1": null, "2": null, "3": {"settled_agent_id": 1}}],
        ],
    })
}

pub fn dataset(value: Value) -> Dataset {
    Dataset::from_value(value).expect("fixture payload should ingest")
}

/// Fast timings so scheduled advances land on easily stepped instants.
pub fn test_config() -> ReplayConfig {
    ReplayConfig {
        animation_duration_ms: 100,
        pause_gap_ms: Some(100),
        bootstrap_delay_ms: 50,
    }
}

/// Engine over a recording surface plus the stream of status lines.
pub fn engine_for(value: Value) -> (ReplayEngine<RecordingSurface>, Receiver<String>) {
    let run = dataset(value);
    let surface = RecordingSurface::from_data(run.data());
    let (status_tx, status_rx) = channel::<String>();
    let status: StatusSink = Box::new(move |line| {
        let _ = status_tx.send(line.to_string());
    });
    let engine = ReplayEngine::load(surface, run, test_config(), status);
    (engine, status_rx)
}

pub fn drain(status_rx: &Receiver<String>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(line) = status_rx.try_recv() {
        lines.push(line);
    }
    lines
}
