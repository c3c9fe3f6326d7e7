//! Phase-based step filtering.
//!
//! Produces the typed step view the rest of the engine runs on: every
//! per-step field is resolved to a default at this boundary, so downstream
//! rendering never re-checks wire optionality.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use replay_schema::{AgentStatus, Keyframe, NodeId, SimulationData, TreeEdge};

/// Which recorded phases stay in the playback sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterFlags {
    pub show_scout: bool,
    pub show_chase: bool,
    pub show_follow: bool,
}

impl Default for FilterFlags {
    fn default() -> Self {
        Self {
            show_scout: true,
            show_chase: true,
            show_follow: true,
        }
    }
}

impl FilterFlags {
    /// Whether a step with this label survives filtering. A step is
    /// dropped only when its label contains a keyword whose flag is
    /// disabled; labels matching no keyword are retained (fail-open).
    pub fn retains(&self, label: &str) -> bool {
        let label = label.to_ascii_lowercase();
        if label.contains("scout") && !self.show_scout {
            return false;
        }
        if label.contains("chase") && !self.show_chase {
            return false;
        }
        if label.contains("follow") && !self.show_follow {
            return false;
        }
        true
    }
}

/// One retained step with every per-step field resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepFrame {
    pub label: String,
    pub positions: Vec<NodeId>,
    pub statuses: Vec<AgentStatus>,
    pub homes: Vec<Option<NodeId>>,
    pub leaders: Vec<f64>,
    pub levels: Vec<f64>,
    pub tree_edges: Vec<TreeEdge>,
    pub node_settled: BTreeMap<NodeId, bool>,
}

impl StepFrame {
    pub fn status(&self, agent: usize) -> Option<AgentStatus> {
        self.statuses.get(agent).cloned()
    }

    pub fn leader(&self, agent: usize) -> Option<f64> {
        self.leaders.get(agent).copied()
    }

    pub fn level(&self, agent: usize) -> Option<f64> {
        self.levels.get(agent).copied()
    }

    pub fn home(&self, agent: usize) -> Option<&NodeId> {
        self.homes.get(agent).and_then(|home| home.as_ref())
    }

    /// Indices of every agent positioned at `node` in this step.
    pub fn agents_at<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = usize> + 'a {
        self.positions
            .iter()
            .enumerate()
            .filter(move |(_, at)| *at == node)
            .map(|(agent, _)| agent)
    }
}

/// Filtered playback sequence. Step 0 of the raw run is always retained;
/// frames are read-only once produced.
#[derive(Debug, Clone, Default)]
pub struct FilteredLog {
    steps: Vec<StepFrame>,
}

impl FilteredLog {
    pub fn total(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&StepFrame> {
        self.steps.get(index)
    }

    pub fn frames(&self) -> &[StepFrame] {
        &self.steps
    }

    /// Agent population of the run (step-0 positions are authoritative).
    pub fn agent_count(&self) -> usize {
        self.steps
            .first()
            .map(|frame| frame.positions.len())
            .unwrap_or(0)
    }
}

/// Filter a raw run by phase flags. Step 0 is included unconditionally;
/// a dropped step is dropped atomically across all parallel fields.
pub fn filter_steps(data: &SimulationData, flags: FilterFlags) -> FilteredLog {
    let mut steps = Vec::with_capacity(data.positions.len());
    for (index, keyframe) in data.positions.iter().enumerate() {
        if index > 0 && !flags.retains(&keyframe.label) {
            trace!(
                target: "swarm_replay::filter",
                index,
                label = %keyframe.label,
                "step.dropped"
            );
            continue;
        }
        steps.push(frame_at(data, index));
    }
    info!(
        target: "swarm_replay::filter",
        raw = data.positions.len(),
        kept = steps.len(),
        "filter.applied"
    );
    FilteredLog { steps }
}

fn frame_at(data: &SimulationData, index: usize) -> StepFrame {
    StepFrame {
        label: data.positions[index].label.clone(),
        positions: data.positions[index].values.clone(),
        statuses: step_values(&data.statuses, index),
        homes: step_values(&data.homes, index),
        leaders: step_values(&data.leaders, index),
        levels: step_values(&data.levels, index),
        tree_edges: step_values(&data.tree_edges, index),
        node_settled: step_values(&data.node_settled_states, index).0,
    }
}

/// Per-step lookup resolving an absent sequence or entry to the default.
fn step_values<T: Clone + Default>(series: &[Keyframe<T>], index: usize) -> T {
    series
        .get(index)
        .map(|keyframe| keyframe.values.clone())
        .unwrap_or_default()
}
