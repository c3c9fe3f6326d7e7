//! Co-located agent aggregation for hover tooltips, plus pointer-anchored
//! placement with overflow handling.

use replay_schema::{AgentStatus, NodeId};

use crate::filter::StepFrame;

/// One status bucket in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipBucket {
    /// None when an agent carries no recorded status at this step.
    pub status: Option<AgentStatus>,
    pub entries: Vec<String>,
}

impl TooltipBucket {
    pub fn status_label(&self) -> String {
        match &self.status {
            Some(status) => status.to_string(),
            None => "unknown".to_string(),
        }
    }
}

/// Aggregated tooltip content for one node at one step.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipContent {
    pub node: NodeId,
    pub total: usize,
    pub buckets: Vec<TooltipBucket>,
}

impl TooltipContent {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Plain-text rendering: header line, count, one line per bucket.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Node {}", self.node)];
        if self.total == 0 {
            lines.push("No agents at this node at this step.".to_string());
            return lines;
        }
        lines.push(format!("Agents here: {}", self.total));
        for bucket in &self.buckets {
            lines.push(format!(
                "{}: {}",
                bucket.status_label(),
                bucket.entries.join(", ")
            ));
        }
        lines
    }
}

/// Group every agent positioned at `node` by status. Buckets appear in
/// fixed preferred order (settled, settledWait, unsettled), then any other
/// observed status in first-seen order; empty buckets are omitted. Only
/// settled/settledWait entries carry the recorded home node.
pub fn aggregate(frame: &StepFrame, node: &NodeId) -> TooltipContent {
    let mut grouped: Vec<(Option<AgentStatus>, Vec<String>)> = vec![
        (Some(AgentStatus::Settled), Vec::new()),
        (Some(AgentStatus::SettledWait), Vec::new()),
        (Some(AgentStatus::Unsettled), Vec::new()),
    ];

    let mut total = 0;
    for agent in frame.agents_at(node) {
        total += 1;
        let status = frame.status(agent);
        let entry = if status.as_ref().is_some_and(AgentStatus::shows_home) {
            match frame.home(agent) {
                Some(home) => format!("A{agent}({home})"),
                None => format!("A{agent}(?)"),
            }
        } else {
            format!("A{agent}")
        };
        match grouped.iter_mut().find(|(key, _)| *key == status) {
            Some((_, entries)) => entries.push(entry),
            None => grouped.push((status, vec![entry])),
        }
    }

    TooltipContent {
        node: node.clone(),
        total,
        buckets: grouped
            .into_iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(status, entries)| TooltipBucket { status, entries })
            .collect(),
    }
}

/// Resolved tooltip position in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
}

/// Anchor a tooltip of `size` near `pointer` with an `inset` gap. Flips to
/// the opposite side of the pointer on right/bottom viewport overflow and
/// clamps to the inset on left/top overflow.
pub fn place_near_pointer(
    pointer: (f64, f64),
    size: (f64, f64),
    viewport: (f64, f64),
    inset: f64,
) -> Placement {
    let mut x = pointer.0 + inset;
    let mut y = pointer.1 + inset;
    if x + size.0 > viewport.0 {
        x = pointer.0 - size.0 - inset;
    }
    if y + size.1 > viewport.1 {
        y = pointer.1 - size.1 - inset;
    }
    if x < 0.0 {
        x = inset;
    }
    if y < 0.0 {
        y = inset;
    }
    Placement { x, y }
}
