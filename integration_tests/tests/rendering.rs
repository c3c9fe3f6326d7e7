mod common;

use std::time::Instant;

use common::{engine_for, four_step_run};
use replay_core::{agent_color, RenderingSurface, StepDirection};
use replay_schema::NodeId;
use serde_json::json;

#[test]
fn loading_seeds_one_agent_element_per_agent() {
    let (engine, _status_rx) = engine_for(four_step_run());
    let surface = engine.surface();
    assert_eq!(surface.agents.len(), 2);
    assert_eq!(surface.agents[&0].label, "A0");
    assert_eq!(surface.agents[&0].position.x, 0.0);
    assert_eq!(surface.agents[&1].position.x, 100.0);
}

#[test]
fn agents_on_unknown_nodes_are_skipped_but_others_render() {
    let payload = json!({
        "nodes": [{"data": {"id": "0"}, "position": {"x": 0.0, "y": 0.0}}],
        "positions": [
            ["start", [0, 9]],
            ["walk", [0, 9]],
        ],
    });
    let (mut engine, _status_rx) = engine_for(payload);
    assert!(engine.surface().agent_exists(0));
    assert!(!engine.surface().agent_exists(1));

    // applying steps keeps working for the remaining agent
    engine.step(StepDirection::Forward);
    assert!(engine
        .surface()
        .animations
        .iter()
        .all(|(agent, _, _)| *agent == 0));
}

#[test]
fn node_marks_track_exactly_the_unsettled_hosts() {
    let (mut engine, _status_rx) = engine_for(four_step_run());
    // step 0: both agents unsettled on nodes 0 and 1
    let marked: Vec<&NodeId> = engine.surface().marked.iter().collect();
    assert_eq!(marked, vec![&NodeId::from(0), &NodeId::from(1)]);

    // chase step: agent 1 has settled on node 3, only node 2 stays marked
    engine.step(StepDirection::Forward);
    engine.step(StepDirection::Forward);
    let marked: Vec<&NodeId> = engine.surface().marked.iter().collect();
    assert_eq!(marked, vec![&NodeId::from(2)]);

    // final step: everyone settled, no marks at all
    engine.step(StepDirection::Forward);
    assert!(engine.surface().marked.is_empty());
}

#[test]
fn overlay_edges_are_replaced_wholesale_each_step() {
    let (mut engine, _status_rx) = engine_for(four_step_run());
    assert!(engine.surface().overlay.is_empty());

    engine.step(StepDirection::Forward);
    assert_eq!(engine.surface().overlay.len(), 1);

    engine.step(StepDirection::Forward);
    assert_eq!(engine.surface().overlay.len(), 2);

    engine.step(StepDirection::Forward);
    assert_eq!(engine.surface().overlay.len(), 1);

    engine.step(StepDirection::Backward);
    assert_eq!(engine.surface().overlay.len(), 2);
}

#[test]
fn agent_visuals_recompute_from_leader_and_level() {
    let (mut engine, _status_rx) = engine_for(four_step_run());
    let initial = engine.surface().agents[&1].visual.color;
    assert_eq!(initial, agent_color(Some(0.0), Some(0.0)));

    // scout step raises agent 1 to level 1: darker, same hue
    engine.step(StepDirection::Forward);
    let scouted = engine.surface().agents[&1].visual.color;
    assert_eq!(scouted, agent_color(Some(0.0), Some(1.0)));
    assert_eq!(scouted.lightness, 65.0);
}

#[test]
fn visibility_toggle_changes_opacity_only() {
    let (mut engine, _status_rx) = engine_for(four_step_run());
    engine.play(Instant::now());
    let state = engine.state();
    let marks_before = engine.surface().marked.clone();

    engine.set_agents_visible(false);
    assert_eq!(engine.surface().opacity, 0.0);
    assert_eq!(engine.state(), state);
    assert_eq!(engine.surface().marked, marks_before);

    engine.set_agents_visible(true);
    assert_eq!(engine.surface().opacity, 1.0);
}
