mod common;

use std::time::{Duration, Instant};

use common::{engine_for, four_step_run};
use replay_core::{Phase, StepDirection};

/// Sweep the poll loop across a window, counting fired advances.
fn sweep(
    engine: &mut replay_core::ReplayEngine<common::RecordingSurface>,
    from: Instant,
    window_ms: u64,
) -> usize {
    let mut fired = 0;
    for ms in (0..=window_ms).step_by(10) {
        if engine.tick(from + Duration::from_millis(ms)) {
            fired += 1;
        }
    }
    fired
}

#[test]
fn four_step_run_advances_then_clamps_and_auto_pauses() {
    let (mut engine, status_rx) = engine_for(four_step_run());
    let start = Instant::now();
    engine.play(start);

    // bootstrap at +50ms, then one advance per 200ms interval
    let fired = sweep(&mut engine, start, 1_000);
    assert_eq!(fired, 4);

    let state = engine.state();
    assert_eq!(state.current, 3);
    assert!(state.paused);
    assert_eq!(engine.phase(), Phase::Finished);

    let lines = common::drain(&status_rx);
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Done: follow_leader (Step 3/3)")
    );

    // nothing further fires once finished
    assert_eq!(sweep(&mut engine, start + Duration::from_secs(2), 1_000), 0);
}

#[test]
fn double_play_produces_a_single_advance_per_transition() {
    let (mut engine, _status_rx) = engine_for(four_step_run());
    let start = Instant::now();
    engine.play(start);
    engine.play(start);

    // window covering the bootstrap but not the following interval
    let fired = sweep(&mut engine, start, 140);
    assert_eq!(fired, 1);
    assert_eq!(engine.state().current, 1);
}

#[test]
fn pause_is_idempotent_and_halts_interpolation_once() {
    let (mut engine, _status_rx) = engine_for(four_step_run());
    let start = Instant::now();
    engine.play(start);
    engine.tick(start + Duration::from_millis(50));
    assert!(!engine.surface().animations.is_empty());

    engine.pause();
    assert_eq!(engine.surface().halt_calls, 1);
    let state = engine.state();

    engine.pause();
    assert_eq!(engine.surface().halt_calls, 1);
    assert_eq!(engine.state(), state);
}

#[test]
fn pausing_cancels_the_pending_advance() {
    let (mut engine, _status_rx) = engine_for(four_step_run());
    let start = Instant::now();
    engine.play(start);
    engine.pause();
    assert_eq!(sweep(&mut engine, start, 2_000), 0);
    assert_eq!(engine.state().current, 0);
}

#[test]
fn manual_steps_stay_inside_bounds() {
    let (mut engine, status_rx) = engine_for(four_step_run());

    engine.step(StepDirection::Backward);
    assert_eq!(engine.state().current, 0);

    for _ in 0..10 {
        engine.step(StepDirection::Forward);
    }
    assert_eq!(engine.state().current, 3);

    let lines = common::drain(&status_rx);
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Step: 3 / 3 (follow_leader)")
    );
}

#[test]
fn stepping_while_playing_pauses_first() {
    let (mut engine, _status_rx) = engine_for(four_step_run());
    let start = Instant::now();
    engine.play(start);
    engine.step(StepDirection::Forward);
    assert!(engine.state().paused);
    // the cancelled advance never fires on top of the manual step
    assert_eq!(sweep(&mut engine, start, 2_000), 0);
}

#[test]
fn play_at_the_end_replays_from_step_zero() {
    let (mut engine, status_rx) = engine_for(four_step_run());
    for _ in 0..3 {
        engine.step(StepDirection::Forward);
    }
    assert_eq!(engine.state().current, 3);
    common::drain(&status_rx);

    let restart = Instant::now();
    engine.play(restart);
    assert!(!engine.state().paused);
    assert_eq!(engine.state().current, 0);
    let lines = common::drain(&status_rx);
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Step: 0 / 3 (start)")
    );

    // replay bootstraps with the fixed short delay
    assert!(engine.tick(restart + Duration::from_millis(50)));
}

#[test]
fn refiltering_during_playback_never_fires_a_stale_advance() {
    let (mut engine, _status_rx) = engine_for(four_step_run());
    let start = Instant::now();
    engine.play(start);

    engine.set_filter_flags(replay_core::FilterFlags {
        show_scout: false,
        show_chase: true,
        show_follow: true,
    });
    assert_eq!(engine.phase(), Phase::Ready);
    assert_eq!(sweep(&mut engine, start, 2_000), 0);
    assert_eq!(engine.state().current, 0);
}

#[test]
fn single_step_run_reports_initial_state() {
    let (engine, status_rx) = engine_for(serde_json::json!({
        "nodes": [{"data": {"id": "0"}, "position": {"x": 0.0, "y": 0.0}}],
        "positions": [["start", [0]]],
    }));
    assert_eq!(engine.state().total, 1);
    let lines = common::drain(&status_rx);
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Initial State: start (No steps to animate)")
    );
}
