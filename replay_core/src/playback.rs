//! Playback state machine and advance scheduling.
//!
//! The controller is poll-driven: the host loop calls [`PlaybackController::poll`]
//! with the current instant. At most one advance deadline is pending at any
//! time; every schedule or cancel bumps a generation token, so a deadline
//! that is no longer current can never advance the index.

use std::time::{Duration, Instant};

use tracing::trace;

/// Current playback pointer. Mutated only by [`PlaybackController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub current: usize,
    pub total: usize,
    pub paused: bool,
}

/// Derived lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No steps loaded.
    Idle,
    /// Paused at step 0, nothing played yet.
    Ready,
    Playing,
    Paused,
    /// Auto-paused on the last step after the advance loop ran out.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Forward,
    Backward,
}

/// Result of a `play` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Already playing (or nothing loaded); state unchanged.
    Ignored,
    /// Entered `Playing`; the next advance is scheduled.
    Resumed,
    /// Was at the end: index reset to 0, step 0 must render immediately.
    Replayed,
}

/// Result of a manual step: the index to render synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved(usize),
    /// Already at the boundary; re-render the current frame only.
    Boundary(usize),
}

/// A fired advance. `render_index` is the step to apply; `finished` is set
/// when the run just auto-paused on its last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    pub render_index: usize,
    pub finished: bool,
}

/// Step timing resolved from configuration.
#[derive(Debug, Clone, Copy)]
pub struct StepTiming {
    pub step_interval: Duration,
    pub bootstrap_delay: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    due: Instant,
    token: u64,
}

#[derive(Debug)]
pub struct PlaybackController {
    state: PlaybackState,
    timing: StepTiming,
    pending: Option<Deadline>,
    epoch: u64,
    finished: bool,
}

impl PlaybackController {
    pub fn new(timing: StepTiming) -> Self {
        Self {
            state: PlaybackState {
                current: 0,
                total: 0,
                paused: true,
            },
            timing,
            pending: None,
            epoch: 0,
            finished: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.state.current
    }

    pub fn total(&self) -> usize {
        self.state.total
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn phase(&self) -> Phase {
        if self.state.total == 0 {
            Phase::Idle
        } else if !self.state.paused {
            Phase::Playing
        } else if self.finished {
            Phase::Finished
        } else if self.state.current == 0 {
            Phase::Ready
        } else {
            Phase::Paused
        }
    }

    /// Whether an advance deadline is outstanding. At most one ever is.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Reset for a freshly loaded run. Unconditionally cancels any pending
    /// advance so a stale deadline can never fire against a new log.
    pub fn reset(&mut self, total: usize) {
        self.cancel();
        self.state = PlaybackState {
            current: 0,
            total,
            paused: true,
        };
        self.finished = false;
    }

    pub fn play(&mut self, now: Instant) -> PlayOutcome {
        if self.state.total == 0 || !self.state.paused {
            return PlayOutcome::Ignored;
        }
        self.finished = false;

        // At or past the last step: replay from the top. Step 0 renders
        // immediately and the next advance uses the bootstrap delay.
        if self.state.current + 1 >= self.state.total && self.state.total > 1 {
            self.state.current = 0;
            self.state.paused = false;
            self.schedule(self.timing.bootstrap_delay, now);
            trace!(target: "swarm_replay::playback", "play.replay");
            return PlayOutcome::Replayed;
        }

        self.state.paused = false;
        let delay = if self.state.current == 0 {
            self.timing.bootstrap_delay
        } else {
            self.timing.step_interval
        };
        self.schedule(delay, now);
        trace!(target: "swarm_replay::playback", index = self.state.current, "play.resume");
        PlayOutcome::Resumed
    }

    /// Returns true when the call actually paused a playing run.
    pub fn pause(&mut self) -> bool {
        if self.state.paused {
            return false;
        }
        self.cancel();
        self.state.paused = true;
        trace!(target: "swarm_replay::playback", index = self.state.current, "pause");
        true
    }

    /// Manual single step; forces a synchronous pause first. Never moves
    /// the index outside `[0, total-1]`.
    pub fn step(&mut self, direction: StepDirection) -> StepOutcome {
        self.pause();
        self.finished = false;
        match direction {
            StepDirection::Forward if self.state.current + 1 < self.state.total => {
                self.state.current += 1;
                StepOutcome::Moved(self.state.current)
            }
            StepDirection::Backward if self.state.current > 0 => {
                self.state.current -= 1;
                StepOutcome::Moved(self.state.current)
            }
            _ => StepOutcome::Boundary(self.state.current),
        }
    }

    /// Fire the pending advance if its deadline has passed and it is still
    /// current. Renders step `current`, then moves the pointer; when the
    /// new pointer would overrun, it clamps to the last step and
    /// auto-pauses instead.
    pub fn poll(&mut self, now: Instant) -> Option<Advance> {
        let deadline = self.pending?;
        if deadline.token != self.epoch {
            // Superseded by a later schedule/cancel; drop silently.
            self.pending = None;
            return None;
        }
        if now < deadline.due {
            return None;
        }
        self.pending = None;

        let render_index = self.state.current;
        self.state.current += 1;
        let finished = if self.state.current >= self.state.total {
            self.state.current = self.state.total.saturating_sub(1);
            self.state.paused = true;
            self.finished = true;
            trace!(target: "swarm_replay::playback", index = self.state.current, "advance.finished");
            true
        } else {
            self.schedule(self.timing.step_interval, now);
            false
        };
        Some(Advance {
            render_index,
            finished,
        })
    }

    /// Replacing the pending deadline is the single guard against
    /// duplicate timers double-advancing the index.
    fn schedule(&mut self, delay: Duration, now: Instant) {
        self.epoch += 1;
        self.pending = Some(Deadline {
            due: now + delay,
            token: self.epoch,
        });
    }

    fn cancel(&mut self) {
        self.epoch += 1;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing() -> StepTiming {
        StepTiming {
            step_interval: Duration::from_millis(450),
            bootstrap_delay: Duration::from_millis(50),
        }
    }

    fn controller(total: usize) -> PlaybackController {
        let mut controller = PlaybackController::new(timing());
        controller.reset(total);
        controller
    }

    #[test]
    fn play_while_playing_is_a_no_op() {
        let now = Instant::now();
        let mut playback = controller(4);
        assert_eq!(playback.play(now), PlayOutcome::Resumed);
        let before = playback.state();
        assert_eq!(playback.play(now), PlayOutcome::Ignored);
        assert_eq!(playback.state(), before);
    }

    #[test]
    fn pause_twice_leaves_state_unchanged() {
        let now = Instant::now();
        let mut playback = controller(4);
        playback.play(now);
        assert!(playback.pause());
        let before = playback.state();
        assert!(!playback.pause());
        assert_eq!(playback.state(), before);
    }

    #[test]
    fn double_play_never_produces_two_advances_for_one_transition() {
        let now = Instant::now();
        let mut playback = controller(4);
        playback.play(now);
        playback.play(now);
        assert!(playback.has_pending());

        let due = now + timing().bootstrap_delay;
        let first = playback.poll(due);
        assert_eq!(
            first,
            Some(Advance {
                render_index: 0,
                finished: false,
            })
        );
        // same instant again: the replacement deadline is not due yet
        assert_eq!(playback.poll(due), None);
        assert_eq!(playback.current_index(), 1);
    }

    #[test]
    fn four_step_run_advances_then_clamps_and_auto_pauses() {
        let mut now = Instant::now();
        let mut playback = controller(4);
        playback.play(now);

        let mut rendered = Vec::new();
        for _ in 0..16 {
            now += Duration::from_millis(25);
            if let Some(advance) = playback.poll(now) {
                rendered.push(advance.render_index);
                if advance.finished {
                    break;
                }
            }
        }

        assert_eq!(rendered, vec![0, 1, 2, 3]);
        assert_eq!(playback.current_index(), 3);
        assert!(playback.is_paused());
        assert_eq!(playback.phase(), Phase::Finished);
        assert!(!playback.has_pending());
    }

    #[test]
    fn first_advance_uses_the_bootstrap_delay() {
        let now = Instant::now();
        let mut playback = controller(4);
        playback.play(now);
        assert_eq!(playback.poll(now + Duration::from_millis(49)), None);
        assert!(playback
            .poll(now + timing().bootstrap_delay)
            .is_some());
    }

    #[test]
    fn later_advances_use_the_step_interval() {
        let now = Instant::now();
        let mut playback = controller(4);
        playback.play(now);
        let fired_at = now + timing().bootstrap_delay;
        playback.poll(fired_at).expect("bootstrap advance");
        assert_eq!(
            playback.poll(fired_at + timing().step_interval - Duration::from_millis(1)),
            None
        );
        assert!(playback
            .poll(fired_at + timing().step_interval)
            .is_some());
    }

    #[test]
    fn step_never_leaves_bounds() {
        let mut playback = controller(3);
        assert_eq!(
            playback.step(StepDirection::Backward),
            StepOutcome::Boundary(0)
        );
        assert_eq!(playback.step(StepDirection::Forward), StepOutcome::Moved(1));
        assert_eq!(playback.step(StepDirection::Forward), StepOutcome::Moved(2));
        assert_eq!(
            playback.step(StepDirection::Forward),
            StepOutcome::Boundary(2)
        );
        assert_eq!(playback.current_index(), 2);
    }

    #[test]
    fn step_while_playing_pauses_first() {
        let now = Instant::now();
        let mut playback = controller(4);
        playback.play(now);
        assert!(playback.has_pending());
        playback.step(StepDirection::Forward);
        assert!(playback.is_paused());
        assert!(!playback.has_pending());
    }

    #[test]
    fn play_at_the_end_replays_from_step_zero() {
        let mut playback = controller(3);
        playback.step(StepDirection::Forward);
        playback.step(StepDirection::Forward);
        assert_eq!(playback.current_index(), 2);

        let now = Instant::now();
        assert_eq!(playback.play(now), PlayOutcome::Replayed);
        assert_eq!(playback.current_index(), 0);
        assert!(!playback.is_paused());
        // the replay bootstrap fires after the fixed short delay
        assert!(playback.poll(now + timing().bootstrap_delay).is_some());
    }

    #[test]
    fn reset_cancels_a_pending_advance() {
        let now = Instant::now();
        let mut playback = controller(4);
        playback.play(now);
        assert!(playback.has_pending());
        playback.reset(2);
        assert!(!playback.has_pending());
        assert_eq!(playback.poll(now + Duration::from_secs(10)), None);
        assert_eq!(playback.phase(), Phase::Ready);
    }

    #[test]
    fn empty_run_ignores_play() {
        let mut playback = controller(0);
        assert_eq!(playback.play(Instant::now()), PlayOutcome::Ignored);
        assert_eq!(playback.phase(), Phase::Idle);
    }

    #[test]
    fn single_step_run_renders_step_zero_then_finishes() {
        let now = Instant::now();
        let mut playback = controller(1);
        assert_eq!(playback.play(now), PlayOutcome::Resumed);
        let advance = playback.poll(now + timing().bootstrap_delay).unwrap();
        assert_eq!(advance.render_index, 0);
        assert!(advance.finished);
        assert_eq!(playback.current_index(), 0);
    }
}
