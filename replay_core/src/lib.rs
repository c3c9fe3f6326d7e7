//! Playback engine for recorded multi-agent simulation runs.
//!
//! Turns an immutable step log into a controlled, filterable, replayable
//! animation: phase filtering (step 0 always retained), a poll-driven
//! playback state machine with a single cancellable advance deadline, and
//! per-step recomputation of derived visuals applied through a minimal
//! rendering-surface trait.

pub mod config;
pub mod engine;
pub mod filter;
pub mod playback;
pub mod render;
pub mod surface;
pub mod tooltip;

pub use config::{
    load_replay_config_from_env, ReplayConfig, ReplayConfigError, MIN_ANIMATION_DURATION_MS,
};
pub use engine::{ReplayEngine, ReplayError, StatusSink};
pub use filter::{filter_steps, FilterFlags, FilteredLog, StepFrame};
pub use playback::{
    Advance, Phase, PlayOutcome, PlaybackController, PlaybackState, StepDirection, StepOutcome,
    StepTiming,
};
pub use render::{agent_color, agent_visual, AgentColor, AgentVisual, StepRenderer};
pub use surface::{AgentSeed, RenderingSurface, SettlementMark};
pub use tooltip::{aggregate, place_near_pointer, Placement, TooltipBucket, TooltipContent};
