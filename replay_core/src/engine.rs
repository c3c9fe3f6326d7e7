//! The replay engine instance.
//!
//! Owns the rendering-surface handle, the loaded run, the filtered-log
//! snapshot, playback state, and configuration, so multiple concurrent
//! instances are safe. All index changes go through the embedded
//! [`PlaybackController`].

use std::time::Instant;

use thiserror::Error;
use tracing::info;

use replay_schema::{Dataset, IngestError, NodeId};

use crate::config::ReplayConfig;
use crate::filter::{filter_steps, FilterFlags, FilteredLog, StepFrame};
use crate::playback::{
    Phase, PlayOutcome, PlaybackController, PlaybackState, StepDirection, StepOutcome, StepTiming,
};
use crate::render::StepRenderer;
use crate::surface::RenderingSurface;
use crate::tooltip::{aggregate, TooltipContent};

/// Receives human-readable progress strings for the UI status line.
pub type StatusSink = Box<dyn Fn(&str) + Send>;

#[derive(Debug, Error)]
pub enum ReplayError {
    /// Required rendering facilities were absent at load; the engine is
    /// left uninitialized.
    #[error("rendering surface unavailable: {0}")]
    MissingSurface(String),
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

pub struct ReplayEngine<S: RenderingSurface> {
    surface: S,
    dataset: Dataset,
    filtered: FilteredLog,
    controller: PlaybackController,
    renderer: StepRenderer,
    config: ReplayConfig,
    flags: FilterFlags,
    agents_visible: bool,
    status: StatusSink,
}

impl<S: RenderingSurface> ReplayEngine<S> {
    /// Initialize with default filter flags, seed the surface with the
    /// step-0 population, render step 0, and report the initial status.
    pub fn load(surface: S, dataset: Dataset, config: ReplayConfig, status: StatusSink) -> Self {
        let config = config.normalized();
        let timing = StepTiming {
            step_interval: config.step_interval(),
            bootstrap_delay: config.bootstrap_delay(),
        };
        let renderer = StepRenderer::new(config.animation_duration());
        let mut engine = Self {
            surface,
            dataset,
            filtered: FilteredLog::default(),
            controller: PlaybackController::new(timing),
            renderer,
            config,
            flags: FilterFlags::default(),
            agents_visible: true,
            status,
        };
        engine.rebuild();
        engine
    }

    /// Swap in a new run. The pending advance (if any) is cancelled before
    /// the old log is dropped; playback resets wholesale.
    pub fn load_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.filtered = filter_steps(self.dataset.data(), self.flags);
        self.controller.reset(self.filtered.total());
        self.renderer.seed_agents(&mut self.surface, &self.filtered);
        if !self.filtered.is_empty() {
            self.renderer.apply_step(&mut self.surface, &self.filtered, 0);
        }
        self.apply_visibility();
        self.emit_status_for(0);
        info!(
            target: "swarm_replay::engine",
            steps = self.filtered.total(),
            agents = self.filtered.agent_count(),
            "engine.loaded"
        );
    }

    pub fn play(&mut self, now: Instant) {
        if let PlayOutcome::Replayed = self.controller.play(now) {
            self.renderer.apply_step(&mut self.surface, &self.filtered, 0);
            self.emit_status_for(0);
        }
    }

    /// Cancels the pending advance and freezes in-flight interpolation at
    /// its current value.
    pub fn pause(&mut self) {
        if self.controller.pause() {
            self.surface.halt_motion();
        }
    }

    pub fn toggle_play(&mut self, now: Instant) {
        if self.controller.is_paused() {
            self.play(now);
        } else {
            self.pause();
        }
    }

    /// Manual single step: pauses first, then renders synchronously. At a
    /// boundary the current frame re-renders and nothing moves.
    pub fn step(&mut self, direction: StepDirection) {
        self.pause();
        let index = match self.controller.step(direction) {
            StepOutcome::Moved(index) | StepOutcome::Boundary(index) => index,
        };
        self.renderer.apply_step(&mut self.surface, &self.filtered, index);
        self.emit_status_for(index);
    }

    /// Drive the advance loop. Returns true when a step was rendered.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(advance) = self.controller.poll(now) else {
            return false;
        };
        self.renderer
            .apply_step(&mut self.surface, &self.filtered, advance.render_index);
        self.emit_status_for(advance.render_index);
        true
    }

    /// Refilter and reset playback. No-op when the flags are unchanged.
    pub fn set_filter_flags(&mut self, flags: FilterFlags) {
        if flags == self.flags {
            return;
        }
        self.flags = flags;
        self.rebuild();
    }

    pub fn filter_flags(&self) -> FilterFlags {
        self.flags
    }

    /// Visibility affects agent opacity only, never playback state.
    pub fn set_agents_visible(&mut self, visible: bool) {
        self.agents_visible = visible;
        self.apply_visibility();
    }

    pub fn agents_visible(&self) -> bool {
        self.agents_visible
    }

    fn apply_visibility(&mut self) {
        self.surface
            .set_agent_opacity(if self.agents_visible { 1.0 } else { 0.0 });
    }

    /// Aggregate the agents at `node` for the step currently on screen.
    /// None when no run is loaded.
    pub fn tooltip(&self, node: &NodeId) -> Option<TooltipContent> {
        self.filtered
            .frame(self.display_index())
            .map(|frame| aggregate(frame, node))
    }

    /// The verbatim JSON object the run was loaded from.
    pub fn export_json(&self) -> String {
        self.dataset.export_json()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn filtered(&self) -> &FilteredLog {
        &self.filtered
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn current_frame(&self) -> Option<&StepFrame> {
        self.filtered.frame(self.display_index())
    }

    /// Index of the step currently on screen (the pointer can sit one past
    /// the last rendered step between scheduled advances).
    fn display_index(&self) -> usize {
        self.controller
            .current_index()
            .min(self.filtered.total().saturating_sub(1))
    }

    pub fn status_line(&self) -> String {
        self.status_for_index(self.display_index())
    }

    fn emit_status_for(&self, index: usize) {
        (self.status)(&self.status_for_index(index));
    }

    fn status_for_index(&self, index: usize) -> String {
        let total = self.filtered.total();
        if total == 0 {
            return "No simulation data.".to_string();
        }
        let label_of = |step: usize| {
            self.filtered
                .frame(step)
                .map(|frame| frame.label.clone())
                .unwrap_or_default()
        };
        if total == 1 {
            return format!("Initial State: {} (No steps to animate)", label_of(0));
        }
        if self.controller.phase() == Phase::Finished {
            return format!(
                "Done: {} (Step {}/{})",
                label_of(total - 1),
                total - 1,
                total - 1
            );
        }
        let step = index.min(total - 1);
        format!("Step: {} / {} ({})", step, total - 1, label_of(step))
    }
}
