//! Experience sequencer
//!
//! Drives the single-owner [`ExperienceState`] along the phase chain.
//! Every mutating operation is synchronous and returns a [`TickReport`]
//! describing the transitions taken and cues fired during that call.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::effects::{CueRecord, EffectDispatcher};

use super::catalog::{Phase, PhaseCatalog};
use super::state::{ExperienceState, PhaseTransition, TransitionReason};

/// What happened during one sequencer call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    /// Phase changes, in order
    pub transitions: Vec<PhaseTransition>,
    /// Cues handled by the dispatcher, in order
    pub cues: Vec<CueRecord>,
}

impl TickReport {
    /// Whether nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty() && self.cues.is_empty()
    }

    /// Whether the call ended the run.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.transitions
            .iter()
            .any(|t| t.reason == TransitionReason::Ended)
    }

    /// Appends `other` to this report.
    pub fn merge(&mut self, other: Self) {
        self.transitions.extend(other.transitions);
        self.cues.extend(other.cues);
    }
}

/// State machine over the phase chain.
///
/// Within an `update` the order is fixed: accumulate time, recompute
/// progress, dispatch effects against the phase active at tick start,
/// then evaluate auto-advance.
#[derive(Debug)]
pub struct Sequencer {
    catalog: Arc<PhaseCatalog>,
    state: ExperienceState,
    dispatcher: EffectDispatcher,
}

impl Sequencer {
    /// Creates a sequencer parked on `waiting`.
    #[must_use]
    pub fn new(catalog: Arc<PhaseCatalog>, dispatcher: EffectDispatcher) -> Self {
        let state = ExperienceState::waiting(catalog.waiting().id());
        Self {
            catalog,
            state,
            dispatcher,
        }
    }

    /// The phase chain.
    #[must_use]
    pub fn catalog(&self) -> &PhaseCatalog {
        &self.catalog
    }

    /// Read-only view of the state.
    #[must_use]
    pub const fn state(&self) -> &ExperienceState {
        &self.state
    }

    /// The current phase.
    #[must_use]
    pub fn current(&self) -> &Phase {
        self.catalog.phase(self.state.current_phase)
    }

    /// The effect dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &EffectDispatcher {
        &self.dispatcher
    }

    /// Whether the sequencer is parked on `waiting`.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.state.current_phase == self.catalog.waiting().id()
    }

    /// Whether the run reached `complete`.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.catalog.is_terminal(self.state.current_phase)
    }

    /// Sets the industry slug used by `{industry}` cues.
    pub fn set_industry(&mut self, industry: Option<String>) {
        self.dispatcher.set_industry(industry);
    }

    /// Starts a run at the first active phase. Restarts when called
    /// anywhere but `waiting`.
    pub fn start(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if !self.is_waiting() {
            debug!(phase = %self.current().name, "start while not waiting, restarting");
            report.merge(self.reset());
        }

        self.state.is_active = true;
        self.state.total_elapsed = 0.0;
        self.dispatcher.rewind_clock();

        let catalog = Arc::clone(&self.catalog);
        self.enter(catalog.first_active(), TransitionReason::Started, &mut report);
        report
    }

    /// Advances time by `dt` seconds.
    ///
    /// Negative or non-finite `dt` is treated as 0. At most one phase
    /// change happens per call; time overshooting a phase is discarded.
    pub fn update(&mut self, dt: f64) -> TickReport {
        let mut report = TickReport::default();
        if !self.state.is_active {
            return report;
        }

        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            warn!(dt, "ignoring invalid tick delta");
            0.0
        };

        let catalog = Arc::clone(&self.catalog);
        let phase = catalog.phase(self.state.current_phase);
        if phase.is_boundary() {
            return report;
        }

        self.state.phase_elapsed += dt;
        self.state.total_elapsed += dt;
        if phase.is_timed() {
            self.state.phase_progress = (self.state.phase_elapsed / phase.duration).min(1.0);
        }

        self.dispatcher.tick(dt, &mut report.cues, phase);
        self.dispatcher
            .dispatch(phase, self.state.phase_progress, &mut report.cues);

        if self.state.phase_progress >= 1.0 && !phase.is_user_controlled() {
            self.step(TransitionReason::Elapsed, &mut report);
        }
        report
    }

    /// Explicit tap-to-continue. No-op unless a run is active.
    pub fn advance(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if !self.state.is_active {
            debug!(phase = %self.current().name, "advance ignored, no active run");
            return report;
        }
        self.step(TransitionReason::Advanced, &mut report);
        report
    }

    /// Ends the run: moves to `complete` and halts all effects.
    /// Idempotent once complete.
    pub fn end(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if !self.is_complete() {
            self.finish(&mut report);
        }
        report
    }

    /// Returns to `waiting` from any state, zeroing every counter and
    /// clearing the fired set and any pending narration retry.
    pub fn reset(&mut self) -> TickReport {
        let mut report = TickReport::default();
        self.dispatcher.halt();

        let from = self.state.current_phase;
        let catalog = Arc::clone(&self.catalog);
        let waiting = catalog.waiting();
        self.state = ExperienceState::waiting(waiting.id());

        if from != waiting.id() {
            info!(from = %catalog.phase(from).name, "experience reset");
            self.dispatcher.on_phase_entered(waiting);
            report
                .transitions
                .push(PhaseTransition::new(from, waiting, TransitionReason::Reset));
        }
        report
    }

    /// Drives progress of a duration-0 phase from user interaction.
    ///
    /// Clamped to `[0, 1]` and never moves backwards within a visit.
    /// Ignored for timed phases and outside an active run.
    pub fn set_phase_progress(&mut self, progress: f64) -> TickReport {
        let mut report = TickReport::default();
        let catalog = Arc::clone(&self.catalog);
        let phase = catalog.phase(self.state.current_phase);
        if !self.state.is_active || phase.is_timed() || phase.is_boundary() {
            debug!(phase = %phase.name, "external progress ignored");
            return report;
        }
        if !progress.is_finite() {
            warn!(progress, "ignoring invalid progress");
            return report;
        }

        let progress = progress.clamp(0.0, 1.0).max(self.state.phase_progress);
        self.state.phase_progress = progress;
        self.dispatcher.dispatch(phase, progress, &mut report.cues);
        report
    }

    fn step(&mut self, reason: TransitionReason, report: &mut TickReport) {
        let catalog = Arc::clone(&self.catalog);
        match catalog.next(self.state.current_phase) {
            Some(next) if !catalog.is_terminal(next.id()) => self.enter(next, reason, report),
            _ => self.finish(report),
        }
    }

    fn enter(&mut self, phase: &Phase, reason: TransitionReason, report: &mut TickReport) {
        let from = self.state.current_phase;
        self.state.enter(phase.id());
        info!(
            phase = %phase.name,
            from = %self.catalog.phase(from).name,
            %reason,
            "phase entered"
        );
        report
            .transitions
            .push(PhaseTransition::new(from, phase, reason));

        self.dispatcher.on_phase_entered(phase);
        self.dispatcher.dispatch(phase, 0.0, &mut report.cues);
    }

    fn finish(&mut self, report: &mut TickReport) {
        let catalog = Arc::clone(&self.catalog);
        let complete = catalog.complete();
        let from = self.state.current_phase;

        self.dispatcher.halt();
        self.state.enter(complete.id());
        self.state.is_active = false;
        self.dispatcher.on_phase_entered(complete);

        info!(
            from = %catalog.phase(from).name,
            total_elapsed = self.state.total_elapsed,
            "experience complete"
        );
        report
            .transitions
            .push(PhaseTransition::new(from, complete, TransitionReason::Ended));
    }
}
