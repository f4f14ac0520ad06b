//! Experience state
//!
//! The single-owner record mutated by the sequencer. Outside the
//! `phase` module it is read-only.

use serde::Serialize;

use super::catalog::{Phase, PhaseId};

/// Mutable experience state owned by the sequencer.
///
/// Invariants held by the sequencer:
/// - `phase_progress` is always within `[0, 1]`
/// - `phase_elapsed` resets to 0 on every phase change
/// - `total_elapsed` only grows during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperienceState {
    pub(super) current_phase: PhaseId,
    pub(super) is_active: bool,
    pub(super) phase_elapsed: f64,
    pub(super) total_elapsed: f64,
    pub(super) phase_progress: f64,
}

impl ExperienceState {
    /// Fresh state parked on the given `waiting` phase.
    pub(super) const fn waiting(waiting: PhaseId) -> Self {
        Self {
            current_phase: waiting,
            is_active: false,
            phase_elapsed: 0.0,
            total_elapsed: 0.0,
            phase_progress: 0.0,
        }
    }

    /// Current phase id.
    #[must_use]
    pub const fn current_phase(&self) -> PhaseId {
        self.current_phase
    }

    /// Whether a run is in progress.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Seconds since the current phase was entered.
    #[must_use]
    pub const fn phase_elapsed(&self) -> f64 {
        self.phase_elapsed
    }

    /// Seconds since the run started.
    #[must_use]
    pub const fn total_elapsed(&self) -> f64 {
        self.total_elapsed
    }

    /// Normalized progress through the current phase.
    #[must_use]
    pub const fn phase_progress(&self) -> f64 {
        self.phase_progress
    }

    pub(super) const fn enter(&mut self, phase: PhaseId) {
        self.current_phase = phase;
        self.phase_elapsed = 0.0;
        self.phase_progress = 0.0;
    }
}

/// Record of a phase change, reported by sequencer operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseTransition {
    /// Phase left
    pub from_phase: PhaseId,
    /// Phase entered
    pub to_phase: PhaseId,
    /// Name of the phase entered
    pub to_name: String,
    /// Why the change happened
    pub reason: TransitionReason,
}

/// What caused a [`PhaseTransition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// `start()` entered the first phase
    Started,
    /// Progress reached 1 on a timed phase
    Elapsed,
    /// Explicit `advance()`
    Advanced,
    /// `end()`, or advancing out of the last active phase
    Ended,
    /// `reset()` returned to `waiting`
    Reset,
}

impl std::fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Started => "started",
            Self::Elapsed => "elapsed",
            Self::Advanced => "advanced",
            Self::Ended => "ended",
            Self::Reset => "reset",
        };
        f.write_str(s)
    }
}

impl PhaseTransition {
    pub(super) fn new(from: PhaseId, to: &Phase, reason: TransitionReason) -> Self {
        Self {
            from_phase: from,
            to_phase: to.id(),
            to_name: to.name.clone(),
            reason,
        }
    }
}
