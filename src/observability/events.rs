//! Structured event stream.
//!
//! Typed events serialized as JSONL, each line carrying a sequence
//! number. Consumers dispatch on the `type` tag.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::cost::{Category, CostBreakdown};
use crate::effects::{CueOutcome, CueRecord};
use crate::phase::{EffectKind, TickReport, TransitionReason};

/// A discrete event emitted while the experience runs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A run started.
    ExperienceStarted {
        /// When the run started.
        timestamp: DateTime<Utc>,
        /// Random id correlating every event of this run.
        session_id: Uuid,
        /// Active phases in the catalog.
        phase_count: usize,
        /// Sum of timed phase durations in seconds.
        nominal_runtime: f64,
    },

    /// A phase was entered.
    PhaseEntered {
        /// When the transition happened.
        timestamp: DateTime<Utc>,
        /// Name of the phase entered.
        phase_name: String,
        /// Catalog index of the phase entered.
        phase_index: usize,
        /// Catalog index of the phase left.
        from_index: usize,
        /// Why the transition happened.
        reason: TransitionReason,
    },

    /// A trigger fired.
    CueFired {
        /// When the cue fired.
        timestamp: DateTime<Utc>,
        /// Phase the trigger belongs to.
        phase: String,
        /// Trigger key.
        key: String,
        /// Effect kind.
        kind: EffectKind,
        /// Resolved cue.
        cue: String,
        /// What the dispatcher did with it.
        outcome: CueOutcome,
    },

    /// A narration was deferred behind one already playing.
    NarrationDeferred {
        /// When the deferral happened.
        timestamp: DateTime<Utc>,
        /// Phase the trigger belongs to.
        phase: String,
        /// Trigger key.
        key: String,
        /// Resolved cue.
        cue: String,
    },

    /// A cost breakdown was computed.
    CostComputed {
        /// When the breakdown was computed.
        timestamp: DateTime<Utc>,
        /// Category.
        category: Category,
        /// Direct cost.
        direct_cost: f64,
        /// Indirect cost.
        indirect_cost: f64,
        /// Invisible cost.
        invisible_cost: f64,
        /// Total cost.
        total_cost: f64,
    },

    /// The run reached `complete`.
    ExperienceCompleted {
        /// When the run completed.
        timestamp: DateTime<Utc>,
        /// Seconds since the run started.
        total_elapsed: f64,
    },

    /// The experience returned to `waiting`.
    ExperienceReset {
        /// When the reset happened.
        timestamp: DateTime<Utc>,
    },

    /// The render bridge connected.
    BridgeConnected {
        /// When the connection was established.
        timestamp: DateTime<Utc>,
        /// Remote address.
        address: String,
    },

    /// The render bridge went away.
    BridgeDisconnected {
        /// When the disconnect was noticed.
        timestamp: DateTime<Utc>,
        /// Remote address.
        address: String,
        /// Human-readable reason.
        reason: String,
    },
}

impl Event {
    /// `CostComputed` for `breakdown`, stamped now.
    #[must_use]
    pub fn cost_computed(breakdown: &CostBreakdown) -> Self {
        Self::CostComputed {
            timestamp: Utc::now(),
            category: breakdown.category,
            direct_cost: breakdown.direct_cost,
            indirect_cost: breakdown.indirect_cost,
            invisible_cost: breakdown.invisible_cost,
            total_cost: breakdown.total_cost,
        }
    }

    fn from_cue(cue: &CueRecord, timestamp: DateTime<Utc>) -> Self {
        if cue.outcome == CueOutcome::Deferred {
            return Self::NarrationDeferred {
                timestamp,
                phase: cue.phase.clone(),
                key: cue.key.clone(),
                cue: cue.cue.clone(),
            };
        }
        Self::CueFired {
            timestamp,
            phase: cue.phase.clone(),
            key: cue.key.clone(),
            kind: cue.kind,
            cue: cue.cue.clone(),
            outcome: cue.outcome,
        }
    }
}

#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

/// Thread-safe, buffered JSONL writer.
///
/// Serialization and I/O failures are dropped: observability never
/// interrupts the experience.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Emitter writing to `writer`.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Emitter that discards everything.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Emitter writing to a new file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Writes `event` as one line.
    pub fn emit(&self, event: Event) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope { sequence, event };

        if let Ok(mut w) = self.writer.lock()
            && let Ok(line) = serde_json::to_string(&envelope)
        {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }

    /// Emits one event per transition and cue in `report`, in order:
    /// transitions first, matching how the sequencer produced them.
    pub fn emit_report(&self, report: &TickReport, total_elapsed: f64) {
        let now = Utc::now();
        for transition in &report.transitions {
            let event = match transition.reason {
                TransitionReason::Ended => Event::ExperienceCompleted {
                    timestamp: now,
                    total_elapsed,
                },
                TransitionReason::Reset => Event::ExperienceReset { timestamp: now },
                TransitionReason::Started
                | TransitionReason::Elapsed
                | TransitionReason::Advanced => Event::PhaseEntered {
                    timestamp: now,
                    phase_name: transition.to_name.clone(),
                    phase_index: transition.to_phase.index(),
                    from_index: transition.from_phase.index(),
                    reason: transition.reason,
                },
            };
            self.emit(event);
        }
        for cue in &report.cues {
            self.emit(Event::from_cue(cue, now));
        }
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}
