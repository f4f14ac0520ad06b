//! Phase timeline and experience sequencer
//!
//! - [`PhaseCatalog`]: immutable ordered chain `waiting → … → complete`
//! - [`ExperienceState`]: single-owner state mutated only by the sequencer
//! - [`trigger`]: progress-threshold triggers and the per-visit fired set
//! - [`Sequencer`]: `start` / `update` / `advance` / `end` / `reset`

pub mod catalog;
pub mod sequencer;
pub mod state;
pub mod trigger;

pub use catalog::{COMPLETE, Phase, PhaseCatalog, PhaseId, PhaseSpec, WAITING};
pub use sequencer::{Sequencer, TickReport};
pub use state::{ExperienceState, PhaseTransition, TransitionReason};
pub use trigger::{Effect, EffectKind, EffectTrigger, FiredSet, PhaseTriggers, TriggerTable};
