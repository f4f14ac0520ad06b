//! `invisible-cost` - phase-driven experience sequencer and
//! invisible-cost calculator
//!
//! The crate drives a fixed timeline of narrated phases, fires
//! narration, sound and haptic cues at progress thresholds, and
//! computes the hidden cost of manual back-office work for the
//! category a visitor picks.
//!
//! - [`phase`] - catalog, trigger table and the tick-driven sequencer
//! - [`effects`] - capability traits and the cue dispatcher
//! - [`cost`] - benchmarks, the cost model and savings projection
//! - [`experience`] - the facade a host drives
//! - [`bridge`] - newline-delimited JSON link to a renderer

pub mod bridge;
pub mod cli;
pub mod config;
pub mod cost;
pub mod effects;
pub mod error;
pub mod experience;
pub mod observability;
pub mod phase;

pub use error::{ExitCode, InvisibleCostError};
pub use experience::Experience;
