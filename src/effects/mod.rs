//! Effects port
//!
//! The sequencer never plays audio, drives haptics or renders anything
//! itself. It calls through the capability traits bundled in
//! [`EffectsPort`], which is injected at construction time.
//!
//! - [`NarrationPlayer`] - voice-over cues; owns the "is narrating" flag
//! - [`SoundPlayer`] - one-shot sound effects
//! - [`HapticDriver`] - haptic pulses
//! - [`SceneRenderer`] - the external render collaborator
//! - [`EffectDispatcher`] - threshold dispatch and the narration debounce

pub mod console;
pub mod dispatcher;
pub mod recording;

use std::sync::Arc;

pub use dispatcher::{CueOutcome, CueRecord, DispatcherSettings, EffectDispatcher, NarrationDebounce};
pub use recording::{Recorded, RecordingEffects};

/// Plays narration cues.
///
/// Implementations set and clear their own narrating flag; the
/// dispatcher only reads it.
pub trait NarrationPlayer: Send + Sync {
    /// Starts playing `cue`, cutting any narration in flight.
    fn play(&self, cue: &str);

    /// Stops the narration in flight, if any.
    fn stop(&self);

    /// Whether a narration is currently audible.
    fn is_narrating(&self) -> bool;
}

/// Plays one-shot sound effects.
pub trait SoundPlayer: Send + Sync {
    /// Plays `cue` once.
    fn play_sound(&self, cue: &str);
}

/// Drives haptic feedback.
pub trait HapticDriver: Send + Sync {
    /// Fires a single pulse with intensity in `[0, 1]`.
    fn pulse(&self, intensity: f64);
}

/// Receives scene state from the experience.
pub trait SceneRenderer: Send + Sync {
    /// The experience entered `state`; animate over `duration` seconds.
    fn transition(&self, state: &str, duration: f64);

    /// Progress update for the phase at catalog index `phase`.
    fn progress(&self, phase: usize, progress: f64);
}

/// Bundle of capabilities handed to the sequencer.
#[derive(Clone)]
pub struct EffectsPort {
    /// Narration capability
    pub narration: Arc<dyn NarrationPlayer>,
    /// Sound effect capability
    pub sound: Arc<dyn SoundPlayer>,
    /// Haptics capability
    pub haptics: Arc<dyn HapticDriver>,
    /// Scene capability
    pub scene: Arc<dyn SceneRenderer>,
}

impl EffectsPort {
    /// A port where every capability does nothing.
    #[must_use]
    pub fn silent() -> Self {
        let silent = Arc::new(Silent);
        Self {
            narration: silent.clone(),
            sound: silent.clone(),
            haptics: silent.clone(),
            scene: silent,
        }
    }

    /// Replaces the narration capability.
    #[must_use]
    pub fn with_narration(mut self, narration: Arc<dyn NarrationPlayer>) -> Self {
        self.narration = narration;
        self
    }

    /// Replaces the sound capability.
    #[must_use]
    pub fn with_sound(mut self, sound: Arc<dyn SoundPlayer>) -> Self {
        self.sound = sound;
        self
    }

    /// Replaces the haptics capability.
    #[must_use]
    pub fn with_haptics(mut self, haptics: Arc<dyn HapticDriver>) -> Self {
        self.haptics = haptics;
        self
    }

    /// Replaces the scene capability.
    #[must_use]
    pub fn with_scene(mut self, scene: Arc<dyn SceneRenderer>) -> Self {
        self.scene = scene;
        self
    }
}

impl Default for EffectsPort {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for EffectsPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectsPort")
            .field("is_narrating", &self.narration.is_narrating())
            .finish_non_exhaustive()
    }
}

/// No-op implementation of every capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl NarrationPlayer for Silent {
    fn play(&self, _cue: &str) {}
    fn stop(&self) {}
    fn is_narrating(&self) -> bool {
        false
    }
}

impl SoundPlayer for Silent {
    fn play_sound(&self, _cue: &str) {}
}

impl HapticDriver for Silent {
    fn pulse(&self, _intensity: f64) {}
}

impl SceneRenderer for Silent {
    fn transition(&self, _state: &str, _duration: f64) {}
    fn progress(&self, _phase: usize, _progress: f64) {}
}
