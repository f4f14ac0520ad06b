//! Recording effects
//!
//! Captures every call made through the effects port so tests (and
//! dry runs) can assert on exactly what the experience asked for.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{EffectsPort, HapticDriver, NarrationPlayer, SceneRenderer, SoundPlayer};

/// One captured call.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    /// `NarrationPlayer::play`
    Narration(String),
    /// `NarrationPlayer::stop`
    NarrationStopped,
    /// `SoundPlayer::play_sound`
    Sound(String),
    /// `HapticDriver::pulse`
    Haptic(f64),
    /// `SceneRenderer::transition`
    Transition {
        /// Scene state
        state: String,
        /// Animation duration in seconds
        duration: f64,
    },
    /// `SceneRenderer::progress`
    Progress {
        /// Catalog index
        phase: usize,
        /// Normalized progress
        progress: f64,
    },
}

#[derive(Debug, Default)]
struct Inner {
    calls: Mutex<Vec<Recorded>>,
    narrating: AtomicBool,
    record_progress: AtomicBool,
}

/// Cheaply cloneable recorder implementing every capability.
///
/// Narration behaves like a real player: `play` raises the narrating
/// flag, and it stays raised until `stop` or [`finish_narration`]
/// (the completion callback) lowers it.
///
/// [`finish_narration`]: RecordingEffects::finish_narration
#[derive(Debug, Clone, Default)]
pub struct RecordingEffects {
    inner: Arc<Inner>,
}

impl RecordingEffects {
    /// Creates an empty recorder. Progress updates are not recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder that also captures `SceneRenderer::progress`.
    #[must_use]
    pub fn with_progress() -> Self {
        let recorder = Self::new();
        recorder.inner.record_progress.store(true, Ordering::SeqCst);
        recorder
    }

    /// A port whose every capability records into this recorder.
    #[must_use]
    pub fn port(&self) -> EffectsPort {
        let shared = Arc::new(self.clone());
        EffectsPort {
            narration: shared.clone(),
            sound: shared.clone(),
            haptics: shared.clone(),
            scene: shared,
        }
    }

    /// Snapshot of calls so far.
    #[must_use]
    pub fn recorded(&self) -> Vec<Recorded> {
        self.calls().clone()
    }

    /// Drains and returns calls so far.
    #[must_use]
    pub fn take(&self) -> Vec<Recorded> {
        std::mem::take(&mut *self.calls())
    }

    /// Narration cues played, in order.
    #[must_use]
    pub fn narrations(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|r| match r {
                Recorded::Narration(cue) => Some(cue.clone()),
                _ => None,
            })
            .collect()
    }

    /// Sound cues played, in order.
    #[must_use]
    pub fn sounds(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|r| match r {
                Recorded::Sound(cue) => Some(cue.clone()),
                _ => None,
            })
            .collect()
    }

    /// Scene states entered, in order.
    #[must_use]
    pub fn transitions(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|r| match r {
                Recorded::Transition { state, .. } => Some(state.clone()),
                _ => None,
            })
            .collect()
    }

    /// Simulates the narration completion callback.
    pub fn finish_narration(&self) {
        self.inner.narrating.store(false, Ordering::SeqCst);
    }

    fn calls(&self) -> std::sync::MutexGuard<'_, Vec<Recorded>> {
        // a panicking test thread must not hide the calls from the next assert
        self.inner
            .calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn push(&self, call: Recorded) {
        self.calls().push(call);
    }
}

impl NarrationPlayer for RecordingEffects {
    fn play(&self, cue: &str) {
        self.inner.narrating.store(true, Ordering::SeqCst);
        self.push(Recorded::Narration(cue.to_owned()));
    }

    fn stop(&self) {
        self.inner.narrating.store(false, Ordering::SeqCst);
        self.push(Recorded::NarrationStopped);
    }

    fn is_narrating(&self) -> bool {
        self.inner.narrating.load(Ordering::SeqCst)
    }
}

impl SoundPlayer for RecordingEffects {
    fn play_sound(&self, cue: &str) {
        self.push(Recorded::Sound(cue.to_owned()));
    }
}

impl HapticDriver for RecordingEffects {
    fn pulse(&self, intensity: f64) {
        self.push(Recorded::Haptic(intensity));
    }
}

impl SceneRenderer for RecordingEffects {
    fn transition(&self, state: &str, duration: f64) {
        self.push(Recorded::Transition {
            state: state.to_owned(),
            duration,
        });
    }

    fn progress(&self, phase: usize, progress: f64) {
        if self.inner.record_progress.load(Ordering::SeqCst) {
            self.push(Recorded::Progress { phase, progress });
        }
    }
}
