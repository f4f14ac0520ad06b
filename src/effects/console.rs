//! Console effects used by the CLI.
//!
//! Nothing is rendered or played: every capability logs what it would
//! do. Narration still keeps realistic timing so the debounce behaves
//! the way it does with real audio.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{EffectsPort, HapticDriver, NarrationPlayer, SceneRenderer, SoundPlayer};

/// Fallback narration length when there is no script to estimate from.
pub const DEFAULT_NARRATION_SECS: f64 = 3.0;

/// Upper bound on one narration's playback window.
pub const MAX_NARRATION_SECS: f64 = 600.0;

/// Where a narration cue's audio comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationSource {
    /// Pre-recorded `narration_<cue>.mp3`
    Asset(PathBuf),
    /// Synthesized from the script text (or the cue name)
    Synthesized(String),
}

/// Narrator that logs cues and tracks an estimated playback window.
#[derive(Debug)]
pub struct ConsoleNarrator {
    assets_dir: Option<PathBuf>,
    scripts: HashMap<String, String>,
    words_per_second: f64,
    speed: f64,
    playing_until: Mutex<Option<Instant>>,
}

impl ConsoleNarrator {
    /// Creates a narrator. `speed` compresses estimated durations.
    #[must_use]
    pub fn new(
        assets_dir: Option<PathBuf>,
        scripts: HashMap<String, String>,
        words_per_second: f64,
        speed: f64,
    ) -> Self {
        Self {
            assets_dir,
            scripts,
            words_per_second,
            speed: if speed.is_finite() && speed > 0.0 { speed } else { 1.0 },
            playing_until: Mutex::new(None),
        }
    }

    /// Resolves the audio source for `cue`.
    #[must_use]
    pub fn source(&self, cue: &str) -> NarrationSource {
        if let Some(path) = self.asset_path(cue) {
            return NarrationSource::Asset(path);
        }
        let text = self
            .scripts
            .get(cue)
            .cloned()
            .unwrap_or_else(|| cue.replace('_', " "));
        NarrationSource::Synthesized(text)
    }

    /// Estimated wall-clock playback time of `cue` at the current speed.
    #[must_use]
    pub fn estimated_duration(&self, cue: &str) -> Duration {
        let secs = match self.scripts.get(cue) {
            Some(script) if self.words_per_second > 0.0 => {
                let words = script.split_whitespace().count();
                #[allow(clippy::cast_precision_loss)]
                let words = words as f64;
                (words / self.words_per_second).max(1.0)
            }
            _ => DEFAULT_NARRATION_SECS,
        };
        Duration::try_from_secs_f64((secs / self.speed).min(MAX_NARRATION_SECS))
            .unwrap_or(Duration::ZERO)
    }

    fn asset_path(&self, cue: &str) -> Option<PathBuf> {
        let dir: &Path = self.assets_dir.as_deref()?;
        let path = dir.join(format!("narration_{cue}.mp3"));
        path.is_file().then_some(path)
    }

    fn window(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.playing_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl NarrationPlayer for ConsoleNarrator {
    fn play(&self, cue: &str) {
        let duration = self.estimated_duration(cue);
        match self.source(cue) {
            NarrationSource::Asset(path) => {
                info!(cue, path = %path.display(), secs = duration.as_secs_f64(), "narration");
            }
            NarrationSource::Synthesized(text) => {
                if self.assets_dir.is_some() {
                    warn!(cue, "narration asset missing, using synthesized voice");
                }
                info!(cue, text = %text, secs = duration.as_secs_f64(), "narration (synthesized)");
            }
        }
        *self.window() = Some(Instant::now() + duration);
    }

    fn stop(&self) {
        if self.window().take().is_some() {
            debug!("narration stopped");
        }
    }

    fn is_narrating(&self) -> bool {
        self.window().is_some_and(|until| Instant::now() < until)
    }
}

/// Logs sounds, haptics and scene updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleEffects;

impl SoundPlayer for ConsoleEffects {
    fn play_sound(&self, cue: &str) {
        info!(cue, "sound");
    }
}

impl HapticDriver for ConsoleEffects {
    fn pulse(&self, intensity: f64) {
        info!(intensity, "haptic pulse");
    }
}

impl SceneRenderer for ConsoleEffects {
    fn transition(&self, state: &str, duration: f64) {
        debug!(state, duration, "scene transition");
    }

    fn progress(&self, phase: usize, progress: f64) {
        tracing::trace!(phase, progress, "scene progress");
    }
}

/// Port wiring `narrator` with console sound, haptics and scene.
#[must_use]
pub fn console_port(narrator: ConsoleNarrator) -> EffectsPort {
    let console = Arc::new(ConsoleEffects);
    EffectsPort {
        narration: Arc::new(narrator),
        sound: console.clone(),
        haptics: console.clone(),
        scene: console,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn narrator(dir: Option<PathBuf>, speed: f64) -> ConsoleNarrator {
        let scripts = HashMap::from([(
            "choose_industry".to_owned(),
            "Your industry your story one two".to_owned(),
        )]);
        ConsoleNarrator::new(dir, scripts, 2.0, speed)
    }

    #[test]
    fn asset_preferred_when_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("narration_agentic.mp3"), b"ID3").unwrap();
        let n = narrator(Some(dir.path().to_path_buf()), 1.0);

        assert_eq!(
            n.source("agentic"),
            NarrationSource::Asset(dir.path().join("narration_agentic.mp3"))
        );
        assert_eq!(
            n.source("choose_industry"),
            NarrationSource::Synthesized("Your industry your story one two".into())
        );
        assert_eq!(
            n.source("final_cta"),
            NarrationSource::Synthesized("final cta".into())
        );
    }

    #[test]
    fn duration_from_script_and_speed() {
        let n = narrator(None, 2.0);
        // 6 words at 2 wps = 3s, halved by speed
        assert_eq!(n.estimated_duration("choose_industry"), Duration::from_secs_f64(1.5));
        assert_eq!(n.estimated_duration("unknown"), Duration::from_secs_f64(1.5));
    }

    #[test]
    fn narrating_window_and_stop() {
        let n = narrator(None, 1.0);
        assert!(!n.is_narrating());
        n.play("choose_industry");
        assert!(n.is_narrating());
        n.stop();
        assert!(!n.is_narrating());
    }

    #[test]
    fn window_expires() {
        let n = narrator(None, 1000.0);
        n.play("unknown");
        std::thread::sleep(Duration::from_millis(20));
        assert!(!n.is_narrating());
    }

    #[test]
    fn invalid_speed_falls_back_to_realtime() {
        let n = narrator(None, 0.0);
        assert_eq!(n.estimated_duration("x"), Duration::from_secs(3));
    }

    #[test]
    fn tiny_speed_caps_the_window() {
        let n = narrator(None, 1e-300);
        assert_eq!(
            n.estimated_duration("choose_industry"),
            Duration::from_secs_f64(MAX_NARRATION_SECS)
        );
        n.play("choose_industry");
        assert!(n.is_narrating());
    }

    #[test]
    fn tiny_word_rate_caps_the_window() {
        let scripts = HashMap::from([("slow".to_owned(), "one two".to_owned())]);
        let n = ConsoleNarrator::new(None, scripts, 1e-300, 1.0);
        assert_eq!(
            n.estimated_duration("slow"),
            Duration::from_secs_f64(MAX_NARRATION_SECS)
        );
    }
}
