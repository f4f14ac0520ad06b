//! Configuration schema types
//!
//! Every section is optional. An empty document describes the built-in
//! experience with its default cues and benchmark figures.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cost::BenchmarkTable;

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// Root of an experience configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperienceConfig {
    /// Timing and transition settings
    #[serde(default)]
    pub experience: ExperienceSettings,

    /// Active phases; replaces the built-in timeline when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phases: Option<Vec<PhaseConfig>>,

    /// Narration assets and scripts
    #[serde(default)]
    pub narration: NarrationConfig,

    /// Render bridge endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<BridgeConfig>,

    /// Benchmark overrides, merged over the built-in table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmarks: Option<BenchmarkTable>,
}

// ============================================================================
// Experience Settings
// ============================================================================

/// Tick rate, narration debounce and transition defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperienceSettings {
    /// Sequencer updates per second
    pub tick_hz: f64,

    /// Delay before a deferred narration is retried
    #[serde(with = "humantime_duration")]
    pub narration_retry_delay: Duration,

    /// Sound played on phase entry; `null` disables it
    pub transition_sound: Option<String>,

    /// Scene transition animation length in seconds
    pub transition_duration: f64,
}

impl Default for ExperienceSettings {
    fn default() -> Self {
        Self {
            tick_hz: 10.0,
            narration_retry_delay: Duration::from_millis(500),
            transition_sound: Some("sfx_transition".to_owned()),
            transition_duration: 1.0,
        }
    }
}

// ============================================================================
// Phases and Cues
// ============================================================================

/// One active phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseConfig {
    /// Machine name, also the scene state
    pub name: String,

    /// Human-facing title; defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Seconds; 0 makes the phase user-controlled
    #[serde(default)]
    pub duration: f64,

    /// Leave only on explicit advance
    #[serde(default)]
    pub user_controlled: bool,

    /// Entering this phase plays no transition sound
    #[serde(default)]
    pub silent_transition: bool,

    /// Progress-keyed effect cues
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cues: Vec<CueConfig>,
}

/// One cue. Exactly one of `narration`, `sound` or `haptic` must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CueConfig {
    /// Unique key within the phase
    pub key: String,

    /// Progress in `[0, 1]` at which the cue fires
    pub threshold: f64,

    /// Narration cue name, may contain `{industry}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,

    /// Sound cue name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,

    /// Haptic intensity in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub haptic: Option<f64>,
}

impl CueConfig {
    /// Number of effect kinds set on this cue.
    #[must_use]
    pub fn effect_count(&self) -> usize {
        usize::from(self.narration.is_some())
            + usize::from(self.sound.is_some())
            + usize::from(self.haptic.is_some())
    }
}

// ============================================================================
// Narration
// ============================================================================

/// Narration asset lookup and synthesized fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NarrationConfig {
    /// Directory holding `narration_<cue>.mp3` files
    pub assets_dir: Option<PathBuf>,

    /// Speaking rate used to estimate synthesized durations
    pub words_per_second: f64,

    /// Script text per narration cue
    pub scripts: HashMap<String, String>,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            assets_dir: None,
            words_per_second: 2.5,
            scripts: HashMap::new(),
        }
    }
}

// ============================================================================
// Bridge
// ============================================================================

/// Render bridge endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// `host:port` of the render collaborator
    pub address: String,

    /// Give up connecting after this long
    #[serde(default = "default_connect_timeout", with = "humantime_duration")]
    pub connect_timeout: Duration,
}

const fn default_connect_timeout() -> Duration {
    Duration::from_secs(2)
}

// ============================================================================
// Duration Serde
// ============================================================================

/// `humantime` strings (`500ms`, `2s`) for `Duration` fields.
mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: ExperienceConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, ExperienceConfig::default());
        assert_eq!(
            config.experience.narration_retry_delay,
            Duration::from_millis(500)
        );
        assert!(config.phases.is_none());
    }

    #[test]
    fn test_full_document() {
        let yaml = r"
experience:
  tick_hz: 30
  narration_retry_delay: 750ms
  transition_sound: ~
phases:
  - name: intro
    duration: 4
    cues:
      - { key: hello, threshold: 0.1, narration: intro_{industry} }
      - { key: buzz, threshold: 0.5, haptic: 0.6 }
  - name: tap
    user_controlled: true
    silent_transition: true
narration:
  words_per_second: 3
  scripts:
    intro_it: Tickets pile up.
bridge:
  address: 127.0.0.1:7777
";
        let config: ExperienceConfig = serde_yaml::from_str(yaml).unwrap();
        assert!((config.experience.tick_hz - 30.0).abs() < f64::EPSILON);
        assert_eq!(
            config.experience.narration_retry_delay,
            Duration::from_millis(750)
        );
        assert_eq!(config.experience.transition_sound, None);

        let phases = config.phases.unwrap();
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0].cues[1].haptic, Some(0.6));
        assert_eq!(phases[0].cues[0].effect_count(), 1);
        assert!(phases[1].silent_transition);

        let bridge = config.bridge.unwrap();
        assert_eq!(bridge.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.narration.scripts["intro_it"], "Tickets pile up.");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = serde_yaml::from_str::<ExperienceConfig>("experience: { tick_rate: 5 }");
        assert!(err.is_err());
    }

    #[test]
    fn test_bad_duration_rejected() {
        let err = serde_yaml::from_str::<ExperienceConfig>(
            "experience: { narration_retry_delay: soon }",
        );
        assert!(err.is_err());
    }
}
