//! Configuration validation
//!
//! Runs on the deserialized [`ExperienceConfig`] and collects every
//! issue instead of stopping at the first one.

use std::collections::HashSet;
use std::time::Duration;

use crate::config::schema::{CueConfig, ExperienceConfig, PhaseConfig};
use crate::cost::BenchmarkTable;
use crate::effects::dispatcher::INDUSTRY_PLACEHOLDER;
use crate::error::{Severity, ValidationIssue};
use crate::phase::{COMPLETE, WAITING};

/// Retry delays above this are accepted but flagged.
const MAX_SENSIBLE_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Slowest accepted tick rate (one tick every ten seconds).
pub const MIN_TICK_HZ: f64 = 0.1;

/// Fastest accepted tick rate (one tick per millisecond).
pub const MAX_TICK_HZ: f64 = 1000.0;

// ============================================================================
// Public API
// ============================================================================

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns every error and warning.
    pub fn validate(&mut self, config: &ExperienceConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_experience(config);
        if let Some(phases) = &config.phases {
            self.validate_phases(phases);
        }
        self.validate_narration(config);
        if let Some(bridge) = &config.bridge
            && bridge.address.trim().is_empty()
        {
            self.add_error("bridge.address", "Bridge address cannot be empty");
        }
        if let Some(table) = &config.benchmarks {
            self.validate_benchmarks(table);
        }

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Sections
    // ========================================================================

    fn validate_experience(&mut self, config: &ExperienceConfig) {
        let settings = &config.experience;
        if !(MIN_TICK_HZ..=MAX_TICK_HZ).contains(&settings.tick_hz) {
            self.add_error(
                "experience.tick_hz",
                &format!(
                    "Tick rate must be between {MIN_TICK_HZ} and {MAX_TICK_HZ} Hz, got {}",
                    settings.tick_hz
                ),
            );
        }
        if !settings.transition_duration.is_finite() || settings.transition_duration < 0.0 {
            self.add_error(
                "experience.transition_duration",
                "Transition duration must be a finite non-negative number",
            );
        }
        if settings.narration_retry_delay > MAX_SENSIBLE_RETRY_DELAY {
            self.add_warning(
                "experience.narration_retry_delay",
                &format!(
                    "Narration retry delay of {} is unusually long (> 5s)",
                    humantime::format_duration(settings.narration_retry_delay)
                ),
            );
        }
    }

    fn validate_phases(&mut self, phases: &[PhaseConfig]) {
        if phases.is_empty() {
            self.add_error("phases", "At least one phase is required");
            return;
        }

        let mut names = HashSet::new();
        for (idx, phase) in phases.iter().enumerate() {
            let path = format!("phases[{idx}]");

            if phase.name.trim().is_empty() {
                self.add_error(&format!("{path}.name"), "Phase name cannot be empty");
            } else if phase.name == WAITING || phase.name == COMPLETE {
                self.add_error(
                    &format!("{path}.name"),
                    &format!("Phase name '{}' is reserved", phase.name),
                );
            } else if !names.insert(phase.name.as_str()) {
                self.add_error(
                    &format!("{path}.name"),
                    &format!("Duplicate phase name '{}'", phase.name),
                );
            }

            if !phase.duration.is_finite() || phase.duration < 0.0 {
                self.add_error(
                    &format!("{path}.duration"),
                    &format!("Duration must be a finite non-negative number, got {}", phase.duration),
                );
            } else if phase.duration <= 0.0 && !phase.user_controlled {
                self.add_warning(
                    &format!("{path}.duration"),
                    "Duration is 0 without user_controlled; the phase waits for an advance",
                );
            }

            self.validate_cues(&path, &phase.cues);
        }
    }

    fn validate_cues(&mut self, phase_path: &str, cues: &[CueConfig]) {
        let mut keys = HashSet::new();
        for (idx, cue) in cues.iter().enumerate() {
            let path = format!("{phase_path}.cues[{idx}]");

            if cue.key.trim().is_empty() {
                self.add_error(&format!("{path}.key"), "Cue key cannot be empty");
            } else if !keys.insert(cue.key.as_str()) {
                self.add_error(
                    &format!("{path}.key"),
                    &format!("Duplicate cue key '{}' in phase", cue.key),
                );
            }

            if !(0.0..=1.0).contains(&cue.threshold) {
                self.add_error(
                    &format!("{path}.threshold"),
                    &format!("Threshold must be within [0, 1], got {}", cue.threshold),
                );
            }

            match cue.effect_count() {
                0 => self.add_error(
                    &path,
                    "Cue must set exactly one of 'narration', 'sound' or 'haptic'",
                ),
                1 => {}
                _ => self.add_error(
                    &path,
                    "Cue sets more than one of 'narration', 'sound' and 'haptic'",
                ),
            }

            if let Some(intensity) = cue.haptic
                && !(0.0..=1.0).contains(&intensity)
            {
                self.add_error(
                    &format!("{path}.haptic"),
                    &format!("Haptic intensity must be within [0, 1], got {intensity}"),
                );
            }

            if let Some(narration) = &cue.narration {
                for placeholder in placeholders(narration) {
                    if placeholder != INDUSTRY_PLACEHOLDER {
                        self.add_warning(
                            &format!("{path}.narration"),
                            &format!("Unknown placeholder '{placeholder}' is left as-is"),
                        );
                    }
                }
            }
        }
    }

    fn validate_narration(&mut self, config: &ExperienceConfig) {
        let wps = config.narration.words_per_second;
        if !wps.is_finite() || wps <= 0.0 {
            self.add_error(
                "narration.words_per_second",
                &format!("Words per second must be positive, got {wps}"),
            );
        }
    }

    fn validate_benchmarks(&mut self, table: &BenchmarkTable) {
        for (category, bench) in &table.categories {
            let path = format!("benchmarks.categories.{category}");

            let range = bench.unit_cost;
            if !range.low.is_finite() || !range.high.is_finite() || range.low < 0.0 {
                self.add_error(
                    &format!("{path}.unit_cost"),
                    "Unit cost bounds must be finite and non-negative",
                );
            } else if range.low > range.high {
                self.add_error(
                    &format!("{path}.unit_cost"),
                    &format!("Range low {} exceeds high {}", range.low, range.high),
                );
            }

            for (field, rate) in [
                ("exception_rate", bench.exception_rate),
                ("rework_rate", bench.rework_rate),
                ("working_capital_rate", bench.working_capital_rate),
                ("escalation_rate", bench.escalation_rate),
            ] {
                if !(0.0..=1.0).contains(&rate) {
                    self.add_error(
                        &format!("{path}.{field}"),
                        &format!("Rate must be within [0, 1], got {rate}"),
                    );
                }
            }

            for (field, value) in [
                ("handling_minutes", bench.handling_minutes),
                ("exception_minutes", bench.exception_minutes),
                ("escalation_cost", bench.escalation_cost),
                ("units_per_entity", bench.units_per_entity),
                ("roi_multiple", bench.roi_multiple),
                ("payback_months", bench.payback_months),
            ] {
                if !value.is_finite() || value < 0.0 {
                    self.add_error(
                        &format!("{path}.{field}"),
                        &format!("Value must be a finite non-negative number, got {value}"),
                    );
                }
            }
        }

        for (level, factors) in &table.automation {
            for (field, value) in [("handling", factors.handling), ("exception", factors.exception)] {
                if !value.is_finite() || value < 0.0 {
                    self.add_error(
                        &format!("benchmarks.automation.{level}.{field}"),
                        "Automation factor must be a finite non-negative number",
                    );
                }
            }
        }

        for (channel, factor) in &table.channels {
            if !factor.is_finite() || *factor < 0.0 {
                self.add_error(
                    &format!("benchmarks.channels.{channel}"),
                    "Channel factor must be a finite non-negative number",
                );
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Adds an error to the collection.
    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    /// Adds a warning to the collection.
    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

/// Every `{name}` occurrence in `text`, braces included.
fn placeholders(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        found.push(&rest[open..=open + close]);
        rest = &rest[open + close + 1..];
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(yaml: &str) -> ValidationResult {
        let config: ExperienceConfig = serde_yaml::from_str(yaml).unwrap();
        Validator::new().validate(&config)
    }

    fn paths(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn test_defaults_are_valid() {
        let result = Validator::new().validate(&ExperienceConfig::default());
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_reserved_and_duplicate_names() {
        let result = validate(
            r"
phases:
  - { name: waiting, duration: 1 }
  - { name: a, duration: 1 }
  - { name: a, duration: 1 }
",
        );
        assert_eq!(paths(&result.errors), ["phases[0].name", "phases[2].name"]);
    }

    #[test]
    fn test_empty_phase_list() {
        let result = validate("phases: []");
        assert_eq!(paths(&result.errors), ["phases"]);
    }

    #[test]
    fn test_collects_all_cue_errors() {
        let result = validate(
            r"
phases:
  - name: a
    duration: -1
    cues:
      - { key: x, threshold: 1.5, sound: s }
      - { key: x, threshold: 0.5, sound: s }
      - { key: y, threshold: 0.5 }
      - { key: z, threshold: 0.5, sound: s, haptic: 0.5 }
      - { key: h, threshold: 0.5, haptic: 2.0 }
",
        );
        assert_eq!(
            paths(&result.errors),
            [
                "phases[0].duration",
                "phases[0].cues[0].threshold",
                "phases[0].cues[1].key",
                "phases[0].cues[2]",
                "phases[0].cues[3]",
                "phases[0].cues[4].haptic",
            ]
        );
    }

    #[test]
    fn test_warnings() {
        let result = validate(
            r"
experience:
  narration_retry_delay: 10s
phases:
  - name: a
    cues:
      - { key: n, threshold: 0, narration: 'hello_{industry}_{mood}' }
",
        );
        assert!(result.is_valid());
        assert_eq!(
            paths(&result.warnings),
            [
                "experience.narration_retry_delay",
                "phases[0].duration",
                "phases[0].cues[0].narration",
            ]
        );
        assert!(result.warnings[2].message.contains("{mood}"));
    }

    #[test]
    fn test_tick_rate_must_be_in_range() {
        for hz in ["0", "-5", "1e10", "1e-300", ".nan", ".inf"] {
            let result = validate(&format!("experience: {{ tick_hz: {hz} }}"));
            assert_eq!(paths(&result.errors), ["experience.tick_hz"], "tick_hz {hz}");
        }
        for hz in ["0.1", "60", "1000"] {
            let result = validate(&format!("experience: {{ tick_hz: {hz} }}"));
            assert!(result.is_valid(), "tick_hz {hz}");
        }
    }

    #[test]
    fn test_benchmark_ranges_and_rates() {
        let result = validate(
            r"
benchmarks:
  categories:
    ticket-processing:
      label: Tickets
      unit_cost: { low: 13.0, high: 2.5 }
      handling_minutes: 18
      exception_rate: 1.5
      exception_minutes: 40
      rework_rate: 0.06
      working_capital_rate: 0
      escalation_rate: 0.12
      escalation_cost: 28
      roi_multiple: 2.6
      payback_months: 8
      source: test
",
        );
        assert_eq!(
            paths(&result.errors),
            [
                "benchmarks.categories.ticket-processing.unit_cost",
                "benchmarks.categories.ticket-processing.exception_rate",
            ]
        );
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders("a_{industry}_{x}"), ["{industry}", "{x}"]);
        assert!(placeholders("plain").is_empty());
        assert!(placeholders("open_{never").is_empty());
    }
}
