//! Configuration
//!
//! YAML schema, loader and validator, plus the conversions from a loaded
//! [`ExperienceConfig`] into the runtime pieces the sequencer and cost
//! model consume.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLoader, LoadResult, LoadWarning, LoaderOptions};
pub use schema::{
    BridgeConfig, CueConfig, ExperienceConfig, ExperienceSettings, NarrationConfig, PhaseConfig,
};
pub use validation::{ValidationResult, Validator};

use crate::cost::BenchmarkTable;
use crate::effects::DispatcherSettings;
use crate::error::PhaseError;
use crate::phase::{EffectTrigger, PhaseCatalog, PhaseSpec, TriggerTable};

impl ExperienceConfig {
    /// Phase timeline: the configured phases, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns a [`PhaseError`] when the configured phases do not form a
    /// valid catalog.
    pub fn catalog(&self) -> Result<PhaseCatalog, PhaseError> {
        let Some(phases) = &self.phases else {
            return Ok(PhaseCatalog::invisible_cost());
        };
        PhaseCatalog::new(
            phases
                .iter()
                .map(|p| PhaseSpec {
                    name: p.name.clone(),
                    display_name: p.display_name.clone().unwrap_or_default(),
                    duration: p.duration,
                    user_controlled: p.user_controlled,
                    silent_transition: p.silent_transition,
                })
                .collect(),
        )
    }

    /// Cue table for `catalog`: configured cues, or the built-in ones
    /// when no phases are configured.
    ///
    /// # Errors
    ///
    /// Returns a [`PhaseError`] when a cue names an unknown phase or has
    /// an out-of-range threshold.
    pub fn triggers(&self, catalog: &PhaseCatalog) -> Result<TriggerTable, PhaseError> {
        let Some(phases) = &self.phases else {
            return Ok(TriggerTable::invisible_cost(catalog));
        };
        TriggerTable::from_named(
            catalog,
            phases.iter().filter(|p| !p.cues.is_empty()).map(|p| {
                let triggers = p.cues.iter().filter_map(cue_trigger).collect::<Vec<_>>();
                (p.name.as_str(), triggers)
            }),
        )
    }

    /// Narration debounce and transition settings.
    #[must_use]
    pub fn dispatcher_settings(&self) -> DispatcherSettings {
        DispatcherSettings {
            narration_retry_delay: self.experience.narration_retry_delay.as_secs_f64(),
            transition_sound: self.experience.transition_sound.clone(),
            transition_duration: self.experience.transition_duration,
        }
    }

    /// Built-in benchmarks with any configured overrides applied.
    #[must_use]
    pub fn benchmark_table(&self) -> BenchmarkTable {
        let defaults = BenchmarkTable::industry_defaults();
        match &self.benchmarks {
            Some(overrides) => defaults.merged(overrides.clone()),
            None => defaults,
        }
    }
}

/// Validation guarantees exactly one effect per cue.
fn cue_trigger(cue: &CueConfig) -> Option<EffectTrigger> {
    if let Some(narration) = &cue.narration {
        Some(EffectTrigger::narration(&cue.key, cue.threshold, narration))
    } else if let Some(sound) = &cue.sound {
        Some(EffectTrigger::sound(&cue.key, cue.threshold, sound))
    } else {
        cue.haptic
            .map(|intensity| EffectTrigger::haptic(&cue.key, cue.threshold, intensity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::Category;
    use crate::phase::EffectKind;
    use std::path::Path;

    fn load(yaml: &str) -> ExperienceConfig {
        let result = ConfigLoader::with_defaults()
            .load_str(yaml, Path::new("test.yaml"))
            .unwrap();
        (*result.config).clone()
    }

    #[test]
    fn test_defaults_build_the_builtin_experience() {
        let config = ExperienceConfig::default();
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog, PhaseCatalog::invisible_cost());
        assert_eq!(
            config.triggers(&catalog).unwrap(),
            TriggerTable::invisible_cost(&catalog)
        );
        assert_eq!(config.dispatcher_settings(), DispatcherSettings::default());
        assert_eq!(config.benchmark_table(), BenchmarkTable::industry_defaults());
    }

    #[test]
    fn test_configured_phases_and_cues() {
        let config = load(
            r"
phases:
  - name: intro
    display_name: Intro
    duration: 4
    cues:
      - { key: hello, threshold: 0.1, narration: 'intro_{industry}' }
      - { key: buzz, threshold: 0.5, haptic: 0.6 }
  - name: hold
    user_controlled: true
",
        );
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 4);
        let intro = catalog.by_name("intro").unwrap();
        assert_eq!(intro.display_name, "Intro");
        assert_eq!(catalog.by_name("hold").unwrap().display_name, "hold");

        let table = config.triggers(&catalog).unwrap();
        assert_eq!(table.trigger_count(), 2);
        let kinds: Vec<EffectKind> = table
            .for_phase(intro.id())
            .unwrap()
            .iter()
            .map(|t| t.effect.kind())
            .collect();
        assert_eq!(kinds, [EffectKind::Narration, EffectKind::Haptic]);
    }

    #[test]
    fn test_settings_follow_config() {
        let config = load("experience:\n  narration_retry_delay: 250ms\n  transition_sound: ~\n");
        let settings = config.dispatcher_settings();
        assert!((settings.narration_retry_delay - 0.25).abs() < 1e-9);
        assert_eq!(settings.transition_sound, None);
    }

    #[test]
    fn test_benchmark_overrides_merge() {
        let config = load(
            r"
benchmarks:
  categories:
    ticket-processing:
      label: Service Desk
      formula: flat-split
      unit_cost: { low: 4.0, high: 6.0 }
      handling_minutes: 10
      exception_rate: 0.1
      exception_minutes: 20
      rework_rate: 0.05
      working_capital_rate: 0
      escalation_rate: 0.1
      escalation_cost: 20
      roi_multiple: 2.0
      payback_months: 6
      source: internal survey
",
        );
        let table = config.benchmark_table();
        assert_eq!(
            table.get(Category::TicketProcessing).unwrap().label,
            "Service Desk"
        );
        assert_eq!(
            table.get(Category::InvoiceProcessing),
            BenchmarkTable::industry_defaults().get(Category::InvoiceProcessing)
        );
    }
}
