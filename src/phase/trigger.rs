//! Progress-threshold triggers
//!
//! Each phase owns a list of triggers, each mapping a key to a progress
//! threshold and an effect. A trigger fires once per phase visit: the
//! [`FiredSet`] remembers which keys already fired and is cleared on
//! every phase change.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PhaseError;

use super::catalog::{PhaseCatalog, PhaseId};

/// Side effect requested when a trigger fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Play a narration cue (at most one in flight)
    Narration(String),
    /// Play a sound effect
    Sound(String),
    /// Fire a haptic pulse with intensity in `[0, 1]`
    Haptic(f64),
}

impl Effect {
    /// Kind label used in logs, events and metrics.
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        match self {
            Self::Narration(_) => EffectKind::Narration,
            Self::Sound(_) => EffectKind::Sound,
            Self::Haptic(_) => EffectKind::Haptic,
        }
    }
}

/// Effect kind without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Narration cue
    Narration,
    /// Sound cue
    Sound,
    /// Haptic pulse
    Haptic,
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Narration => "narration",
            Self::Sound => "sound",
            Self::Haptic => "haptic",
        })
    }
}

/// A keyed effect that fires when phase progress reaches `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectTrigger {
    /// Unique key within its phase
    pub key: String,
    /// Progress in `[0, 1]` at which the effect fires
    pub threshold: f64,
    /// What to do
    pub effect: Effect,
}

impl EffectTrigger {
    /// Narration trigger.
    #[must_use]
    pub fn narration(key: &str, threshold: f64, cue: &str) -> Self {
        Self {
            key: key.to_owned(),
            threshold,
            effect: Effect::Narration(cue.to_owned()),
        }
    }

    /// Sound trigger.
    #[must_use]
    pub fn sound(key: &str, threshold: f64, cue: &str) -> Self {
        Self {
            key: key.to_owned(),
            threshold,
            effect: Effect::Sound(cue.to_owned()),
        }
    }

    /// Haptic trigger.
    #[must_use]
    pub fn haptic(key: &str, threshold: f64, intensity: f64) -> Self {
        Self {
            key: key.to_owned(),
            threshold,
            effect: Effect::Haptic(intensity),
        }
    }
}

/// Keys that already fired during the current phase visit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiredSet {
    keys: HashSet<String>,
}

impl FiredSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` fired during this visit.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Records `key`; returns `false` if it was already present.
    pub fn insert(&mut self, key: &str) -> bool {
        self.keys.insert(key.to_owned())
    }

    /// Forgets every key. Called on each phase change.
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Number of keys fired this visit.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing fired yet this visit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Triggers of one phase, ordered by ascending threshold.
///
/// Ties keep registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseTriggers {
    triggers: Vec<EffectTrigger>,
}

impl PhaseTriggers {
    /// Sorts `triggers` by threshold, stable on ties.
    #[must_use]
    pub fn new(mut triggers: Vec<EffectTrigger>) -> Self {
        triggers.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
        Self { triggers }
    }

    /// Triggers in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &EffectTrigger> {
        self.triggers.iter()
    }

    /// Number of triggers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Whether the phase has no triggers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Returns the triggers crossed at `progress` that have not fired yet,
    /// marking them fired.
    pub fn take_crossed(&self, progress: f64, fired: &mut FiredSet) -> Vec<&EffectTrigger> {
        let mut crossed = Vec::new();
        for trigger in &self.triggers {
            // sorted: nothing further along can be crossed either
            if progress < trigger.threshold {
                break;
            }
            if fired.insert(&trigger.key) {
                crossed.push(trigger);
            }
        }
        crossed
    }
}

/// Trigger configuration for every phase of a catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerTable {
    by_phase: HashMap<PhaseId, PhaseTriggers>,
}

impl TriggerTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(phase name, triggers)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::NotFound`] for a phase name missing from
    /// `catalog`, [`PhaseError::InvalidThreshold`] for a threshold
    /// outside `[0, 1]`, or [`PhaseError::DuplicateTriggerKey`] when a
    /// key repeats within a phase.
    pub fn from_named<I, S>(catalog: &PhaseCatalog, entries: I) -> Result<Self, PhaseError>
    where
        I: IntoIterator<Item = (S, Vec<EffectTrigger>)>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for (name, triggers) in entries {
            let name = name.as_ref();
            let phase = catalog
                .by_name(name)
                .ok_or_else(|| PhaseError::NotFound(name.to_owned()))?;
            let mut keys = HashSet::new();
            for trigger in &triggers {
                if !(0.0..=1.0).contains(&trigger.threshold) {
                    return Err(PhaseError::InvalidThreshold {
                        phase: name.to_owned(),
                        key: trigger.key.clone(),
                        threshold: trigger.threshold,
                    });
                }
                // a repeated key would never fire: FiredSet already holds it
                if !keys.insert(trigger.key.as_str()) {
                    return Err(PhaseError::DuplicateTriggerKey {
                        phase: name.to_owned(),
                        key: trigger.key.clone(),
                    });
                }
            }
            table.by_phase.insert(phase.id(), PhaseTriggers::new(triggers));
        }
        Ok(table)
    }

    /// Triggers registered for `phase`, if any.
    #[must_use]
    pub fn for_phase(&self, phase: PhaseId) -> Option<&PhaseTriggers> {
        self.by_phase.get(&phase)
    }

    /// Total number of triggers across all phases.
    #[must_use]
    pub fn trigger_count(&self) -> usize {
        self.by_phase.values().map(PhaseTriggers::len).sum()
    }

    /// Cue table of "The Invisible Cost", keyed to
    /// [`PhaseCatalog::invisible_cost`]. Phases missing from `catalog`
    /// are skipped.
    #[must_use]
    pub fn invisible_cost(catalog: &PhaseCatalog) -> Self {
        let mut table = Self::new();
        for (name, triggers) in default_cues() {
            if let Some(phase) = catalog.by_name(name) {
                table.by_phase.insert(phase.id(), PhaseTriggers::new(triggers));
            }
        }
        table
    }
}

/// Default cues per phase.
///
/// `{industry}` expands to the selected category's industry slug.
#[must_use]
pub fn default_cues() -> Vec<(&'static str, Vec<EffectTrigger>)> {
    vec![
        (
            "industry_selection",
            vec![EffectTrigger::narration("intro", 0.0, "choose_industry")],
        ),
        (
            "building_tension",
            vec![
                EffectTrigger::narration("story", 0.05, "building_{industry}"),
                EffectTrigger::sound("drone", 0.05, "sfx_sphere_forming"),
                EffectTrigger::sound("tick", 0.6, "sfx_dot_appear"),
            ],
        ),
        (
            "industry_vignette",
            vec![
                EffectTrigger::sound("reveal", 0.0, "sfx_reveal"),
                EffectTrigger::narration("vignette", 0.1, "vignette_{industry}"),
                EffectTrigger::haptic("weight", 0.5, 0.3),
            ],
        ),
        (
            "pattern_break",
            vec![
                EffectTrigger::narration("what_if", 0.2, "pattern_break"),
                EffectTrigger::sound("woosh", 0.8, "sfx_line_forming"),
            ],
        ),
        (
            "sucker_punch_reveal",
            vec![
                EffectTrigger::haptic("impact", 0.0, 1.0),
                EffectTrigger::sound("pulse", 0.0, "sfx_pulse"),
                EffectTrigger::narration("number", 0.15, "sucker_punch_{industry}"),
                EffectTrigger::haptic("aftershock", 0.4, 0.6),
            ],
        ),
        (
            "comparison_carousel",
            vec![
                EffectTrigger::narration("card_1", 0.0, "comparison_{industry}_1"),
                EffectTrigger::haptic("card_1_tap", 0.0, 0.4),
                EffectTrigger::narration("card_2", 0.3, "comparison_{industry}_2"),
                EffectTrigger::haptic("card_2_tap", 0.3, 0.4),
                EffectTrigger::narration("card_3", 0.6, "comparison_{industry}_3"),
                EffectTrigger::haptic("card_3_tap", 0.6, 0.4),
                EffectTrigger::narration("ready", 0.85, "ready_change"),
            ],
        ),
        (
            "agentic_orchestration",
            vec![
                EffectTrigger::sound("forming", 0.0, "sfx_sphere_forming"),
                EffectTrigger::narration("agentic", 0.1, "agentic"),
                EffectTrigger::sound("connect", 0.5, "sfx_connection"),
                EffectTrigger::haptic("lock_in", 0.9, 0.5),
            ],
        ),
        (
            "automation_reveal",
            vec![
                EffectTrigger::narration("brand", 0.1, "aa_reveal"),
                EffectTrigger::haptic("brand_pulse", 0.1, 0.7),
            ],
        ),
        (
            "human_return",
            vec![
                EffectTrigger::narration("restoration", 0.0, "restoration"),
                EffectTrigger::narration("breathe", 0.35, "breathe"),
                EffectTrigger::narration("purpose", 0.65, "purpose"),
                EffectTrigger::sound("shrink", 0.95, "sfx_shrink"),
            ],
        ),
        (
            "call_to_action",
            vec![
                EffectTrigger::narration("final", 0.0, "final_cta"),
                EffectTrigger::haptic("signal", 0.0, 0.5),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triggers() -> PhaseTriggers {
        PhaseTriggers::new(vec![
            EffectTrigger::sound("late", 0.9, "sfx_late"),
            EffectTrigger::narration("first", 0.2, "n1"),
            EffectTrigger::haptic("tie", 0.2, 0.5),
            EffectTrigger::sound("start", 0.0, "sfx_start"),
        ])
    }

    #[test]
    fn test_sorted_by_threshold_stable_on_ties() {
        let table = triggers();
        let keys: Vec<&str> = table.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, ["start", "first", "tie", "late"]);
    }

    #[test]
    fn test_take_crossed_fires_each_key_once() {
        let table = triggers();
        let mut fired = FiredSet::new();

        let keys = |v: Vec<&EffectTrigger>| -> Vec<String> {
            v.into_iter().map(|t| t.key.clone()).collect()
        };

        assert_eq!(keys(table.take_crossed(0.0, &mut fired)), ["start"]);
        assert_eq!(keys(table.take_crossed(0.1, &mut fired)), Vec::<String>::new());
        assert_eq!(keys(table.take_crossed(0.5, &mut fired)), ["first", "tie"]);
        assert_eq!(keys(table.take_crossed(0.6, &mut fired)), Vec::<String>::new());
        assert_eq!(keys(table.take_crossed(1.0, &mut fired)), ["late"]);
        assert_eq!(keys(table.take_crossed(1.0, &mut fired)), Vec::<String>::new());
        assert_eq!(fired.len(), 4);
    }

    #[test]
    fn test_cleared_set_allows_refire() {
        let table = triggers();
        let mut fired = FiredSet::new();
        assert_eq!(table.take_crossed(1.0, &mut fired).len(), 4);
        fired.clear();
        assert!(fired.is_empty());
        assert_eq!(table.take_crossed(1.0, &mut fired).len(), 4);
    }

    #[test]
    fn test_from_named_rejects_unknown_phase() {
        let catalog = PhaseCatalog::invisible_cost();
        let err = TriggerTable::from_named(&catalog, [("nope", vec![])]).unwrap_err();
        assert!(matches!(err, PhaseError::NotFound(name) if name == "nope"));
    }

    #[test]
    fn test_from_named_rejects_out_of_range_threshold() {
        let catalog = PhaseCatalog::invisible_cost();
        let err = TriggerTable::from_named(
            &catalog,
            [(
                "building_tension",
                vec![EffectTrigger::sound("x", 1.5, "sfx")],
            )],
        )
        .unwrap_err();
        assert!(matches!(err, PhaseError::InvalidThreshold { .. }));
    }

    #[test]
    fn test_from_named_rejects_duplicate_key_within_phase() {
        let catalog = PhaseCatalog::invisible_cost();
        let err = TriggerTable::from_named(
            &catalog,
            [(
                "building_tension",
                vec![
                    EffectTrigger::sound("hit", 0.2, "sfx_a"),
                    EffectTrigger::haptic("hit", 0.7, 0.5),
                ],
            )],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PhaseError::DuplicateTriggerKey { ref phase, ref key }
                if phase == "building_tension" && key == "hit"
        ));

        // the same key in different phases is fine
        let table = TriggerTable::from_named(
            &catalog,
            [
                ("building_tension", vec![EffectTrigger::sound("hit", 0.2, "sfx_a")]),
                ("pattern_break", vec![EffectTrigger::sound("hit", 0.2, "sfx_b")]),
            ],
        )
        .unwrap();
        assert_eq!(table.trigger_count(), 2);
    }

    #[test]
    fn test_default_table_covers_every_active_phase() {
        let catalog = PhaseCatalog::invisible_cost();
        let table = TriggerTable::invisible_cost(&catalog);
        for phase in catalog.active_phases() {
            assert!(
                table.for_phase(phase.id()).is_some(),
                "no cues for {}",
                phase.name
            );
        }
        assert!(table.for_phase(catalog.waiting().id()).is_none());
    }

    #[test]
    fn test_default_thresholds_in_range_and_keys_unique() {
        for (phase, triggers) in default_cues() {
            let mut keys = HashSet::new();
            for t in &triggers {
                assert!((0.0..=1.0).contains(&t.threshold), "{phase}/{}", t.key);
                assert!(keys.insert(t.key.as_str()), "duplicate key {phase}/{}", t.key);
            }
        }
    }

    #[test]
    fn test_effect_kind_display() {
        assert_eq!(Effect::Haptic(0.5).kind().to_string(), "haptic");
        assert_eq!(Effect::Narration("x".into()).kind(), EffectKind::Narration);
    }
}
