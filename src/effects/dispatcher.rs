//! Threshold-triggered effect dispatch
//!
//! On every tick the dispatcher evaluates the current phase's triggers
//! against its progress and fires each newly crossed one through the
//! [`EffectsPort`]. Narration gets a soft mutual exclusion: a cue that
//! arrives while another narration is audible is deferred once by a
//! fixed delay, then issued unconditionally.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::phase::catalog::{Phase, PhaseId};
use crate::phase::trigger::{Effect, EffectKind, FiredSet, TriggerTable};

use super::EffectsPort;

/// Placeholder substituted with the selected category's industry.
pub const INDUSTRY_PLACEHOLDER: &str = "{industry}";

/// Tunables for the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherSettings {
    /// Seconds a deferred narration waits before its single retry
    pub narration_retry_delay: f64,
    /// Sound played on every phase change, unless the target is silent
    pub transition_sound: Option<String>,
    /// Animation duration reported to the scene renderer
    pub transition_duration: f64,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            narration_retry_delay: 0.5,
            transition_sound: Some("sfx_transition".to_owned()),
            transition_duration: 1.0,
        }
    }
}

/// Two-state narration debounce.
#[derive(Debug, Clone, PartialEq)]
pub enum NarrationDebounce {
    /// No deferred narration
    Idle,
    /// One narration waits for its retry
    RetryPending {
        /// Trigger key that requested it
        key: String,
        /// Resolved narration cue
        cue: String,
        /// Phase it was requested in
        phase: PhaseId,
        /// Dispatcher clock value at which the retry is issued
        due_at: f64,
    },
}

/// What happened to a cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CueOutcome {
    /// Issued immediately
    Played,
    /// Narration deferred behind one already playing
    Deferred,
    /// Deferred narration issued by its retry
    Retried,
    /// Deferred narration issued early because a newer one took its slot
    Flushed,
    /// Placeholder could not be resolved; nothing was issued
    Skipped,
}

/// A cue the dispatcher handled, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CueRecord {
    /// Phase name
    pub phase: String,
    /// Trigger key
    pub key: String,
    /// Effect kind
    pub kind: EffectKind,
    /// Resolved cue name, or the intensity for haptics
    pub cue: String,
    /// Outcome
    pub outcome: CueOutcome,
}

/// Fires phase triggers through the effects port.
#[derive(Debug)]
pub struct EffectDispatcher {
    port: EffectsPort,
    triggers: TriggerTable,
    settings: DispatcherSettings,
    fired: FiredSet,
    debounce: NarrationDebounce,
    clock: f64,
    industry: Option<String>,
    reported: Option<(PhaseId, u64)>,
}

impl EffectDispatcher {
    /// Creates a dispatcher over `triggers`.
    #[must_use]
    pub fn new(port: EffectsPort, triggers: TriggerTable, settings: DispatcherSettings) -> Self {
        Self {
            port,
            triggers,
            settings,
            fired: FiredSet::new(),
            debounce: NarrationDebounce::Idle,
            clock: 0.0,
            industry: None,
            reported: None,
        }
    }

    /// Sets the industry slug used to expand `{industry}` cues.
    pub fn set_industry(&mut self, industry: Option<String>) {
        self.industry = industry;
    }

    /// Current industry slug.
    #[must_use]
    pub fn industry(&self) -> Option<&str> {
        self.industry.as_deref()
    }

    /// Current debounce state.
    #[must_use]
    pub const fn debounce(&self) -> &NarrationDebounce {
        &self.debounce
    }

    /// Keys fired during the current phase visit.
    #[must_use]
    pub const fn fired(&self) -> &FiredSet {
        &self.fired
    }

    /// The injected port.
    #[must_use]
    pub const fn port(&self) -> &EffectsPort {
        &self.port
    }

    /// Trigger configuration.
    #[must_use]
    pub const fn triggers(&self) -> &TriggerTable {
        &self.triggers
    }

    /// Phase-change policy: hard-cut narration, drop any pending retry,
    /// clear the fired set, play the transition sound unless `entered`
    /// is a silent target, and tell the scene.
    pub fn on_phase_entered(&mut self, entered: &Phase) {
        self.port.narration.stop();
        self.cancel_pending("phase changed");
        self.fired.clear();
        self.reported = None;

        if !entered.silent_transition
            && let Some(sound) = &self.settings.transition_sound
        {
            self.port.sound.play_sound(sound);
        }
        self.port
            .scene
            .transition(&entered.name, self.settings.transition_duration);
    }

    /// Halts everything for `end()` / `reset()`: stops narration, cancels
    /// the pending retry and clears the fired set.
    pub fn halt(&mut self) {
        self.port.narration.stop();
        self.cancel_pending("halted");
        self.fired.clear();
        self.reported = None;
    }

    /// Resets the dispatcher clock. Called when a run starts.
    pub fn rewind_clock(&mut self) {
        self.clock = 0.0;
    }

    /// Advances the dispatcher clock and issues a due narration retry.
    pub fn tick(&mut self, dt: f64, out: &mut Vec<CueRecord>, phase: &Phase) {
        self.clock += dt;

        let due = matches!(
            &self.debounce,
            NarrationDebounce::RetryPending { due_at, .. } if self.clock >= *due_at
        );
        if !due {
            return;
        }

        if let NarrationDebounce::RetryPending { key, cue, .. } =
            std::mem::replace(&mut self.debounce, NarrationDebounce::Idle)
        {
            debug!(phase = %phase.name, trigger_key = %key, cue = %cue, "issuing deferred narration");
            self.port.narration.play(&cue);
            out.push(CueRecord {
                phase: phase.name.clone(),
                key,
                kind: EffectKind::Narration,
                cue,
                outcome: CueOutcome::Retried,
            });
        }
    }

    /// Fires every trigger of `phase` crossed at `progress` that has not
    /// fired during this visit, in ascending threshold order.
    pub fn dispatch(&mut self, phase: &Phase, progress: f64, out: &mut Vec<CueRecord>) {
        let reported = Some((phase.id(), progress.to_bits()));
        if self.reported != reported {
            self.port.scene.progress(phase.id().index(), progress);
            self.reported = reported;
        }

        let Some(triggers) = self.triggers.for_phase(phase.id()) else {
            return;
        };
        let crossed: Vec<_> = triggers
            .take_crossed(progress, &mut self.fired)
            .into_iter()
            .cloned()
            .collect();

        for trigger in crossed {
            let record = self.fire(phase, &trigger.key, &trigger.effect);
            out.extend(record);
        }
    }

    fn fire(&mut self, phase: &Phase, key: &str, effect: &Effect) -> Vec<CueRecord> {
        let record = |cue: String, kind: EffectKind, outcome: CueOutcome| CueRecord {
            phase: phase.name.clone(),
            key: key.to_owned(),
            kind,
            cue,
            outcome,
        };

        match effect {
            Effect::Haptic(intensity) => {
                debug!(phase = %phase.name, trigger_key = key, intensity, "haptic pulse");
                self.port.haptics.pulse(*intensity);
                vec![record(intensity.to_string(), EffectKind::Haptic, CueOutcome::Played)]
            }
            Effect::Sound(template) => match self.resolve(template) {
                Some(cue) => {
                    debug!(phase = %phase.name, trigger_key = key, cue = %cue, "sound cue");
                    self.port.sound.play_sound(&cue);
                    vec![record(cue, EffectKind::Sound, CueOutcome::Played)]
                }
                None => {
                    warn!(phase = %phase.name, trigger_key = key, cue = %template, "unresolved cue skipped");
                    vec![record(template.clone(), EffectKind::Sound, CueOutcome::Skipped)]
                }
            },
            Effect::Narration(template) => {
                let Some(cue) = self.resolve(template) else {
                    warn!(phase = %phase.name, trigger_key = key, cue = %template, "unresolved cue skipped");
                    return vec![record(template.clone(), EffectKind::Narration, CueOutcome::Skipped)];
                };

                if !self.port.narration.is_narrating() {
                    debug!(phase = %phase.name, trigger_key = key, cue = %cue, "narration cue");
                    self.port.narration.play(&cue);
                    return vec![record(cue, EffectKind::Narration, CueOutcome::Played)];
                }

                let mut records = Vec::new();
                let due_at = self.clock + self.settings.narration_retry_delay;
                let previous = std::mem::replace(
                    &mut self.debounce,
                    NarrationDebounce::RetryPending {
                        key: key.to_owned(),
                        cue: cue.clone(),
                        phase: phase.id(),
                        due_at,
                    },
                );
                if let NarrationDebounce::RetryPending {
                    key: old_key,
                    cue: old_cue,
                    ..
                } = previous
                {
                    info!(phase = %phase.name, flushed = %old_cue, by = %cue, "pending narration issued early");
                    self.port.narration.play(&old_cue);
                    records.push(CueRecord {
                        phase: phase.name.clone(),
                        key: old_key,
                        kind: EffectKind::Narration,
                        cue: old_cue,
                        outcome: CueOutcome::Flushed,
                    });
                }
                debug!(
                    phase = %phase.name,
                    trigger_key = key,
                    cue = %cue,
                    delay = self.settings.narration_retry_delay,
                    "narration in flight, deferring"
                );
                records.push(record(cue, EffectKind::Narration, CueOutcome::Deferred));
                records
            }
        }
    }

    fn resolve(&self, template: &str) -> Option<String> {
        if !template.contains(INDUSTRY_PLACEHOLDER) {
            return Some(template.to_owned());
        }
        self.industry
            .as_deref()
            .map(|industry| template.replace(INDUSTRY_PLACEHOLDER, industry))
    }

    fn cancel_pending(&mut self, why: &str) {
        if let NarrationDebounce::RetryPending { cue, .. } =
            std::mem::replace(&mut self.debounce, NarrationDebounce::Idle)
        {
            debug!(cue = %cue, reason = why, "pending narration retry cancelled");
        }
    }
}
