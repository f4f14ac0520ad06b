//! `phases`: print the timeline and its cues.

use std::fmt::Write as _;

use serde::Serialize;

use crate::cli::args::{OutputFormat, PhasesArgs};
use crate::error::InvisibleCostError;
use crate::phase::{Effect, PhaseCatalog, TriggerTable};

use super::load_config;

#[derive(Serialize)]
struct PhaseRow<'a> {
    index: usize,
    name: &'a str,
    display_name: &'a str,
    duration: f64,
    user_controlled: bool,
    silent_transition: bool,
    cues: Vec<CueRow<'a>>,
}

#[derive(Serialize)]
struct CueRow<'a> {
    key: &'a str,
    threshold: f64,
    #[serde(flatten)]
    effect: &'a Effect,
}

/// Prints the configured (or built-in) catalog.
///
/// # Errors
///
/// Returns a config or phase error when the configuration is invalid.
pub fn run(args: &PhasesArgs) -> Result<(), InvisibleCostError> {
    let config = load_config(args.config.as_deref())?;
    let catalog = config.catalog()?;
    let triggers = config.triggers(&catalog)?;

    match args.format {
        OutputFormat::Human => print!("{}", render_human(&catalog, &triggers)),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows(&catalog, &triggers))?);
        }
    }
    Ok(())
}

fn rows<'a>(catalog: &'a PhaseCatalog, triggers: &'a TriggerTable) -> Vec<PhaseRow<'a>> {
    catalog
        .all_phases()
        .iter()
        .map(|phase| PhaseRow {
            index: phase.id().index(),
            name: &phase.name,
            display_name: &phase.display_name,
            duration: phase.duration,
            user_controlled: phase.is_user_controlled(),
            silent_transition: phase.silent_transition,
            cues: triggers
                .for_phase(phase.id())
                .map(|t| {
                    t.iter()
                        .map(|trigger| CueRow {
                            key: &trigger.key,
                            threshold: trigger.threshold,
                            effect: &trigger.effect,
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect()
}

fn render_human(catalog: &PhaseCatalog, triggers: &TriggerTable) -> String {
    let mut out = String::new();
    for row in rows(catalog, triggers) {
        let timing = if row.user_controlled {
            "tap".to_owned()
        } else {
            format!("{}s", row.duration)
        };
        let silent = if row.silent_transition { " (silent)" } else { "" };
        let _ = writeln!(
            out,
            "{:>2}  {:<24} {:>5}  {}{silent}",
            row.index, row.name, timing, row.display_name
        );
        for cue in &row.cues {
            let what = match cue.effect {
                Effect::Narration(c) => format!("narration {c}"),
                Effect::Sound(c) => format!("sound {c}"),
                Effect::Haptic(i) => format!("haptic {i}"),
            };
            let _ = writeln!(out, "      @{:<5.2} {:<14} {what}", cue.threshold, cue.key);
        }
    }
    let _ = writeln!(
        out,
        "\n{} active phases, {}s timed, {} cues",
        catalog.active_phases().count(),
        catalog.nominal_runtime(),
        triggers.trigger_count()
    );
    out
}
