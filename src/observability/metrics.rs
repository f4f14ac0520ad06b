//! Prometheus metrics.
//!
//! The record functions are no-ops until [`init_metrics`] installs a
//! recorder, so library code calls them unconditionally.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::effects::{CueOutcome, CueRecord};
use crate::error::InvisibleCostError;
use crate::phase::TickReport;

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Phase names come from config; longer names are truncated in labels.
const MAX_PHASE_LABEL_LEN: usize = 64;

/// Installs the global recorder, with an HTTP listener on
/// `127.0.0.1:<port>` when `port` is given.
///
/// # Errors
///
/// Returns `InvisibleCostError::Io` when the recorder or listener
/// cannot be installed.
pub fn init_metrics(port: Option<u16>) -> Result<(), InvisibleCostError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| InvisibleCostError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "invisible_cost_phase_transitions_total",
        "Phase transitions by reason"
    );
    describe_gauge!(
        "invisible_cost_current_phase",
        "Currently active phase (1 = active)"
    );
    describe_counter!(
        "invisible_cost_cues_fired_total",
        "Cues handled by the dispatcher, by kind and outcome"
    );
    describe_counter!(
        "invisible_cost_narration_deferrals_total",
        "Narrations deferred behind one already playing"
    );
    describe_counter!(
        "invisible_cost_bridge_messages_total",
        "Messages sent to the render bridge"
    );
    describe_counter!(
        "invisible_cost_bridge_errors_total",
        "Render bridge failures by stage"
    );
    describe_histogram!(
        "invisible_cost_tick_seconds",
        "Wall-clock time spent in one sequencer update"
    );
    describe_gauge!(
        "invisible_cost_computed_total_cost",
        "Total cost of the last computed breakdown"
    );
}

/// Records every transition and cue in `report`.
pub fn record_report(report: &TickReport, previous_phase: &str) {
    let mut previous = previous_phase.to_owned();
    for transition in &report.transitions {
        counter!(
            "invisible_cost_phase_transitions_total",
            "reason" => transition.reason.to_string()
        )
        .increment(1);
        set_current_phase(&transition.to_name, Some(&previous));
        previous.clone_from(&transition.to_name);
    }
    for cue in &report.cues {
        record_cue(cue);
    }
}

/// Records one dispatcher outcome.
pub fn record_cue(cue: &CueRecord) {
    if cue.outcome == CueOutcome::Deferred {
        counter!("invisible_cost_narration_deferrals_total").increment(1);
    }
    counter!(
        "invisible_cost_cues_fired_total",
        "kind" => cue.kind.to_string(),
        "outcome" => outcome_label(cue.outcome)
    )
    .increment(1);
}

const fn outcome_label(outcome: CueOutcome) -> &'static str {
    match outcome {
        CueOutcome::Played => "played",
        CueOutcome::Deferred => "deferred",
        CueOutcome::Retried => "retried",
        CueOutcome::Flushed => "flushed",
        CueOutcome::Skipped => "skipped",
    }
}

/// Flips the phase gauge from `previous` to `phase`.
pub fn set_current_phase(phase: &str, previous: Option<&str>) {
    if let Some(prev) = previous {
        gauge!("invisible_cost_current_phase", "phase" => sanitize_phase_label(prev)).set(0.0);
    }
    gauge!("invisible_cost_current_phase", "phase" => sanitize_phase_label(phase)).set(1.0);
}

/// Records a message handed to the bridge writer.
pub fn record_bridge_message(kind: &'static str) {
    counter!("invisible_cost_bridge_messages_total", "kind" => kind).increment(1);
}

/// Records a bridge failure at `stage` (`connect`, `send`, `receive`).
pub fn record_bridge_error(stage: &'static str) {
    counter!("invisible_cost_bridge_errors_total", "stage" => stage).increment(1);
}

/// Records the time one `update` took.
pub fn record_tick(elapsed: Duration) {
    histogram!("invisible_cost_tick_seconds").record(elapsed.as_secs_f64());
}

/// Publishes the latest total cost.
pub fn set_computed_total_cost(category: &str, total: f64) {
    gauge!("invisible_cost_computed_total_cost", "category" => category.to_owned()).set(total);
}

fn sanitize_phase_label(name: &str) -> String {
    name.chars()
        .take(MAX_PHASE_LABEL_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
