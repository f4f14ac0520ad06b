//! The experience facade.
//!
//! [`Experience`] is what a host drives: it owns the [`Sequencer`], the
//! visitor's category selection and the last computed cost breakdown,
//! and reports everything that happens to the event stream and metrics.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ExperienceConfig;
use crate::cost::{
    BenchmarkTable, Category, CostBreakdown, ReductionFraction, SavingsProjection, UserInput,
    compute_cost, project_savings,
};
use crate::effects::{DispatcherSettings, EffectDispatcher, EffectsPort};
use crate::error::{InputError, PhaseError};
use crate::observability::metrics;
use crate::observability::{Event, EventEmitter};
use crate::phase::{PhaseCatalog, Sequencer, TickReport, TriggerTable};

/// One visitor's run: timeline plus cost calculation.
#[derive(Debug)]
pub struct Experience {
    sequencer: Sequencer,
    benchmarks: Arc<BenchmarkTable>,
    events: Arc<EventEmitter>,
    session_id: Option<Uuid>,
    category: Option<Category>,
    input: Option<UserInput>,
    breakdown: Option<CostBreakdown>,
}

impl Experience {
    /// Wraps an assembled sequencer.
    #[must_use]
    pub fn new(sequencer: Sequencer, benchmarks: Arc<BenchmarkTable>) -> Self {
        Self {
            sequencer,
            benchmarks,
            events: Arc::new(EventEmitter::noop()),
            session_id: None,
            category: None,
            input: None,
            breakdown: None,
        }
    }

    /// Builds the catalog, cues, dispatcher and benchmarks from `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`PhaseError`] when the configured timeline is invalid.
    pub fn from_config(config: &ExperienceConfig, port: EffectsPort) -> Result<Self, PhaseError> {
        let catalog = Arc::new(config.catalog()?);
        let triggers = config.triggers(&catalog)?;
        let dispatcher = EffectDispatcher::new(port, triggers, config.dispatcher_settings());
        Ok(Self::new(
            Sequencer::new(catalog, dispatcher),
            Arc::new(config.benchmark_table()),
        ))
    }

    /// The built-in experience wired to `port`.
    #[must_use]
    pub fn invisible_cost(port: EffectsPort) -> Self {
        let catalog = Arc::new(PhaseCatalog::invisible_cost());
        let triggers = TriggerTable::invisible_cost(&catalog);
        let dispatcher = EffectDispatcher::new(port, triggers, DispatcherSettings::default());
        Self::new(
            Sequencer::new(catalog, dispatcher),
            Arc::new(BenchmarkTable::industry_defaults()),
        )
    }

    /// Routes events to `events`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<EventEmitter>) -> Self {
        self.events = events;
        self
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The underlying sequencer, read-only.
    #[must_use]
    pub const fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Benchmarks used for cost calculations.
    #[must_use]
    pub fn benchmarks(&self) -> &BenchmarkTable {
        &self.benchmarks
    }

    /// Id of the current run, once started.
    #[must_use]
    pub const fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    /// Selected category, if any.
    #[must_use]
    pub const fn category(&self) -> Option<Category> {
        self.category
    }

    /// Last accepted input.
    #[must_use]
    pub const fn input(&self) -> Option<&UserInput> {
        self.input.as_ref()
    }

    /// Breakdown for the submitted input; `None` until one is accepted.
    #[must_use]
    pub const fn cost_breakdown(&self) -> Option<&CostBreakdown> {
        self.breakdown.as_ref()
    }

    /// Savings at `reduction`; `None` until a breakdown exists.
    #[must_use]
    pub fn savings_projection(&self, reduction: ReductionFraction) -> Option<SavingsProjection> {
        self.breakdown
            .as_ref()
            .map(|cost| project_savings(cost, reduction))
    }

    // ------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------

    /// Starts (or restarts) the run.
    pub fn start(&mut self) -> TickReport {
        let previous = self.sequencer.current().name.clone();
        let report = self.sequencer.start();

        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        let catalog = self.sequencer.catalog();
        info!(%session_id, phases = catalog.active_phases().count(), "experience started");
        self.events.emit(Event::ExperienceStarted {
            timestamp: Utc::now(),
            session_id,
            phase_count: catalog.active_phases().count(),
            nominal_runtime: catalog.nominal_runtime(),
        });

        self.observe(&previous, &report);
        report
    }

    /// Selects the visitor's category and its industry narration.
    ///
    /// Switching category discards input submitted for the old one.
    pub fn select_category(&mut self, category: Category) {
        if self.category != Some(category) {
            info!(category = %category, industry = category.industry(), "category selected");
            if self.input.as_ref().is_some_and(|i| i.category != category) {
                self.input = None;
                self.breakdown = None;
            }
        }
        self.category = Some(category);
        self.sequencer
            .set_industry(Some(category.industry().to_owned()));
    }

    /// Validates `input` and computes its breakdown. The input's category
    /// becomes the selected one.
    ///
    /// # Errors
    ///
    /// Returns the [`InputError`] that rejected the input; previous
    /// state is kept.
    pub fn submit_input(&mut self, input: UserInput) -> Result<&CostBreakdown, InputError> {
        let breakdown = compute_cost(&input, &self.benchmarks).inspect_err(|e| {
            warn!(error = %e, category = %input.category, "input rejected");
        })?;

        self.select_category(input.category);
        info!(
            category = %breakdown.category,
            total = breakdown.total_cost,
            invisible = breakdown.invisible_cost,
            "cost computed"
        );
        metrics::set_computed_total_cost(breakdown.category.as_str(), breakdown.total_cost);
        self.events.emit(Event::cost_computed(&breakdown));

        self.input = Some(input);
        Ok(self.breakdown.insert(breakdown))
    }

    /// Tap to continue.
    pub fn advance(&mut self) -> TickReport {
        let previous = self.sequencer.current().name.clone();
        let report = self.sequencer.advance();
        self.observe(&previous, &report);
        report
    }

    /// Feeds externally driven progress to a duration-0 phase.
    pub fn set_phase_progress(&mut self, progress: f64) -> TickReport {
        let previous = self.sequencer.current().name.clone();
        let report = self.sequencer.set_phase_progress(progress);
        self.observe(&previous, &report);
        report
    }

    /// Ends the run immediately.
    pub fn end(&mut self) -> TickReport {
        let previous = self.sequencer.current().name.clone();
        let report = self.sequencer.end();
        self.observe(&previous, &report);
        report
    }

    /// Back to `waiting` for the next visitor; clears the selection.
    pub fn reset(&mut self) -> TickReport {
        let previous = self.sequencer.current().name.clone();
        let report = self.sequencer.reset();
        self.session_id = None;
        self.category = None;
        self.input = None;
        self.breakdown = None;
        self.sequencer.set_industry(None);
        self.observe(&previous, &report);
        report
    }

    /// Per-tick entry point.
    pub fn update(&mut self, dt: f64) -> TickReport {
        let started = Instant::now();
        let previous = self.sequencer.current().name.clone();
        let report = self.sequencer.update(dt);
        metrics::record_tick(started.elapsed());
        self.observe(&previous, &report);
        report
    }

    fn observe(&self, previous: &str, report: &TickReport) {
        if report.is_empty() {
            return;
        }
        metrics::record_report(report, previous);
        self.events
            .emit_report(report, self.sequencer.state().total_elapsed());
    }
}
