//! Cost model
//!
//! `compute_cost` is a pure function of a validated [`UserInput`] and a
//! [`BenchmarkTable`]. Range benchmarks always resolve to their
//! midpoint, so identical arguments give bit-identical output.

use serde::Serialize;

use crate::error::InputError;

use super::benchmarks::{BenchmarkTable, Category, CategoryBenchmark, FormulaFamily, VolumeBasis};
use super::input::UserInput;

/// Working hours per full-time employee per year.
pub const HOURS_PER_FTE: f64 = 1880.0;

/// Flat-split shares of the aggregate figure: direct, indirect, invisible.
pub const FLAT_SPLIT: (f64, f64, f64) = (0.60, 0.25, 0.15);

/// Itemized invisible cost (detailed formula only).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InvisibleComponents {
    /// Exception handling labor
    pub exception_handling: f64,
    /// Rework
    pub rework: f64,
    /// Working-capital drag
    pub working_capital: f64,
    /// Escalations
    pub escalation: f64,
}

impl InvisibleComponents {
    /// Sum of the components.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.exception_handling + self.rework + self.working_capital + self.escalation
    }
}

/// Labelled, human-readable figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyMetric {
    /// Label
    pub label: String,
    /// Formatted value
    pub value: String,
}

impl KeyMetric {
    fn new(label: &str, value: String) -> Self {
        Self {
            label: label.to_owned(),
            value,
        }
    }
}

/// Output of the cost model for one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    /// Category computed for
    pub category: Category,
    /// Formula family used
    pub formula: FormulaFamily,
    /// Units per year
    pub annual_volume: f64,
    /// Labor hours per year
    pub annual_hours: f64,
    /// Direct cost
    pub direct_cost: f64,
    /// Indirect (overhead) cost
    pub indirect_cost: f64,
    /// Invisible cost
    pub invisible_cost: f64,
    /// Sum of the three
    pub total_cost: f64,
    /// Invisible cost items; zero under the flat-split formula
    pub invisible_components: InvisibleComponents,
    /// Labelled figures for display
    pub key_metrics: Vec<KeyMetric>,
    /// Benchmark citation
    pub source: String,
    /// Sourced ROI multiple for the category
    pub roi_multiple: f64,
    /// Sourced payback period in months
    pub payback_months: f64,
}

impl CostBreakdown {
    /// Invisible cost as a share of total; 0 when total is 0.
    #[must_use]
    pub fn invisible_share(&self) -> f64 {
        if self.total_cost > 0.0 {
            self.invisible_cost / self.total_cost
        } else {
            0.0
        }
    }

    /// Annual hours expressed as full-time employees.
    #[must_use]
    pub fn fte_equivalent(&self) -> f64 {
        self.annual_hours / HOURS_PER_FTE
    }
}

/// Computes the cost breakdown for `input`.
///
/// # Errors
///
/// Returns [`InputError`] when the input fails validation or the table
/// has no benchmark for the category.
pub fn compute_cost(input: &UserInput, benchmarks: &BenchmarkTable) -> Result<CostBreakdown, InputError> {
    let bench = benchmarks
        .get(input.category)
        .ok_or_else(|| InputError::NoBenchmark(input.category.as_str()))?;
    input.validate(bench.volume_basis)?;

    let automation = benchmarks.automation(input.automation);
    let annual_volume = annual_volume(input, bench);
    let unit_cost = bench.unit_cost.midpoint() * benchmarks.channel_factor(input.channel);
    let annual_hours = annual_volume * bench.handling_minutes * automation.handling / 60.0;

    let (direct_cost, indirect_cost, invisible_components, invisible_cost) = match bench.formula {
        FormulaFamily::Detailed => {
            let direct = annual_volume * unit_cost;
            let indirect = direct * (input.overhead_multiplier - 1.0);
            let components = InvisibleComponents {
                exception_handling: annual_volume
                    * bench.exception_rate
                    * automation.exception
                    * bench.exception_minutes
                    / 60.0
                    * input.hourly_rate,
                rework: annual_volume * bench.rework_rate * unit_cost,
                working_capital: direct * bench.working_capital_rate,
                escalation: annual_volume * bench.escalation_rate * bench.escalation_cost,
            };
            (direct, indirect, components, components.total())
        }
        FormulaFamily::FlatSplit => {
            let aggregate = annual_volume * unit_cost * input.overhead_multiplier;
            let (d, i, v) = FLAT_SPLIT;
            (
                aggregate * d,
                aggregate * i,
                InvisibleComponents::default(),
                aggregate * v,
            )
        }
    };

    let mut breakdown = CostBreakdown {
        category: input.category,
        formula: bench.formula,
        annual_volume,
        annual_hours,
        direct_cost,
        indirect_cost,
        invisible_cost,
        total_cost: direct_cost + indirect_cost + invisible_cost,
        invisible_components,
        key_metrics: Vec::new(),
        source: bench.source.clone(),
        roi_multiple: bench.roi_multiple,
        payback_months: bench.payback_months,
    };
    breakdown.key_metrics = key_metrics(&breakdown, input, unit_cost);
    Ok(breakdown)
}

fn annual_volume(input: &UserInput, bench: &CategoryBenchmark) -> f64 {
    match bench.volume_basis {
        VolumeBasis::Monthly => input.monthly_volume.unwrap_or(0.0) * 12.0,
        VolumeBasis::PerEntity => {
            input.customers.unwrap_or(0.0)
                * input.avg_customer_size.unwrap_or(0.0)
                * bench.units_per_entity
        }
    }
}

fn key_metrics(b: &CostBreakdown, input: &UserInput, unit_cost: f64) -> Vec<KeyMetric> {
    let mut metrics = vec![
        KeyMetric::new("Annual volume", format_count(b.annual_volume)),
        KeyMetric::new("Annual hours", format_count(b.annual_hours)),
        KeyMetric::new("Cost per unit", format_money(unit_cost)),
        KeyMetric::new("FTE equivalent", format!("{:.1}", b.fte_equivalent())),
        KeyMetric::new(
            "Invisible share",
            format!("{:.1}%", b.invisible_share() * 100.0),
        ),
    ];
    if let Some(staff) = input.staff_count {
        metrics.push(KeyMetric::new("Current staff", format!("{staff:.0}")));
    }
    metrics
}

/// Formats a dollar amount with thousands separators, e.g. `$1,162,500`.
#[must_use]
pub fn format_money(amount: f64) -> String {
    if amount.abs() < 100.0 {
        return format!("${amount:.2}");
    }
    format!("${}", format_count(amount))
}

/// Formats a count rounded to an integer with thousands separators.
#[must_use]
pub fn format_count(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (idx, ch) in rounded.chars().enumerate() {
        if idx > 0 && (rounded.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0.0 && rounded != "0" {
        out.insert(0, '-');
    }
    out
}
