//! `cost`: one-shot breakdown and savings projection.

use std::fmt::Write as _;

use serde::Serialize;

use crate::cli::args::{CostArgs, OutputFormat};
use crate::cost::model::{format_count, format_money};
use crate::cost::{
    CostBreakdown, FormulaFamily, ReductionFraction, SavingsProjection, compute_cost,
    project_savings,
};
use crate::error::InvisibleCostError;
use crate::observability::metrics;

use super::load_config;

#[derive(Serialize)]
struct CostReport<'a> {
    breakdown: &'a CostBreakdown,
    savings: &'a SavingsProjection,
}

/// Computes and prints the breakdown for the given input.
///
/// # Errors
///
/// Returns a usage error without `--category`, an input error for any
/// rejected value, or a config error for a bad `--config` file.
pub fn run(args: &CostArgs) -> Result<(), InvisibleCostError> {
    let category = args
        .input
        .category()?
        .ok_or_else(|| InvisibleCostError::Usage("--category is required".into()))?;
    let reduction = ReductionFraction::new(args.reduction)?;
    let config = load_config(args.config.as_deref())?;
    let benchmarks = config.benchmark_table();

    let input = args.input.to_input(category)?;
    let breakdown = compute_cost(&input, &benchmarks)?;
    metrics::set_computed_total_cost(category.as_str(), breakdown.total_cost);
    let savings = project_savings(&breakdown, reduction);

    match args.format {
        OutputFormat::Human => print!("{}", render_human(&breakdown, &savings)),
        OutputFormat::Json => {
            let report = CostReport {
                breakdown: &breakdown,
                savings: &savings,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn render_human(b: &CostBreakdown, s: &SavingsProjection) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} invisible cost", b.category);
    let _ = writeln!(out);
    let _ = writeln!(out, "  Direct cost       {:>16}", format_money(b.direct_cost));
    let _ = writeln!(out, "  Indirect cost     {:>16}", format_money(b.indirect_cost));
    let _ = writeln!(out, "  Invisible cost    {:>16}", format_money(b.invisible_cost));
    if b.formula == FormulaFamily::Detailed {
        let c = &b.invisible_components;
        for (label, value) in [
            ("exception handling", c.exception_handling),
            ("rework", c.rework),
            ("working capital", c.working_capital),
            ("escalation", c.escalation),
        ] {
            let _ = writeln!(out, "    {label:<18}{:>14}", format_money(value));
        }
    }
    let _ = writeln!(out, "  Total             {:>16}", format_money(b.total_cost));
    let _ = writeln!(out);

    for metric in &b.key_metrics {
        let _ = writeln!(out, "  {:<18}{:>16}", metric.label, metric.value);
    }
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "Savings at {:.0}% reduction",
        s.reduction.get() * 100.0
    );
    let _ = writeln!(out, "  Annual            {:>16}", format_money(s.annual_savings));
    let _ = writeln!(out, "  Three years       {:>16}", format_money(s.three_year_savings));
    let _ = writeln!(out, "  Hours recovered   {:>16}", format_count(s.hours_recovered));
    let _ = writeln!(out, "  FTE recovered     {:>16.1}", s.fte_recovered);
    let _ = writeln!(out, "  ROI               {:>15.1}x", s.roi_multiple);
    let _ = writeln!(out, "  Payback           {:>9.0} months", s.payback_months);
    let _ = writeln!(out);
    let _ = writeln!(out, "Source: {}", b.source);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{BenchmarkTable, Category, UserInput};

    #[test]
    fn human_report_lists_every_section() {
        let input = UserInput::new(Category::TicketProcessing)
            .with_monthly_volume(5_000.0)
            .with_hourly_rate(75.0)
            .with_overhead(2.5);
        let breakdown = compute_cost(&input, &BenchmarkTable::industry_defaults()).unwrap();
        let savings = project_savings(&breakdown, ReductionFraction::new(0.3).unwrap());

        let text = render_human(&breakdown, &savings);
        assert!(text.starts_with("ticket-processing invisible cost"));
        assert!(text.contains("$465,000"));
        assert!(text.contains("$697,500"));
        assert!(text.contains("exception handling"));
        assert!(text.contains("Savings at 30% reduction"));
        assert!(text.contains("Source: "));
    }
}
