//! Savings model
//!
//! A pure projection from a [`CostBreakdown`]. ROI and payback are
//! sourced constants carried on the breakdown, never computed here.

use serde::Serialize;

use super::input::ReductionFraction;
use super::model::CostBreakdown;

/// Years covered by the multi-year projection.
pub const PROJECTION_YEARS: f64 = 3.0;

/// Projected savings for one reduction fraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsProjection {
    /// Fraction applied
    pub reduction: ReductionFraction,
    /// `total_cost × reduction`
    pub annual_savings: f64,
    /// `annual_savings × 3`
    pub three_year_savings: f64,
    /// `annual_hours × reduction`
    pub hours_recovered: f64,
    /// Hours recovered as full-time employees
    pub fte_recovered: f64,
    /// Sourced ROI multiple
    pub roi_multiple: f64,
    /// Sourced payback period in months
    pub payback_months: f64,
}

/// Projects savings from `cost` at `reduction`.
#[must_use]
pub fn project_savings(cost: &CostBreakdown, reduction: ReductionFraction) -> SavingsProjection {
    let fraction = reduction.get();
    let annual_savings = cost.total_cost * fraction;
    let hours_recovered = cost.annual_hours * fraction;
    SavingsProjection {
        reduction,
        annual_savings,
        three_year_savings: annual_savings * PROJECTION_YEARS,
        hours_recovered,
        fte_recovered: hours_recovered / super::model::HOURS_PER_FTE,
        roi_multiple: cost.roi_multiple,
        payback_months: cost.payback_months,
    }
}
