//! Cost and savings models
//!
//! Data flows one way: [`UserInput`] → [`compute_cost`] →
//! [`CostBreakdown`] → [`project_savings`] → [`SavingsProjection`].
//! Everything here is pure and deterministic.

pub mod benchmarks;
pub mod input;
pub mod model;
pub mod savings;

pub use benchmarks::{
    AutomationLevel, BenchmarkTable, Category, CategoryBenchmark, Channel, CostRange,
    FormulaFamily, VolumeBasis,
};
pub use input::{ReductionFraction, UserInput};
pub use model::{CostBreakdown, InvisibleComponents, KeyMetric, compute_cost};
pub use savings::{SavingsProjection, project_savings};
