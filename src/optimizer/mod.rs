//! Deterministic search over solar and battery upgrades.

pub mod candidates;
pub mod context;
/// Marginal battery-by-battery explanation of the recommendation.
pub mod expansion;
pub mod scenario;
pub mod search;

pub use candidates::{battery_candidates, build_solar_candidates};
pub use context::PlanningContext;
pub use expansion::{ExpansionResult, ExpansionStep, build_expansion_explanation};
pub use scenario::{BaselineScenario, Scenario, UpgradeCosts};
pub use search::{OptimizationResult, OptimizeOptions, compare_upgrade_objective, optimize_upgrades};
