//! Grid search over upgrade candidates and the ranking objective.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::PlannerError;
use crate::optimizer::candidates::{battery_candidates, build_solar_candidates};
use crate::optimizer::context::PlanningContext;
use crate::optimizer::scenario::{BaselineScenario, Scenario, build_upgrade_scenario};

/// Version of the [`OptimizationResult`] field set.
pub const RESULT_SCHEMA_VERSION: u32 = 1;
/// Name of the ranking objective.
pub const OBJECTIVE: &str = "max_incremental_levered_npv";

/// Ranking keys closer than this compare equal.
const RANK_TOLERANCE: f64 = 1e-9;
/// Benefit and NPV at or below this count as "no gain".
const NO_GAIN_EPSILON: f64 = 1e-6;

/// Search options.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OptimizeOptions {
    /// Evaluate only this battery count.
    pub pinned_batteries: Option<u32>,
}

/// Ranked outcome of one search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub schema_version: u32,
    pub objective: &'static str,
    pub baseline: BaselineScenario,
    pub solar_candidates: Vec<f64>,
    pub battery_candidates: Vec<u32>,
    /// Best first.
    pub results: Vec<Scenario>,
    pub best: Scenario,
    pub no_upgrade_recommended: bool,
    /// Candidates dropped for non-finite metrics.
    pub invalid_scenarios: usize,
}

fn rank_key(value: f64) -> f64 {
    (value / RANK_TOLERANCE).round()
}

/// Orders scenarios best first.
///
/// Higher levered NPV, then lower monthly net outflow, lower capex, fewer
/// batteries, and finally smaller solar.
pub fn compare_upgrade_objective(a: &Scenario, b: &Scenario) -> Ordering {
    rank_key(b.incremental_npv())
        .total_cmp(&rank_key(a.incremental_npv()))
        .then_with(|| {
            rank_key(a.incremental_monthly_net_outflow).total_cmp(&rank_key(b.incremental_monthly_net_outflow))
        })
        .then_with(|| rank_key(a.incremental_capex()).total_cmp(&rank_key(b.incremental_capex())))
        .then_with(|| a.final_batteries.cmp(&b.final_batteries))
        .then_with(|| a.final_solar_kw.total_cmp(&b.final_solar_kw))
}

/// Map key for a final system; solar is compared to the micro-kW.
fn scenario_key(scenario: &Scenario) -> (i64, u32) {
    ((scenario.final_solar_kw * 1e6).round() as i64, scenario.final_batteries)
}

/// Whether staying with the baseline is the recommendation.
fn no_upgrade_recommended(ranked: &[Scenario]) -> bool {
    let top_is_baseline = ranked.first().is_some_and(|s| s.is_no_upgrade);
    let best_upgrade_gains = ranked
        .iter()
        .find(|s| !s.is_no_upgrade)
        .is_some_and(|s| s.incremental_annual_benefit > NO_GAIN_EPSILON || s.incremental_npv() > NO_GAIN_EPSILON);
    top_is_baseline || !best_upgrade_gains
}

/// Evaluates every candidate system and ranks them.
///
/// The explicit no-upgrade candidate is included whenever the baseline
/// battery count is among the candidates. Scenarios with non-finite metrics
/// are dropped and counted.
///
/// # Errors
///
/// * [`PlannerError::EmptyCandidateLattice`] if the solar range yields no sizes
/// * [`PlannerError::NoValidScenario`] if every candidate was dropped
pub fn optimize_upgrades(ctx: &PlanningContext, options: &OptimizeOptions) -> Result<OptimizationResult, PlannerError> {
    let baseline = BaselineScenario::build(ctx);
    let range = &ctx.solar_range;
    let min_kw = if range.min_kw.is_finite() {
        range.min_kw.max(baseline.solar_kw)
    } else {
        baseline.solar_kw
    };

    let solar_candidates = build_solar_candidates(min_kw, range.max_kw, range.step_kw);
    if solar_candidates.is_empty() {
        warn!(min_kw, max_kw = range.max_kw, step_kw = range.step_kw, "empty solar candidate range");
        return Err(PlannerError::EmptyCandidateLattice);
    }
    let battery_candidates = battery_candidates(baseline.batteries, options.pinned_batteries);

    let mut pairs: Vec<(f64, u32)> = battery_candidates
        .iter()
        .flat_map(|&b| solar_candidates.iter().map(move |&kw| (kw, b)))
        .collect();
    if battery_candidates.contains(&baseline.batteries) {
        pairs.push((baseline.solar_kw, baseline.batteries));
    }

    let mut by_system = BTreeMap::new();
    let mut invalid_scenarios = 0;
    for (solar_kw, batteries) in pairs {
        let scenario = build_upgrade_scenario(ctx, &baseline, solar_kw, batteries);
        if !scenario.is_finite() {
            debug!(solar_kw, batteries, "dropping scenario with non-finite metrics");
            invalid_scenarios += 1;
            continue;
        }
        by_system.insert(scenario_key(&scenario), scenario);
    }

    let mut results: Vec<Scenario> = by_system.into_values().collect();
    results.sort_by(compare_upgrade_objective);

    let no_upgrade_recommended = no_upgrade_recommended(&results);
    let best = if no_upgrade_recommended {
        results.iter().find(|s| s.is_no_upgrade).or(results.first())
    } else {
        results.first()
    }
    .cloned()
    .ok_or(PlannerError::NoValidScenario {
        invalid: invalid_scenarios,
    })?;

    if invalid_scenarios > 0 {
        warn!(invalid_scenarios, "some candidates produced non-finite results");
    }
    info!(
        evaluated = results.len(),
        best_solar_kw = best.final_solar_kw,
        best_batteries = best.final_batteries,
        no_upgrade_recommended,
        "optimization complete"
    );

    Ok(OptimizationResult {
        schema_version: RESULT_SCHEMA_VERSION,
        objective: OBJECTIVE,
        baseline,
        solar_candidates,
        battery_candidates,
        results,
        best,
        no_upgrade_recommended,
        invalid_scenarios,
    })
}
