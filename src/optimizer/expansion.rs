//! Marginal value of each additional battery along the best path.

use serde::Serialize;
use tracing::info;

use crate::error::PlannerError;
use crate::optimizer::candidates::MAX_BATTERIES;
use crate::optimizer::context::PlanningContext;
use crate::optimizer::scenario::Scenario;
use crate::optimizer::search::{OptimizationResult, OptimizeOptions, optimize_upgrades};

/// Change from the best system with `from_batteries` to the best with
/// `to_batteries`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpansionStep {
    pub from_batteries: u32,
    pub to_batteries: u32,
    /// Best solar size at `to_batteries`.
    pub best_solar_kw: f64,
    pub annual_solar_kwh: f64,
    pub added_solar_kwh: f64,
    pub delta_annual_benefit: f64,
    pub delta_npv: f64,
    pub delta_monthly_outflow: f64,
    /// Whether the recommended system includes this step.
    pub on_recommended_path: bool,
}

impl ExpansionStep {
    fn between(prev: &Scenario, next: &Scenario, recommended_batteries: u32) -> Self {
        Self {
            from_batteries: prev.final_batteries,
            to_batteries: next.final_batteries,
            best_solar_kw: next.final_solar_kw,
            annual_solar_kwh: next.annual.solar_generation_kwh,
            added_solar_kwh: next.added_solar_kwh,
            delta_annual_benefit: next.incremental_annual_benefit - prev.incremental_annual_benefit,
            delta_npv: next.incremental_npv() - prev.incremental_npv(),
            delta_monthly_outflow: next.incremental_monthly_net_outflow - prev.incremental_monthly_net_outflow,
            on_recommended_path: next.final_batteries <= recommended_batteries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpansionResult {
    pub start_batteries: u32,
    pub recommended_batteries: u32,
    pub steps: Vec<ExpansionStep>,
    pub no_upgrade_recommended: bool,
}

/// Explains the recommendation one battery at a time.
///
/// Re-runs the search with the battery count pinned to each offered value
/// and reports the deltas between consecutive counts.
///
/// # Errors
///
/// Returns [`PlannerError::ExpansionPath`] wrapping the failure of any
/// pinned search.
pub fn build_expansion_explanation(
    ctx: &PlanningContext,
    optimization: &OptimizationResult,
) -> Result<ExpansionResult, PlannerError> {
    let start_batteries = ctx.baseline.batteries;
    let recommended_batteries = optimization.best.final_batteries;

    let best_by_count = (start_batteries..=MAX_BATTERIES)
        .map(|batteries| {
            optimize_upgrades(
                ctx,
                &OptimizeOptions {
                    pinned_batteries: Some(batteries),
                },
            )
            .map(|r| r.best)
            .map_err(|e| PlannerError::ExpansionPath {
                batteries,
                source: Box::new(e),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let steps: Vec<ExpansionStep> = best_by_count
        .windows(2)
        .map(|pair| ExpansionStep::between(&pair[0], &pair[1], recommended_batteries))
        .collect();

    info!(recommended_batteries, steps = steps.len(), "expansion path built");

    Ok(ExpansionResult {
        start_batteries,
        recommended_batteries,
        steps,
        no_upgrade_recommended: optimization.no_upgrade_recommended,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;

    fn context() -> PlanningContext {
        let mut cfg = PlannerConfig::vpp_529();
        cfg.sizing.solar_max_kw = 9.0;
        cfg.sizing.solar_step_kw = 1.5;
        PlanningContext::new(&cfg, None)
    }

    #[test]
    fn steps_cover_each_added_battery() {
        let ctx = context();
        let opt = optimize_upgrades(&ctx, &OptimizeOptions::default()).unwrap();
        let exp = build_expansion_explanation(&ctx, &opt).unwrap();
        assert_eq!(exp.start_batteries, 0);
        assert_eq!(exp.recommended_batteries, opt.best.final_batteries);
        assert_eq!(exp.steps.len(), 2);
        assert_eq!((exp.steps[0].from_batteries, exp.steps[0].to_batteries), (0, 1));
        assert_eq!((exp.steps[1].from_batteries, exp.steps[1].to_batteries), (1, 2));
        for step in &exp.steps {
            assert_eq!(step.on_recommended_path, step.to_batteries <= opt.best.final_batteries);
            assert!(step.delta_npv.is_finite());
        }
    }

    #[test]
    fn deltas_match_pinned_searches() {
        let ctx = context();
        let opt = optimize_upgrades(&ctx, &OptimizeOptions::default()).unwrap();
        let exp = build_expansion_explanation(&ctx, &opt).unwrap();
        let pinned = |b| {
            optimize_upgrades(
                &ctx,
                &OptimizeOptions {
                    pinned_batteries: Some(b),
                },
            )
            .unwrap()
            .best
        };
        let (zero, one) = (pinned(0), pinned(1));
        assert!((exp.steps[0].delta_npv - (one.incremental_npv() - zero.incremental_npv())).abs() < 1e-9);
        assert_eq!(exp.steps[0].best_solar_kw, one.final_solar_kw);
    }

    #[test]
    fn pinned_failure_is_wrapped() {
        let ctx = context();
        let opt = optimize_upgrades(&ctx, &OptimizeOptions::default()).unwrap();
        let mut broken = ctx.clone();
        broken.solar_range.step_kw = 0.0;
        let err = build_expansion_explanation(&broken, &opt).unwrap_err();
        assert!(matches!(err, PlannerError::ExpansionPath { batteries: 0, .. }));
    }
}
