//! Everything the optimizer needs for one planning run.

use serde::Serialize;

use crate::climate::ClimateSnapshot;
use crate::config::PlannerConfig;
use crate::inputs::{SimulationInputs, build_simulation_inputs};
use crate::optimizer::candidates::MAX_BATTERIES;

/// Final system size at or above which the lower solar rate applies (kW).
pub const SOLAR_RATE_TIER_KW: f64 = 10.0;

/// The builder's baseline system.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Baseline {
    pub solar_kw: f64,
    pub batteries: u32,
    /// Quote for the baseline system ($).
    pub quote: f64,
    pub label: &'static str,
}

/// Upgrade prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradePricing {
    pub solar_rate_below_tier: f64,
    pub solar_rate_at_or_above_tier: f64,
    /// Package totals indexed by battery count.
    pub battery_totals: [f64; MAX_BATTERIES as usize + 1],
}

impl UpgradePricing {
    /// $/kW for a final system of `final_solar_kw`.
    pub fn solar_rate_per_kw(&self, final_solar_kw: f64) -> f64 {
        if final_solar_kw < SOLAR_RATE_TIER_KW {
            self.solar_rate_below_tier
        } else {
            self.solar_rate_at_or_above_tier
        }
    }

    /// Package price for `count` batteries, clamped to the offered range.
    pub fn battery_total(&self, count: u32) -> f64 {
        self.battery_totals[count.min(MAX_BATTERIES) as usize]
    }
}

/// Solar search range as configured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolarRange {
    pub min_kw: f64,
    pub max_kw: f64,
    pub step_kw: f64,
}

/// Inputs resolved once and shared by every scenario of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanningContext {
    pub baseline: Baseline,
    pub pricing: UpgradePricing,
    pub solar_range: SolarRange,
    pub inputs: SimulationInputs,
}

impl PlanningContext {
    /// Resolves configuration and climate into a planning context.
    ///
    /// Prices are floored at 0. The configuration is not validated here.
    pub fn new(config: &PlannerConfig, snapshot: Option<&ClimateSnapshot>) -> Self {
        let floor = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let p = &config.pricing;
        let base_solar_kw = config.base_kw();

        Self {
            baseline: Baseline {
                solar_kw: base_solar_kw,
                batteries: 0,
                quote: config.base_quote(),
                label: config.sizing.builder_base.label(),
            },
            pricing: UpgradePricing {
                solar_rate_below_tier: floor(p.solar_rate_below_10kw),
                solar_rate_at_or_above_tier: floor(p.solar_rate_at_least_10kw),
                battery_totals: [0.0, floor(p.battery_1_total), floor(p.battery_2_total)],
            },
            solar_range: SolarRange {
                min_kw: config.sizing.solar_min_kw,
                max_kw: config.sizing.solar_max_kw,
                step_kw: config.sizing.solar_step_kw,
            },
            inputs: build_simulation_inputs(config, snapshot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solar_rate_tiers_at_ten_kw() {
        let ctx = PlanningContext::new(&PlannerConfig::baseline(), None);
        assert_eq!(ctx.pricing.solar_rate_per_kw(9.99), 2760.0);
        assert_eq!(ctx.pricing.solar_rate_per_kw(10.0), 2660.0);
    }

    #[test]
    fn battery_totals_clamp_count() {
        let ctx = PlanningContext::new(&PlannerConfig::baseline(), None);
        assert_eq!(ctx.pricing.battery_total(0), 0.0);
        assert_eq!(ctx.pricing.battery_total(1), 3900.0);
        assert_eq!(ctx.pricing.battery_total(5), 9700.0);
    }

    #[test]
    fn baseline_follows_preset() {
        let ctx = PlanningContext::new(&PlannerConfig::vpp_529(), None);
        assert_eq!(ctx.baseline.solar_kw, 5.53);
        assert_eq!(ctx.baseline.quote, 18_110.0);
        assert_eq!(ctx.baseline.label, "5.53 kW (14 modules)");
        assert!(ctx.inputs.vpp_enabled);
    }

    #[test]
    fn negative_prices_are_floored() {
        let mut cfg = PlannerConfig::baseline();
        cfg.pricing.battery_1_total = -100.0;
        let ctx = PlanningContext::new(&cfg, None);
        assert_eq!(ctx.pricing.battery_total(1), 0.0);
    }
}
