//! Baseline and upgrade scenarios: cost, annual simulation, and returns.

use serde::Serialize;

use crate::finance::{Projection, monthly_payment, project_levered, project_unlevered};
use crate::optimizer::candidates::MAX_BATTERIES;
use crate::optimizer::context::PlanningContext;
use crate::sim::annual::{AnnualResult, calculate_annual_energy_and_bills};

/// Added solar below this counts as none.
const NO_ADDED_SOLAR_KW: f64 = 1e-9;

/// Incremental cost of moving from the baseline to a final system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UpgradeCosts {
    pub final_solar_kw: f64,
    pub final_batteries: u32,
    pub added_solar_kw: f64,
    pub solar_rate_per_kw: f64,
    pub solar_upgrade_cost: f64,
    pub battery_upgrade_cost: f64,
    pub incremental_capex: f64,
}

impl UpgradeCosts {
    /// Prices an upgrade to `solar_kw` and `batteries`.
    ///
    /// The final solar size never drops below the baseline and the battery
    /// count is clamped to what is offered.
    pub fn new(ctx: &PlanningContext, solar_kw: f64, batteries: u32) -> Self {
        let base = &ctx.baseline;
        let final_solar_kw = if solar_kw.is_finite() {
            solar_kw.max(base.solar_kw)
        } else {
            base.solar_kw
        };
        let final_batteries = batteries.clamp(base.batteries, MAX_BATTERIES);
        let added_solar_kw = (final_solar_kw - base.solar_kw).max(0.0);
        let solar_rate_per_kw = ctx.pricing.solar_rate_per_kw(final_solar_kw);
        let solar_upgrade_cost = added_solar_kw * solar_rate_per_kw;
        let battery_upgrade_cost =
            (ctx.pricing.battery_total(final_batteries) - ctx.pricing.battery_total(base.batteries)).max(0.0);

        Self {
            final_solar_kw,
            final_batteries,
            added_solar_kw,
            solar_rate_per_kw,
            solar_upgrade_cost,
            battery_upgrade_cost,
            incremental_capex: solar_upgrade_cost + battery_upgrade_cost,
        }
    }
}

/// The baseline system as installed, with its own loan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineScenario {
    pub solar_kw: f64,
    pub batteries: u32,
    pub quote: f64,
    pub label: &'static str,
    pub annual: AnnualResult,
    /// Utility savings plus VPP revenue.
    pub annual_net_benefit: f64,
    pub monthly_loan_payment: f64,
    pub monthly_net_energy_outflow: f64,
    pub monthly_net_outflow_with_loan: f64,
}

impl BaselineScenario {
    pub fn build(ctx: &PlanningContext) -> Self {
        let base = &ctx.baseline;
        let annual = calculate_annual_energy_and_bills(&ctx.inputs, base.solar_kw, base.batteries, None);
        let financing = &ctx.inputs.financing;
        let monthly_loan_payment = monthly_payment(base.quote, financing.apr, financing.years);
        let monthly_net_energy_outflow = annual.net_energy_economics / 12.0;

        Self {
            solar_kw: base.solar_kw,
            batteries: base.batteries,
            quote: base.quote,
            label: base.label,
            annual_net_benefit: annual.operating_benefit,
            monthly_loan_payment,
            monthly_net_energy_outflow,
            monthly_net_outflow_with_loan: monthly_net_energy_outflow + monthly_loan_payment,
            annual,
        }
    }
}

/// One upgrade candidate evaluated against the baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub final_solar_kw: f64,
    pub final_batteries: u32,
    /// Same solar and batteries as the baseline.
    pub is_no_upgrade: bool,
    pub costs: UpgradeCosts,
    pub annual: AnnualResult,
    pub annual_net_benefit: f64,
    pub incremental_annual_benefit: f64,
    /// Change in monthly net energy cost versus the baseline.
    pub incremental_monthly_energy_delta: f64,
    pub incremental_loan_payment: f64,
    /// Energy delta plus the upgrade loan payment.
    pub incremental_monthly_net_outflow: f64,
    /// Paid in cash.
    pub unlevered: Projection,
    /// Fully financed; ranked on.
    pub levered: Projection,
    pub total_system_cost_proxy: f64,
    pub base_solar_kwh: f64,
    pub added_solar_kwh: f64,
}

impl Scenario {
    /// Incremental levered NPV.
    pub fn incremental_npv(&self) -> f64 {
        self.levered.npv
    }

    pub fn incremental_capex(&self) -> f64 {
        self.costs.incremental_capex
    }

    /// Whether every field the ranking reads is finite.
    pub fn is_finite(&self) -> bool {
        self.annual.is_finite()
            && [
                self.incremental_annual_benefit,
                self.incremental_monthly_net_outflow,
                self.costs.incremental_capex,
                self.levered.npv,
                self.unlevered.npv,
            ]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Builds the scenario for `solar_kw` and `batteries` against `baseline`.
pub fn build_upgrade_scenario(
    ctx: &PlanningContext,
    baseline: &BaselineScenario,
    solar_kw: f64,
    batteries: u32,
) -> Scenario {
    let costs = UpgradeCosts::new(ctx, solar_kw, batteries);
    let annual = calculate_annual_energy_and_bills(&ctx.inputs, costs.final_solar_kw, costs.final_batteries, None);
    let inputs = &ctx.inputs;

    let annual_net_benefit = annual.operating_benefit;
    let incremental_annual_benefit = annual_net_benefit - baseline.annual_net_benefit;
    let incremental_monthly_energy_delta =
        (annual.net_energy_economics - baseline.annual.net_energy_economics) / 12.0;
    let incremental_loan_payment =
        monthly_payment(costs.incremental_capex, inputs.financing.apr, inputs.financing.years);

    let unlevered = project_unlevered(
        &inputs.analysis,
        costs.incremental_capex,
        incremental_annual_benefit,
        costs.final_batteries,
    );
    let levered = project_levered(
        &inputs.analysis,
        &inputs.financing,
        costs.incremental_capex,
        incremental_annual_benefit,
        costs.final_batteries,
    );

    Scenario {
        final_solar_kw: costs.final_solar_kw,
        final_batteries: costs.final_batteries,
        is_no_upgrade: costs.added_solar_kw <= NO_ADDED_SOLAR_KW && costs.final_batteries == baseline.batteries,
        annual_net_benefit,
        incremental_annual_benefit,
        incremental_monthly_energy_delta,
        incremental_loan_payment,
        incremental_monthly_net_outflow: incremental_monthly_energy_delta + incremental_loan_payment,
        unlevered,
        levered,
        total_system_cost_proxy: baseline.quote + costs.incremental_capex,
        base_solar_kwh: baseline.annual.solar_generation_kwh,
        added_solar_kwh: (annual.solar_generation_kwh - baseline.annual.solar_generation_kwh).max(0.0),
        costs,
        annual,
    }
}
