//! Runs the representative-day simulation for every month and folds the
//! results into annual energy and bill totals.

use serde::Serialize;

use crate::inputs::SimulationInputs;
use crate::profile::sanitized_hourly;
use crate::sim::dispatch::{BatteryDay, DayInput, simulate_day};
use crate::sim::month::MonthResult;
use crate::sim::types::{
    BASE_SUMMER_SETPOINT_F, BASE_WINTER_SETPOINT_F, BATTERY_UNIT_AC_KW, DAYS_IN_MONTH, MONTHS_PER_YEAR, Season,
    VPP_CREDIT_PER_KW_YEAR,
};

/// Load change per °F of summer setpoint above 74 °F.
const SUMMER_LOAD_SENSITIVITY_PER_DEG: f64 = 0.03;
/// Load change per °F of winter setpoint below 68 °F.
const WINTER_LOAD_SENSITIVITY_PER_DEG: f64 = 0.025;
const SUMMER_MIN_MULTIPLIER: f64 = 0.70;
const WINTER_MIN_MULTIPLIER: f64 = 0.75;

/// Multipliers applied to solar output, battery capacity, and all prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleOptions {
    pub solar_scale: f64,
    pub battery_scale: f64,
    pub rate_scale: f64,
}

impl Default for ScaleOptions {
    fn default() -> Self {
        Self {
            solar_scale: 1.0,
            battery_scale: 1.0,
            rate_scale: 1.0,
        }
    }
}

impl ScaleOptions {
    fn sanitized(&self) -> Self {
        let clean = |v: f64| if v.is_finite() { v.max(0.0) } else { 1.0 };
        Self {
            solar_scale: clean(self.solar_scale),
            battery_scale: clean(self.battery_scale),
            rate_scale: clean(self.rate_scale),
        }
    }
}

/// Seasonal home-load multiplier from thermostat setpoints.
///
/// Shoulder months average the summer and winter multipliers.
pub fn season_load_multiplier(summer_setpoint_f: f64, winter_setpoint_f: f64, month: usize) -> f64 {
    let summer = (1.0 - (summer_setpoint_f - BASE_SUMMER_SETPOINT_F) * SUMMER_LOAD_SENSITIVITY_PER_DEG)
        .max(SUMMER_MIN_MULTIPLIER);
    let winter = (1.0 + (BASE_WINTER_SETPOINT_F - winter_setpoint_f) * WINTER_LOAD_SENSITIVITY_PER_DEG)
        .max(WINTER_MIN_MULTIPLIER);
    match Season::for_month(month) {
        Season::Summer => summer,
        Season::Winter => winter,
        Season::Shoulder => 0.5 * summer + 0.5 * winter,
    }
}

/// Annual energy flows, bills, and demand-response statistics for one
/// candidate system.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualResult {
    pub solar_kw: f64,
    pub battery_count: u32,

    pub bill_before: f64,
    pub import_energy_cost: f64,
    pub export_credit: f64,
    pub nbc_charges: f64,
    pub fixed_charges: f64,
    /// `max(0, import_energy_cost - export_credit)`.
    pub energy_after_true_up: f64,
    pub utility_bill_after: f64,
    pub vpp_revenue: f64,
    /// Utility bill after minus VPP revenue.
    pub net_energy_economics: f64,
    pub utility_savings: f64,
    /// Utility savings plus VPP revenue.
    pub operating_benefit: f64,

    pub import_peak_kwh: f64,
    pub import_off_peak_kwh: f64,
    pub export_peak_kwh: f64,
    pub export_off_peak_kwh: f64,
    pub before_import_peak_kwh: f64,
    pub before_import_off_peak_kwh: f64,
    pub direct_solar_kwh: f64,
    pub charge_input_kwh: f64,
    pub charge_stored_kwh: f64,
    pub battery_to_load_kwh: f64,
    pub battery_to_load_peak_kwh: f64,
    pub battery_to_load_post_peak_kwh: f64,
    pub reserve_hits: u32,
    /// Lowest monthly reserve floor (kWh); 0 without batteries.
    pub min_reserve_floor_kwh: f64,

    pub hvac_capacity_kwh: f64,
    pub hvac_scheduled_kwh: f64,
    pub hvac_executed_kwh: f64,
    pub hvac_shift_to_pre_kwh: f64,
    pub hvac_shift_to_post_kwh: f64,
    pub hvac_peak_import_avoided_kwh: f64,
    pub whf_fan_kwh: f64,
    pub whf_displaced_ac_kwh: f64,
    pub whf_net_reduction_kwh: f64,
    pub whf_active_hours: u32,

    pub solar_generation_kwh: f64,
    pub home_load_adjusted_kwh: f64,
    pub clipped_kwh: f64,
    /// Clipped share of potential generation.
    pub clipped_pct: f64,
}

impl AnnualResult {
    /// Folds twelve monthly results into the annual totals.
    ///
    /// # Arguments
    ///
    /// * `months` - Monthly results in any order
    /// * `home_load_adjusted_kwh` - Season-adjusted home load over the year
    /// * `vpp_revenue` - Annual VPP credit
    pub fn from_months(
        solar_kw: f64,
        battery_count: u32,
        months: &[MonthResult],
        home_load_adjusted_kwh: f64,
        vpp_revenue: f64,
    ) -> Self {
        let sum = |f: fn(&MonthResult) -> f64| months.iter().map(f).sum::<f64>();

        let bill_before = sum(|m| m.bill_before);
        let import_energy_cost = sum(|m| m.bill_after_energy);
        let export_credit = sum(|m| m.export_credit);
        let nbc_charges = sum(|m| m.bill_after_nbc);
        let fixed_charges = sum(|m| m.fixed_charge);

        let energy_after_true_up = (import_energy_cost - export_credit).max(0.0);
        let utility_bill_after = fixed_charges + nbc_charges + energy_after_true_up;
        let utility_savings = bill_before - utility_bill_after;

        let solar_generation_kwh = sum(|m| m.solar_generation_kwh);
        let clipped_kwh = sum(|m| m.clipped_kwh);
        let potential = solar_generation_kwh + clipped_kwh;

        let min_reserve_floor_kwh = months
            .iter()
            .map(|m| m.reserve_floor_kwh)
            .fold(f64::INFINITY, f64::min);

        Self {
            solar_kw,
            battery_count,
            bill_before,
            import_energy_cost,
            export_credit,
            nbc_charges,
            fixed_charges,
            energy_after_true_up,
            utility_bill_after,
            vpp_revenue,
            net_energy_economics: utility_bill_after - vpp_revenue,
            utility_savings,
            operating_benefit: utility_savings + vpp_revenue,
            import_peak_kwh: sum(|m| m.import_peak_kwh),
            import_off_peak_kwh: sum(|m| m.import_off_peak_kwh),
            export_peak_kwh: sum(|m| m.export_peak_kwh),
            export_off_peak_kwh: sum(|m| m.export_off_peak_kwh),
            before_import_peak_kwh: sum(|m| m.before_import_peak_kwh),
            before_import_off_peak_kwh: sum(|m| m.before_import_off_peak_kwh),
            direct_solar_kwh: sum(|m| m.direct_solar_kwh),
            charge_input_kwh: sum(|m| m.charge_input_kwh),
            charge_stored_kwh: sum(|m| m.charge_stored_kwh),
            battery_to_load_kwh: sum(|m| m.battery_to_load_kwh),
            battery_to_load_peak_kwh: sum(|m| m.battery_to_load_peak_kwh),
            battery_to_load_post_peak_kwh: sum(|m| m.battery_to_load_post_peak_kwh),
            reserve_hits: months.iter().map(|m| m.reserve_hits).sum(),
            min_reserve_floor_kwh: if min_reserve_floor_kwh.is_finite() {
                min_reserve_floor_kwh
            } else {
                0.0
            },
            hvac_capacity_kwh: sum(|m| m.hvac_capacity_kwh),
            hvac_scheduled_kwh: sum(|m| m.hvac_scheduled_kwh),
            hvac_executed_kwh: sum(|m| m.hvac_executed_kwh),
            hvac_shift_to_pre_kwh: sum(|m| m.hvac_shift_to_pre_kwh),
            hvac_shift_to_post_kwh: sum(|m| m.hvac_shift_to_post_kwh),
            hvac_peak_import_avoided_kwh: sum(|m| m.hvac_peak_import_avoided_kwh),
            whf_fan_kwh: sum(|m| m.whf_fan_kwh),
            whf_displaced_ac_kwh: sum(|m| m.whf_displaced_ac_kwh),
            whf_net_reduction_kwh: sum(|m| m.whf_net_reduction_kwh),
            whf_active_hours: months.iter().map(|m| m.whf_active_hours).sum(),
            solar_generation_kwh,
            home_load_adjusted_kwh,
            clipped_kwh,
            clipped_pct: if potential > 0.0 { clipped_kwh / potential } else { 0.0 },
        }
    }

    pub fn import_kwh(&self) -> f64 {
        self.import_peak_kwh + self.import_off_peak_kwh
    }

    pub fn export_kwh(&self) -> f64 {
        self.export_peak_kwh + self.export_off_peak_kwh
    }

    /// Whether every metric the optimizer ranks on is finite.
    pub fn is_finite(&self) -> bool {
        [
            self.bill_before,
            self.utility_bill_after,
            self.vpp_revenue,
            self.net_energy_economics,
            self.utility_savings,
            self.operating_benefit,
            self.solar_generation_kwh,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Simulates the twelve months for one candidate system.
///
/// Each month gets its own load (season-adjusted), solar share, tariff,
/// reserve, and demand-response schedule.
pub fn simulate_months(
    inputs: &SimulationInputs,
    solar_kw: f64,
    battery_count: u32,
    scale: &ScaleOptions,
) -> Vec<(f64, MonthResult)> {
    let scale = scale.sanitized();
    let production = &inputs.production;
    let load = &inputs.load;
    let battery = &inputs.battery;
    let max_ac_output_kw = (battery_count >= 1).then(|| battery_count as f64 * BATTERY_UNIT_AC_KW);
    let capacity_kwh = battery_count as f64 * battery.usable_kwh_per_unit * scale.battery_scale;

    (0..MONTHS_PER_YEAR)
        .map(|month| {
            let home_load_kwh = load.annual_kwh
                * load.month_profile[month]
                * season_load_multiplier(load.summer_setpoint_f, load.winter_setpoint_f, month);
            let solar_kwh =
                solar_kw * production.annual_yield_kwh_per_kw * production.monthly_profile[month] * scale.solar_scale;
            let days = DAYS_IN_MONTH[month];
            let per_day = days as f64;

            let day = simulate_day(&DayInput {
                month,
                day_load_kwh: home_load_kwh / per_day,
                day_solar_kwh: solar_kwh / per_day,
                peak_share: load.peak_share,
                solar_shape: sanitized_hourly(&production.hourly_by_month[month]),
                battery: BatteryDay {
                    capacity_kwh,
                    cycles_per_day: battery.cycles_per_day,
                    round_trip_efficiency: battery.round_trip_efficiency,
                    reserve_fraction: battery.reserve_for_month(month),
                    dispatch_mode: battery.dispatch_mode,
                },
                solar_to_home_efficiency: production.solar_to_home_efficiency,
                max_ac_output_kw,
                hvac: inputs.flex.hvac,
                ha: inputs.flex.schedule.ha[month],
                fan: inputs.flex.fan,
                whf: inputs.flex.schedule.whf[month],
            });

            let rates = inputs.rates.for_month(month, scale.rate_scale);
            (home_load_kwh, MonthResult::from_day(month, &day.summary, days, &rates))
        })
        .collect()
}

/// Annual energy and bills for `solar_kw` of solar and `battery_count`
/// batteries.
///
/// # Arguments
///
/// * `inputs` - Resolved simulation inputs
/// * `solar_kw` - Total installed solar (kW DC)
/// * `battery_count` - Installed battery units
/// * `scale` - Optional solar/battery/rate multipliers; all 1 when `None`
pub fn calculate_annual_energy_and_bills(
    inputs: &SimulationInputs,
    solar_kw: f64,
    battery_count: u32,
    scale: Option<&ScaleOptions>,
) -> AnnualResult {
    let scale = scale.copied().unwrap_or_default();
    let runs = simulate_months(inputs, solar_kw, battery_count, &scale);
    let home_load_adjusted_kwh = runs.iter().map(|(load, _)| load).sum();
    let months: Vec<MonthResult> = runs.into_iter().map(|(_, m)| m).collect();

    let vpp_revenue = if inputs.vpp_enabled {
        battery_count as f64 * BATTERY_UNIT_AC_KW * VPP_CREDIT_PER_KW_YEAR
    } else {
        0.0
    };

    AnnualResult::from_months(solar_kw, battery_count, &months, home_load_adjusted_kwh, vpp_revenue)
}
