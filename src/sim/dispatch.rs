//! Hour-by-hour energy balance for one representative day.
//!
//! Each hour serves load from solar first, stores surplus solar in the
//! battery, discharges the battery when the dispatch mode allows, then
//! exports what is left and imports what is missing. The battery starts
//! every day at half of its capacity.

use serde::Serialize;

use crate::devices::{BatteryBank, Device, HomeLoad, SolarArray};
use crate::profile::hourly_load_shape;
use crate::sim::demand_response::{HaMonth, WhfMonth};
use crate::sim::hvac_shift::{HvacShiftParams, HvacShiftPlan};
use crate::sim::summary::DaySummary;
use crate::sim::types::{DispatchMode, HOURS_PER_DAY, HourRecord, is_peak_hour};
use crate::sim::whole_house_fan::{FanRatings, WholeHouseFanPlan};

/// Solar-to-home conversion efficiency bounds.
const MIN_SOLAR_TO_HOME_EFFICIENCY: f64 = 0.8;
const MAX_SOLAR_TO_HOME_EFFICIENCY: f64 = 1.0;

/// Battery parameters for one simulated day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatteryDay {
    /// Usable capacity of all installed units (kWh).
    pub capacity_kwh: f64,
    pub cycles_per_day: f64,
    pub round_trip_efficiency: f64,
    /// The month's reserve share (0..=0.95).
    pub reserve_fraction: f64,
    pub dispatch_mode: DispatchMode,
}

/// Everything needed to simulate one representative day of a month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayInput {
    /// Zero-based month index.
    pub month: usize,
    /// Household load for the day before demand response (kWh).
    pub day_load_kwh: f64,
    /// DC solar production for the day before clipping (kWh).
    pub day_solar_kwh: f64,
    /// Share of load in peak hours.
    pub peak_share: f64,
    /// Hourly solar distribution for this month.
    pub solar_shape: [f64; HOURS_PER_DAY],
    pub battery: BatteryDay,
    /// Efficiency of solar delivered directly to the home.
    pub solar_to_home_efficiency: f64,
    /// Inverter AC ceiling in kW (one-hour steps, so also kWh per hour).
    pub max_ac_output_kw: Option<f64>,
    pub hvac: HvacShiftParams,
    pub ha: HaMonth,
    pub fan: FanRatings,
    pub whf: WhfMonth,
}

/// Hourly records and totals for one simulated day.
#[derive(Debug, Clone)]
pub struct DayResult {
    pub hours: Vec<HourRecord>,
    pub summary: DaySummary,
}

/// Simulates one representative day.
///
/// # Arguments
///
/// * `input` - Day parameters for the month and candidate system
///
/// # Returns
///
/// The 24 hourly records and their [`DaySummary`].
pub fn simulate_day(input: &DayInput) -> DayResult {
    let load_shape = hourly_load_shape(input.peak_share);
    let base_load = HomeLoad::new(input.day_load_kwh, load_shape);
    let base_kwh: [f64; HOURS_PER_DAY] = std::array::from_fn(|h| base_load.base_kwh(h));
    let hvac_plan = HvacShiftPlan::build(&input.hvac, &input.ha, input.month, &base_kwh);
    let whf_plan = WholeHouseFanPlan::build(&input.fan, &input.whf);

    let load = base_load
        .with_overlay(&hvac_plan.deltas())
        .with_overlay(&whf_plan.net_delta_by_hour_kwh);
    let pv = SolarArray::new(input.day_solar_kwh, input.solar_shape, input.max_ac_output_kw);

    let bat = &input.battery;
    let round_trip = if bat.round_trip_efficiency.is_finite() {
        bat.round_trip_efficiency.clamp(1e-3, 1.0)
    } else {
        1.0
    };
    let mut bank = BatteryBank::new(
        bat.capacity_kwh.max(0.0),
        bat.cycles_per_day.max(0.0),
        round_trip,
        bat.reserve_fraction,
    );

    let efficiency = if input.solar_to_home_efficiency.is_finite() && input.solar_to_home_efficiency > 0.0 {
        input
            .solar_to_home_efficiency
            .clamp(MIN_SOLAR_TO_HOME_EFFICIENCY, MAX_SOLAR_TO_HOME_EFFICIENCY)
    } else {
        MAX_SOLAR_TO_HOME_EFFICIENCY
    };

    let mut hours = Vec::with_capacity(HOURS_PER_DAY);
    for hour in 0..HOURS_PER_DAY {
        let load_kwh = load.energy_kwh(hour);
        let solar = pv.hour(hour);

        let mut load_remaining = load_kwh;
        let mut solar_remaining = solar.delivered_kwh;

        // Solar to home
        let direct_solar_kwh = load_remaining.min(solar_remaining * efficiency).max(0.0);
        let mut direct_solar_dc_kwh = 0.0;
        if direct_solar_kwh > 0.0 {
            direct_solar_dc_kwh = direct_solar_kwh / efficiency;
            load_remaining -= direct_solar_kwh;
            solar_remaining = (solar_remaining - direct_solar_dc_kwh).max(0.0);
        }

        // Solar to battery
        let charge = bank.charge(solar_remaining);
        solar_remaining = (solar_remaining - charge.input_kwh).max(0.0);

        // Battery to home
        let battery_to_load_kwh = if load_remaining > 0.0 && bat.dispatch_mode.allows_discharge(hour) {
            bank.discharge(load_remaining)
        } else {
            0.0
        };
        load_remaining -= battery_to_load_kwh;

        let reserve_hit = bank.at_reserve() && load_remaining > 1e-6;

        hours.push(HourRecord {
            hour,
            is_peak: is_peak_hour(hour),
            base_load_kwh: load.base_kwh(hour),
            hvac_delta_kwh: hvac_plan.delta_kwh(hour),
            whf_delta_kwh: whf_plan.net_delta_by_hour_kwh[hour],
            load_kwh,
            solar_raw_kwh: solar.raw_kwh,
            clipped_kwh: solar.clipped_kwh,
            direct_solar_kwh,
            direct_solar_dc_kwh,
            charge_input_kwh: charge.input_kwh,
            charge_stored_kwh: charge.stored_kwh,
            battery_to_load_kwh,
            export_kwh: solar_remaining,
            import_kwh: load_remaining.max(0.0),
            soc_kwh: bank.soc_kwh,
            reserve_hit,
        });
    }

    let summary = DaySummary::from_hours(&hours, &hvac_plan, &whf_plan, bank.reserve_floor_kwh);
    DayResult { hours, summary }
}
