//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use solar_upgrade_planner::config::PlannerConfig;
use solar_upgrade_planner::optimizer::PlanningContext;
use solar_upgrade_planner::sim::demand_response::{HaMonth, HourWindow, MinuteWindow, WhfMonth};
use solar_upgrade_planner::sim::dispatch::BatteryDay;
use solar_upgrade_planner::sim::hvac_shift::HvacShiftParams;
use solar_upgrade_planner::sim::types::{BATTERY_UNIT_AC_KW, BATTERY_USABLE_KWH, DispatchMode, HOURS_PER_DAY};
use solar_upgrade_planner::sim::whole_house_fan::FanRatings;
use solar_upgrade_planner::sim::{DayInput, DayResult};

/// Tolerance for per-hour energy balances (kWh).
pub const BALANCE_EPS: f64 = 1e-6;

/// Baseline config with a coarse 1 kW search step up to `max_kw`.
pub fn small_range_config(max_kw: f64) -> PlannerConfig {
    let mut cfg = PlannerConfig::baseline();
    cfg.sizing.solar_max_kw = max_kw;
    cfg.sizing.solar_step_kw = 1.0;
    cfg
}

/// Planning context on the synthetic climate profile for `zip`.
pub fn context_for(zip: &str, cfg: &mut PlannerConfig) -> PlanningContext {
    cfg.climate.zip_code = zip.to_string();
    PlanningContext::new(cfg, None)
}

/// Solar spread evenly over 08:00-16:00.
pub fn midday_shape() -> [f64; HOURS_PER_DAY] {
    let mut shape = [0.0; HOURS_PER_DAY];
    for slot in shape.iter_mut().take(16).skip(8) {
        *slot = 1.0 / 8.0;
    }
    shape
}

/// Day input with demand response switched off.
pub fn plain_day(
    month: usize,
    day_load_kwh: f64,
    day_solar_kwh: f64,
    batteries: u32,
    reserve_fraction: f64,
    mode: DispatchMode,
) -> DayInput {
    DayInput {
        month,
        day_load_kwh,
        day_solar_kwh,
        peak_share: 0.4,
        solar_shape: midday_shape(),
        battery: BatteryDay {
            capacity_kwh: f64::from(batteries) * BATTERY_USABLE_KWH,
            cycles_per_day: 0.85,
            round_trip_efficiency: 0.9,
            reserve_fraction,
            dispatch_mode: mode,
        },
        solar_to_home_efficiency: 0.975,
        max_ac_output_kw: (batteries > 0).then(|| f64::from(batteries) * BATTERY_UNIT_AC_KW),
        hvac: HvacShiftParams {
            max_precool_offset_f: 0.0,
            max_preheat_offset_f: 0.0,
            max_peak_relax_offset_f: 0.0,
            sensitivity_kwh_per_deg_hour: 0.6,
            max_shift_kwh_per_day: 0.0,
        },
        ha: HaMonth {
            success_rate: 0.0,
            window: HourWindow::new(12, 16),
            max_shift_hours: 0,
        },
        fan: FanRatings {
            fan_watts: 0.0,
            displaced_ac_watts: 0.0,
        },
        whf: WhfMonth {
            active: false,
            success_rate: 0.0,
            window: MinuteWindow::new(0, 0),
        },
    }
}

/// Asserts both per-hour balances hold for every record.
pub fn assert_balanced(result: &DayResult) {
    for r in &result.hours {
        let served = r.direct_solar_kwh + r.battery_to_load_kwh + r.import_kwh;
        assert!(
            (r.load_kwh - served).abs() < BALANCE_EPS,
            "load imbalance at hour {}: {r}",
            r.hour
        );
        let used = r.direct_solar_dc_kwh + r.charge_input_kwh + r.export_kwh + r.clipped_kwh;
        assert!(
            (r.solar_raw_kwh - used).abs() < BALANCE_EPS,
            "solar imbalance at hour {}: {r}",
            r.hour
        );
    }
}
