mod common;

use rand::{Rng, SeedableRng, rngs::StdRng};

use solar_upgrade_planner::devices::battery::INITIAL_SOC_FRACTION;
use solar_upgrade_planner::sim::demand_response::{HaMonth, HourWindow, MinuteWindow, WhfMonth};
use solar_upgrade_planner::sim::hvac_shift::HvacShiftParams;
use solar_upgrade_planner::sim::simulate_day;
use solar_upgrade_planner::sim::whole_house_fan::FanRatings;
use solar_upgrade_planner::sim::types::{DispatchMode, HOURS_PER_DAY};

const MODES: [DispatchMode; 3] = [
    DispatchMode::SelfConsumptionAlways,
    DispatchMode::SelfConsumptionPeakThenPostpeak,
    DispatchMode::SelfConsumptionPeakOnly,
];

#[test]
fn random_days_conserve_energy() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..500 {
        let mode = MODES[rng.random_range(0..MODES.len())];
        let input = common::plain_day(
            rng.random_range(0..12),
            rng.random_range(0.0..120.0),
            rng.random_range(0.0..200.0),
            rng.random_range(0..=2),
            rng.random_range(0.0..0.95),
            mode,
        );
        let result = simulate_day(&input);
        assert_eq!(result.hours.len(), HOURS_PER_DAY);
        common::assert_balanced(&result);

        let summary = &result.summary;
        assert!(
            (summary.load_kwh - input.day_load_kwh).abs() < 1e-6 * input.day_load_kwh.max(1.0),
            "daily load {} != {}",
            summary.load_kwh,
            input.day_load_kwh
        );
        assert!(summary.clipped_kwh >= 0.0);
        assert!(summary.charge_stored_kwh <= summary.charge_input_kwh + 1e-9);
    }
}

#[test]
fn random_flex_days_conserve_energy() {
    let mut rng = StdRng::seed_from_u64(1337);
    for _ in 0..500 {
        let mut input = common::plain_day(
            rng.random_range(0..12),
            rng.random_range(0.0..60.0),
            rng.random_range(0.0..150.0),
            rng.random_range(0..=2),
            rng.random_range(0.0..0.95),
            MODES[rng.random_range(0..MODES.len())],
        );
        input.hvac = HvacShiftParams {
            max_precool_offset_f: rng.random_range(0.0..4.0),
            max_preheat_offset_f: rng.random_range(0.0..4.0),
            max_peak_relax_offset_f: rng.random_range(0.0..4.0),
            sensitivity_kwh_per_deg_hour: rng.random_range(0.3..1.0),
            max_shift_kwh_per_day: rng.random_range(0.0..10.0),
        };
        input.ha = HaMonth {
            success_rate: rng.random_range(0.0..=1.0),
            window: HourWindow::new(rng.random_range(0..24), rng.random_range(0..24)),
            max_shift_hours: rng.random_range(1..=12),
        };
        input.fan = FanRatings {
            fan_watts: rng.random_range(0.0..1000.0),
            displaced_ac_watts: rng.random_range(0.0..4000.0),
        };
        input.whf = WhfMonth {
            active: true,
            success_rate: rng.random_range(0.0..=1.0),
            window: MinuteWindow::new(rng.random_range(0..1440), rng.random_range(0..1440)),
        };

        let result = simulate_day(&input);
        let capacity = input.battery.capacity_kwh;
        for r in &result.hours {
            let supplied = r.direct_solar_kwh + r.import_kwh + r.battery_to_load_kwh;
            assert!((supplied - r.load_kwh).abs() < 1e-9, "load imbalance: {r}");
            let solar_out = r.direct_solar_dc_kwh + r.charge_input_kwh + r.export_kwh + r.clipped_kwh;
            assert!((solar_out - r.solar_raw_kwh).abs() < 1e-9, "solar imbalance: {r}");
            assert!(r.whf_delta_kwh <= 0.0, "venting added load: {r}");
            assert!(r.load_kwh >= 0.0, "negative load: {r}");
            assert!(r.soc_kwh >= -1e-9 && r.soc_kwh <= capacity + 1e-9, "soc out of range: {r}");
        }

        let adjusted: f64 = result.hours.iter().map(|r| r.load_kwh).sum();
        let base: f64 = result.hours.iter().map(|r| r.base_load_kwh).sum();
        assert!(adjusted <= base + 1e-9, "adjusted load {adjusted} above base {base}");
    }
}

#[test]
fn random_days_keep_soc_in_bounds() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let batteries = rng.random_range(1..=2);
        let reserve = rng.random_range(0.0..0.95);
        let input = common::plain_day(
            rng.random_range(0..12),
            rng.random_range(5.0..90.0),
            rng.random_range(0.0..150.0),
            batteries,
            reserve,
            MODES[rng.random_range(0..MODES.len())],
        );
        let capacity = input.battery.capacity_kwh;
        let floor = capacity * reserve;
        let start = capacity * INITIAL_SOC_FRACTION;
        let result = simulate_day(&input);

        let mut previous = start;
        for r in &result.hours {
            assert!(r.soc_kwh <= capacity + 1e-9, "over capacity: {r}");
            assert!(r.soc_kwh >= -1e-9, "negative soc: {r}");
            // Discharge never takes the bank below the reserve floor
            if r.battery_to_load_kwh > 0.0 {
                assert!(r.soc_kwh >= floor - 1e-6, "reserve breached: {r}");
            }
            let expected = previous + r.charge_stored_kwh - r.battery_to_load_kwh;
            assert!((r.soc_kwh - expected).abs() < 1e-6, "soc drift: {r}");
            previous = r.soc_kwh;
        }
    }
}

#[test]
fn discharge_respects_dispatch_mode() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..200 {
        let mode = MODES[rng.random_range(0..MODES.len())];
        let input = common::plain_day(6, rng.random_range(20.0..80.0), rng.random_range(60.0..150.0), 2, 0.1, mode);
        let result = simulate_day(&input);
        for r in &result.hours {
            if r.battery_to_load_kwh > 0.0 {
                assert!(mode.allows_discharge(r.hour), "{mode:?} discharged at hour {}", r.hour);
            }
        }
    }
}

#[test]
fn clipping_only_with_inverter_ceiling() {
    // No battery means no inverter ceiling
    let input = common::plain_day(6, 40.0, 500.0, 0, 0.2, DispatchMode::default());
    let result = simulate_day(&input);
    assert_eq!(result.summary.clipped_kwh, 0.0);
    common::assert_balanced(&result);

    // 500 kWh over 8 hours is 62.5 kWh/h against an 11.5 kW ceiling
    let input = common::plain_day(6, 40.0, 500.0, 1, 0.2, DispatchMode::default());
    let result = simulate_day(&input);
    assert!((result.summary.clipped_kwh - (62.5 - 11.5) * 8.0).abs() < 1e-6);
    common::assert_balanced(&result);
}
