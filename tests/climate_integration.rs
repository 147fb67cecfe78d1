use solar_upgrade_planner::climate::cache::{ClimateContext, Coordinates, KeyMode};
use solar_upgrade_planner::climate::profile::HOURS_PER_YEAR;
use solar_upgrade_planner::climate::resolver::{ClimateCaches, ClimateSource, HourlyProduction, resolve_climate};
use solar_upgrade_planner::climate::{ClimateStatus, FallbackReason, TempSource};
use solar_upgrade_planner::config::PlannerConfig;
use solar_upgrade_planner::error::ClimateError;
use solar_upgrade_planner::optimizer::{OptimizeOptions, PlanningContext, optimize_upgrades};

/// Source with a fixed daytime production curve; counts network calls.
struct StationSource {
    fetches: usize,
    rate_limited: bool,
}

impl StationSource {
    fn new() -> Self {
        Self {
            fetches: 0,
            rate_limited: false,
        }
    }
}

impl ClimateSource for StationSource {
    fn lookup_coordinates(&mut self, _zip: &str) -> Result<Coordinates, ClimateError> {
        Ok(Coordinates {
            lat: 33.0,
            lon: -117.2,
            label: "San Diego, CA (92130)".to_string(),
        })
    }

    fn fetch_hourly(&mut self, _context: &ClimateContext, _coordinates: &Coordinates) -> Result<HourlyProduction, ClimateError> {
        self.fetches += 1;
        if self.rate_limited {
            return Err(ClimateError::RateLimited);
        }
        let ac_w = (0..HOURS_PER_YEAR)
            .map(|i| match i % 24 {
                10..=14 => 800.0,
                8 | 9 | 15 | 16 => 400.0,
                _ => 0.0,
            })
            .collect();
        let tamb_c = (0..HOURS_PER_YEAR)
            .map(|i| if (12..18).contains(&(i % 24)) { 30.0 } else { 18.0 })
            .collect();
        Ok(HourlyProduction {
            ac_w,
            tamb_c: Some(tamb_c),
            location_label: None,
        })
    }
}

#[test]
fn live_profile_flows_into_plan() {
    let mut cfg = PlannerConfig::vpp_529();
    cfg.sizing.solar_max_kw = 9.0;
    cfg.sizing.solar_step_kw = 1.0;

    let mut caches = ClimateCaches::in_memory();
    let mut source = StationSource::new();
    let snapshot = resolve_climate(&cfg.climate.zip_code, "", &mut caches, Some(&mut source), 1_000, false);
    assert_eq!(snapshot.status, ClimateStatus::VerifiedLive);
    assert_eq!(snapshot.key_mode, KeyMode::DemoKey);
    assert_eq!(snapshot.location_label, "San Diego, CA (92130)");

    let ctx = PlanningContext::new(&cfg, Some(&snapshot));
    assert_eq!(ctx.inputs.climate.status, ClimateStatus::VerifiedLive);
    assert_eq!(ctx.inputs.climate.temp_source, TempSource::NrelTamb);
    assert!((ctx.inputs.production.annual_yield_kwh_per_kw - snapshot.profile.annual_kwh_per_kw).abs() < 1e-9);
    for hour in 0..8 {
        assert_eq!(ctx.inputs.production.hourly_by_month[6][hour], 0.0);
    }

    let result = optimize_upgrades(&ctx, &OptimizeOptions::default()).unwrap();
    assert!(result.best.final_solar_kw >= 5.53);
    assert!(result.baseline.annual.solar_generation_kwh > 0.0);
}

#[test]
fn cached_profile_skips_network() {
    let mut caches = ClimateCaches::in_memory();
    let mut source = StationSource::new();
    let first = resolve_climate("92130", "", &mut caches, Some(&mut source), 1_000, false);
    let second = resolve_climate("92130", "", &mut caches, Some(&mut source), 2_000, false);

    assert_eq!(source.fetches, 1);
    assert_eq!(second.status, ClimateStatus::VerifiedCache);
    assert_eq!(second.profile, first.profile);
    assert_eq!(second.last_verified_at, Some(1_000));
}

#[test]
fn rate_limit_falls_back_but_plan_still_runs() {
    let mut cfg = PlannerConfig::baseline();
    cfg.sizing.solar_max_kw = 6.0;
    cfg.sizing.solar_step_kw = 1.0;

    let mut caches = ClimateCaches::in_memory();
    let mut source = StationSource::new();
    source.rate_limited = true;
    let snapshot = resolve_climate("90210", "", &mut caches, Some(&mut source), 0, false);
    assert_eq!(snapshot.status, ClimateStatus::FallbackSynthetic);
    assert_eq!(snapshot.fallback_reason, Some(FallbackReason::RateLimit429));

    let ctx = PlanningContext::new(&cfg, Some(&snapshot));
    assert_eq!(ctx.inputs.climate.fallback_reason, Some(FallbackReason::RateLimit429));
    assert!(optimize_upgrades(&ctx, &OptimizeOptions::default()).is_ok());
}
