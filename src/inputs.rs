//! Resolves raw configuration plus a climate snapshot into the immutable
//! inputs consumed by the annual simulation.

use serde::Serialize;
use tracing::warn;

use crate::climate::cache::KeyMode;
use crate::climate::synthetic::{synthetic_profile, synthetic_temp_hourly_by_month};
use crate::climate::{ClimateSnapshot, ClimateStatus, FallbackReason, TempSource};
use crate::config::{ExportRateMode, PlannerConfig};
use crate::devices::battery::MAX_RESERVE_FRACTION;
use crate::profile::default_load_profile;
use crate::sim::demand_response::{
    DemandResponseSchedule, HaSettings, HourWindow, MinuteWindow, WhfSettings, plan_demand_response,
};
use crate::sim::hvac_shift::HvacShiftParams;
use crate::sim::month::MonthRates;
use crate::sim::types::{
    BASE_SUMMER_SETPOINT_F, BASE_WINTER_SETPOINT_F, BATTERY_USABLE_KWH, DispatchMode, HOURS_PER_DAY,
    MONTHS_PER_YEAR,
};
use crate::sim::whole_house_fan::FanRatings;

/// Fraction of DC solar delivered to household load.
pub const SOLAR_TO_HOME_EFFICIENCY: f64 = 0.975;

/// Thermostat setpoints are clamped to this band (°F).
const SETPOINT_RANGE_F: (f64, f64) = (55.0, 90.0);
/// Upper bound on any HVAC offset (°F).
const MAX_HVAC_OFFSET_F: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionInputs {
    pub annual_yield_kwh_per_kw: f64,
    pub solar_to_home_efficiency: f64,
    pub monthly_profile: [f64; MONTHS_PER_YEAR],
    pub hourly_by_month: [[f64; HOURS_PER_DAY]; MONTHS_PER_YEAR],
    pub temp_hourly_f_by_month: [[f64; HOURS_PER_DAY]; MONTHS_PER_YEAR],
    pub temp_source: TempSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadInputs {
    pub annual_kwh: f64,
    pub peak_share: f64,
    pub month_profile: [f64; MONTHS_PER_YEAR],
    pub summer_setpoint_f: f64,
    pub winter_setpoint_f: f64,
}

/// Export pricing, resolved per month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExportRates {
    Nem3Override { rate: f64 },
    Flat { off_peak: f64, peak: f64 },
    Monthly {
        off_peak: [f64; MONTHS_PER_YEAR],
        peak: [f64; MONTHS_PER_YEAR],
    },
}

impl ExportRates {
    /// `(off_peak, peak)` export rates for `month`, times `scale`.
    pub fn for_month(&self, month: usize, scale: f64) -> (f64, f64) {
        let (off, peak) = match self {
            ExportRates::Nem3Override { rate } => (*rate, *rate),
            ExportRates::Flat { off_peak, peak } => (*off_peak, *peak),
            ExportRates::Monthly { off_peak, peak } => (
                off_peak.get(month).copied().unwrap_or(0.0),
                peak.get(month).copied().unwrap_or(0.0),
            ),
        };
        (off * scale, peak * scale)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateInputs {
    pub import_off_peak: f64,
    pub import_peak: f64,
    pub fixed_monthly_charge: f64,
    pub nbc_per_import_kwh: f64,
    pub export: ExportRates,
}

impl RateInputs {
    /// Tariff for `month` with every price multiplied by `scale`.
    pub fn for_month(&self, month: usize, scale: f64) -> MonthRates {
        let (export_off_peak, export_peak) = self.export.for_month(month, scale);
        MonthRates {
            import_off_peak: self.import_off_peak * scale,
            import_peak: self.import_peak * scale,
            export_off_peak,
            export_peak,
            nbc_per_kwh: self.nbc_per_import_kwh * scale,
            fixed_monthly: self.fixed_monthly_charge * scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryInputs {
    pub usable_kwh_per_unit: f64,
    pub cycles_per_day: f64,
    pub round_trip_efficiency: f64,
    pub dispatch_mode: DispatchMode,
    /// Reserve for months without a monthly value (fraction).
    pub min_reserve_fraction: f64,
    pub monthly_reserve_fraction: Option<[f64; MONTHS_PER_YEAR]>,
}

impl BatteryInputs {
    /// Reserve fraction for `month`, clamped to `[0, 0.95]`.
    pub fn reserve_for_month(&self, month: usize) -> f64 {
        let monthly = self
            .monthly_reserve_fraction
            .and_then(|r| r.get(month).copied())
            .filter(|r| r.is_finite());
        monthly
            .unwrap_or(self.min_reserve_fraction)
            .clamp(0.0, MAX_RESERVE_FRACTION)
    }
}

/// Demand-response parameters and the resolved monthly schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlexInputs {
    pub ha_enabled: bool,
    pub whf_enabled: bool,
    pub hvac: HvacShiftParams,
    pub fan: FanRatings,
    pub schedule: DemandResponseSchedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinancingInputs {
    /// Annual percentage rate as a fraction.
    pub apr: f64,
    pub years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisInputs {
    pub years: u32,
    pub discount_rate: f64,
    pub utility_escalation: f64,
    pub solar_degradation: f64,
    pub battery_degradation: f64,
}

/// Provenance of the climate data behind a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateInfo {
    pub status: ClimateStatus,
    pub location_label: String,
    pub last_verified_at: Option<u64>,
    pub fallback_reason: Option<FallbackReason>,
    pub key_mode: KeyMode,
    pub temp_source: TempSource,
}

/// Everything the annual simulation needs; fixed for a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationInputs {
    pub production: ProductionInputs,
    pub load: LoadInputs,
    pub flex: FlexInputs,
    pub rates: RateInputs,
    pub battery: BatteryInputs,
    pub vpp_enabled: bool,
    pub financing: FinancingInputs,
    pub analysis: AnalysisInputs,
    pub climate: ClimateInfo,
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

fn non_negative(value: f64, fallback: f64) -> f64 {
    finite_or(value, fallback).max(0.0)
}

/// Builds simulation inputs from configuration and an optional climate snapshot.
///
/// A missing snapshot, or one whose profile fails validation, is replaced by
/// the synthetic profile for the configured ZIP and tagged
/// `missing_data` / `invalid_profile`.
///
/// # Arguments
///
/// * `config` - Planner configuration (need not be validated; values are clamped)
/// * `snapshot` - Resolved climate, if any
pub fn build_simulation_inputs(config: &PlannerConfig, snapshot: Option<&ClimateSnapshot>) -> SimulationInputs {
    let verified = snapshot.filter(|s| s.profile.is_valid());
    let profile = match verified {
        Some(s) => s.profile.clone(),
        None => {
            let reason = if snapshot.is_some() { "invalid_profile" } else { "missing_data" };
            warn!(reason, zip = %config.climate.zip_code, "using synthetic climate profile");
            synthetic_profile(Some(&config.climate.zip_code))
        }
    };
    let temp_hourly_f_by_month = if profile.temp_hourly_f_by_month.iter().flatten().all(|t| t.is_finite()) {
        profile.temp_hourly_f_by_month
    } else {
        synthetic_temp_hourly_by_month()
    };

    let climate = match verified {
        Some(s) => ClimateInfo {
            status: s.status,
            location_label: s.location_label.clone(),
            last_verified_at: s.last_verified_at,
            fallback_reason: s.fallback_reason,
            key_mode: s.key_mode,
            temp_source: profile.temp_source,
        },
        None => ClimateInfo {
            status: ClimateStatus::FallbackSynthetic,
            location_label: snapshot.map(|s| s.location_label.clone()).unwrap_or_default(),
            last_verified_at: None,
            fallback_reason: Some(if snapshot.is_some() {
                FallbackReason::InvalidProfile
            } else {
                FallbackReason::MissingData
            }),
            key_mode: snapshot.map(|s| s.key_mode).unwrap_or(KeyMode::DemoKey),
            temp_source: profile.temp_source,
        },
    };

    let ha_raw = &config.home_flex.ha;
    let whf_raw = &config.home_flex.whf;
    let (lo, hi) = SETPOINT_RANGE_F;
    let summer_setpoint_f = finite_or(ha_raw.summer_setpoint_f, BASE_SUMMER_SETPOINT_F).clamp(lo, hi);
    let winter_setpoint_f = finite_or(ha_raw.winter_setpoint_f, BASE_WINTER_SETPOINT_F).clamp(lo, hi);

    let ha = HaSettings {
        enabled: ha_raw.enabled,
        mode: ha_raw.mode,
        success_rate: (finite_or(ha_raw.success_rate_pct, 70.0) / 100.0).clamp(0.0, 1.0),
        window: HourWindow::new(
            ha_raw.pre_cool_start_hour.min(23) as usize,
            ha_raw.pre_cool_end_hour.min(23) as usize,
        ),
        max_shift_hours_per_day: ha_raw.max_shift_hours_per_day as usize,
    };
    let whf = WhfSettings {
        enabled: whf_raw.enabled,
        mode: whf_raw.mode,
        success_rate: (finite_or(whf_raw.success_rate_pct, 85.0) / 100.0).clamp(0.0, 1.0),
        window: MinuteWindow::from_clock(
            whf_raw.start_hour,
            whf_raw.start_minute,
            whf_raw.end_hour,
            whf_raw.end_minute,
        ),
        active_months: whf_raw
            .active_months
            .iter()
            .copied()
            .filter(|&m| m < MONTHS_PER_YEAR)
            .collect(),
    };
    let schedule = plan_demand_response(&ha, &whf, summer_setpoint_f, winter_setpoint_f, &temp_hourly_f_by_month);

    let offset = |v: f64, fallback: f64| {
        if ha.enabled {
            finite_or(v, fallback).clamp(0.0, MAX_HVAC_OFFSET_F)
        } else {
            0.0
        }
    };
    let hvac = HvacShiftParams {
        max_precool_offset_f: offset(ha_raw.max_precool_offset_f, 3.0),
        max_preheat_offset_f: offset(ha_raw.max_preheat_offset_f, 2.0),
        max_peak_relax_offset_f: offset(ha_raw.max_peak_relax_offset_f, 2.0),
        sensitivity_kwh_per_deg_hour: if ha.enabled {
            non_negative(ha_raw.hvac_sensitivity_kwh_per_deg_hour, 0.6)
        } else {
            0.6
        },
        max_shift_kwh_per_day: if ha.enabled {
            non_negative(ha_raw.max_shift_kwh_per_day, 6.0)
        } else {
            0.0
        },
    };
    let fan = if whf.enabled {
        FanRatings {
            fan_watts: non_negative(whf_raw.fan_watts, 200.0),
            displaced_ac_watts: non_negative(whf_raw.displaced_ac_watts, 3500.0),
        }
    } else {
        FanRatings {
            fan_watts: 0.0,
            displaced_ac_watts: 0.0,
        }
    };

    let r = &config.rates;
    let export_rate = non_negative(r.export_rate, 0.04);
    let export = match r.export_mode {
        ExportRateMode::Nem3Override => ExportRates::Nem3Override { rate: export_rate },
        ExportRateMode::Flat => ExportRates::Flat {
            off_peak: non_negative(r.export_off_peak.unwrap_or(export_rate), export_rate),
            peak: non_negative(r.export_peak.unwrap_or(export_rate), export_rate),
        },
        ExportRateMode::Monthly => ExportRates::Monthly {
            off_peak: r
                .export_monthly_off_peak
                .map(|a| a.map(|v| non_negative(v, 0.0)))
                .unwrap_or([export_rate; MONTHS_PER_YEAR]),
            peak: r
                .export_monthly_peak
                .map(|a| a.map(|v| non_negative(v, 0.0)))
                .unwrap_or([export_rate; MONTHS_PER_YEAR]),
        },
    };

    let b = &config.battery;
    let an = &config.analysis;

    SimulationInputs {
        production: ProductionInputs {
            annual_yield_kwh_per_kw: profile.annual_kwh_per_kw,
            solar_to_home_efficiency: SOLAR_TO_HOME_EFFICIENCY,
            monthly_profile: profile.monthly_profile,
            hourly_by_month: profile.hourly_by_month,
            temp_hourly_f_by_month,
            temp_source: profile.temp_source,
        },
        load: LoadInputs {
            annual_kwh: non_negative(config.home.annual_load_kwh, 24_000.0),
            peak_share: finite_or(config.home.peak_share, 0.4),
            month_profile: default_load_profile(),
            summer_setpoint_f,
            winter_setpoint_f,
        },
        flex: FlexInputs {
            ha_enabled: ha.enabled,
            whf_enabled: whf.enabled,
            hvac,
            fan,
            schedule,
        },
        rates: RateInputs {
            import_off_peak: non_negative(r.import_off_peak, 0.36),
            import_peak: non_negative(r.import_peak, 0.58),
            fixed_monthly_charge: non_negative(r.fixed_monthly_charge, 24.15),
            nbc_per_import_kwh: non_negative(r.nbc_rate, 0.03),
            export,
        },
        battery: BatteryInputs {
            usable_kwh_per_unit: BATTERY_USABLE_KWH,
            cycles_per_day: non_negative(b.cycles_per_day, 0.85),
            round_trip_efficiency: finite_or(b.round_trip_efficiency, 0.9).clamp(1e-3, 1.0),
            dispatch_mode: b.dispatch_mode,
            min_reserve_fraction: (finite_or(b.min_reserve_pct, 20.0) / 100.0).clamp(0.0, MAX_RESERVE_FRACTION),
            monthly_reserve_fraction: b.monthly_reserve_pct.map(|pct| pct.map(|p| p / 100.0)),
        },
        vpp_enabled: b.vpp_enabled,
        financing: FinancingInputs {
            apr: non_negative(config.financing.apr_pct, 6.0) / 100.0,
            years: config.financing.loan_years.max(1),
        },
        analysis: AnalysisInputs {
            years: an.horizon_years.max(1),
            discount_rate: non_negative(an.discount_rate_pct, 6.0) / 100.0,
            utility_escalation: non_negative(an.utility_escalation_pct, 3.0) / 100.0,
            solar_degradation: non_negative(an.solar_degradation_pct, 0.5) / 100.0,
            battery_degradation: non_negative(an.battery_degradation_pct, 2.0) / 100.0,
        },
        climate,
    }
}

impl SimulationInputs {
    /// Whether any demand-response feature is on.
    pub fn flex_enabled(&self) -> bool {
        self.flex.ha_enabled || self.flex.whf_enabled
    }
}
