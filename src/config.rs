//! TOML-based planner configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::PlannerError;
use crate::sim::demand_response::FlexMode;
use crate::sim::types::{DispatchMode, MONTHS_PER_YEAR};

/// Top-level planner configuration parsed from TOML.
///
/// All fields have defaults matching the [`PlannerConfig::baseline`] preset.
/// Load from TOML with [`PlannerConfig::from_toml_file`] or pick a preset
/// with [`PlannerConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerConfig {
    /// Baseline system and the solar search range.
    #[serde(default)]
    pub sizing: SizingConfig,
    /// Installer quotes for the baseline systems.
    #[serde(default)]
    pub baseline_quotes: BaselineQuotesConfig,
    /// Household consumption.
    #[serde(default)]
    pub home: HomeConfig,
    /// Site used for the climate lookup.
    #[serde(default)]
    pub climate: ClimateConfig,
    /// Utility tariff.
    #[serde(default)]
    pub rates: RatesConfig,
    /// Upgrade prices.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Battery behaviour and VPP enrolment.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Loan terms.
    #[serde(default)]
    pub financing: FinancingConfig,
    /// Multi-year projection assumptions.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Demand-response features.
    #[serde(default)]
    pub home_flex: HomeFlexConfig,
}

/// The installer's two baseline system sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum BasePreset {
    /// 3.95 kW (10 modules).
    #[default]
    #[serde(rename = "3.95")]
    Kw395,
    /// 5.53 kW (14 modules).
    #[serde(rename = "5.53")]
    Kw553,
}

impl BasePreset {
    pub fn kw(self) -> f64 {
        match self {
            BasePreset::Kw395 => 3.95,
            BasePreset::Kw553 => 5.53,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BasePreset::Kw395 => "3.95 kW (10 modules)",
            BasePreset::Kw553 => "5.53 kW (14 modules)",
        }
    }
}

/// Baseline system and the solar search range.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizingConfig {
    /// Baseline system size: `"3.95"` or `"5.53"`.
    pub builder_base: BasePreset,
    /// Smallest final solar size searched (kW).
    pub solar_min_kw: f64,
    /// Largest final solar size searched (kW).
    pub solar_max_kw: f64,
    /// Search step (kW, must be > 0).
    pub solar_step_kw: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            builder_base: BasePreset::Kw395,
            solar_min_kw: 3.95,
            solar_max_kw: 22.0,
            solar_step_kw: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BaselineQuotesConfig {
    /// Quote for the 3.95 kW system ($).
    pub quote_395: f64,
    /// Quote for the 5.53 kW system ($).
    pub quote_553: f64,
}

impl Default for BaselineQuotesConfig {
    fn default() -> Self {
        Self {
            quote_395: 13_710.0,
            quote_553: 18_110.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HomeConfig {
    /// Annual household consumption (kWh, must be > 0).
    pub annual_load_kwh: f64,
    /// Share of daily load falling in the 16:00-21:00 peak window.
    pub peak_share: f64,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            annual_load_kwh: 24_000.0,
            peak_share: 0.4,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClimateConfig {
    /// Five-digit US ZIP code.
    pub zip_code: String,
    /// Production-model API key; empty selects the demo key.
    pub api_key: String,
}

/// How export credits are priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportRateMode {
    /// One rate for every export hour (`export_rate`).
    #[default]
    Nem3Override,
    /// Separate off-peak/peak rates (`export_off_peak`, `export_peak`).
    Flat,
    /// Per-month off-peak/peak arrays.
    Monthly,
}

/// Utility tariff ($/kWh unless noted).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RatesConfig {
    pub import_off_peak: f64,
    pub import_peak: f64,
    pub export_rate: f64,
    /// Non-bypassable charge per imported kWh.
    pub nbc_rate: f64,
    /// Fixed charge per month ($).
    pub fixed_monthly_charge: f64,
    pub export_mode: ExportRateMode,
    /// Used by `export_mode = "flat"`; defaults to `export_rate`.
    pub export_off_peak: Option<f64>,
    pub export_peak: Option<f64>,
    /// Used by `export_mode = "monthly"`.
    pub export_monthly_off_peak: Option<[f64; MONTHS_PER_YEAR]>,
    pub export_monthly_peak: Option<[f64; MONTHS_PER_YEAR]>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            import_off_peak: 0.36,
            import_peak: 0.58,
            export_rate: 0.04,
            nbc_rate: 0.03,
            fixed_monthly_charge: 24.15,
            export_mode: ExportRateMode::Nem3Override,
            export_off_peak: None,
            export_peak: None,
            export_monthly_off_peak: None,
            export_monthly_peak: None,
        }
    }
}

/// Upgrade prices.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricingConfig {
    /// $/kW when the final system is below 10 kW.
    pub solar_rate_below_10kw: f64,
    /// $/kW when the final system is 10 kW or larger.
    pub solar_rate_at_least_10kw: f64,
    /// Package price for one battery ($).
    pub battery_1_total: f64,
    /// Package price for two batteries ($).
    pub battery_2_total: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            solar_rate_below_10kw: 2760.0,
            solar_rate_at_least_10kw: 2660.0,
            battery_1_total: 3900.0,
            battery_2_total: 9700.0,
        }
    }
}

/// Default reserve by month (percent of usable capacity).
pub const DEFAULT_MONTHLY_RESERVE_PCT: [f64; MONTHS_PER_YEAR] =
    [50.0, 50.0, 30.0, 30.0, 20.0, 20.0, 20.0, 20.0, 20.0, 30.0, 50.0, 50.0];

/// Battery behaviour and VPP enrolment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Enrol batteries in the virtual power plant programme.
    pub vpp_enabled: bool,
    pub dispatch_mode: DispatchMode,
    /// Full charge-plus-discharge cycles per day bounding the hourly rate.
    pub cycles_per_day: f64,
    /// Round-trip efficiency (0.0-1.0].
    pub round_trip_efficiency: f64,
    /// Reserve used for months without a monthly value (percent).
    pub min_reserve_pct: f64,
    /// Reserve per month (percent, 0-95).
    pub monthly_reserve_pct: Option<[f64; MONTHS_PER_YEAR]>,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            vpp_enabled: false,
            dispatch_mode: DispatchMode::SelfConsumptionPeakThenPostpeak,
            cycles_per_day: 0.85,
            round_trip_efficiency: 0.9,
            min_reserve_pct: 20.0,
            monthly_reserve_pct: Some(DEFAULT_MONTHLY_RESERVE_PCT),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinancingConfig {
    pub apr_pct: f64,
    pub loan_years: u32,
}

impl Default for FinancingConfig {
    fn default() -> Self {
        Self {
            apr_pct: 6.0,
            loan_years: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub horizon_years: u32,
    pub discount_rate_pct: f64,
    pub utility_escalation_pct: f64,
    pub solar_degradation_pct: f64,
    pub battery_degradation_pct: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            horizon_years: 15,
            discount_rate_pct: 6.0,
            utility_escalation_pct: 3.0,
            solar_degradation_pct: 0.5,
            battery_degradation_pct: 2.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HomeFlexConfig {
    pub ha: HaConfig,
    pub whf: WhfConfig,
}

/// HVAC pre-conditioning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HaConfig {
    pub enabled: bool,
    pub mode: FlexMode,
    pub summer_setpoint_f: f64,
    pub winter_setpoint_f: f64,
    /// Manual-mode success rate (percent).
    pub success_rate_pct: f64,
    /// Manual-mode window start (hour of day).
    pub pre_cool_start_hour: u32,
    /// Manual-mode window end, exclusive (hour of day).
    pub pre_cool_end_hour: u32,
    /// Manual-mode cap on pre-window hours (1-12).
    pub max_shift_hours_per_day: u32,
    pub max_precool_offset_f: f64,
    pub max_preheat_offset_f: f64,
    pub max_peak_relax_offset_f: f64,
    pub hvac_sensitivity_kwh_per_deg_hour: f64,
    pub max_shift_kwh_per_day: f64,
}

impl Default for HaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: FlexMode::Auto,
            summer_setpoint_f: 74.0,
            winter_setpoint_f: 68.0,
            success_rate_pct: 70.0,
            pre_cool_start_hour: 12,
            pre_cool_end_hour: 16,
            max_shift_hours_per_day: 4,
            max_precool_offset_f: 3.0,
            max_preheat_offset_f: 2.0,
            max_peak_relax_offset_f: 2.0,
            hvac_sensitivity_kwh_per_deg_hour: 0.6,
            max_shift_kwh_per_day: 6.0,
        }
    }
}

/// Whole-house fan.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WhfConfig {
    pub enabled: bool,
    pub mode: FlexMode,
    pub fan_watts: f64,
    pub displaced_ac_watts: f64,
    /// Manual-mode success rate (percent).
    pub success_rate_pct: f64,
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
    /// Manual-mode active months (0 = January).
    pub active_months: Vec<usize>,
}

impl Default for WhfConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: FlexMode::Auto,
            fan_watts: 200.0,
            displaced_ac_watts: 3500.0,
            success_rate_pct: 85.0,
            start_hour: 20,
            start_minute: 30,
            end_hour: 6,
            end_minute: 0,
            active_months: vec![4, 5, 6, 7, 8],
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"sizing.solar_step_kw"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl PlannerConfig {
    /// Default inputs: 3.95 kW baseline, 24,000 kWh/year, flat NEM 3 export.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Baseline home with both demand-response features on auto.
    pub fn flex_home() -> Self {
        Self {
            home_flex: HomeFlexConfig {
                ha: HaConfig {
                    enabled: true,
                    ..HaConfig::default()
                },
                whf: WhfConfig {
                    enabled: true,
                    ..WhfConfig::default()
                },
            },
            climate: ClimateConfig {
                zip_code: "91730".to_string(),
                ..ClimateConfig::default()
            },
            ..Self::default()
        }
    }

    /// Larger 5.53 kW baseline with VPP enrolment.
    pub fn vpp_529() -> Self {
        Self {
            sizing: SizingConfig {
                builder_base: BasePreset::Kw553,
                solar_min_kw: 5.53,
                ..SizingConfig::default()
            },
            battery: BatteryConfig {
                vpp_enabled: true,
                ..BatteryConfig::default()
            },
            climate: ClimateConfig {
                zip_code: "92130".to_string(),
                ..ClimateConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "flex_home", "vpp_529"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "flex_home" => Ok(Self::flex_home()),
            "vpp_529" => Ok(Self::vpp_529()),
            _ => Err(ConfigError::new(
                "preset",
                format!("unknown preset \"{name}\", available: {}", Self::PRESETS.join(", ")),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Baseline solar size (kW).
    pub fn base_kw(&self) -> f64 {
        self.sizing.builder_base.kw()
    }

    /// Quote for the selected baseline system, floored at 0.
    pub fn base_quote(&self) -> f64 {
        let quote = match self.sizing.builder_base {
            BasePreset::Kw395 => self.baseline_quotes.quote_395,
            BasePreset::Kw553 => self.baseline_quotes.quote_553,
        };
        quote.max(0.0)
    }

    /// Returns the configuration if [`PlannerConfig::validate`] finds nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::InvalidConfig`] carrying every violation.
    pub fn into_validated(self) -> Result<Self, PlannerError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(PlannerError::InvalidConfig(errors))
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration can be simulated.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.sizing;

        if s.solar_step_kw.is_nan() || s.solar_step_kw <= 0.0 {
            errors.push(ConfigError::new("sizing.solar_step_kw", "Solar step must be greater than 0."));
        }
        if s.solar_max_kw < s.solar_min_kw {
            errors.push(ConfigError::new(
                "sizing.solar_max_kw",
                "Solar max must be greater than or equal to solar min.",
            ));
        }
        if s.solar_max_kw < self.base_kw() {
            errors.push(ConfigError::new(
                "sizing.solar_max_kw",
                format!("Solar max must be at least the selected Builder base kW ({}).", self.base_kw()),
            ));
        }
        if self.home.annual_load_kwh.is_nan() || self.home.annual_load_kwh <= 0.0 {
            errors.push(ConfigError::new("home.annual_load_kwh", "Annual load must be greater than 0."));
        }
        let q = &self.baseline_quotes;
        if q.quote_395 < 0.0 || q.quote_553 < 0.0 {
            errors.push(ConfigError::new(
                "baseline_quotes",
                "Builder base quote values cannot be negative.",
            ));
        }

        let r = &self.rates;
        if r.export_mode == ExportRateMode::Monthly
            && (r.export_monthly_off_peak.is_none() || r.export_monthly_peak.is_none())
        {
            errors.push(ConfigError::new(
                "rates.export_monthly_off_peak",
                "export_monthly_off_peak and export_monthly_peak are required when export_mode = \"monthly\".",
            ));
        }

        let b = &self.battery;
        if !(b.round_trip_efficiency > 0.0 && b.round_trip_efficiency <= 1.0) {
            errors.push(ConfigError::new("battery.round_trip_efficiency", "must be in (0.0, 1.0]"));
        }

        if let Some(bad) = self.home_flex.whf.active_months.iter().find(|&&m| m >= MONTHS_PER_YEAR) {
            errors.push(ConfigError::new(
                "home_flex.whf.active_months",
                format!("months are 0-11, got {bad}"),
            ));
        }

        errors
    }
}
