//! The climate profile consumed by the simulator, its validity rules, and
//! derivation from a year of hourly production data.

use serde::{Deserialize, Serialize};

use crate::climate::synthetic::{synthetic_solar_hourly_shape, synthetic_temp_hourly_by_month};
use crate::error::ClimateError;
use crate::profile::normalize;
use crate::sim::types::{HOURS_PER_DAY, MONTHS_PER_YEAR};

/// Hours in a non-leap year of hourly data.
pub const HOURS_PER_YEAR: usize = 8760;

/// First day-of-year index of each month.
const MONTH_START_DAY: [usize; MONTHS_PER_YEAR] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Where the hourly temperatures came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempSource {
    /// Measured ambient temperature from the production model.
    NrelTamb,
    /// Cosine seasonal model.
    SyntheticTempFallback,
}

/// Solar yield and temperature for a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateProfile {
    /// Annual AC energy per kW of installed solar.
    pub annual_kwh_per_kw: f64,
    /// Share of annual yield per month.
    pub monthly_profile: [f64; MONTHS_PER_YEAR],
    /// Per-month hourly solar distribution.
    pub hourly_by_month: [[f64; HOURS_PER_DAY]; MONTHS_PER_YEAR],
    /// Representative hourly temperature per month (°F).
    pub temp_hourly_f_by_month: [[f64; HOURS_PER_DAY]; MONTHS_PER_YEAR],
    pub temp_source: TempSource,
}

impl ClimateProfile {
    /// Checks the profile shape.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::InvalidProfile`] naming the first violation:
    /// non-positive yield, negative or non-finite weights, non-finite
    /// temperatures, or no solar energy at all.
    pub fn validate(&self) -> Result<(), ClimateError> {
        let invalid = |msg: &str| Err(ClimateError::InvalidProfile(msg.to_string()));

        if !self.annual_kwh_per_kw.is_finite() || self.annual_kwh_per_kw <= 0.0 {
            return invalid("annual yield must be positive");
        }
        if !self.monthly_profile.iter().all(|v| v.is_finite() && *v >= 0.0) {
            return invalid("monthly profile must be finite and non-negative");
        }
        if !self
            .hourly_by_month
            .iter()
            .flatten()
            .all(|v| v.is_finite() && *v >= 0.0)
        {
            return invalid("hourly profile must be finite and non-negative");
        }
        if !self.temp_hourly_f_by_month.iter().flatten().all(|v| v.is_finite()) {
            return invalid("hourly temperatures must be finite");
        }

        let monthly_total: f64 = self.monthly_profile.iter().sum();
        let hourly_total: f64 = self.hourly_by_month.iter().flatten().sum();
        if !(monthly_total > 0.0 && hourly_total > 0.0) {
            return invalid("profile carries no solar energy");
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

fn month_of_day(day_of_year: usize) -> usize {
    MONTH_START_DAY
        .iter()
        .rposition(|&start| day_of_year >= start)
        .unwrap_or(0)
}

/// Folds a year of hourly AC output (W per kW installed) and optional ambient
/// temperature (°C) into a [`ClimateProfile`].
///
/// Non-finite or negative AC samples count as zero. Measured temperatures
/// are used only when every month-hour bucket has at least one sample;
/// otherwise the synthetic temperature model is used. Months with no
/// production fall back to the synthetic solar shape.
///
/// # Errors
///
/// Returns [`ClimateError::MissingData`] when fewer than 8760 AC samples are
/// given or the year produces no energy.
pub fn derive_climate_profile(ac_w: &[f64], tamb_c: Option<&[f64]>) -> Result<ClimateProfile, ClimateError> {
    if ac_w.len() < HOURS_PER_YEAR {
        return Err(ClimateError::MissingData);
    }
    let tamb_c = tamb_c.filter(|t| t.len() >= HOURS_PER_YEAR);

    let mut energy = [[0.0_f64; HOURS_PER_DAY]; MONTHS_PER_YEAR];
    let mut temp_sum = [[0.0_f64; HOURS_PER_DAY]; MONTHS_PER_YEAR];
    let mut temp_count = [[0_u32; HOURS_PER_DAY]; MONTHS_PER_YEAR];

    for idx in 0..HOURS_PER_YEAR {
        let month = month_of_day(idx / HOURS_PER_DAY);
        let hour = idx % HOURS_PER_DAY;

        let ac = ac_w[idx];
        if ac.is_finite() {
            energy[month][hour] += (ac / 1000.0).max(0.0);
        }
        if let Some(t) = tamb_c.map(|t| t[idx]).filter(|t| t.is_finite()) {
            temp_sum[month][hour] += t * 9.0 / 5.0 + 32.0;
            temp_count[month][hour] += 1;
        }
    }

    let monthly_totals: [f64; MONTHS_PER_YEAR] = std::array::from_fn(|m| energy[m].iter().sum());
    let annual_kwh: f64 = monthly_totals.iter().sum();
    if !annual_kwh.is_finite() || annual_kwh <= 0.0 {
        return Err(ClimateError::MissingData);
    }

    let measured_temps = tamb_c.is_some() && temp_count.iter().flatten().all(|&c| c > 0);
    let (temp_hourly_f_by_month, temp_source) = if measured_temps {
        let temps = std::array::from_fn(|m| std::array::from_fn(|h| temp_sum[m][h] / temp_count[m][h] as f64));
        (temps, TempSource::NrelTamb)
    } else {
        (synthetic_temp_hourly_by_month(), TempSource::SyntheticTempFallback)
    };

    let hourly_by_month = std::array::from_fn(|m| {
        if monthly_totals[m] > 0.0 {
            normalize(&energy[m])
        } else {
            synthetic_solar_hourly_shape(m)
        }
    });

    Ok(ClimateProfile {
        annual_kwh_per_kw: annual_kwh,
        monthly_profile: normalize(&monthly_totals),
        hourly_by_month,
        temp_hourly_f_by_month,
        temp_source,
    })
}
