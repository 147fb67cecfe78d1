//! Synthetic climate used whenever no verified profile is available.

use std::f64::consts::PI;

use crate::climate::profile::{ClimateProfile, TempSource};
use crate::profile::{default_solar_profile, normalize};
use crate::sim::types::{HOURS_PER_DAY, MONTHS_PER_YEAR, Season};

/// Daylight hours per month.
pub const MONTHLY_DAYLIGHT_HOURS: [f64; MONTHS_PER_YEAR] =
    [9.8, 10.7, 11.9, 13.1, 14.1, 14.6, 14.4, 13.5, 12.3, 11.1, 10.0, 9.5];

/// Mean daily temperature per month (°F).
pub const MONTHLY_AVG_TEMP_F: [f64; MONTHS_PER_YEAR] = [47.0, 50.0, 55.0, 60.0, 67.0, 75.0, 81.0, 80.0, 75.0, 66.0, 55.0, 48.0];

/// Annual yield used outside every known ZIP band (kWh per kW).
pub const DEFAULT_ANNUAL_YIELD: f64 = 1700.0;

/// Hour of the daily temperature maximum.
const TEMP_PEAK_HOUR: f64 = 15.0;

/// A ZIP-code band with its typical annual yield.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZipYieldHint {
    pub start: u32,
    pub end: u32,
    pub annual_yield: f64,
    pub label: &'static str,
}

pub const ZIP_YIELD_HINTS: [ZipYieldHint; 5] = [
    ZipYieldHint {
        start: 90000,
        end: 93599,
        annual_yield: 1850.0,
        label: "SoCal inland profile",
    },
    ZipYieldHint {
        start: 93600,
        end: 96199,
        annual_yield: 1700.0,
        label: "NorCal inland profile",
    },
    ZipYieldHint {
        start: 97000,
        end: 98699,
        annual_yield: 1300.0,
        label: "Pacific Northwest profile",
    },
    ZipYieldHint {
        start: 80000,
        end: 81699,
        annual_yield: 1650.0,
        label: "Mountain West profile",
    },
    ZipYieldHint {
        start: 85000,
        end: 86599,
        annual_yield: 1950.0,
        label: "Desert Southwest profile",
    },
];

/// Yield guess for a ZIP code, with a display label.
///
/// Anything that does not parse as a number or misses every band gets
/// [`DEFAULT_ANNUAL_YIELD`] and `"Default profile"`.
pub fn infer_yield_from_zip(zip: &str) -> (f64, String) {
    let hint = zip
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(|n| ZIP_YIELD_HINTS.iter().find(|h| (h.start..=h.end).contains(&n)));
    match hint {
        Some(h) => (h.annual_yield, format!("{} (ZIP inference)", h.label)),
        None => (DEFAULT_ANNUAL_YIELD, "Default profile".to_string()),
    }
}

/// Gaussian solar shape centred on noon inside the month's daylight window.
pub fn synthetic_solar_hourly_shape(month: usize) -> [f64; HOURS_PER_DAY] {
    let daylight = MONTHLY_DAYLIGHT_HOURS.get(month).copied().unwrap_or(12.0);
    let sunrise = 12.0 - daylight / 2.0;
    let sunset = 12.0 + daylight / 2.0;
    let sigma = (daylight / 4.2).max(1.4);

    let raw: [f64; HOURS_PER_DAY] = std::array::from_fn(|hour| {
        let center = hour as f64 + 0.5;
        if center < sunrise || center > sunset {
            return 0.0;
        }
        let spread = center - 12.0;
        (-(spread * spread) / (2.0 * sigma * sigma)).exp()
    });
    normalize(&raw)
}

/// Hourly temperature for a month: monthly mean plus a cosine peaking at 15:00.
pub fn synthetic_temp_hourly_shape(month: usize) -> [f64; HOURS_PER_DAY] {
    let mean = MONTHLY_AVG_TEMP_F.get(month).copied().unwrap_or(65.0);
    let amplitude = match Season::for_month(month) {
        Season::Summer => 14.0,
        Season::Winter => 10.0,
        Season::Shoulder => 12.0,
    };
    std::array::from_fn(|hour| {
        let radians = (hour as f64 - TEMP_PEAK_HOUR) / HOURS_PER_DAY as f64 * 2.0 * PI;
        mean + radians.cos() * amplitude
    })
}

pub fn synthetic_solar_hourly_by_month() -> [[f64; HOURS_PER_DAY]; MONTHS_PER_YEAR] {
    std::array::from_fn(synthetic_solar_hourly_shape)
}

pub fn synthetic_temp_hourly_by_month() -> [[f64; HOURS_PER_DAY]; MONTHS_PER_YEAR] {
    std::array::from_fn(synthetic_temp_hourly_shape)
}

/// Builds the synthetic profile for an optional ZIP hint.
///
/// # Examples
///
/// ```
/// use solar_upgrade_planner::climate::synthetic::synthetic_profile;
///
/// let profile = synthetic_profile(Some("90210"));
/// assert_eq!(profile.annual_kwh_per_kw, 1850.0);
/// ```
pub fn synthetic_profile(zip_hint: Option<&str>) -> ClimateProfile {
    let (annual_yield, _) = infer_yield_from_zip(zip_hint.unwrap_or(""));
    ClimateProfile {
        annual_kwh_per_kw: annual_yield,
        monthly_profile: default_solar_profile(),
        hourly_by_month: synthetic_solar_hourly_by_month(),
        temp_hourly_f_by_month: synthetic_temp_hourly_by_month(),
        temp_source: TempSource::SyntheticTempFallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_bands() {
        assert_eq!(infer_yield_from_zip("90210").0, 1850.0);
        assert_eq!(infer_yield_from_zip("94110").0, 1700.0);
        assert_eq!(infer_yield_from_zip("98101").0, 1300.0);
        assert_eq!(infer_yield_from_zip("80302").0, 1650.0);
        assert_eq!(infer_yield_from_zip("85004").0, 1950.0);
        assert_eq!(infer_yield_from_zip("10001").0, DEFAULT_ANNUAL_YIELD);
        assert_eq!(infer_yield_from_zip("abc").1, "Default profile");
        assert_eq!(infer_yield_from_zip(" 90210 ").1, "SoCal inland profile (ZIP inference)");
    }

    #[test]
    fn solar_shape_is_daylight_only() {
        for month in 0..MONTHS_PER_YEAR {
            let shape = synthetic_solar_hourly_shape(month);
            let sum: f64 = shape.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
            assert_eq!(shape[2], 0.0);
            assert_eq!(shape[22], 0.0);
            assert!(shape[11] > shape[8]);
        }
        // longer June days reach earlier hours than December
        assert!(synthetic_solar_hourly_shape(5)[5] > 0.0);
        assert_eq!(synthetic_solar_hourly_shape(11)[5], 0.0);
    }

    #[test]
    fn temperature_peaks_mid_afternoon() {
        let july = synthetic_temp_hourly_shape(6);
        assert!((july[15] - (81.0 + 14.0)).abs() < 1e-9);
        assert!((july[3] - (81.0 - 14.0)).abs() < 1e-9);

        let jan = synthetic_temp_hourly_shape(0);
        assert!((jan[15] - 57.0).abs() < 1e-9);

        let april = synthetic_temp_hourly_shape(3);
        assert!((april[15] - 72.0).abs() < 1e-9);
    }
}
