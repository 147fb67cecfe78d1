//! Normalized weight vectors for monthly and hourly load/solar shapes.

use crate::sim::types::{HOURS_PER_DAY, MONTHS_PER_YEAR, is_peak_hour};

/// Relative monthly household consumption, January first.
pub const DEFAULT_LOAD_PROFILE_RAW: [f64; MONTHS_PER_YEAR] = [
    1.02, 0.95, 0.91, 0.82, 0.79, 0.83, 0.96, 1.07, 0.96, 0.89, 0.91, 0.99,
];

/// Relative monthly solar production, January first.
pub const DEFAULT_SOLAR_PROFILE_RAW: [f64; MONTHS_PER_YEAR] = [
    0.58, 0.66, 0.86, 1.02, 1.12, 1.18, 1.16, 1.08, 0.98, 0.83, 0.64, 0.53,
];

/// Residential hour-of-day consumption weights, midnight first.
pub const BASE_LOAD_HOURLY_RAW: [f64; HOURS_PER_DAY] = [
    0.021, 0.019, 0.018, 0.018, 0.018, 0.021, //
    0.028, 0.037, 0.043, 0.045, 0.043, 0.041, //
    0.040, 0.039, 0.040, 0.044, 0.054, 0.066, //
    0.074, 0.078, 0.070, 0.056, 0.042, 0.031,
];

/// Share of daily load falling in peak hours when none is configured.
pub const DEFAULT_PEAK_SHARE: f64 = 0.4;

/// Scales `values` so they sum to one.
///
/// A non-finite or non-positive total yields the uniform vector `1/N`.
///
/// # Examples
///
/// ```
/// use solar_upgrade_planner::profile::normalize;
///
/// let shape = normalize(&[1.0, 3.0]);
/// assert_eq!(shape, [0.25, 0.75]);
/// assert_eq!(normalize(&[0.0, 0.0]), [0.5, 0.5]);
/// ```
pub fn normalize<const N: usize>(values: &[f64; N]) -> [f64; N] {
    let total: f64 = values.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return [1.0 / N as f64; N];
    }
    values.map(|v| v / total)
}

/// Monthly load weights derived from [`DEFAULT_LOAD_PROFILE_RAW`].
pub fn default_load_profile() -> [f64; MONTHS_PER_YEAR] {
    normalize(&DEFAULT_LOAD_PROFILE_RAW)
}

/// Monthly solar weights derived from [`DEFAULT_SOLAR_PROFILE_RAW`].
pub fn default_solar_profile() -> [f64; MONTHS_PER_YEAR] {
    normalize(&DEFAULT_SOLAR_PROFILE_RAW)
}

/// Hourly load weights derived from [`BASE_LOAD_HOURLY_RAW`].
pub fn base_load_hourly() -> [f64; HOURS_PER_DAY] {
    normalize(&BASE_LOAD_HOURLY_RAW)
}

/// Builds the daily load shape with the requested share of energy in peak hours.
///
/// Peak hours are scaled by `target / base_peak` and the rest by
/// `(1 - target) / (1 - base_peak)`, so the within-group shape is preserved.
/// The target is clamped to `[0.05, 0.95]`.
///
/// # Arguments
///
/// * `target_peak_share` - Desired fraction of daily load in peak hours
///
/// # Returns
///
/// A 24-element distribution.
pub fn hourly_load_shape(target_peak_share: f64) -> [f64; HOURS_PER_DAY] {
    let base = base_load_hourly();
    let base_peak: f64 = (0..HOURS_PER_DAY)
        .filter(|&h| is_peak_hour(h))
        .map(|h| base[h])
        .sum();
    if base_peak <= 0.0 || base_peak >= 1.0 {
        return base;
    }

    let target = if target_peak_share.is_finite() {
        target_peak_share.clamp(0.05, 0.95)
    } else {
        DEFAULT_PEAK_SHARE
    };
    let peak_scale = target / base_peak;
    let off_scale = (1.0 - target) / (1.0 - base_peak);

    let mut scaled = base;
    for (hour, weight) in scaled.iter_mut().enumerate() {
        *weight *= if is_peak_hour(hour) { peak_scale } else { off_scale };
    }
    normalize(&scaled)
}

/// Sanitizes a 24-hour weight row (negatives and non-finite values become 0)
/// and normalizes it.
pub fn sanitized_hourly(row: &[f64; HOURS_PER_DAY]) -> [f64; HOURS_PER_DAY] {
    normalize(&row.map(|v| if v.is_finite() { v.max(0.0) } else { 0.0 }))
}
