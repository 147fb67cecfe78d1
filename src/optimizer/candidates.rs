//! Solar and battery candidate generation.

/// Upper bound on the number of solar sizes searched.
pub const MAX_SOLAR_CANDIDATES: usize = 50_000;
/// Largest battery count offered.
pub const MAX_BATTERIES: u32 = 2;

const MIN_PRECISION: usize = 3;
const MAX_PRECISION: usize = 6;

/// Digits after the decimal point in the shortest text form of `value`.
fn decimal_places(value: f64) -> usize {
    value
        .to_string()
        .split_once('.')
        .map(|(_, frac)| frac.len())
        .unwrap_or(0)
}

/// Solar sizes from `min_kw` to `max_kw` in steps of `step_kw`.
///
/// Values are generated on an integer grid scaled by `10^precision` so
/// repeated steps do not drift. The exact maximum is always included, the
/// result is sorted ascending without duplicates, and it is empty when
/// `step_kw <= 0`, `max_kw < min_kw`, or any input is not finite.
///
/// # Examples
///
/// ```
/// use solar_upgrade_planner::optimizer::build_solar_candidates;
///
/// assert_eq!(build_solar_candidates(4.0, 4.5, 0.25), vec![4.0, 4.25, 4.5]);
/// assert!(build_solar_candidates(5.0, 4.0, 0.1).is_empty());
/// ```
pub fn build_solar_candidates(min_kw: f64, max_kw: f64, step_kw: f64) -> Vec<f64> {
    if !(min_kw.is_finite() && max_kw.is_finite() && step_kw.is_finite()) {
        return Vec::new();
    }
    let precision = [decimal_places(min_kw), decimal_places(max_kw), decimal_places(step_kw)]
        .into_iter()
        .fold(MIN_PRECISION, usize::max)
        .min(MAX_PRECISION);
    let factor = 10_f64.powi(precision as i32);

    let start = (min_kw * factor).round() as i64;
    let end = (max_kw * factor).round() as i64;
    let inc = (step_kw * factor).round() as i64;
    if inc <= 0 || end < start {
        return Vec::new();
    }

    let mut grid: Vec<i64> = (0..)
        .map(|i: i64| start + i * inc)
        .take_while(|&v| v <= end)
        .take(MAX_SOLAR_CANDIDATES)
        .collect();
    if grid.last() != Some(&end) {
        grid.truncate(MAX_SOLAR_CANDIDATES - 1);
        grid.push(end);
    }
    grid.sort_unstable();
    grid.dedup();
    grid.into_iter().map(|v| v as f64 / factor).collect()
}

/// Battery counts to evaluate, from `base` up to [`MAX_BATTERIES`].
///
/// A pinned count is clamped into that range and evaluated alone.
pub fn battery_candidates(base: u32, pinned: Option<u32>) -> Vec<u32> {
    let base = base.min(MAX_BATTERIES);
    match pinned {
        Some(count) => vec![count.clamp(base, MAX_BATTERIES)],
        None => (base..=MAX_BATTERIES).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_has_182_points() {
        let c = build_solar_candidates(3.95, 22.0, 0.1);
        assert_eq!(c.len(), 182);
        assert_eq!(c[0], 3.95);
        assert_eq!(c[1], 4.05);
        assert_eq!(*c.last().unwrap(), 22.0);
        assert!(c.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn single_point_when_min_equals_max() {
        assert_eq!(build_solar_candidates(5.53, 5.53, 0.1), vec![5.53]);
    }

    #[test]
    fn degenerate_ranges_are_empty() {
        assert!(build_solar_candidates(4.0, 10.0, 0.0).is_empty());
        assert!(build_solar_candidates(4.0, 10.0, -0.1).is_empty());
        assert!(build_solar_candidates(10.0, 4.0, 0.1).is_empty());
        assert!(build_solar_candidates(f64::NAN, 4.0, 0.1).is_empty());
    }

    #[test]
    fn lattice_is_capped() {
        let c = build_solar_candidates(0.0, 1_000.0, 0.001);
        assert_eq!(c.len(), MAX_SOLAR_CANDIDATES);
        assert_eq!(*c.last().unwrap(), 1_000.0);
        assert!(c.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn precision_follows_inputs() {
        assert_eq!(decimal_places(0.1), 1);
        assert_eq!(decimal_places(22.0), 0);
        assert_eq!(decimal_places(3.125), 3);
        let c = build_solar_candidates(1.0, 1.0002, 0.0001);
        assert_eq!(c, vec![1.0, 1.0001, 1.0002]);
    }

    #[test]
    fn battery_candidates_respect_pin() {
        assert_eq!(battery_candidates(0, None), vec![0, 1, 2]);
        assert_eq!(battery_candidates(0, Some(1)), vec![1]);
        assert_eq!(battery_candidates(0, Some(7)), vec![2]);
        assert_eq!(battery_candidates(1, Some(0)), vec![1]);
    }
}
