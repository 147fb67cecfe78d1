//! Daily HVAC pre-conditioning plan: move cooling/heating energy out of the peak window.

use serde::Serialize;

use crate::sim::demand_response::HaMonth;
use crate::sim::types::{HOURS_PER_DAY, PEAK_WINDOW_HOURS, Season, peak_hours};

/// Thermal parameters bounding how much HVAC energy can be shifted per day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HvacShiftParams {
    /// Largest summer pre-cool offset (°F).
    pub max_precool_offset_f: f64,
    /// Largest winter pre-heat offset (°F).
    pub max_preheat_offset_f: f64,
    /// Largest setpoint relaxation during peak (°F).
    pub max_peak_relax_offset_f: f64,
    /// HVAC energy per degree-hour of offset (kWh).
    pub sensitivity_kwh_per_deg_hour: f64,
    /// Ceiling on shifted energy per day (kWh).
    pub max_shift_kwh_per_day: f64,
}

impl HvacShiftParams {
    /// Daily shift capacity for a month with `pre_hours` of pre-conditioning.
    ///
    /// Summer uses the pre-cool offset, winter the pre-heat offset, and
    /// shoulder months the mean of both. A peak-relax term over the five
    /// peak hours is added before the daily ceiling applies.
    pub fn daily_capacity_kwh(&self, month: usize, pre_hours: usize) -> f64 {
        let sens = self.sensitivity_kwh_per_deg_hour;
        let summer = self.max_precool_offset_f * sens * pre_hours as f64;
        let winter = self.max_preheat_offset_f * sens * pre_hours as f64;
        let relax = self.max_peak_relax_offset_f * sens * PEAK_WINDOW_HOURS as f64;

        let pre = match Season::for_month(month) {
            Season::Summer => summer,
            Season::Winter => winter,
            Season::Shoulder => 0.5 * summer + 0.5 * winter,
        };
        (pre + relax).min(self.max_shift_kwh_per_day).max(0.0)
    }
}

/// Per-hour HVAC load adjustments for one representative day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HvacShiftPlan {
    /// Energy added in the pre-conditioning hours (kWh, >= 0).
    pub pre_by_hour: [f64; HOURS_PER_DAY],
    /// Energy removed from the peak hours (kWh, <= 0).
    pub post_by_hour: [f64; HOURS_PER_DAY],
    /// Shift the home could achieve at full success.
    pub capacity_kwh: f64,
    /// Shift scheduled for the day.
    pub scheduled_kwh: f64,
    /// Shift expected after applying the success rate.
    pub executed_kwh: f64,
    /// Total added to the pre-window.
    pub shift_to_pre_kwh: f64,
    /// Total removed from the peak window.
    pub shift_to_post_kwh: f64,
}

impl HvacShiftPlan {
    /// A plan that changes nothing.
    pub fn empty() -> Self {
        Self {
            pre_by_hour: [0.0; HOURS_PER_DAY],
            post_by_hour: [0.0; HOURS_PER_DAY],
            capacity_kwh: 0.0,
            scheduled_kwh: 0.0,
            executed_kwh: 0.0,
            shift_to_pre_kwh: 0.0,
            shift_to_post_kwh: 0.0,
        }
    }

    /// Builds the day's plan from the month's schedule and the base load.
    ///
    /// The executed shift is removed from the peak hours in proportion to
    /// their base load, never more than an hour actually holds. Exactly the
    /// removed energy is added to the pre-window hours, again weighted by
    /// base load. Returns [`HvacShiftPlan::empty`] if the month has no
    /// window, no success, or no capacity.
    ///
    /// # Arguments
    ///
    /// * `params` - Thermal shift parameters
    /// * `schedule` - The month's resolved window and success rate
    /// * `month` - Zero-based month index, used for the season
    /// * `base_load_kwh` - Hourly load before any overlay (kWh)
    pub fn build(
        params: &HvacShiftParams,
        schedule: &HaMonth,
        month: usize,
        base_load_kwh: &[f64; HOURS_PER_DAY],
    ) -> Self {
        if schedule.success_rate <= 0.0 {
            return Self::empty();
        }
        let pre_hours: Vec<usize> = schedule
            .window
            .hours()
            .into_iter()
            .take(schedule.max_shift_hours)
            .collect();
        if pre_hours.is_empty() {
            return Self::empty();
        }

        let capacity_kwh = params.daily_capacity_kwh(month, pre_hours.len());
        if capacity_kwh <= 0.0 {
            return Self::empty();
        }
        let executed_kwh = capacity_kwh * schedule.success_rate.clamp(0.0, 1.0);

        let mut post_by_hour = [0.0; HOURS_PER_DAY];
        for (hour, share) in weighted_split(executed_kwh, peak_hours(), base_load_kwh) {
            post_by_hour[hour] = -share.min(base_load_kwh[hour].max(0.0));
        }
        let removed_kwh: f64 = post_by_hour.iter().map(|v| -v).sum();

        let mut pre_by_hour = [0.0; HOURS_PER_DAY];
        for (hour, share) in weighted_split(removed_kwh, pre_hours.iter().copied(), base_load_kwh) {
            pre_by_hour[hour] += share;
        }

        Self {
            shift_to_pre_kwh: pre_by_hour.iter().sum(),
            shift_to_post_kwh: removed_kwh,
            pre_by_hour,
            post_by_hour,
            capacity_kwh,
            scheduled_kwh: capacity_kwh,
            executed_kwh,
        }
    }

    /// Net HVAC adjustment for `hour`.
    pub fn delta_kwh(&self, hour: usize) -> f64 {
        self.pre_by_hour[hour] + self.post_by_hour[hour]
    }

    /// Net adjustment for every hour.
    pub fn deltas(&self) -> [f64; HOURS_PER_DAY] {
        std::array::from_fn(|h| self.delta_kwh(h))
    }

    /// Peak-window energy no longer drawn from the grid.
    pub fn peak_import_avoided_kwh(&self) -> f64 {
        self.shift_to_post_kwh
    }
}

/// Splits `total` across `hours` in proportion to `weights`, never handing
/// out more than `total`. Zero total weight splits evenly.
fn weighted_split(
    total: f64,
    hours: impl Iterator<Item = usize> + Clone,
    weights: &[f64; HOURS_PER_DAY],
) -> Vec<(usize, f64)> {
    let weight_sum: f64 = hours.clone().map(|h| weights[h].max(0.0)).sum();
    let count = hours.clone().count();
    if count == 0 {
        return Vec::new();
    }

    let mut remaining = total;
    let mut out = Vec::new();
    for hour in hours {
        if remaining <= 0.0 {
            break;
        }
        let fraction = if weight_sum > 0.0 {
            weights[hour].max(0.0) / weight_sum
        } else {
            1.0 / count as f64
        };
        let share = (total * fraction).min(remaining);
        out.push((hour, share));
        remaining -= share;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::hourly_load_shape;
    use crate::sim::demand_response::HourWindow;

    fn params() -> HvacShiftParams {
        HvacShiftParams {
            max_precool_offset_f: 3.0,
            max_preheat_offset_f: 2.0,
            max_peak_relax_offset_f: 2.0,
            sensitivity_kwh_per_deg_hour: 0.6,
            max_shift_kwh_per_day: 6.0,
        }
    }

    fn base_load(day_kwh: f64) -> [f64; HOURS_PER_DAY] {
        hourly_load_shape(0.4).map(|share| share * day_kwh)
    }

    fn schedule(success_rate: f64) -> HaMonth {
        HaMonth {
            success_rate,
            window: HourWindow::new(12, 16),
            max_shift_hours: 4,
        }
    }

    #[test]
    fn capacity_blends_by_season() {
        let p = HvacShiftParams {
            max_shift_kwh_per_day: 100.0,
            ..params()
        };
        // relax = 2 * 0.6 * 5 = 6
        assert!((p.daily_capacity_kwh(6, 4) - (3.0 * 0.6 * 4.0 + 6.0)).abs() < 1e-9);
        assert!((p.daily_capacity_kwh(0, 4) - (2.0 * 0.6 * 4.0 + 6.0)).abs() < 1e-9);
        assert!((p.daily_capacity_kwh(3, 4) - (2.5 * 0.6 * 4.0 + 6.0)).abs() < 1e-9);
    }

    #[test]
    fn capacity_respects_daily_ceiling() {
        assert!((params().daily_capacity_kwh(6, 4) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn plan_conserves_energy() {
        let base = base_load(30.0);
        let plan = HvacShiftPlan::build(&params(), &schedule(0.5), 6, &base);

        assert!((plan.capacity_kwh - 6.0).abs() < 1e-12);
        assert!((plan.executed_kwh - 3.0).abs() < 1e-12);
        assert!((plan.shift_to_pre_kwh - 3.0).abs() < 1e-9);
        assert!((plan.shift_to_post_kwh - 3.0).abs() < 1e-9);
        let net: f64 = plan.deltas().iter().sum();
        assert!(net.abs() < 1e-9);
    }

    #[test]
    fn plan_touches_only_window_and_peak() {
        let base = base_load(30.0);
        let plan = HvacShiftPlan::build(&params(), &schedule(0.8), 6, &base);
        for hour in 0..HOURS_PER_DAY {
            let in_pre = (12..16).contains(&hour);
            let in_peak = (16..21).contains(&hour);
            assert_eq!(plan.pre_by_hour[hour] > 0.0, in_pre, "hour {hour}");
            assert_eq!(plan.post_by_hour[hour] < 0.0, in_peak, "hour {hour}");
        }
        // heavier peak hours give up more
        assert!(plan.post_by_hour[19] < plan.post_by_hour[16]);
    }

    #[test]
    fn max_shift_hours_truncates_window() {
        let base = base_load(30.0);
        let sched = HaMonth {
            max_shift_hours: 2,
            ..schedule(1.0)
        };
        let plan = HvacShiftPlan::build(&params(), &sched, 6, &base);
        assert!(plan.pre_by_hour[12] > 0.0 && plan.pre_by_hour[13] > 0.0);
        assert_eq!(plan.pre_by_hour[14], 0.0);
    }

    #[test]
    fn zero_success_or_empty_window_is_noop() {
        let base = base_load(30.0);
        assert_eq!(HvacShiftPlan::build(&params(), &schedule(0.0), 6, &base), HvacShiftPlan::empty());

        let sched = HaMonth {
            window: HourWindow::new(9, 9),
            ..schedule(0.9)
        };
        assert_eq!(HvacShiftPlan::build(&params(), &sched, 6, &base), HvacShiftPlan::empty());
    }

    #[test]
    fn peak_reduction_never_exceeds_base_load() {
        // 0.4 kWh of peak load against a 6 kWh shift
        let base = base_load(1.0);
        let plan = HvacShiftPlan::build(&params(), &schedule(1.0), 6, &base);

        let peak_base: f64 = (16..21).map(|h| base[h]).sum();
        for hour in 0..HOURS_PER_DAY {
            assert!(plan.post_by_hour[hour] >= -base[hour] - 1e-12, "hour {hour}");
            assert!(base[hour] + plan.delta_kwh(hour) >= -1e-12, "hour {hour}");
        }
        assert!((plan.shift_to_post_kwh - peak_base).abs() < 1e-9);
        assert!((plan.shift_to_pre_kwh - plan.shift_to_post_kwh).abs() < 1e-9);
        assert!(plan.deltas().iter().sum::<f64>().abs() < 1e-9);
    }

    #[test]
    fn zero_base_load_shifts_nothing() {
        let plan = HvacShiftPlan::build(&params(), &schedule(1.0), 6, &[0.0; HOURS_PER_DAY]);
        assert_eq!(plan.shift_to_post_kwh, 0.0);
        assert_eq!(plan.shift_to_pre_kwh, 0.0);
        assert!(plan.deltas().iter().all(|d| *d == 0.0));
    }
}
