//! Daily whole-house-fan venting plan.

use serde::Serialize;

use crate::sim::demand_response::WhfMonth;
use crate::sim::types::HOURS_PER_DAY;

/// Fan and displaced-AC ratings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FanRatings {
    /// Fan electrical draw while venting (W).
    pub fan_watts: f64,
    /// AC draw avoided while venting (W).
    pub displaced_ac_watts: f64,
}

/// Per-hour load changes from night venting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WholeHouseFanPlan {
    pub fan_by_hour_kwh: [f64; HOURS_PER_DAY],
    pub displaced_ac_by_hour_kwh: [f64; HOURS_PER_DAY],
    /// `-max(0, displaced - fan)` per hour; venting never adds load.
    pub net_delta_by_hour_kwh: [f64; HOURS_PER_DAY],
    pub total_fan_kwh: f64,
    pub total_displaced_ac_kwh: f64,
    /// Sum of the positive per-hour savings.
    pub total_net_reduction_kwh: f64,
    /// Hours whose midpoint lies in the venting window.
    pub active_hours: u32,
}

impl WholeHouseFanPlan {
    pub fn empty() -> Self {
        Self {
            fan_by_hour_kwh: [0.0; HOURS_PER_DAY],
            displaced_ac_by_hour_kwh: [0.0; HOURS_PER_DAY],
            net_delta_by_hour_kwh: [0.0; HOURS_PER_DAY],
            total_fan_kwh: 0.0,
            total_displaced_ac_kwh: 0.0,
            total_net_reduction_kwh: 0.0,
            active_hours: 0,
        }
    }

    /// Builds the plan for one day of `schedule`'s month.
    ///
    /// An hour vents when its midpoint (`hh:30`) falls inside the window.
    /// Inactive months and zero success rates produce [`WholeHouseFanPlan::empty`].
    pub fn build(ratings: &FanRatings, schedule: &WhfMonth) -> Self {
        let mut plan = Self::empty();
        if !schedule.active || schedule.success_rate <= 0.0 {
            return plan;
        }

        let success = schedule.success_rate.clamp(0.0, 1.0);
        let fan_kwh = ratings.fan_watts / 1000.0 * success;
        let displaced_kwh = ratings.displaced_ac_watts / 1000.0 * success;
        let net = displaced_kwh - fan_kwh;

        for hour in 0..HOURS_PER_DAY {
            let midpoint = hour as u32 * 60 + 30;
            if !schedule.window.contains(midpoint) {
                continue;
            }
            plan.fan_by_hour_kwh[hour] = fan_kwh;
            plan.displaced_ac_by_hour_kwh[hour] = displaced_kwh;
            plan.net_delta_by_hour_kwh[hour] = -net.max(0.0);
            plan.total_fan_kwh += fan_kwh;
            plan.total_displaced_ac_kwh += displaced_kwh;
            plan.total_net_reduction_kwh += net.max(0.0);
            plan.active_hours += 1;
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::demand_response::MinuteWindow;

    fn ratings() -> FanRatings {
        FanRatings {
            fan_watts: 200.0,
            displaced_ac_watts: 3500.0,
        }
    }

    fn month(active: bool, success_rate: f64, window: MinuteWindow) -> WhfMonth {
        WhfMonth {
            active,
            success_rate,
            window,
        }
    }

    #[test]
    fn venting_hours_follow_midpoints() {
        // 20:30–06:00: midpoints 20:30 .. 05:30 qualify -> hours 20..=23 and 0..=5
        let plan = WholeHouseFanPlan::build(&ratings(), &month(true, 1.0, MinuteWindow::from_clock(20, 30, 6, 0)));
        assert_eq!(plan.active_hours, 10);
        assert!(plan.net_delta_by_hour_kwh[20] < 0.0);
        assert!(plan.net_delta_by_hour_kwh[5] < 0.0);
        assert_eq!(plan.net_delta_by_hour_kwh[19], 0.0);
        assert_eq!(plan.net_delta_by_hour_kwh[6], 0.0);
        assert!((plan.net_delta_by_hour_kwh[0] + 3.3).abs() < 1e-12);
        assert!((plan.total_net_reduction_kwh - 33.0).abs() < 1e-9);
        assert!((plan.total_fan_kwh - 2.0).abs() < 1e-9);
    }

    #[test]
    fn success_rate_scales_energy() {
        let plan = WholeHouseFanPlan::build(&ratings(), &month(true, 0.5, MinuteWindow::from_clock(22, 0, 2, 0)));
        assert_eq!(plan.active_hours, 4);
        assert!((plan.total_displaced_ac_kwh - 7.0).abs() < 1e-9);
        assert!((plan.total_net_reduction_kwh - 6.6).abs() < 1e-9);
    }

    #[test]
    fn inactive_month_is_noop() {
        let w = MinuteWindow::from_clock(20, 30, 6, 0);
        assert_eq!(WholeHouseFanPlan::build(&ratings(), &month(false, 0.9, w)), WholeHouseFanPlan::empty());
        assert_eq!(WholeHouseFanPlan::build(&ratings(), &month(true, 0.0, w)), WholeHouseFanPlan::empty());
    }

    #[test]
    fn fan_larger_than_ac_never_adds_load() {
        let r = FanRatings {
            fan_watts: 800.0,
            displaced_ac_watts: 300.0,
        };
        let plan = WholeHouseFanPlan::build(&r, &month(true, 1.0, MinuteWindow::from_clock(0, 0, 4, 0)));
        assert_eq!(plan.active_hours, 4);
        assert!(plan.net_delta_by_hour_kwh.iter().all(|&d| d == 0.0));
        assert_eq!(plan.total_net_reduction_kwh, 0.0);
        assert!((plan.total_fan_kwh - 3.2).abs() < 1e-12);
    }
}
