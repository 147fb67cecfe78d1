//! Monthly demand-response schedules for HVAC pre-conditioning and whole-house fan venting.
//!
//! Auto mode derives each month's window and success rate from the hourly
//! temperature profile; manual mode replicates the configured values across
//! all twelve months. A disabled feature yields a zero success rate everywhere.

use std::array;

use serde::{Deserialize, Serialize};

use crate::sim::types::{DAYS_IN_MONTH, HOURS_PER_DAY, MINUTES_PER_DAY, MONTHS_PER_YEAR};

/// Temperature band (°F, inclusive) in which outdoor air can replace AC.
pub const VENTING_MIN_F: f64 = 55.0;
pub const VENTING_MAX_F: f64 = 82.0;

/// Evening-to-morning hours searched for the auto venting window.
const VENTING_CANDIDATE_BAND: [usize; 15] = [18, 19, 20, 21, 22, 23, 0, 1, 2, 3, 4, 5, 6, 7, 8];

/// Monthly eligible venting hours needed before the fan is worth running.
const VENTING_MIN_MONTHLY_HOURS: f64 = 45.0;
/// Mean cooling stress (°F above setpoint) needed before the fan is worth running.
const VENTING_MIN_COOLING_STRESS: f64 = 0.5;

const HA_AUTO_MIN_SUCCESS: f64 = 0.15;
const HA_MAX_SUCCESS: f64 = 0.95;
const WHF_AUTO_MIN_SUCCESS: f64 = 0.1;

/// How a demand-response feature obtains its monthly schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlexMode {
    /// Derived from the climate profile each month.
    #[default]
    Auto,
    /// Taken verbatim from configuration.
    Manual,
}

/// A half-open `[start, end)` range of hours that may wrap past midnight.
///
/// `start == end` is an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourWindow {
    pub start_hour: usize,
    pub end_hour: usize,
}

impl HourWindow {
    /// Creates a window, wrapping both bounds into `0..24`.
    pub fn new(start_hour: usize, end_hour: usize) -> Self {
        Self {
            start_hour: start_hour % HOURS_PER_DAY,
            end_hour: end_hour % HOURS_PER_DAY,
        }
    }

    /// Hours covered by the window, in order starting at `start_hour`.
    pub fn hours(&self) -> Vec<usize> {
        let mut hours = Vec::with_capacity(self.len());
        let mut cursor = self.start_hour;
        while cursor != self.end_hour {
            hours.push(cursor);
            cursor = (cursor + 1) % HOURS_PER_DAY;
        }
        hours
    }

    /// Number of hours in the window.
    pub fn len(&self) -> usize {
        (self.end_hour + HOURS_PER_DAY - self.start_hour) % HOURS_PER_DAY
    }

    pub fn is_empty(&self) -> bool {
        self.start_hour == self.end_hour
    }
}

/// A half-open `[start, end)` range of minutes of day that may wrap past midnight.
///
/// `start == end` covers the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MinuteWindow {
    pub start_minute: u32,
    pub end_minute: u32,
}

impl MinuteWindow {
    pub fn new(start_minute: u32, end_minute: u32) -> Self {
        Self {
            start_minute: start_minute % MINUTES_PER_DAY,
            end_minute: end_minute % MINUTES_PER_DAY,
        }
    }

    /// Builds a window from `HH:MM` components.
    pub fn from_clock(start_hour: u32, start_min: u32, end_hour: u32, end_min: u32) -> Self {
        Self::new(
            start_hour.min(23) * 60 + start_min.min(59),
            end_hour.min(23) * 60 + end_min.min(59),
        )
    }

    /// Whether `minute` (any non-negative value, taken modulo one day) lies in the window.
    pub fn contains(&self, minute: u32) -> bool {
        let minute = minute % MINUTES_PER_DAY;
        let (start, end) = (self.start_minute, self.end_minute);
        if start == end {
            true
        } else if start < end {
            minute >= start && minute < end
        } else {
            minute >= start || minute < end
        }
    }
}

/// HVAC pre-conditioning schedule for one month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HaMonth {
    /// Fraction of scheduled shift that actually happens.
    pub success_rate: f64,
    /// Pre-conditioning window.
    pub window: HourWindow,
    /// Longest pre-window the plan may use.
    pub max_shift_hours: usize,
}

impl HaMonth {
    fn disabled() -> Self {
        Self {
            success_rate: 0.0,
            window: HourWindow::new(12, 16),
            max_shift_hours: 0,
        }
    }
}

/// Whole-house-fan schedule for one month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WhfMonth {
    /// Whether venting runs at all this month.
    pub active: bool,
    /// Fraction of window hours in which venting displaces AC.
    pub success_rate: f64,
    /// Venting window.
    pub window: MinuteWindow,
}

impl WhfMonth {
    fn disabled() -> Self {
        Self {
            active: false,
            success_rate: 0.0,
            window: MinuteWindow::new(0, 0),
        }
    }
}

/// Configured HVAC pre-conditioning behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct HaSettings {
    pub enabled: bool,
    pub mode: FlexMode,
    /// Manual-mode success rate (0..1).
    pub success_rate: f64,
    /// Manual-mode pre-conditioning window.
    pub window: HourWindow,
    /// Manual-mode cap on pre-window hours (1..=12).
    pub max_shift_hours_per_day: usize,
}

/// Configured whole-house-fan behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct WhfSettings {
    pub enabled: bool,
    pub mode: FlexMode,
    /// Manual-mode success rate (0..1).
    pub success_rate: f64,
    /// Manual-mode venting window.
    pub window: MinuteWindow,
    /// Manual-mode active months (0 = January).
    pub active_months: Vec<usize>,
}

/// Resolved monthly schedules for both demand-response features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandResponseSchedule {
    pub ha: [HaMonth; MONTHS_PER_YEAR],
    pub whf: [WhfMonth; MONTHS_PER_YEAR],
}

/// Heat stress for one month's hourly temperatures against the setpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalStress {
    /// Mean of `max(0, temp - summer_setpoint)` over the day.
    pub cooling: f64,
    /// Mean of `max(0, winter_setpoint - temp)` over the day.
    pub heating: f64,
}

impl ThermalStress {
    pub fn from_temps(temps: &[f64; HOURS_PER_DAY], summer_setpoint_f: f64, winter_setpoint_f: f64) -> Self {
        let n = HOURS_PER_DAY as f64;
        Self {
            cooling: temps.iter().map(|t| (t - summer_setpoint_f).max(0.0)).sum::<f64>() / n,
            heating: temps.iter().map(|t| (winter_setpoint_f - t).max(0.0)).sum::<f64>() / n,
        }
    }
}

/// Builds the twelve-month schedule for both features.
///
/// # Arguments
///
/// * `ha` - HVAC pre-conditioning settings
/// * `whf` - Whole-house-fan settings
/// * `summer_setpoint_f` / `winter_setpoint_f` - Thermostat setpoints (°F)
/// * `temps_by_month` - Hourly temperature (°F) for a representative day per month
pub fn plan_demand_response(
    ha: &HaSettings,
    whf: &WhfSettings,
    summer_setpoint_f: f64,
    winter_setpoint_f: f64,
    temps_by_month: &[[f64; HOURS_PER_DAY]; MONTHS_PER_YEAR],
) -> DemandResponseSchedule {
    let ha_months = if !ha.enabled {
        [HaMonth::disabled(); MONTHS_PER_YEAR]
    } else {
        match ha.mode {
            FlexMode::Auto => derive_auto_ha(temps_by_month, summer_setpoint_f, winter_setpoint_f),
            FlexMode::Manual => [HaMonth {
                success_rate: ha.success_rate.clamp(0.0, 1.0),
                window: ha.window,
                max_shift_hours: ha.max_shift_hours_per_day.clamp(1, 12),
            }; MONTHS_PER_YEAR],
        }
    };

    let whf_months = if !whf.enabled {
        [WhfMonth::disabled(); MONTHS_PER_YEAR]
    } else {
        match whf.mode {
            FlexMode::Auto => derive_auto_whf(temps_by_month, summer_setpoint_f),
            FlexMode::Manual => array::from_fn(|month| WhfMonth {
                active: whf.active_months.contains(&month),
                success_rate: whf.success_rate.clamp(0.0, 1.0),
                window: whf.window,
            }),
        }
    };

    DemandResponseSchedule {
        ha: ha_months,
        whf: whf_months,
    }
}

/// Derives HVAC pre-conditioning windows and success rates from temperature.
///
/// The combined stress index `(cooling + heating) / 8` maps linearly onto a
/// success rate in `[0.15, 0.95]`. Cooling-dominated months pre-cool over
/// `[12, 16)`, heating-dominated months pre-heat over `[11, 15)`, and
/// balanced months use `[13, 16)`.
pub fn derive_auto_ha(
    temps_by_month: &[[f64; HOURS_PER_DAY]; MONTHS_PER_YEAR],
    summer_setpoint_f: f64,
    winter_setpoint_f: f64,
) -> [HaMonth; MONTHS_PER_YEAR] {
    array::from_fn(|month| {
        let stress = ThermalStress::from_temps(&temps_by_month[month], summer_setpoint_f, winter_setpoint_f);
        let index = ((stress.cooling + stress.heating) / 8.0).clamp(0.0, 1.0);
        let success_rate = (HA_AUTO_MIN_SUCCESS + index * 0.8).clamp(HA_AUTO_MIN_SUCCESS, HA_MAX_SUCCESS);

        let window = if stress.cooling > stress.heating * 1.1 {
            HourWindow::new(12, 16)
        } else if stress.heating > stress.cooling * 1.1 {
            HourWindow::new(11, 15)
        } else {
            HourWindow::new(13, 16)
        };

        HaMonth {
            success_rate,
            window,
            max_shift_hours: window.len().max(1),
        }
    })
}

#[derive(Debug, Clone, Copy)]
struct VentingCandidate {
    score: f64,
    eligible_hours: usize,
    window_hours: usize,
    start_hour: usize,
    end_hour: usize,
}

fn is_venting_eligible(temp_f: f64) -> bool {
    (VENTING_MIN_F..=VENTING_MAX_F).contains(&temp_f)
}

/// Picks the best contiguous venting window (at least two hours) from the
/// evening-to-morning band.
///
/// Score is `eligible_hours * 1.5 + mean_cooling_stress * 0.35`; a tie within
/// 1e-9 goes to the window with more eligible hours, then to the earlier one.
fn best_venting_window(temps: &[f64; HOURS_PER_DAY], summer_setpoint_f: f64) -> VentingCandidate {
    let band = &VENTING_CANDIDATE_BAND;
    let mut best = VentingCandidate {
        score: f64::NEG_INFINITY,
        eligible_hours: 0,
        window_hours: 1,
        start_hour: 20,
        end_hour: 6,
    };

    for start in 0..band.len() - 1 {
        for end in start + 2..=band.len() {
            let hours = &band[start..end];
            let eligible_hours = hours.iter().filter(|&&h| is_venting_eligible(temps[h])).count();
            let stress: f64 = hours.iter().map(|&h| (temps[h] - summer_setpoint_f).max(0.0)).sum();
            let avg_stress = stress / hours.len() as f64;
            let score = eligible_hours as f64 * 1.5 + avg_stress * 0.35;

            let better = score > best.score + 1e-9
                || ((score - best.score).abs() <= 1e-9 && eligible_hours > best.eligible_hours);
            if better {
                best = VentingCandidate {
                    score,
                    eligible_hours,
                    window_hours: hours.len(),
                    start_hour: hours[0],
                    end_hour: (hours[hours.len() - 1] + 1) % HOURS_PER_DAY,
                };
            }
        }
    }

    best
}

/// Derives whole-house-fan windows, success rates, and active months from temperature.
///
/// A month is active when it offers at least 45 eligible venting hours and a
/// mean cooling stress of at least 0.5 °F.
pub fn derive_auto_whf(
    temps_by_month: &[[f64; HOURS_PER_DAY]; MONTHS_PER_YEAR],
    summer_setpoint_f: f64,
) -> [WhfMonth; MONTHS_PER_YEAR] {
    array::from_fn(|month| {
        let temps = &temps_by_month[month];
        let eligible_per_day = temps.iter().filter(|&&t| is_venting_eligible(t)).count();
        let cooling_stress =
            temps.iter().map(|t| (t - summer_setpoint_f).max(0.0)).sum::<f64>() / HOURS_PER_DAY as f64;
        let monthly_eligible = eligible_per_day as f64 * f64::from(DAYS_IN_MONTH[month]);

        let best = best_venting_window(temps, summer_setpoint_f);
        let success_rate = (best.eligible_hours as f64 / best.window_hours.max(1) as f64)
            .clamp(WHF_AUTO_MIN_SUCCESS, HA_MAX_SUCCESS);

        WhfMonth {
            active: monthly_eligible >= VENTING_MIN_MONTHLY_HOURS
                && cooling_stress >= VENTING_MIN_COOLING_STRESS,
            success_rate,
            window: MinuteWindow::new(best.start_hour as u32 * 60, best.end_hour as u32 * 60),
        }
    })
}
