//! Calendar constants, tariff windows, and per-hour/per-day records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hourly steps in one representative day.
pub const HOURS_PER_DAY: usize = 24;
/// Calendar months simulated per year.
pub const MONTHS_PER_YEAR: usize = 12;
/// Minutes in one day, used for venting windows.
pub const MINUTES_PER_DAY: u32 = 1440;

/// Days per calendar month (non-leap year).
pub const DAYS_IN_MONTH: [u32; MONTHS_PER_YEAR] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// First hour of the peak tariff window (16:00).
pub const PEAK_START_HOUR: usize = 16;
/// Number of hours in the peak tariff window (16:00–20:59).
pub const PEAK_WINDOW_HOURS: usize = 5;
/// Hours following the peak window that still allow discharge (21:00–23:59).
pub const POST_PEAK_HOURS: [usize; 3] = [21, 22, 23];

/// Usable energy of one battery unit (13.5 kWh nameplate at 90% usable).
pub const BATTERY_USABLE_KWH: f64 = 13.5 * 0.9;
/// Continuous AC output of one battery/inverter unit, in kW.
pub const BATTERY_UNIT_AC_KW: f64 = 11.5;
/// Annual grid-services credit per kW of battery AC capacity.
pub const VPP_CREDIT_PER_KW_YEAR: f64 = 35.0;

/// Thermostat setpoints against which seasonal load multipliers are measured.
pub const BASE_SUMMER_SETPOINT_F: f64 = 74.0;
pub const BASE_WINTER_SETPOINT_F: f64 = 68.0;

/// Returns `true` for hours inside the peak tariff window.
pub fn is_peak_hour(hour: usize) -> bool {
    (PEAK_START_HOUR..PEAK_START_HOUR + PEAK_WINDOW_HOURS).contains(&hour)
}

/// Returns `true` for the three hours directly after the peak window.
pub fn is_post_peak_hour(hour: usize) -> bool {
    POST_PEAK_HOURS.contains(&hour)
}

/// The peak-window hours in order.
pub fn peak_hours() -> std::ops::Range<usize> {
    PEAK_START_HOUR..PEAK_START_HOUR + PEAK_WINDOW_HOURS
}

/// Thermal season of a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// May through September.
    Summer,
    /// November through February.
    Winter,
    /// March, April, and October.
    Shoulder,
}

impl Season {
    /// Season of a zero-based month index (0 = January).
    pub fn for_month(month: usize) -> Self {
        match month {
            4..=8 => Season::Summer,
            0 | 1 | 10 | 11 => Season::Winter,
            _ => Season::Shoulder,
        }
    }
}

/// Hours in which the battery may discharge to serve household load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Discharge in any hour.
    SelfConsumptionAlways,
    /// Discharge during peak and post-peak hours.
    #[default]
    SelfConsumptionPeakThenPostpeak,
    /// Discharge during peak hours only.
    SelfConsumptionPeakOnly,
}

impl DispatchMode {
    /// Whether discharge to load is permitted in `hour`.
    pub fn allows_discharge(self, hour: usize) -> bool {
        match self {
            DispatchMode::SelfConsumptionAlways => true,
            DispatchMode::SelfConsumptionPeakThenPostpeak => {
                is_peak_hour(hour) || is_post_peak_hour(hour)
            }
            DispatchMode::SelfConsumptionPeakOnly => is_peak_hour(hour),
        }
    }
}

/// Energy flows for one simulated hour, all in kWh.
///
/// Balances hold per record:
/// `load = direct_solar + battery_to_load + import` and
/// `solar_raw = direct_solar_dc + charge_input + export + clipped`.
#[derive(Debug, Clone, Serialize)]
pub struct HourRecord {
    /// Hour of day (0..24).
    pub hour: usize,
    /// Whether the hour is billed at peak rates.
    pub is_peak: bool,
    /// Load from the hourly shape before demand-response overlays.
    pub base_load_kwh: f64,
    /// HVAC pre-conditioning delta (positive pre-window, negative peak).
    pub hvac_delta_kwh: f64,
    /// Whole-house-fan delta (non-positive).
    pub whf_delta_kwh: f64,
    /// Adjusted load actually served this hour.
    pub load_kwh: f64,
    /// DC-side solar before inverter clipping.
    pub solar_raw_kwh: f64,
    /// Solar lost to the inverter ceiling.
    pub clipped_kwh: f64,
    /// Solar delivered to the home (AC side).
    pub direct_solar_kwh: f64,
    /// Solar consumed to deliver `direct_solar_kwh`.
    pub direct_solar_dc_kwh: f64,
    /// Solar drawn into the battery.
    pub charge_input_kwh: f64,
    /// Energy added to the battery after round-trip losses.
    pub charge_stored_kwh: f64,
    /// Battery energy delivered to the home.
    pub battery_to_load_kwh: f64,
    /// Surplus solar sent to the grid.
    pub export_kwh: f64,
    /// Grid energy imported to cover the remaining load.
    pub import_kwh: f64,
    /// Battery state of charge at the end of the hour.
    pub soc_kwh: f64,
    /// Whether the battery sat at its reserve floor with load still unmet.
    pub reserve_hit: bool,
}

impl HourRecord {
    /// Solar delivered after clipping.
    pub fn solar_kwh(&self) -> f64 {
        self.solar_raw_kwh - self.clipped_kwh
    }
}

impl fmt::Display for HourRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "h={:02} {} load={:.3} solar={:.3} direct={:.3} chg={:.3} dis={:.3} exp={:.3} imp={:.3} soc={:.3}",
            self.hour,
            if self.is_peak { "peak" } else { "off " },
            self.load_kwh,
            self.solar_raw_kwh,
            self.direct_solar_kwh,
            self.charge_input_kwh,
            self.battery_to_load_kwh,
            self.export_kwh,
            self.import_kwh,
            self.soc_kwh,
        )
    }
}
