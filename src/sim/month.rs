//! Scales a representative day to a calendar month and applies the tariff.

use serde::Serialize;

use crate::sim::summary::DaySummary;

/// Tariff in force for one month, already scaled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthRates {
    pub import_off_peak: f64,
    pub import_peak: f64,
    pub export_off_peak: f64,
    pub export_peak: f64,
    /// Non-bypassable charge per imported kWh.
    pub nbc_per_kwh: f64,
    pub fixed_monthly: f64,
}

/// Energy flows and bill components for one month.
///
/// Energies are the day totals multiplied by the days in the month. The
/// minimum reserve floor is carried through unscaled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthResult {
    pub month: usize,
    pub days: u32,
    pub bill_before: f64,
    /// Energy + NBC + fixed - export credit, before annual true-up.
    pub raw_bill_after: f64,
    pub bill_after_energy: f64,
    pub bill_after_nbc: f64,
    pub fixed_charge: f64,
    pub export_credit: f64,
    pub import_peak_kwh: f64,
    pub import_off_peak_kwh: f64,
    pub export_peak_kwh: f64,
    pub export_off_peak_kwh: f64,
    pub before_import_peak_kwh: f64,
    pub before_import_off_peak_kwh: f64,
    pub direct_solar_kwh: f64,
    pub charge_input_kwh: f64,
    pub charge_stored_kwh: f64,
    pub battery_to_load_kwh: f64,
    pub battery_to_load_peak_kwh: f64,
    pub battery_to_load_post_peak_kwh: f64,
    pub reserve_hits: u32,
    pub reserve_floor_kwh: f64,
    pub hvac_capacity_kwh: f64,
    pub hvac_scheduled_kwh: f64,
    pub hvac_executed_kwh: f64,
    pub hvac_shift_to_pre_kwh: f64,
    pub hvac_shift_to_post_kwh: f64,
    pub hvac_peak_import_avoided_kwh: f64,
    pub whf_fan_kwh: f64,
    pub whf_displaced_ac_kwh: f64,
    pub whf_net_reduction_kwh: f64,
    pub whf_active_hours: u32,
    pub clipped_kwh: f64,
    pub solar_generation_kwh: f64,
}

impl MonthResult {
    /// Builds the month from its representative day.
    ///
    /// The "before" bill prices the base load without any system, so it
    /// carries no export credit. `days` below 1 is treated as 1.
    pub fn from_day(month: usize, day: &DaySummary, days: u32, rates: &MonthRates) -> Self {
        let days = days.max(1);
        let n = days as f64;

        let import_peak_kwh = day.import_peak_kwh * n;
        let import_off_peak_kwh = day.import_off_peak_kwh * n;
        let export_peak_kwh = day.export_peak_kwh * n;
        let export_off_peak_kwh = day.export_off_peak_kwh * n;
        let before_import_peak_kwh = day.before_import_peak_kwh * n;
        let before_import_off_peak_kwh = day.before_import_off_peak_kwh * n;

        let export_credit = export_peak_kwh * rates.export_peak + export_off_peak_kwh * rates.export_off_peak;

        let bill_before = before_import_peak_kwh * rates.import_peak
            + before_import_off_peak_kwh * rates.import_off_peak
            + (before_import_peak_kwh + before_import_off_peak_kwh) * rates.nbc_per_kwh
            + rates.fixed_monthly;

        let bill_after_energy = import_peak_kwh * rates.import_peak + import_off_peak_kwh * rates.import_off_peak;
        let bill_after_nbc = (import_peak_kwh + import_off_peak_kwh) * rates.nbc_per_kwh;

        Self {
            month,
            days,
            bill_before,
            raw_bill_after: bill_after_energy + bill_after_nbc + rates.fixed_monthly - export_credit,
            bill_after_energy,
            bill_after_nbc,
            fixed_charge: rates.fixed_monthly,
            export_credit,
            import_peak_kwh,
            import_off_peak_kwh,
            export_peak_kwh,
            export_off_peak_kwh,
            before_import_peak_kwh,
            before_import_off_peak_kwh,
            direct_solar_kwh: day.direct_solar_kwh * n,
            charge_input_kwh: day.charge_input_kwh * n,
            charge_stored_kwh: day.charge_stored_kwh * n,
            battery_to_load_kwh: day.battery_to_load_kwh * n,
            battery_to_load_peak_kwh: day.battery_to_load_peak_kwh * n,
            battery_to_load_post_peak_kwh: day.battery_to_load_post_peak_kwh * n,
            reserve_hits: day.reserve_hits * days,
            reserve_floor_kwh: day.reserve_floor_kwh,
            hvac_capacity_kwh: day.hvac_capacity_kwh * n,
            hvac_scheduled_kwh: day.hvac_scheduled_kwh * n,
            hvac_executed_kwh: day.hvac_executed_kwh * n,
            hvac_shift_to_pre_kwh: day.hvac_shift_to_pre_kwh * n,
            hvac_shift_to_post_kwh: day.hvac_shift_to_post_kwh * n,
            hvac_peak_import_avoided_kwh: day.hvac_peak_import_avoided_kwh * n,
            whf_fan_kwh: day.whf_fan_kwh * n,
            whf_displaced_ac_kwh: day.whf_displaced_ac_kwh * n,
            whf_net_reduction_kwh: day.whf_net_reduction_kwh * n,
            whf_active_hours: day.whf_active_hours * days,
            clipped_kwh: day.clipped_kwh * n,
            solar_generation_kwh: day.solar_generation_kwh * n,
        }
    }

    pub fn import_kwh(&self) -> f64 {
        self.import_peak_kwh + self.import_off_peak_kwh
    }

    pub fn export_kwh(&self) -> f64 {
        self.export_peak_kwh + self.export_off_peak_kwh
    }

    pub fn before_import_kwh(&self) -> f64 {
        self.before_import_peak_kwh + self.before_import_off_peak_kwh
    }
}
