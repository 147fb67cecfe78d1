//! Post-hoc day totals computed from hourly records.

use std::fmt;

use serde::Serialize;

use crate::sim::hvac_shift::HvacShiftPlan;
use crate::sim::types::{HourRecord, is_post_peak_hour};
use crate::sim::whole_house_fan::WholeHouseFanPlan;

/// Totals for one representative day, all energies in kWh.
///
/// Computed from `&[HourRecord]` so reported totals always agree with the
/// hourly data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub import_peak_kwh: f64,
    pub import_off_peak_kwh: f64,
    pub export_peak_kwh: f64,
    pub export_off_peak_kwh: f64,
    /// Peak import had no system been installed (base load, no overlays).
    pub before_import_peak_kwh: f64,
    /// Off-peak import had no system been installed.
    pub before_import_off_peak_kwh: f64,
    pub direct_solar_kwh: f64,
    pub charge_input_kwh: f64,
    pub charge_stored_kwh: f64,
    pub battery_to_load_kwh: f64,
    pub battery_to_load_peak_kwh: f64,
    pub battery_to_load_post_peak_kwh: f64,
    /// Hours the battery sat at its reserve floor with load unmet.
    pub reserve_hits: u32,
    /// Reserve floor of the day's battery (kWh).
    pub reserve_floor_kwh: f64,
    /// Solar delivered after clipping.
    pub solar_generation_kwh: f64,
    pub clipped_kwh: f64,
    /// Load served after demand-response overlays.
    pub load_kwh: f64,
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
}

impl DaySummary {
    /// Folds hourly records and the day's overlay plans into totals.
    ///
    /// # Arguments
    ///
    /// * `hours` - Hourly records of the simulated day
    /// * `hvac` - The day's HVAC shift plan
    /// * `whf` - The day's whole-house-fan plan
    /// * `reserve_floor_kwh` - Battery reserve floor in force for the day
    pub fn from_hours(
        hours: &[HourRecord],
        hvac: &HvacShiftPlan,
        whf: &WholeHouseFanPlan,
        reserve_floor_kwh: f64,
    ) -> Self {
        let mut s = Self {
            import_peak_kwh: 0.0,
            import_off_peak_kwh: 0.0,
            export_peak_kwh: 0.0,
            export_off_peak_kwh: 0.0,
            before_import_peak_kwh: 0.0,
            before_import_off_peak_kwh: 0.0,
            direct_solar_kwh: 0.0,
            charge_input_kwh: 0.0,
            charge_stored_kwh: 0.0,
            battery_to_load_kwh: 0.0,
            battery_to_load_peak_kwh: 0.0,
            battery_to_load_post_peak_kwh: 0.0,
            reserve_hits: 0,
            reserve_floor_kwh,
            solar_generation_kwh: 0.0,
            clipped_kwh: 0.0,
            load_kwh: 0.0,
            hvac_capacity_kwh: hvac.capacity_kwh,
            hvac_scheduled_kwh: hvac.scheduled_kwh,
            hvac_executed_kwh: hvac.executed_kwh,
            hvac_shift_to_pre_kwh: hvac.shift_to_pre_kwh,
            hvac_shift_to_post_kwh: hvac.shift_to_post_kwh,
            hvac_peak_import_avoided_kwh: hvac.peak_import_avoided_kwh(),
            whf_fan_kwh: whf.total_fan_kwh,
            whf_displaced_ac_kwh: whf.total_displaced_ac_kwh,
            whf_net_reduction_kwh: whf.total_net_reduction_kwh,
            whf_active_hours: whf.active_hours,
        };

        for r in hours {
            if r.is_peak {
                s.import_peak_kwh += r.import_kwh;
                s.export_peak_kwh += r.export_kwh;
                s.before_import_peak_kwh += r.base_load_kwh;
                s.battery_to_load_peak_kwh += r.battery_to_load_kwh;
            } else {
                s.import_off_peak_kwh += r.import_kwh;
                s.export_off_peak_kwh += r.export_kwh;
                s.before_import_off_peak_kwh += r.base_load_kwh;
            }
            if is_post_peak_hour(r.hour) {
                s.battery_to_load_post_peak_kwh += r.battery_to_load_kwh;
            }
            s.direct_solar_kwh += r.direct_solar_kwh;
            s.charge_input_kwh += r.charge_input_kwh;
            s.charge_stored_kwh += r.charge_stored_kwh;
            s.battery_to_load_kwh += r.battery_to_load_kwh;
            s.solar_generation_kwh += r.solar_kwh();
            s.clipped_kwh += r.clipped_kwh;
            s.load_kwh += r.load_kwh;
            if r.reserve_hit {
                s.reserve_hits += 1;
            }
        }

        s
    }

    pub fn import_kwh(&self) -> f64 {
        self.import_peak_kwh + self.import_off_peak_kwh
    }

    pub fn export_kwh(&self) -> f64 {
        self.export_peak_kwh + self.export_off_peak_kwh
    }
}

impl fmt::Display for DaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Day Summary ---")?;
        writeln!(
            f,
            "Import:        {:.2} kWh ({:.2} peak)",
            self.import_kwh(),
            self.import_peak_kwh
        )?;
        writeln!(
            f,
            "Export:        {:.2} kWh ({:.2} peak)",
            self.export_kwh(),
            self.export_peak_kwh
        )?;
        writeln!(f, "Direct solar:  {:.2} kWh", self.direct_solar_kwh)?;
        writeln!(
            f,
            "Battery:       {:.2} kWh in, {:.2} kWh out",
            self.charge_input_kwh, self.battery_to_load_kwh
        )?;
        write!(f, "Clipped solar: {:.2} kWh", self.clipped_kwh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hour: usize, import_kwh: f64, export_kwh: f64, battery_to_load_kwh: f64) -> HourRecord {
        HourRecord {
            hour,
            is_peak: (16..21).contains(&hour),
            base_load_kwh: 1.0,
            hvac_delta_kwh: 0.0,
            whf_delta_kwh: 0.0,
            load_kwh: 1.0,
            solar_raw_kwh: export_kwh + 0.5,
            clipped_kwh: 0.5,
            direct_solar_kwh: 0.0,
            direct_solar_dc_kwh: 0.0,
            charge_input_kwh: 0.0,
            charge_stored_kwh: 0.0,
            battery_to_load_kwh,
            export_kwh,
            import_kwh,
            soc_kwh: 0.0,
            reserve_hit: hour == 23,
        }
    }

    #[test]
    fn splits_by_tariff_window() {
        let hours = vec![
            record(10, 0.0, 2.0, 0.0),
            record(17, 0.4, 0.0, 0.6),
            record(22, 0.2, 0.0, 0.8),
            record(23, 1.0, 0.0, 0.0),
        ];
        let s = DaySummary::from_hours(&hours, &HvacShiftPlan::empty(), &WholeHouseFanPlan::empty(), 1.5);
        assert!((s.import_peak_kwh - 0.4).abs() < 1e-12);
        assert!((s.import_off_peak_kwh - 1.2).abs() < 1e-12);
        assert!((s.export_off_peak_kwh - 2.0).abs() < 1e-12);
        assert_eq!(s.export_peak_kwh, 0.0);
        assert!((s.battery_to_load_peak_kwh - 0.6).abs() < 1e-12);
        assert!((s.battery_to_load_post_peak_kwh - 0.8).abs() < 1e-12);
        assert!((s.before_import_peak_kwh - 1.0).abs() < 1e-12);
        assert!((s.before_import_off_peak_kwh - 3.0).abs() < 1e-12);
        assert!((s.clipped_kwh - 2.0).abs() < 1e-12);
        assert!((s.solar_generation_kwh - 2.0).abs() < 1e-12);
        assert_eq!(s.reserve_hits, 1);
        assert_eq!(s.reserve_floor_kwh, 1.5);
    }

    #[test]
    fn empty_day_is_all_zero() {
        let s = DaySummary::from_hours(&[], &HvacShiftPlan::empty(), &WholeHouseFanPlan::empty(), 0.0);
        assert_eq!(s.import_kwh(), 0.0);
        assert_eq!(s.export_kwh(), 0.0);
        assert_eq!(s.reserve_hits, 0);
    }

    #[test]
    fn display_mentions_import() {
        let s = DaySummary::from_hours(
            &[record(17, 2.0, 0.0, 0.0)],
            &HvacShiftPlan::empty(),
            &WholeHouseFanPlan::empty(),
            0.0,
        );
        let text = s.to_string();
        assert!(text.contains("Import:"));
        assert!(text.contains("2.00"));
    }
}
