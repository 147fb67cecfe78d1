use crate::devices::types::Device;
use crate::sim::types::HOURS_PER_DAY;

/// A rooftop solar array producing a fixed daily energy along an hourly shape.
///
/// Output above the inverter's AC ceiling is clipped. The ceiling is
/// `None` when no battery inverter bounds the array.
#[derive(Debug, Clone)]
pub struct SolarArray {
    /// Energy produced over the representative day (kWh).
    pub daily_kwh: f64,
    /// Fraction of `daily_kwh` produced in each hour (sums to 1).
    pub hourly_shape: [f64; HOURS_PER_DAY],
    /// Maximum energy the inverter can pass in one hour (kWh).
    pub ac_ceiling_kwh: Option<f64>,
}

/// Solar output for one hour split into delivered and clipped parts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarHour {
    /// Output before clipping.
    pub raw_kwh: f64,
    /// Output passed by the inverter.
    pub delivered_kwh: f64,
    /// Output discarded above the ceiling.
    pub clipped_kwh: f64,
}

impl SolarArray {
    /// Creates a new solar array.
    ///
    /// # Arguments
    ///
    /// * `daily_kwh` - Daily production in kWh (negative values are treated as 0)
    /// * `hourly_shape` - Hourly production weights, already normalized
    /// * `ac_ceiling_kwh` - Optional hourly inverter ceiling
    pub fn new(
        daily_kwh: f64,
        hourly_shape: [f64; HOURS_PER_DAY],
        ac_ceiling_kwh: Option<f64>,
    ) -> Self {
        Self {
            daily_kwh: daily_kwh.max(0.0),
            hourly_shape,
            ac_ceiling_kwh,
        }
    }

    /// Splits the hour's raw output at the inverter ceiling.
    pub fn hour(&self, hour: usize) -> SolarHour {
        let raw_kwh = self.energy_kwh(hour);
        let delivered_kwh = match self.ac_ceiling_kwh {
            Some(ceiling) => raw_kwh.min(ceiling.max(0.0)),
            None => raw_kwh,
        };
        SolarHour {
            raw_kwh,
            delivered_kwh,
            clipped_kwh: (raw_kwh - delivered_kwh).max(0.0),
        }
    }
}

impl Device for SolarArray {
    fn energy_kwh(&self, hour: usize) -> f64 {
        self.hourly_shape
            .get(hour)
            .map_or(0.0, |share| self.daily_kwh * share)
    }
}
