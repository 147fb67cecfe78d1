use crate::devices::types::Device;
use crate::sim::types::HOURS_PER_DAY;

/// Household consumption for a representative day.
///
/// The base profile comes from the daily load and hourly shape; demand
/// response overlays add per-hour deltas on top. Served load is floored at 0.
#[derive(Debug, Clone)]
pub struct HomeLoad {
    /// Daily household consumption before overlays (kWh).
    pub daily_kwh: f64,
    /// Fraction of `daily_kwh` consumed in each hour (sums to 1).
    pub hourly_shape: [f64; HOURS_PER_DAY],
    /// Per-hour adjustments from demand response (kWh, signed).
    pub deltas_kwh: [f64; HOURS_PER_DAY],
}

impl HomeLoad {
    /// Creates a load with no overlay.
    pub fn new(daily_kwh: f64, hourly_shape: [f64; HOURS_PER_DAY]) -> Self {
        Self {
            daily_kwh: daily_kwh.max(0.0),
            hourly_shape,
            deltas_kwh: [0.0; HOURS_PER_DAY],
        }
    }

    /// Adds a per-hour overlay to the existing deltas.
    pub fn with_overlay(mut self, overlay: &[f64; HOURS_PER_DAY]) -> Self {
        for (delta, extra) in self.deltas_kwh.iter_mut().zip(overlay) {
            *delta += extra;
        }
        self
    }

    /// Load from the hourly shape alone.
    pub fn base_kwh(&self, hour: usize) -> f64 {
        self.hourly_shape
            .get(hour)
            .map_or(0.0, |share| self.daily_kwh * share)
    }
}

impl Device for HomeLoad {
    fn energy_kwh(&self, hour: usize) -> f64 {
        let delta = self.deltas_kwh.get(hour).copied().unwrap_or(0.0);
        (self.base_kwh(hour) + delta).max(0.0)
    }
}
