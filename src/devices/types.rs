//! Common traits for hourly energy devices.

/// A household device that produces or consumes energy in hourly steps.
///
/// Implementors return the energy they would move in `hour` if unconstrained;
/// the day simulator decides how much of it is actually served or stored.
pub trait Device {
    /// Returns the energy for the given hour of day, in kWh (non-negative).
    ///
    /// # Arguments
    ///
    /// * `hour` - Hour of the representative day (0..24)
    fn energy_kwh(&self, hour: usize) -> f64;
}
