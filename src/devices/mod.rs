//! Household energy devices used by the day simulator.

/// Stationary battery bank model.
pub mod battery;
/// Household consumption model with demand-response overlays.
pub mod load;
/// Solar photovoltaic array with inverter clipping.
pub mod solar;
pub mod types;

// Re-export the main types for convenience
pub use battery::BatteryBank;
pub use load::HomeLoad;
pub use solar::SolarArray;
pub use types::Device;
