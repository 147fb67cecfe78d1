/// Annual aggregation across the twelve representative months.
pub mod annual;
/// Monthly HVAC and whole-house-fan schedules.
pub mod demand_response;
pub mod dispatch;
pub mod hvac_shift;
pub mod month;
pub mod summary;
pub mod types;
pub mod whole_house_fan;

pub use annual::{AnnualResult, ScaleOptions, calculate_annual_energy_and_bills};
pub use dispatch::{DayInput, DayResult, simulate_day};
pub use month::{MonthRates, MonthResult};
pub use summary::DaySummary;
