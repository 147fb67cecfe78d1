//! Solar and battery upgrade planner.
//!
//! Simulates a representative day per month for a candidate system, rolls
//! the days up into monthly and annual bills, projects multi-year returns,
//! and ranks every candidate upgrade over a builder's baseline system.

pub mod cli;
pub mod climate;
pub mod config;
pub mod devices;
pub mod error;
pub mod finance;
pub mod inputs;
pub mod io;
/// Search, ranking, and marginal expansion over upgrade candidates.
pub mod optimizer;
pub mod profile;
pub mod reporting;
/// Day dispatch, demand-response overlays, and monthly/annual aggregation.
pub mod sim;
pub mod telemetry;
