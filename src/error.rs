//! Error types shared by the planning engine.

use thiserror::Error;

use crate::config::ConfigError;

/// Failures surfaced by the top-level planning entry points.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid configuration: {}", format_config_errors(.0))]
    InvalidConfig(Vec<ConfigError>),
    #[error("Invalid solar candidate range. Ensure max >= min and step > 0.")]
    EmptyCandidateLattice,
    #[error("no valid scenario among {invalid} evaluated candidates")]
    NoValidScenario { invalid: usize },
    #[error("unable to evaluate the fixed {batteries}-battery path: {source}")]
    ExpansionPath {
        batteries: u32,
        #[source]
        source: Box<PlannerError>,
    },
}

/// Failures while obtaining or checking a climate profile.
///
/// Every variant maps onto a fallback reason; none of them aborts planning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClimateError {
    #[error("ZIP code must be five digits, got \"{0}\"")]
    InvalidZip(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("upstream rate limit reached (HTTP 429)")]
    RateLimited,
    #[error("location lookup failed for ZIP {0}")]
    LocationLookup(String),
    #[error("hourly production data missing or empty")]
    MissingData,
    #[error("could not parse upstream payload: {0}")]
    Parse(String),
    #[error("climate profile rejected: {0}")]
    InvalidProfile(String),
}

fn format_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
