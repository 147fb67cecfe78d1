//! Climate resolution: cache, then live lookup, then synthetic fallback.
//!
//! The planner never fails for lack of climate data. Every failure path
//! degrades to [`synthetic_profile`] and records why in the snapshot.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::climate::cache::{
    CLIMATE_CACHE_TTL_SECS, Cache, ClimateCacheEntry, ClimateContext, CoordinateCacheEntry, Coordinates, KeyMode,
    MemoryCache, ZIP_COORD_CACHE_TTL_SECS,
};
use crate::climate::profile::{ClimateProfile, derive_climate_profile};
use crate::climate::synthetic::synthetic_profile;
use crate::error::ClimateError;

/// Provenance of the profile in a [`ClimateSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimateStatus {
    VerifiedLive,
    VerifiedCache,
    FallbackSynthetic,
}

/// Why a synthetic profile was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    InvalidZip,
    NetworkError,
    #[serde(rename = "rate_limit_429")]
    RateLimit429,
    LocationLookupFailed,
    MissingData,
    ParseError,
    InvalidProfile,
}

impl From<&ClimateError> for FallbackReason {
    fn from(err: &ClimateError) -> Self {
        match err {
            ClimateError::InvalidZip(_) => FallbackReason::InvalidZip,
            ClimateError::Network(_) => FallbackReason::NetworkError,
            ClimateError::RateLimited => FallbackReason::RateLimit429,
            ClimateError::LocationLookup(_) => FallbackReason::LocationLookupFailed,
            ClimateError::MissingData => FallbackReason::MissingData,
            ClimateError::Parse(_) => FallbackReason::ParseError,
            ClimateError::InvalidProfile(_) => FallbackReason::InvalidProfile,
        }
    }
}

/// A resolved climate profile with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateSnapshot {
    pub status: ClimateStatus,
    pub fallback_reason: Option<FallbackReason>,
    pub location_label: String,
    pub key_mode: KeyMode,
    /// Unix time of the last successful live lookup.
    pub last_verified_at: Option<u64>,
    pub profile: ClimateProfile,
}

impl ClimateSnapshot {
    /// A synthetic snapshot tagged with `reason`.
    pub fn synthetic(zip: &str, reason: FallbackReason, key_mode: KeyMode) -> Self {
        Self {
            status: ClimateStatus::FallbackSynthetic,
            fallback_reason: Some(reason),
            location_label: zip.to_string(),
            key_mode,
            last_verified_at: None,
            profile: synthetic_profile(Some(zip)),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.status != ClimateStatus::FallbackSynthetic
    }
}

/// Hourly production returned by a live source.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyProduction {
    /// AC output per hour for 1 kW installed (W), 8760 values.
    pub ac_w: Vec<f64>,
    /// Ambient temperature per hour (°C).
    pub tamb_c: Option<Vec<f64>>,
    /// Station label (e.g. `"Los Angeles, CA"`).
    pub location_label: Option<String>,
}

/// Boundary to the network services providing live data.
pub trait ClimateSource {
    /// Resolves a ZIP code to coordinates.
    ///
    /// # Errors
    ///
    /// Any [`ClimateError`]; the resolver reports it as a location lookup failure.
    fn lookup_coordinates(&mut self, zip: &str) -> Result<Coordinates, ClimateError>;

    /// Fetches a year of hourly production at `coordinates`.
    ///
    /// # Errors
    ///
    /// Network, rate-limit, parse, or missing-data failures.
    fn fetch_hourly(&mut self, context: &ClimateContext, coordinates: &Coordinates)
    -> Result<HourlyProduction, ClimateError>;
}

/// Climate and ZIP-coordinate caches.
pub struct ClimateCaches {
    pub climate: Box<dyn Cache<ClimateCacheEntry>>,
    pub coordinates: Box<dyn Cache<CoordinateCacheEntry>>,
}

impl ClimateCaches {
    pub fn in_memory() -> Self {
        Self {
            climate: Box::new(MemoryCache::<ClimateCacheEntry>::new(CLIMATE_CACHE_TTL_SECS)),
            coordinates: Box::new(MemoryCache::<CoordinateCacheEntry>::new(ZIP_COORD_CACHE_TTL_SECS)),
        }
    }
}

/// Resolves the climate for a ZIP code.
///
/// # Arguments
///
/// * `zip` / `api_key` - Raw user input
/// * `caches` - Climate and coordinate caches
/// * `source` - Live data source; `None` when no network is available
/// * `now` - Current Unix time (seconds)
/// * `force_refresh` - Skip the climate cache
pub fn resolve_climate(
    zip: &str,
    api_key: &str,
    caches: &mut ClimateCaches,
    source: Option<&mut dyn ClimateSource>,
    now: u64,
    force_refresh: bool,
) -> ClimateSnapshot {
    let context = match ClimateContext::new(zip, api_key) {
        Ok(c) => c,
        Err(err) => {
            warn!(%err, "climate fallback");
            let label = if zip.trim().is_empty() { "ZIP invalid" } else { zip.trim() };
            let mut snapshot = ClimateSnapshot::synthetic(zip.trim(), FallbackReason::InvalidZip, KeyMode::DemoKey);
            snapshot.location_label = label.to_string();
            return snapshot;
        }
    };

    let cached = if force_refresh {
        None
    } else {
        caches.climate.get(&context.cache_key, now)
    };
    if let Some(entry) = cached {
        info!(zip = %context.zip, "climate from cache");
        return ClimateSnapshot {
            status: ClimateStatus::VerifiedCache,
            fallback_reason: None,
            location_label: if entry.location_label.is_empty() {
                context.zip.clone()
            } else {
                entry.location_label
            },
            key_mode: entry.key_mode,
            last_verified_at: entry.last_verified_at,
            profile: entry.profile,
        };
    }

    let Some(source) = source else {
        warn!(zip = %context.zip, "no live climate source, using synthetic profile");
        return ClimateSnapshot::synthetic(&context.zip, FallbackReason::NetworkError, context.key_mode);
    };

    match fetch_live(&context, caches, source, now) {
        Ok((profile, location_label)) => {
            caches.climate.put(
                &context.cache_key,
                ClimateCacheEntry {
                    profile: profile.clone(),
                    location_label: location_label.clone(),
                    cached_at: now,
                    last_verified_at: Some(now),
                    key_mode: context.key_mode,
                },
            );
            info!(zip = %context.zip, location = %location_label, "climate verified live");
            ClimateSnapshot {
                status: ClimateStatus::VerifiedLive,
                fallback_reason: None,
                location_label,
                key_mode: context.key_mode,
                last_verified_at: Some(now),
                profile,
            }
        }
        Err(err) => {
            warn!(zip = %context.zip, %err, "climate fallback");
            ClimateSnapshot::synthetic(&context.zip, FallbackReason::from(&err), context.key_mode)
        }
    }
}

fn fetch_live(
    context: &ClimateContext,
    caches: &mut ClimateCaches,
    source: &mut dyn ClimateSource,
    now: u64,
) -> Result<(ClimateProfile, String), ClimateError> {
    let coordinates = match caches.coordinates.get(&context.zip, now) {
        Some(entry) => entry.coordinates,
        None => {
            let coordinates = source
                .lookup_coordinates(&context.zip)
                .map_err(|_| ClimateError::LocationLookup(context.zip.clone()))?;
            caches.coordinates.put(
                &context.zip,
                CoordinateCacheEntry {
                    coordinates: coordinates.clone(),
                    cached_at: now,
                },
            );
            coordinates
        }
    };

    let hourly = source.fetch_hourly(context, &coordinates)?;
    let profile = derive_climate_profile(&hourly.ac_w, hourly.tamb_c.as_deref())?;
    profile.validate()?;

    let label = hourly
        .location_label
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| {
            if coordinates.label.is_empty() {
                context.zip.clone()
            } else {
                coordinates.label.clone()
            }
        });
    Ok((profile, label))
}
