//! Lookup context, cache keys, and the key-value cache collaborator for
//! climate and ZIP-coordinate lookups.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::climate::profile::ClimateProfile;
use crate::error::ClimateError;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Climate profiles are refreshed after 30 days.
pub const CLIMATE_CACHE_TTL_SECS: u64 = 30 * SECS_PER_DAY;
/// ZIP coordinates are refreshed after 180 days.
pub const ZIP_COORD_CACHE_TTL_SECS: u64 = 180 * SECS_PER_DAY;

/// Shared key used when the caller supplies none.
pub const DEMO_API_KEY: &str = "DEMO_KEY";

/// Fixed production-model parameters; part of every cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PvModelParams {
    pub system_capacity_kw: u32,
    pub module_type: u32,
    pub array_type: u32,
    pub tilt_deg: u32,
    pub azimuth_deg: u32,
    pub losses_pct: u32,
    pub timeframe: &'static str,
}

pub const PV_MODEL_PARAMS: PvModelParams = PvModelParams {
    system_capacity_kw: 1,
    module_type: 1,
    array_type: 1,
    tilt_deg: 20,
    azimuth_deg: 180,
    losses_pct: 14,
    timeframe: "hourly",
};

/// Whether lookups run on the caller's key or the shared demo key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    UserKey,
    DemoKey,
}

/// A validated ZIP plus the key material used to look it up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClimateContext {
    /// Five-digit ZIP.
    pub zip: String,
    pub api_key: String,
    pub key_mode: KeyMode,
    /// `zip|hash(api_key)`.
    pub signature: String,
    pub cache_key: String,
}

impl ClimateContext {
    /// Builds the lookup context.
    ///
    /// An empty `api_key` selects [`DEMO_API_KEY`].
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::InvalidZip`] unless `zip` is exactly five
    /// ASCII digits after trimming.
    pub fn new(zip: &str, api_key: &str) -> Result<Self, ClimateError> {
        let zip = zip.trim();
        if zip.len() != 5 || !zip.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ClimateError::InvalidZip(zip.to_string()));
        }

        let user_key = api_key.trim();
        let (api_key, key_mode) = if user_key.is_empty() {
            (DEMO_API_KEY.to_string(), KeyMode::DemoKey)
        } else {
            (user_key.to_string(), KeyMode::UserKey)
        };
        let key_hash = short_hash(&api_key);
        let p = PV_MODEL_PARAMS;
        let cache_key = format!(
            "{zip}|sc{}|mt{}|at{}|tilt{}|az{}|loss{}|{}|{key_hash}",
            p.system_capacity_kw, p.module_type, p.array_type, p.tilt_deg, p.azimuth_deg, p.losses_pct, p.timeframe,
        );

        Ok(Self {
            zip: zip.to_string(),
            signature: format!("{zip}|{key_hash}"),
            api_key,
            key_mode,
            cache_key,
        })
    }
}

/// 32-bit FNV-1a over UTF-16 code units, as eight lowercase hex digits.
///
/// Keeps raw API keys out of cache keys.
pub fn short_hash(text: &str) -> String {
    let hash = text
        .encode_utf16()
        .fold(2_166_136_261_u32, |h, unit| (h ^ u32::from(unit)).wrapping_mul(16_777_619));
    format!("{hash:08x}")
}

/// Something a cache can hold.
pub trait CachedEntry {
    /// Unix time (seconds) the entry was stored.
    fn cached_at(&self) -> u64;

    /// Schema check; entries failing it are evicted on read.
    fn is_usable(&self) -> bool {
        true
    }
}

/// Cached climate lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateCacheEntry {
    pub profile: ClimateProfile,
    pub location_label: String,
    pub cached_at: u64,
    pub last_verified_at: Option<u64>,
    pub key_mode: KeyMode,
}

impl CachedEntry for ClimateCacheEntry {
    fn cached_at(&self) -> u64 {
        self.cached_at
    }

    fn is_usable(&self) -> bool {
        self.profile.is_valid()
    }
}

/// Latitude/longitude for a ZIP code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateCacheEntry {
    pub coordinates: Coordinates,
    pub cached_at: u64,
}

impl CachedEntry for CoordinateCacheEntry {
    fn cached_at(&self) -> u64 {
        self.cached_at
    }

    fn is_usable(&self) -> bool {
        self.coordinates.lat.is_finite() && self.coordinates.lon.is_finite()
    }
}

/// Key-value store with per-entry age limits.
pub trait Cache<E> {
    /// Returns the entry for `key` if it is fresh and usable at `now`.
    fn get(&mut self, key: &str, now: u64) -> Option<E>;

    /// Stores `entry`. Unusable entries are dropped.
    fn put(&mut self, key: &str, entry: E);

    /// Removes entries older than `ttl_secs`; returns how many were removed.
    fn expire_older_than(&mut self, ttl_secs: u64, now: u64) -> usize;
}

/// In-process [`Cache`] that can be persisted as JSON by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCache<E> {
    pub ttl_secs: u64,
    entries: BTreeMap<String, E>,
}

impl<E> MemoryCache<E> {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: Serialize + DeserializeOwned> MemoryCache<E> {
    /// # Errors
    ///
    /// Returns the `serde_json` error if an entry cannot be serialised.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

impl<E: CachedEntry + Clone> Cache<E> for MemoryCache<E> {
    fn get(&mut self, key: &str, now: u64) -> Option<E> {
        self.expire_older_than(self.ttl_secs, now);
        match self.entries.get(key) {
            Some(entry) if entry.is_usable() => Some(entry.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&mut self, key: &str, entry: E) {
        if entry.is_usable() {
            self.entries.insert(key.to_string(), entry);
        }
    }

    fn expire_older_than(&mut self, ttl_secs: u64, now: u64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now.saturating_sub(e.cached_at()) <= ttl_secs);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::synthetic::synthetic_profile;

    fn climate_entry(cached_at: u64) -> ClimateCacheEntry {
        ClimateCacheEntry {
            profile: synthetic_profile(Some("90210")),
            location_label: "Beverly Hills, CA".into(),
            cached_at,
            last_verified_at: Some(cached_at),
            key_mode: KeyMode::DemoKey,
        }
    }

    #[test]
    fn context_rejects_malformed_zip() {
        assert!(matches!(ClimateContext::new("9021", ""), Err(ClimateError::InvalidZip(_))));
        assert!(ClimateContext::new("9021a", "").is_err());
        assert!(ClimateContext::new("902100", "").is_err());
    }

    #[test]
    fn context_builds_cache_key() {
        let ctx = ClimateContext::new(" 02139 ", "").unwrap();
        assert_eq!(ctx.zip, "02139");
        assert_eq!(ctx.key_mode, KeyMode::DemoKey);
        assert_eq!(ctx.api_key, DEMO_API_KEY);
        let hash = short_hash(DEMO_API_KEY);
        assert_eq!(ctx.cache_key, format!("02139|sc1|mt1|at1|tilt20|az180|loss14|hourly|{hash}"));
        assert_eq!(ctx.signature, format!("02139|{hash}"));

        let user = ClimateContext::new("02139", "abc").unwrap();
        assert_eq!(user.key_mode, KeyMode::UserKey);
        assert_ne!(user.cache_key, ctx.cache_key);
    }

    #[test]
    fn short_hash_is_fnv1a() {
        assert_eq!(short_hash(""), "811c9dc5");
        assert_eq!(short_hash("a"), "e40c292c");
        assert_eq!(short_hash("foobar"), "bf9cf968");
    }

    #[test]
    fn memory_cache_expires_by_age() {
        let mut cache = MemoryCache::new(CLIMATE_CACHE_TTL_SECS);
        cache.put("k", climate_entry(1_000));
        assert!(cache.get("k", 1_000 + CLIMATE_CACHE_TTL_SECS).is_some());
        assert!(cache.get("k", 1_001 + CLIMATE_CACHE_TTL_SECS).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn memory_cache_skips_invalid_entries() {
        let mut cache = MemoryCache::new(CLIMATE_CACHE_TTL_SECS);
        let mut bad = climate_entry(0);
        bad.profile.annual_kwh_per_kw = -1.0;
        cache.put("bad", bad);
        assert!(cache.is_empty());

        let mut coords: MemoryCache<CoordinateCacheEntry> = MemoryCache::new(ZIP_COORD_CACHE_TTL_SECS);
        coords.put(
            "90210",
            CoordinateCacheEntry {
                coordinates: Coordinates {
                    lat: f64::NAN,
                    lon: -118.4,
                    label: "90210".into(),
                },
                cached_at: 0,
            },
        );
        assert!(coords.get("90210", 0).is_none());
    }

    #[test]
    fn memory_cache_json_round_trip() {
        let mut cache = MemoryCache::new(CLIMATE_CACHE_TTL_SECS);
        cache.put("k", climate_entry(5));
        let json = cache.to_json().unwrap();
        let mut restored: MemoryCache<ClimateCacheEntry> = MemoryCache::from_json(&json).unwrap();
        let entry = restored.get("k", 10).unwrap();
        assert_eq!(entry.location_label, "Beverly Hills, CA");
        assert_eq!(entry.profile.annual_kwh_per_kw, 1850.0);
        assert_eq!(entry.cached_at, 5);
    }

    #[test]
    fn expire_reports_removed_count() {
        let mut cache = MemoryCache::new(u64::MAX);
        cache.put("old", climate_entry(0));
        cache.put("new", climate_entry(100));
        assert_eq!(cache.expire_older_than(50, 100), 1);
        assert_eq!(cache.len(), 1);
    }
}
