//! Climate profiles: shape, synthetic fallback, caching, and resolution.

pub mod cache;
pub mod profile;
pub mod resolver;
pub mod synthetic;

pub use profile::{ClimateProfile, TempSource};
pub use resolver::{ClimateSnapshot, ClimateStatus, FallbackReason};
