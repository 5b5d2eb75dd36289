//! parcel-map: address-clustering map engine for real-estate listing views.
//!
//! The crate covers the one genuinely stateful part of a brokerage
//! back-office: resolving free-text addresses through an unreliable provider
//! chain with a session-scoped cache, collapsing listings that share a
//! parcel into single markers, filtering against the live viewport without
//! feeding back into the map's own events, and doing all of it behind a
//! swappable rendering backend.

pub mod api;
pub mod core;
pub mod error;
pub mod filter;
pub mod geocode;
pub mod surface;
pub mod telemetry;

pub use api::{MapEngine, MapEngineConfig};
pub use error::{MapError, MapResult};
