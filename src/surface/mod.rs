use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::listing::ListingId;
use crate::core::types::{Coordinate, ViewportBounds};

mod tile;
mod vendor;

pub use tile::OpenTileBackend;
pub use vendor::{VendorBackend, VendorCredentials};

/// Selectable rendering backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Open tile layer, no credentials required.
    OpenTile,
    /// Vendor SDK with overlay markers; needs credentials to load.
    Vendor,
}

/// Handle to a marker drawn on the active surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerId(u64);

impl MarkerId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// One drawn cluster marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub coordinate: Coordinate,
    pub label: String,
    pub members: SmallVec<[ListingId; 4]>,
}

/// How a programmatic fit concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitOutcome {
    /// Fit applied synchronously; no settle notification will follow.
    Completed,
    /// The surface confirms the fit later through a `ViewportSettled` event
    /// it cannot suppress.
    Notified,
    /// Surface not ready or nothing to fit; the viewport did not move.
    Skipped,
}

/// Surface events drained by the engine's pump.
///
/// `ViewportSettled` fires once per completed user pan/zoom. Backends that
/// can suppress their own programmatic-fit echo do so; the one that cannot
/// reports `FitOutcome::Notified` from the fit and the scheduler swallows
/// the echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEvent {
    ViewportSettled,
    MarkerClicked { marker: MarkerId },
}

/// Rendering-surface lifecycle contract.
///
/// Two interchangeable implementations with different native coordinate and
/// event APIs sit behind this trait; callers only ever depend on it.
/// Switching the active implementation keeps the geocode cache untouched —
/// geocoding is provider-agnostic.
pub trait MapBackend {
    fn kind(&self) -> BackendKind;

    /// Brings the surface up, lazily loading the underlying library when
    /// needed. Never fails: a surface whose library cannot load stays empty
    /// and not-ready, which is recoverable and reported, not fatal.
    fn init(&mut self) -> LocalBoxFuture<'_, ()>;

    /// Tears the surface down; markers and queued events are dropped.
    fn destroy(&mut self);

    fn is_ready(&self) -> bool;

    /// Draws one marker. Returns `None` (and draws nothing) when the surface
    /// is not ready or the coordinate is invalid.
    fn add_marker(
        &mut self,
        coordinate: Coordinate,
        label: &str,
        members: &[ListingId],
    ) -> Option<MarkerId>;

    fn clear_markers(&mut self);

    fn marker_count(&self) -> usize;

    /// Snapshot of the currently drawn markers.
    fn markers(&self) -> Vec<Marker>;

    /// Fresh containment capability for the current viewport, or `None`
    /// while the surface is down. Callers must not cache the returned value.
    fn bounds(&self) -> Option<Box<dyn ViewportBounds>>;

    /// Moves the viewport so every coordinate is visible.
    fn fit_to_coordinates(&mut self, coordinates: &[Coordinate]) -> FitOutcome;

    /// User pan gesture entry point; queues a settle event.
    fn pan_by(&mut self, delta_lat: f64, delta_lng: f64);

    /// User zoom gesture entry point (open-web zoom scale); queues a settle
    /// event. Implementations translate to their native zoom semantics.
    fn set_zoom(&mut self, zoom: f64);

    /// User click on a drawn marker; queues a click event when the id is
    /// live.
    fn click_marker(&mut self, id: MarkerId);

    /// Drains queued surface events in arrival order.
    fn take_events(&mut self) -> Vec<MapEvent>;
}

/// Strategy factory: backends are selected at runtime, never subclassed.
#[must_use]
pub fn build_backend(
    kind: BackendKind,
    credentials: Option<&VendorCredentials>,
) -> Box<dyn MapBackend> {
    match kind {
        BackendKind::OpenTile => Box::new(OpenTileBackend::new()),
        BackendKind::Vendor => Box::new(VendorBackend::new(credentials.cloned())),
    }
}
