use std::collections::VecDeque;

use futures::FutureExt as _;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::listing::ListingId;
use crate::core::types::{Coordinate, GeoBox, ViewportBounds};
use crate::surface::{BackendKind, FitOutcome, MapBackend, MapEvent, Marker, MarkerId};

/// Credentials unlocking the vendor SDK. Absent credentials leave the
/// backend selectable but permanently empty; the open-tile backend keeps
/// the map usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorCredentials {
    pub client_id: String,
}

impl VendorCredentials {
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }
}

/// The vendor SDK's native point: x is longitude, y is latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
struct NativePoint {
    x: f64,
    y: f64,
}

impl NativePoint {
    fn from_coordinate(coordinate: Coordinate) -> Self {
        Self {
            x: coordinate.lng,
            y: coordinate.lat,
        }
    }

    fn to_coordinate(self) -> Coordinate {
        Coordinate::new(self.y, self.x)
    }
}

/// Vendor bounds are a south-west/north-east native-point pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VendorBounds {
    sw: NativePoint,
    ne: NativePoint,
}

impl ViewportBounds for VendorBounds {
    fn contains(&self, coordinate: Coordinate) -> bool {
        let point = NativePoint::from_coordinate(coordinate);
        point.y >= self.sw.y && point.y <= self.ne.y && point.x >= self.sw.x && point.x <= self.ne.x
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SdkState {
    Unloaded,
    Ready,
    Failed,
}

/// Overlay-based marker as the vendor SDK models it.
#[derive(Debug, Clone, PartialEq)]
struct Overlay {
    marker: Marker,
    z_index: i32,
}

const MIN_LEVEL: u8 = 1;
const MAX_LEVEL: u8 = 14;
const DEFAULT_LEVEL: u8 = 8;
/// Half the viewport's longitude span at level 1.
const BASE_LNG_HALF: f64 = 0.001;
const DEFAULT_CENTER: NativePoint = NativePoint {
    x: 126.978,
    y: 37.5665,
};

/// Vendor-SDK surface: lng-first native points, discrete zoom levels where
/// a *smaller* level is closer in, overlay markers.
///
/// The SDK script loads lazily on first `init` and only with credentials.
/// Its relayout after a programmatic fit always emits an idle notification
/// the backend cannot suppress, so fits report `FitOutcome::Notified` and
/// the scheduler consumes the echo.
#[derive(Debug)]
pub struct VendorBackend {
    credentials: Option<VendorCredentials>,
    sdk: SdkState,
    center: NativePoint,
    level: u8,
    overlays: Vec<Overlay>,
    next_marker: u64,
    events: VecDeque<MapEvent>,
}

impl VendorBackend {
    #[must_use]
    pub fn new(credentials: Option<VendorCredentials>) -> Self {
        Self {
            credentials,
            sdk: SdkState::Unloaded,
            center: DEFAULT_CENTER,
            level: DEFAULT_LEVEL,
            overlays: Vec::new(),
            next_marker: 0,
            events: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn center(&self) -> Coordinate {
        self.center.to_coordinate()
    }

    /// Native zoom level; level 1 is the closest view.
    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[must_use]
    pub fn load_failed(&self) -> bool {
        self.sdk == SdkState::Failed
    }

    fn lng_half(&self) -> f64 {
        BASE_LNG_HALF * f64::from(self.level).exp2()
    }

    fn lat_half(&self) -> f64 {
        // The vendor viewport is squarer than the tile layer's.
        self.lng_half() * 0.75
    }

    fn viewport_bounds(&self) -> VendorBounds {
        VendorBounds {
            sw: NativePoint {
                x: self.center.x - self.lng_half(),
                y: self.center.y - self.lat_half(),
            },
            ne: NativePoint {
                x: self.center.x + self.lng_half(),
                y: self.center.y + self.lat_half(),
            },
        }
    }

    /// Smallest level whose viewport covers the target box.
    fn level_covering(&self, target: GeoBox) -> u8 {
        for level in MIN_LEVEL..=MAX_LEVEL {
            let lng_half = BASE_LNG_HALF * f64::from(level).exp2();
            let lat_half = lng_half * 0.75;
            if target.lng_span() <= 2.0 * lng_half && target.lat_span() <= 2.0 * lat_half {
                return level;
            }
        }
        MAX_LEVEL
    }
}

impl MapBackend for VendorBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Vendor
    }

    fn init(&mut self) -> LocalBoxFuture<'_, ()> {
        async move {
            match self.sdk {
                SdkState::Ready => {}
                SdkState::Unloaded | SdkState::Failed => {
                    if self.credentials.is_some() {
                        self.sdk = SdkState::Ready;
                        debug!("vendor map sdk loaded");
                    } else {
                        self.sdk = SdkState::Failed;
                        warn!("vendor map sdk unavailable; surface stays empty");
                    }
                }
            }
        }
        .boxed_local()
    }

    fn destroy(&mut self) {
        self.overlays.clear();
        self.events.clear();
        if self.sdk == SdkState::Ready {
            self.sdk = SdkState::Unloaded;
        }
    }

    fn is_ready(&self) -> bool {
        self.sdk == SdkState::Ready
    }

    fn add_marker(
        &mut self,
        coordinate: Coordinate,
        label: &str,
        members: &[ListingId],
    ) -> Option<MarkerId> {
        if self.sdk != SdkState::Ready {
            return None;
        }
        if !coordinate.is_valid() {
            warn!(lat = coordinate.lat, lng = coordinate.lng, "vendor overlay rejected");
            return None;
        }
        let id = MarkerId::new(self.next_marker);
        self.next_marker += 1;
        // Later overlays stack above earlier ones, like the SDK's default.
        let z_index = i32::try_from(self.overlays.len()).unwrap_or(i32::MAX);
        self.overlays.push(Overlay {
            marker: Marker {
                id,
                coordinate,
                label: label.to_owned(),
                members: members.iter().copied().collect(),
            },
            z_index,
        });
        Some(id)
    }

    fn clear_markers(&mut self) {
        self.overlays.clear();
    }

    fn marker_count(&self) -> usize {
        self.overlays.len()
    }

    fn markers(&self) -> Vec<Marker> {
        self.overlays
            .iter()
            .map(|overlay| overlay.marker.clone())
            .collect()
    }

    fn bounds(&self) -> Option<Box<dyn ViewportBounds>> {
        if self.sdk != SdkState::Ready {
            return None;
        }
        Some(Box::new(self.viewport_bounds()))
    }

    fn fit_to_coordinates(&mut self, coordinates: &[Coordinate]) -> FitOutcome {
        if self.sdk != SdkState::Ready {
            return FitOutcome::Skipped;
        }
        let Some(target) = GeoBox::from_coordinates(coordinates) else {
            return FitOutcome::Skipped;
        };

        self.center = NativePoint::from_coordinate(target.center());
        self.level = self.level_covering(target);
        // The SDK relayout fires an idle notification we cannot suppress.
        self.events.push_back(MapEvent::ViewportSettled);
        FitOutcome::Notified
    }

    fn pan_by(&mut self, delta_lat: f64, delta_lng: f64) {
        if self.sdk != SdkState::Ready {
            return;
        }
        self.center = NativePoint {
            x: self.center.x + delta_lng,
            y: self.center.y + delta_lat,
        };
        self.events.push_back(MapEvent::ViewportSettled);
    }

    fn set_zoom(&mut self, zoom: f64) {
        if self.sdk != SdkState::Ready {
            return;
        }
        // Open-web zoom grows inward; vendor levels grow outward.
        let level = (20.0 - zoom).round();
        self.level = if level.is_finite() {
            (level as i64).clamp(i64::from(MIN_LEVEL), i64::from(MAX_LEVEL)) as u8
        } else {
            DEFAULT_LEVEL
        };
        self.events.push_back(MapEvent::ViewportSettled);
    }

    fn click_marker(&mut self, id: MarkerId) {
        if self.overlays.iter().any(|overlay| overlay.marker.id == id) {
            self.events.push_back(MapEvent::MarkerClicked { marker: id });
        }
    }

    fn take_events(&mut self) -> Vec<MapEvent> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{VendorBackend, VendorCredentials};
    use crate::core::types::Coordinate;
    use crate::surface::{FitOutcome, MapBackend as _, MapEvent};

    #[test]
    fn init_without_credentials_degrades_to_empty_surface() {
        let mut backend = VendorBackend::new(None);
        pollster::block_on(backend.init());

        assert!(!backend.is_ready());
        assert!(backend.load_failed());
        assert!(
            backend
                .add_marker(Coordinate::new(37.5, 127.1), "1", &[])
                .is_none()
        );
        assert!(backend.bounds().is_none());
    }

    #[test]
    fn fit_echoes_a_settle_notification() {
        let mut backend = VendorBackend::new(Some(VendorCredentials::new("test-key")));
        pollster::block_on(backend.init());

        let outcome = backend.fit_to_coordinates(&[Coordinate::new(37.53, 127.12)]);
        assert_eq!(outcome, FitOutcome::Notified);
        assert_eq!(backend.take_events(), vec![MapEvent::ViewportSettled]);
    }
}
