use std::collections::VecDeque;

use futures::FutureExt as _;
use futures::future::LocalBoxFuture;
use tracing::warn;

use crate::core::listing::ListingId;
use crate::core::types::{Coordinate, GeoBox, ViewportBounds};
use crate::surface::{BackendKind, FitOutcome, MapBackend, MapEvent, Marker, MarkerId};

const MIN_ZOOM: f64 = 3.0;
const MAX_ZOOM: f64 = 19.0;
/// Zoom used when fitting to a single point or a degenerate box.
const POINT_FIT_ZOOM: f64 = 16.0;
const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 37.5665,
    lng: 126.978,
};
const DEFAULT_ZOOM: f64 = 12.0;

/// Open tile-layer surface: center + zoom viewport, rectangular bounds.
///
/// The tile library is statically linked into the page, so `init` cannot
/// fail. Programmatic fits move the viewport without emitting a settle
/// event, so this backend never echoes its own fits.
#[derive(Debug)]
pub struct OpenTileBackend {
    ready: bool,
    center: Coordinate,
    zoom: f64,
    markers: Vec<Marker>,
    next_marker: u64,
    events: VecDeque<MapEvent>,
}

impl OpenTileBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ready: false,
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            markers: Vec::new(),
            next_marker: 0,
            events: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn center(&self) -> Coordinate {
        self.center
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    fn viewport_box(&self) -> GeoBox {
        let lng_half = 180.0 / self.zoom.exp2();
        let lat_half = 85.0 / self.zoom.exp2();
        GeoBox::new(
            self.center.lat - lat_half,
            self.center.lng - lng_half,
            self.center.lat + lat_half,
            self.center.lng + lng_half,
        )
    }
}

impl Default for OpenTileBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MapBackend for OpenTileBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::OpenTile
    }

    fn init(&mut self) -> LocalBoxFuture<'_, ()> {
        async move {
            self.ready = true;
        }
        .boxed_local()
    }

    fn destroy(&mut self) {
        self.ready = false;
        self.markers.clear();
        self.events.clear();
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn add_marker(
        &mut self,
        coordinate: Coordinate,
        label: &str,
        members: &[ListingId],
    ) -> Option<MarkerId> {
        if !self.ready {
            return None;
        }
        if !coordinate.is_valid() {
            warn!(lat = coordinate.lat, lng = coordinate.lng, "tile marker rejected");
            return None;
        }
        let id = MarkerId::new(self.next_marker);
        self.next_marker += 1;
        self.markers.push(Marker {
            id,
            coordinate,
            label: label.to_owned(),
            members: members.iter().copied().collect(),
        });
        Some(id)
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
    }

    fn marker_count(&self) -> usize {
        self.markers.len()
    }

    fn markers(&self) -> Vec<Marker> {
        self.markers.clone()
    }

    fn bounds(&self) -> Option<Box<dyn ViewportBounds>> {
        if !self.ready {
            return None;
        }
        Some(Box::new(self.viewport_box()))
    }

    fn fit_to_coordinates(&mut self, coordinates: &[Coordinate]) -> FitOutcome {
        if !self.ready {
            return FitOutcome::Skipped;
        }
        let Some(target) = GeoBox::from_coordinates(coordinates) else {
            return FitOutcome::Skipped;
        };

        self.center = target.center();
        // Pad the target so fitted points never sit on the viewport edge.
        let lng_span = target.lng_span() * 1.1;
        let lat_span = target.lat_span() * 1.1;
        self.zoom = if lng_span <= f64::EPSILON && lat_span <= f64::EPSILON {
            POINT_FIT_ZOOM
        } else {
            // Largest zoom whose viewport still covers the padded span.
            let by_lng = (360.0 / lng_span.max(f64::EPSILON)).log2();
            let by_lat = (170.0 / lat_span.max(f64::EPSILON)).log2();
            by_lng.min(by_lat).clamp(MIN_ZOOM, MAX_ZOOM)
        };
        FitOutcome::Completed
    }

    fn pan_by(&mut self, delta_lat: f64, delta_lng: f64) {
        if !self.ready {
            return;
        }
        self.center = Coordinate::new(self.center.lat + delta_lat, self.center.lng + delta_lng);
        self.events.push_back(MapEvent::ViewportSettled);
    }

    fn set_zoom(&mut self, zoom: f64) {
        if !self.ready {
            return;
        }
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.events.push_back(MapEvent::ViewportSettled);
    }

    fn click_marker(&mut self, id: MarkerId) {
        if self.markers.iter().any(|marker| marker.id == id) {
            self.events.push_back(MapEvent::MarkerClicked { marker: id });
        }
    }

    fn take_events(&mut self) -> Vec<MapEvent> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::OpenTileBackend;
    use crate::core::types::Coordinate;
    use crate::surface::{FitOutcome, MapBackend as _};

    #[test]
    fn fit_centers_on_union_and_suppresses_settle() {
        let mut backend = OpenTileBackend::new();
        pollster::block_on(backend.init());

        let outcome = backend.fit_to_coordinates(&[
            Coordinate::new(37.50, 127.10),
            Coordinate::new(37.54, 127.14),
        ]);
        assert_eq!(outcome, FitOutcome::Completed);
        assert!((backend.center().lat - 37.52).abs() < 1e-9);
        assert!(backend.take_events().is_empty());
    }

    #[test]
    fn not_ready_surface_rejects_markers() {
        let mut backend = OpenTileBackend::new();
        assert!(
            backend
                .add_marker(Coordinate::new(37.5, 127.1), "1", &[])
                .is_none()
        );
    }
}
