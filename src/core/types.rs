use serde::{Deserialize, Serialize};

/// Geographic point in floating-point degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Containment capability exposed by the active map surface.
///
/// Bounds become stale the moment the user moves the map, so callers fetch a
/// fresh instance from the backend per filter evaluation and never hold one
/// across evaluations.
pub trait ViewportBounds {
    fn contains(&self, coordinate: Coordinate) -> bool;
}

/// Axis-aligned lat/lng rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBox {
    #[must_use]
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Smallest box covering every coordinate, or `None` for an empty slice.
    #[must_use]
    pub fn from_coordinates(coordinates: &[Coordinate]) -> Option<Self> {
        let first = coordinates.first()?;
        let mut bounds = Self::new(first.lat, first.lng, first.lat, first.lng);
        for coordinate in &coordinates[1..] {
            bounds.south = bounds.south.min(coordinate.lat);
            bounds.north = bounds.north.max(coordinate.lat);
            bounds.west = bounds.west.min(coordinate.lng);
            bounds.east = bounds.east.max(coordinate.lng);
        }
        Some(bounds)
    }

    #[must_use]
    pub fn center(self) -> Coordinate {
        Coordinate::new(
            0.5 * (self.south + self.north),
            0.5 * (self.west + self.east),
        )
    }

    #[must_use]
    pub fn lat_span(self) -> f64 {
        self.north - self.south
    }

    #[must_use]
    pub fn lng_span(self) -> f64 {
        self.east - self.west
    }
}

impl ViewportBounds for GeoBox {
    fn contains(&self, coordinate: Coordinate) -> bool {
        coordinate.lat >= self.south
            && coordinate.lat <= self.north
            && coordinate.lng >= self.west
            && coordinate.lng <= self.east
    }
}

#[cfg(test)]
mod tests {
    use super::{Coordinate, GeoBox, ViewportBounds as _};

    #[test]
    fn union_box_covers_all_points() {
        let coords = [
            Coordinate::new(37.538, 127.124),
            Coordinate::new(37.530, 127.120),
            Coordinate::new(37.541, 127.131),
        ];
        let bounds = GeoBox::from_coordinates(&coords).expect("non-empty");
        for coordinate in coords {
            assert!(bounds.contains(coordinate));
        }
        assert_eq!(bounds.south, 37.530);
        assert_eq!(bounds.east, 127.131);
    }

    #[test]
    fn empty_slice_yields_no_box() {
        assert!(GeoBox::from_coordinates(&[]).is_none());
    }

    #[test]
    fn coordinate_validity_rejects_out_of_range() {
        assert!(Coordinate::new(37.5, 127.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 127.0).is_valid());
        assert!(!Coordinate::new(95.0, 127.0).is_valid());
        assert!(!Coordinate::new(37.5, 181.0).is_valid());
    }
}
