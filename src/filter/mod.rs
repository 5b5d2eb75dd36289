use std::rc::Rc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::listing::{Amenities, DealType, FloorCategory, Listing};
use crate::core::parcel::parcel_key;
use crate::core::types::{Coordinate, ViewportBounds};
use crate::error::{MapError, MapResult};
use crate::geocode::SessionGeocodeCache;

/// Inclusive range with open ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Band<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T> Default for Band<T> {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
        }
    }
}

impl<T: PartialOrd + Copy> Band<T> {
    #[must_use]
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn at_least(min: T) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    #[must_use]
    pub fn at_most(max: T) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    #[must_use]
    pub fn between(min: T, max: T) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    fn is_ordered(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }
}

/// Immutable snapshot of the active facet predicates.
///
/// Recreated wholesale on every user filter edit and consumed once per
/// render pass; never mutated in place while a pass runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    /// Empty set means every deal type is accepted.
    pub deal_types: Vec<DealType>,
    pub price: Band<Decimal>,
    pub rent: Band<Decimal>,
    pub area_m2: Band<f64>,
    pub min_rooms: Option<u8>,
    pub min_baths: Option<u8>,
    pub floor_category: Option<FloorCategory>,
    /// Flags set here must be present on the listing.
    pub required_amenities: Amenities,
    /// Restrict to listings whose cluster coordinate sits inside the current
    /// viewport. Listings without a resolved coordinate are excluded under
    /// this mode, never included by default.
    pub in_map_only: bool,
}

impl FilterState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_deal_types(mut self, deal_types: Vec<DealType>) -> Self {
        self.deal_types = deal_types;
        self
    }

    #[must_use]
    pub fn with_price(mut self, price: Band<Decimal>) -> Self {
        self.price = price;
        self
    }

    #[must_use]
    pub fn with_rent(mut self, rent: Band<Decimal>) -> Self {
        self.rent = rent;
        self
    }

    #[must_use]
    pub fn with_area_m2(mut self, area_m2: Band<f64>) -> Self {
        self.area_m2 = area_m2;
        self
    }

    #[must_use]
    pub fn with_min_rooms(mut self, min_rooms: u8) -> Self {
        self.min_rooms = Some(min_rooms);
        self
    }

    #[must_use]
    pub fn with_min_baths(mut self, min_baths: u8) -> Self {
        self.min_baths = Some(min_baths);
        self
    }

    #[must_use]
    pub fn with_floor_category(mut self, category: FloorCategory) -> Self {
        self.floor_category = Some(category);
        self
    }

    #[must_use]
    pub fn with_required_amenities(mut self, amenities: Amenities) -> Self {
        self.required_amenities = amenities;
        self
    }

    #[must_use]
    pub fn with_in_map_only(mut self, in_map_only: bool) -> Self {
        self.in_map_only = in_map_only;
        self
    }

    pub fn validate(&self) -> MapResult<()> {
        if !self.price.is_ordered() {
            return Err(MapError::InvalidFilter("price band min > max".to_owned()));
        }
        if !self.rent.is_ordered() {
            return Err(MapError::InvalidFilter("rent band min > max".to_owned()));
        }
        if !self.area_m2.is_ordered() {
            return Err(MapError::InvalidFilter("area band min > max".to_owned()));
        }
        Ok(())
    }

    /// All listing-level predicates except viewport containment.
    #[must_use]
    pub fn matches_facets(&self, listing: &Listing) -> bool {
        if !self.deal_types.is_empty() && !self.deal_types.contains(&listing.deal_type) {
            return false;
        }
        if !band_matches(&self.price, listing.price) {
            return false;
        }
        if !band_matches(&self.rent, listing.rent) {
            return false;
        }
        if !band_matches(&self.area_m2, listing.area_m2) {
            return false;
        }
        if let Some(min_rooms) = self.min_rooms
            && listing.rooms.unwrap_or(0) < min_rooms
        {
            return false;
        }
        if let Some(min_baths) = self.min_baths
            && listing.baths.unwrap_or(0) < min_baths
        {
            return false;
        }
        if let Some(category) = self.floor_category
            && listing.floor_category != Some(category)
        {
            return false;
        }
        amenities_satisfied(self.required_amenities, listing.amenities)
    }
}

/// A constrained band rejects listings that do not carry the field at all.
fn band_matches<T: PartialOrd + Copy>(band: &Band<T>, value: Option<T>) -> bool {
    if band.min.is_none() && band.max.is_none() {
        return true;
    }
    value.is_some_and(|value| band.contains(value))
}

fn amenities_satisfied(required: Amenities, actual: Amenities) -> bool {
    (!required.elevator || actual.elevator)
        && (!required.parking || actual.parking)
        && (!required.pets_allowed || actual.pets_allowed)
        && (!required.furnished || actual.furnished)
        && (!required.balcony || actual.balcony)
}

/// Composes the facet predicates with optional viewport containment.
///
/// Bounds are read fresh from the active backend at each call site; the
/// engine never keeps a bounds instance across calls.
pub struct ViewportFilterEngine {
    cache: Rc<SessionGeocodeCache>,
}

impl ViewportFilterEngine {
    #[must_use]
    pub fn new(cache: Rc<SessionGeocodeCache>) -> Self {
        Self { cache }
    }

    /// Returns the listings passing every active predicate, in input order.
    ///
    /// With `in_map_only` set and no bounds available (surface absent or
    /// still loading) the viewport predicate is skipped rather than hiding
    /// the whole data set.
    #[must_use]
    pub fn filter(
        &self,
        listings: &[Listing],
        state: &FilterState,
        bounds: Option<&dyn ViewportBounds>,
    ) -> Vec<Listing> {
        listings
            .iter()
            .filter(|listing| state.matches_facets(listing))
            .filter(|listing| match (state.in_map_only, bounds) {
                (true, Some(bounds)) => self
                    .resolved_coordinate(listing)
                    .is_some_and(|coordinate| bounds.contains(coordinate)),
                _ => true,
            })
            .cloned()
            .collect()
    }

    /// Stored coordinate, else whatever the session cache already knows for
    /// the listing's parcel. Never issues a fresh geocode: filtering is
    /// synchronous and an unresolved listing is simply not "on the map" yet.
    #[must_use]
    pub fn resolved_coordinate(&self, listing: &Listing) -> Option<Coordinate> {
        listing
            .coordinate
            .or_else(|| self.cache.get(&parcel_key(&listing.address)))
    }
}
