use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::types::Coordinate;

/// Identifier assigned by the CRUD layer that owns the listing records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListingId(u64);

impl ListingId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DealType {
    /// Monthly rent with deposit.
    RentDeposit,
    /// Lump-sum lease deposit, no monthly rent.
    Lease,
    Sale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FloorCategory {
    Basement,
    Low,
    Mid,
    High,
    Top,
}

/// Boolean amenity flags carried on each listing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Amenities {
    pub elevator: bool,
    pub parking: bool,
    pub pets_allowed: bool,
    pub furnished: bool,
    pub balcony: bool,
}

/// Property listing record.
///
/// Owned by the CRUD/data layer; the map core treats it as read-only input.
/// `price` carries the sale price or the deposit depending on `deal_type`,
/// `rent` the monthly rent where applicable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub deal_type: DealType,
    #[serde(default)]
    pub building_type: String,
    pub address: String,
    /// Unit/floor detail appended to the parcel address when geocoding.
    #[serde(default)]
    pub address_detail: Option<String>,
    /// Coordinate stored with the record, when the agent pinned one.
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub rent: Option<Decimal>,
    #[serde(default)]
    pub area_m2: Option<f64>,
    #[serde(default)]
    pub rooms: Option<u8>,
    #[serde(default)]
    pub baths: Option<u8>,
    #[serde(default)]
    pub floor_category: Option<FloorCategory>,
    #[serde(default)]
    pub amenities: Amenities,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub registered_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// Creates a minimal listing; everything else via the `with_*` setters.
    #[must_use]
    pub fn new(id: ListingId, deal_type: DealType, address: impl Into<String>) -> Self {
        Self {
            id,
            deal_type,
            building_type: String::new(),
            address: address.into(),
            address_detail: None,
            coordinate: None,
            price: None,
            rent: None,
            area_m2: None,
            rooms: None,
            baths: None,
            floor_category: None,
            amenities: Amenities::default(),
            photos: Vec::new(),
            registered_at: None,
        }
    }

    #[must_use]
    pub fn with_building_type(mut self, building_type: impl Into<String>) -> Self {
        self.building_type = building_type.into();
        self
    }

    #[must_use]
    pub fn with_address_detail(mut self, detail: impl Into<String>) -> Self {
        self.address_detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    #[must_use]
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn with_rent(mut self, rent: Decimal) -> Self {
        self.rent = Some(rent);
        self
    }

    #[must_use]
    pub fn with_area_m2(mut self, area_m2: f64) -> Self {
        self.area_m2 = Some(area_m2);
        self
    }

    #[must_use]
    pub fn with_rooms(mut self, rooms: u8, baths: u8) -> Self {
        self.rooms = Some(rooms);
        self.baths = Some(baths);
        self
    }

    #[must_use]
    pub fn with_floor_category(mut self, category: FloorCategory) -> Self {
        self.floor_category = Some(category);
        self
    }

    #[must_use]
    pub fn with_amenities(mut self, amenities: Amenities) -> Self {
        self.amenities = amenities;
        self
    }

    #[must_use]
    pub fn with_registered_at(mut self, registered_at: DateTime<Utc>) -> Self {
        self.registered_at = Some(registered_at);
        self
    }

    /// Non-empty unit/floor detail, if the record carries one.
    #[must_use]
    pub fn address_detail_trimmed(&self) -> Option<&str> {
        self.address_detail
            .as_deref()
            .map(str::trim)
            .filter(|detail| !detail.is_empty())
    }
}
