pub mod cluster;
pub mod listing;
pub mod parcel;
pub mod types;

pub use cluster::{Cluster, group_listings};
pub use listing::{Amenities, DealType, FloorCategory, Listing, ListingId};
pub use parcel::{ParcelKey, parcel_key};
pub use types::{Coordinate, GeoBox, ViewportBounds};
