use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use smallvec::SmallVec;

use crate::core::listing::{Listing, ListingId};
use crate::core::parcel::{ParcelKey, parcel_key};
use crate::core::types::Coordinate;
use crate::geocode::GeocodeResolver;

/// Listings sharing one parcel key, rendered as a single marker.
///
/// Members keep the insertion order of the input set. Clusters are derived,
/// disposable state: they are rebuilt on every draw pass and never mutated
/// in place afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    key: ParcelKey,
    members: Vec<Listing>,
}

impl Cluster {
    fn new(key: ParcelKey) -> Self {
        Self {
            key,
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &ParcelKey {
        &self.key
    }

    #[must_use]
    pub fn members(&self) -> &[Listing] {
        &self.members
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn member_ids(&self) -> SmallVec<[ListingId; 4]> {
        self.members.iter().map(|listing| listing.id).collect()
    }

    /// Coordinate used to place this cluster's marker.
    ///
    /// Prefers the median of the members' stored coordinates; only a cluster
    /// with no stored coordinate at all costs a geocode. `None` means the
    /// cluster cannot be placed in this pass and is omitted by the caller.
    pub async fn resolve_representative(&self, resolver: &GeocodeResolver) -> Option<Coordinate> {
        if let Some(stored) = self.median_stored_coordinate() {
            return Some(stored);
        }
        resolver.resolve(&self.candidate_address()).await
    }

    /// Component-wise median of the members' stored coordinates.
    ///
    /// Latitudes and longitudes are ranked independently; an even count
    /// resolves to the lower-middle entry. Robust against a single wildly
    /// wrong stored point, unlike averaging.
    #[must_use]
    pub fn median_stored_coordinate(&self) -> Option<Coordinate> {
        let mut lats: SmallVec<[f64; 8]> = SmallVec::new();
        let mut lngs: SmallVec<[f64; 8]> = SmallVec::new();
        for listing in &self.members {
            if let Some(coordinate) = listing.coordinate {
                lats.push(coordinate.lat);
                lngs.push(coordinate.lng);
            }
        }
        if lats.is_empty() {
            return None;
        }
        Some(Coordinate::new(
            lower_median(&mut lats),
            lower_median(&mut lngs),
        ))
    }

    /// Member whose address is geocoded when no stored coordinate exists.
    ///
    /// A member with a unit/floor detail wins; otherwise the first member
    /// stands in.
    #[must_use]
    pub fn geocode_candidate(&self) -> Option<&Listing> {
        self.members
            .iter()
            .find(|listing| listing.address_detail_trimmed().is_some())
            .or_else(|| self.members.first())
    }

    /// Parcel key plus the candidate's unit/floor detail, when present.
    #[must_use]
    pub fn candidate_address(&self) -> String {
        match self.geocode_candidate().and_then(Listing::address_detail_trimmed) {
            Some(detail) => format!("{} {detail}", self.key),
            None => self.key.to_string(),
        }
    }

    fn push(&mut self, listing: Listing) {
        self.members.push(listing);
    }
}

fn lower_median(values: &mut [f64]) -> f64 {
    values.sort_by_key(|value| OrderedFloat(*value));
    values[(values.len() - 1) / 2]
}

/// Partitions listings into clusters keyed by parcel key, in input order.
///
/// Every listing lands in exactly one cluster; the cluster map and each
/// member list keep insertion order.
#[must_use]
pub fn group_listings(listings: &[Listing]) -> IndexMap<ParcelKey, Cluster> {
    let mut clusters: IndexMap<ParcelKey, Cluster> = IndexMap::new();
    for listing in listings {
        let key = parcel_key(&listing.address);
        clusters
            .entry(key.clone())
            .or_insert_with(|| Cluster::new(key))
            .push(listing.clone());
    }
    clusters
}
