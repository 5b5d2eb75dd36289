use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::core::parcel::ParcelKey;

/// Registry facts shown on the listing detail panel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingFacts {
    pub building_name: Option<String>,
    pub completion_year: Option<u16>,
    pub households: Option<u32>,
    pub primary_use: Option<String>,
}

/// Read-through lookup by parcel key, supplied by the data layer.
///
/// Nothing here caches the answer; registry facts can change with permits
/// and renovations, unlike coordinates.
pub trait BuildingFactsSource {
    fn facts(&self, key: &ParcelKey) -> LocalBoxFuture<'_, Option<BuildingFacts>>;
}
