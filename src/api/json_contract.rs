use crate::core::listing::Listing;
use crate::error::{MapError, MapResult};

/// Parses the CRUD layer's listings payload.
///
/// The query returns the full set as one JSON array, unpaginated; all
/// filtering happens client-side afterwards.
pub fn listings_from_json(input: &str) -> MapResult<Vec<Listing>> {
    serde_json::from_str(input)
        .map_err(|e| MapError::InvalidData(format!("failed to parse listings payload: {e}")))
}
