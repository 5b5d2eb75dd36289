use approx::assert_abs_diff_eq;
use parcel_map::core::{Coordinate, DealType, Listing, ListingId, group_listings};
use proptest::prelude::*;

fn listings_with_coordinates(coordinates: &[(f64, f64)]) -> Vec<Listing> {
    coordinates
        .iter()
        .enumerate()
        .map(|(index, (lat, lng))| {
            Listing::new(ListingId::new(index as u64), DealType::Sale, "성내동 55-3")
                .with_coordinate(Coordinate::new(*lat, *lng))
        })
        .collect()
}

proptest! {
    #[test]
    fn median_components_are_drawn_from_the_members(
        coordinates in proptest::collection::vec((37.0f64..38.0, 126.0f64..128.0), 1..8)
    ) {
        let listings = listings_with_coordinates(&coordinates);
        let clusters = group_listings(&listings);
        let median = clusters[0].median_stored_coordinate().expect("median");

        prop_assert!(coordinates.iter().any(|(lat, _)| *lat == median.lat));
        prop_assert!(coordinates.iter().any(|(_, lng)| *lng == median.lng));
    }

    #[test]
    fn median_sits_within_the_member_range(
        coordinates in proptest::collection::vec((37.0f64..38.0, 126.0f64..128.0), 1..8)
    ) {
        let listings = listings_with_coordinates(&coordinates);
        let clusters = group_listings(&listings);
        let median = clusters[0].median_stored_coordinate().expect("median");

        let min_lat = coordinates.iter().map(|(lat, _)| *lat).fold(f64::INFINITY, f64::min);
        let max_lat = coordinates.iter().map(|(lat, _)| *lat).fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(median.lat >= min_lat && median.lat <= max_lat);
    }

    #[test]
    fn at_least_half_the_members_sit_at_or_above_the_median(
        coordinates in proptest::collection::vec((37.0f64..38.0, 126.0f64..128.0), 1..8)
    ) {
        let listings = listings_with_coordinates(&coordinates);
        let clusters = group_listings(&listings);
        let median = clusters[0].median_stored_coordinate().expect("median");

        let at_or_above = coordinates.iter().filter(|(lat, _)| *lat >= median.lat).count();
        prop_assert!(2 * at_or_above >= coordinates.len());
    }

    #[test]
    fn grouping_preserves_every_listing_exactly_once(
        addresses in proptest::collection::vec("[가-힣]{2,3}동 [1-9][0-9]{0,2}", 1..30)
    ) {
        let listings: Vec<Listing> = addresses
            .iter()
            .enumerate()
            .map(|(index, address)| {
                Listing::new(ListingId::new(index as u64), DealType::Lease, address.as_str())
            })
            .collect();
        let clusters = group_listings(&listings);

        let mut seen: Vec<u64> = clusters
            .values()
            .flat_map(|cluster| cluster.members().iter().map(|listing| listing.id.raw()))
            .collect();
        seen.sort_unstable();
        let expected: Vec<u64> = (0..listings.len() as u64).collect();
        prop_assert_eq!(seen, expected);
    }
}

#[test]
fn two_member_tie_prefers_the_lower_values() {
    let listings = listings_with_coordinates(&[(37.60, 127.20), (37.40, 127.10)]);
    let clusters = group_listings(&listings);
    let median = clusters[0].median_stored_coordinate().expect("median");
    assert_abs_diff_eq!(median.lat, 37.40, epsilon = 1e-12);
    assert_abs_diff_eq!(median.lng, 127.10, epsilon = 1e-12);
}
