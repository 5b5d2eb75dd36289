use std::rc::Rc;

use parcel_map::core::{Coordinate, DealType, Listing, ListingId, group_listings};
use parcel_map::geocode::{GeocodeResolver, ResolverConfig, SessionGeocodeCache, TableGeocoder};

fn listing(id: u64, address: &str) -> Listing {
    Listing::new(ListingId::new(id), DealType::Sale, address)
}

#[test]
fn listings_sharing_a_key_form_exactly_one_cluster() {
    let listings = vec![
        listing(1, "천호동 166-82 301호"),
        listing(2, "천호동 166-82 402호"),
    ];
    let clusters = group_listings(&listings);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].len(), 2);
}

#[test]
fn every_listing_lands_in_exactly_one_cluster() {
    let listings = vec![
        listing(1, "성내동 55-3"),
        listing(2, "천호동 166-82"),
        listing(3, "성내동 55-3 2층"),
        listing(4, "둔촌동 530"),
    ];
    let clusters = group_listings(&listings);
    let total: usize = clusters.values().map(parcel_map::core::Cluster::len).sum();
    assert_eq!(total, listings.len());
    assert_eq!(clusters.len(), 3);
}

#[test]
fn median_of_single_member_is_its_coordinate() {
    let listings = vec![listing(1, "천호동 166-82").with_coordinate(Coordinate::new(37.538, 127.124))];
    let clusters = group_listings(&listings);
    let median = clusters[0].median_stored_coordinate().expect("median");
    assert_eq!(median, Coordinate::new(37.538, 127.124));
}

#[test]
fn even_member_count_resolves_to_lower_middle() {
    let listings = vec![
        listing(1, "둔촌동 530").with_coordinate(Coordinate::new(37.54, 127.12)),
        listing(2, "둔촌동 530").with_coordinate(Coordinate::new(37.52, 127.14)),
    ];
    let clusters = group_listings(&listings);
    let median = clusters[0].median_stored_coordinate().expect("median");
    // Components rank independently; each takes its own lower middle.
    assert_eq!(median, Coordinate::new(37.52, 127.12));
}

#[test]
fn three_member_median_shrugs_off_one_wild_point() {
    let listings = vec![
        listing(1, "성내동 55-3").with_coordinate(Coordinate::new(37.530, 127.120)),
        listing(2, "성내동 55-3").with_coordinate(Coordinate::new(37.531, 127.121)),
        // Fat-fingered pin on the other side of the country.
        listing(3, "성내동 55-3").with_coordinate(Coordinate::new(35.100, 129.000)),
    ];
    let clusters = group_listings(&listings);
    let median = clusters[0].median_stored_coordinate().expect("median");
    assert_eq!(median, Coordinate::new(37.530, 127.121));
}

#[test]
fn mixed_cluster_prefers_stored_coordinates_over_geocoding() {
    let cache = Rc::new(SessionGeocodeCache::new());
    let resolver = GeocodeResolver::new(Rc::clone(&cache), ResolverConfig::default());

    let listings = vec![
        listing(1, "천호동 166-82").with_coordinate(Coordinate::new(37.538, 127.124)),
        listing(2, "천호동 166-82 302호"),
    ];
    let clusters = group_listings(&listings);
    let representative =
        pollster::block_on(clusters[0].resolve_representative(&resolver)).expect("representative");
    // No provider registered, so reaching one would have returned None.
    assert_eq!(representative, Coordinate::new(37.538, 127.124));
}

#[test]
fn coordinate_free_cluster_geocodes_the_detailed_member() {
    let cache = Rc::new(SessionGeocodeCache::new());
    let table = TableGeocoder::new().with_entry("성내동 55-3", Coordinate::new(37.53, 127.12));
    let resolver = GeocodeResolver::new(Rc::clone(&cache), ResolverConfig::default())
        .with_client_provider(Rc::new(table));

    let listings = vec![
        listing(1, "성내동 55-3"),
        listing(2, "성내동 55-3").with_address_detail("지층 101호"),
    ];
    let clusters = group_listings(&listings);
    assert_eq!(clusters[0].candidate_address(), "성내동 55-3 지층 101호");

    let representative =
        pollster::block_on(clusters[0].resolve_representative(&resolver)).expect("representative");
    assert_eq!(representative, Coordinate::new(37.53, 127.12));
}

#[test]
fn unresolvable_cluster_yields_none() {
    let cache = Rc::new(SessionGeocodeCache::new());
    let resolver = GeocodeResolver::new(Rc::clone(&cache), ResolverConfig::default());

    let listings = vec![listing(1, "어디인지 모름")];
    let clusters = group_listings(&listings);
    assert!(pollster::block_on(clusters[0].resolve_representative(&resolver)).is_none());
}
