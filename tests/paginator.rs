mod common;

use std::time::{Duration, Instant};

use assert_matches::assert_matches;

use common::{ScriptedTransport, numbered_page, observation, page, query_value};
use inat_harvest::config::FetchConfig;
use inat_harvest::domain::{Coordinate, Radius};
use inat_harvest::fetcher::{ResilientFetcher, RetryPolicy};
use inat_harvest::paginator::{ObservationApi, Termination};

const BASE: &str = "https://api.test/v1";
const LISTING: &str = "https://api.test/v1/observations";

fn fetch_config(per_page: u32) -> FetchConfig {
    let mut config = FetchConfig::new(
        Coordinate::new(-8.13, 115.36).unwrap(),
        Radius::from_miles(5.0).unwrap(),
    );
    config.per_page = per_page;
    config
}

fn api<'a, 't>(
    fetcher: &'a ResilientFetcher<&'t ScriptedTransport>,
) -> ObservationApi<'a, &'t ScriptedTransport> {
    ObservationApi::new(fetcher)
        .with_base_url(BASE)
        .with_pacing(Duration::ZERO)
}

#[test]
fn short_page_ends_collection() {
    let transport = ScriptedTransport::new();
    transport.json(LISTING, &numbered_page(1, 200));
    transport.json(LISTING, &numbered_page(201, 200));
    transport.json(LISTING, &numbered_page(401, 150));
    let fetcher = ResilientFetcher::new(&transport, RetryPolicy::immediate());
    let api = api(&fetcher);

    let mut pages = api.paginate(&fetch_config(200));
    let records: Vec<_> = pages.by_ref().collect();

    assert_eq!(records.len(), 550);
    assert_eq!(pages.pages_requested(), 3);
    assert_eq!(pages.termination(), Some(&Termination::Exhausted));
    assert_eq!(transport.calls_to(LISTING), 3);
}

#[test]
fn empty_page_ends_collection() {
    let transport = ScriptedTransport::new();
    transport.json(LISTING, &numbered_page(1, 2));
    transport.json(LISTING, &numbered_page(3, 2));
    transport.json(LISTING, &page(Vec::new()));
    let fetcher = ResilientFetcher::new(&transport, RetryPolicy::immediate());
    let api = api(&fetcher);

    let mut pages = api.paginate(&fetch_config(2));
    assert_eq!(pages.by_ref().count(), 4);
    assert_eq!(pages.pages_requested(), 3);
}

#[test]
fn failed_page_keeps_earlier_results() {
    let transport = ScriptedTransport::new();
    transport.json(LISTING, &numbered_page(1, 3));
    transport.status(LISTING, 500);
    transport.json(LISTING, &numbered_page(4, 3));
    let fetcher = ResilientFetcher::new(&transport, RetryPolicy::immediate());
    let api = api(&fetcher);

    let mut pages = api.paginate(&fetch_config(3));
    let records: Vec<_> = pages.by_ref().collect();

    assert_eq!(records.len(), 3);
    assert_matches!(pages.termination(), Some(Termination::Aborted(_)));
    assert_eq!(transport.calls_to(LISTING), 2);
}

#[test]
fn malformed_page_aborts() {
    let transport = ScriptedTransport::new();
    transport.ok(LISTING, b"<html>maintenance</html>".to_vec());
    let fetcher = ResilientFetcher::new(&transport, RetryPolicy::immediate());
    let api = api(&fetcher);

    let mut pages = api.paginate(&fetch_config(200));
    assert_eq!(pages.next(), None);
    assert_matches!(pages.termination(), Some(Termination::Aborted(_)));
}

#[test]
fn stopping_early_requests_no_more_pages() {
    let transport = ScriptedTransport::new();
    transport.json(LISTING, &numbered_page(1, 5));
    transport.json(LISTING, &numbered_page(6, 5));
    let fetcher = ResilientFetcher::new(&transport, RetryPolicy::immediate());
    let api = api(&fetcher);

    let mut pages = api.paginate(&fetch_config(5));
    let records: Vec<_> = pages.by_ref().take(3).collect();

    assert_eq!(records.len(), 3);
    assert_eq!(pages.pages_requested(), 1);
    assert_eq!(pages.termination(), None);
}

#[test]
fn page_query_carries_location_and_order() {
    let transport = ScriptedTransport::new();
    transport.json(LISTING, &numbered_page(1, 1));
    transport.json(LISTING, &page(Vec::new()));
    let fetcher = ResilientFetcher::new(&transport, RetryPolicy::immediate());
    let api = api(&fetcher);

    let _ = api.paginate(&fetch_config(1)).count();

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    let (_, first) = &calls[0];
    assert_eq!(query_value(first, "page"), Some("1"));
    assert_eq!(query_value(first, "per_page"), Some("1"));
    assert_eq!(query_value(first, "lat"), Some("-8.13"));
    assert_eq!(query_value(first, "lng"), Some("115.36"));
    assert_eq!(query_value(first, "has_photos"), Some("true"));
    assert_eq!(query_value(first, "order_by"), Some("created_at"));
    assert_eq!(query_value(first, "order"), Some("desc"));
    let radius: f64 = query_value(first, "radius").unwrap().parse().unwrap();
    assert!((radius - 8.0467).abs() < 1e-9);
    assert_eq!(query_value(&calls[1].1, "page"), Some("2"));
}

#[test]
fn observation_details_returns_first_result() {
    let transport = ScriptedTransport::new();
    transport.json(
        "https://api.test/v1/observations/42",
        &page(vec![observation(42, "Ficus benjamina", &[7])]),
    );
    let fetcher = ResilientFetcher::new(&transport, RetryPolicy::immediate());

    let details = api(&fetcher).observation_details(42).unwrap().unwrap();
    assert_eq!(details["id"], 42);

    let missing = api(&fetcher).observation_details(43);
    assert!(missing.is_err());
}

#[test]
fn pages_after_the_first_are_paced() {
    let pacing = Duration::from_millis(20);
    let transport = ScriptedTransport::new();
    transport.json(LISTING, &numbered_page(1, 2));
    transport.json(LISTING, &numbered_page(3, 2));
    transport.json(LISTING, &numbered_page(5, 1));
    let fetcher = ResilientFetcher::new(&transport, RetryPolicy::immediate());
    let api = ObservationApi::new(&fetcher)
        .with_base_url(BASE)
        .with_pacing(pacing);

    let start = Instant::now();
    let count = api.paginate(&fetch_config(2)).count();

    assert_eq!(count, 5);
    assert!(start.elapsed() >= pacing * 2);
}

#[test]
fn first_page_is_not_delayed() {
    let pacing = Duration::from_millis(500);
    let transport = ScriptedTransport::new();
    transport.json(LISTING, &numbered_page(1, 1));
    let fetcher = ResilientFetcher::new(&transport, RetryPolicy::immediate());
    let api = ObservationApi::new(&fetcher)
        .with_base_url(BASE)
        .with_pacing(pacing);

    let start = Instant::now();
    let count = api.paginate(&fetch_config(2)).count();

    assert_eq!(count, 1);
    assert!(start.elapsed() < pacing);
}
