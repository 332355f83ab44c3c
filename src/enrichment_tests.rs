//! Tests for card enrichment.

use std::time::Duration;

use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::models::test_card;

/// Server whose set catalog is down, so the static set table is used
async fn server_with_fallback_sets() -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/en/sets"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    mock_server
}

fn client_for(server: &MockServer) -> TcgdexClient {
    TcgdexClient::with_base_url(&server.uri(), "en", Duration::from_secs(5)).unwrap()
}

fn card_json(id: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "image": format!("https://assets.tcgdex.net/en/sv/{id}"),
        "hp": 60,
        "types": ["Lightning"],
        "rarity": "Common"
    })
}

async fn mount_card(server: &MockServer, id: &str, name: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/en/cards/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(card_json(id, name)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ==================== Single card policy ====================

#[tokio::test]
async fn test_found_applies_image_and_stats() {
    let server = server_with_fallback_sets().await;
    mount_card(&server, "sv09-007", "Pikachu", 1).await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    let mut card = test_card("1", "Pikachu - 7/159", "Pokemon Journey Together");
    assert_eq!(enricher.enrich(&mut card).await, EnrichmentOutcome::Found);
    assert_eq!(card.api_id.as_deref(), Some("sv09-007"));
    assert_eq!(
        card.image_url.as_deref(),
        Some("https://assets.tcgdex.net/en/sv/sv09-007/high.png")
    );
    assert_eq!(card.stats.as_ref().and_then(|s| s.hp), Some(60));
}

#[tokio::test]
async fn test_already_enriched_makes_no_call() {
    let server = server_with_fallback_sets().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/en/cards/.*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    let mut card = test_card("1", "Pikachu - 7/159", "Journey Together");
    card.image_url = Some("https://example.com/pikachu.png".to_string());
    assert_eq!(enricher.enrich(&mut card).await, EnrichmentOutcome::Found);
    assert_eq!(card.image_url.as_deref(), Some("https://example.com/pikachu.png"));
}

#[tokio::test]
async fn test_basic_energy_is_skipped_without_lookup() {
    let server = server_with_fallback_sets().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/en/cards/.*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    for set_name in ["Journey Together", "Surging Sparks", "Unknown"] {
        let mut card = test_card("1", "Basic Energy - 1/159", set_name);
        assert_eq!(enricher.enrich(&mut card).await, EnrichmentOutcome::Skipped);
        assert!(card.image_url.is_none());
    }

    let mut card = test_card("2", "BASIC Fire ENERGY #3", "Journey Together");
    assert_eq!(enricher.enrich(&mut card).await, EnrichmentOutcome::Skipped);
}

#[tokio::test]
async fn test_energy_set_is_skipped() {
    let server = server_with_fallback_sets().await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    let mut card = test_card("1", "Fire #3", "Scarlet & Violet Energy");
    assert_eq!(enricher.enrich(&mut card).await, EnrichmentOutcome::Skipped);
}

#[tokio::test]
async fn test_unresolved_set_is_not_found() {
    let server = server_with_fallback_sets().await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    let mut card = test_card("1", "Charizard - 4/102", "Base Set Unlimited");
    assert_eq!(enricher.enrich(&mut card).await, EnrichmentOutcome::NotFound);
}

#[tokio::test]
async fn test_missing_card_number_is_not_found() {
    let server = server_with_fallback_sets().await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    let mut card = test_card("1", "Pikachu", "Journey Together");
    assert_eq!(enricher.enrich(&mut card).await, EnrichmentOutcome::NotFound);
}

#[tokio::test]
async fn test_name_mismatch_is_not_applied() {
    let server = server_with_fallback_sets().await;
    mount_card(&server, "sv09-007", "Charmander", 1).await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    let mut card = test_card("1", "Pikachu - 7/159", "Journey Together");
    assert_eq!(enricher.enrich(&mut card).await, EnrichmentOutcome::NotFound);
    assert!(card.image_url.is_none());
    assert!(card.api_id.is_none());
    assert!(card.stats.is_none());
}

#[tokio::test]
async fn test_name_check_is_case_insensitive() {
    let server = server_with_fallback_sets().await;
    mount_card(&server, "sv09-007", "Team Rocket's Pikachu", 1).await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    let mut card = test_card("1", "PIKACHU - 7/159", "Journey Together");
    assert_eq!(enricher.enrich(&mut card).await, EnrichmentOutcome::Found);
}

#[tokio::test]
async fn test_lookup_404_is_not_found() {
    let server = server_with_fallback_sets().await;
    Mock::given(method("GET"))
        .and(path("/en/cards/sv09-200"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    let mut card = test_card("1", "Pikachu - 200/159", "Journey Together");
    assert_eq!(enricher.enrich(&mut card).await, EnrichmentOutcome::NotFound);
}

#[tokio::test]
async fn test_lookup_errors_degrade_to_not_found() {
    let server = server_with_fallback_sets().await;
    Mock::given(method("GET"))
        .and(path("/en/cards/sv09-001"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/en/cards/sv09-002"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    let mut broken = test_card("1", "Pikachu - 1/159", "Journey Together");
    let mut malformed = test_card("2", "Raichu - 2/159", "Journey Together");
    assert_eq!(enricher.enrich(&mut broken).await, EnrichmentOutcome::NotFound);
    assert_eq!(enricher.enrich(&mut malformed).await, EnrichmentOutcome::NotFound);
}

#[tokio::test]
async fn test_non_numeric_number_used_verbatim() {
    let server = server_with_fallback_sets().await;
    mount_card(&server, "sv08.5-TG01", "Umbreon ex", 1).await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    let mut card = test_card("1", "Umbreon ex #TG01", "Prismatic Evolutions");
    assert_eq!(enricher.enrich(&mut card).await, EnrichmentOutcome::Found);
    assert_eq!(card.api_id.as_deref(), Some("sv08.5-TG01"));
}

// ==================== Result cache ====================

#[tokio::test]
async fn test_same_identity_fetched_once() {
    let server = server_with_fallback_sets().await;
    mount_card(&server, "sv09-007", "Pikachu", 1).await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    let mut first = test_card("1", "Pikachu - 7/159", "Journey Together");
    let mut second = test_card("2", "Pikachu - 007/159", "Pokémon Journey Together");
    assert_eq!(enricher.enrich(&mut first).await, EnrichmentOutcome::Found);
    assert_eq!(enricher.enrich(&mut second).await, EnrichmentOutcome::Found);
    assert_eq!(first.image_url, second.image_url);
}

#[tokio::test]
async fn test_concurrent_same_identity_fetched_once() {
    let server = server_with_fallback_sets().await;
    Mock::given(method("GET"))
        .and(path("/en/cards/sv09-007"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(card_json("sv09-007", "Pikachu"))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    let mut cards = vec![
        test_card("1", "Pikachu - 7/159", "Journey Together"),
        test_card("2", "Pikachu - 7/159", "Journey Together"),
        test_card("3", "Pikachu - 7/159", "Journey Together"),
    ];
    let summary = enricher.enrich_many(cards.iter_mut()).await;
    assert_eq!(summary.found, 3);
    assert!(cards.iter().all(|c| c.image_url.is_some()));
}

#[tokio::test]
async fn test_cached_payload_applies_without_name_check() {
    let server = server_with_fallback_sets().await;
    mount_card(&server, "sv09-007", "Pikachu", 1).await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    let mut pikachu = test_card("1", "Pikachu - 7/159", "Journey Together");
    let mut raichu = test_card("2", "Raichu - 7/159", "Journey Together");
    assert_eq!(enricher.enrich(&mut pikachu).await, EnrichmentOutcome::Found);
    assert_eq!(enricher.enrich(&mut raichu).await, EnrichmentOutcome::Found);
    assert_eq!(raichu.api_id.as_deref(), Some("sv09-007"));
    assert_eq!(raichu.image_url, pikachu.image_url);
}

#[tokio::test]
async fn test_name_mismatch_is_not_cached() {
    let server = server_with_fallback_sets().await;
    mount_card(&server, "sv09-007", "Pikachu", 2).await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    let mut raichu = test_card("1", "Raichu - 7/159", "Journey Together");
    let mut pikachu = test_card("2", "Pikachu - 7/159", "Journey Together");
    assert_eq!(enricher.enrich(&mut raichu).await, EnrichmentOutcome::NotFound);
    assert!(raichu.image_url.is_none());
    assert_eq!(enricher.enrich(&mut pikachu).await, EnrichmentOutcome::Found);
    assert!(pikachu.image_url.is_some());
}

#[tokio::test]
async fn test_failed_lookup_is_retried() {
    let server = server_with_fallback_sets().await;
    Mock::given(method("GET"))
        .and(path("/en/cards/sv09-007"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_card(&server, "sv09-007", "Pikachu", 1).await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    let mut first = test_card("1", "Pikachu - 7/159", "Journey Together");
    let mut second = test_card("2", "Pikachu - 7/159", "Journey Together");
    assert_eq!(enricher.enrich(&mut first).await, EnrichmentOutcome::NotFound);
    assert_eq!(enricher.enrich(&mut second).await, EnrichmentOutcome::Found);
    assert!(second.image_url.is_some());
}

#[tokio::test]
async fn test_not_found_is_retried() {
    let server = server_with_fallback_sets().await;
    Mock::given(method("GET"))
        .and(path("/en/cards/sv09-200"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 4);

    for id in ["1", "2"] {
        let mut card = test_card(id, "Pikachu - 200/159", "Journey Together");
        assert_eq!(enricher.enrich(&mut card).await, EnrichmentOutcome::NotFound);
    }
}

// ==================== Concurrency limit ====================

/// Enrich three distinct cards, each answered after 200ms
async fn timed_batch(max_concurrent: usize) -> (EnrichmentSummary, Duration) {
    let server = server_with_fallback_sets().await;
    for (id, name) in [
        ("sv09-001", "Bulbasaur"),
        ("sv09-002", "Ivysaur"),
        ("sv09-003", "Venusaur"),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/en/cards/{id}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(card_json(id, name))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    // Load the set table before timing
    sets.get_mapping().await;
    let enricher = Enricher::new(&client, &sets, max_concurrent);

    let mut cards = vec![
        test_card("1", "Bulbasaur - 1/159", "Journey Together"),
        test_card("2", "Ivysaur - 2/159", "Journey Together"),
        test_card("3", "Venusaur - 3/159", "Journey Together"),
    ];
    let started = std::time::Instant::now();
    let summary = enricher.enrich_many(cards.iter_mut()).await;
    (summary, started.elapsed())
}

#[tokio::test]
async fn test_single_permit_serializes_lookups() {
    let (summary, elapsed) = timed_batch(1).await;
    assert_eq!(summary.found, 3);
    assert!(elapsed >= Duration::from_millis(600), "took {elapsed:?}");
}

#[tokio::test]
async fn test_enough_permits_run_lookups_together() {
    let (summary, elapsed) = timed_batch(3).await;
    assert_eq!(summary.found, 3);
    assert!(elapsed < Duration::from_millis(550), "took {elapsed:?}");
}

// ==================== Batch ====================

#[tokio::test]
async fn test_enrich_many_counts_and_reports_in_order() {
    let server = server_with_fallback_sets().await;
    mount_card(&server, "sv09-001", "Bulbasaur", 1).await;
    mount_card(&server, "sv09-004", "Charmander", 1).await;
    Mock::given(method("GET"))
        .and(path("/en/cards/sv09-099"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, 2);

    let mut cards = vec![
        test_card("1", "Bulbasaur - 1/159", "Journey Together"),
        test_card("2", "Basic Grass Energy", "Journey Together"),
        test_card("3", "Mewtwo - 99/159", "Journey Together"),
        test_card("4", "Charmander - 4/159", "Journey Together"),
        test_card("5", "Ditto - 132/165", "Some Unknown Set"),
    ];

    let summary = enricher.enrich_many(cards.iter_mut()).await;
    assert_eq!(summary.found, 2);
    assert_eq!(summary.not_found, 3);

    let names: Vec<&str> = summary
        .not_found_cards
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["Basic Grass Energy", "Mewtwo", "Ditto"]);
    assert_eq!(summary.not_found_cards[1].set_name, "Journey Together");
    assert_eq!(summary.not_found_cards[1].number, "99");

    assert!(cards[0].image_url.is_some());
    assert!(cards[3].image_url.is_some());
}

#[tokio::test]
async fn test_enrich_many_empty_batch() {
    let server = server_with_fallback_sets().await;
    let client = client_for(&server);
    let sets = SetMappingCache::new(client.clone());
    let enricher = Enricher::new(&client, &sets, DEFAULT_MAX_CONCURRENT);

    let mut cards: Vec<CardRecord> = Vec::new();
    let summary = enricher.enrich_many(cards.iter_mut()).await;
    assert_eq!(summary, EnrichmentSummary::default());
}

// ==================== names_match ====================

#[test]
fn test_names_match() {
    assert!(names_match("Pikachu ex", "Pikachu ex"));
    assert!(names_match("pikachu", "Ash's PIKACHU"));
    assert!(!names_match("Pikachu", "Raichu"));
    assert!(!names_match("", "Pikachu"));
}
