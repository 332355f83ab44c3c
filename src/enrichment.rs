//! Card enrichment from TCGdex
//!
//! Looks cards up by exact identity (set id + card number) only. There is no
//! name search fallback, so a card either gets its own image or none.

use crate::api::{TcgdexCard, TcgdexClient};
use crate::error::CatalogError;
use crate::models::{CardIdentity, CardRecord};
use crate::set_mapping::SetMappingCache;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, Semaphore};

/// Default cap on simultaneous card lookups
pub const DEFAULT_MAX_CONCURRENT: usize = 20;

/// Result of enriching one card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// Card carries database data (now or already before)
    Found,
    /// Card type has no database entry to look for (basic energy)
    Skipped,
    NotFound,
}

/// A card that could not be enriched, for the report
#[derive(Debug, Clone, PartialEq)]
pub struct NotFoundCard {
    pub name: String,
    pub set_name: String,
    pub number: String,
}

impl NotFoundCard {
    fn from_card(card: &CardRecord) -> Self {
        Self {
            name: card.card_name().to_string(),
            set_name: card.set_name.clone(),
            number: card.card_number().to_string(),
        }
    }
}

/// Batch totals. Skipped cards count as not found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentSummary {
    pub found: usize,
    pub not_found: usize,
    pub not_found_cards: Vec<NotFoundCard>,
}

type LookupSlot = Arc<OnceCell<TcgdexCard>>;

/// Why a lookup left its slot empty
enum LookupMiss {
    Absent,
    Mismatch(String),
    Failed(CatalogError),
}

/// Enriches cards with images and stats.
///
/// Only payloads that passed the name check are cached, per identity, for
/// the lifetime of the enricher. A cached payload is applied without
/// checking again. Misses and errors are not cached, so the next card with
/// the same identity fetches again. Concurrent requests for one identity
/// share a single network call.
pub struct Enricher<'a> {
    client: &'a TcgdexClient,
    sets: &'a SetMappingCache,
    lookups: Mutex<HashMap<CardIdentity, LookupSlot>>,
    permits: Semaphore,
}

impl<'a> Enricher<'a> {
    pub fn new(client: &'a TcgdexClient, sets: &'a SetMappingCache, max_concurrent: usize) -> Self {
        Self {
            client,
            sets,
            lookups: Mutex::new(HashMap::new()),
            permits: Semaphore::new(max_concurrent.max(1)),
        }
    }

    /// Enrich one card in place. Never fails: every error is `NotFound`.
    pub async fn enrich(&self, card: &mut CardRecord) -> EnrichmentOutcome {
        if card.is_enriched() {
            log::debug!("Skipping {}: already has image", card.card_name());
            return EnrichmentOutcome::Found;
        }

        let name = card.card_name().to_lowercase();
        if name.contains("basic") && name.contains("energy") {
            log::debug!("Skipping basic energy: {}", card.card_name());
            return EnrichmentOutcome::Skipped;
        }
        if card.set_name.to_lowercase().contains("energy") {
            log::debug!("Skipping energy set card: {}", card.card_name());
            return EnrichmentOutcome::Skipped;
        }

        let Some(identity) = self.identity_for(card).await else {
            log::debug!("Cannot determine card ID for {}", card.card_name());
            return EnrichmentOutcome::NotFound;
        };

        let Some(tcg_card) = self.lookup(&identity, card.card_name()).await else {
            return EnrichmentOutcome::NotFound;
        };

        apply(card, &identity, &tcg_card);
        log::info!("Card enriched: {} -> {}", identity, card.card_name());
        EnrichmentOutcome::Found
    }

    /// Enrich a batch. Input order is kept in the not-found list.
    pub async fn enrich_many<'c, I>(&self, cards: I) -> EnrichmentSummary
    where
        I: IntoIterator<Item = &'c mut CardRecord>,
    {
        let cards: Vec<&mut CardRecord> = cards.into_iter().collect();
        let total = cards.len();
        log::info!("Enriching {} cards", total);

        let outcomes = join_all(cards.into_iter().map(|card| async move {
            let outcome = self.enrich(card).await;
            (outcome, card)
        }))
        .await;

        let mut summary = EnrichmentSummary::default();
        for (outcome, card) in outcomes {
            match outcome {
                EnrichmentOutcome::Found => summary.found += 1,
                EnrichmentOutcome::Skipped | EnrichmentOutcome::NotFound => {
                    summary.not_found += 1;
                    summary.not_found_cards.push(NotFoundCard::from_card(card));
                }
            }
        }

        log::info!(
            "Enrichment complete: {} found, {} not found",
            summary.found,
            summary.not_found
        );
        summary
    }

    async fn identity_for(&self, card: &CardRecord) -> Option<CardIdentity> {
        let number = card.card_number();
        if number.is_empty() {
            return None;
        }
        let set_id = self.sets.resolve_set_id(&card.set_name).await?;
        Some(CardIdentity::new(&set_id, number))
    }

    /// Cached, single-flight lookup by identity
    async fn lookup(&self, identity: &CardIdentity, card_name: &str) -> Option<TcgdexCard> {
        let slot = {
            let mut lookups = self.lookups.lock().await;
            Arc::clone(lookups.entry(identity.clone()).or_default())
        };

        if let Some(cached) = slot.get() {
            log::debug!("Cache hit: {}", identity);
            return Some(cached.clone());
        }

        match slot
            .get_or_try_init(|| self.fetch_matching(identity, card_name))
            .await
        {
            Ok(tcg_card) => Some(tcg_card.clone()),
            Err(LookupMiss::Absent) => {
                log::debug!("Card not found: {}", identity);
                None
            }
            Err(LookupMiss::Mismatch(tcg_name)) => {
                log::debug!("Name mismatch: {} != {}, skipping", card_name, tcg_name);
                None
            }
            Err(LookupMiss::Failed(e)) => {
                log::debug!("Error fetching {}: {}", identity, e);
                None
            }
        }
    }

    async fn fetch_matching(
        &self,
        identity: &CardIdentity,
        card_name: &str,
    ) -> Result<TcgdexCard, LookupMiss> {
        let Ok(_permit) = self.permits.acquire().await else {
            return Err(LookupMiss::Absent);
        };
        log::debug!("Fetching {} from TCGdex...", identity);
        match self.client.fetch_card(identity.as_str()).await {
            Ok(Some(tcg_card)) if names_match(card_name, &tcg_card.name) => Ok(tcg_card),
            Ok(Some(tcg_card)) => Err(LookupMiss::Mismatch(tcg_card.name)),
            Ok(None) => Err(LookupMiss::Absent),
            Err(e) => Err(LookupMiss::Failed(e)),
        }
    }
}

/// First word of the inventory name must appear in the database name
fn names_match(card_name: &str, tcg_name: &str) -> bool {
    match card_name.split_whitespace().next() {
        Some(first) => tcg_name.to_lowercase().contains(&first.to_lowercase()),
        None => false,
    }
}

fn apply(card: &mut CardRecord, identity: &CardIdentity, tcg_card: &TcgdexCard) {
    card.api_id = Some(identity.to_string());
    if let Some(url) = tcg_card.high_res_image_url() {
        card.image_url = Some(url);
    }
    card.stats = Some(tcg_card.stats());
}

#[cfg(test)]
#[path = "enrichment_tests.rs"]
mod tests;
