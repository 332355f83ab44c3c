//! Set name to TCGdex set id resolution
//!
//! The mapping is keyed by [`normalize`]d set names and keeps insertion
//! order: partial matches return the first entry in load order, so the
//! catalog's ordering (main releases before reprints and promos) decides
//! ambiguous names.

use crate::api::{SetSummary, TcgdexClient};
use crate::normalize::normalize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Used when the live catalog cannot be fetched
const FALLBACK_SETS: &[(&str, &str)] = &[
    ("Scarlet & Violet", "sv01"),
    ("Paldea Evolved", "sv02"),
    ("Obsidian Flames", "sv03"),
    ("151", "sv03.5"),
    ("Paradox Rift", "sv04"),
    ("Paldean Fates", "sv04.5"),
    ("Temporal Forces", "sv05"),
    ("Twilight Masquerade", "sv06"),
    ("Shrouded Fable", "sv06.5"),
    ("Stellar Crown", "sv07"),
    ("Surging Sparks", "sv08"),
    ("Prismatic Evolutions", "sv08.5"),
    ("Journey Together", "sv09"),
    ("Destined Rivals", "sv10"),
    ("Black Bolt", "sv10.5b"),
    ("White Flare", "sv10.5w"),
    ("Phantasmal Flames", "me02"),
    ("Promo", "svp"),
    ("Black Star Promo", "svp"),
    ("SVP Black Star Promos", "svp"),
    ("Sword & Shield", "swsh01"),
    ("Rebel Clash", "swsh02"),
    ("Darkness Ablaze", "swsh03"),
    ("Champion's Path", "swsh03.5"),
    ("Vivid Voltage", "swsh04"),
    ("Shining Fates", "swsh04.5"),
    ("Battle Styles", "swsh05"),
    ("Chilling Reign", "swsh06"),
    ("Evolving Skies", "swsh07"),
    ("Fusion Strike", "swsh08"),
    ("Brilliant Stars", "swsh09"),
    ("Astral Radiance", "swsh10"),
    ("Pokemon Go", "pgo"),
    ("Lost Origin", "swsh11"),
    ("Silver Tempest", "swsh12"),
    ("Crown Zenith", "swsh12.5"),
];

/// Promo and collaboration sets the live catalog names differently or omits
const SET_ALIASES: &[(&str, &str)] = &[
    ("Promo", "svp"),
    ("Black Star Promo", "svp"),
    ("SVP Black Star Promos", "svp"),
    ("Scarlet & Violet Promos", "svp"),
    ("SWSH Black Star Promos", "swshp"),
    ("Pokemon Go", "pgo"),
    ("151", "sv03.5"),
];

const MAX_SET_ID_LEN: usize = 32;

/// Whether `id` looks like a TCGdex set id ("sv09", "sv10.5b", "swsh12.5")
pub fn is_valid_set_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SET_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// Insertion-ordered mapping of normalized set name -> set id
#[derive(Debug, Clone, Default)]
pub struct SetMapping {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
    /// Set id -> first display name seen for it
    display_names: HashMap<String, String>,
}

impl SetMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `display name -> id` pair. The first writer of a normalized
    /// key wins; empty names, empty keys and malformed ids are ignored.
    /// Returns true when the key was inserted.
    pub fn insert(&mut self, display_name: &str, id: &str) -> bool {
        let id = id.trim();
        if display_name.trim().is_empty() || !is_valid_set_id(id) {
            return false;
        }
        let key = normalize(display_name);
        if key.is_empty() {
            return false;
        }

        self.display_names
            .entry(id.to_string())
            .or_insert_with(|| display_name.trim().to_string());

        if self.index.contains_key(&key) {
            log::debug!(
                "Set name collision for '{}' ({}), keeping {}",
                key,
                id,
                self.entries[self.index[&key]].1
            );
            return false;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, id.to_string()));
        true
    }

    /// Build from the live set catalog
    pub fn from_catalog(sets: &[SetSummary]) -> Self {
        let mut mapping = Self::new();
        for set in sets {
            mapping.insert(&set.name, &set.id);
        }
        mapping
    }

    /// Build from the embedded static table
    pub fn fallback() -> Self {
        let mut mapping = Self::new();
        for (name, id) in FALLBACK_SETS {
            mapping.insert(name, id);
        }
        mapping
    }

    /// Merge the hand-maintained aliases without overwriting existing keys
    pub fn merge_aliases(&mut self) -> usize {
        SET_ALIASES
            .iter()
            .filter(|(name, id)| self.insert(name, id))
            .count()
    }

    /// Exact lookup by normalized key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&i| self.entries[i].1.as_str())
    }

    /// First display name seen for a set id
    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.display_names.get(id).map(String::as_str)
    }

    /// Id -> display name table
    pub fn reverse(&self) -> &HashMap<String, String> {
        &self.display_names
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve a raw set name to a set id.
///
/// Priority: exact normalized match, then the first key contained in the
/// input, then the first key containing the input. `None` is a normal
/// outcome for unknown sets and promos.
pub fn resolve_set_id(mapping: &SetMapping, raw_set_name: &str) -> Option<String> {
    let name = normalize(raw_set_name);
    if name.is_empty() {
        return None;
    }

    if let Some(id) = mapping.get(&name) {
        return Some(id.to_string());
    }

    if let Some((_, id)) = mapping.iter().find(|(key, _)| name.contains(key)) {
        return Some(id.to_string());
    }

    if let Some((_, id)) = mapping.iter().find(|(key, _)| key.contains(name.as_str())) {
        return Some(id.to_string());
    }

    log::debug!("No mapping found for set: {}", raw_set_name);
    None
}

/// Lazily loaded set mapping shared by every enrichment task.
///
/// Created once at startup and passed by reference. The first
/// [`get_mapping`](Self::get_mapping) loads; concurrent callers wait for that
/// load instead of starting their own. [`refresh`](Self::refresh) reloads.
pub struct SetMappingCache {
    client: TcgdexClient,
    mapping: Mutex<Option<Arc<SetMapping>>>,
}

impl SetMappingCache {
    pub fn new(client: TcgdexClient) -> Self {
        Self {
            client,
            mapping: Mutex::new(None),
        }
    }

    /// Current mapping, loading it on first use
    pub async fn get_mapping(&self) -> Arc<SetMapping> {
        let mut guard = self.mapping.lock().await;
        if let Some(ref mapping) = *guard {
            return Arc::clone(mapping);
        }
        let mapping = Arc::new(self.load().await);
        *guard = Some(Arc::clone(&mapping));
        mapping
    }

    /// Set id -> first display name
    pub async fn get_reverse_mapping(&self) -> HashMap<String, String> {
        self.get_mapping().await.reverse().clone()
    }

    /// Drop the loaded mapping and load again
    pub async fn refresh(&self) {
        let mut guard = self.mapping.lock().await;
        *guard = None;
        let mapping = self.load().await;
        *guard = Some(Arc::new(mapping));
    }

    /// Resolve a raw set name against the current mapping
    pub async fn resolve_set_id(&self, raw_set_name: &str) -> Option<String> {
        let mapping = self.get_mapping().await;
        resolve_set_id(&mapping, raw_set_name)
    }

    async fn load(&self) -> SetMapping {
        match self.client.fetch_sets().await {
            Ok(sets) => {
                let mut mapping = SetMapping::from_catalog(&sets);
                if mapping.is_empty() {
                    log::warn!("Set catalog was empty, using static set table");
                    return SetMapping::fallback();
                }
                let aliases = mapping.merge_aliases();
                log::info!(
                    "Loaded {} set mappings from TCGdex ({} aliases added)",
                    mapping.len(),
                    aliases
                );
                mapping
            }
            Err(e) => {
                log::warn!("Failed to fetch set catalog, using static set table: {}", e);
                SetMapping::fallback()
            }
        }
    }
}

#[cfg(test)]
#[path = "set_mapping_tests.rs"]
mod tests;
