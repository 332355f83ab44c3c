//! Custom price overrides keyed by inventory row id

use crate::collection::Collection;
use crate::error::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Price table persisted as `{ "row id": dollars }`
#[derive(Debug, Default)]
pub struct PriceOverrides {
    path: PathBuf,
    prices: BTreeMap<String, f64>,
}

impl PriceOverrides {
    /// Load the table; a missing or corrupt file gives an empty table
    pub fn load(path: &Path) -> Self {
        let mut overrides = Self {
            path: path.to_path_buf(),
            prices: BTreeMap::new(),
        };
        if !path.exists() {
            return overrides;
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(prices) => {
                    overrides.prices = prices;
                    log::debug!("Loaded {} custom prices", overrides.prices.len());
                }
                Err(e) => log::warn!("Could not load custom prices: {}", e),
            },
            Err(e) => log::warn!("Could not read custom prices: {}", e),
        }
        overrides
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.prices)?)?;
        Ok(())
    }

    pub fn set(&mut self, row_id: &str, dollars: f64) {
        self.prices.insert(row_id.to_string(), dollars);
    }

    pub fn get_cents(&self, row_id: &str) -> Option<i64> {
        self.prices.get(row_id).map(|dollars| dollars_to_cents(*dollars))
    }

    /// Attach overrides to matching cards, returns how many matched
    pub fn apply(&self, collection: &mut Collection) -> usize {
        let mut applied = 0;
        for card in &mut collection.cards {
            if let Some(cents) = self.get_cents(&card.id) {
                card.custom_price_cents = Some(cents);
                applied += 1;
            }
        }
        applied
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

pub fn dollars_to_cents(dollars: f64) -> i64 {
    (dollars * 100.0).round() as i64
}
