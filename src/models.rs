use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    /// "Pikachu ex - 57/191" style numbering
    static ref NUMBERED_NAME: Regex = Regex::new(r"^(.+?)\s*-\s*(\d+)/\d+").unwrap();
}

/// Extended card statistics from the card database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardStats {
    pub hp: Option<u32>,
    #[serde(default)]
    pub types: Vec<String>,
    pub rarity: Option<String>,
    pub artist: Option<String>,
}

impl CardStats {
    /// Short one-line summary ("HP: 60 | Type: Lightning | Rarity: Common")
    pub fn summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(hp) = self.hp {
            parts.push(format!("HP: {hp}"));
        }
        if !self.types.is_empty() {
            parts.push(format!("Type: {}", self.types.join(", ")));
        }
        if let Some(ref rarity) = self.rarity {
            parts.push(format!("Rarity: {rarity}"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" | "))
        }
    }
}

/// A single inventory row
#[derive(Debug, Clone, PartialEq)]
pub struct CardRecord {
    /// Stable row id from the inventory export
    pub id: String,
    /// Raw display name, possibly carrying the card number
    pub product_name: String,
    /// Raw set name as written in the inventory
    pub set_name: String,
    pub price_in_cents: i64,
    pub condition: String,
    pub quantity: u32,
    pub date_entered: NaiveDateTime,
    pub sku: Option<String>,
    pub notes: Option<String>,

    /// Identity the card was found under in the card database
    pub api_id: Option<String>,
    /// High resolution image URL
    pub image_url: Option<String>,
    pub stats: Option<CardStats>,

    /// Price override from the custom price table
    pub custom_price_cents: Option<i64>,
}

impl CardRecord {
    /// Card number extracted from the display name, empty when absent
    pub fn card_number(&self) -> &str {
        if let Some(caps) = NUMBERED_NAME.captures(&self.product_name) {
            if let Some(number) = caps.get(2) {
                return number.as_str();
            }
        }
        match self.product_name.rsplit_once('#') {
            Some((_, number)) => number.trim(),
            None => "",
        }
    }

    /// Display name without the card number part
    pub fn card_name(&self) -> &str {
        if let Some(caps) = NUMBERED_NAME.captures(&self.product_name) {
            if let Some(name) = caps.get(1) {
                return name.as_str().trim();
            }
        }
        match self.product_name.split_once('#') {
            Some((name, _)) => name.trim(),
            None => &self.product_name,
        }
    }

    /// Effective unit price in cents (custom price wins)
    pub fn price_cents(&self) -> i64 {
        self.custom_price_cents.unwrap_or(self.price_in_cents)
    }

    /// Cards with duplicates are for sale
    pub fn is_saleable(&self) -> bool {
        self.quantity >= 2
    }

    /// Whether the card database has already filled in this card
    pub fn is_enriched(&self) -> bool {
        self.image_url.is_some()
    }
}

impl fmt::Display for CardRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) - {} x{}",
            self.product_name,
            self.set_name,
            format_cents(self.price_cents()),
            self.quantity
        )
    }
}

/// Composite lookup key: "{set_id}-{number}"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardIdentity(String);

impl CardIdentity {
    pub fn new(set_id: &str, raw_number: &str) -> Self {
        Self(format!("{}-{}", set_id, format_card_number(raw_number)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Zero-pad numeric card numbers to 3 digits, keep anything else verbatim
pub fn format_card_number(raw: &str) -> String {
    match raw.trim().parse::<u64>() {
        Ok(number) => format!("{number:03}"),
        Err(_) => raw.to_string(),
    }
}

/// A card offered for sale with the number of copies available
#[derive(Debug, Clone, PartialEq)]
pub struct SaleableCard {
    pub card: CardRecord,
    pub quantity_for_sale: u32,
}

impl SaleableCard {
    /// Value of all copies offered for sale
    pub fn total_value_cents(&self) -> i64 {
        self.card.price_cents() * self.quantity_for_sale as i64
    }
}

/// Format cents as dollars ("$10.00")
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
pub(crate) fn test_card(id: &str, product_name: &str, set_name: &str) -> CardRecord {
    CardRecord {
        id: id.to_string(),
        product_name: product_name.to_string(),
        set_name: set_name.to_string(),
        price_in_cents: 100,
        condition: "Normal wear".to_string(),
        quantity: 1,
        date_entered: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        sku: None,
        notes: None,
        api_id: None,
        image_url: None,
        stats: None,
        custom_price_cents: None,
    }
}
