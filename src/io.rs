//! Inventory CSV reading and re-export

use crate::collection::Collection;
use crate::error::Result;
use crate::models::CardRecord;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_CONDITION: &str = "Normal wear";

/// One raw inventory row, every field as exported
#[derive(Debug, Deserialize)]
struct InventoryRow {
    id: Option<String>,
    #[serde(rename = "product-name")]
    product_name: Option<String>,
    #[serde(rename = "console-name")]
    console_name: Option<String>,
    #[serde(rename = "price-in-pennies")]
    price_in_pennies: Option<String>,
    #[serde(rename = "condition-string")]
    condition: Option<String>,
    quantity: Option<String>,
    #[serde(rename = "date-entered")]
    date_entered: Option<String>,
    sku: Option<String>,
    notes: Option<String>,
}

/// Row layout written back on export
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: &'a str,
    #[serde(rename = "product-name")]
    product_name: &'a str,
    #[serde(rename = "console-name")]
    console_name: &'a str,
    #[serde(rename = "price-in-pennies")]
    price_in_pennies: i64,
    #[serde(rename = "include-string")]
    include_string: &'a str,
    #[serde(rename = "condition-string")]
    condition: &'a str,
    sku: &'a str,
    notes: &'a str,
    #[serde(rename = "cost-basis-in-pennies")]
    cost_basis_in_pennies: i64,
    quantity: u32,
    #[serde(rename = "date-entered")]
    date_entered: String,
    #[serde(rename = "grading-company")]
    grading_company: &'a str,
    #[serde(rename = "grading-cert-id")]
    grading_cert_id: &'a str,
    folder: &'a str,
}

/// Read the inventory CSV into a collection.
///
/// Rows that cannot be parsed are skipped with a warning.
pub fn read_collection<P: AsRef<Path>>(path: P) -> Result<Collection> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;

    let mut cards = Vec::new();

    for (index, result) in rdr.deserialize::<InventoryRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Skipping unreadable row {}: {}", index + 1, e);
                continue;
            }
        };
        let row_id = row.id.clone().unwrap_or_else(|| "unknown".to_string());
        match parse_row(row) {
            Ok(card) => cards.push(card),
            Err(reason) => log::warn!("Failed to parse row {}: {}", row_id, reason),
        }
    }

    log::info!("Loaded {} cards from {}", cards.len(), path.as_ref().display());
    Ok(Collection::new(cards))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_row(row: InventoryRow) -> std::result::Result<CardRecord, String> {
    let id = non_empty(row.id).ok_or("missing id")?;
    let product_name = non_empty(row.product_name).ok_or("missing product-name")?;
    let set_name = non_empty(row.console_name).ok_or("missing console-name")?;

    let price_in_cents = match non_empty(row.price_in_pennies) {
        Some(raw) => parse_integer(&raw).ok_or_else(|| format!("invalid price '{raw}'"))?,
        None => 0,
    };
    let quantity = match non_empty(row.quantity) {
        Some(raw) => parse_integer(&raw)
            .and_then(|q| u32::try_from(q).ok())
            .ok_or_else(|| format!("invalid quantity '{raw}'"))?,
        None => 1,
    };

    Ok(CardRecord {
        id,
        product_name,
        set_name,
        price_in_cents,
        condition: non_empty(row.condition).unwrap_or_else(|| DEFAULT_CONDITION.to_string()),
        quantity,
        date_entered: parse_date(row.date_entered.as_deref().unwrap_or_default()),
        sku: non_empty(row.sku),
        notes: non_empty(row.notes),
        api_id: None,
        image_url: None,
        stats: None,
        custom_price_cents: None,
    })
}

/// Integers, tolerating a "1500.0" style export
fn parse_integer(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

/// Parse a `YYYY-MM-DD` entry date, falling back to now
pub fn parse_date(raw: &str) -> NaiveDateTime {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => date.and_time(chrono::NaiveTime::MIN),
        Err(_) => Local::now().naive_local(),
    }
}

/// Write the collection back in the inventory CSV layout
pub fn write_collection<P: AsRef<Path>>(collection: &Collection, path: P) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path.as_ref())?;

    for card in &collection.cards {
        wtr.serialize(ExportRow {
            id: &card.id,
            product_name: &card.product_name,
            console_name: &card.set_name,
            price_in_pennies: card.price_in_cents,
            include_string: "Ungraded",
            condition: &card.condition,
            sku: card.sku.as_deref().unwrap_or_default(),
            notes: card.notes.as_deref().unwrap_or_default(),
            cost_basis_in_pennies: 0,
            quantity: card.quantity,
            date_entered: card.date_entered.format("%Y-%m-%d").to_string(),
            grading_company: "",
            grading_cert_id: "",
            folder: "",
        })?;
    }

    wtr.flush()?;
    log::info!(
        "Exported {} cards to {}",
        collection.len(),
        path.as_ref().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("1500"), Some(1500));
        assert_eq!(parse_integer("1500.0"), Some(1500));
        assert_eq!(parse_integer("15.5"), None);
        assert_eq!(parse_integer("abc"), None);
    }

    #[test]
    fn test_parse_date_valid() {
        let date = parse_date("2024-03-15");
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2024-03-15");
    }

    #[test]
    fn test_parse_date_invalid_defaults_to_now() {
        let before = Local::now().naive_local();
        let date = parse_date("15/03/2024");
        assert!(date >= before - chrono::Duration::seconds(1));
    }
}
