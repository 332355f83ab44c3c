use crate::collection::Collection;
use crate::config::StoreConfig;
use crate::enrichment::EnrichmentSummary;
use crate::error::Result;
use crate::models::{format_cents, CardRecord};
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};

const SET_COLUMN_WIDTH: usize = 30;
const CONFIG_VALUE_WIDTH: usize = 50;
const NOT_FOUND_PREVIEW: usize = 10;

/// Timestamp used in generated file names
pub fn file_timestamp(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%d_%H%M%S").to_string()
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Aligned card listing: name, set, quantity for sale, price, total
pub fn format_card_table(title: &str, cards: &[&CardRecord]) -> String {
    let rows: Vec<[String; 5]> = cards
        .iter()
        .map(|card| {
            let for_sale = if card.quantity >= 2 {
                card.quantity - 1
            } else {
                0
            };
            let total = card.price_cents() * for_sale as i64;
            [
                card.card_name().to_string(),
                card.set_name.chars().take(SET_COLUMN_WIDTH).collect(),
                if for_sale > 0 {
                    for_sale.to_string()
                } else {
                    "-".to_string()
                },
                format_cents(card.price_cents()),
                if total > 0 {
                    format_cents(total)
                } else {
                    "-".to_string()
                },
            ]
        })
        .collect();

    let headers = ["Name", "Set", "Qty", "Price", "Total"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = format!("{title}\n");
    output.push_str(&format!(
        "{:<w0$}  {:<w1$}  {:>w2$}  {:>w3$}  {:>w4$}\n",
        headers[0],
        headers[1],
        headers[2],
        headers[3],
        headers[4],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
        w4 = widths[4],
    ));
    let rule_len = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
    output.push_str(&"-".repeat(rule_len));
    output.push('\n');

    for row in &rows {
        output.push_str(&format!(
            "{:<w0$}  {:<w1$}  {:>w2$}  {:>w3$}  {:>w4$}\n",
            row[0],
            row[1],
            row[2],
            row[3],
            row[4],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
            w4 = widths[4],
        ));
    }
    output
}

/// Collection statistics followed by a per-set breakdown
pub fn format_stats(collection: &Collection) -> String {
    let saleable = collection.saleable_cards();
    let metrics = [
        (
            "Total unique cards",
            collection.total_unique_cards().to_string(),
        ),
        (
            "Total cards (with duplicates)",
            collection.total_cards().to_string(),
        ),
        ("Saleable cards (unique)", saleable.len().to_string()),
        (
            "Saleable cards (total copies)",
            collection.total_saleable_cards().to_string(),
        ),
        (
            "Total catalog value",
            format_cents(collection.total_saleable_value_cents()),
        ),
    ];
    let label_width = metrics.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

    let mut output = String::from("Collection Statistics\n");
    for (label, value) in &metrics {
        output.push_str(&format!("  {label:<label_width$}  {value}\n"));
    }

    let sets = collection.unique_sets();
    output.push_str(&format!("\nSets in collection: {}\n", sets.len()));
    for set_name in &sets {
        output.push_str(&format!(
            "  - {}: {} cards\n",
            set_name,
            collection.cards_by_set(set_name).len()
        ));
    }
    output
}

/// Every configuration value, long ones shortened
pub fn format_config(config: &StoreConfig, config_path: &Path) -> String {
    let mut output = String::from("Store Configuration\n");
    output.push_str(&format!("Config file: {}\n\n", config_path.display()));

    let key_width = StoreConfig::EDITABLE_KEYS
        .iter()
        .chain(std::iter::once(&"social_networks"))
        .map(|k| k.len())
        .max()
        .unwrap_or(0);
    for key in StoreConfig::EDITABLE_KEYS {
        let value = config.get(key).unwrap_or_default();
        output.push_str(&format!(
            "  {:<key_width$}  {}\n",
            key,
            truncate(value, CONFIG_VALUE_WIDTH)
        ));
    }
    output.push_str(&format!(
        "  {:<key_width$}  [{} networks]\n",
        "social_networks",
        config.social_networks.len()
    ));

    if !config.social_networks.is_empty() {
        output.push_str("\nSocial Networks:\n");
        output.push_str(&format_social_networks(config));
    }
    output
}

pub fn format_social_networks(config: &StoreConfig) -> String {
    config
        .social_networks
        .iter()
        .enumerate()
        .map(|(i, net)| format!("  {}. {}: {} ({})\n", i + 1, net.platform, net.handle, net.url))
        .collect()
}

/// Contents of the not-found log file
pub fn format_not_found_report(summary: &EnrichmentSummary, now: NaiveDateTime) -> String {
    let mut output = format!("Cards not found - {}\n", now.format("%Y-%m-%d %H:%M:%S"));
    output.push_str(&format!("Total: {}\n", summary.not_found));
    output.push_str(&"-".repeat(50));
    output.push_str("\n\n");
    for card in &summary.not_found_cards {
        output.push_str(&format!(
            "{} | {} | #{}\n",
            card.name, card.set_name, card.number
        ));
    }
    output
}

/// Console preview of the first few missing cards
pub fn format_not_found_preview(summary: &EnrichmentSummary, report_name: &str) -> String {
    let mut output = String::from("  Not found (first 10):\n");
    for card in summary.not_found_cards.iter().take(NOT_FOUND_PREVIEW) {
        output.push_str(&format!("    - {} ({})\n", card.name, card.set_name));
    }
    if summary.not_found_cards.len() > NOT_FOUND_PREVIEW {
        output.push_str(&format!(
            "    ... and {} more (see {})\n",
            summary.not_found_cards.len() - NOT_FOUND_PREVIEW,
            report_name
        ));
    }
    output
}

/// Write `not_found_<timestamp>.txt` into `logs_dir`.
/// Returns `None` when every card was found.
pub fn write_not_found_report(
    logs_dir: &Path,
    summary: &EnrichmentSummary,
) -> Result<Option<PathBuf>> {
    if summary.not_found_cards.is_empty() {
        return Ok(None);
    }
    let now = Local::now().naive_local();
    std::fs::create_dir_all(logs_dir)?;
    let path = logs_dir.join(format!("not_found_{}.txt", file_timestamp(now)));
    std::fs::write(&path, format_not_found_report(summary, now))?;
    log::info!("Not-found report written to {}", path.display());
    Ok(Some(path))
}
