use crate::models::{CardRecord, SaleableCard};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Catalog sort order
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum SortBy {
    /// Set name, then card number
    #[default]
    Set,
    Name,
    /// Most expensive first
    Price,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "set" => Ok(SortBy::Set),
            "name" => Ok(SortBy::Name),
            "price" => Ok(SortBy::Price),
            other => Err(format!(
                "unknown sort order '{other}' (expected set, name or price)"
            )),
        }
    }
}

/// The whole inventory
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub cards: Vec<CardRecord>,
}

impl Collection {
    pub fn new(cards: Vec<CardRecord>) -> Self {
        Self { cards }
    }

    /// Cards with quantity >= 2, keeping one copy of each
    pub fn saleable_cards(&self) -> Vec<SaleableCard> {
        self.cards_by_min_quantity(2)
    }

    /// Cards with at least `min_quantity` copies.
    ///
    /// With `min_quantity == 1` every copy is offered; otherwise one copy of
    /// each card is kept back.
    pub fn cards_by_min_quantity(&self, min_quantity: u32) -> Vec<SaleableCard> {
        self.cards
            .iter()
            .filter(|card| card.quantity >= min_quantity && card.quantity > 0)
            .map(|card| {
                let quantity_for_sale = if min_quantity <= 1 {
                    card.quantity
                } else {
                    card.quantity - 1
                };
                SaleableCard {
                    card: card.clone(),
                    quantity_for_sale,
                }
            })
            .collect()
    }

    /// Cards whose set name matches exactly
    pub fn cards_by_set(&self, set_name: &str) -> Vec<&CardRecord> {
        self.cards
            .iter()
            .filter(|card| card.set_name == set_name)
            .collect()
    }

    /// Sorted distinct set names
    pub fn unique_sets(&self) -> Vec<String> {
        self.cards
            .iter()
            .map(|card| card.set_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Total number of cards, counting duplicates
    pub fn total_cards(&self) -> u64 {
        self.cards.iter().map(|card| card.quantity as u64).sum()
    }

    pub fn total_unique_cards(&self) -> usize {
        self.cards.len()
    }

    /// Total copies available for sale
    pub fn total_saleable_cards(&self) -> u64 {
        self.saleable_cards()
            .iter()
            .map(|sc| sc.quantity_for_sale as u64)
            .sum()
    }

    /// Value of all copies available for sale
    pub fn total_saleable_value_cents(&self) -> i64 {
        self.saleable_cards()
            .iter()
            .map(SaleableCard::total_value_cents)
            .sum()
    }

    /// Sum of unit prices over every row
    pub fn total_value_cents(&self) -> i64 {
        self.cards.iter().map(CardRecord::price_cents).sum()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Sort saleable cards for the catalog
pub fn sort_saleable(cards: &mut [SaleableCard], sort_by: SortBy) {
    match sort_by {
        SortBy::Name => {
            cards.sort_by_key(|sc| sc.card.card_name().to_lowercase());
        }
        SortBy::Price => {
            cards.sort_by(|a, b| b.card.price_cents().cmp(&a.card.price_cents()));
        }
        SortBy::Set => {
            cards.sort_by_key(|sc| {
                (
                    sc.card.set_name.to_lowercase(),
                    numeric_part(sc.card.card_number()),
                )
            });
        }
    }
}

/// Digits of a card number as an integer ("TG05" -> 5), 0 when none
fn numeric_part(number: &str) -> u64 {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
