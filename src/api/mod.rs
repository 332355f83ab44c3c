//! API client for the TCGdex card database

pub mod tcgdex;

pub use tcgdex::{SetSummary, TcgdexCard, TcgdexClient};
