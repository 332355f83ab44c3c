pub mod api;
pub mod cache;
pub mod catalog_pdf;
pub mod collection;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod formatters;
pub mod io;
pub mod models;
pub mod normalize;
pub mod prices;
pub mod set_mapping;

// Re-export commonly used items
pub use api::{SetSummary, TcgdexCard, TcgdexClient};
pub use cache::ImageCache;
pub use catalog_pdf::{CatalogRenderer, RenderOptions};
pub use collection::{sort_saleable, Collection, SortBy};
pub use config::{AppPaths, SocialNetwork, StoreConfig};
pub use enrichment::{Enricher, EnrichmentOutcome, EnrichmentSummary, NotFoundCard};
pub use error::{CatalogError, Result};
pub use formatters::{format_card_table, format_stats, write_not_found_report};
pub use io::{read_collection, write_collection};
pub use models::{CardIdentity, CardRecord, CardStats, SaleableCard};
pub use normalize::normalize;
pub use prices::PriceOverrides;
pub use set_mapping::{resolve_set_id, SetMapping, SetMappingCache};
