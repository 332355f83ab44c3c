use crate::error::{CatalogError, Result};
use crate::models::CardStats;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Public TCGdex REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.tcgdex.net/v2";

const USER_AGENT: &str = "TCG-Catalog/1.0";

/// Request timeout for catalog and card lookups
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// One entry of the set catalog
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SetSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// TCGdex card response. Only `id` and `name` are always present.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TcgdexCard {
    pub id: String,
    pub name: String,
    /// Asset base URL, quality and extension are appended by convention
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub hp: Option<u32>,
    #[serde(default)]
    pub types: Option<Vec<String>>,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub illustrator: Option<String>,
}

impl TcgdexCard {
    /// High resolution PNG variant of the card image
    pub fn high_res_image_url(&self) -> Option<String> {
        self.image
            .as_deref()
            .filter(|base| !base.is_empty())
            .map(|base| format!("{}/high.png", base.trim_end_matches('/')))
    }

    pub fn stats(&self) -> CardStats {
        CardStats {
            hp: self.hp,
            types: self.types.clone().unwrap_or_default(),
            rarity: self.rarity.clone(),
            artist: self.illustrator.clone(),
        }
    }
}

/// Client for the TCGdex card database
#[derive(Debug, Clone)]
pub struct TcgdexClient {
    http: reqwest::Client,
    base_url: String,
    language: String,
}

impl TcgdexClient {
    /// Client for the public API in the given language ("en", "es", ...)
    pub fn new(language: &str) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, language, DEFAULT_TIMEOUT)
    }

    /// Client against any TCGdex-compatible base URL
    pub fn with_base_url(base_url: &str, language: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.language, path)
    }

    /// Fetch the full set catalog
    pub async fn fetch_sets(&self) -> Result<Vec<SetSummary>> {
        let url = self.url("sets");
        log::info!("Fetching set catalog from TCGdex: {}", url);

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        let sets: Vec<SetSummary> = serde_json::from_str(&body)?;
        log::info!("Fetched {} sets", sets.len());
        Ok(sets)
    }

    /// Fetch a single card by identity ("sv09-007"). `None` when unknown.
    pub async fn fetch_card(&self, identity: &str) -> Result<Option<TcgdexCard>> {
        let url = self.url(&format!("cards/{identity}"));
        log::debug!("Fetching card from TCGdex: {}", url);

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CatalogError::HttpStatus(status));
        }

        let body = response.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// Fetch image bytes
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        log::debug!("Fetching image: {}", url);

        let response = self.http.get(url).send().await?;
        if response.status().is_success() {
            Ok(response.bytes().await?.to_vec())
        } else {
            Err(CatalogError::HttpStatus(response.status()))
        }
    }
}

#[cfg(test)]
#[path = "tcgdex_tests.rs"]
mod tests;
