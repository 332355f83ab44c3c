//! Error types for tcg_catalog

use thiserror::Error;

/// Unified error type for catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Failed to parse JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Failed to read or write CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// HTTP error status code
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    /// PDF rendering error
    #[error("PDF error: {0}")]
    Pdf(String),
    /// Invalid or unknown configuration
    #[error("Configuration error: {0}")]
    Config(String),
    /// Missing input file or no matching card
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<printpdf::Error> for CatalogError {
    fn from(err: printpdf::Error) -> Self {
        CatalogError::Pdf(err.to_string())
    }
}

/// Result alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
