//! Store configuration and application paths

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_STORE_NAME: &str = "Poke MerKdo";

/// Directory layout under the data root
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
}

impl AppPaths {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Paths under ~/.local/share/tcg_catalog
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tcg_catalog")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn catalog_dir(&self) -> PathBuf {
        self.root.join("catalogs")
    }

    /// Inventory export read when no CSV is given
    pub fn collection_csv(&self) -> PathBuf {
        self.root.join("collection.csv")
    }

    pub fn prices_file(&self) -> PathBuf {
        self.root.join("prices.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Create every directory the tool writes to
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.cache_dir(), self.logs_dir(), self.catalog_dir()] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialNetwork {
    pub platform: String,
    pub handle: String,
    pub url: String,
}

/// Store branding shown on the catalog title page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub store_name: String,
    pub catalog_title: String,
    pub logo_path: String,
    pub social_networks: Vec<SocialNetwork>,
    pub welcome_message: String,
    pub contact_message: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_name: DEFAULT_STORE_NAME.to_string(),
            catalog_title: format!("{DEFAULT_STORE_NAME} - Card Catalog"),
            logo_path: "images/logo.png".to_string(),
            social_networks: vec![
                SocialNetwork {
                    platform: "Instagram".to_string(),
                    handle: "@pokemerkdo".to_string(),
                    url: "https://www.instagram.com/pokemerkdo/".to_string(),
                },
                SocialNetwork {
                    platform: "WhatsApp".to_string(),
                    handle: "+57 300 000 0000".to_string(),
                    url: "https://wa.me/573000000000".to_string(),
                },
            ],
            welcome_message: "Welcome to our Pokemon TCG card catalog.".to_string(),
            contact_message: "Contact us directly for prices and availability.".to_string(),
        }
    }
}

impl StoreConfig {
    /// Keys editable from the command line
    pub const EDITABLE_KEYS: &'static [&'static str] = &[
        "store_name",
        "catalog_title",
        "logo_path",
        "welcome_message",
        "contact_message",
    ];

    /// Load the config, merging user values over the defaults.
    ///
    /// A missing file is created as `{}`; an unreadable one yields defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    log::warn!("Failed to create config directory: {}", e);
                }
            }
            if let Err(e) = std::fs::write(path, "{}\n") {
                log::warn!("Failed to create config file: {}", e);
            }
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Self::default(),
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Failed to parse config file, using defaults: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Value of a string key
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "store_name" => Some(&self.store_name),
            "catalog_title" => Some(&self.catalog_title),
            "logo_path" => Some(&self.logo_path),
            "welcome_message" => Some(&self.welcome_message),
            "contact_message" => Some(&self.contact_message),
            _ => None,
        }
    }

    /// Update a string key, returning the previous value
    pub fn set(&mut self, key: &str, value: &str) -> Result<String> {
        let slot = match key {
            "store_name" => &mut self.store_name,
            "catalog_title" => &mut self.catalog_title,
            "logo_path" => &mut self.logo_path,
            "welcome_message" => &mut self.welcome_message,
            "contact_message" => &mut self.contact_message,
            "social_networks" => {
                return Err(CatalogError::Config(
                    "social_networks can only be edited in config.json".to_string(),
                ))
            }
            other => {
                return Err(CatalogError::Config(format!(
                    "unknown key '{}' (available: {}, social_networks)",
                    other,
                    Self::EDITABLE_KEYS.join(", ")
                )))
            }
        };
        Ok(std::mem::replace(slot, value.to_string()))
    }

    /// Logo location, relative paths resolved against the data root
    pub fn logo_file(&self, paths: &AppPaths) -> PathBuf {
        let logo = PathBuf::from(&self.logo_path);
        if logo.is_absolute() {
            logo
        } else {
            paths.root.join(logo)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let config = StoreConfig::load(&path);
        assert_eq!(config, StoreConfig::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[test]
    fn test_user_values_override_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "store_name": "Card Corner" }"#).unwrap();

        let config = StoreConfig::load(&path);
        assert_eq!(config.store_name, "Card Corner");
        assert_eq!(config.welcome_message, StoreConfig::default().welcome_message);
        assert_eq!(config.social_networks.len(), 2);
    }

    #[test]
    fn test_empty_or_corrupt_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        std::fs::write(&path, "").unwrap();
        assert_eq!(StoreConfig::load(&path), StoreConfig::default());

        std::fs::write(&path, "{ broken").unwrap();
        assert_eq!(StoreConfig::load(&path), StoreConfig::default());
    }

    #[test]
    fn test_set_and_save_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let mut config = StoreConfig::default();
        let old = config.set("catalog_title", "Summer Sale").unwrap();
        assert_eq!(old, StoreConfig::default().catalog_title);
        config.save(&path).unwrap();

        let reloaded = StoreConfig::load(&path);
        assert_eq!(reloaded.get("catalog_title"), Some("Summer Sale"));
    }

    #[test]
    fn test_set_rejects_unknown_and_social_networks() {
        let mut config = StoreConfig::default();
        assert!(matches!(
            config.set("colour", "red"),
            Err(CatalogError::Config(_))
        ));
        assert!(matches!(
            config.set("social_networks", "x"),
            Err(CatalogError::Config(_))
        ));
        assert_eq!(config.get("social_networks"), None);
    }

    #[test]
    fn test_app_paths_layout() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AppPaths::new(temp_dir.path());
        paths.ensure_dirs().unwrap();

        assert!(paths.cache_dir().is_dir());
        assert!(paths.logs_dir().is_dir());
        assert!(paths.catalog_dir().is_dir());
        assert!(paths.collection_csv().ends_with("collection.csv"));
        assert!(paths.prices_file().ends_with("prices.json"));
        assert!(paths.config_file().ends_with("config.json"));
    }

    #[test]
    fn test_logo_file_relative_to_root() {
        let paths = AppPaths::new("/data/root");
        let config = StoreConfig::default();
        assert_eq!(
            config.logo_file(&paths),
            PathBuf::from("/data/root/images/logo.png")
        );
    }
}
