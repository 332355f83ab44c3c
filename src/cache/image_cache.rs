use crate::api::TcgdexClient;
use crate::error::Result;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Cached images older than this are downloaded again
pub const IMAGE_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Timeout for a single image download
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Persistent cache for card images
/// Stores images as JPEG files in the cache directory
pub struct ImageCache {
    cache_dir: PathBuf,
    client: TcgdexClient,
}

impl ImageCache {
    /// Create a cache in `cache_dir`, downloading with `client`
    pub fn new(cache_dir: &Path, client: TcgdexClient) -> Self {
        if let Err(e) = std::fs::create_dir_all(cache_dir) {
            log::warn!("Failed to create image cache directory: {}", e);
        }
        log::debug!("Image cache directory: {:?}", cache_dir);
        Self {
            cache_dir: cache_dir.to_path_buf(),
            client,
        }
    }

    /// Cache in `cache_dir` using the public API with the download timeout
    pub fn with_default_client(cache_dir: &Path) -> Result<Self> {
        let client = TcgdexClient::with_base_url(
            crate::api::tcgdex::DEFAULT_BASE_URL,
            "en",
            DOWNLOAD_TIMEOUT,
        )?;
        Ok(Self::new(cache_dir, client))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn filename(card_id: &str) -> String {
        format!("{}.jpg", card_id.replace(['/', '\\'], "_"))
    }

    fn path(&self, card_id: &str) -> PathBuf {
        self.cache_dir.join(Self::filename(card_id))
    }

    /// True when a fresh copy is on disk
    pub fn contains(&self, card_id: &str) -> bool {
        is_fresh(&self.path(card_id))
    }

    /// Path to the image, downloading it first if missing or stale.
    ///
    /// Failures are logged and give `None`; the catalog renders without it.
    pub async fn get_image(&self, url: &str, card_id: &str) -> Option<PathBuf> {
        let path = self.path(card_id);
        if is_fresh(&path) {
            log::debug!("Image cache hit for {}", card_id);
            return Some(path);
        }

        log::debug!("Image cache miss for {}, downloading", card_id);
        match self.download(url, &path).await {
            Ok(()) => Some(path),
            Err(e) => {
                log::warn!("Error downloading image for {}: {}", card_id, e);
                None
            }
        }
    }

    async fn download(&self, url: &str, path: &Path) -> Result<()> {
        let bytes = self.client.fetch_image(url).await?;
        self.insert_bytes(path, &bytes)
    }

    /// Decode `bytes` and store them as an RGB JPEG
    pub fn insert(&self, card_id: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(card_id);
        self.insert_bytes(&path, bytes)?;
        Ok(path)
    }

    fn insert_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        rgb.save_with_format(path, ImageFormat::Jpeg)?;
        Ok(())
    }

    /// Remove every cached image, returns how many files were deleted
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.cached_files()? {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
        log::info!("Cleared {} cached images", removed);
        Ok(removed)
    }

    /// Total size of cached images
    pub fn size_bytes(&self) -> u64 {
        self.cached_files()
            .unwrap_or_default()
            .iter()
            .filter_map(|path| std::fs::metadata(path).ok())
            .map(|meta| meta.len())
            .sum()
    }

    fn cached_files(&self) -> Result<Vec<PathBuf>> {
        if !self.cache_dir.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "jpg") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

fn is_fresh(path: &Path) -> bool {
    let Ok(modified) = std::fs::metadata(path).and_then(|meta| meta.modified()) else {
        return false;
    };
    match SystemTime::now().duration_since(modified) {
        Ok(age) => age < IMAGE_MAX_AGE,
        // Clock skew: treat future timestamps as fresh
        Err(_) => true,
    }
}
