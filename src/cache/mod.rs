//! On-disk caching for downloaded card images

pub mod image_cache;

pub use image_cache::{ImageCache, IMAGE_MAX_AGE};
