//! Set name normalization
//!
//! Reduces loosely formatted set names ("Pokémon: Journey Together",
//! "JOURNEY TOGETHER") to one comparable form ("journey together").

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Brand token stripped from the start of set names
const BRAND_PREFIX: &str = "pokemon";

/// Normalize a raw set name for comparison.
///
/// Lowercases, folds accents to ASCII, drops punctuation, collapses
/// whitespace and strips a leading brand token. The result only contains
/// `[a-z0-9 ]`, single spaced and trimmed, so applying it twice is a no-op.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let folded: String = raw
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii())
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_alphanumeric() || c.is_ascii_whitespace())
        .collect();

    let mut rest = folded.trim_start();
    // Only a brand token followed by whitespace is a prefix
    while let Some(after) = rest.strip_prefix(BRAND_PREFIX) {
        if !after.starts_with(|c: char| c.is_ascii_whitespace()) {
            break;
        }
        rest = after.trim_start();
    }

    rest.split_whitespace().collect::<Vec<_>>().join(" ")
}
