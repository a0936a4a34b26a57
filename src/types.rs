//! Shared data types for catalog items and episodes.
//!
//! These are the values the cache stores and the provider boundary returns.
//! Field sets mirror what the upstream catalog exposes for an airing series;
//! anything the upstream may omit is an `Option`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Media items
// ---------------------------------------------------------------------------

/// Title variants for a media item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTitle {
    /// Romanized title (always present upstream).
    pub romaji: String,
    /// Official English title, if one exists.
    pub english: Option<String>,
    /// Native-script title.
    pub native: String,
}

/// A single series from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Catalog identifier for this series.
    pub id: u64,
    /// Title variants.
    pub title: MediaTitle,
    /// Synopsis text, if available.
    pub description: Option<String>,
    /// URL of the large cover image.
    pub cover_image: Option<String>,
    /// URL of the banner image, if available.
    pub banner_image: Option<String>,
    /// Genre labels (e.g. "Action", "Drama").
    pub genres: Vec<String>,
    /// Airing status as reported upstream (e.g. "RELEASING", "FINISHED").
    pub status: String,
    /// Total episode count, if known.
    pub episodes: Option<u32>,
    /// Community average score (0-100), if rated.
    pub average_score: Option<u8>,
    /// Year the season premiered, if known.
    pub season_year: Option<u16>,
    /// Release format (e.g. "TV", "MOVIE", "OVA").
    pub format: Option<String>,
    /// Names of the producing studios.
    pub studios: Vec<String>,
}

// ---------------------------------------------------------------------------
// Episodes
// ---------------------------------------------------------------------------

/// A single episode from the streaming lookup service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Provider-specific episode identifier.
    pub id: String,
    /// Episode title, if the provider supplies one.
    pub title: Option<String>,
    /// Episode number within the series.
    pub number: u32,
    /// Thumbnail image URL, if available.
    pub image: Option<String>,
    /// Episode synopsis, if available.
    pub description: Option<String>,
}

impl MediaItem {
    /// Preferred display title: English when available, romaji otherwise.
    pub fn display_title(&self) -> &str {
        self.title.english.as_deref().unwrap_or(&self.title.romaji)
    }
}
