//! Data layer: validated identifiers and wire types for the archive API.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::CatalogError;

/// Browser-like user agent; the upstream rejects requests without one.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.4 Safari/605.1.15";

/// Hard ceiling on an API response body, in bytes.
pub const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Hard ceiling on the number of catalog entries in one response.
pub const MAX_ARCHIVE_ENTRIES: usize = 1000;

/// Timeout applied to program-page and API requests.
pub const API_TIMEOUT: Duration = Duration::from_secs(30);

static SHOW_KEY_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,50}$").expect("show key pattern"));

/// Operator-facing identifier for a show, e.g. `ded`.
///
/// Construction validates the shape; that validation is what makes
/// embedding the key into the program-page path safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowKey(String);

impl FromStr for ShowKey {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if SHOW_KEY_SHAPE.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(CatalogError::InvalidShowKey(s.to_string()))
        }
    }
}

impl ShowKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier scoping a catalog query, read off the program page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveId(String);

impl ArchiveId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One downloadable unit of a show's archive catalog.
///
/// An empty `archive_url` means the entry has no retrievable file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArchiveEntry {
    pub show_id: String,
    #[serde(default)]
    pub archive_url: String,
    #[serde(default)]
    pub playlist_id: Option<String>,
    pub playlist_date: String,
}

/// Track listing attached to an archive entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Playlist {
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
}

impl Playlist {
    /// Render as `"{artist} - {title}"` lines, service order preserved.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for track in &self.tracks {
            out.push_str(&track.artist);
            out.push_str(" - ");
            out.push_str(&track.title);
            out.push('\n');
        }
        out
    }
}

/// Upstream base URLs. Tests point both at a local server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Base of the site serving program pages.
    pub doc_base: String,
    /// Base of the archive API.
    pub api_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            doc_base: "https://wmse.org".to_string(),
            api_base: "https://wmse.fly.dev".to_string(),
        }
    }
}
