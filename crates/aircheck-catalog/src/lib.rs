//! Upstream catalog access for the archive downloader.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - validated identifiers and wire types
//! - [`core`] - pure extraction and decoding over fetched bodies
//! - [`effects`] - HTTP against the program page and the archive API

mod core;
mod data;
mod effects;
mod error;

pub use self::core::{ARCHIVE_ELEMENT, ARCHIVE_ID_ATTR, decode_archives, extract_archive_id};
pub use data::{
    API_TIMEOUT, ArchiveEntry, ArchiveId, BROWSER_USER_AGENT, Endpoints, MAX_ARCHIVE_ENTRIES,
    MAX_RESPONSE_SIZE, Playlist, ShowKey, Track,
};
pub use effects::CatalogClient;
pub use error::CatalogError;
