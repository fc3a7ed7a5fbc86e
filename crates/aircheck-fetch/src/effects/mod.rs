//! Effects layer: the HTTP seam, staged files, and the transfer engine.

mod http;
mod staging;
mod transfer;

pub use http::{BoxStream, HttpClient, HttpResponse, ReqwestClient};
pub use staging::{StagedFile, write_sidecar};
pub use transfer::{BoxError, NoPlaylists, PlaylistSource, Transfer};
