//! Validated, retried, size-capped file transfers with atomic placement.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - immutable options and progress types
//! - [`core`] - pure transformations (naming, backoff)
//! - [`effects`] - I/O: the HTTP seam, staged files, the engine itself
//!
//! # Key Features
//!
//! - **Skip-by-existence**: a destination file already present means the
//!   entry is done; no request is made
//! - **Bounded retry**: a fixed number of attempts with linear backoff,
//!   every attempt's failure kept for diagnosis
//! - **Hard size cap**: the body stream is cut one byte past the ceiling
//! - **Atomic placement**: bytes land in a staging twin that is synced and
//!   renamed onto the final path, or removed on any failure

mod core;
mod data;
mod effects;
mod error;

pub use self::core::{backoff_delay, sanitize_filename};
pub use data::{
    DOWNLOAD_TIMEOUT, FetchOptions, FetchPhase, MAX_FILE_SIZE, Progress, ProgressCallback,
    ProgressTracker, TransferOutcome,
};
pub use effects::{
    BoxError, BoxStream, HttpClient, HttpResponse, NoPlaylists, PlaylistSource, ReqwestClient,
    Transfer,
};
pub use error::{AttemptError, FetchError};
