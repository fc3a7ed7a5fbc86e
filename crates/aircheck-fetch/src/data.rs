//! Data layer: immutable options and progress types for transfers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use aircheck_catalog::BROWSER_USER_AGENT;

/// Hard ceiling on a downloaded file, in bytes.
pub const MAX_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Per-request timeout for archive downloads; generous, the files are large.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Phases of a transfer.
///
/// Transfers move Connecting → Downloading → Committing → Completed;
/// retries return to Connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    #[default]
    Connecting,
    Downloading,
    Committing,
    Completed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Connecting => write!(f, "Connecting"),
            FetchPhase::Downloading => write!(f, "Downloading"),
            FetchPhase::Committing => write!(f, "Committing"),
            FetchPhase::Completed => write!(f, "Completed"),
        }
    }
}

/// Snapshot handed to progress callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub phase: FetchPhase,

    /// Bytes written to the staging file in the current attempt.
    pub bytes_downloaded: u64,

    /// Total expected bytes, when the server sent a Content-Length.
    pub total_bytes: Option<u64>,

    /// Current retry (0 = first attempt).
    pub retry_count: u32,
}

impl Progress {
    /// Completion percentage, when the total is known.
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.total_bytes.map(|total| {
            if total == 0 {
                0.0
            } else {
                (self.bytes_downloaded as f64 / total as f64) * 100.0
            }
        })
    }

    #[must_use]
    pub fn is_retrying(&self) -> bool {
        self.retry_count > 0
    }
}

pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Emits progress snapshots through an optional callback.
pub struct ProgressTracker {
    callback: Option<ProgressCallback>,
    total_bytes: Option<u64>,
    bytes_downloaded: u64,
    retry_count: u32,
}

impl ProgressTracker {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        let tracker = Self {
            callback,
            total_bytes: None,
            bytes_downloaded: 0,
            retry_count: 0,
        };
        tracker.emit(FetchPhase::Connecting);
        tracker
    }

    /// Reset for a fresh attempt; retries return to the Connecting phase.
    pub fn begin_attempt(&mut self, retry_count: u32) {
        self.retry_count = retry_count;
        self.bytes_downloaded = 0;
        self.emit(FetchPhase::Connecting);
    }

    pub fn set_total_bytes(&mut self, total: Option<u64>) {
        self.total_bytes = total;
    }

    pub fn add_bytes(&mut self, bytes: u64) {
        self.bytes_downloaded += bytes;
        self.emit(FetchPhase::Downloading);
    }

    pub fn set_committing(&self) {
        self.emit(FetchPhase::Committing);
    }

    pub fn set_completed(&self) {
        self.emit(FetchPhase::Completed);
    }

    fn emit(&self, phase: FetchPhase) {
        if let Some(callback) = &self.callback {
            callback(&Progress {
                phase,
                bytes_downloaded: self.bytes_downloaded,
                total_bytes: self.total_bytes,
                retry_count: self.retry_count,
            });
        }
    }
}

/// Result of one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// File fetched and promoted to its final path.
    Downloaded {
        path: std::path::PathBuf,
        bytes: u64,
    },
    /// Destination already existed; nothing was fetched.
    AlreadyExists { path: std::path::PathBuf },
}

/// Configuration for the transfer engine.
#[derive(Clone)]
pub struct FetchOptions {
    /// Total attempts for one entry, the first included. Default: 3.
    pub max_attempts: u32,

    /// Base for the linear backoff between attempts; the sleep before
    /// attempt N is `N * backoff_base`. Default: 2 s.
    pub backoff_base: Duration,

    /// Hard ceiling on the downloaded file. Default: [`MAX_FILE_SIZE`].
    pub max_file_size: u64,

    /// Pause after each entry that touched the network. Default: 5 s.
    pub inter_delay: Duration,

    /// User agent sent with download requests.
    pub user_agent: String,

    /// Progress callback invoked on phase transitions and chunk writes.
    pub on_progress: Option<ProgressCallback>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("max_attempts", &self.max_attempts)
            .field("backoff_base", &self.backoff_base)
            .field("max_file_size", &self.max_file_size)
            .field("inter_delay", &self.inter_delay)
            .field("user_agent", &self.user_agent)
            .field("on_progress", &"{ ... }")
            .finish()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
            max_file_size: MAX_FILE_SIZE,
            inter_delay: Duration::from_secs(5),
            user_agent: BROWSER_USER_AGENT.to_string(),
            on_progress: None,
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    #[must_use]
    pub fn max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    #[must_use]
    pub fn inter_delay(mut self, inter_delay: Duration) -> Self {
        self.inter_delay = inter_delay;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn on_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }
}
