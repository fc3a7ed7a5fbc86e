//! The transfer engine: validated, retried, size-capped, atomically
//! committed downloads of archive entries.

use std::future::Future;
use std::path::{Path, PathBuf};

use aircheck_catalog::ArchiveEntry;
use futures_util::StreamExt;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::core::{backoff_delay, sanitize_filename};
use crate::data::{FetchOptions, ProgressTracker, TransferOutcome};
use crate::effects::http::HttpClient;
use crate::effects::staging::{StagedFile, write_sidecar};
use crate::error::{AttemptError, FetchError};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Source of rendered track listings, consulted for entries that carry a
/// playlist id. Failures are logged and never fail the transfer.
pub trait PlaylistSource: Send + Sync {
    fn fetch(&self, playlist_id: &str) -> impl Future<Output = Result<String, BoxError>> + Send;
}

/// Placeholder source for transfers configured without playlists.
pub struct NoPlaylists;

impl PlaylistSource for NoPlaylists {
    async fn fetch(&self, _playlist_id: &str) -> Result<String, BoxError> {
        Err("no playlist source configured".into())
    }
}

/// Downloads one archive entry at a time into an output directory.
///
/// A destination file already present at its expected path is the sole
/// "already downloaded" marker; such entries are skipped without any
/// network access.
pub struct Transfer<C: HttpClient, P: PlaylistSource = NoPlaylists> {
    client: C,
    playlists: Option<P>,
    out_dir: PathBuf,
    options: FetchOptions,
}

impl<C: HttpClient> Transfer<C, NoPlaylists> {
    pub fn new(client: C, out_dir: impl Into<PathBuf>, options: FetchOptions) -> Self {
        Self {
            client,
            playlists: None,
            out_dir: out_dir.into(),
            options,
        }
    }
}

impl<C: HttpClient, P: PlaylistSource> Transfer<C, P> {
    /// Attach a playlist source; entries with a playlist id get a `.txt`
    /// sidecar next to the downloaded file.
    pub fn with_playlists<Q: PlaylistSource>(self, playlists: Q) -> Transfer<C, Q> {
        Transfer {
            client: self.client,
            playlists: Some(playlists),
            out_dir: self.out_dir,
            options: self.options,
        }
    }

    /// Run one transfer.
    ///
    /// Every outcome that touched the network is followed by the
    /// configured inter-download pause; the skip and missing-url paths
    /// return immediately.
    pub async fn run(&self, entry: &ArchiveEntry) -> Result<TransferOutcome, FetchError> {
        if entry.archive_url.is_empty() {
            return Err(FetchError::NoArchiveUrl {
                show_id: entry.show_id.clone(),
            });
        }

        let filename = sanitize_filename(&format!("{}_{}.mp3", entry.playlist_date, entry.show_id));
        let final_path = self.out_dir.join(&filename);

        if final_path.exists() {
            info!(file = %final_path.display(), "skipping existing file");
            return Ok(TransferOutcome::AlreadyExists { path: final_path });
        }

        info!(date = %entry.playlist_date, url = %entry.archive_url, "downloading show");
        let outcome = self.execute(entry, &final_path).await;
        sleep(self.options.inter_delay).await;
        outcome
    }

    async fn execute(
        &self,
        entry: &ArchiveEntry,
        final_path: &Path,
    ) -> Result<TransferOutcome, FetchError> {
        let mut staged = StagedFile::create(final_path)
            .await
            .map_err(|source| FetchError::Io {
                path: final_path.to_path_buf(),
                source,
            })?;

        let mut tracker = ProgressTracker::new(self.options.on_progress.clone());
        let bytes = self
            .download_with_retry(&entry.archive_url, &mut staged, &mut tracker)
            .await?;

        staged.sync().await.map_err(|source| FetchError::Io {
            path: staged.temp_path().to_path_buf(),
            source,
        })?;

        if let (Some(playlists), Some(playlist_id)) = (&self.playlists, &entry.playlist_id) {
            self.save_playlist(playlists, playlist_id, final_path).await;
        }

        tracker.set_committing();
        let temp_path = staged.temp_path().to_path_buf();
        let path = staged.commit().await.map_err(|source| FetchError::Rename {
            temp: temp_path,
            path: final_path.to_path_buf(),
            source,
        })?;
        tracker.set_completed();

        info!(file = %path.display(), bytes, "downloaded file");
        Ok(TransferOutcome::Downloaded { path, bytes })
    }

    async fn download_with_retry(
        &self,
        url: &str,
        staged: &mut StagedFile,
        tracker: &mut ProgressTracker,
    ) -> Result<u64, FetchError> {
        let mut attempts = Vec::new();

        while (attempts.len() as u32) < self.options.max_attempts {
            let attempt = attempts.len() as u32 + 1;
            if attempt > 1 {
                let delay = backoff_delay(attempt, self.options.backoff_base);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off before retry");
                sleep(delay).await;
            }
            match self.attempt(url, staged, tracker, attempt - 1).await {
                Ok(bytes) => return Ok(bytes),
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempts = self.options.max_attempts,
                        error = %err,
                        "download attempt failed"
                    );
                    attempts.push(err);
                }
            }
        }

        Err(FetchError::AllRetriesFailed { attempts })
    }

    async fn attempt(
        &self,
        url: &str,
        staged: &mut StagedFile,
        tracker: &mut ProgressTracker,
        retry_count: u32,
    ) -> Result<u64, AttemptError> {
        staged
            .truncate()
            .await
            .map_err(|err| AttemptError::Io(err.to_string()))?;
        tracker.begin_attempt(retry_count);

        let headers = [("User-Agent".to_string(), self.options.user_agent.clone())];
        let response = self
            .client
            .get(url, &headers)
            .await
            .map_err(|err| AttemptError::Transport(err.to_string()))?;

        if !(200..300).contains(&response.status) {
            return Err(AttemptError::Status {
                status: response.status,
            });
        }
        tracker.set_total_bytes(response.content_length);

        // Hard cap: never write more than max_file_size + 1 bytes; one
        // byte past the ceiling already proves the body is too large.
        let cap = self.options.max_file_size + 1;
        let mut written: u64 = 0;
        let mut body = response.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|err| AttemptError::Transport(err.to_string()))?;
            let remaining = cap - written;
            let take = (chunk.len() as u64).min(remaining) as usize;
            staged
                .write_all(&chunk[..take])
                .await
                .map_err(|err| AttemptError::Io(err.to_string()))?;
            written += take as u64;
            tracker.add_bytes(take as u64);
            if written > self.options.max_file_size {
                return Err(AttemptError::FileTooLarge {
                    limit: self.options.max_file_size,
                });
            }
        }
        Ok(written)
    }

    async fn save_playlist(&self, playlists: &P, playlist_id: &str, final_path: &Path) {
        let sidecar = final_path.with_extension("txt");
        match playlists.fetch(playlist_id).await {
            Ok(rendered) => match write_sidecar(&sidecar, &rendered).await {
                Ok(()) => info!(file = %sidecar.display(), "saved playlist"),
                Err(err) => {
                    warn!(file = %sidecar.display(), error = %err, "failed to save playlist");
                }
            },
            Err(err) => warn!(playlist_id, error = %err, "failed to fetch playlist"),
        }
    }
}
