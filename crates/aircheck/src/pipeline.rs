//! The download pipeline: resolve the show, list its catalog, transfer
//! each entry in order.

use std::time::Duration;

use aircheck_catalog::{CatalogClient, Endpoints, ShowKey};
use aircheck_fetch::{
    BoxError, DOWNLOAD_TIMEOUT, FetchOptions, PlaylistSource, ReqwestClient, Transfer,
    TransferOutcome,
};
use anyhow::{Context, bail};
use tokio::time::timeout;
use tracing::{error, info};

use crate::cli::App;
use crate::ui;

/// Wall-clock budget for the resolution and catalog phase. Transfers
/// carry their own per-request timeout instead.
const CATALOG_PHASE_BUDGET: Duration = Duration::from_secs(30 * 60);

/// Per-entry outcomes of one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    /// A non-empty catalog where nothing landed locally is a failed run;
    /// files already present count as landed.
    pub fn is_success(&self) -> bool {
        self.downloaded + self.skipped > 0
    }
}

struct CatalogPlaylists<'a>(&'a CatalogClient);

impl PlaylistSource for CatalogPlaylists<'_> {
    async fn fetch(&self, playlist_id: &str) -> Result<String, BoxError> {
        Ok(self.0.fetch_playlist(playlist_id).await?.render())
    }
}

/// Run the whole pipeline. Resolution and catalog failures (and an empty
/// catalog) are fatal; per-entry transfer failures are logged and counted.
pub async fn run(app: &App, endpoints: Endpoints) -> anyhow::Result<RunSummary> {
    let key: ShowKey = app.show.parse()?;

    info!(show = %key, out = %app.out.display(), "starting archive download");

    let catalog = CatalogClient::new(endpoints)?;

    let entries = timeout(CATALOG_PHASE_BUDGET, async {
        let archive_id = catalog.resolve_archive_id(&key).await?;
        catalog.list_archives(&archive_id).await
    })
    .await
    .context("resolution and catalog fetch timed out")?
    .context("could not enumerate archives")?;

    if entries.is_empty() {
        bail!("no archives found for show {key}");
    }

    let bar = ui::transfer_bar();
    let options = FetchOptions::default()
        .inter_delay(app.delay)
        .on_progress(ui::progress_callback(bar));
    let client = ReqwestClient::with_timeout(DOWNLOAD_TIMEOUT)?;
    let transfer =
        Transfer::new(client, app.out.clone(), options).with_playlists(CatalogPlaylists(&catalog));

    let mut summary = RunSummary::default();
    for entry in &entries {
        match transfer.run(entry).await {
            Ok(TransferOutcome::Downloaded { .. }) => summary.downloaded += 1,
            Ok(TransferOutcome::AlreadyExists { .. }) => summary.skipped += 1,
            Err(err) => {
                error!(
                    show_id = %entry.show_id,
                    date = %entry.playlist_date,
                    error = %err,
                    "download failed"
                );
                summary.failed += 1;
            }
        }
    }

    info!(
        downloaded = summary.downloaded,
        skipped = summary.skipped,
        failed = summary.failed,
        "run complete"
    );
    Ok(summary)
}
