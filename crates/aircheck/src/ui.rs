//! Terminal progress rendering for transfers.

use std::sync::Arc;

use aircheck_fetch::{FetchPhase, Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;

const PB_STYLE: &str =
    "{spinner:.blue} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(PB_STYLE)
        .ok()
        .map(|style| style.tick_chars(TICK))
});

/// One bar, reused for every transfer; retries and new entries reset it.
pub fn transfer_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    if let Some(style) = PB_TEMPLATE.clone() {
        bar.set_style(style);
    }
    bar
}

/// Adapt a bar to the engine's progress callback.
pub fn progress_callback(bar: ProgressBar) -> ProgressCallback {
    Arc::new(move |progress: &Progress| match progress.phase {
        FetchPhase::Connecting => bar.reset(),
        FetchPhase::Downloading => {
            if let Some(total) = progress.total_bytes {
                bar.set_length(total);
            }
            bar.set_position(progress.bytes_downloaded);
        }
        FetchPhase::Committing => {}
        FetchPhase::Completed => bar.finish_and_clear(),
    })
}
