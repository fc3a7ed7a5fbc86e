use std::process::ExitCode;

use aircheck::cli::App;
use aircheck::pipeline;
use aircheck_catalog::Endpoints;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let app = App::parse();
    init_tracing(app.debug);

    match pipeline::run(&app, Endpoints::default()).await {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(summary) => {
            error!(failed = summary.failed, "no archives could be downloaded");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("pipeline failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}
