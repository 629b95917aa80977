use std::process::ExitCode;

use clap::Parser;
use release_cli::{run, Args};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, config = %args.config.display(), "startup failed");
            ExitCode::FAILURE
        }
    }
}
