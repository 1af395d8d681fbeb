use clap::Parser;
use tracing_subscriber::EnvFilter;

mod bookmarks;
mod cli;
mod config;
mod editor;
mod eid;
mod errors;
mod project;
mod reconcile;
mod search_query;
mod snapshot;
mod storage;
#[cfg(test)]
mod tests;

/// Log filter, e.g. `SIGIL_LOG=sigil=debug`.
const LOG_ENV: &str = "SIGIL_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let args = cli::Args::parse();

    init_logging();

    if let Err(err) = cli::run(args.command) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
