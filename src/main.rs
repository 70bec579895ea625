use anyhow::Context;
use clap::Parser;
use pdftools::commands::{self, Cli};
use pdftools::progress::{FileCache, MemoryCache, ProgressCache};
use pdftools::storage;
use std::io::Write;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn setup_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn open_cache() -> Box<dyn ProgressCache> {
    let dir = storage::get_cache_dir();
    match FileCache::new(&dir) {
        Ok(cache) => Box::new(cache),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cache unavailable, progress will not be published");
            Box::new(MemoryCache::new())
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    human_panic::setup_panic!();
    setup_tracing();

    let cli = Cli::parse();
    let settings = storage::load_settings();
    let notifier = cli.command.notifier();
    let mut cache = open_cache();
    let mut stdout = std::io::stdout();

    let success = commands::run(&cli, &settings, &notifier, cache.as_mut(), &mut stdout);
    stdout.flush().context("failed to flush stdout")?;

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
