//! calspec: CALSPEC standard star lookup and spectrum retrieval CLI

mod cache;
mod cli;
mod lookup;
mod spectrum;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_filter())),
        )
        .init();

    match &cli.command {
        Commands::Check(args) => lookup::check(args, &cli),
        Commands::Info(args) => lookup::info(args, &cli),
        Commands::List(args) => lookup::list(args, &cli),
        Commands::Fetch(args) => cache::fetch(args, &cli),
        Commands::DownloadAll(args) => cache::download_all(args, &cli),
        Commands::ClearCache => cache::clear(&cli),
        Commands::Spectrum(args) => spectrum::run(args, &cli),
    }
}
