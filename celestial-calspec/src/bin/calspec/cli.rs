//! CLI argument definitions for calspec

use celestial_calspec::config::{DEFAULT_ARCHIVE_URL, DEFAULT_CACHE_DIR};
use celestial_calspec::{CalspecConfig, SpectrumKind};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "calspec")]
#[command(about = "Look up CALSPEC standard stars and fetch their spectra")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Lookup table CSV (defaults to the bundled snapshot)
    #[arg(long, global = true, env = "CALSPEC_TABLE")]
    pub table: Option<PathBuf>,

    /// Directory holding downloaded spectra
    #[arg(long, global = true, env = "CALSPEC_CACHE_DIR", default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    /// Archive root URL
    #[arg(long, global = true, env = "CALSPEC_ARCHIVE_URL", default_value = DEFAULT_ARCHIVE_URL)]
    pub archive_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, env = "CALSPEC_TIMEOUT", default_value = "60")]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config(&self) -> CalspecConfig {
        let config = CalspecConfig::default()
            .with_cache_dir(&self.cache_dir)
            .with_archive_url(&self.archive_url)
            .with_timeout(Duration::from_secs(self.timeout));
        match &self.table {
            Some(path) => config.with_table_path(path),
            None => config,
        }
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Exit successfully if the name is a known CALSPEC star
    Check(NameArgs),

    /// Show the catalog entry for a star
    Info(InfoArgs),

    /// Download a star's spectrum into the cache and print its path
    Fetch(FetchArgs),

    /// Print a star's spectrum
    Spectrum(SpectrumArgs),

    /// List every star in the lookup table
    List(ListArgs),

    /// Download the preferred spectrum of every star
    DownloadAll(DownloadAllArgs),

    /// Delete cached spectra
    ClearCache,
}

#[derive(Parser)]
pub struct NameArgs {
    /// Star name, any alias, case and spacing insensitive
    pub name: String,
}

#[derive(Parser)]
pub struct InfoArgs {
    pub name: String,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct FetchArgs {
    pub name: String,

    /// Use the model spectrum instead of the preferred one
    #[arg(long)]
    pub model: bool,

    /// Use the STIS spectrum instead of the preferred one
    #[arg(long, conflicts_with = "model")]
    pub stis: bool,
}

impl FetchArgs {
    pub fn kind(&self) -> Option<SpectrumKind> {
        if self.model {
            Some(SpectrumKind::Model)
        } else if self.stis {
            Some(SpectrumKind::Stis)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Parser)]
pub struct SpectrumArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,

    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Print only the first N rows
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Parser)]
pub struct ListArgs {
    /// Print as CSV
    #[arg(long)]
    pub csv: bool,
}

#[derive(Parser)]
pub struct DownloadAllArgs {
    /// Clear the cache first
    #[arg(long)]
    pub fresh: bool,
}
