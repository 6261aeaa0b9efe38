use crate::cli::{Cli, DownloadAllArgs, FetchArgs};
use anyhow::{bail, Context, Result};
use celestial_calspec::{Calspec, SpectrumCache};
use std::path::PathBuf;

pub fn open(cli: &Cli) -> Result<Calspec> {
    Calspec::new(cli.config()).context("Failed to initialise CALSPEC client")
}

pub fn fetch_path(calspec: &Calspec, args: &FetchArgs) -> Result<PathBuf> {
    let path = match args.kind() {
        Some(kind) => calspec.fetch_kind(&args.name, kind)?,
        None => calspec.fetch(&args.name)?,
    };
    Ok(path)
}

pub fn fetch(args: &FetchArgs, cli: &Cli) -> Result<()> {
    let calspec = open(cli)?;
    let path = fetch_path(&calspec, args)?;
    println!("{}", path.display());
    Ok(())
}

pub fn download_all(args: &DownloadAllArgs, cli: &Cli) -> Result<()> {
    let calspec = open(cli)?;

    let report = if args.fresh {
        calspec.cache().rebuild(calspec.table())?
    } else {
        calspec.download_all()
    };

    println!(
        "Downloaded {}, already cached {}, failed {}",
        report.downloaded.len(),
        report.cached.len(),
        report.failed.len()
    );
    for failure in &report.failed {
        eprintln!("  {}: {}", failure.star, failure.error);
    }

    if !report.is_complete() {
        bail!("{} of {} downloads failed", report.failed.len(), report.total());
    }
    Ok(())
}

pub fn clear(cli: &Cli) -> Result<()> {
    let cache = SpectrumCache::new(&cli.config())?;
    let removed = cache
        .clear()
        .with_context(|| format!("Failed to clear {}", cache.cache_dir().display()))?;
    println!("Removed {} file(s) from {}", removed, cache.cache_dir().display());
    Ok(())
}
