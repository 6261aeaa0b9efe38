//! Download-once cache of archive spectrum files.
//!
//! A spectrum is stored under its archive filename inside the cache directory.
//! Presence of that file is the only cache state: a hit costs one `stat` and no
//! network traffic. A miss streams the body into a uniquely named temporary file
//! in the same directory and renames it onto the destination, so the
//! destination either does not exist or holds one complete download.

use crate::config::CalspecConfig;
use crate::error::{CalspecError, Result};
use crate::resolve::ResolvedEntry;
use crate::table::{CatalogRow, LookupTable, SpectrumKind};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

const TEMP_SUFFIX: &str = ".part";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Cached,
    Downloaded,
}

#[derive(Debug)]
pub struct DownloadFailure {
    pub star: String,
    pub error: CalspecError,
}

/// Result of [`SpectrumCache::download_all`]. Failures do not stop the run.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub downloaded: Vec<PathBuf>,
    pub cached: Vec<PathBuf>,
    pub failed: Vec<DownloadFailure>,
}

impl DownloadReport {
    pub fn total(&self) -> usize {
        self.downloaded.len() + self.cached.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
pub struct SpectrumCache {
    cache_dir: PathBuf,
    archive_url: String,
    client: Client,
}

impl SpectrumCache {
    /// Build a cache with its own blocking HTTP client.
    ///
    /// Must not be called from inside an async runtime; the blocking client
    /// runs its own.
    pub fn new(config: &CalspecConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CalspecError::transient(&config.archive_url, e))?;
        Ok(Self::with_client(
            config.cache_dir.clone(),
            config.archive_url.clone(),
            client,
        ))
    }

    pub fn with_client(
        cache_dir: impl Into<PathBuf>,
        archive_url: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            archive_url: archive_url.into(),
            client,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn archive_url(&self) -> &str {
        &self.archive_url
    }

    pub fn remote_url(&self, filename: &str) -> String {
        format!("{}/{}", self.archive_url.trim_end_matches('/'), filename)
    }

    pub fn cache_path(&self, filename: &str) -> PathBuf {
        self.cache_dir.join(filename)
    }

    pub fn is_cached(&self, row: &CatalogRow, kind: SpectrumKind) -> bool {
        row.spectrum_filename(kind)
            .is_some_and(|filename| self.cache_path(&filename).is_file())
    }

    /// Local path of the entry's preferred spectrum, downloading it if needed.
    ///
    /// # Errors
    /// [`CalspecError::MissingSpectrum`] if the row has no spectrum at all,
    /// [`CalspecError::FetchFailed`] if the download fails,
    /// [`CalspecError::LocalIo`] if the cache directory cannot be written.
    pub fn ensure_local(&self, entry: &ResolvedEntry<'_>) -> Result<PathBuf> {
        self.ensure_row(entry.row()).map(|(path, _)| path)
    }

    /// Like [`SpectrumCache::ensure_local`] for an explicit spectrum kind.
    pub fn ensure_local_kind(
        &self,
        entry: &ResolvedEntry<'_>,
        kind: SpectrumKind,
    ) -> Result<PathBuf> {
        self.ensure_row_kind(entry.row(), kind).map(|(path, _)| path)
    }

    pub fn ensure_row(&self, row: &CatalogRow) -> Result<(PathBuf, FetchOutcome)> {
        let kind = row
            .preferred_kind()
            .ok_or_else(|| CalspecError::MissingSpectrum {
                star: row.star_name.clone(),
                kind: "STIS or model".to_string(),
            })?;
        self.ensure_row_kind(row, kind)
    }

    pub fn ensure_row_kind(
        &self,
        row: &CatalogRow,
        kind: SpectrumKind,
    ) -> Result<(PathBuf, FetchOutcome)> {
        let filename =
            row.spectrum_filename(kind)
                .ok_or_else(|| CalspecError::MissingSpectrum {
                    star: row.star_name.clone(),
                    kind: kind.to_string(),
                })?;
        self.ensure_file(&filename)
    }

    fn ensure_file(&self, filename: &str) -> Result<(PathBuf, FetchOutcome)> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| CalspecError::local_io(&self.cache_dir, e))?;

        let dest = self.cache_path(filename);
        if dest.is_file() {
            tracing::debug!(path = %dest.display(), "spectrum already cached");
            return Ok((dest, FetchOutcome::Cached));
        }

        let url = self.remote_url(filename);
        self.download(&url, &dest)?;

        if !dest.is_file() {
            return Err(CalspecError::local_io(
                &dest,
                io::Error::new(io::ErrorKind::NotFound, "file missing after download"),
            ));
        }
        Ok((dest, FetchOutcome::Downloaded))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::info!(url, "downloading spectrum");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| CalspecError::transient(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(url, status));
        }

        let bytes = stream_to_file(response, dest, url)?;
        tracing::info!(path = %dest.display(), bytes, "saved spectrum");
        Ok(())
    }

    /// Remove cached spectra and leftover temporary files.
    ///
    /// Other files in the directory are left alone. A missing directory counts
    /// as already clear.
    pub fn clear(&self) -> Result<usize> {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(CalspecError::local_io(&self.cache_dir, e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| CalspecError::local_io(&self.cache_dir, e))?;
            let path = entry.path();
            if !path.is_file() || !is_cache_file(&entry.file_name().to_string_lossy()) {
                continue;
            }
            fs::remove_file(&path).map_err(|e| CalspecError::local_io(&path, e))?;
            removed += 1;
        }

        tracing::info!(dir = %self.cache_dir.display(), removed, "cleared spectrum cache");
        Ok(removed)
    }

    /// Make sure every row's preferred spectrum is cached.
    pub fn download_all(&self, table: &LookupTable) -> DownloadReport {
        let mut report = DownloadReport::default();

        for row in table.rows() {
            match self.ensure_row(row) {
                Ok((path, FetchOutcome::Cached)) => report.cached.push(path),
                Ok((path, FetchOutcome::Downloaded)) => report.downloaded.push(path),
                Err(error) => {
                    tracing::warn!(star = %row.star_name, %error, "spectrum download failed");
                    report.failed.push(DownloadFailure {
                        star: row.star_name.clone(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            downloaded = report.downloaded.len(),
            cached = report.cached.len(),
            failed = report.failed.len(),
            "bulk download finished"
        );
        report
    }

    /// Clear the cache, then download everything again.
    pub fn rebuild(&self, table: &LookupTable) -> Result<DownloadReport> {
        self.clear()?;
        Ok(self.download_all(table))
    }
}

fn is_cache_file(name: &str) -> bool {
    name.ends_with(".fits") || (name.starts_with('.') && name.ends_with(TEMP_SUFFIX))
}

fn classify_status(url: &str, status: StatusCode) -> CalspecError {
    match status.as_u16() {
        408 | 429 => CalspecError::transient(url, format!("HTTP {}", status)),
        _ if status.is_server_error() => CalspecError::transient(url, format!("HTTP {}", status)),
        code => CalspecError::remote_missing(url, code),
    }
}

/// Records whether a failure came from the source rather than the sink.
struct TrackedReader<R> {
    inner: R,
    failed: bool,
}

impl<R: Read> Read for TrackedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).inspect_err(|_| self.failed = true)
    }
}

/// Stream `reader` into `dest` through a temporary file in the same directory.
///
/// Nothing is created at `dest` unless the whole body was written and synced.
/// Read failures are transient fetch errors; write failures are local I/O.
pub(crate) fn stream_to_file<R: Read>(reader: R, dest: &Path, url: &str) -> Result<u64> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let filename = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{}.", filename))
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| CalspecError::local_io(dir, e))?;

    let mut reader = TrackedReader {
        inner: reader,
        failed: false,
    };
    let bytes = match io::copy(&mut reader, temp.as_file_mut()) {
        Ok(bytes) => bytes,
        Err(e) if reader.failed => return Err(CalspecError::transient(url, e)),
        Err(e) => return Err(CalspecError::local_io(temp.path(), e)),
    };

    temp.as_file()
        .sync_all()
        .map_err(|e| CalspecError::local_io(temp.path(), e))?;
    temp.persist(dest)
        .map_err(|e| CalspecError::local_io(dest, e.error))?;
    Ok(bytes)
}
