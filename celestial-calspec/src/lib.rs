//! CALSPEC standard star spectra.
//!
//! Resolves free-form star names against the CALSPEC lookup table, keeps a
//! local download-once cache of the archive's FITS spectra, and loads them as
//! wavelength/flux/error columns with units attached.
//!
//! ```no_run
//! use celestial_calspec::{spectrum, CalspecConfig, LookupTable, SpectrumCache};
//!
//! let table = LookupTable::bundled()?;
//! let cache = SpectrumCache::new(&CalspecConfig::default())?;
//!
//! let entry = table.resolve("eta1 dor")?;
//! let path = cache.ensure_local(&entry)?;
//! let spectrum = spectrum::load(&path)?;
//! assert_eq!(spectrum.wavelength.values.len(), spectrum.flux.values.len());
//! # Ok::<(), celestial_calspec::CalspecError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod fits;
pub mod resolve;
pub mod spectrum;
pub mod table;

#[cfg(test)]
pub(crate) mod test_utils;

pub use client::Calspec;
pub use config::CalspecConfig;
pub use error::{CalspecError, FetchCause, Result};
pub use fetch::{DownloadFailure, DownloadReport, FetchOutcome, SpectrumCache};
pub use resolve::{normalize_name, NameColumn, ResolvedEntry};
pub use spectrum::{SpectrumColumn, SpectrumTable, Unit};
pub use table::{CatalogRow, LookupTable, SpectrumKind};

use std::path::Path;

/// Load a lookup table CSV from disk.
pub fn load_table(path: impl AsRef<Path>) -> Result<LookupTable> {
    LookupTable::load(path)
}

/// True if `name` is a known CALSPEC star in `table`.
pub fn has_entry(table: &LookupTable, name: &str) -> bool {
    table.has_entry(name)
}
