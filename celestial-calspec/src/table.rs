//! CALSPEC lookup table.
//!
//! The table is a CSV artifact produced offline by the table rebuild job. Each
//! row describes one standard star: its canonical name, the alternate spellings
//! it may be queried by, and the version tags needed to build the archive
//! filename of its spectra. A snapshot is compiled into the crate and returned
//! by [`LookupTable::bundled`].
//!
//! The table is loaded once and never mutated; name resolution lives in
//! [`crate::resolve`].

use crate::error::{CalspecError, Result};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUNDLED_TABLE: &str = include_str!("../data/calspec.csv");
const BUNDLED_ORIGIN: &str = "<bundled calspec.csv>";

/// Columns that must be present in the CSV header.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Star_name",
    "Alt_Star_name",
    "Simbad_Name",
    "Astroquery_Name",
    "Name",
    "STIS",
    "Model",
];

/// Which of a star's published spectra to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectrumKind {
    /// Observed HST/STIS spectrum.
    Stis,
    /// Model atmosphere spectrum.
    Model,
}

impl SpectrumKind {
    /// Preference order when the caller does not ask for a kind.
    pub const PREFERENCE: [SpectrumKind; 2] = [SpectrumKind::Stis, SpectrumKind::Model];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpectrumKind::Stis => "stis",
            SpectrumKind::Model => "model",
        }
    }
}

impl fmt::Display for SpectrumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One star of the lookup table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogRow {
    /// Canonical name, e.g. `ETA1 DOR`. Never empty.
    #[serde(rename = "Star_name")]
    pub star_name: String,
    #[serde(rename = "Alt_Star_name", default)]
    pub alt_star_name: String,
    #[serde(rename = "Simbad_Name", default)]
    pub simbad_name: String,
    /// Main identifier returned by Simbad when the table was rebuilt.
    #[serde(rename = "Astroquery_Name", default)]
    pub astroquery_name: String,
    /// Stem of the archive filenames, e.g. `eta1dor`.
    #[serde(rename = "Name", default)]
    pub file_stem: String,
    /// STIS version tag, e.g. `_stis_002`. Empty when no STIS spectrum exists.
    #[serde(rename = "STIS", default)]
    pub stis: String,
    /// Model version tag, e.g. `_mod_002`. Empty when no model exists.
    #[serde(rename = "Model", default)]
    pub model: String,
    #[serde(rename = "RA", default)]
    pub ra: String,
    #[serde(rename = "Decl", default)]
    pub dec: String,
    /// Proper motion in RA, mas/yr.
    #[serde(rename = "PM_RA", default)]
    pub pm_ra: Option<f64>,
    /// Proper motion in Dec, mas/yr.
    #[serde(rename = "PM_Dec", default)]
    pub pm_dec: Option<f64>,
    #[serde(rename = "SpType", default)]
    pub sp_type: String,
    #[serde(rename = "V", default)]
    pub v_mag: Option<f64>,
    #[serde(rename = "B_V", default)]
    pub b_v: Option<f64>,
}

impl CatalogRow {
    /// Row with only the naming fields set. Metadata stays empty.
    pub fn new(star_name: impl Into<String>, file_stem: impl Into<String>) -> Self {
        Self {
            star_name: star_name.into(),
            alt_star_name: String::new(),
            simbad_name: String::new(),
            astroquery_name: String::new(),
            file_stem: file_stem.into(),
            stis: String::new(),
            model: String::new(),
            ra: String::new(),
            dec: String::new(),
            pm_ra: None,
            pm_dec: None,
            sp_type: String::new(),
            v_mag: None,
            b_v: None,
        }
    }

    pub fn with_stis(mut self, tag: impl Into<String>) -> Self {
        self.stis = tag.into();
        self
    }

    pub fn with_model(mut self, tag: impl Into<String>) -> Self {
        self.model = tag.into();
        self
    }

    pub fn with_alt_star_name(mut self, name: impl Into<String>) -> Self {
        self.alt_star_name = name.into();
        self
    }

    pub fn with_simbad_name(mut self, name: impl Into<String>) -> Self {
        self.simbad_name = name.into();
        self
    }

    pub fn with_astroquery_name(mut self, name: impl Into<String>) -> Self {
        self.astroquery_name = name.into();
        self
    }

    /// Version tag for `kind`, or `None` if the star has no such spectrum.
    pub fn version_tag(&self, kind: SpectrumKind) -> Option<&str> {
        let tag = match kind {
            SpectrumKind::Stis => self.stis.trim(),
            SpectrumKind::Model => self.model.trim(),
        };
        (!tag.is_empty()).then_some(tag)
    }

    /// First kind in [`SpectrumKind::PREFERENCE`] that has a version tag.
    pub fn preferred_kind(&self) -> Option<SpectrumKind> {
        SpectrumKind::PREFERENCE
            .into_iter()
            .find(|&kind| self.version_tag(kind).is_some())
    }

    /// Archive filename: stem, version tag and `.fits`, concatenated as-is.
    pub fn spectrum_filename(&self, kind: SpectrumKind) -> Option<String> {
        let stem = self.file_stem.trim();
        if stem.is_empty() {
            return None;
        }
        let tag = self.version_tag(kind)?;
        Some(format!("{}{}.fits", stem, tag))
    }
}

/// Immutable, ordered set of catalog rows.
#[derive(Debug, Clone)]
pub struct LookupTable {
    rows: Vec<CatalogRow>,
}

impl LookupTable {
    /// Build a table from rows, enforcing the non-empty canonical name invariant.
    pub fn from_rows(rows: Vec<CatalogRow>) -> Result<Self> {
        Self::validate(&rows, "<in-memory rows>")?;
        Ok(Self { rows })
    }

    /// Load the table from a CSV file.
    ///
    /// # Errors
    /// Returns [`CalspecError::Load`] if the file cannot be opened, lacks one
    /// of the [`REQUIRED_COLUMNS`], contains an undecodable row, or has a row
    /// with an empty `Star_name`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CalspecError::load(path.display(), e))?;
        let table = Self::from_reader(file, &path.display().to_string())?;
        tracing::debug!(path = %path.display(), rows = table.len(), "loaded lookup table");
        Ok(table)
    }

    /// The snapshot compiled into the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_reader(BUNDLED_TABLE.as_bytes(), BUNDLED_ORIGIN)
    }

    /// Parse CSV from any reader. `origin` names the source in error messages.
    pub fn from_reader<R: Read>(reader: R, origin: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| CalspecError::load(origin, e))?
            .clone();
        check_columns(&headers, origin)?;

        let mut rows = Vec::new();
        for (index, record) in csv_reader.deserialize::<CatalogRow>().enumerate() {
            let row = record.map_err(|e| {
                CalspecError::load(origin, format!("row {}: {}", index + 1, e))
            })?;
            rows.push(row);
        }

        Self::validate(&rows, origin)?;
        Ok(Self { rows })
    }

    fn validate(rows: &[CatalogRow], origin: &str) -> Result<()> {
        if let Some(index) = rows.iter().position(|r| r.star_name.trim().is_empty()) {
            return Err(CalspecError::load(
                origin,
                format!("row {} has an empty Star_name", index + 1),
            ));
        }
        for (index, row) in rows.iter().enumerate() {
            let cells = [
                ("Name", &row.file_stem),
                ("STIS", &row.stis),
                ("Model", &row.model),
            ];
            for (column, value) in cells {
                if !is_plain_filename_part(value) {
                    return Err(CalspecError::load(
                        origin,
                        format!("row {} has an unsafe {} value {:?}", index + 1, column, value),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Filename cells end up joined onto the cache directory.
fn is_plain_filename_part(value: &str) -> bool {
    !value.contains(['/', '\\']) && !value.contains("..")
}

fn check_columns(headers: &csv::StringRecord, origin: &str) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CalspecError::load(
            origin,
            format!("missing column(s): {}", missing.join(", ")),
        ))
    }
}
