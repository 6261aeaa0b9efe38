//! Spectrum loading from cached FITS files.
//!
//! Archive spectra store wavelength, flux, statistical error and systematic
//! error as the first four columns of the first binary-table extension. Only
//! those four are read; any further columns are ignored.

use crate::error::{CalspecError, Result};
use crate::fits::{BinaryTable, FitsFile};
use std::fmt;
use std::path::Path;

/// Physical unit attached to a loaded column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// Converted from `ANGSTROMS`.
    Nanometer,
    /// erg s⁻¹ cm⁻² Å⁻¹, the unit archive files tag `FLAM`.
    Flam,
    /// Any other tag, kept verbatim. Empty when the column has no `TUNIT`.
    Raw(String),
}

impl Unit {
    /// Map a `TUNITn` tag to a unit and the divisor applied to the stored values.
    pub fn from_tag(tag: Option<&str>) -> (Unit, f64) {
        let Some(tag) = tag else {
            return (Unit::Raw(String::new()), 1.0);
        };
        let trimmed = tag.trim();
        if trimmed.eq_ignore_ascii_case("ANGSTROMS") {
            (Unit::Nanometer, 10.0)
        } else if trimmed.eq_ignore_ascii_case("FLAM") {
            (Unit::Flam, 1.0)
        } else {
            (Unit::Raw(tag.to_string()), 1.0)
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Unit::Nanometer => "nm",
            Unit::Flam => "erg / (s cm2 Angstrom)",
            Unit::Raw(tag) => tag,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumColumn {
    pub name: String,
    pub unit: Unit,
    pub values: Vec<f64>,
}

/// Wavelength, flux and the two error columns of one spectrum.
///
/// All four columns have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumTable {
    pub wavelength: SpectrumColumn,
    pub flux: SpectrumColumn,
    pub stat_error: SpectrumColumn,
    pub sys_error: SpectrumColumn,
}

impl SpectrumTable {
    pub fn len(&self) -> usize {
        self.wavelength.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Columns in file order.
    pub fn columns(&self) -> [&SpectrumColumn; 4] {
        [
            &self.wavelength,
            &self.flux,
            &self.stat_error,
            &self.sys_error,
        ]
    }

    /// Row `index` as `[wavelength, flux, stat_error, sys_error]`.
    pub fn row(&self, index: usize) -> Option<[f64; 4]> {
        Some([
            *self.wavelength.values.get(index)?,
            *self.flux.values.get(index)?,
            *self.stat_error.values.get(index)?,
            *self.sys_error.values.get(index)?,
        ])
    }
}

/// Parse the spectrum stored at `path`. Reads the file on every call.
///
/// # Errors
/// [`CalspecError::LocalIo`] if the file cannot be read,
/// [`CalspecError::Format`] if it is not a FITS file with a binary table of at
/// least four scalar numeric columns.
pub fn load(path: impl AsRef<Path>) -> Result<SpectrumTable> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| CalspecError::local_io(path, e))?;
    let table = parse(bytes, &path.display().to_string())?;
    tracing::debug!(path = %path.display(), rows = table.len(), "loaded spectrum");
    Ok(table)
}

/// Parse spectrum bytes already in memory. `origin` names the source in errors.
pub fn parse(bytes: Vec<u8>, origin: &str) -> Result<SpectrumTable> {
    let fits = FitsFile::from_bytes(bytes);
    let table = fits
        .first_binary_table()
        .map_err(|e| CalspecError::format(format!("{}: {}", origin, e)))?;

    if table.columns().len() < 4 {
        return Err(CalspecError::format(format!(
            "{}: expected at least 4 columns, found {}",
            origin,
            table.columns().len()
        )));
    }

    let [wavelength, flux, stat_error, sys_error] =
        [0, 1, 2, 3].map(|index| read_column(&table, index, origin));

    Ok(SpectrumTable {
        wavelength: wavelength?,
        flux: flux?,
        stat_error: stat_error?,
        sys_error: sys_error?,
    })
}

fn read_column(table: &BinaryTable<'_>, index: usize, origin: &str) -> Result<SpectrumColumn> {
    let to_format_error =
        |e: crate::fits::FitsError| CalspecError::format(format!("{}: {}", origin, e));

    let info = table.column_info(index).map_err(to_format_error)?;
    let raw = table.read_column_f64(index).map_err(to_format_error)?;
    let (unit, divisor) = Unit::from_tag(info.unit.as_deref());

    let values = if divisor == 1.0 {
        raw
    } else {
        raw.into_iter().map(|v| v / divisor).collect()
    };

    Ok(SpectrumColumn {
        name: info
            .name
            .clone()
            .unwrap_or_else(|| format!("col{}", index + 1)),
        unit,
        values,
    })
}
