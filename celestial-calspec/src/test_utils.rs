//! In-memory FITS builders for unit tests.

use crate::fits::{BLOCK_SIZE, CARD_SIZE};
use std::path::{Path, PathBuf};

/// Pad `text` to one 80-byte card.
pub fn card(text: &str) -> Vec<u8> {
    assert!(text.len() <= CARD_SIZE, "card too long: {}", text);
    let mut bytes = text.as_bytes().to_vec();
    bytes.resize(CARD_SIZE, b' ');
    bytes
}

/// Header block(s) holding `cards` followed by `END`.
pub fn header_block(cards: &[&str]) -> Vec<u8> {
    let owned: Vec<String> = cards.iter().map(|c| c.to_string()).collect();
    header_from_cards(&owned)
}

fn header_from_cards(cards: &[String]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for text in cards {
        bytes.extend(card(text));
    }
    bytes.extend(card("END"));
    pad_block(&mut bytes, b' ');
    bytes
}

fn pad_block(bytes: &mut Vec<u8>, fill: u8) {
    let padded = bytes.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
    bytes.resize(padded, fill);
}

fn value_card(keyword: &str, value: &str) -> String {
    format!("{:<8}= {:>20}", keyword, value)
}

fn string_card(keyword: &str, value: &str) -> String {
    format!("{:<8}= '{:<8}'", keyword, value.replace('\'', "''"))
}

#[derive(Debug, Clone)]
pub struct SyntheticColumn {
    name: String,
    unit: String,
    tform: String,
    width: usize,
    cells: Vec<Vec<u8>>,
    scaling: Option<(f64, f64)>,
}

impl SyntheticColumn {
    pub fn doubles(name: &str, unit: &str, values: &[f64]) -> Self {
        Self::build(name, unit, "1D", 8, values.iter().map(|v| v.to_be_bytes().to_vec()))
    }

    pub fn floats(name: &str, unit: &str, values: &[f64]) -> Self {
        Self::build(
            name,
            unit,
            "1E",
            4,
            values.iter().map(|v| (*v as f32).to_be_bytes().to_vec()),
        )
    }

    pub fn shorts(name: &str, unit: &str, values: &[i16]) -> Self {
        Self::build(name, unit, "1I", 2, values.iter().map(|v| v.to_be_bytes().to_vec()))
    }

    pub fn ints(name: &str, unit: &str, values: &[i32]) -> Self {
        Self::build(name, unit, "1J", 4, values.iter().map(|v| v.to_be_bytes().to_vec()))
    }

    /// One-row character column.
    pub fn text(name: &str, value: &str) -> Self {
        let tform = format!("{}A", value.len());
        Self::build(name, "", &tform, value.len(), std::iter::once(value.as_bytes().to_vec()))
    }

    /// Two-element double vector per row.
    pub fn pairs(name: &str, unit: &str, values: &[(f64, f64)]) -> Self {
        Self::build(
            name,
            unit,
            "2D",
            16,
            values.iter().map(|(a, b)| {
                let mut cell = a.to_be_bytes().to_vec();
                cell.extend(b.to_be_bytes());
                cell
            }),
        )
    }

    /// Column with no rows and an arbitrary `TFORMn`, for malformed headers.
    pub fn declared(name: &str, tform: &str) -> Self {
        Self::build(name, "", tform, 0, std::iter::empty())
    }

    pub fn scaled(mut self, scale: f64, zero: f64) -> Self {
        self.scaling = Some((scale, zero));
        self
    }

    fn build(
        name: &str,
        unit: &str,
        tform: &str,
        width: usize,
        cells: impl Iterator<Item = Vec<u8>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            tform: tform.to_string(),
            width,
            cells: cells.collect(),
            scaling: None,
        }
    }

    fn width(&self) -> usize {
        self.width
    }
}

/// A primary HDU with no data followed by one binary table.
#[derive(Debug, Clone, Default)]
pub struct SyntheticTable {
    columns: Vec<SyntheticColumn>,
    row_size_override: Option<usize>,
}

impl SyntheticTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Four-column table laid out like an archive spectrum file.
    pub fn spectrum(wavelength: &[f64], flux: &[f64]) -> Self {
        let stat: Vec<f64> = flux.iter().map(|f| f * 0.01).collect();
        let sys: Vec<f64> = flux.iter().map(|f| f * 0.005).collect();
        Self::new()
            .column(SyntheticColumn::doubles("WAVELENGTH", "ANGSTROMS", wavelength))
            .column(SyntheticColumn::floats("FLUX", "FLAM", flux))
            .column(SyntheticColumn::floats("STATERROR", "FLAM", &stat))
            .column(SyntheticColumn::floats("SYSERROR", "FLAM", &sys))
    }

    pub fn column(mut self, column: SyntheticColumn) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_row_size_override(mut self, row_size: usize) -> Self {
        self.row_size_override = Some(row_size);
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let rows = self.columns.first().map_or(0, |c| c.cells.len());
        assert!(
            self.columns.iter().all(|c| c.cells.len() == rows),
            "all synthetic columns need the same row count"
        );
        let row_size: usize = self.columns.iter().map(SyntheticColumn::width).sum();

        let mut bytes = header_block(&[
            "SIMPLE  =                    T",
            "BITPIX  =                    8",
            "NAXIS   =                    0",
            "EXTEND  =                    T",
        ]);

        let mut cards = vec![
            string_card("XTENSION", "BINTABLE"),
            value_card("BITPIX", "8"),
            value_card("NAXIS", "2"),
            value_card(
                "NAXIS1",
                &self.row_size_override.unwrap_or(row_size).to_string(),
            ),
            value_card("NAXIS2", &rows.to_string()),
            value_card("PCOUNT", "0"),
            value_card("GCOUNT", "1"),
            value_card("TFIELDS", &self.columns.len().to_string()),
        ];
        for (i, column) in self.columns.iter().enumerate() {
            let n = i + 1;
            cards.push(string_card(&format!("TTYPE{}", n), &column.name));
            cards.push(string_card(&format!("TFORM{}", n), &column.tform));
            if !column.unit.is_empty() {
                cards.push(string_card(&format!("TUNIT{}", n), &column.unit));
            }
            if let Some((scale, zero)) = column.scaling {
                cards.push(value_card(&format!("TSCAL{}", n), &format!("{:?}", scale)));
                cards.push(value_card(&format!("TZERO{}", n), &format!("{:?}", zero)));
            }
        }
        bytes.extend(header_from_cards(&cards));

        let mut data = Vec::with_capacity(rows * row_size);
        for row in 0..rows {
            for column in &self.columns {
                data.extend(&column.cells[row]);
            }
        }
        pad_block(&mut data, 0);
        bytes.extend(data);
        bytes
    }

    pub fn write_to(&self, dir: &Path, filename: &str) -> PathBuf {
        let path = dir.join(filename);
        std::fs::write(&path, self.to_bytes()).unwrap();
        path
    }
}
