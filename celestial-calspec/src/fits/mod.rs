//! Minimal read-only FITS support: headers, HDU walking and binary tables.
//!
//! Only what spectrum files need is implemented. Image data is skipped over,
//! never decoded.

pub mod binary_table;
pub mod header;

pub use binary_table::{BinaryTable, ColumnFormat, ColumnInfo};
pub use header::{Header, HeaderCard, HeaderParser, Keyword, KeywordValue, BLOCK_SIZE, CARD_SIZE};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FitsError {
    #[error("Invalid FITS format: {0}")]
    InvalidFormat(String),

    #[error("Keyword {keyword} not found")]
    KeywordNotFound { keyword: String },

    #[error("Header parsing error: {0}")]
    HeaderParse(String),

    #[error("Invalid keyword value: {keyword} = {value}")]
    InvalidKeywordValue { keyword: String, value: String },

    #[error("Unsupported column type {format} in column {column}")]
    UnsupportedColumnType { column: usize, format: String },

    #[error("Unexpected end of file")]
    UnexpectedEof,
}

pub type Result<T> = std::result::Result<T, FitsError>;

/// One header-data unit, borrowing its data from the file buffer.
#[derive(Debug, Clone)]
pub struct Hdu<'a> {
    pub index: usize,
    pub header: Header,
    pub data: &'a [u8],
}

impl Hdu<'_> {
    pub fn is_binary_table(&self) -> bool {
        self.header.extension_type() == Some("BINTABLE")
    }
}

/// A FITS file held in memory.
#[derive(Debug, Clone)]
pub struct FitsFile {
    bytes: Vec<u8>,
}

impl FitsFile {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Walk every HDU in file order.
    ///
    /// Fails if the first header is not a primary header, a header is
    /// malformed, or a data unit runs past the end of the file.
    pub fn hdus(&self) -> Result<Vec<Hdu<'_>>> {
        let mut hdus = Vec::new();
        let mut offset = 0;

        while offset < self.bytes.len() {
            let (header, header_len) = HeaderParser::parse(&self.bytes[offset..])?;
            if hdus.is_empty() && !header.is_primary() {
                return Err(FitsError::InvalidFormat(
                    "file does not start with SIMPLE = T".to_string(),
                ));
            }

            let data_start = offset + header_len;
            let data_len = header.data_size()?;
            let data_end = data_start
                .checked_add(data_len)
                .filter(|&end| end <= self.bytes.len())
                .ok_or(FitsError::UnexpectedEof)?;

            hdus.push(Hdu {
                index: hdus.len(),
                header,
                data: &self.bytes[data_start..data_end],
            });

            offset = data_start + padded_len(data_len);
        }

        if hdus.is_empty() {
            return Err(FitsError::InvalidFormat("empty file".to_string()));
        }
        Ok(hdus)
    }

    /// The first `BINTABLE` extension in the file.
    pub fn first_binary_table(&self) -> Result<BinaryTable<'_>> {
        let hdu = self
            .hdus()?
            .into_iter()
            .find(|hdu| hdu.is_binary_table())
            .ok_or_else(|| FitsError::InvalidFormat("no BINTABLE extension".to_string()))?;
        BinaryTable::from_hdu(hdu)
    }
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}
