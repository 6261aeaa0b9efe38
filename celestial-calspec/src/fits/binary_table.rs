use super::{FitsError, Hdu, Header, Result};
use byteorder::{BigEndian, ByteOrder};

/// Largest `TFIELDS` the FITS standard allows.
const MAX_FIELDS: usize = 999;

/// Parsed `TFORMn` value: repeat count and type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnFormat {
    pub repeat: usize,
    pub data_type: char,
    /// Element type of a `P`/`Q` variable-length descriptor.
    pub heap_type: Option<char>,
}

impl ColumnFormat {
    pub fn parse(format: &str) -> Result<Self> {
        let format = format.trim();
        if format.is_empty() {
            return Err(FitsError::InvalidFormat("Empty column format".to_string()));
        }

        let digits_end = format
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| {
                FitsError::InvalidFormat(format!(
                    "Invalid FITS format '{}' - missing data type",
                    format
                ))
            })?;

        let repeat = if digits_end == 0 {
            1
        } else {
            format[..digits_end].parse().map_err(|_| {
                FitsError::InvalidFormat(format!("Invalid repeat count in format '{}'", format))
            })?
        };

        let mut type_chars = format[digits_end..].chars();
        let data_type = type_chars.next().map(|c| c.to_ascii_uppercase()).ok_or_else(|| {
            FitsError::InvalidFormat(format!("Missing data type in format '{}'", format))
        })?;

        let heap_type = if matches!(data_type, 'P' | 'Q') {
            let element = type_chars.next().ok_or_else(|| {
                FitsError::InvalidFormat(format!("Missing data type in format '{}'", format))
            })?;
            Some(element.to_ascii_uppercase())
        } else {
            None
        };

        let parsed = Self {
            repeat,
            data_type,
            heap_type,
        };
        parsed.element_size()?;
        Ok(parsed)
    }

    pub fn element_size(&self) -> Result<usize> {
        match self.data_type {
            'L' | 'X' | 'B' | 'A' => Ok(1),
            'I' => Ok(2),
            'J' | 'E' => Ok(4),
            'K' | 'D' | 'C' | 'P' => Ok(8),
            'M' | 'Q' => Ok(16),
            other => Err(FitsError::InvalidFormat(format!(
                "Unknown binary table format: {}",
                other
            ))),
        }
    }

    /// Bytes the field occupies in each row.
    pub fn width(&self) -> Result<usize> {
        match self.data_type {
            'X' => Ok(self.repeat.div_ceil(8)),
            'P' | 'Q' => Ok(self.repeat.min(1) * self.element_size()?),
            _ => self
                .repeat
                .checked_mul(self.element_size()?)
                .ok_or_else(|| FitsError::InvalidFormat("column width overflow".to_string())),
        }
    }

    /// Single numeric value per row, decodable to `f64`.
    pub fn is_scalar_numeric(&self) -> bool {
        self.repeat == 1 && matches!(self.data_type, 'B' | 'I' | 'J' | 'K' | 'E' | 'D')
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub index: usize,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub format: ColumnFormat,
    pub tform: String,
    /// Byte offset of the field within a row.
    pub offset: usize,
    pub scale: f64,
    pub zero: f64,
}

/// A `BINTABLE` extension with its column layout resolved.
#[derive(Debug, Clone)]
pub struct BinaryTable<'a> {
    header: Header,
    data: &'a [u8],
    row_size: usize,
    rows: usize,
    columns: Vec<ColumnInfo>,
}

impl<'a> BinaryTable<'a> {
    pub fn from_hdu(hdu: Hdu<'a>) -> Result<Self> {
        if !hdu.is_binary_table() {
            return Err(FitsError::InvalidFormat(format!(
                "HDU {} is not a binary table",
                hdu.index
            )));
        }

        let header = hdu.header;
        let row_size = header_usize(&header, "NAXIS1")?;
        let rows = header_usize(&header, "NAXIS2")?;
        let field_count = header_usize(&header, "TFIELDS")?;
        if field_count > MAX_FIELDS {
            return Err(FitsError::InvalidKeywordValue {
                keyword: "TFIELDS".to_string(),
                value: field_count.to_string(),
            });
        }

        let mut columns = Vec::with_capacity(field_count);
        let mut offset = 0;
        for index in 0..field_count {
            let info = column_info(&header, index, offset)?;
            offset = offset
                .checked_add(info.format.width()?)
                .ok_or_else(|| FitsError::InvalidFormat("column width overflow".to_string()))?;
            columns.push(info);
        }

        if offset != row_size {
            return Err(FitsError::InvalidFormat(format!(
                "column widths sum to {} bytes but NAXIS1 is {}",
                offset, row_size
            )));
        }
        let data_len = row_size
            .checked_mul(rows)
            .ok_or_else(|| FitsError::InvalidFormat("table size overflow".to_string()))?;
        if hdu.data.len() < data_len {
            return Err(FitsError::UnexpectedEof);
        }

        Ok(Self {
            header,
            data: hdu.data,
            row_size,
            rows,
            columns,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn column_info(&self, column: usize) -> Result<&ColumnInfo> {
        self.columns.get(column).ok_or_else(|| {
            FitsError::InvalidFormat(format!(
                "Column index {} out of range (0..{})",
                column,
                self.columns.len()
            ))
        })
    }

    /// Read a scalar numeric column, applying `TSCALn` and `TZEROn`.
    pub fn read_column_f64(&self, column: usize) -> Result<Vec<f64>> {
        let info = self.column_info(column)?;
        if !info.format.is_scalar_numeric() {
            return Err(FitsError::UnsupportedColumnType {
                column: column + 1,
                format: info.tform.clone(),
            });
        }

        let size = info.format.element_size()?;
        let values = (0..self.rows)
            .map(|row| {
                let start = row * self.row_size + info.offset;
                let raw = decode_value(info.format.data_type, &self.data[start..start + size]);
                raw * info.scale + info.zero
            })
            .collect();
        Ok(values)
    }
}

fn decode_value(data_type: char, bytes: &[u8]) -> f64 {
    match data_type {
        'B' => bytes[0] as f64,
        'I' => BigEndian::read_i16(bytes) as f64,
        'J' => BigEndian::read_i32(bytes) as f64,
        'K' => BigEndian::read_i64(bytes) as f64,
        'E' => BigEndian::read_f32(bytes) as f64,
        'D' => BigEndian::read_f64(bytes),
        _ => f64::NAN,
    }
}

fn header_usize(header: &Header, keyword: &str) -> Result<usize> {
    let value = header.required_integer(keyword)?;
    usize::try_from(value).map_err(|_| FitsError::InvalidKeywordValue {
        keyword: keyword.to_string(),
        value: value.to_string(),
    })
}

fn column_info(header: &Header, index: usize, offset: usize) -> Result<ColumnInfo> {
    let n = index + 1;
    let format_key = format!("TFORM{}", n);
    let tform = header
        .string(&format_key)
        .map(|s| s.trim().to_string())
        .ok_or(FitsError::KeywordNotFound {
            keyword: format_key,
        })?;
    let format = ColumnFormat::parse(&tform)?;

    Ok(ColumnInfo {
        index,
        name: header.string(&format!("TTYPE{}", n)).map(str::to_string),
        unit: header.string(&format!("TUNIT{}", n)).map(str::to_string),
        format,
        tform,
        offset,
        scale: header.real(&format!("TSCAL{}", n)).unwrap_or(1.0),
        zero: header.real(&format!("TZERO{}", n)).unwrap_or(0.0),
    })
}
