use super::{FitsError, Result};
use std::collections::HashMap;

pub const CARD_SIZE: usize = 80;
pub const BLOCK_SIZE: usize = 2880;

#[derive(Debug, Clone, PartialEq)]
pub enum KeywordValue {
    Logical(bool),
    Integer(i64),
    Real(f64),
    String(String),
}

impl KeywordValue {
    pub fn as_logical(&self) -> Option<bool> {
        match self {
            KeywordValue::Logical(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            KeywordValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Reals and integers both read as `f64`.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            KeywordValue::Real(v) => Some(*v),
            KeywordValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            KeywordValue::String(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub name: String,
    pub value: Option<KeywordValue>,
    pub comment: Option<String>,
}

impl Keyword {
    pub fn new(name: impl Into<String>, value: KeywordValue) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            comment: None,
        }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, KeywordValue::String(value.into()))
    }

    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, KeywordValue::Integer(value))
    }

    pub fn real(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, KeywordValue::Real(value))
    }

    pub fn logical(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, KeywordValue::Logical(value))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Header {
    keywords: Vec<Keyword>,
    keyword_index: HashMap<String, usize>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_keyword(&mut self, keyword: Keyword) {
        let index = self.keywords.len();
        self.keyword_index.insert(keyword.name.clone(), index);
        self.keywords.push(keyword);
    }

    pub fn get_keyword(&self, name: &str) -> Option<&Keyword> {
        self.keyword_index
            .get(name)
            .and_then(|&index| self.keywords.get(index))
    }

    pub fn get_keyword_value(&self, name: &str) -> Option<&KeywordValue> {
        self.get_keyword(name)?.value.as_ref()
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get_keyword_value(name).and_then(|v| v.as_integer())
    }

    pub fn real(&self, name: &str) -> Option<f64> {
        self.get_keyword_value(name).and_then(|v| v.as_real())
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.get_keyword_value(name).and_then(|v| v.as_string())
    }

    pub fn logical(&self, name: &str) -> Option<bool> {
        self.get_keyword_value(name).and_then(|v| v.as_logical())
    }

    pub fn required_integer(&self, name: &str) -> Result<i64> {
        self.integer(name).ok_or_else(|| FitsError::KeywordNotFound {
            keyword: name.to_string(),
        })
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    pub fn is_primary(&self) -> bool {
        self.logical("SIMPLE").unwrap_or(false)
    }

    /// Value of `XTENSION`, e.g. `BINTABLE`, for extension headers.
    pub fn extension_type(&self) -> Option<&str> {
        self.string("XTENSION").map(str::trim)
    }

    /// Size in bytes of the data unit that follows this header, unpadded.
    pub fn data_size(&self) -> Result<usize> {
        let bitpix = self.required_integer("BITPIX")?;
        let naxis = self.required_integer("NAXIS")?;
        if naxis == 0 {
            return Ok(0);
        }

        let random_groups = self.logical("GROUPS").unwrap_or(false);
        let mut elements: usize = 1;
        for axis in 1..=naxis {
            let length = self.required_integer(&format!("NAXIS{}", axis))?;
            if axis == 1 && random_groups && length == 0 {
                continue;
            }
            elements = elements
                .checked_mul(to_usize(length, "NAXISn")?)
                .ok_or_else(|| FitsError::InvalidFormat("data size overflow".to_string()))?;
        }

        let pcount = to_usize(self.integer("PCOUNT").unwrap_or(0), "PCOUNT")?;
        let gcount = to_usize(self.integer("GCOUNT").unwrap_or(1), "GCOUNT")?;
        let bytes_per_value = (bitpix.unsigned_abs() / 8) as usize;

        elements
            .checked_add(pcount)
            .and_then(|n| n.checked_mul(gcount))
            .and_then(|n| n.checked_mul(bytes_per_value))
            .ok_or_else(|| FitsError::InvalidFormat("data size overflow".to_string()))
    }
}

fn to_usize(value: i64, keyword: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| FitsError::InvalidKeywordValue {
        keyword: keyword.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct HeaderCard {
    pub keyword: String,
    pub value: Option<String>,
    pub comment: Option<String>,
}

impl HeaderCard {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() != CARD_SIZE {
            return Err(FitsError::HeaderParse(format!(
                "card is {} bytes, expected {}",
                data.len(),
                CARD_SIZE
            )));
        }
        if !data.is_ascii() {
            return Err(FitsError::InvalidFormat(
                "non-ASCII byte in header card".to_string(),
            ));
        }
        let card_str = std::str::from_utf8(data)
            .map_err(|_| FitsError::InvalidFormat("non-ASCII byte in header card".to_string()))?;

        let mut card = HeaderCard {
            keyword: card_str[0..8].trim().to_string(),
            value: None,
            comment: None,
        };

        if &card_str[8..10] == "= " {
            card.parse_value_and_comment(&card_str[10..]);
        } else {
            let comment = card_str[8..].trim();
            if !comment.is_empty() {
                card.comment = Some(comment.to_string());
            }
        }

        Ok(card)
    }

    fn parse_value_and_comment(&mut self, field: &str) {
        let trimmed = field.trim_start();
        let (value_part, rest) = if trimmed.starts_with('\'') {
            split_quoted(trimmed)
        } else {
            match trimmed.find('/') {
                Some(pos) => (&trimmed[..pos], &trimmed[pos..]),
                None => (trimmed, ""),
            }
        };

        let value_part = value_part.trim();
        if !value_part.is_empty() {
            self.value = Some(value_part.to_string());
        }

        let comment = rest.trim_start().trim_start_matches('/').trim();
        if !comment.is_empty() {
            self.comment = Some(comment.to_string());
        }
    }

    pub fn to_keyword(&self) -> Keyword {
        Keyword {
            name: self.keyword.clone(),
            value: self.value.as_deref().map(parse_value),
            comment: self.comment.clone(),
        }
    }
}

/// Split `'quoted string' / comment` after the closing quote. A doubled
/// quote inside the string is an escaped quote, not the terminator.
fn split_quoted(field: &str) -> (&str, &str) {
    let bytes = field.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return (&field[..=i], &field[i + 1..]);
        }
        i += 1;
    }
    (field, "")
}

fn parse_value(value_str: &str) -> KeywordValue {
    let trimmed = value_str.trim();

    if trimmed == "T" {
        return KeywordValue::Logical(true);
    }
    if trimmed == "F" {
        return KeywordValue::Logical(false);
    }

    if trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2 {
        let content = &trimmed[1..trimmed.len() - 1];
        return KeywordValue::String(content.replace("''", "'").trim_end().to_string());
    }

    if let Ok(int_val) = trimmed.parse::<i64>() {
        return KeywordValue::Integer(int_val);
    }

    if let Ok(float_val) = trimmed.replace(['D', 'd'], "E").parse::<f64>() {
        return KeywordValue::Real(float_val);
    }

    KeywordValue::String(trimmed.to_string())
}

pub struct HeaderParser;

impl HeaderParser {
    /// Parse one header starting at the beginning of `data`.
    ///
    /// Returns the header and the number of bytes it occupies, always a whole
    /// number of 2880-byte blocks.
    pub fn parse(data: &[u8]) -> Result<(Header, usize)> {
        let mut header = Header::new();

        for (block_index, block) in data.chunks(BLOCK_SIZE).enumerate() {
            if block.len() != BLOCK_SIZE {
                return Err(FitsError::UnexpectedEof);
            }

            for chunk in block.chunks_exact(CARD_SIZE) {
                let card = HeaderCard::parse(chunk)?;

                if card.keyword == "END" {
                    return Ok((header, (block_index + 1) * BLOCK_SIZE));
                }
                if card.keyword.is_empty() && card.value.is_none() {
                    continue;
                }
                header.add_keyword(card.to_keyword());
            }
        }

        Err(FitsError::InvalidFormat("missing END keyword".to_string()))
    }
}
