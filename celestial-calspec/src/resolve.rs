//! Star name resolution against the lookup table.
//!
//! Queries are normalized (trimmed, upper-cased, internal whitespace collapsed)
//! and compared for exact equality with every alias column of every row. A
//! compact form of the query with all whitespace removed is tried as well, so
//! `"hd 37725"` finds a row stored as `HD37725`. Stored values are normalized
//! the same way but never compacted.
//!
//! A query must match exactly one row. Two or more matching rows mean the table
//! itself is inconsistent and resolution fails with
//! [`CalspecError::AmbiguousMatch`].

use crate::error::{CalspecError, Result};
use crate::table::{CatalogRow, LookupTable};

/// Alias columns consulted during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameColumn {
    StarName,
    AltStarName,
    SimbadName,
    AstroqueryName,
}

impl NameColumn {
    pub const ALL: [NameColumn; 4] = [
        NameColumn::StarName,
        NameColumn::AltStarName,
        NameColumn::SimbadName,
        NameColumn::AstroqueryName,
    ];

    pub fn value<'a>(&self, row: &'a CatalogRow) -> &'a str {
        match self {
            NameColumn::StarName => &row.star_name,
            NameColumn::AltStarName => &row.alt_star_name,
            NameColumn::SimbadName => &row.simbad_name,
            NameColumn::AstroqueryName => &row.astroquery_name,
        }
    }
}

/// A successful resolution: the matching row plus the normalized query.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntry<'a> {
    row: &'a CatalogRow,
    query: String,
}

impl<'a> ResolvedEntry<'a> {
    pub fn row(&self) -> &'a CatalogRow {
        self.row
    }

    /// The normalized form of the query that produced this match.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn star_name(&self) -> &'a str {
        &self.row.star_name
    }
}

/// A query in the two forms compared against stored aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NormalizedQuery {
    full: String,
    compact: String,
}

impl NormalizedQuery {
    fn new(query: &str) -> Self {
        let full = normalize_name(query);
        let compact = full.chars().filter(|c| !c.is_whitespace()).collect();
        Self { full, compact }
    }

    fn matches(&self, stored: &str) -> bool {
        if self.full.is_empty() {
            return false;
        }
        let stored = normalize_name(stored);
        !stored.is_empty() && (stored == self.full || stored == self.compact)
    }

    fn matches_row(&self, row: &CatalogRow) -> bool {
        NameColumn::ALL
            .iter()
            .any(|column| self.matches(column.value(row)))
    }
}

/// Trim, upper-case and collapse runs of internal whitespace to one space.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

impl LookupTable {
    /// Resolve a free-form star name to its catalog row.
    ///
    /// # Errors
    /// [`CalspecError::NotFound`] when no row matches,
    /// [`CalspecError::AmbiguousMatch`] when more than one does.
    pub fn resolve(&self, name: &str) -> Result<ResolvedEntry<'_>> {
        let query = NormalizedQuery::new(name);

        match self.matching_rows(&query).as_slice() {
            [] => Err(CalspecError::not_found(query.full)),
            [row] => {
                tracing::debug!(query = %query.full, star = %row.star_name, "resolved star name");
                Ok(ResolvedEntry {
                    row: *row,
                    query: query.full,
                })
            }
            rows => {
                tracing::warn!(
                    query = %query.full,
                    count = rows.len(),
                    "name matches several catalog rows"
                );
                Err(CalspecError::AmbiguousMatch {
                    candidates: rows.iter().map(|r| r.star_name.clone()).collect(),
                    query: query.full,
                })
            }
        }
    }

    /// True if at least one row carries `name` in an alias column.
    ///
    /// Same matching rule as [`LookupTable::resolve`]. A name shared by two
    /// rows counts as present; only `resolve` reports the conflict.
    pub fn has_entry(&self, name: &str) -> bool {
        let query = NormalizedQuery::new(name);
        self.rows().iter().any(|row| query.matches_row(row))
    }

    fn matching_rows(&self, query: &NormalizedQuery) -> Vec<&CatalogRow> {
        self.rows()
            .iter()
            .filter(|row| query.matches_row(row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> LookupTable {
        LookupTable::from_rows(vec![
            CatalogRow::new("ETA1 DOR", "eta1dor")
                .with_alt_star_name("ETA DOR")
                .with_simbad_name("eta01 Dor")
                .with_astroquery_name("* ETA01 DOR")
                .with_stis("_stis_002"),
            CatalogRow::new("HD37725", "hd37725")
                .with_simbad_name("HD 37725")
                .with_stis("_stis_004"),
            CatalogRow::new("GD71", "gd71")
                .with_simbad_name("GD 71")
                .with_stis("_stis_005"),
        ])
        .unwrap()
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  eta1   dor\t"), "ETA1 DOR");
        assert_eq!(normalize_name("gd71"), "GD71");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_resolve_case_and_whitespace_invariant() {
        let table = sample_table();
        let expected = &table.rows()[0];
        for variant in ["eta1 dor", "ETA1 DOR", "  Eta1 Dor  ", "eta1\t dor", "eTa1   DoR"] {
            let row = table.resolve(variant).unwrap().row();
            assert!(std::ptr::eq(row, expected), "variant {:?}", variant);
        }
    }

    #[test]
    fn test_resolve_each_alias_column() {
        let table = sample_table();
        for alias in ["eta dor", "eta01 dor", "* eta01 dor"] {
            assert_eq!(table.resolve(alias).unwrap().star_name(), "ETA1 DOR");
        }
    }

    #[test]
    fn test_resolve_keeps_normalized_query() {
        let table = sample_table();
        let entry = table.resolve("  hd   37725 ").unwrap();
        assert_eq!(entry.query(), "HD 37725");
        assert_eq!(entry.star_name(), "HD37725");
    }

    #[test]
    fn test_compact_query_matches_stored_compact_name() {
        let table =
            LookupTable::from_rows(vec![CatalogRow::new("HD93521", "hd93521")]).unwrap();
        assert_eq!(table.resolve("hd 93521").unwrap().star_name(), "HD93521");
        assert_eq!(table.resolve("HD93521").unwrap().star_name(), "HD93521");
    }

    #[test]
    fn test_stored_names_are_not_compacted() {
        let table = sample_table();
        assert!(table.resolve("ETA1DOR").unwrap_err().is_not_found());
    }

    #[test]
    fn test_not_found_echoes_normalized_query() {
        let table = sample_table();
        let err = table.resolve("  NotACalspecStar ").unwrap_err();
        match err {
            CalspecError::NotFound { query } => assert_eq!(query, "NOTACALSPECSTAR"),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert!(!table.has_entry("NotACalspecStar"));
        assert!(!table.has_entry("Not A Calspec Star With Spaces"));
    }

    #[test]
    fn test_empty_query_never_matches_empty_alias() {
        let table = sample_table();
        assert!(table.resolve("").unwrap_err().is_not_found());
        assert!(table.resolve("   ").unwrap_err().is_not_found());
        assert!(!table.has_entry(""));
    }

    #[test]
    fn test_ambiguous_alias_is_rejected() {
        let table = LookupTable::from_rows(vec![
            CatalogRow::new("ALPHA LYR", "alpha_lyr").with_alt_star_name("VEGA"),
            CatalogRow::new("HD172167", "hd172167").with_alt_star_name("vega"),
        ])
        .unwrap();

        let err = table.resolve("Vega").unwrap_err();
        match err {
            CalspecError::AmbiguousMatch { query, candidates } => {
                assert_eq!(query, "VEGA");
                assert_eq!(candidates, vec!["ALPHA LYR", "HD172167"]);
            }
            other => panic!("expected AmbiguousMatch, got {:?}", other),
        }
        assert!(table.has_entry("vega"));
    }

    #[test]
    fn test_alias_across_columns_of_two_rows_is_ambiguous() {
        let table = LookupTable::from_rows(vec![
            CatalogRow::new("BD+17 4708", "bd17d4708"),
            CatalogRow::new("SF1615+001A", "sf1615_001a").with_simbad_name("BD+17 4708"),
        ])
        .unwrap();
        assert!(matches!(
            table.resolve("bd+17 4708"),
            Err(CalspecError::AmbiguousMatch { .. })
        ));
    }

    #[test]
    fn test_same_row_matching_several_columns_is_not_ambiguous() {
        let table = LookupTable::from_rows(vec![CatalogRow::new("GD153", "gd153")
            .with_alt_star_name("GD153")
            .with_simbad_name("GD153")])
        .unwrap();
        assert_eq!(table.resolve("gd153").unwrap().star_name(), "GD153");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let table = sample_table();
        let first = table.resolve("hd 37725").unwrap();
        let second = table.resolve("HD 37725").unwrap();
        assert_eq!(first, second);
        assert!(std::ptr::eq(first.row(), second.row()));
    }
}
