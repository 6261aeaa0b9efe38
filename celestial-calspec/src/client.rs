use crate::config::CalspecConfig;
use crate::error::Result;
use crate::fetch::{DownloadReport, SpectrumCache};
use crate::resolve::ResolvedEntry;
use crate::spectrum::{self, SpectrumTable};
use crate::table::{LookupTable, SpectrumKind};
use std::path::PathBuf;

/// Lookup table and spectrum cache behind one handle.
///
/// ```no_run
/// use celestial_calspec::{Calspec, CalspecConfig};
///
/// let calspec = Calspec::new(CalspecConfig::default())?;
/// let spectrum = calspec.spectrum("eta1 dor")?;
/// println!("{} points, flux in {}", spectrum.len(), spectrum.flux.unit);
/// # Ok::<(), celestial_calspec::CalspecError>(())
/// ```
#[derive(Debug)]
pub struct Calspec {
    table: LookupTable,
    cache: SpectrumCache,
}

impl Calspec {
    pub fn new(config: CalspecConfig) -> Result<Self> {
        let table = config.load_table()?;
        let cache = SpectrumCache::new(&config)?;
        Ok(Self::from_parts(table, cache))
    }

    pub fn from_parts(table: LookupTable, cache: SpectrumCache) -> Self {
        Self { table, cache }
    }

    pub fn table(&self) -> &LookupTable {
        &self.table
    }

    pub fn cache(&self) -> &SpectrumCache {
        &self.cache
    }

    pub fn resolve(&self, name: &str) -> Result<ResolvedEntry<'_>> {
        self.table.resolve(name)
    }

    pub fn has_entry(&self, name: &str) -> bool {
        self.table.has_entry(name)
    }

    /// Resolve `name` and make its preferred spectrum available locally.
    pub fn fetch(&self, name: &str) -> Result<PathBuf> {
        let entry = self.resolve(name)?;
        self.cache.ensure_local(&entry)
    }

    pub fn fetch_kind(&self, name: &str, kind: SpectrumKind) -> Result<PathBuf> {
        let entry = self.resolve(name)?;
        self.cache.ensure_local_kind(&entry, kind)
    }

    /// Resolve, fetch and parse in one call.
    pub fn spectrum(&self, name: &str) -> Result<SpectrumTable> {
        spectrum::load(self.fetch(name)?)
    }

    pub fn spectrum_kind(&self, name: &str, kind: SpectrumKind) -> Result<SpectrumTable> {
        spectrum::load(self.fetch_kind(name, kind)?)
    }

    pub fn download_all(&self) -> DownloadReport {
        self.cache.download_all(&self.table)
    }

    pub fn clear_cache(&self) -> Result<usize> {
        self.cache.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalspecError;
    use crate::spectrum::Unit;
    use crate::test_utils::SyntheticTable;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(uri: &str, dir: &std::path::Path) -> CalspecConfig {
        CalspecConfig::default()
            .with_cache_dir(dir)
            .with_archive_url(uri)
    }

    #[test]
    fn test_unknown_star_fails_before_any_request() {
        let dir = TempDir::new().unwrap();
        let calspec = Calspec::new(config_for("http://127.0.0.1:1", dir.path())).unwrap();

        assert!(!calspec.has_entry("NotACalspecStar"));
        let err = calspec.fetch("NotACalspecStar").unwrap_err();
        assert!(matches!(err, CalspecError::NotFound { .. }));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_spectrum_from_prefilled_cache() {
        let dir = TempDir::new().unwrap();
        SyntheticTable::spectrum(&[3000.0, 4000.0], &[1.0, 2.0])
            .write_to(dir.path(), "gd71_stiswfcnic_003.fits");
        let calspec = Calspec::new(config_for("http://127.0.0.1:1", dir.path())).unwrap();

        let spectrum = calspec.spectrum("GD 71").unwrap();
        assert_eq!(spectrum.wavelength.values, vec![300.0, 400.0]);
    }

    #[tokio::test]
    async fn test_resolve_fetch_load_round_trip() {
        let mock_server = MockServer::start().await;
        let body = SyntheticTable::spectrum(
            &[1150.0, 1150.5, 1151.0, 1151.5],
            &[3.1e-12, 3.2e-12, 3.0e-12, 2.9e-12],
        )
        .to_bytes();
        Mock::given(method("GET"))
            .and(path("/calspec/eta1dor_stis_002.fits"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let uri = format!("{}/calspec", mock_server.uri());
        let dir = temp_dir.path().to_path_buf();

        let (first, second) = tokio::task::spawn_blocking(move || {
            let calspec = Calspec::new(config_for(&uri, &dir)).unwrap();
            let entry = calspec.resolve("eta1 dor").unwrap();
            let local = calspec.cache().ensure_local(&entry).unwrap();
            let first = spectrum::load(local).unwrap();
            let second = calspec.spectrum("ETA DOR").unwrap();
            (first, second)
        })
        .await
        .unwrap();

        assert_eq!(first.wavelength.values.len(), first.flux.values.len());
        assert_eq!(first.len(), 4);
        assert_eq!(first.flux.unit, Unit::Flam);
        assert_eq!(first.wavelength.unit, Unit::Nanometer);
        assert_eq!(first, second);
    }
}
