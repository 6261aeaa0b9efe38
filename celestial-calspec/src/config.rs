use crate::error::Result;
use crate::table::LookupTable;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ARCHIVE_URL: &str =
    "https://archive.stsci.edu/hlsps/reference-atlases/cdbs/current_calspec/";

pub const DEFAULT_CACHE_DIR: &str = "calspec_data";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct CalspecConfig {
    /// Lookup table CSV. `None` uses the bundled snapshot.
    pub table_path: Option<PathBuf>,

    pub cache_dir: PathBuf,

    /// Archive root; filenames are appended to it.
    pub archive_url: String,

    pub timeout: Duration,

    pub user_agent: String,
}

impl Default for CalspecConfig {
    fn default() -> Self {
        Self {
            table_path: None,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("celestial-calspec/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl CalspecConfig {
    pub fn with_table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.table_path = Some(path.into());
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_archive_url(mut self, url: impl Into<String>) -> Self {
        self.archive_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// The configured table file, or the bundled snapshot.
    pub fn load_table(&self) -> Result<LookupTable> {
        match &self.table_path {
            Some(path) => LookupTable::load(path),
            None => LookupTable::bundled(),
        }
    }
}
