use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CalspecError>;

/// Why a download from the archive did not produce a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCause {
    /// The archive answered but does not serve the file (404, 410, other 4xx).
    /// Usually means the lookup table points at a superseded version.
    RemoteMissing { status: u16 },

    /// Connection failure, timeout, interrupted body or a 408/429/5xx answer.
    Transient { reason: String },
}

impl std::fmt::Display for FetchCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchCause::RemoteMissing { status } => {
                write!(f, "remote file missing (HTTP {})", status)
            }
            FetchCause::Transient { reason } => write!(f, "transient failure: {}", reason),
        }
    }
}

#[derive(Debug, Error)]
pub enum CalspecError {
    #[error("no CALSPEC star matches '{query}'")]
    NotFound { query: String },

    #[error("'{query}' matches several catalog rows: {}", .candidates.join(", "))]
    AmbiguousMatch {
        query: String,
        candidates: Vec<String>,
    },

    #[error("no {kind} spectrum listed for {star}")]
    MissingSpectrum { star: String, kind: String },

    #[error("failed to fetch {url}: {cause}")]
    FetchFailed { url: String, cause: FetchCause },

    #[error("local I/O error on {path}: {source}")]
    LocalIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid spectrum file: {0}")]
    Format(String),

    #[error("cannot load lookup table {path}: {message}")]
    Load { path: String, message: String },
}

impl CalspecError {
    pub fn not_found(query: impl Into<String>) -> Self {
        Self::NotFound {
            query: query.into(),
        }
    }

    pub fn local_io(path: &Path, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn load(path: impl std::fmt::Display, message: impl std::fmt::Display) -> Self {
        Self::Load {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    pub fn remote_missing(url: impl Into<String>, status: u16) -> Self {
        Self::FetchFailed {
            url: url.into(),
            cause: FetchCause::RemoteMissing { status },
        }
    }

    pub fn transient(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::FetchFailed {
            url: url.into(),
            cause: FetchCause::Transient {
                reason: reason.to_string(),
            },
        }
    }

    /// True only for transient fetch failures. Nothing is retried internally;
    /// this tells the caller whether a retry can help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CalspecError::FetchFailed {
                cause: FetchCause::Transient { .. },
                ..
            }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CalspecError::NotFound { .. })
    }
}
