use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while driving the crawl.
///
/// Transient kinds (initialization, wait timeouts) are retried locally by
/// [`crate::retry::RetryPolicy`]; structural kinds abort the run.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The WebDriver session could not be established.
    #[error("webdriver initialization failed: {0}")]
    Initialization(String),

    /// Page navigation did not finish within the configured timeout.
    #[error("navigation to {url} timed out: {reason}")]
    NavigationTimeout { url: String, reason: String },

    /// No element matching the selector appeared in time.
    #[error("timed out waiting for elements matching {selector:?}")]
    WaitTimeout { selector: String },

    /// The pagination control could not be located on the live page.
    #[error("pagination control {selector:?} not found")]
    PaginationLost { selector: String },

    /// The output path does not carry the expected tabular extension.
    #[error("output path {path:?} must have a .csv extension")]
    InvalidFormat { path: PathBuf },

    /// An existing dataset file could not be read back for merging.
    #[error("failed to load prior dataset from {path:?}: {reason}")]
    Merge { path: PathBuf, reason: String },

    /// A retried operation exhausted its attempts.
    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: Box<CrawlError>,
    },

    #[error("webdriver command failed: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl CrawlError {
    /// True for errors worth retrying when opening a browser session.
    pub fn is_initialization(&self) -> bool {
        matches!(self, CrawlError::Initialization(_))
    }

    /// True for element-wait timeouts (the only kind the collector retries).
    pub fn is_wait_timeout(&self) -> bool {
        matches!(self, CrawlError::WaitTimeout { .. })
    }
}

impl From<fantoccini::error::NewSessionError> for CrawlError {
    fn from(e: fantoccini::error::NewSessionError) -> Self {
        CrawlError::Initialization(e.to_string())
    }
}
