// Re-export modules
pub mod collector;
pub mod config;
pub mod crawler;
pub mod dataset;
pub mod error;
pub mod extractor;
pub mod retry;
pub mod session;

// Re-export commonly used types for convenience
pub use config::CrawlConfig;
pub use crawler::CrawlReport;
pub use dataset::{NOT_AVAILABLE, Record};
pub use error::CrawlError;

use std::path::PathBuf;

/// Builder for a crawl run.
pub struct Crawl {
    config: CrawlConfig,
}

impl Crawl {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: CrawlConfig::default(),
        }
    }

    /// Create a builder from an existing configuration.
    pub fn with_config(config: CrawlConfig) -> Self {
        Self { config }
    }

    /// Load configuration from a JSON file.
    pub fn with_config_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, CrawlError> {
        Ok(Self {
            config: CrawlConfig::from_file(path)?,
        })
    }

    /// Set the listing page the crawl starts from.
    pub fn with_start_url(mut self, url: &str) -> Self {
        self.config.start_url = url.to_string();
        self
    }

    /// Toggle headless operation.
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    /// Set the output dataset path.
    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.config.output_path = path;
        self
    }

    /// Set the WebDriver server URL.
    pub fn with_webdriver_url(mut self, url: &str) -> Self {
        self.config.webdriver_url = url.to_string();
        self
    }

    /// Run the crawl to completion.
    ///
    /// The `WEBDRIVER_URL` environment variable, if set, overrides the
    /// configured WebDriver server.
    pub async fn run(self) -> Result<CrawlReport, CrawlError> {
        let config = self.config.with_env_overrides();
        crawler::run(&config).await
    }
}

impl Default for Crawl {
    fn default() -> Self {
        Self::new()
    }
}
