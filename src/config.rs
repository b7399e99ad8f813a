use crate::error::CrawlError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CSS selectors for the four record fields on a detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSelectors {
    #[serde(default = "default_name_selector")]
    pub name: String,

    #[serde(default = "default_location_selector")]
    pub location: String,

    #[serde(default = "default_activities_selector")]
    pub activities: String,

    #[serde(default = "default_address_selector")]
    pub address: String,
}

impl Default for FieldSelectors {
    fn default() -> Self {
        Self {
            name: default_name_selector(),
            location: default_location_selector(),
            activities: default_activities_selector(),
            address: default_address_selector(),
        }
    }
}

/// Configuration for a crawl run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Listing page the crawl starts from.
    #[serde(default = "default_start_url")]
    pub start_url: String,

    /// Fixed origin used to resolve relative hrefs.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Selector matching the detail-page anchors on the listing.
    #[serde(default = "default_link_selector")]
    pub link_selector: String,

    /// Selector matching the "next page" control.
    #[serde(default = "default_next_selector")]
    pub next_selector: String,

    /// URL for the WebDriver instance.
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a visible window.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Directory the browser uses for downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,

    /// Page-load timeout in seconds.
    #[serde(default = "default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,

    /// How long to wait for listing anchors to appear, in seconds.
    #[serde(default = "default_element_wait_secs")]
    pub element_wait_secs: u64,

    /// How long to wait for the pagination control, in seconds.
    #[serde(default = "default_pagination_wait_secs")]
    pub pagination_wait_secs: u64,

    /// Per-request timeout for detail-page fetches, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Where the merged dataset is written.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Field selectors for detail-page extraction.
    #[serde(default)]
    pub fields: FieldSelectors,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_url: default_start_url(),
            base_url: default_base_url(),
            link_selector: default_link_selector(),
            next_selector: default_next_selector(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            download_dir: None,
            page_load_timeout_secs: default_page_load_timeout_secs(),
            element_wait_secs: default_element_wait_secs(),
            pagination_wait_secs: default_pagination_wait_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            output_path: default_output_path(),
            fields: FieldSelectors::default(),
        }
    }
}

impl CrawlConfig {
    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CrawlError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| CrawlError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Apply the `WEBDRIVER_URL` environment override, if set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }

    /// Sibling path holding the previous run's output.
    ///
    /// `listings.csv` rotates to `listings_backup.csv`.
    pub fn backup_path(&self) -> PathBuf {
        let stem = self
            .output_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset");
        self.output_path.with_file_name(format!("{stem}_backup.csv"))
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn element_wait(&self) -> Duration {
        Duration::from_secs(self.element_wait_secs)
    }

    pub fn pagination_wait(&self) -> Duration {
        Duration::from_secs(self.pagination_wait_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn default_start_url() -> String {
    "https://conservio.com/places-to-stay/".to_string()
}

fn default_base_url() -> String {
    "https://conservio.com".to_string()
}

fn default_link_selector() -> String {
    "div.swiper-slide.swiper-slide-next > a#location-card-mp".to_string()
}

fn default_next_selector() -> String {
    "button#nextBtn".to_string()
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_page_load_timeout_secs() -> u64 {
    300
}

fn default_element_wait_secs() -> u64 {
    50
}

fn default_pagination_wait_secs() -> u64 {
    10
}

fn default_fetch_timeout_secs() -> u64 {
    60
}

fn default_output_path() -> PathBuf {
    PathBuf::from("conservio_data.csv")
}

fn default_name_selector() -> String {
    "h1#title".to_string()
}

fn default_location_selector() -> String {
    "p.map_address".to_string()
}

fn default_activities_selector() -> String {
    "h3.uppercase.text-sm.font-bold".to_string()
}

fn default_address_selector() -> String {
    "div.flex.flex-row.items-center > a".to_string()
}
