use crate::config::CrawlConfig;
use crate::error::CrawlError;
use crate::retry::RetryPolicy;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder, Locator};
use std::time::Duration;

/// Owns exactly one live WebDriver session.
///
/// Created once per run and closed exactly once, on every exit path. The
/// session id stands in for the external process identifier, since the
/// browser process itself belongs to the WebDriver server we connect to.
pub struct BrowserSession {
    client: Client,
    session_id: Option<String>,
}

impl BrowserSession {
    /// Opens a session, retrying transient initialization failures
    /// (3 attempts, 1 second fixed delay).
    pub async fn open(config: &CrawlConfig) -> Result<Self, CrawlError> {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        policy
            .run(
                "webdriver initialization",
                CrawlError::is_initialization,
                || {
                    let config = config.clone();
                    async move { Self::connect(&config).await }
                },
            )
            .await
    }

    async fn connect(config: &CrawlConfig) -> Result<Self, CrawlError> {
        ::log::info!("Initializing WebDriver session at {}", config.webdriver_url);

        let client = ClientBuilder::native()
            .capabilities(build_capabilities(config))
            .connect(&config.webdriver_url)
            .await?;

        // Page loads block up to this long before goto() reports a timeout.
        client
            .update_timeouts(TimeoutConfiguration::new(
                None,
                Some(config.page_load_timeout()),
                None,
            ))
            .await?;

        let session_id = client.session_id().await?;
        match &session_id {
            Some(id) => ::log::info!("WebDriver session started: {}", id),
            None => ::log::warn!("WebDriver session started without an id"),
        }

        Ok(Self { client, session_id })
    }

    /// Blocking navigation; a load exceeding the configured page-load
    /// timeout surfaces as [`CrawlError::NavigationTimeout`].
    pub async fn navigate(&self, url: &str) -> Result<(), CrawlError> {
        ::log::debug!("Navigating to {}", url);
        self.client.goto(url).await.map_err(|e| {
            if e.to_string().contains("timeout") {
                CrawlError::NavigationTimeout {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            } else {
                CrawlError::WebDriver(e)
            }
        })
    }

    /// Blocks until at least one element matches `selector`, then returns
    /// all current matches. Timeout maps to [`CrawlError::WaitTimeout`].
    pub async fn wait_for_elements(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<Element>, CrawlError> {
        match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
        {
            Ok(_) => Ok(self.client.find_all(Locator::Css(selector)).await?),
            Err(CmdError::WaitTimeout) => Err(CrawlError::WaitTimeout {
                selector: selector.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Title of the current page, for progress logging.
    pub async fn title(&self) -> Result<String, CrawlError> {
        Ok(self.client.title().await?)
    }

    /// Ends the WebDriver session. Consumes the handle so it cannot be
    /// closed twice.
    pub async fn close(self) -> Result<(), CrawlError> {
        self.client.close().await?;
        match self.session_id {
            Some(id) => ::log::info!("WebDriver session stopped: {}", id),
            None => ::log::info!("WebDriver session stopped"),
        }
        Ok(())
    }
}

/// Builds Chrome capabilities from the crawl configuration: headless mode,
/// image loading suppressed to cut page weight, download directory pinned.
fn build_capabilities(config: &CrawlConfig) -> serde_json::map::Map<String, serde_json::Value> {
    let mut args = vec![
        "--disable-logging".to_string(),
        "--start-maximized".to_string(),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
    }

    let mut prefs = serde_json::json!({
        "download.prompt_for_download": false,
        "safebrowsing.enabled": true,
        "profile.managed_default_content_settings.images": 2,
        "profile.managed_default_content_settings.javascript": 1,
    });
    if let Some(dir) = &config.download_dir {
        prefs["download.default_directory"] =
            serde_json::json!(dir.display().to_string());
    }

    let mut caps = serde_json::map::Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        serde_json::json!({ "args": args, "prefs": prefs }),
    );
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_include_headless_flag_only_when_requested() {
        let mut config = CrawlConfig::default();
        config.headless = true;
        let caps = build_capabilities(&config);
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));

        config.headless = false;
        let caps = build_capabilities(&config);
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a == "--headless=new"));
    }

    #[test]
    fn capabilities_block_image_loading() {
        let caps = build_capabilities(&CrawlConfig::default());
        let prefs = &caps["goog:chromeOptions"]["prefs"];
        assert_eq!(
            prefs["profile.managed_default_content_settings.images"],
            serde_json::json!(2)
        );
    }
}
