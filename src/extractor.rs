use crate::config::CrawlConfig;
use crate::dataset::{NOT_AVAILABLE, Record};
use crate::error::CrawlError;
use scraper::{Html, Selector};

/// Fetches detail pages over plain HTTP (independently of the browser
/// session) and extracts the four record fields with fixed selectors.
pub struct PageExtractor {
    client: reqwest::Client,
    name: Selector,
    location: Selector,
    activities: Selector,
    address: Selector,
}

impl PageExtractor {
    pub fn new(config: &CrawlConfig) -> Result<Self, CrawlError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .map_err(|e| CrawlError::Config(e.to_string()))?;

        Ok(Self {
            client,
            name: parse_selector(&config.fields.name)?,
            location: parse_selector(&config.fields.location)?,
            activities: parse_selector(&config.fields.activities)?,
            address: parse_selector(&config.fields.address)?,
        })
    }

    /// Extracts a record from `url`, or returns `None` if the page could
    /// not be fetched. Never raises: a failed link must not abort the
    /// crawl. A page that fetches fine but matches no selectors still
    /// yields a record, with every field set to the sentinel.
    pub async fn extract(&self, url: &str) -> Option<Record> {
        match self.fetch(url).await {
            Ok(body) => {
                let record = self.parse(&body);
                ::log::debug!("Extracted from {}: {:?}", url, record);
                Some(record)
            }
            Err(e) => {
                ::log::warn!("HTTP request failed for {}: {}", url, e);
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        response.error_for_status()?.text().await
    }

    fn parse(&self, body: &str) -> Record {
        let doc = Html::parse_document(body);

        Record {
            name: first_text(&doc, &self.name)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            location: first_text(&doc, &self.location)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            activities: joined_text(&doc, &self.activities, ", ")
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            address: joined_text(&doc, &self.address, " ")
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}

fn parse_selector(css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css)
        .map_err(|e| CrawlError::Config(format!("invalid selector {css:?}: {e}")))
}

/// Trimmed text of the first match, if any.
fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Trimmed text of every match, joined with `separator`.
fn joined_text(doc: &Html, selector: &Selector, separator: &str) -> Option<String> {
    let parts: Vec<String> = doc
        .select(selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DETAIL_PAGE: &str = r#"
        <html><body>
            <h1 id="title">  Oakwood Cabin </h1>
            <p class="map_address mb-4">Forest of Dean, UK</p>
            <h3 class="uppercase text-sm font-bold">Hiking</h3>
            <h3 class="uppercase text-sm font-bold">Stargazing</h3>
            <div class="flex flex-row items-center">
                <a>Gloucestershire</a>
                <a>England</a>
            </div>
        </body></html>"#;

    fn extractor() -> PageExtractor {
        let mut config = CrawlConfig::default();
        config.fetch_timeout_secs = 5;
        PageExtractor::new(&config).unwrap()
    }

    #[tokio::test]
    async fn extracts_all_four_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stay/oakwood"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_PAGE))
            .mount(&server)
            .await;

        let record = extractor()
            .extract(&format!("{}/stay/oakwood", server.uri()))
            .await
            .unwrap();

        assert_eq!(record.name, "Oakwood Cabin");
        assert_eq!(record.location, "Forest of Dean, UK");
        assert_eq!(record.activities, "Hiking, Stargazing");
        assert_eq!(record.address, "Gloucestershire England");
    }

    #[tokio::test]
    async fn sparse_page_yields_sentinels_not_a_marker() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stay/bare"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><p>nothing here</p></body></html>"),
            )
            .mount(&server)
            .await;

        let record = extractor()
            .extract(&format!("{}/stay/bare", server.uri()))
            .await
            .expect("structurally valid page must yield a record");

        assert_eq!(record, Record::unavailable());
    }

    #[tokio::test]
    async fn http_error_status_yields_the_empty_marker() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stay/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = extractor()
            .extract(&format!("{}/stay/gone", server.uri()))
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn network_failure_yields_the_empty_marker() {
        // Nothing listens here; the connection is refused.
        let result = extractor().extract("http://127.0.0.1:9/stay").await;
        assert!(result.is_none());
    }
}
