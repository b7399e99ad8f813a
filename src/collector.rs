use crate::error::CrawlError;
use crate::retry::RetryPolicy;
use crate::session::BrowserSession;
use fantoccini::error::CmdError;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Deduplicated set of absolute URLs, preserving insertion order so that
/// extraction (and therefore dataset row order) is deterministic.
#[derive(Debug, Default, Clone)]
pub struct LinkSet {
    urls: Vec<String>,
    seen: HashSet<String>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a URL if not already present. Returns true on insertion.
    pub fn insert(&mut self, url: String) -> bool {
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.urls.push(url);
        true
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }
}

/// Resolves an href the way the listing site emits them: site-relative
/// paths (leading `/`) join the base origin, everything else is taken
/// verbatim.
pub fn resolve_href(href: &str, base: &Url) -> Option<String> {
    if href.is_empty() {
        return None;
    }
    if href.starts_with('/') {
        match base.join(href) {
            Ok(resolved) => Some(resolved.to_string()),
            Err(e) => {
                ::log::debug!("Dropping unresolvable href {:?}: {}", href, e);
                None
            }
        }
    } else {
        Some(href.to_string())
    }
}

/// Collects detail-page links from the current listing page.
///
/// The element wait is retried (3 attempts, 2 second fixed delay) against
/// wait timeouts only; if it still times out, whatever was collected is
/// returned as-is — the caller treats an empty set as the failure signal.
/// Any other WebDriver failure propagates: a dead session must abort the
/// run rather than masquerade as an empty final page. Elements that go
/// stale between enumeration and the href read are skipped, since the
/// page can re-render mid-iteration.
pub async fn collect(
    session: &BrowserSession,
    selector: &str,
    base: &Url,
    wait: Duration,
) -> Result<LinkSet, CrawlError> {
    ::log::info!("Starting to collect href attributes...");
    let mut links = LinkSet::new();

    let policy = RetryPolicy::new(3, Duration::from_secs(2));
    let elements = match policy
        .run("element wait", CrawlError::is_wait_timeout, || {
            session.wait_for_elements(selector, wait)
        })
        .await
    {
        Ok(elements) => elements,
        Err(e) if timed_out(&e) => {
            ::log::warn!("Timeout occurred while waiting for elements: {}", e);
            return Ok(links);
        }
        Err(e) => return Err(e),
    };

    for element in &elements {
        let href = match element.attr("href").await {
            Ok(Some(href)) => href,
            Ok(None) => continue,
            Err(e) if stale_reference(&e) => {
                // The page re-rendered under us; drop this one element.
                ::log::debug!("Skipping stale element: {}", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(resolved) = resolve_href(&href, base) {
            if links.insert(resolved.clone()) {
                ::log::info!("Added href: {}", resolved);
            }
        }
    }

    ::log::info!("Collected {} unique hrefs", links.len());
    Ok(links)
}

/// True when the wait step (or its retry wrapper) ran out of time. Only
/// these errors produce a partial result; everything else aborts.
fn timed_out(error: &CrawlError) -> bool {
    match error {
        CrawlError::WaitTimeout { .. } => true,
        CrawlError::RetriesExhausted { source, .. } => source.is_wait_timeout(),
        _ => false,
    }
}

/// The element reference went invalid between enumeration and the read.
fn stale_reference(error: &CmdError) -> bool {
    error.to_string().contains("stale element")
}
