use crate::collector::{self, LinkSet};
use crate::config::CrawlConfig;
use crate::dataset::{self, DatasetWriter, Record};
use crate::error::CrawlError;
use crate::extractor::PageExtractor;
use crate::session::BrowserSession;
use std::path::Path;
use url::Url;

/// State of the "next page" control, read from the live page each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationState {
    /// The control is present and clickable.
    Ready,
    /// The control reports itself disabled: the last page is showing.
    Disabled,
}

/// The listing page as the crawl loop sees it.
///
/// The production implementation is a live WebDriver page; tests drive the
/// loop with a scripted one.
#[allow(async_fn_in_trait)]
pub trait ListingSurface {
    /// Collects detail-page links from the current page state. A wait
    /// timeout yields a partial (possibly empty) set; a structural
    /// WebDriver failure is an error.
    async fn collect_links(&mut self) -> Result<LinkSet, CrawlError>;

    /// Re-locates the pagination control on the (possibly re-rendered)
    /// page and reports its state. Missing control is a structural error.
    async fn pagination(&mut self) -> Result<PaginationState, CrawlError>;

    /// Activates the pagination control, triggering a client-side
    /// re-render of the listing.
    async fn advance(&mut self) -> Result<(), CrawlError>;
}

/// Summary of a completed run.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrawlReport {
    /// Listing pages fully processed (collected, extracted, persisted).
    pub pages: usize,
    /// Rows written across all cycles, sentinel rows included.
    pub records: usize,
}

/// [`ListingSurface`] backed by the live browser session.
pub struct LiveListing<'a> {
    session: &'a BrowserSession,
    config: &'a CrawlConfig,
    base: Url,
}

impl ListingSurface for LiveListing<'_> {
    async fn collect_links(&mut self) -> Result<LinkSet, CrawlError> {
        collector::collect(
            self.session,
            &self.config.link_selector,
            &self.base,
            self.config.element_wait(),
        )
        .await
    }

    async fn pagination(&mut self) -> Result<PaginationState, CrawlError> {
        let control = self.locate_control().await?;
        // Any value of the attribute, including "", means disabled.
        match control.attr("disabled").await? {
            Some(_) => Ok(PaginationState::Disabled),
            None => Ok(PaginationState::Ready),
        }
    }

    async fn advance(&mut self) -> Result<(), CrawlError> {
        // Re-locate instead of reusing the element from pagination(): the
        // reference may have gone stale across the intervening awaits.
        let control = self.locate_control().await?;
        control.click().await?;
        Ok(())
    }
}

impl LiveListing<'_> {
    async fn locate_control(&self) -> Result<fantoccini::elements::Element, CrawlError> {
        let selector = &self.config.next_selector;
        let mut elements = self
            .session
            .wait_for_elements(selector, self.config.pagination_wait())
            .await
            .map_err(|e| match e {
                CrawlError::WaitTimeout { selector } => {
                    CrawlError::PaginationLost { selector }
                }
                other => other,
            })?;
        if elements.is_empty() {
            return Err(CrawlError::PaginationLost {
                selector: selector.clone(),
            });
        }
        Ok(elements.remove(0))
    }
}

/// Runs a full crawl: backup rotation, session open, pagination loop,
/// and unconditional session teardown.
pub async fn run(config: &CrawlConfig) -> Result<CrawlReport, CrawlError> {
    dataset::rotate_backup(&config.output_path, &config.backup_path())?;

    let extractor = PageExtractor::new(config)?;
    let base = Url::parse(&config.base_url)
        .map_err(|e| CrawlError::Config(format!("invalid base url: {e}")))?;

    let session = BrowserSession::open(config).await?;
    let result = drive(&session, config, &extractor, base).await;

    // The session is released on every path, success or abort.
    if let Err(e) = session.close().await {
        ::log::warn!("Failed to close WebDriver session: {}", e);
    }

    match &result {
        Ok(report) => ::log::info!(
            "Crawl complete: {} pages, {} records",
            report.pages,
            report.records
        ),
        Err(e) => ::log::error!("Crawl aborted: {}", e),
    }
    result
}

async fn drive(
    session: &BrowserSession,
    config: &CrawlConfig,
    extractor: &PageExtractor,
    base: Url,
) -> Result<CrawlReport, CrawlError> {
    session.navigate(&config.start_url).await?;
    if let Ok(title) = session.title().await {
        ::log::info!("Page title: {}", title);
    }

    // No partial run begins unless the pagination control is present.
    session
        .wait_for_elements(&config.next_selector, config.pagination_wait())
        .await
        .map_err(|e| match e {
            CrawlError::WaitTimeout { selector } => {
                CrawlError::PaginationLost { selector }
            }
            other => other,
        })?;

    let mut surface = LiveListing {
        session,
        config,
        base,
    };
    crawl_pages(&mut surface, extractor, &config.output_path).await
}

/// The pagination-driven crawl loop.
///
/// Each cycle collects, extracts and persists before advancing, so a crash
/// between cycles loses at most the in-flight cycle's records. An empty
/// link set terminates the run normally; the collector has already retried
/// its wait step, so a legitimately empty final page and a persistently
/// timing-out collector are treated the same here. Structural collection
/// failures (a dead session, for one) abort instead.
pub async fn crawl_pages<S: ListingSurface>(
    surface: &mut S,
    extractor: &PageExtractor,
    output_path: &Path,
) -> Result<CrawlReport, CrawlError> {
    let mut report = CrawlReport::default();

    loop {
        let links = surface.collect_links().await?;
        if links.is_empty() {
            ::log::warn!("No hrefs collected. Exiting.");
            return Ok(report);
        }
        ::log::info!("hrefs: {}", links.len());

        let mut batch = Vec::with_capacity(links.len());
        for url in links.iter() {
            // A failed fetch still occupies its row, sentinel-filled.
            let record = extractor
                .extract(url)
                .await
                .unwrap_or_else(Record::unavailable);
            batch.push(record);
        }

        DatasetWriter::merge(output_path, &batch)?;
        report.pages += 1;
        report.records += batch.len();

        match surface.pagination().await? {
            PaginationState::Disabled => {
                ::log::info!("No more results to load. Exiting.");
                return Ok(report);
            }
            PaginationState::Ready => surface.advance().await?,
        }
    }
}
