// src/pipeline/crawl.rs

//! Crawl orchestration.
//!
//! Page 0 is fetched alone and planned; the remaining pages are then issued
//! in ascending order, at most `max_concurrent` in flight. Responses may
//! complete in any order and are attributed to the page that requested them.
//! Only page 0 can fail the crawl; later failures are recorded per page.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::watch;

use crate::error::{AppError, Result};
use crate::models::{
    Config, CrawlResult, CrawlState, EntryOrdering, PageError, PagePlan, RawResponse,
    SearchCriteria, TextEntry,
};
use crate::services::{
    Backend, Fetch, HttpFetcher, PageQuery, PageRequest, PaginationPlanner, ResponseExtractor,
};

/// Drives one crawl at a time against a backend through a [`Fetch`] capability.
///
/// Holds no per-crawl state: every call to [`JurisCrawler::run`] owns its own
/// accumulator, so concurrent crawls never share results.
pub struct JurisCrawler<F> {
    backend: Backend,
    planner: PaginationPlanner,
    extractor: ResponseExtractor,
    fetcher: F,
    max_concurrent: usize,
    ordering: EntryOrdering,
}

impl<F: Fetch> JurisCrawler<F> {
    /// Fails when `config` does not pass [`Config::validate`].
    pub fn new(config: &Config, backend: Backend, fetcher: F) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            planner: PaginationPlanner::new(
                config.search.page_size,
                config.legacy.per_page,
                &config.legacy.page_indicator_selector,
            )?,
            extractor: ResponseExtractor::new(&config.search.text_field)?,
            fetcher,
            max_concurrent: config.crawler.max_concurrent,
            ordering: config.crawler.ordering,
        })
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Run a full crawl.
    pub async fn run(&self, criteria: &SearchCriteria) -> Result<CrawlResult> {
        let (_keep_open, cancel) = watch::channel(false);
        self.run_until(criteria, cancel).await
    }

    /// Run a crawl that stops early once `cancel` turns `true`.
    ///
    /// A cancelled crawl returns the entries of every page completed so far
    /// in state [`CrawlState::Cancelled`]; requests still in flight are
    /// abandoned. Cancellation is checked before every dispatch, so an
    /// already-cancelled crawl issues nothing.
    pub async fn run_until(
        &self,
        criteria: &SearchCriteria,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<CrawlResult> {
        let started_at = Utc::now();
        let mut state = CrawlState::NotStarted;

        log::info!(
            "Starting {} crawl for '{}'",
            self.backend.name(),
            criteria.job_key()
        );

        advance(&mut state, CrawlState::FirstPageInFlight);
        let first_request = match self.backend.request(criteria, 0) {
            Ok(PageQuery::Fetch(request)) => request,
            Ok(PageQuery::WindowExhausted { offset, .. }) => {
                log::info!("Result window is empty (offset {offset}); nothing to fetch");
                advance(&mut state, CrawlState::Planning);
                advance(&mut state, CrawlState::Draining);
                advance(&mut state, CrawlState::Complete);
                return Ok(empty_result(state, started_at));
            }
            Err(e) => return Err(fail(&mut state, e)),
        };

        let first = tokio::select! {
            biased;
            _ = cancel_requested(&mut cancel) => {
                log::warn!("Crawl cancelled before the first page arrived");
                advance(&mut state, CrawlState::Cancelled);
                return Ok(empty_result(state, started_at));
            }
            outcome = self.fetch_page(&first_request) => match outcome {
                Ok(response) => response,
                Err(e) => return Err(fail(&mut state, e)),
            },
        };

        advance(&mut state, CrawlState::Planning);
        let mut collector = Collector::new(self.ordering);
        collector.push(0, self.extractor.extract(&first));
        let plan = match self.planner.plan(&first) {
            Ok(plan) => plan,
            Err(e) => return Err(fail(&mut state, e)),
        };
        log_plan(&plan, &first);

        advance(
            &mut state,
            if plan.remaining().is_empty() {
                CrawlState::Draining
            } else {
                CrawlState::FanningOut
            },
        );

        // Requests are built only as the fan-out pulls them, so the page
        // count never dictates how much is allocated up front.
        let issued = AtomicUsize::new(0);
        let exhausted = AtomicBool::new(false);
        let mut pages = plan.remaining();
        let requests = std::iter::from_fn(|| {
            let Some(page) = pages.next() else {
                exhausted.store(true, Ordering::Relaxed);
                return None;
            };
            match self.backend.request(criteria, page) {
                Ok(PageQuery::Fetch(request)) => Some(Ok(request)),
                Ok(PageQuery::WindowExhausted { page, offset }) => {
                    log::info!(
                        "Result window ends at offset {offset}; stopping before page {page} of {}",
                        plan.total_pages
                    );
                    exhausted.store(true, Ordering::Relaxed);
                    None
                }
                Err(e) => Some(Err((page, e))),
            }
        })
        .fuse();

        let mut responses = stream::iter(requests)
            .map(|request| {
                issued.fetch_add(1, Ordering::Relaxed);
                async move {
                    match request {
                        Ok(request) => {
                            log::debug!("Dispatching page {} to {}", request.page, request.url);
                            let outcome = self.fetch_page(&request).await;
                            (request.page, outcome)
                        }
                        Err((page, e)) => (page, Err(e)),
                    }
                }
            })
            .buffer_unordered(self.max_concurrent);

        let mut errors = Vec::new();
        let mut pages_fetched = 1;
        let mut cancelled = false;
        loop {
            tokio::select! {
                biased;
                _ = cancel_requested(&mut cancel) => {
                    log::warn!("Crawl cancelled; keeping {pages_fetched} completed pages");
                    cancelled = true;
                    break;
                }
                next = responses.next() => {
                    let Some((page, outcome)) = next else {
                        break;
                    };
                    match outcome {
                        Ok(response) => {
                            pages_fetched += 1;
                            collector.push(page, self.extractor.extract(&response));
                        }
                        Err(e) => {
                            let error = AppError::page(page, e);
                            log::warn!("{error}");
                            errors.push(PageError {
                                page,
                                message: error.to_string(),
                            });
                        }
                    }
                    if state == CrawlState::FanningOut && exhausted.load(Ordering::Relaxed) {
                        log::debug!(
                            "All {} page requests issued",
                            issued.load(Ordering::Relaxed)
                        );
                        advance(&mut state, CrawlState::Draining);
                    }
                }
            }
        }

        if cancelled {
            advance(&mut state, CrawlState::Cancelled);
        } else {
            if state == CrawlState::FanningOut {
                advance(&mut state, CrawlState::Draining);
            }
            advance(&mut state, CrawlState::Complete);
        }

        errors.sort_by_key(|e| e.page);
        let result = CrawlResult {
            entries: collector.finish(),
            pages_fetched,
            total_pages: plan.total_pages,
            errors,
            state,
            started_at,
            finished_at: Utc::now(),
        };

        log::info!(
            "Crawl {:?}: {} entries from {} pages ({} failed)",
            result.state,
            result.entries.len(),
            result.pages_fetched,
            result.errors.len()
        );
        Ok(result)
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<RawResponse> {
        let text = self
            .fetcher
            .fetch(&request.url, request.body.as_ref())
            .await?;
        self.backend.decode(&text)
    }
}

/// Build an HTTP crawler from configuration and run it once.
pub async fn run_crawler(
    config: &Config,
    criteria: &SearchCriteria,
    legacy: bool,
    cancel: watch::Receiver<bool>,
) -> Result<CrawlResult> {
    let backend = if legacy {
        Backend::rendered(&config.legacy)?
    } else {
        Backend::structured(&config.search)
    };
    let fetcher = HttpFetcher::new(&config.crawler)?;
    JurisCrawler::new(config, backend, fetcher)?
        .run_until(criteria, cancel)
        .await
}

/// Per-crawl entry accumulator.
enum Collector {
    /// Out-of-order pages wait here until the crawl finishes
    Ascending(BTreeMap<usize, Vec<TextEntry>>),
    Completion(Vec<TextEntry>),
}

impl Collector {
    fn new(ordering: EntryOrdering) -> Self {
        match ordering {
            EntryOrdering::Ascending => Self::Ascending(BTreeMap::new()),
            EntryOrdering::Completion => Self::Completion(Vec::new()),
        }
    }

    fn push(&mut self, page: usize, entries: Vec<TextEntry>) {
        match self {
            Self::Ascending(pages) => {
                pages.insert(page, entries);
            }
            Self::Completion(all) => all.extend(entries),
        }
    }

    fn finish(self) -> Vec<TextEntry> {
        match self {
            Self::Ascending(pages) => pages.into_values().flatten().collect(),
            Self::Completion(all) => all,
        }
    }
}

/// Result of a crawl that ended before any page was collected.
fn empty_result(state: CrawlState, started_at: DateTime<Utc>) -> CrawlResult {
    CrawlResult {
        entries: Vec::new(),
        pages_fetched: 0,
        total_pages: 0,
        errors: Vec::new(),
        state,
        started_at,
        finished_at: Utc::now(),
    }
}

fn advance(state: &mut CrawlState, next: CrawlState) {
    debug_assert!(
        state.can_advance_to(next),
        "illegal crawl transition {state:?} -> {next:?}"
    );
    log::debug!("Crawl state {state:?} -> {next:?}");
    *state = next;
}

/// Move to `Failed` and turn the cause into a planning error.
fn fail(state: &mut CrawlState, cause: AppError) -> AppError {
    advance(state, CrawlState::Failed);
    let error = match cause {
        AppError::Planning { .. } => cause,
        other => AppError::planning(format!("first page: {other}")),
    };
    log::error!("{error}");
    error
}

fn log_plan(plan: &PagePlan, first: &RawResponse) {
    match first {
        RawResponse::StructuredHits(hits) => log::info!(
            "Planned {} pages of {} ({} hits)",
            plan.total_pages,
            plan.per_page,
            hits.total().unwrap_or_default()
        ),
        RawResponse::RenderedDocument(_) => {
            log::info!("Planned {} listing pages", plan.total_pages)
        }
    }
}

/// Resolves once the watch holds `true`; never resolves if the sender is gone.
async fn cancel_requested(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
