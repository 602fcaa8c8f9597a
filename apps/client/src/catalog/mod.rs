//! Catalog synchronization engine.
//!
//! Decides which gateway listing backs the current view, keeps the
//! [`WordCache`] in step with it, and applies word mutations optimistically
//! (see `mutations`). All cache writes go through this engine.

mod mutations;
pub mod settlement;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use word_core::{
    Category, FilterMode, Page, PageQuery, PageState, StatusCode, WordId, WordRecord,
};

use crate::cache::{CacheMutation, Provisional, Snapshot, WordCache};
use crate::error::Result;
use crate::gateway::WordGateway;

pub use settlement::Settlement;

/// Page size used to walk the global forgotten listing.
const REVIEW_PAGE_SIZE: usize = 200;

/// Result of a page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response replaced the cached page.
    Applied {
        page: usize,
        total_pages: usize,
        total_elements: u64,
    },
    /// No active category; the cache was emptied without a request.
    NoCategory,
    /// The view changed while the request was in flight; response dropped.
    Stale,
}

/// Clock-derived ids for provisional records, strictly increasing.
#[derive(Debug, Default)]
struct ProvisionalIds {
    last: AtomicU64,
}

impl ProvisionalIds {
    fn next(&self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self.last.compare_exchange_weak(
                last,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

/// Bookkeeping of create calls, keyed by provisional id.
#[derive(Debug, Default)]
struct CreateLedger {
    in_flight: HashSet<u64>,
    /// Deleted locally while their create was in flight.
    discarded: HashSet<u64>,
    /// Server records of confirmed creates.
    settled: HashMap<u64, WordRecord>,
}

impl CreateLedger {
    fn fate(&self, provisional_id: u64) -> Provisional {
        if let Some(canonical) = self.settled.get(&provisional_id) {
            Provisional::Confirmed(canonical.clone())
        } else if self.in_flight.contains(&provisional_id) {
            Provisional::Pending
        } else {
            Provisional::Gone
        }
    }
}

/// Inner state shared across clones.
struct CatalogInner {
    gateway: Arc<dyn WordGateway>,
    cache: Arc<WordCache>,
    view: Mutex<PageState>,
    categories: Mutex<Vec<Category>>,
    creates: Mutex<CreateLedger>,
    provisional: ProvisionalIds,
}

/// Engine keeping the word cache synchronized with the remote catalog.
///
/// Clone-able: all state lives behind an `Arc`, so remote calls can settle on
/// spawned tasks. Locks are never held across a gateway call. Nested locks
/// are taken in the order view, creates, cache.
#[derive(Clone)]
pub struct CatalogSync {
    inner: Arc<CatalogInner>,
}

impl CatalogSync {
    pub fn new(gateway: Arc<dyn WordGateway>, cache: Arc<WordCache>, page_size: usize) -> Self {
        Self {
            inner: Arc::new(CatalogInner {
                gateway,
                cache,
                view: Mutex::new(PageState::new(page_size)),
                categories: Mutex::new(Vec::new()),
                creates: Mutex::new(CreateLedger::default()),
                provisional: ProvisionalIds::default(),
            }),
        }
    }

    /// Read access to the cache this engine writes.
    pub fn cache(&self) -> &Arc<WordCache> {
        &self.inner.cache
    }

    pub async fn page_state(&self) -> PageState {
        self.inner.view.lock().await.clone()
    }

    /// Working set of categories, with the active one flagged.
    pub async fn categories(&self) -> Vec<Category> {
        self.inner.categories.lock().await.clone()
    }

    /// Load categories and open the preselected one, or the first.
    pub async fn start(&self, preselected: Option<&str>) -> Result<FetchOutcome> {
        let categories = self.fetch_categories().await?;
        let chosen = preselected
            .and_then(|id| categories.iter().find(|c| c.id == id))
            .or_else(|| categories.first())
            .map(|c| c.id.clone());

        match chosen {
            Some(id) => self.load_category(&id).await,
            None => {
                tracing::info!("no categories available");
                self.inner.view.lock().await.deselect_category();
                self.fetch_current_page().await
            }
        }
    }

    pub async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let mut categories = self.inner.gateway.fetch_categories().await?;
        let active = self.inner.view.lock().await.category_id.clone();
        for category in &mut categories {
            category.active = active.as_deref() == Some(category.id.as_str());
        }
        *self.inner.categories.lock().await = categories.clone();
        tracing::debug!(count = categories.len(), "categories loaded");
        Ok(categories)
    }

    /// Activate a category in "all" mode at page 0 and fetch it.
    pub async fn load_category(&self, category_id: &str) -> Result<FetchOutcome> {
        for category in self.inner.categories.lock().await.iter_mut() {
            category.active = category.id == category_id;
        }
        self.inner.view.lock().await.select_category(category_id);
        tracing::info!(category_id, "category selected");
        self.fetch_current_page().await
    }

    /// Show words of the active category with the given status.
    ///
    /// Entering the forgotten view also rebuilds the review set from the
    /// global forgotten listing.
    pub async fn select_status(&self, status: StatusCode) -> Result<FetchOutcome> {
        self.inner.view.lock().await.select_status(status);
        tracing::info!(%status, "status filter selected");
        if status == StatusCode::Forgotten {
            self.rebuild_review_set().await;
        }
        self.fetch_current_page().await
    }

    pub async fn show_favorites(&self) -> Result<FetchOutcome> {
        self.inner.view.lock().await.show_favorites();
        tracing::info!("favorites selected");
        self.fetch_current_page().await
    }

    pub async fn clear_filter(&self) -> Result<FetchOutcome> {
        self.inner.view.lock().await.clear_filter();
        tracing::info!("filter cleared");
        self.fetch_current_page().await
    }

    /// Set or clear the free-text query of the favorites and status views.
    pub async fn search(&self, query: Option<String>) -> Result<FetchOutcome> {
        self.inner.view.lock().await.set_query(query);
        self.fetch_current_page().await
    }

    pub async fn go_to_page(&self, index: usize) -> Result<FetchOutcome> {
        self.inner.view.lock().await.go_to_page(index);
        self.fetch_current_page().await
    }

    /// Fetch the page described by the current view and apply it.
    ///
    /// The response is dropped if the view changed while it was in flight.
    /// When the server reports fewer pages than the current index, the index
    /// is clamped and the fetch repeated once.
    pub async fn fetch_current_page(&self) -> Result<FetchOutcome> {
        let mut clamped = false;
        loop {
            let query = self.inner.view.lock().await.to_query();
            let Some(category_id) = query.category_id.clone() else {
                self.inner.cache.replace_page(Vec::new()).await;
                self.inner.view.lock().await.reset_totals();
                return Ok(FetchOutcome::NoCategory);
            };

            let page = match self.request_page(&category_id, &query).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(error = %e, %category_id, "page fetch failed");
                    return Err(e);
                }
            };

            let mut view = self.inner.view.lock().await;
            if view.to_query() != query {
                tracing::debug!(%category_id, "discarding stale page");
                return Ok(FetchOutcome::Stale);
            }
            if view.absorb(&page) && !clamped {
                clamped = true;
                tracing::debug!(page_index = view.page_index, "page index clamped, fetching again");
                continue;
            }

            let outcome = FetchOutcome::Applied {
                page: view.page_index,
                total_pages: view.total_pages,
                total_elements: view.total_elements,
            };
            self.inner.cache.replace_page(page.items).await;
            return Ok(outcome);
        }
    }

    /// Fetch one word and merge it into the cache if it is on display.
    pub async fn refresh_word(&self, id: i64) -> Result<WordRecord> {
        let record = self.inner.gateway.fetch_word(id).await?;
        self.inner
            .cache
            .reconcile(WordId::Persisted(id), record.clone())
            .await;
        Ok(record)
    }

    /// Flag a cached word for review.
    pub async fn mark_for_review(&self, id: WordId) -> bool {
        self.inner.cache.mark_for_review(id).await
    }

    pub async fn clear_review(&self, id: WordId) -> bool {
        self.inner.cache.clear_review(id).await
    }

    // === Private methods ===

    async fn request_page(&self, category_id: &str, query: &PageQuery) -> Result<Page<WordRecord>> {
        let gateway = &self.inner.gateway;
        let text = query.query.as_deref();
        match query.mode {
            FilterMode::All | FilterMode::NoneActive => {
                gateway
                    .fetch_by_category(category_id, query.page_index, query.page_size)
                    .await
            }
            FilterMode::Favorites => {
                gateway
                    .fetch_favorites(category_id, text, query.page_index, query.page_size)
                    .await
            }
            FilterMode::ByStatus(status) => {
                gateway
                    .fetch_by_category_and_status(
                        category_id,
                        status,
                        text,
                        query.page_index,
                        query.page_size,
                    )
                    .await
            }
        }
    }

    /// Replace the review set with every word of the global forgotten
    /// listing. A failed page keeps the previous set.
    async fn rebuild_review_set(&self) {
        let mut ids = Vec::new();
        let mut page_index = 0;
        loop {
            let page = match self
                .inner
                .gateway
                .fetch_by_status(StatusCode::Forgotten, page_index, REVIEW_PAGE_SIZE)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(error = %e, page_index, "could not rebuild review set");
                    return;
                }
            };
            let received = page.items.len();
            ids.extend(page.items.into_iter().map(|w| w.id));
            page_index += 1;
            if page_index >= page.total_pages || received == 0 {
                break;
            }
        }
        tracing::debug!(count = ids.len(), pages = page_index, "review set rebuilt");
        self.inner.cache.replace_review_set(ids).await;
    }

    /// Apply a cache mutation and capture the view it was made against.
    async fn apply_tracked(&self, mutation: CacheMutation) -> (Snapshot, PageQuery) {
        let view = self.inner.view.lock().await;
        let snapshot = self.inner.cache.apply(mutation).await;
        (snapshot, view.to_query())
    }

    /// Restore a snapshot unless the view moved on since it was taken.
    async fn rollback_if_current(&self, snapshot: Snapshot, expected: &PageQuery) -> bool {
        let view = self.inner.view.lock().await;
        if view.to_query() != *expected {
            tracing::warn!("view changed since the mutation started, skipping rollback");
            return false;
        }
        self.restore(snapshot).await;
        true
    }

    /// Roll the cache back to `snapshot`, with provisional records brought
    /// up to date against the create ledger.
    async fn restore(&self, snapshot: Snapshot) {
        let snapshot = {
            let creates = self.inner.creates.lock().await;
            snapshot.resolve(|provisional_id| creates.fate(provisional_id))
        };
        self.inner.cache.rollback(snapshot).await;
    }

    /// Corrective refetch after a confirmed mutation. Failures are logged.
    async fn refetch(&self, reason: &'static str) {
        tracing::debug!(reason, "refetching current page");
        if let Err(e) = self.fetch_current_page().await {
            tracing::warn!(error = %e, reason, "corrective refetch failed");
        }
    }
}
