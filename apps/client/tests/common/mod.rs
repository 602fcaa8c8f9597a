//! Shared test infrastructure for the sync client integration tests.
//!
//! - `ScriptedGateway` wraps the in-memory catalog and can fail or hold
//!   individual calls
//! - `Harness` wires a catalog engine to it

pub mod fixtures;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use word_core::{Category, Page, StatusCode, WordRecord};

use word_sync::{CatalogSync, InMemoryGateway, Result, SyncError, WordCache, WordDraft, WordGateway};

/// Gateway operations that can be scripted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Categories,
    ByCategory,
    ByCategoryAndStatus,
    Favorites,
    ByStatus,
    FetchWord,
    Create,
    Update,
    Delete,
    ChangeStatus,
}

/// In-memory gateway whose calls can be made to fail or to wait.
pub struct ScriptedGateway {
    pub store: InMemoryGateway,
    failing: Mutex<HashSet<Op>>,
    gates: Mutex<HashMap<Op, Arc<Notify>>>,
    calls: Mutex<Vec<Op>>,
}

impl ScriptedGateway {
    pub fn new(store: InMemoryGateway) -> Arc<Self> {
        Arc::new(Self {
            store,
            failing: Mutex::new(HashSet::new()),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Make every later call of `op` fail with a 500.
    pub fn fail(&self, op: Op) {
        self.failing.lock().unwrap().insert(op);
    }

    /// Hold the next call of `op` until the returned gate is notified.
    pub fn hold(&self, op: Op) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(op, gate.clone());
        gate
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn enter(&self, op: Op) -> Result<()> {
        self.calls.lock().unwrap().push(op);
        let gate = self.gates.lock().unwrap().remove(&op);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing.lock().unwrap().contains(&op) {
            return Err(SyncError::Backend {
                status: 500,
                message: format!("scripted failure: {op:?}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl WordGateway for ScriptedGateway {
    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.enter(Op::Categories).await?;
        self.store.fetch_categories().await
    }

    async fn fetch_by_category(
        &self,
        category_id: &str,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>> {
        self.enter(Op::ByCategory).await?;
        self.store.fetch_by_category(category_id, page, size).await
    }

    async fn fetch_by_category_and_status(
        &self,
        category_id: &str,
        status: StatusCode,
        query: Option<&str>,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>> {
        self.enter(Op::ByCategoryAndStatus).await?;
        self.store
            .fetch_by_category_and_status(category_id, status, query, page, size)
            .await
    }

    async fn fetch_favorites(
        &self,
        category_id: &str,
        query: Option<&str>,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>> {
        self.enter(Op::Favorites).await?;
        self.store
            .fetch_favorites(category_id, query, page, size)
            .await
    }

    async fn fetch_by_status(
        &self,
        status: StatusCode,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>> {
        self.enter(Op::ByStatus).await?;
        self.store.fetch_by_status(status, page, size).await
    }

    async fn fetch_word(&self, id: i64) -> Result<WordRecord> {
        self.enter(Op::FetchWord).await?;
        self.store.fetch_word(id).await
    }

    async fn create(&self, draft: &WordDraft) -> Result<WordRecord> {
        self.enter(Op::Create).await?;
        self.store.create(draft).await
    }

    async fn update(&self, id: i64, draft: &WordDraft) -> Result<WordRecord> {
        self.enter(Op::Update).await?;
        self.store.update(id, draft).await
    }

    async fn delete(&self, id: i64) -> Result<i64> {
        self.enter(Op::Delete).await?;
        self.store.delete(id).await
    }

    async fn change_status(&self, id: i64, status: StatusCode) -> Result<WordRecord> {
        self.enter(Op::ChangeStatus).await?;
        self.store.change_status(id, status).await
    }
}

/// Catalog engine wired to a scripted gateway.
pub struct Harness {
    pub gateway: Arc<ScriptedGateway>,
    pub catalog: CatalogSync,
}

impl Harness {
    pub fn new(store: InMemoryGateway, page_size: usize) -> Self {
        let gateway = ScriptedGateway::new(store);
        let catalog = CatalogSync::new(gateway.clone(), Arc::new(WordCache::new()), page_size);
        Self { gateway, catalog }
    }

    /// Titles of the cached page, in order.
    pub async fn titles(&self) -> Vec<String> {
        self.catalog
            .cache()
            .words()
            .await
            .into_iter()
            .map(|w| w.title)
            .collect()
    }

    /// Let spawned tasks run until `done` holds, with an upper bound.
    pub async fn yield_until<F>(&self, done: F)
    where
        F: Fn(&ScriptedGateway) -> bool,
    {
        for _ in 0..100 {
            if done(self.gateway.as_ref()) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("condition not reached after yielding");
    }
}
