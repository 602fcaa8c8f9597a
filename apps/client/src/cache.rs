//! In-memory mirror of the page on display.
//!
//! The page is held as an `Arc<Vec<_>>` and every write builds a new vector,
//! so a snapshot is a pointer and a rollback is a swap. Write access is
//! crate-private: only the catalog engine mutates the cache.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use word_core::{WordId, WordRecord};

/// Local edit applied ahead of the remote call.
#[derive(Debug, Clone)]
pub enum CacheMutation {
    /// Insert at position 0.
    Prepend(WordRecord),
    /// Overwrite the fields of the record with the same id.
    Patch(WordRecord),
    /// Drop the record with this id.
    Remove(WordId),
    SetFavorite { id: WordId, favorite: bool },
}

/// Pre-mutation page captured by [`WordCache::apply`].
#[derive(Debug, Clone)]
pub struct Snapshot {
    page: Arc<Vec<WordRecord>>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.page.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page.is_empty()
    }

    /// Bring provisional records up to date before a rollback.
    ///
    /// Confirmed records take their server copy, records whose create failed
    /// or was discarded are dropped, pending ones are kept as they are.
    pub(crate) fn resolve<F>(self, fate: F) -> Snapshot
    where
        F: Fn(u64) -> Provisional,
    {
        if !self.page.iter().any(|w| w.id.is_provisional()) {
            return self;
        }
        let page = self
            .page
            .iter()
            .filter_map(|word| match word.id {
                WordId::Persisted(_) => Some(word.clone()),
                WordId::Provisional(provisional_id) => match fate(provisional_id) {
                    Provisional::Pending => Some(word.clone()),
                    Provisional::Confirmed(canonical) => Some(canonical),
                    Provisional::Gone => None,
                },
            })
            .collect();
        Snapshot {
            page: Arc::new(page),
        }
    }
}

/// Fate of a provisional record's create call.
#[derive(Debug, Clone)]
pub(crate) enum Provisional {
    Pending,
    Confirmed(WordRecord),
    /// Failed, or deleted locally before it settled.
    Gone,
}

#[derive(Debug, Default)]
struct CacheState {
    page: Arc<Vec<WordRecord>>,
    review: HashSet<WordId>,
}

impl CacheState {
    fn rewrite<F>(&mut self, edit: F) -> Snapshot
    where
        F: FnOnce(&mut Vec<WordRecord>),
    {
        let previous = Arc::clone(&self.page);
        let mut next = previous.as_ref().clone();
        edit(&mut next);
        self.page = Arc::new(next);
        Snapshot { page: previous }
    }
}

/// Current page of words plus the ids flagged for review.
#[derive(Debug, Default)]
pub struct WordCache {
    state: Mutex<CacheState>,
}

impl WordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current page.
    pub async fn words(&self) -> Vec<WordRecord> {
        self.state.lock().await.page.as_ref().clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.page.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.page.is_empty()
    }

    /// Copy of the record with this id.
    pub async fn find_by_id(&self, id: WordId) -> Option<WordRecord> {
        self.state
            .lock()
            .await
            .page
            .iter()
            .find(|w| w.id == id)
            .cloned()
    }

    pub async fn is_under_review(&self, id: WordId) -> bool {
        self.state.lock().await.review.contains(&id)
    }

    /// Cached records flagged for review, in page order.
    pub async fn review_words(&self) -> Vec<WordRecord> {
        let state = self.state.lock().await;
        state
            .page
            .iter()
            .filter(|w| state.review.contains(&w.id))
            .cloned()
            .collect()
    }

    pub(crate) async fn replace_page(&self, items: Vec<WordRecord>) {
        self.state.lock().await.page = Arc::new(items);
    }

    pub(crate) async fn apply(&self, mutation: CacheMutation) -> Snapshot {
        let mut state = self.state.lock().await;
        match mutation {
            CacheMutation::Prepend(word) => state.rewrite(|page| page.insert(0, word)),
            CacheMutation::Patch(word) => state.rewrite(|page| {
                if let Some(slot) = page.iter_mut().find(|w| w.id == word.id) {
                    *slot = word;
                }
            }),
            CacheMutation::Remove(id) => state.rewrite(|page| page.retain(|w| w.id != id)),
            CacheMutation::SetFavorite { id, favorite } => state.rewrite(|page| {
                if let Some(slot) = page.iter_mut().find(|w| w.id == id) {
                    slot.favorite = favorite;
                }
            }),
        }
    }

    pub(crate) async fn rollback(&self, snapshot: Snapshot) {
        self.state.lock().await.page = snapshot.page;
    }

    /// Replace the record identified by `target` with the server's copy.
    ///
    /// Returns false without touching the page when `target` is no longer
    /// cached.
    pub(crate) async fn reconcile(&self, target: WordId, canonical: WordRecord) -> bool {
        let mut state = self.state.lock().await;
        let Some(position) = state.page.iter().position(|w| w.id == target) else {
            return false;
        };
        let new_id = canonical.id;
        state.rewrite(|page| page[position] = canonical);
        if new_id != target && state.review.remove(&target) {
            state.review.insert(new_id);
        }
        true
    }

    /// Remove by id. Returns whether a record was removed.
    pub(crate) async fn remove(&self, id: WordId) -> bool {
        let mut state = self.state.lock().await;
        if !state.page.iter().any(|w| w.id == id) {
            return false;
        }
        state.rewrite(|page| page.retain(|w| w.id != id));
        state.review.remove(&id);
        true
    }

    /// Flag a cached record for review. Unknown ids are ignored.
    pub(crate) async fn mark_for_review(&self, id: WordId) -> bool {
        let mut state = self.state.lock().await;
        if state.page.iter().any(|w| w.id == id) {
            state.review.insert(id)
        } else {
            false
        }
    }

    pub(crate) async fn clear_review(&self, id: WordId) -> bool {
        self.state.lock().await.review.remove(&id)
    }

    pub(crate) async fn replace_review_set(&self, ids: impl IntoIterator<Item = WordId>) {
        self.state.lock().await.review = ids.into_iter().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn word(id: i64, title: &str) -> WordRecord {
        WordRecord {
            id: WordId::Persisted(id),
            title: title.to_string(),
            meaning: format!("{title} meaning"),
            image_url: None,
            favorite: false,
            category: "home".to_string(),
        }
    }

    async fn seeded() -> WordCache {
        let cache = WordCache::new();
        cache
            .replace_page(vec![word(1, "Casa"), word(2, "Mesa"), word(3, "Silla")])
            .await;
        cache
    }

    #[tokio::test]
    async fn rollback_restores_exact_sequence() {
        let cache = seeded().await;
        let before = cache.words().await;

        let snapshot = cache.apply(CacheMutation::Remove(WordId::Persisted(2))).await;
        cache
            .apply(CacheMutation::Prepend(word(9, "Puerta")))
            .await;
        assert_eq!(cache.len().await, 3);

        cache.rollback(snapshot).await;
        assert_eq!(cache.words().await, before);
    }

    #[tokio::test]
    async fn snapshot_survives_reads() {
        let cache = seeded().await;
        let snapshot = cache
            .apply(CacheMutation::SetFavorite {
                id: WordId::Persisted(1),
                favorite: true,
            })
            .await;
        assert_eq!(snapshot.len(), 3);
        assert!(cache.find_by_id(WordId::Persisted(1)).await.unwrap().favorite);

        cache.rollback(snapshot).await;
        assert!(!cache.find_by_id(WordId::Persisted(1)).await.unwrap().favorite);
    }

    #[tokio::test]
    async fn find_by_id_returns_a_copy() {
        let cache = seeded().await;
        let mut found = cache.find_by_id(WordId::Persisted(1)).await.unwrap();
        found.title = "changed".to_string();
        assert_eq!(
            cache.find_by_id(WordId::Persisted(1)).await.unwrap().title,
            "Casa"
        );
    }

    #[tokio::test]
    async fn patch_overwrites_matching_record_only() {
        let cache = seeded().await;
        let mut edited = word(2, "Mesita");
        edited.favorite = true;
        cache.apply(CacheMutation::Patch(edited.clone())).await;
        cache.apply(CacheMutation::Patch(word(99, "ghost"))).await;

        let words = cache.words().await;
        assert_eq!(words.len(), 3);
        assert_eq!(words[1], edited);
    }

    #[tokio::test]
    async fn reconcile_swaps_provisional_for_canonical() {
        let cache = seeded().await;
        let mut provisional = word(0, "Sol");
        provisional.id = WordId::Provisional(1_700_000_000_000);
        cache.apply(CacheMutation::Prepend(provisional.clone())).await;
        cache.mark_for_review(provisional.id).await;

        let canonical = WordRecord {
            id: WordId::Persisted(42),
            ..provisional.clone()
        };
        assert!(cache.reconcile(provisional.id, canonical.clone()).await);

        let words = cache.words().await;
        assert_eq!(words[0], canonical);
        assert!(cache.is_under_review(WordId::Persisted(42)).await);
        assert!(!cache.is_under_review(provisional.id).await);
    }

    #[tokio::test]
    async fn reconcile_of_removed_record_is_a_no_op() {
        let cache = seeded().await;
        let before = cache.words().await;
        assert!(!cache.reconcile(WordId::Provisional(5), word(42, "Sol")).await);
        assert_eq!(cache.words().await, before);
    }

    #[tokio::test]
    async fn review_marks_require_a_cached_record() {
        let cache = seeded().await;
        assert!(cache.mark_for_review(WordId::Persisted(3)).await);
        assert!(!cache.mark_for_review(WordId::Persisted(77)).await);

        let review = cache.review_words().await;
        assert_eq!(review, vec![word(3, "Silla")]);

        assert!(cache.remove(WordId::Persisted(3)).await);
        assert!(!cache.is_under_review(WordId::Persisted(3)).await);
        assert!(!cache.remove(WordId::Persisted(3)).await);
    }

    #[tokio::test]
    async fn resolved_snapshot_carries_settled_creates() {
        let cache = seeded().await;
        let mut confirmed = word(0, "Sol");
        confirmed.id = WordId::Provisional(10);
        let mut failed = word(0, "Luna");
        failed.id = WordId::Provisional(11);
        let mut pending = word(0, "Río");
        pending.id = WordId::Provisional(12);
        for record in [&pending, &failed, &confirmed] {
            cache.apply(CacheMutation::Prepend(record.clone())).await;
        }
        let snapshot = cache.apply(CacheMutation::Remove(WordId::Persisted(1))).await;

        let canonical = WordRecord {
            id: WordId::Persisted(42),
            ..confirmed.clone()
        };
        let resolved = snapshot.resolve(|provisional_id| match provisional_id {
            10 => Provisional::Confirmed(canonical.clone()),
            11 => Provisional::Gone,
            _ => Provisional::Pending,
        });
        cache.rollback(resolved).await;

        assert_eq!(
            cache.words().await,
            vec![
                canonical.clone(),
                pending,
                word(1, "Casa"),
                word(2, "Mesa"),
                word(3, "Silla")
            ]
        );
    }

    #[tokio::test]
    async fn replace_review_set_overrides_previous_marks() {
        let cache = seeded().await;
        cache.mark_for_review(WordId::Persisted(1)).await;
        cache
            .replace_review_set([WordId::Persisted(2), WordId::Persisted(3)])
            .await;
        assert!(!cache.is_under_review(WordId::Persisted(1)).await);
        assert_eq!(cache.review_words().await.len(), 2);
    }
}
