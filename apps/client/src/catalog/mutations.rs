//! Optimistic word mutations.
//!
//! Each operation writes its local result into the cache, spawns the remote
//! call and returns a [`Settlement`] right away. On success the server's copy
//! replaces the local one; on failure the local write is undone.

use word_core::{FilterMode, PageQuery, StatusCode, WordForm, WordId, WordRecord};

use super::{CatalogSync, Settlement};
use crate::cache::{CacheMutation, Snapshot};
use crate::error::Result;
use crate::gateway::WordDraft;

impl CatalogSync {
    /// Insert a provisional word at the top of the page and create it remotely.
    ///
    /// On success the provisional record is swapped for the server's record,
    /// and the pair is kept so later rollbacks of older snapshots restore the
    /// server record. On failure it is removed by id; a snapshot restore could
    /// clobber pages fetched in between.
    pub async fn create_word(&self, form: WordForm) -> Settlement<WordRecord> {
        let category_id = match form.category.clone() {
            Some(id) => id,
            None => match self.inner.view.lock().await.category_id.clone() {
                Some(id) => id,
                None => {
                    tracing::debug!("no category for new word, skipping create");
                    return Settlement::Skipped;
                }
            },
        };

        let provisional_id = self.inner.provisional.next();
        let provisional = WordRecord {
            id: WordId::Provisional(provisional_id),
            title: form.title.clone(),
            meaning: form.meaning.clone(),
            image_url: form.image_preview.clone(),
            favorite: form.favorite,
            category: category_id.clone(),
        };
        let draft = WordDraft::from_form(&form, category_id);

        self.inner.creates.lock().await.in_flight.insert(provisional_id);
        self.inner
            .cache
            .apply(CacheMutation::Prepend(provisional))
            .await;
        tracing::debug!(provisional_id, "inserted provisional word");

        let engine = self.clone();
        Settlement::spawn(async move { engine.settle_create(provisional_id, draft).await })
    }

    /// Rewrite a persisted word locally and send the update.
    ///
    /// When the category changed outside a status view, the page is fetched
    /// again so the word leaves a category it no longer belongs to.
    pub async fn update_word(&self, form: WordForm) -> Settlement<WordRecord> {
        let Some(id) = form.id else {
            tracing::debug!("update of an unsaved word, skipping");
            return Settlement::Skipped;
        };
        let target = WordId::Persisted(id);
        let previous = self.inner.cache.find_by_id(target).await;
        let view_category = self.inner.view.lock().await.category_id.clone();
        let Some(category_id) = form
            .category
            .clone()
            .or_else(|| previous.as_ref().map(|w| w.category.clone()))
            .or(view_category)
        else {
            tracing::debug!(id, "no category for updated word, skipping");
            return Settlement::Skipped;
        };

        let local = WordRecord {
            id: target,
            title: form.title.clone(),
            meaning: form.meaning.clone(),
            image_url: form
                .image_preview
                .clone()
                .or_else(|| previous.as_ref().and_then(|w| w.image_url.clone())),
            favorite: form.favorite,
            category: category_id.clone(),
        };
        let category_changed = previous
            .as_ref()
            .is_some_and(|w| w.category != category_id);
        let draft = WordDraft::from_form(&form, category_id);

        let (snapshot, expected) = self.apply_tracked(CacheMutation::Patch(local)).await;
        tracing::debug!(id, category_changed, "applied local update");

        let engine = self.clone();
        Settlement::spawn(async move {
            engine
                .settle_update(id, draft, snapshot, expected, category_changed)
                .await
        })
    }

    /// Remove a word from the page and delete it remotely.
    ///
    /// A provisional word is only removed locally; if its create is still in
    /// flight, the server copy is deleted once that create settles.
    pub async fn delete_word(&self, id: WordId) -> Settlement<WordId> {
        let persisted = match id {
            WordId::Persisted(persisted) => persisted,
            WordId::Provisional(provisional_id) => {
                {
                    let mut creates = self.inner.creates.lock().await;
                    if creates.in_flight.contains(&provisional_id) {
                        creates.discarded.insert(provisional_id);
                    }
                }
                self.inner.cache.remove(id).await;
                tracing::debug!(provisional_id, "removed provisional word");
                return Settlement::Done(Ok(id));
            }
        };

        let was_under_review = self.inner.cache.clear_review(id).await;
        let (snapshot, previous_index, expected) = {
            let mut view = self.inner.view.lock().await;
            let previous_index = view.page_index;
            let snapshot = self.inner.cache.apply(CacheMutation::Remove(id)).await;
            let remaining = self.inner.cache.len().await;
            if remaining < snapshot.len() {
                view.note_removal(remaining);
            }
            (snapshot, previous_index, view.to_query())
        };
        tracing::debug!(id = persisted, "removed word locally");

        let engine = self.clone();
        Settlement::spawn(async move {
            let rollback = DeleteRollback {
                snapshot,
                previous_index,
                was_under_review,
            };
            engine.settle_delete(persisted, rollback, expected).await
        })
    }

    /// Flip the favorite flag locally and send the full update.
    ///
    /// Unfavoriting inside the favorites view refetches it so the word
    /// disappears once the server confirms.
    pub async fn toggle_favorite(&self, record: &WordRecord) -> Settlement<WordRecord> {
        let Some(id) = record.id.persisted() else {
            tracing::debug!("favorite toggle on an unsaved word, skipping");
            return Settlement::Skipped;
        };
        let favorite = !record.favorite;
        let draft = WordDraft {
            favorite,
            ..WordDraft::from_record(record)
        };

        let (snapshot, expected) = self
            .apply_tracked(CacheMutation::SetFavorite {
                id: record.id,
                favorite,
            })
            .await;

        let engine = self.clone();
        Settlement::spawn(async move {
            match engine.inner.gateway.update(id, &draft).await {
                Ok(canonical) => {
                    engine
                        .inner
                        .cache
                        .reconcile(WordId::Persisted(id), canonical.clone())
                        .await;
                    let in_favorites = engine.inner.view.lock().await.mode == FilterMode::Favorites;
                    if in_favorites && !favorite {
                        engine.refetch("word left favorites").await;
                    }
                    Ok(canonical)
                }
                Err(e) => {
                    tracing::warn!(error = %e, id, "favorite toggle failed, reverting");
                    engine.rollback_if_current(snapshot, &expected).await;
                    Err(e)
                }
            }
        })
    }

    /// Send a status change (`REP`/`OLV`) for a persisted word.
    ///
    /// A confirmed `REP` clears the word from the review set. When the view
    /// filters by a different status, it is refetched so the word leaves it.
    pub async fn change_status(
        &self,
        record: &WordRecord,
        status: StatusCode,
    ) -> Settlement<WordRecord> {
        let Some(id) = record.id.persisted() else {
            tracing::debug!("status change on an unsaved word, skipping");
            return Settlement::Skipped;
        };
        let target = record.id;

        let engine = self.clone();
        Settlement::spawn(async move {
            match engine.inner.gateway.change_status(id, status).await {
                Ok(canonical) => {
                    engine.inner.cache.reconcile(target, canonical.clone()).await;
                    if status == StatusCode::Reviewed {
                        engine.inner.cache.clear_review(target).await;
                    }
                    let leaves_view = matches!(
                        engine.inner.view.lock().await.mode,
                        FilterMode::ByStatus(current) if current != status
                    );
                    if leaves_view {
                        engine.refetch("word left status view").await;
                    }
                    tracing::debug!(id, %status, "status change confirmed");
                    Ok(canonical)
                }
                Err(e) => {
                    tracing::warn!(error = %e, id, %status, "status change failed");
                    Err(e)
                }
            }
        })
    }

    // === Settle steps ===

    async fn settle_create(&self, provisional_id: u64, draft: WordDraft) -> Result<WordRecord> {
        let target = WordId::Provisional(provisional_id);
        let result = self.inner.gateway.create(&draft).await;
        let discarded = {
            let mut creates = self.inner.creates.lock().await;
            creates.in_flight.remove(&provisional_id);
            let discarded = creates.discarded.remove(&provisional_id);
            if let (Ok(canonical), false) = (&result, discarded) {
                creates.settled.insert(provisional_id, canonical.clone());
            }
            discarded
        };

        match result {
            Ok(canonical) => {
                if discarded {
                    if let Some(id) = canonical.id.persisted() {
                        tracing::debug!(id, "word deleted before its create settled, deleting remotely");
                        if let Err(e) = self.inner.gateway.delete(id).await {
                            tracing::warn!(error = %e, id, "follow-up delete failed");
                        }
                    }
                } else if !self.inner.cache.reconcile(target, canonical.clone()).await {
                    tracing::debug!(provisional_id, "provisional word no longer cached");
                }
                Ok(canonical)
            }
            Err(e) => {
                tracing::warn!(error = %e, provisional_id, "create failed, removing provisional word");
                self.inner.cache.remove(target).await;
                Err(e)
            }
        }
    }

    async fn settle_update(
        &self,
        id: i64,
        draft: WordDraft,
        snapshot: Snapshot,
        expected: PageQuery,
        category_changed: bool,
    ) -> Result<WordRecord> {
        match self.inner.gateway.update(id, &draft).await {
            Ok(canonical) => {
                self.inner
                    .cache
                    .reconcile(WordId::Persisted(id), canonical.clone())
                    .await;
                let status_view = matches!(
                    self.inner.view.lock().await.mode,
                    FilterMode::ByStatus(_)
                );
                if category_changed && !status_view {
                    self.refetch("word changed category").await;
                }
                Ok(canonical)
            }
            Err(e) => {
                tracing::warn!(error = %e, id, "update failed, reverting");
                self.rollback_if_current(snapshot, &expected).await;
                Err(e)
            }
        }
    }

    async fn settle_delete(
        &self,
        id: i64,
        rollback: DeleteRollback,
        expected: PageQuery,
    ) -> Result<WordId> {
        match self.inner.gateway.delete(id).await {
            Ok(deleted) => {
                let refetch = {
                    let mut view = self.inner.view.lock().await;
                    if view.to_query() == expected {
                        let remaining = self.inner.cache.len().await;
                        view.settle_removal(remaining)
                    } else {
                        false
                    }
                };
                if refetch {
                    self.refetch("page emptied by delete").await;
                }
                Ok(WordId::Persisted(deleted))
            }
            Err(e) => {
                tracing::warn!(error = %e, id, "delete failed, restoring page");
                let mut view = self.inner.view.lock().await;
                if view.to_query() == expected {
                    view.page_index = rollback.previous_index;
                    self.restore(rollback.snapshot).await;
                    if rollback.was_under_review {
                        self.inner.cache.mark_for_review(WordId::Persisted(id)).await;
                    }
                } else {
                    tracing::warn!(id, "view changed since the delete started, skipping rollback");
                }
                Err(e)
            }
        }
    }
}

/// State needed to undo a failed delete.
struct DeleteRollback {
    snapshot: Snapshot,
    previous_index: usize,
    was_under_review: bool,
}
