//! Practice drills over the cached page.
//!
//! The engine draws its cards from the cache once per run and never writes
//! the cache itself: outcomes go back through [`CatalogSync::change_status`]
//! and the review-set helpers.

use rand::rngs::StdRng;
use rand::SeedableRng;
use word_core::{draw, PracticeOutcome, PracticeSession, WordRecord};

use crate::catalog::{CatalogSync, Settlement};

/// Parameters of the last `start`, replayed by `restart`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DrawParams {
    size: usize,
    category_id: Option<String>,
}

/// Drives a [`PracticeSession`] and forwards its outcomes to the catalog.
pub struct PracticeEngine {
    catalog: CatalogSync,
    session: PracticeSession,
    params: Option<DrawParams>,
    rng: StdRng,
}

impl PracticeEngine {
    pub fn new(catalog: CatalogSync) -> Self {
        Self::with_rng(catalog, StdRng::from_os_rng())
    }

    /// Engine with a caller-provided generator, for reproducible draws.
    pub fn with_rng(catalog: CatalogSync, rng: StdRng) -> Self {
        Self {
            catalog,
            session: PracticeSession::default(),
            params: None,
            rng,
        }
    }

    pub fn session(&self) -> &PracticeSession {
        &self.session
    }

    /// Draw up to `size` cached words of `category_id` (every cached word
    /// when `None`) and start a new session over them.
    pub async fn start(&mut self, size: usize, category_id: Option<String>) -> &PracticeSession {
        let pool: Vec<WordRecord> = self
            .catalog
            .cache()
            .words()
            .await
            .into_iter()
            .filter(|w| category_id.as_deref().map_or(true, |id| w.category == id))
            .collect();
        let words = draw(&pool, size, &mut self.rng);
        tracing::info!(
            pool = pool.len(),
            drawn = words.len(),
            category_id = category_id.as_deref().unwrap_or("*"),
            "practice session started"
        );

        self.session = PracticeSession::new(words);
        self.params = Some(DrawParams { size, category_id });
        &self.session
    }

    pub fn reveal(&mut self) {
        self.session.reveal();
    }

    /// Count the current card as learned, mark it reviewed remotely and move on.
    ///
    /// The session advances without waiting for the remote call; the returned
    /// settlement reports it.
    pub async fn like(&mut self) -> Settlement<WordRecord> {
        self.record(PracticeOutcome::Learned).await
    }

    /// Count the current card as forgotten, flag it for review and move on.
    pub async fn dislike(&mut self) -> Settlement<WordRecord> {
        self.record(PracticeOutcome::Forgotten).await
    }

    pub fn advance(&mut self) {
        self.session.advance();
    }

    /// Draw a fresh session with the parameters of the last `start`.
    pub async fn restart(&mut self) -> &PracticeSession {
        match self.params.clone() {
            Some(params) => self.start(params.size, params.category_id).await,
            None => {
                self.session = PracticeSession::default();
                &self.session
            }
        }
    }

    /// Drop the session. Status changes already sent are left running.
    pub fn exit(&mut self) {
        self.session = PracticeSession::default();
        self.params = None;
        tracing::debug!("practice session closed");
    }

    pub fn progress_count(&self) -> usize {
        self.session.progress_count()
    }

    // === Private methods ===

    async fn record(&mut self, outcome: PracticeOutcome) -> Settlement<WordRecord> {
        let Some(word) = self.session.tally(outcome) else {
            return Settlement::Skipped;
        };

        let settlement = self.catalog.change_status(&word, outcome.status()).await;
        match outcome {
            PracticeOutcome::Learned => {
                self.catalog.clear_review(word.id).await;
            }
            PracticeOutcome::Forgotten => {
                self.catalog.mark_for_review(word.id).await;
            }
        }
        tracing::debug!(word = %word.id, ?outcome, "practice outcome recorded");

        self.session.advance();
        settlement
    }
}
