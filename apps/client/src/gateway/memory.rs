//! Gateway backed by process memory.

use async_trait::async_trait;
use tokio::sync::Mutex;
use word_core::{Category, Page, StatusCode, WordId, WordRecord};

use super::{WordDraft, WordGateway};
use crate::error::{Result, SyncError};

pub const DEFAULT_CATEGORY_ICON: &str = "assets/icons/flashcards.svg";

const DEMO_WORDS: &[(&str, &str, &str)] = &[
    ("1", "Casa", "House"),
    ("1", "Mesa", "Table"),
    ("1", "Silla", "Chair"),
    ("1", "Ventana", "Window"),
    ("1", "Cocina", "Kitchen"),
    ("2", "Sol", "Sun"),
    ("2", "Luna", "Moon"),
    ("2", "Río", "River"),
    ("2", "Montaña", "Mountain"),
    ("3", "Pan", "Bread"),
    ("3", "Queso", "Cheese"),
    ("3", "Manzana", "Apple"),
];

#[derive(Debug, Clone)]
struct StoredWord {
    record: WordRecord,
    status: Option<StatusCode>,
}

#[derive(Debug)]
struct MemoryState {
    categories: Vec<Category>,
    /// Newest first.
    words: Vec<StoredWord>,
    next_id: i64,
}

impl MemoryState {
    fn insert(&mut self, draft: &WordDraft) -> WordRecord {
        let id = self.next_id;
        self.next_id += 1;
        let record = WordRecord {
            id: WordId::Persisted(id),
            title: draft.title.clone(),
            meaning: draft.meaning.clone(),
            image_url: draft.image.as_ref().map(|i| format!("memory://{}", i.file_name)),
            favorite: draft.favorite,
            category: draft.category_id.clone(),
        };
        self.words.insert(
            0,
            StoredWord {
                record: record.clone(),
                status: None,
            },
        );
        record
    }

    fn find_mut(&mut self, id: i64) -> Result<&mut StoredWord> {
        self.words
            .iter_mut()
            .find(|w| w.record.id == WordId::Persisted(id))
            .ok_or_else(|| SyncError::NotFound(id.to_string()))
    }

    fn listing<F>(&self, keep: F) -> Vec<WordRecord>
    where
        F: Fn(&StoredWord) -> bool,
    {
        self.words
            .iter()
            .filter(|w| keep(w))
            .map(|w| w.record.clone())
            .collect()
    }
}

fn matches_query(word: &WordRecord, query: Option<&str>) -> bool {
    match query {
        None => true,
        Some(q) => {
            let q = q.to_lowercase();
            word.title.to_lowercase().contains(&q) || word.meaning.to_lowercase().contains(&q)
        }
    }
}

/// In-process catalog with server-like paging and id assignment.
#[derive(Debug)]
pub struct InMemoryGateway {
    state: Mutex<MemoryState>,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    /// Empty catalog; ids start at 1.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                categories: Vec::new(),
                words: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Empty catalog with the given categories.
    pub fn with_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut gateway = Self::new();
        gateway.state.get_mut().categories = categories
            .into_iter()
            .map(|(id, name)| Category {
                id: id.into(),
                name: name.into(),
                icon: DEFAULT_CATEGORY_ICON.to_string(),
                active: false,
            })
            .collect();
        gateway
    }

    /// Three categories with a handful of Spanish words each.
    pub fn with_demo_data() -> Self {
        let mut gateway = Self::with_categories([
            ("1", "Hogar"),
            ("2", "Naturaleza"),
            ("3", "Comida"),
        ]);
        let state = gateway.state.get_mut();
        for (category, title, meaning) in DEMO_WORDS.iter().rev() {
            state.insert(&WordDraft {
                title: title.to_string(),
                meaning: meaning.to_string(),
                category_id: category.to_string(),
                favorite: false,
                image: None,
            });
        }
        gateway
    }

    /// Next id handed out by `create`.
    pub fn starting_at(mut self, next_id: i64) -> Self {
        self.state.get_mut().next_id = next_id;
        self
    }

    /// Store a word directly, bypassing the gateway interface.
    pub async fn seed(&self, category_id: &str, title: &str, meaning: &str) -> WordRecord {
        self.state.lock().await.insert(&WordDraft {
            title: title.to_string(),
            meaning: meaning.to_string(),
            category_id: category_id.to_string(),
            favorite: false,
            image: None,
        })
    }

    /// Every stored word, newest first.
    pub async fn stored_words(&self) -> Vec<WordRecord> {
        self.state.lock().await.listing(|_| true)
    }

    pub async fn status_of(&self, id: i64) -> Option<StatusCode> {
        let mut state = self.state.lock().await;
        state.find_mut(id).ok().and_then(|w| w.status)
    }

    pub async fn set_favorite(&self, id: i64, favorite: bool) -> Result<()> {
        self.state.lock().await.find_mut(id)?.record.favorite = favorite;
        Ok(())
    }

    pub async fn set_status(&self, id: i64, status: StatusCode) -> Result<()> {
        self.state.lock().await.find_mut(id)?.status = Some(status);
        Ok(())
    }
}

#[async_trait]
impl WordGateway for InMemoryGateway {
    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        Ok(self.state.lock().await.categories.clone())
    }

    async fn fetch_by_category(
        &self,
        category_id: &str,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>> {
        let words = self
            .state
            .lock()
            .await
            .listing(|w| w.record.category == category_id);
        Ok(Page::slice(words, page, size))
    }

    async fn fetch_by_category_and_status(
        &self,
        category_id: &str,
        status: StatusCode,
        query: Option<&str>,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>> {
        let words = self.state.lock().await.listing(|w| {
            w.record.category == category_id
                && w.status == Some(status)
                && matches_query(&w.record, query)
        });
        Ok(Page::slice(words, page, size))
    }

    async fn fetch_favorites(
        &self,
        category_id: &str,
        query: Option<&str>,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>> {
        let words = self.state.lock().await.listing(|w| {
            w.record.category == category_id && w.record.favorite && matches_query(&w.record, query)
        });
        Ok(Page::slice(words, page, size))
    }

    async fn fetch_by_status(
        &self,
        status: StatusCode,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>> {
        let words = self
            .state
            .lock()
            .await
            .listing(|w| w.status == Some(status));
        Ok(Page::slice(words, page, size))
    }

    async fn fetch_word(&self, id: i64) -> Result<WordRecord> {
        Ok(self.state.lock().await.find_mut(id)?.record.clone())
    }

    async fn create(&self, draft: &WordDraft) -> Result<WordRecord> {
        Ok(self.state.lock().await.insert(draft))
    }

    async fn update(&self, id: i64, draft: &WordDraft) -> Result<WordRecord> {
        let mut state = self.state.lock().await;
        let stored = state.find_mut(id)?;
        stored.record.title = draft.title.clone();
        stored.record.meaning = draft.meaning.clone();
        stored.record.category = draft.category_id.clone();
        stored.record.favorite = draft.favorite;
        if let Some(image) = &draft.image {
            stored.record.image_url = Some(format!("memory://{}", image.file_name));
        }
        Ok(stored.record.clone())
    }

    async fn delete(&self, id: i64) -> Result<i64> {
        let mut state = self.state.lock().await;
        let before = state.words.len();
        state.words.retain(|w| w.record.id != WordId::Persisted(id));
        if state.words.len() == before {
            return Err(SyncError::NotFound(id.to_string()));
        }
        Ok(id)
    }

    async fn change_status(&self, id: i64, status: StatusCode) -> Result<WordRecord> {
        let mut state = self.state.lock().await;
        let stored = state.find_mut(id)?;
        stored.status = Some(status);
        Ok(stored.record.clone())
    }
}
