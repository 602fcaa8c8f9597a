//! Remote word catalog interface.
//!
//! Two implementations are provided: [`HttpGateway`] talks to the REST
//! backend and [`InMemoryGateway`] serves demo data from process memory. The
//! engine is composed with either one and never branches on which it got.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use word_core::{Category, ImageUpload, Page, StatusCode, WordForm, WordRecord};

use crate::error::Result;

pub use http::HttpGateway;
pub use memory::InMemoryGateway;

/// Payload of create and update calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDraft {
    pub title: String,
    pub meaning: String,
    pub category_id: String,
    pub favorite: bool,
    pub image: Option<ImageUpload>,
}

impl WordDraft {
    pub fn from_form(form: &WordForm, category_id: String) -> Self {
        Self {
            title: form.title.clone(),
            meaning: form.meaning.clone(),
            category_id,
            favorite: form.favorite,
            image: form.image.clone(),
        }
    }

    /// Draft that re-sends an existing record, e.g. to flip its favorite flag.
    pub fn from_record(record: &WordRecord) -> Self {
        Self {
            title: record.title.clone(),
            meaning: record.meaning.clone(),
            category_id: record.category.clone(),
            favorite: record.favorite,
            image: None,
        }
    }
}

/// Calls consumed from the remote catalog.
#[async_trait]
pub trait WordGateway: Send + Sync {
    async fn fetch_categories(&self) -> Result<Vec<Category>>;

    async fn fetch_by_category(
        &self,
        category_id: &str,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>>;

    async fn fetch_by_category_and_status(
        &self,
        category_id: &str,
        status: StatusCode,
        query: Option<&str>,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>>;

    /// Favorites of a category. Returned records always have `favorite` set.
    async fn fetch_favorites(
        &self,
        category_id: &str,
        query: Option<&str>,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>>;

    /// Words with a status across every category.
    async fn fetch_by_status(
        &self,
        status: StatusCode,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>>;

    async fn fetch_word(&self, id: i64) -> Result<WordRecord>;

    async fn create(&self, draft: &WordDraft) -> Result<WordRecord>;

    async fn update(&self, id: i64, draft: &WordDraft) -> Result<WordRecord>;

    /// Returns the id of the deleted word.
    async fn delete(&self, id: i64) -> Result<i64>;

    async fn change_status(&self, id: i64, status: StatusCode) -> Result<WordRecord>;
}
