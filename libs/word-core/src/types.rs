//! Core types for the vocabulary catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Identifier of a word record.
///
/// Records confirmed by the server carry `Persisted`; records inserted
/// optimistically carry `Provisional` until their create call settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum WordId {
    Persisted(i64),
    Provisional(u64),
}

impl WordId {
    /// Server id, if the record has been persisted.
    pub fn persisted(self) -> Option<i64> {
        match self {
            Self::Persisted(id) => Some(id),
            Self::Provisional(_) => None,
        }
    }

    pub fn is_provisional(self) -> bool {
        matches!(self, Self::Provisional(_))
    }
}

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persisted(id) => write!(f, "{id}"),
            Self::Provisional(id) => write!(f, "tmp-{id}"),
        }
    }
}

impl FromStr for WordId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidId(s.to_string());
        match s.strip_prefix("tmp-") {
            Some(rest) => rest.parse().map(Self::Provisional).map_err(|_| invalid()),
            None => s.parse().map(Self::Persisted).map_err(|_| invalid()),
        }
    }
}

/// A vocabulary word as presented to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    pub id: WordId,
    pub title: String,
    pub meaning: String,
    /// URL or embedded data (e.g. a data URI preview).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub favorite: bool,
    pub category: String,
}

/// Word category. At most one category in a working set is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub active: bool,
}

/// Server-side learning state of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    /// Reviewed / learned (`REP`).
    #[serde(rename = "REP")]
    Reviewed,
    /// Forgotten (`OLV`).
    #[serde(rename = "OLV")]
    Forgotten,
}

impl StatusCode {
    /// Wire code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reviewed => "REP",
            Self::Forgotten => "OLV",
        }
    }

    /// Parse from a wire code, ignoring case.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "REP" => Some(Self::Reviewed),
            "OLV" => Some(Self::Forgotten),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| CoreError::UnknownStatus(s.to_string()))
    }
}

/// Which subset of the catalog the view displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "status", rename_all = "snake_case")]
pub enum FilterMode {
    /// Every word of the active category.
    All,
    /// Favorite words of the active category.
    Favorites,
    /// Words of the active category with the given status.
    ByStatus(StatusCode),
    /// No category selected; the view is empty.
    NoneActive,
}

impl Default for FilterMode {
    fn default() -> Self {
        Self::NoneActive
    }
}

/// Opaque image attachment forwarded to the gateway untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUpload {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Input of a create or edit action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordForm {
    /// Present when editing a persisted word.
    pub id: Option<i64>,
    pub title: String,
    pub meaning: String,
    /// Falls back to the active category when absent.
    pub category: Option<String>,
    pub favorite: bool,
    pub image: Option<ImageUpload>,
    /// Local preview shown on the provisional record.
    pub image_preview: Option<String>,
}

impl WordForm {
    /// Create a form with only title and meaning set.
    pub fn new(title: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            meaning: meaning.into(),
            ..Default::default()
        }
    }

    /// Prefill an edit form from an existing record.
    pub fn from_record(record: &WordRecord) -> Self {
        Self {
            id: record.id.persisted(),
            title: record.title.clone(),
            meaning: record.meaning.clone(),
            category: Some(record.category.clone()),
            favorite: record.favorite,
            image: None,
            image_preview: record.image_url.clone(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }
}

/// Paginated response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_pages: usize,
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// Empty first page. Still reports one page.
    pub fn empty(size: usize) -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            size,
            total_pages: 1,
            total_elements: 0,
        }
    }

    /// Slice one page out of a full listing.
    pub fn slice(all: Vec<T>, page: usize, size: usize) -> Self {
        let size = size.max(1);
        let total_elements = all.len() as u64;
        let total_pages = all.len().div_ceil(size).max(1);
        let items = all.into_iter().skip(page.saturating_mul(size)).take(size).collect();
        Self {
            items,
            page,
            size,
            total_pages,
            total_elements,
        }
    }
}
