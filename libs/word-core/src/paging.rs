//! Page state of the catalog view.
//!
//! Mode transitions (`select_category`, `select_status`, `show_favorites`,
//! `clear_filter`) always reset the page index to 0. The status code and the
//! favorites flag are mutually exclusive because both live in `FilterMode`.

use crate::types::{FilterMode, Page, StatusCode};

/// Request key of a page fetch. A response is only applied while the live
/// state still produces an equal key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub category_id: Option<String>,
    pub mode: FilterMode,
    pub query: Option<String>,
    pub page_index: usize,
    pub page_size: usize,
}

/// Current view over the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub category_id: Option<String>,
    pub mode: FilterMode,
    pub query: Option<String>,
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_elements: u64,
}

impl PageState {
    /// Initial state: no category, one empty page.
    pub fn new(page_size: usize) -> Self {
        Self {
            category_id: None,
            mode: FilterMode::NoneActive,
            query: None,
            page_index: 0,
            page_size: page_size.max(1),
            total_pages: 1,
            total_elements: 0,
        }
    }

    pub fn to_query(&self) -> PageQuery {
        PageQuery {
            category_id: self.category_id.clone(),
            mode: self.mode,
            query: self.query.clone(),
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }

    /// Activate a category and show all of its words.
    pub fn select_category(&mut self, category_id: impl Into<String>) {
        self.category_id = Some(category_id.into());
        self.mode = FilterMode::All;
        self.query = None;
        self.page_index = 0;
    }

    /// Drop the active category.
    pub fn deselect_category(&mut self) {
        self.category_id = None;
        self.mode = FilterMode::NoneActive;
        self.query = None;
        self.page_index = 0;
        self.reset_totals();
    }

    pub fn select_status(&mut self, status: StatusCode) {
        self.mode = FilterMode::ByStatus(status);
        self.page_index = 0;
    }

    pub fn show_favorites(&mut self) {
        self.mode = FilterMode::Favorites;
        self.page_index = 0;
    }

    pub fn clear_filter(&mut self) {
        self.mode = if self.category_id.is_some() {
            FilterMode::All
        } else {
            FilterMode::NoneActive
        };
        self.query = None;
        self.page_index = 0;
    }

    /// Set or clear the free-text query.
    pub fn set_query(&mut self, query: Option<String>) {
        self.query = query.filter(|q| !q.trim().is_empty());
        self.page_index = 0;
    }

    /// Move to another page of the current view, clamped to the known range.
    pub fn go_to_page(&mut self, index: usize) {
        self.page_index = index.min(self.last_page());
    }

    pub fn reset_totals(&mut self) {
        self.total_pages = 1;
        self.total_elements = 0;
    }

    /// Take totals from a fetched envelope.
    ///
    /// Returns true when the page index had to be clamped downward because the
    /// server reports fewer pages; the caller should fetch again.
    pub fn absorb<T>(&mut self, page: &Page<T>) -> bool {
        self.total_pages = page.total_pages.max(1);
        self.total_elements = page.total_elements;
        if self.page_index > self.last_page() {
            self.page_index = self.last_page();
            return true;
        }
        false
    }

    /// Optimistic part of a deletion: when the removed record was the only
    /// item on a page past the first, step back one page.
    pub fn note_removal(&mut self, remaining_on_page: usize) {
        if remaining_on_page == 0 && self.page_index > 0 {
            self.page_index -= 1;
        }
    }

    /// Confirmed deletion. Returns true when the visible page is empty while
    /// other pages exist, after moving to the adjacent page that still holds
    /// records; the caller should fetch again.
    pub fn settle_removal(&mut self, remaining_on_page: usize) -> bool {
        self.total_elements = self.total_elements.saturating_sub(1);
        if remaining_on_page > 0 || self.total_pages <= 1 {
            return false;
        }
        self.total_pages -= 1;
        self.page_index = self.page_index.min(self.last_page());
        true
    }

    fn last_page(&self) -> usize {
        self.total_pages.max(1) - 1
    }
}
