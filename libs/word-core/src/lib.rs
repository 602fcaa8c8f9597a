//! Core vocabulary library shared by the sync client and its gateways.
//!
//! Provides:
//! - Shared types (WordRecord, WordId, Category, StatusCode, FilterMode, Page)
//! - Page state transitions for the catalog view
//! - Uniform random sampling for practice draws (Fisher–Yates)
//! - The practice session state machine

pub mod error;
pub mod paging;
pub mod practice;
pub mod sample;
pub mod types;

pub use error::{CoreError, Result};
pub use paging::{PageQuery, PageState};
pub use practice::{PracticeOutcome, PracticeSession};
pub use sample::draw;
pub use types::{
    Category, FilterMode, ImageUpload, Page, StatusCode, WordForm, WordId, WordRecord,
};
