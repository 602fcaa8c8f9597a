//! Test fixtures and factory functions for catalog data.

use word_core::{StatusCode, WordRecord};
use word_sync::InMemoryGateway;

/// Catalog with the `home` and `nature` categories and no words.
pub fn two_categories() -> InMemoryGateway {
    InMemoryGateway::with_categories([("home", "Hogar"), ("nature", "Naturaleza")])
}

/// Seed `titles` into a category. Listings return them in reverse order.
pub async fn seed_words(store: &InMemoryGateway, category_id: &str, titles: &[&str]) -> Vec<WordRecord> {
    let mut seeded = Vec::with_capacity(titles.len());
    for title in titles {
        seeded.push(store.seed(category_id, title, &format!("{title} meaning")).await);
    }
    seeded
}

/// Seed a word that is already marked as favorite.
pub async fn seed_favorite(store: &InMemoryGateway, category_id: &str, title: &str) -> WordRecord {
    let mut word = store.seed(category_id, title, &format!("{title} meaning")).await;
    store
        .set_favorite(persisted(&word), true)
        .await
        .expect("seeded word exists");
    word.favorite = true;
    word
}

/// Seed a word carrying a learning status.
pub async fn seed_with_status(
    store: &InMemoryGateway,
    category_id: &str,
    title: &str,
    status: StatusCode,
) -> WordRecord {
    let word = store.seed(category_id, title, &format!("{title} meaning")).await;
    store
        .set_status(persisted(&word), status)
        .await
        .expect("seeded word exists");
    word
}

pub fn persisted(word: &WordRecord) -> i64 {
    word.id.persisted().expect("fixture words are persisted")
}
