pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod practice;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use cache::WordCache;
pub use catalog::{CatalogSync, FetchOutcome, Settlement};
pub use config::{ClientConfig, ConfigError};
pub use error::{Result, SyncError};
pub use gateway::{HttpGateway, InMemoryGateway, WordDraft, WordGateway};
pub use practice::PracticeEngine;

/// Gateway selected by the configuration.
pub fn build_gateway(config: &ClientConfig) -> Arc<dyn WordGateway> {
    match &config.api_base_url {
        Some(url) => {
            tracing::info!(%url, "using remote catalog");
            Arc::new(
                HttpGateway::new(url.clone())
                    .with_token(config.api_token.clone())
                    .with_user_id(config.user_id.clone()),
            )
        }
        None => {
            tracing::info!("WORDS_API_URL not set, using in-memory demo catalog");
            Arc::new(InMemoryGateway::with_demo_data())
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env()?;
    let catalog = CatalogSync::new(
        build_gateway(&config),
        Arc::new(WordCache::new()),
        config.page_size,
    );

    let outcome = catalog.start(config.category.as_deref()).await?;
    let view = catalog.page_state().await;
    tracing::info!(?outcome, category_id = ?view.category_id, "catalog ready");

    for word in catalog.cache().words().await {
        println!("{:>8}  {} = {}", word.id.to_string(), word.title, word.meaning);
    }

    let mut practice = PracticeEngine::new(catalog.clone());
    let session = practice
        .start(config.practice_size, view.category_id.clone())
        .await;
    println!(
        "practice preview: {} card(s) drawn from page {} of {}",
        session.words().len(),
        view.page_index + 1,
        view.total_pages
    );
    practice.exit();

    Ok(())
}
