use anyhow::{Context, Result};
use page_translations::config::Config;
use page_translations::resolver::TranslationResolver;
use page_translations::server::{router, AppState};
use page_translations::store::MemoryStore;
use page_translations::validator::{all_pages, TranslationGroupValidator};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("page_translations=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!("Starting page translation server");

    let config = Config::from_env()?;
    let store = MemoryStore::from_path(&config.site_data_path)
        .with_context(|| format!("Failed to load site data from {}", config.site_data_path))?;

    // Data errors do not stop the server; requests resolve them deterministically
    {
        let translations = TranslationResolver::new(&store, config.default_locale.as_str());
        let report = TranslationGroupValidator::validate(&translations, &all_pages(&store)?)?;
        for error in &report.errors {
            warn!("Translation data error: {}", error);
        }
        for warning in &report.warnings {
            warn!("Translation data warning: {}", warning);
        }
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let app = router(Arc::new(AppState::new(config, store)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
