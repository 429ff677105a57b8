//! Service entry point: configuration, tracing, wiring, HTTP server.

use std::sync::Arc;
use std::time::Duration;

use tower_http::timeout::TimeoutLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use legal_intake::adapters::http::{router, AppState};
use legal_intake::adapters::oracle::{GeminiConfig, GeminiOracle, ScriptedOracle};
use legal_intake::adapters::renderer::TemplateDocumentRenderer;
use legal_intake::adapters::storage::{FileSessionStore, InMemorySessionStore};
use legal_intake::application::SessionCoordinator;
use legal_intake::config::{AppConfig, OracleProvider, StorageBackend};
use legal_intake::domain::intake::KeywordTriggerClassifier;
use legal_intake::ports::{FactExtractionOracle, SessionStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(config.server.log_level.clone())
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let oracle: Arc<dyn FactExtractionOracle> = match config.oracle.provider {
        OracleProvider::Gemini => {
            // Validation guarantees the key is present for this branch.
            let key = config.oracle.gemini_api_key.clone().unwrap_or_default();
            let mut gemini = GeminiConfig::new(key)
                .with_model(config.oracle.model.clone())
                .with_timeout(Duration::from_secs(config.oracle.timeout_secs));
            if let Some(base_url) = &config.oracle.base_url {
                gemini = gemini.with_base_url(base_url.clone());
            }
            Arc::new(GeminiOracle::new(gemini))
        }
        OracleProvider::Scripted => {
            tracing::warn!("running with the scripted oracle, no real extraction will happen");
            Arc::new(ScriptedOracle::new())
        }
    };

    let store: Arc<dyn SessionStore> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(InMemorySessionStore::new()),
        StorageBackend::File => Arc::new(FileSessionStore::new(config.storage.session_dir.clone())),
    };

    let coordinator = Arc::new(SessionCoordinator::new(
        oracle,
        Arc::new(TemplateDocumentRenderer::new()),
        store,
        Arc::new(KeywordTriggerClassifier::new()),
    ));

    let app = router(AppState { coordinator }).layer(TimeoutLayer::new(Duration::from_secs(
        config.server.request_timeout_secs,
    )));

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "legal intake service listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
