mod config;
mod errors;
mod extraction;
mod fields;
mod models;
mod resumes;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::{TesseractOcr, TextExtractor};
use crate::fields::{load_entity_model, FieldExtractors};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; malformed values abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    // OCR for image uploads
    let ocr = TesseractOcr::new(
        &config.tesseract_path,
        &config.ocr_language,
        config.ocr_timeout,
    );
    info!(
        "OCR engine: {} (lang {}, timeout {}s)",
        config.tesseract_path,
        config.ocr_language,
        config.ocr_timeout.as_secs()
    );
    let text_extractor = TextExtractor::new(Arc::new(ocr));

    // Entity model is optional; without it the entity variant returns text only
    let recognizer = load_entity_model(config.ner_model_dir.as_deref());
    let field_extractors = FieldExtractors::new(recognizer);
    info!(
        "Field extractors ready (default variant: {})",
        config.default_variant
    );

    let state = AppState {
        config: config.clone(),
        text_extractor,
        field_extractors,
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
