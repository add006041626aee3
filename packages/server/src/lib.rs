#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for incident pattern and trend analysis.
//!
//! Serves `POST /api/analysis/patterns`, which answers with LLM-generated
//! patterns when a provider is configured and with rule-based patterns
//! otherwise, and `POST /api/analysis/trends`, which merges historical and
//! predicted monthly series for forecast charts.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use peacewatch_ai::providers::{LlmProvider, create_provider_from_env};
use peacewatch_server_models::ApiError;

/// Maximum accepted JSON body size.
const JSON_LIMIT_BYTES: usize = 8 * 1024 * 1024;

/// Shared application state.
pub struct AppState {
    /// LLM provider for pattern analysis, if one is configured.
    pub provider: Option<Arc<dyn LlmProvider>>,
}

/// Registers the API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(|err, _req| {
            let message = err.to_string();
            log::warn!("Rejected request body: {message}");
            error::InternalError::from_response(
                err,
                HttpResponse::BadRequest().json(ApiError::new(message)),
            )
            .into()
        });

    cfg.app_data(json_config).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route(
                "/analysis/patterns",
                web::post().to(handlers::analyze_patterns),
            )
            .route(
                "/analysis/trends",
                web::post().to(handlers::summarize_trends),
            ),
    );
}

/// Starts the analysis API server.
///
/// Reads the LLM provider configuration from the environment (see
/// [`create_provider_from_env`]), then binds to `BIND_ADDR:PORT`
/// (default `127.0.0.1:8080`). The caller is responsible for the async
/// runtime and for initializing logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the provider configuration is
/// invalid, or if the HTTP server fails to bind or encounters a runtime
/// error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    log::info!("Configuring LLM provider...");
    let provider = create_provider_from_env().map_err(|e| std::io::Error::other(e.to_string()))?;

    let state = web::Data::new(AppState {
        provider: provider.map(Arc::from),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
