use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use wiki_core::constants::{CONTENT_FILE_ENV, DEFAULT_CONTENT_FILE, DEFAULT_REST_ADDR, REST_ADDR_ENV};
use wiki_core::ContentBundle;

/// Main entry point for the wiki content server
///
/// Loads a content bundle and serves it over the content API, with OpenAPI/Swagger
/// documentation at `/swagger-ui`.
///
/// # Environment Variables
/// - `WIKI_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `WIKI_CONTENT_FILE`: JSON or YAML content bundle (default: "content.json")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the content bundle cannot be read or parsed,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wiki_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("wiki_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var(REST_ADDR_ENV).unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let content_file = std::env::var(CONTENT_FILE_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONTENT_FILE));

    if !content_file.exists() {
        anyhow::bail!("Content file does not exist: {}", content_file.display());
    }
    let bundle = ContentBundle::from_path(&content_file)?;

    tracing::info!("++ Starting wiki content server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(AppState::new(bundle))).await?;

    Ok(())
}
