use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use billing_cell::RazorpayGateway;
use notification_cell::{sender_from_config, spawn_notifier};
use shared_config::AppConfig;
use shared_database::{ClinicDirectory, InMemoryStore};
use shared_utils::{Clock, SystemClock};

use router::ClinicServices;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic API server");

    // Load configuration
    let config = AppConfig::from_env();

    // Notifications are delivered off the request path
    let (notifier, _worker) = spawn_notifier(&config, sender_from_config(&config));

    let store = Arc::new(InMemoryStore::new());
    if let Some(path) = &config.directory_path {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading clinic directory {}", path))?;
        ClinicDirectory::from_json(&raw)?
            .seed(store.as_ref(), SystemClock.now())
            .await?;
    }

    let services = ClinicServices::new(
        &config,
        store,
        Arc::new(SystemClock),
        Arc::new(RazorpayGateway::new(&config)),
        notifier,
    );

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(&services)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
