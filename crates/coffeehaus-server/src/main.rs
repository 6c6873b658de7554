use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method, header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE}};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use coffeehaus_api::{AppStateInner, router};
use coffeehaus_db::Database;
use coffeehaus_search::{ClaudeAnalyzer, GooglePlacesClient, SearchService};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coffeehaus=debug,coffeehaus_api=debug,coffeehaus_search=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("COFFEEHAUS_JWT_SECRET").unwrap_or_default();
    if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
        eprintln!("FATAL: COFFEEHAUS_JWT_SECRET is unset or still a placeholder.");
        eprintln!("       Set it in your .env file and restart.");
        std::process::exit(1);
    }

    let db_path = std::env::var("COFFEEHAUS_DB_PATH").unwrap_or_else(|_| "coffeehaus.db".into());
    let host = std::env::var("COFFEEHAUS_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("COFFEEHAUS_PORT")
        .unwrap_or_else(|_| "8080".into())
        .parse()?;
    let client_origin = std::env::var("COFFEEHAUS_CLIENT_ORIGIN")
        .unwrap_or_else(|_| "http://localhost:5173".into());

    // Init database
    let db = Arc::new(Database::open(&PathBuf::from(&db_path))?);

    let search = build_search(db.clone())?;
    let state = Arc::new(AppStateInner {
        db,
        jwt_secret,
        search,
    });

    let cors = CorsLayer::new()
        .allow_origin(client_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300));

    let app = router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Coffeehaus server listening on {}", addr);
    info!("Accepting browser requests from {}", client_origin);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Search needs both the Places and Claude keys; without them `/search` answers 503.
fn build_search(db: Arc<Database>) -> anyhow::Result<Option<SearchService>> {
    let maps_key = std::env::var("GOOGLE_MAPS_API_KEY").unwrap_or_default();
    let claude_key = std::env::var("CLAUDE_API_KEY").unwrap_or_default();
    if maps_key.is_empty() || claude_key.is_empty() {
        warn!("GOOGLE_MAPS_API_KEY or CLAUDE_API_KEY not set, shop search disabled");
        return Ok(None);
    }

    let model = std::env::var("CLAUDE_MODEL").ok().filter(|m| !m.is_empty());
    let analyzer = ClaudeAnalyzer::new(&claude_key, model)?;
    let places = GooglePlacesClient::new(maps_key);
    info!("Shop search enabled");

    Ok(Some(SearchService::new(Arc::new(places), Arc::new(analyzer), db)))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
