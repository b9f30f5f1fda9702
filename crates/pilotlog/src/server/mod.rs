//! HTTP API for the flight log.
//!
//! All routes live under `/api`. Lifecycle calls answer with the flight as
//! XML so that simulator scripts can parse them without a JSON library, while
//! listings answer with JSON pages and the `.json`, `.xml` and `.csv` routes
//! export everything.

mod handlers;
mod response;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::{Config, PagingConfig};
use crate::error::Result;
use crate::logbook::Logbook;

pub use response::Report;

/// Shared state of the HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    logbook: Arc<Mutex<Logbook>>,
    paging: PagingConfig,
}

impl AppState {
    /// Share `logbook` between request handlers.
    #[must_use]
    pub fn new(logbook: Logbook, paging: PagingConfig) -> Self {
        Self {
            logbook: Arc::new(Mutex::new(logbook)),
            paging,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let api = Router::new()
        .route("/departure", get(handlers::departure))
        .route("/arrival", get(handlers::arrival))
        .route("/invalidate", get(handlers::invalidate))
        .route(
            "/flights",
            get(handlers::list_flights).post(handlers::search_flights),
        )
        .route(
            "/flights/flight/{id}",
            get(handlers::get_flight).delete(handlers::delete_flight),
        )
        .route("/flights.json", get(handlers::flights_json))
        .route("/flights.xml", get(handlers::flights_xml))
        .route("/flights.csv", get(handlers::flights_csv))
        .route("/airports", get(handlers::list_airports))
        .route("/airports.json", get(handlers::airports_json))
        .route("/airports.xml", get(handlers::airports_xml))
        .route("/airports.csv", get(handlers::airports_csv))
        .route("/status", get(handlers::status));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(timeout_layer(request_timeout))
        .with_state(state)
}

/// Answer `408 Request Timeout` when a request runs past `request_timeout`.
fn timeout_layer(request_timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)
}

/// Serve the API on the configured address until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(config: &Config, logbook: Logbook) -> Result<()> {
    let state = AppState::new(logbook, config.paging.clone());
    let app = router(state, config.request_timeout());

    let listener = TcpListener::bind(config.server.bind).await?;
    info!("Serving pilotlog API on http://{}/api", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Starting graceful shutdown...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn get_status(app: Router, path: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response.lines().next().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .layer(timeout_layer(Duration::from_millis(50)));

        let status_line = get_status(app, "/slow").await;
        assert!(status_line.contains("408"), "{status_line}");
    }

    #[tokio::test]
    async fn test_router_serves_status() {
        let logbook = Logbook::open_in_memory().unwrap();
        let app = router(
            AppState::new(logbook, PagingConfig::default()),
            Duration::from_secs(10),
        );

        let status_line = get_status(app, "/api/status").await;
        assert!(status_line.contains("200"), "{status_line}");
    }
}
