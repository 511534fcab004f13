//! HTTP server for the scrape endpoint.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::exposition::{Format, encode};
use crate::metric::{MetricFamily, restrict};
use crate::scrape::SharedScraper;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    scraper: SharedScraper,
}

/// Create the HTTP router.
///
/// The scrape handler answers on `metrics_path` and on `/`.
fn create_router(scraper: SharedScraper, metrics_path: &str) -> Router {
    let state = AppState { scraper };

    let mut router = Router::new().route(metrics_path, get(scrape_handler));
    if metrics_path != "/" {
        router = router.route("/", get(scrape_handler));
    }

    router
        .route("/favicon.ico", get(favicon_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Query parameters of a scrape request.
///
/// Keys may repeat: the last `target` wins and every `name[]` is kept.
#[derive(Debug, Default, PartialEq, Eq)]
struct ScrapeParams {
    target: Option<String>,
    names: Vec<String>,
}

impl ScrapeParams {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "target" if value.is_empty() => params.target = None,
                "target" => params.target = Some(value),
                "name[]" => params.names.push(value),
                _ => {}
            }
        }
        params
    }
}

/// Handler for scrape requests: `?target=host[:port]`, optionally restricted
/// with one or more `name[]=<metric>`.
async fn scrape_handler(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    let params = ScrapeParams::from_pairs(pairs);
    let format = Format::negotiate(headers.get(ACCEPT).and_then(|v| v.to_str().ok()));

    let families = state.scraper.scrape(params.target.as_deref()).await;
    let families = restrict(families, &params.names);

    render(&families, format, params.target.as_deref())
}

/// Encode families into a response; an encoding failure answers 500.
fn render(families: &[MetricFamily], format: Format, target: Option<&str>) -> Response {
    match encode(families, format) {
        Ok(body) => (StatusCode::OK, [(CONTENT_TYPE, format.content_type())], body).into_response(),
        Err(e) => {
            error!(instance = ?target, error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to encode metrics: {}\n", e),
            )
                .into_response()
        }
    }
}

/// Browsers ask for a favicon when the endpoint is opened by hand.
async fn favicon_handler() -> Response {
    StatusCode::OK.into_response()
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// HTTP server configuration.
pub struct HttpServer {
    scraper: SharedScraper,
    listen_addr: SocketAddr,
    metrics_path: String,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(scraper: SharedScraper, listen_addr: SocketAddr, metrics_path: String) -> Self {
        Self {
            scraper,
            listen_addr,
            metrics_path,
        }
    }

    /// Run the HTTP server until the shutdown signal is received.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        info!(addr = %self.listen_addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until the shutdown signal is received.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let router = create_router(self.scraper, &self.metrics_path);

        info!(
            addr = %listener.local_addr()?,
            path = %self.metrics_path,
            "HTTP server listening"
        );

        // Run server with graceful shutdown
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
