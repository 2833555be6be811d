//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the landing and proxy handlers
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Bind server to listener
//! - Apply reloaded configuration
//! - Run the session sweeper alongside the server

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::landing::landing_page;
use crate::lifecycle::shutdown::on_signal;
use crate::observability::metrics;
use crate::proxy::{Orchestrator, ProxyRequest};
use crate::session::{MemorySessionStore, SessionBinder, SessionStore, SessionSweeper};
use crate::upstream::{Fetcher, ReqwestFetcher};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<ProxyConfig>>,
    pub orchestrator: Orchestrator,
    pub sessions: Arc<dyn SessionStore>,
    pub started_at: Instant,
}

/// HTTP server for the transforming proxy.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a server with an in-memory session store and a `reqwest`
    /// upstream client.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let fetcher = ReqwestFetcher::from_config(&config.upstream)?;
        Ok(Self::with_components(
            config,
            Arc::new(MemorySessionStore::new()),
            Arc::new(fetcher),
        ))
    }

    /// Create a server around the given session store and fetcher.
    pub fn with_components(
        config: ProxyConfig,
        sessions: Arc<dyn SessionStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        let config = Arc::new(ArcSwap::from_pointee(config));
        let orchestrator = Orchestrator::new(
            config.clone(),
            SessionBinder::new(sessions.clone()),
            fetcher,
        );

        let state = AppState {
            config,
            orchestrator,
            sessions,
            started_at: Instant::now(),
        };

        let router = Self::build_router(state.clone(), request_timeout);
        Self { router, state }
    }

    /// Shared state, e.g. for mounting the admin API.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/{*path}", get(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(request_timeout)),
            )
    }

    /// Run the server until `shutdown` fires, applying configs received on
    /// `config_updates` as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let live_config = self.state.config.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                tracing::info!(
                    ttl_secs = new_config.session.ttl_secs,
                    transform_enabled = new_config.transform.enabled,
                    "Applying reloaded configuration"
                );
                live_config.store(Arc::new(new_config));
            }
        });

        let sweep_every = Duration::from_secs(self.state.config.load().session.sweep_interval_secs);
        let sweeper = SessionSweeper::new(self.state.sessions.clone(), sweep_every);
        tokio::spawn(sweeper.run(shutdown.resubscribe()));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(on_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn request_span(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

fn parse_request(
    state: &AppState,
    uri: &Uri,
    headers: &HeaderMap,
    start: Instant,
) -> Result<ProxyRequest, Response> {
    let config = state.config.load();
    ProxyRequest::from_parts(uri, headers, &config.session).map_err(|e| {
        tracing::warn!(uri = %uri, error = %e, "Failed to parse request");
        metrics::record_request(e.outcome(), e.status().as_u16(), start);
        e.into_response()
    })
}

/// `/`: the landing page, unless the request carries an explicit base.
async fn root_handler(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> Response {
    let start = Instant::now();
    let request = match parse_request(&state, &uri, &headers, start) {
        Ok(r) => r,
        Err(response) => return response,
    };

    if request.is_landing() {
        let base_param = state.config.load().session.base_param.clone();
        return landing_page(&base_param).into_response();
    }
    state.orchestrator.handle(request).await
}

/// Every other path is a proxied fetch.
async fn proxy_handler(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> Response {
    match parse_request(&state, &uri, &headers, Instant::now()) {
        Ok(request) => state.orchestrator.handle(request).await,
        Err(response) => response,
    }
}
