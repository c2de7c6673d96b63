//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (request ID, tracing, concurrency and body limits)
//! - Apply configuration updates as atomic snapshot swaps
//! - Dispatch requests to the routing engine
//! - Forward requests to upstream backends
//! - Observability (metrics, correlation IDs)

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::config::{ConfigError, GatewayConfig};
use crate::http::forward::{self, UpstreamError};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response;
use crate::observability::metrics;
use crate::observability::tracing::http_trace_layer;
use crate::routing::{MatchResult, RouteRequest};
use crate::state::SharedState;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub shared: SharedState,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails if the configuration does not validate or compile.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let shared = SharedState::new(config)?;
        let snapshot = shared.load();

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(snapshot.config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState { shared, client };
        let router = Self::build_router(&snapshot.config, state.clone());

        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_size))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(propagate_request_id_layer())
            .layer(http_trace_layer())
            .layer(set_request_id_layer())
    }

    /// Shared state, for the admin API.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Every configuration received on `config_updates` is compiled and swapped
    /// in atomically; a rejected update keeps the current routes.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let shared = self.state.shared.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = shared.apply(config) {
                    tracing::error!(error = %e, "Rejected configuration update, keeping current routes");
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Matches the request against the current snapshot and forwards it.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let request_id = request_id(request.headers()).to_string();

    // One snapshot for the whole request.
    let snapshot = state.shared.load();
    let route_request = RouteRequest::from_http(&request);
    let result = snapshot.routes.match_request(&route_request);
    metrics::record_lookup(result.label());

    let (route_label, backend_ref) = match result {
        MatchResult::Matched(m) => (m.route.to_string(), m.backend),
        MatchResult::Fallback { backend } => ("fallback".to_string(), backend),
        MatchResult::Unmatched => {
            tracing::warn!(
                request_id = %request_id,
                host = %route_request.host(),
                path = %route_request.path(),
                "No route matched"
            );
            metrics::record_request(&method, 404, "none", start_time);
            return response::not_found();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        host = %route_request.host(),
        path = %route_request.path(),
        route = %route_label,
        backend = %backend_ref,
        generation = snapshot.routes.generation(),
        "Route matched"
    );

    let Some(backend) = snapshot.backends.get(&backend_ref) else {
        let error = UpstreamError::UnknownBackend(backend_ref);
        tracing::error!(request_id = %request_id, error = %error, "Matched backend is not registered");
        metrics::record_request(&method, error.status_code().as_u16(), &route_label, start_time);
        return response::upstream_error(&error);
    };

    let timeout = Duration::from_secs(snapshot.config.timeouts.request_secs);
    let in_flight = backend.track();

    match forward::forward(&state.client, &in_flight, request, peer, timeout).await {
        Ok(upstream) => {
            metrics::record_request(&method, upstream.status().as_u16(), &route_label, start_time);
            response::from_upstream(upstream)
        }
        Err(error) => {
            tracing::error!(
                request_id = %request_id,
                backend = %backend_ref,
                error = %error,
                "Upstream error"
            );
            metrics::record_request(&method, error.status_code().as_u16(), &route_label, start_time);
            response::upstream_error(&error)
        }
    }
}
