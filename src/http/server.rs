//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single dispatching fallback handler
//! - Wire up middleware (tracing, timeout, limits, request ID)
//! - Bind server to listener and shut down gracefully
//! - Hand every request to the application router
//! - Observability (metrics, correlation IDs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    response::{IntoResponse, Response as HttpResponse},
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::config::AppConfig;
use crate::http::{Request, Response};
use crate::lifecycle::shutdown::signalled;
use crate::lifecycle::Application;
use crate::observability::{metrics, tracing::request_span};
use crate::routing::Router;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub body_limit: usize,
}

/// HTTP server hosting an [`Application`].
pub struct HttpServer {
    router: axum::Router,
    config: Arc<AppConfig>,
}

impl HttpServer {
    pub fn new(app: &Application) -> Self {
        let config = Arc::new(app.config().clone());
        let state = AppState {
            router: Arc::clone(app.router()),
            body_limit: config.listener.body_limit,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> axum::Router {
        axum::Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.listener.body_limit))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            max_connections = self.config.listener.max_connections,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(signalled(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Normalize the transport request, resolve it and render the result.
async fn dispatch_handler(
    State(state): State<AppState>,
    request: axum::http::Request<Body>,
) -> HttpResponse {
    let start_time = Instant::now();
    let method_str = request.method().to_string();

    let request = match Request::from_http(request, state.body_limit).await {
        Ok(request) => Arc::new(request),
        Err(error) => {
            metrics::record_request(&method_str, error.status_code().as_u16(), "none", start_time);
            return error.into_response();
        }
    };

    let span = request_span(&request);
    async move {
        let mut response = Response::new();
        let result = state.router.resolve(Arc::clone(&request), &mut response).await;
        let route = response.route().unwrap_or("none").to_string();
        let http = match result {
            Ok(output) => response.render(output),
            Err(error) => error.into_response(),
        };

        tracing::debug!(status = http.status().as_u16(), route = %route, "Request dispatched");
        metrics::record_request(&method_str, http.status().as_u16(), &route, start_time);
        http
    }
    .instrument(span)
    .await
}
