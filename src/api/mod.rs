//! REST API server module
//!
//! Exposes the build pipeline over HTTP: one endpoint builds the APWorld from
//! a posted world description, one serves the last successful build.

use crate::pipeline::BuildPipeline;
use crate::{Config, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

pub mod cors;
pub mod error_response;
pub mod routes;
pub mod state;

pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// - `POST /apworld/build` - Generate sources and build the APWorld
/// - `GET /apworld/download` - Download the last built APWorld
///
/// Both also answer with a trailing slash. `OPTIONS` on any path is a CORS
/// preflight, and every other path or method gets 404 `{"error": "Not found"}`.
pub fn create_router(config: Arc<Config>, pipeline: Arc<BuildPipeline>) -> Router {
    let body_limit = config.api.max_body_bytes;
    let state = AppState::new(config, pipeline);

    Router::new()
        .route(
            "/apworld/build",
            post(routes::build_apworld).fallback(routes::not_found),
        )
        .route(
            "/apworld/build/",
            post(routes::build_apworld).fallback(routes::not_found),
        )
        .route(
            "/apworld/download",
            get(routes::download_apworld).fallback(routes::not_found),
        )
        .route(
            "/apworld/download/",
            get(routes::download_apworld).fallback(routes::not_found),
        )
        .fallback(routes::not_found)
        .with_state(state)
        // The last layer applied is the outermost.
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(cors::allow_any_origin))
        .layer(TraceLayer::new_for_http())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "request handler panicked");

    crate::error::ApiError::new(detail).into_response()
}

/// Bind the configured address and serve the API until `shutdown` completes.
///
/// # Example
///
/// ```no_run
/// use apworld_forge::{Config, pipeline::BuildPipeline};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let pipeline = Arc::new(BuildPipeline::from_config(&config));
///
/// // Serves until SIGINT/SIGTERM
/// apworld_forge::api::start_api_server(config, pipeline, apworld_forge::shutdown_signal()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server<F>(
    config: Arc<Config>,
    pipeline: Arc<BuildPipeline>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_address = config.api.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let listener = TcpListener::bind(bind_address).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            tracing::error!(
                address = %bind_address,
                "Address already in use; is another instance running? Pick another port with --port"
            );
        }
        crate::error::Error::Io(e)
    })?;

    serve(listener, create_router(config, pipeline), shutdown).await
}

/// Serve `app` on an already bound listener until `shutdown` completes.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(address) = listener.local_addr() {
        tracing::info!(
            address = %address,
            "API server listening"
        );
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
