//! # apworld-forge
//!
//! Turns a YAML list of items and locations into the `names` modules of the
//! Chatipelago Archipelago world, runs the external APWorld builder and
//! serves the result over HTTP.
//!
//! ## Design Philosophy
//!
//! - **Deterministic output** - the same YAML always generates the same files
//! - **One build at a time** - builds share fixed paths and are serialized
//! - **Last good artifact wins** - a failed build never replaces what is served
//!
//! ## Quick Start
//!
//! ```no_run
//! use apworld_forge::{BuildPipeline, Config, loader};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::with_root(Path::new("/opt/archipelago"));
//!     let pipeline = BuildPipeline::from_config(&config);
//!
//!     let world = loader::parse_world_config(
//!         "items:\n  normal: [Sword]\nlocations:\n  town: [Well]\n",
//!     )?;
//!     let artifact = pipeline.build(&world).await?;
//!     println!("built {}", artifact.display());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// External archive builders
pub mod builder;
/// Python source generation
pub mod codegen;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// YAML world description loading
pub mod loader;
/// Build orchestration
pub mod pipeline;
/// Core types
pub mod types;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use builder::{ArchiveBuilder, CommandBuilder};
pub use config::{ApiConfig, BuilderConfig, Config, PathsConfig};
pub use error::{ApiError, ArtifactError, Error, Result, ToHttpStatus};
pub use pipeline::BuildPipeline;
pub use types::{BuildResponse, CategoryMapping, ItemCategory, WorldConfig};

/// Completes when the process is asked to stop.
///
/// Pass this to [`api::start_api_server`] for graceful shutdown.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn shutdown_signal() {
    wait_for_signal().await;
    tracing::info!("Shutting down");
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
