//! Application state for the API server

use crate::Config;
use crate::pipeline::BuildPipeline;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone). All clones share
/// one build lock, so at most one build touches the configured paths at a time.
#[derive(Clone)]
pub struct AppState {
    /// Configuration (read-only while serving)
    pub config: Arc<Config>,

    /// Generation and build steps
    pub pipeline: Arc<BuildPipeline>,

    /// Held for the whole of a build, from persisting the YAML to relocating
    /// the artifact
    pub build_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(config: Arc<Config>, pipeline: Arc<BuildPipeline>) -> Self {
        Self {
            config,
            pipeline,
            build_lock: Arc::new(Mutex::new(())),
        }
    }
}
