//! Shared fixtures for unit and API tests

use crate::builder::ArchiveBuilder;
use crate::config::{Config, PathsConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Configuration with every path inside `dir`.
pub(crate) fn test_config(dir: &Path) -> Config {
    let mut config = Config::with_root(dir);
    config.paths.config_file = dir.join("chati.yaml");
    config.paths.artifact = dir.join("served").join("chatipelago.apworld");
    config
}

/// What a [`StubBuilder`] does when invoked
#[derive(Clone, Debug)]
pub(crate) enum StubBehavior {
    /// Write the build output and succeed
    Succeed,
    /// Exit unsuccessfully with the given status
    Fail(Option<i32>),
    /// Fail as if the builder could not be started
    SpawnError,
    /// Report success without producing any output
    NoOutput,
}

#[derive(Default)]
struct StubState {
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    worlds: Mutex<Vec<String>>,
}

/// In-process builder that packs the generated sources into the build output
///
/// The "archive" is `RegionName.py` followed by `ItemName.py`, so tests can
/// check exactly which generated files a build saw.
#[derive(Clone)]
pub(crate) struct StubBuilder {
    paths: PathsConfig,
    behavior: StubBehavior,
    delay: Duration,
    state: Arc<StubState>,
}

impl StubBuilder {
    pub(crate) fn new(paths: &PathsConfig) -> Self {
        Self {
            paths: paths.clone(),
            behavior: StubBehavior::Succeed,
            delay: Duration::ZERO,
            state: Arc::new(StubState::default()),
        }
    }

    pub(crate) fn with_behavior(mut self, behavior: StubBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Keep each build running for `delay` so overlapping calls would show up.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Highest number of builds that were ever running at once
    pub(crate) fn max_concurrent(&self) -> usize {
        self.state.max_active.load(Ordering::SeqCst)
    }

    pub(crate) fn worlds(&self) -> Vec<String> {
        self.state
            .worlds
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }

    async fn package(&self) -> Result<()> {
        let region = tokio::fs::read_to_string(self.paths.region_file()).await?;
        let items = tokio::fs::read_to_string(self.paths.item_file()).await?;
        if let Some(parent) = self.paths.build_output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.paths.build_output, format!("{region}{items}")).await?;
        Ok(())
    }
}

#[async_trait]
impl ArchiveBuilder for StubBuilder {
    async fn build(&self, world_name: &str) -> Result<()> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.state.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_active.fetch_max(active, Ordering::SeqCst);
        if let Ok(mut worlds) = self.state.worlds.lock() {
            worlds.push(world_name.to_string());
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = match &self.behavior {
            StubBehavior::Succeed => self.package().await,
            StubBehavior::Fail(code) => Err(Error::BuildFailed { code: *code }),
            StubBehavior::SpawnError => Err(Error::BuildSubprocess(
                "failed to execute stub: No such file or directory".to_string(),
            )),
            StubBehavior::NoOutput => Ok(()),
        };

        self.state.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
