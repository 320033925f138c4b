//! Build orchestration: generated sources → external builder → served artifact
//!
//! [`BuildPipeline::build`] runs the steps in order and stops at the first
//! failure. The served artifact is only touched by the final relocation step,
//! so a failed build leaves the previous artifact in place.

use crate::builder::{ArchiveBuilder, CommandBuilder};
use crate::codegen::{render_items, render_locations};
use crate::config::{Config, PathsConfig};
use crate::error::{ArtifactError, Error, Result};
use crate::types::{CategoryMapping, WorldConfig};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error, info};

/// Sequences code generation, the external builder and artifact relocation
///
/// The pipeline itself does no locking. Callers sharing the configured paths
/// must serialize calls (the HTTP service holds its build lock around them).
#[derive(Clone)]
pub struct BuildPipeline {
    paths: PathsConfig,
    world_name: String,
    builder: Arc<dyn ArchiveBuilder>,
}

impl std::fmt::Debug for BuildPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildPipeline")
            .field("paths", &self.paths)
            .field("world_name", &self.world_name)
            .field("builder", &self.builder.name())
            .finish()
    }
}

impl BuildPipeline {
    /// Create a pipeline using an explicit builder
    pub fn new(
        paths: PathsConfig,
        world_name: impl Into<String>,
        builder: Arc<dyn ArchiveBuilder>,
    ) -> Self {
        Self {
            paths,
            world_name: world_name.into(),
            builder,
        }
    }

    /// Create a pipeline that runs the configured external builder command
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.paths.clone(),
            config.builder.world_name.clone(),
            Arc::new(CommandBuilder::from_config(&config.builder)),
        )
    }

    /// Paths this pipeline reads and writes
    pub fn paths(&self) -> &PathsConfig {
        &self.paths
    }

    /// Persist the normalized YAML document of the current request.
    pub async fn persist_document(&self, yaml: &str) -> Result<()> {
        let path = &self.paths.config_file;
        debug!(path = %path.display(), bytes = yaml.len(), "persisting world description");
        write_file(path, yaml).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "failed to persist world description");
            Error::ConfigWrite(e)
        })?;
        info!(path = %path.display(), "world description persisted");
        Ok(())
    }

    /// Render and write `RegionName.py`.
    pub async fn write_region_names(&self, locations: &CategoryMapping) -> Result<PathBuf> {
        let path = self.paths.region_file();
        write_file(&path, &render_locations(locations))
            .await
            .map_err(|e| {
                error!(path = %path.display(), error = %e, "failed to write region names");
                Error::RegionWrite(e)
            })?;
        info!(path = %path.display(), categories = locations.len(), "region names written");
        Ok(path)
    }

    /// Render and write `ItemName.py`.
    pub async fn write_item_names(&self, items: &CategoryMapping) -> Result<PathBuf> {
        let path = self.paths.item_file();
        write_file(&path, &render_items(items)).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "failed to write item names");
            Error::ItemWrite(e)
        })?;
        let total: usize = items.values().map(Vec::len).sum();
        info!(path = %path.display(), items = total, "item names written");
        Ok(path)
    }

    /// Invoke the external builder for the configured world.
    ///
    /// Any build output left over from an earlier run is removed first, so
    /// an output found afterwards always belongs to this run.
    pub async fn run_builder(&self) -> Result<()> {
        match fs::remove_file(&self.paths.build_output).await {
            Ok(()) => debug!(path = %self.paths.build_output.display(), "removed stale build output"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::BuildSubprocess(format!(
                    "cannot clear stale build output {}: {e}",
                    self.paths.build_output.display()
                )));
            }
        }

        info!(builder = self.builder.name(), world = %self.world_name, "running build");
        self.builder.build(&self.world_name).await?;
        info!(world = %self.world_name, "build completed");
        Ok(())
    }

    /// Move the build output to the served artifact path.
    ///
    /// The destination is replaced with a single rename, so readers see either
    /// the previous artifact or the new one and never a partial file.
    pub async fn relocate_artifact(&self) -> Result<PathBuf> {
        let source = &self.paths.build_output;
        let dest = &self.paths.artifact;
        info!(from = %source.display(), to = %dest.display(), "relocating artifact");

        match fs::metadata(source).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(missing_output(source));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(missing_output(source));
            }
            Err(e) => return Err(ArtifactError::Io(e).into()),
        }

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(ArtifactError::Io)?;
        }

        match fs::rename(source, dest).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                debug!("build output is on another filesystem, copying");
                copy_then_swap(source, dest).await.map_err(ArtifactError::Io)?;
            }
            Err(e) => {
                error!(error = %e, "failed to relocate artifact");
                return Err(ArtifactError::Io(e).into());
            }
        }

        info!(path = %dest.display(), "artifact relocated");
        Ok(dest.clone())
    }

    /// Run every step for `world` and return the served artifact path.
    pub async fn build(&self, world: &WorldConfig) -> Result<PathBuf> {
        self.write_region_names(&world.locations).await?;
        self.write_item_names(&world.items).await?;
        self.run_builder().await?;
        self.relocate_artifact().await
    }
}

fn missing_output(path: &Path) -> Error {
    error!(path = %path.display(), "builder reported success but produced no output");
    ArtifactError::OutputMissing {
        path: path.to_path_buf(),
    }
    .into()
}

async fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, contents).await
}

/// Copy `source` next to `dest`, rename it over `dest`, then drop `source`.
async fn copy_then_swap(source: &Path, dest: &Path) -> io::Result<()> {
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    let staging = dest.with_file_name(format!(".{file_name}.partial"));

    if let Err(e) = fs::copy(source, &staging).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e);
    }
    if let Err(e) = fs::rename(&staging, dest).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e);
    }
    fs::remove_file(source).await
}
