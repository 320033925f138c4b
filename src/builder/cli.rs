//! Archive builder backed by an external program

use super::traits::ArchiveBuilder;
use crate::config::BuilderConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Archive builder that runs `program args... <world name>`
///
/// A zero exit status counts as success. Output on stdout and stderr is
/// captured and logged.
///
/// # Examples
///
/// ```no_run
/// use apworld_forge::builder::{ArchiveBuilder, CommandBuilder};
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let builder = CommandBuilder::new(PathBuf::from("/usr/bin/python3"))
///     .with_args(vec!["build_world.py".to_string()])
///     .with_working_dir(PathBuf::from("/opt/archipelago"));
///
/// builder.build("Chatipelago").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct CommandBuilder {
    program: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandBuilder {
    /// Create a builder running `program` with no extra arguments
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Arguments placed before the world name
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Directory the program runs in
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Create a builder from configuration.
    ///
    /// A bare program name is looked up on PATH with the `which` crate. If the
    /// lookup fails the bare name is kept, and the failure surfaces when the
    /// build is attempted.
    pub fn from_config(config: &BuilderConfig) -> Self {
        let builder = Self::new(resolve_program(&config.program)).with_args(config.args.clone());
        match &config.working_dir {
            Some(dir) => builder.with_working_dir(dir.clone()),
            None => builder,
        }
    }

    /// The program that will be executed
    pub fn program(&self) -> &Path {
        &self.program
    }
}

fn resolve_program(program: &Path) -> PathBuf {
    if program.components().count() != 1 || program.is_absolute() {
        return program.to_path_buf();
    }
    match which::which(program) {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(
                program = %program.display(),
                error = %e,
                "builder program not found on PATH"
            );
            program.to_path_buf()
        }
    }
}

#[async_trait]
impl ArchiveBuilder for CommandBuilder {
    async fn build(&self, world_name: &str) -> Result<()> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(world_name)
            .stdin(Stdio::null());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        tracing::info!(
            program = %self.program.display(),
            world = world_name,
            "running archive builder"
        );

        let output = command.output().await.map_err(|e| {
            Error::BuildSubprocess(format!(
                "failed to execute {}: {e}",
                self.program.display()
            ))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            tracing::debug!(stdout = %stdout.trim_end(), "builder output");
        }

        if output.status.success() {
            if !stderr.trim().is_empty() {
                tracing::debug!(stderr = %stderr.trim_end(), "builder diagnostics");
            }
            return Ok(());
        }

        let code = output.status.code();
        tracing::error!(
            ?code,
            stderr = %stderr.trim_end(),
            "archive builder failed"
        );
        Err(Error::BuildFailed { code })
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
