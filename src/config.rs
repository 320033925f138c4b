//! Configuration types for apworld-forge
//!
//! Every path the service touches is held here rather than in globals, so a
//! whole service can be pointed at a temporary directory in tests.

use crate::codegen::{ITEM_FILE_NAME, REGION_FILE_NAME};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Filesystem locations shared by every build
///
/// All of these are process-wide state. Only the build lock in the API state
/// serializes writes to them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where the normalized YAML of the last build request is persisted
    /// (default: "/tmp/chati.yaml")
    #[serde(default = "default_config_file")]
    pub config_file: PathBuf,

    /// Directory receiving the generated `RegionName.py` and `ItemName.py`
    /// (default: "worlds/chatipelago/names")
    #[serde(default = "default_names_dir")]
    pub names_dir: PathBuf,

    /// Where the external builder leaves its output
    /// (default: "build/apworlds/chatipelago.apworld")
    #[serde(default = "default_build_output")]
    pub build_output: PathBuf,

    /// Where the finished artifact is served from
    /// (default: "/tmp/chatipelago.apworld")
    #[serde(default = "default_artifact")]
    pub artifact: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: default_config_file(),
            names_dir: default_names_dir(),
            build_output: default_build_output(),
            artifact: default_artifact(),
        }
    }
}

impl PathsConfig {
    /// Default paths with the builder-side paths placed under `root`
    /// (an Archipelago checkout).
    pub fn rooted(root: &Path) -> Self {
        Self {
            names_dir: root.join(default_names_dir()),
            build_output: root.join(default_build_output()),
            ..Self::default()
        }
    }

    /// Path of the generated location module
    pub fn region_file(&self) -> PathBuf {
        self.names_dir.join(REGION_FILE_NAME)
    }

    /// Path of the generated item module
    pub fn item_file(&self) -> PathBuf {
        self.names_dir.join(ITEM_FILE_NAME)
    }
}

/// External archive builder settings
///
/// The builder is run as `program args... world_name`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// World identifier passed to the builder (default: "Chatipelago")
    #[serde(default = "default_world_name")]
    pub world_name: String,

    /// Executable to run (default: "python3", looked up on PATH)
    #[serde(default = "default_program")]
    pub program: PathBuf,

    /// Arguments placed before the world name
    /// (default: a `-c` snippet calling Archipelago's `_build_apworlds`)
    #[serde(default = "default_builder_args")]
    pub args: Vec<String>,

    /// Working directory for the builder process (default: inherit)
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            world_name: default_world_name(),
            program: default_program(),
            args: default_builder_args(),
            working_dir: None,
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8123)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Largest accepted request body in bytes (default: 16 MiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// File name offered in the download's Content-Disposition
    /// (default: "chatipelago.apworld")
    #[serde(default = "default_download_filename")]
    pub download_filename: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            max_body_bytes: default_max_body_bytes(),
            download_filename: default_download_filename(),
        }
    }
}

/// Main configuration for apworld-forge
///
/// - [`paths`](PathsConfig): config, generated source and artifact locations
/// - [`builder`](BuilderConfig): how the external archive builder is invoked
/// - [`api`](ApiConfig): HTTP bind address and limits
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Filesystem locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// External builder invocation
    #[serde(default)]
    pub builder: BuilderConfig,

    /// HTTP service settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Default configuration for an Archipelago checkout at `root`.
    ///
    /// Generated sources and the build output live under `root`, and the
    /// builder runs with `root` as its working directory.
    pub fn with_root(root: &Path) -> Self {
        Self {
            paths: PathsConfig::rooted(root),
            builder: BuilderConfig {
                working_dir: Some(root.to_path_buf()),
                ..BuilderConfig::default()
            },
            api: ApiConfig::default(),
        }
    }

    /// Read a TOML configuration file. Missing keys take their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {e}", path.display()),
            key: None,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse a TOML configuration document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| Error::Config {
            message: e.to_string(),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.builder.world_name.trim().is_empty() {
            return Err(Error::Config {
                message: "world name must not be empty".to_string(),
                key: Some("builder.world_name".to_string()),
            });
        }
        if self.builder.program.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "builder program must not be empty".to_string(),
                key: Some("builder.program".to_string()),
            });
        }
        if self.api.max_body_bytes == 0 {
            return Err(Error::Config {
                message: "body limit must be greater than zero".to_string(),
                key: Some("api.max_body_bytes".to_string()),
            });
        }
        if self.paths.build_output == self.paths.artifact {
            return Err(Error::Config {
                message: "build output and artifact must be different paths".to_string(),
                key: Some("paths.artifact".to_string()),
            });
        }
        Ok(())
    }
}

fn default_config_file() -> PathBuf {
    PathBuf::from("/tmp/chati.yaml")
}

fn default_names_dir() -> PathBuf {
    PathBuf::from("worlds/chatipelago/names")
}

fn default_build_output() -> PathBuf {
    PathBuf::from("build/apworlds/chatipelago.apworld")
}

fn default_artifact() -> PathBuf {
    PathBuf::from("/tmp/chatipelago.apworld")
}

fn default_world_name() -> String {
    "Chatipelago".to_string()
}

fn default_program() -> PathBuf {
    PathBuf::from("python3")
}

fn default_builder_args() -> Vec<String> {
    vec![
        "-c".to_string(),
        "import sys\n\
         from worlds.LauncherComponents import _build_apworlds\n\
         _build_apworlds(sys.argv[1])\n"
            .to_string(),
    ]
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8123))
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_download_filename() -> String {
    "chatipelago.apworld".to_string()
}
