//! Common helpers for apworld-forge integration tests

use apworld_forge::Config;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Shell snippet that packs both generated modules into the build output and
/// records the world name it was given.
pub const PACKING_SCRIPT: &str = r#"set -e
mkdir -p build/apworlds
cat worlds/chatipelago/names/RegionName.py worlds/chatipelago/names/ItemName.py \
    > build/apworlds/chatipelago.apworld
printf '%s' "$0" > world.txt
"#;

/// A temporary Archipelago checkout with a builder running `sh -c <script>`
pub struct ShellWorld {
    /// Checkout root, removed on drop
    pub dir: TempDir,
    /// Configuration pointing every path into `dir`
    pub config: Config,
}

impl ShellWorld {
    /// Checkout whose builder runs `script`
    pub fn new(script: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_root(dir.path());
        config.paths.config_file = dir.path().join("chati.yaml");
        config.paths.artifact = dir.path().join("served").join("chatipelago.apworld");
        config.builder.program = PathBuf::from("sh");
        config.builder.args = vec!["-c".to_string(), script.to_string()];
        Self { dir, config }
    }

    /// Root of the checkout
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}
