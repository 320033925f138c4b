//! External archive builder
//!
//! The builder packages the generated `names` modules into the `.apworld`
//! archive. It is an opaque collaborator: it is handed a world name and either
//! succeeds, leaving its output at the configured build output path, or fails.
//!
//! ## Architecture
//!
//! The seam is the [`ArchiveBuilder`] trait. [`CommandBuilder`] runs an
//! external program (by default Archipelago's `_build_apworlds` through
//! `python3`); tests substitute their own implementations.
//!
//! ## Usage
//!
//! ```no_run
//! use apworld_forge::builder::{ArchiveBuilder, CommandBuilder};
//! use apworld_forge::config::BuilderConfig;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let builder = CommandBuilder::from_config(&BuilderConfig::default());
//! builder.build("Chatipelago").await?;
//! # Ok(())
//! # }
//! ```

mod cli;
mod traits;

pub use cli::CommandBuilder;
pub use traits::ArchiveBuilder;
