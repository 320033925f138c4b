//! Route handlers for the REST API
//!
//! - [`build`]: YAML in, APWorld built
//! - [`download`]: the last built APWorld

use crate::error::Error;

mod build;
mod download;

pub use build::*;
pub use download::*;

/// Fallback for unknown paths and unsupported methods
pub async fn not_found() -> Error {
    Error::RouteNotFound
}
