//! Error types for apworld-forge
//!
//! This module provides the error handling for the library, including:
//! - The crate-wide [`Error`] enum, grouped into client input, not-found and
//!   server-step failures
//! - HTTP status code mapping for API integration ([`ToHttpStatus`])
//! - The flat JSON error body returned by the HTTP service ([`ApiError`])

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for apworld-forge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for apworld-forge
///
/// The `Display` text of every variant is the exact message returned to
/// HTTP clients in the `error` field of the response body.
#[derive(Debug, Error)]
pub enum Error {
    // ---------------------------------------------------------------------
    // Client input
    // ---------------------------------------------------------------------
    /// The request carried no body at all
    #[error("Request body is empty")]
    EmptyBody,

    /// A JSON envelope could not be parsed
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// A JSON envelope had neither a `yaml` string nor a `data` object
    #[error("Expected 'yaml' string or 'data' object")]
    MissingEnvelopeField,

    /// The body was not valid UTF-8
    #[error("Invalid UTF-8 encoding: {0}")]
    InvalidEncoding(String),

    /// The YAML text was empty or whitespace only
    #[error("YAML content is empty")]
    EmptyDocument,

    /// The YAML text failed to parse
    #[error("Invalid YAML syntax: {0}")]
    InvalidYaml(String),

    /// The document parsed but does not have the expected shape
    #[error("{0}")]
    Schema(String),

    // ---------------------------------------------------------------------
    // Not found
    // ---------------------------------------------------------------------
    /// No route matches the request
    #[error("Not found")]
    RouteNotFound,

    /// No artifact has been built yet
    #[error("Artifact not found")]
    ArtifactNotFound,

    /// The persisted YAML file does not exist
    #[error("YAML file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    // ---------------------------------------------------------------------
    // Build steps
    // ---------------------------------------------------------------------
    /// Persisting the normalized YAML failed
    #[error("Failed to write YAML file: {0}")]
    ConfigWrite(#[source] std::io::Error),

    /// Writing the generated region name file failed
    #[error("Failed to write region names: {0}")]
    RegionWrite(#[source] std::io::Error),

    /// Writing the generated item name file failed
    #[error("Failed to write item names: {0}")]
    ItemWrite(#[source] std::io::Error),

    /// The external builder ran and reported failure
    #[error("Build failed")]
    BuildFailed {
        /// Exit status of the builder process, when it exited normally
        code: Option<i32>,
    },

    /// The external builder could not be invoked
    #[error("Build subprocess error: {0}")]
    BuildSubprocess(String),

    /// Moving the build output to the serving location failed
    #[error("Failed to move output file: {0}")]
    Relocate(#[from] ArtifactError),

    // ---------------------------------------------------------------------
    // Everything else
    // ---------------------------------------------------------------------
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "builder.world_name")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Failures while relocating the build output to the serving path
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The builder reported success but left no output behind
    #[error("Build output not found: {}", path.display())]
    OutputMissing {
        /// Where the build output was expected
        path: PathBuf,
    },

    /// The filesystem refused the move
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// { "error": "YAML must contain 'locations' key" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message
    pub error: String,

    /// Builder exit status, only present for a failed build
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
}

impl ApiError {
    /// Create an API error with just a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: None,
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error kind, used in log fields
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - the body is unusable
            Error::EmptyBody
            | Error::InvalidJson(_)
            | Error::MissingEnvelopeField
            | Error::InvalidEncoding(_)
            | Error::EmptyDocument
            | Error::InvalidYaml(_)
            | Error::Schema(_) => 400,

            // 404 Not Found
            Error::RouteNotFound | Error::ArtifactNotFound | Error::ConfigNotFound(_) => 404,

            // 500 - a build step failed
            Error::ConfigWrite(_)
            | Error::RegionWrite(_)
            | Error::ItemWrite(_)
            | Error::BuildFailed { .. }
            | Error::BuildSubprocess(_)
            | Error::Relocate(_) => 500,

            // 500 - anything not anticipated
            Error::Config { .. }
            | Error::Io(_)
            | Error::ApiServerError(_)
            | Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::EmptyBody => "empty_body",
            Error::InvalidJson(_) => "invalid_json",
            Error::MissingEnvelopeField => "missing_envelope_field",
            Error::InvalidEncoding(_) => "invalid_encoding",
            Error::EmptyDocument => "empty_document",
            Error::InvalidYaml(_) => "invalid_yaml",
            Error::Schema(_) => "schema_error",
            Error::RouteNotFound => "not_found",
            Error::ArtifactNotFound => "artifact_not_found",
            Error::ConfigNotFound(_) => "config_not_found",
            Error::ConfigWrite(_) => "config_write_failed",
            Error::RegionWrite(_) => "region_write_failed",
            Error::ItemWrite(_) => "item_write_failed",
            Error::BuildFailed { .. } => "build_failed",
            Error::BuildSubprocess(_) => "build_subprocess_error",
            Error::Relocate(ArtifactError::OutputMissing { .. }) => "build_output_missing",
            Error::Relocate(ArtifactError::Io(_)) => "relocate_failed",
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = match &error {
            Error::BuildFailed { code } => *code,
            _ => None,
        };

        ApiError {
            error: error.to_string(),
            code,
        }
    }
}
