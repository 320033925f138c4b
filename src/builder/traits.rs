//! Trait for the external archive builder

use async_trait::async_trait;

/// Trait for packaging a world into its distributable archive
///
/// Implementations must leave the archive at the build output path the
/// pipeline was configured with before returning `Ok`.
#[async_trait]
pub trait ArchiveBuilder: Send + Sync {
    /// Build the archive for `world_name`
    ///
    /// # Errors
    ///
    /// - [`crate::Error::BuildFailed`] if the builder ran and reported failure
    /// - [`crate::Error::BuildSubprocess`] if the builder could not be started
    async fn build(&self, world_name: &str) -> crate::Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
