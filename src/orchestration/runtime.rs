//! Container runtime abstraction
//!
//! Provides a trait for the few container operations a build needs, so the
//! orchestrator does not depend on a particular CLI.

use crate::error::CrossgoResult;
use crate::logging::Logger;
use async_trait::async_trait;

/// Abstract container runtime interface
///
/// Implementations shell out to a Docker-compatible CLI:
/// `version`, `image inspect`, `pull` and `run`.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Verify the runtime is installed and reachable
    async fn check(&self, log: &dyn Logger) -> CrossgoResult<()>;

    /// Check if an image exists locally
    async fn image_exists(&self, image: &str) -> CrossgoResult<bool>;

    /// Pull an image from its registry
    async fn pull(&self, image: &str, log: &dyn Logger) -> CrossgoResult<()>;

    /// Executable that runs containers
    fn program(&self) -> &str;

    /// Arguments placed before every subcommand
    fn global_args(&self) -> &[String];
}
