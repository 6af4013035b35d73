//! External executor abstraction
//!
//! The core never runs containers itself: it hands a working directory and a
//! flag list to an [`Executor`] and only cares whether the call succeeded.

use crate::error::DockResult;
use async_trait::async_trait;
use std::path::Path;

/// Builds, runs and cleans up container artifacts on behalf of dock.
///
/// Every call blocks until the underlying tool exits; a nonzero exit is
/// reported as [`crate::DockError::ExecutionFailed`].
#[async_trait]
pub trait Executor: Send + Sync {
    /// Build the image described by `working_dir` with `build_flags`
    async fn build(&self, working_dir: &Path, build_flags: &[String]) -> DockResult<()>;

    /// Run the image tagged `tag` from `working_dir` with `run_flags`
    async fn run(&self, working_dir: &Path, tag: &str, run_flags: &[String]) -> DockResult<()>;

    /// Remove the built image for `tag`; an absent image is not an error
    async fn remove_image(&self, tag: &str) -> DockResult<()>;

    /// Prune exited containers and dangling images carrying `label`
    async fn prune(&self, label: &str) -> DockResult<()>;

    /// Print containers carrying `label`
    async fn list_containers(&self, label: &str) -> DockResult<()>;

    /// Stop a container, killing it after `timeout_secs`
    async fn stop_container(&self, container: &str, timeout_secs: u32) -> DockResult<()>;

    /// Human-readable executor name for display
    fn executor_name(&self) -> &'static str;
}
