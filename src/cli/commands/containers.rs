//! Container commands - list, stop and prune what dock started

use crate::cli::args::StopArgs;
use crate::config::DEFAULT_LABEL;
use crate::docker::Executor;
use crate::error::DockResult;
use crate::ui::{self, UiContext};

/// List containers labelled by dock
pub async fn containers(executor: &dyn Executor) -> DockResult<()> {
    executor.list_containers(DEFAULT_LABEL).await
}

/// Stop a container
pub async fn stop(args: StopArgs, executor: &dyn Executor) -> DockResult<()> {
    executor.stop_container(&args.container, args.time).await?;
    ui::step_ok(
        &UiContext::detect(),
        &format!("Stopped {}", args.container),
    );
    Ok(())
}

/// Prune exited containers and dangling images labelled by dock
pub async fn prune(executor: &dyn Executor) -> DockResult<()> {
    executor.prune(DEFAULT_LABEL).await
}
