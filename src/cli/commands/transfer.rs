//! Move and copy commands - relabel or duplicate an image

use crate::cli::args::TransferArgs;
use crate::docker::Executor;
use crate::error::{DockError, DockResult};
use crate::files;
use crate::image::{BuildOptions, Image};
use crate::repository::Repository;
use crate::ui::{self, UiContext};
use tracing::debug;

/// Resolve and check both ends of a transfer
fn endpoints(args: &TransferArgs, repository: &Repository) -> DockResult<(Image, Image)> {
    let source = repository.require(&args.source_tag)?;
    let target = repository.get(&args.target_tag)?;

    if source == target {
        return Err(DockError::User(format!(
            "Source and target are the same image: {}",
            source.tag()
        )));
    }
    if !args.only_build && !target.is_empty() {
        return Err(DockError::ImageExists(target.tag().to_string()));
    }
    Ok((source, target))
}

const SUGGESTED: BuildOptions = BuildOptions {
    force: false,
    suggest: true,
};

/// Move an image to a new tag, build it, and remove the old one
pub async fn move_image(
    args: TransferArgs,
    repository: &Repository,
    executor: &dyn Executor,
) -> DockResult<()> {
    let (source, target) = endpoints(&args, repository)?;

    if args.only_build {
        target.build_env().remove()?;
        files::move_directory(source.build_env().directory(), target.build_env().directory())?;
    } else {
        files::move_directory(source.directory(), target.directory())?;
    }
    repository.compare_cache().clear();
    debug!("Moved {} to {}", source.tag(), target.tag());

    target.build(executor, SUGGESTED).await?;
    source.remove(executor).await?;

    ui::step_ok(
        &UiContext::detect(),
        &format!("Moved {} to {}", source.tag(), target.tag()),
    );
    Ok(())
}

/// Copy an image to a new tag and build it
pub async fn copy_image(
    args: TransferArgs,
    repository: &Repository,
    executor: &dyn Executor,
) -> DockResult<()> {
    let (source, target) = endpoints(&args, repository)?;

    if args.only_build {
        files::copy_directory(source.build_env().directory(), target.build_env().directory())?;
    } else {
        files::copy_directory(source.directory(), target.directory())?;
    }
    repository.compare_cache().clear();
    debug!("Copied {} to {}", source.tag(), target.tag());

    target.build(executor, SUGGESTED).await?;

    ui::step_ok(
        &UiContext::detect(),
        &format!("Copied {} to {}", source.tag(), target.tag()),
    );
    Ok(())
}
