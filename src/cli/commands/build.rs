//! Build and run commands

use crate::cli::args::BuildArgs;
use crate::docker::Executor;
use crate::error::DockResult;
use crate::image::{BuildOptions, BuildOutcome, Image};
use crate::repository::Repository;
use crate::ui::{self, UiContext};

async fn build_if_needed(
    args: &BuildArgs,
    repository: &Repository,
    executor: &dyn Executor,
) -> DockResult<Image> {
    let image = repository.require(&args.tag)?;
    let options = BuildOptions {
        force: args.force,
        suggest: args.suggest,
    };

    let ctx = UiContext::detect();
    match image.build(executor, options).await? {
        BuildOutcome::Built => ui::step_ok(&ctx, &format!("Built {}", image.tag())),
        BuildOutcome::UpToDate => ui::step_info(&ctx, &format!("{} is up to date", image.tag())),
    }
    Ok(image)
}

/// Build an image if its build files changed
pub async fn build(
    args: BuildArgs,
    repository: &Repository,
    executor: &dyn Executor,
) -> DockResult<()> {
    build_if_needed(&args, repository, executor).await?;
    Ok(())
}

/// Build an image if needed, then run it
pub async fn run(args: BuildArgs, repository: &Repository, executor: &dyn Executor) -> DockResult<()> {
    let image = build_if_needed(&args, repository, executor).await?;
    image.run(executor).await?;
    Ok(())
}
