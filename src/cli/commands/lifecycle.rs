//! Lifecycle commands - touch, clean, remove, backup, restore

use crate::cli::args::{BackupArgs, RemoveArgs, RestoreArgs, TagArgs};
use crate::docker::Executor;
use crate::error::{DockError, DockResult};
use crate::files;
use crate::repository::Repository;
use crate::ui::{self, UiContext};

/// Create a template build environment for a tag
pub fn touch(args: TagArgs, repository: &Repository) -> DockResult<()> {
    let image = repository.get(&args.tag)?;
    image.touch()?;
    ui::step_ok_detail(
        &UiContext::detect(),
        &format!("{} is ready", image.tag()),
        &image.build_env().directory().display().to_string(),
    );
    Ok(())
}

/// Drop an image's build cache
pub fn clean(args: TagArgs, repository: &Repository) -> DockResult<()> {
    let image = repository.require(&args.tag)?;
    image.clean()?;
    ui::step_ok(
        &UiContext::detect(),
        &format!("Cleaned build cache of {}", image.tag()),
    );
    Ok(())
}

/// Remove an image after confirmation
pub async fn remove(
    args: RemoveArgs,
    repository: &Repository,
    executor: &dyn Executor,
) -> DockResult<()> {
    let image = repository.require(&args.tag)?;
    let ctx = UiContext::detect().with_auto_yes(args.force);

    let prompt = format!("DELETE {} completely?", image.tag());
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::step_warn_hint(&ctx, "Nothing removed", "Use --force to skip confirmation");
        return Ok(());
    }

    image.remove(executor).await?;
    ui::step_ok(&ctx, &format!("Removed {}", image.tag()));
    Ok(())
}

/// Archive an image
pub fn backup(args: BackupArgs, repository: &Repository) -> DockResult<()> {
    let image = repository.require(&args.tag)?;
    image.backup(&args.archive)?;
    ui::step_ok_detail(
        &UiContext::detect(),
        &format!("Backed up {}", image.tag()),
        &files::expand(&args.archive).display().to_string(),
    );
    Ok(())
}

/// Restore an image, replacing an existing one after confirmation.
///
/// The archive is unpacked beside the image first, so a broken archive
/// fails before the existing image is touched.
pub async fn restore(
    args: RestoreArgs,
    repository: &Repository,
    executor: &dyn Executor,
) -> DockResult<()> {
    let archive = files::expand(&args.archive);
    if !archive.is_file() {
        return Err(DockError::PathNotFound(archive));
    }

    let image = repository.get(&args.tag)?;
    let staged = image.stage_restore(&archive)?;
    let ctx = UiContext::detect().with_auto_yes(args.force);

    if !image.is_empty() {
        let prompt = format!("DELETE and RESTORE {} completely?", image.tag());
        if !ui::confirm(&ctx, &prompt, false).await? {
            ui::step_warn_hint(&ctx, "Nothing restored", "Use --force to replace the image");
            return Ok(());
        }
        image.remove(executor).await?;
    }

    image.restore_staged(staged)?;
    ui::step_ok_detail(
        &ctx,
        &format!("Restored {}", image.tag()),
        &archive.display().to_string(),
    );
    Ok(())
}
