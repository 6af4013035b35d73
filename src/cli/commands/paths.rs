//! Path commands - print where an image's files live

use crate::error::DockResult;
use crate::repository::Repository;

/// Print the image directory
pub fn image(tag: &str, repository: &Repository) -> DockResult<()> {
    let image = repository.get(tag)?;
    println!("{}", image.directory().display());
    Ok(())
}

/// Print the repository directory
pub fn repository(repository: &Repository) -> DockResult<()> {
    println!("{}", repository.directory().display());
    Ok(())
}

/// Print the image's Dockerfile path
pub fn dockerfile(tag: &str, repository: &Repository) -> DockResult<()> {
    let image = repository.get(tag)?;
    println!("{}", image.build_env().dockerfile().display());
    Ok(())
}

/// Print the image's run configuration path
pub fn configfile(tag: &str, repository: &Repository) -> DockResult<()> {
    let image = repository.get(tag)?;
    println!("{}", image.build_env().configfile().display());
    Ok(())
}
