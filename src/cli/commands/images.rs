//! Images command - list the repository's images

use crate::cli::args::{ImagesArgs, OutputFormat};
use crate::error::DockResult;
use crate::image::{Image, ImageState};
use crate::repository::Repository;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the images command
pub fn execute(args: ImagesArgs, repository: &Repository) -> DockResult<()> {
    let images = repository.iter()?.collect::<DockResult<Vec<Image>>>()?;

    if images.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => ui::step_info(&UiContext::detect(), "No images"),
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&images),
        OutputFormat::Json => print_json(&images)?,
        OutputFormat::Plain => print_plain(&images),
    }

    Ok(())
}

fn print_table(images: &[Image]) {
    println!(
        "{:<30} {:<10} {}",
        style("TAG").bold(),
        style("STATE").bold(),
        style("DIRECTORY").bold()
    );
    println!("{}", "-".repeat(72));

    for image in images {
        let state = image.state();
        let state_styled = match state {
            ImageState::Built => style(state.to_string()).green(),
            ImageState::Touched => style(state.to_string()).yellow(),
            ImageState::Untouched => style(state.to_string()).dim(),
        };
        println!(
            "{:<30} {:<10} {}",
            image.tag(),
            state_styled,
            image.directory().display()
        );
    }

    println!();
    println!("{} image(s)", images.len());
}

fn print_json(images: &[Image]) -> DockResult<()> {
    #[derive(serde::Serialize)]
    struct ImageJson {
        tag: String,
        directory: String,
        state: String,
    }

    let json_images: Vec<ImageJson> = images
        .iter()
        .map(|i| ImageJson {
            tag: i.tag().to_string(),
            directory: i.directory().display().to_string(),
            state: i.state().to_string(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json_images)?);
    Ok(())
}

fn print_plain(images: &[Image]) {
    for image in images {
        println!("{} : {}", image.tag(), image.directory().display());
    }
}
