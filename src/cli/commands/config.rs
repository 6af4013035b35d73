//! Config command - show or initialize the settings file

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{ConfigManager, Settings};
use crate::error::DockResult;
use crate::ui::{self, UiContext};

/// Execute the config command
pub async fn execute(args: ConfigArgs, settings: &Settings, manager: &ConfigManager) -> DockResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_settings(settings)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_settings(manager, force).await?,
    }
    Ok(())
}

fn show_settings(settings: &Settings) -> DockResult<()> {
    print!("{}", toml::to_string_pretty(settings)?);
    Ok(())
}

async fn init_settings(manager: &ConfigManager, force: bool) -> DockResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Settings already exist at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Settings::default()).await?;
    ui::step_ok_detail(&ctx, "Settings initialized", &path.display().to_string());
    Ok(())
}
