//! Confirmation prompt with CI/non-interactive fallback

use super::context::UiContext;
use crate::error::{DockError, DockResult};

/// Ask for confirmation; returns `default` when not interactive.
///
/// With auto-yes set, confirms without prompting.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> DockResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    let message = message.to_string();
    let result = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| DockError::User(format!("Prompt task failed: {}", e)))?;

    result.map_err(|e| DockError::User(format!("Prompt failed: {}", e)))
}
