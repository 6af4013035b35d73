//! Terminal output and confirmation prompts
//!
//! Uses `cliclack` for interactive terminals and falls back to plain,
//! prefixed lines in CI or when output is piped.

mod context;
mod output;
mod prompts;

pub use context::UiContext;
pub use output::{step_info, step_ok, step_ok_detail, step_warn_hint};
pub use prompts::confirm;
