//! CLI command implementations

pub mod build;
pub mod completions;
pub mod config;
pub mod containers;
pub mod images;
pub mod lifecycle;
pub mod paths;
pub mod transfer;

pub use build::{build, run};
pub use completions::execute as completions;
pub use config::execute as config;
pub use containers::{containers, prune, stop};
pub use images::execute as images;
pub use lifecycle::{backup, clean, remove, restore, touch};
pub use paths::{configfile, dockerfile, image, repository};
pub use transfer::{copy_image, move_image};
