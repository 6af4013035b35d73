//! dock - x11docker image workbench
//!
//! Keeps one build environment (a Dockerfile plus a JSON flag descriptor)
//! per image tag, and only invokes the builder when the environment changed
//! since the last successful build.

pub mod cli;
pub mod config;
pub mod docker;
pub mod environment;
pub mod error;
pub mod files;
pub mod image;
pub mod repository;
pub mod ui;

pub use error::{DockError, DockResult};
pub use image::{BuildOptions, BuildOutcome, Image};
pub use repository::Repository;
