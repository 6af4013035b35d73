//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// dock - x11docker image workbench
///
/// Keeps a Dockerfile and x11docker flags per tag and only rebuilds an
/// image when its build files changed since the last successful build.
#[derive(Parser, Debug)]
#[command(name = "dock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Settings file path
    #[arg(short, long, global = true, env = "DOCK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Repository root directory
    #[arg(short, long, global = true, env = "DOCK_DESKTOP_X11_HOME")]
    pub repo: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available images
    Images(ImagesArgs),

    /// List containers started from dock images
    Containers,

    /// Stop a running container
    Stop(StopArgs),

    /// Remove exited containers and dangling images created by dock
    Prune,

    /// Print the image's directory
    Image(TagArgs),

    /// Print the repository's directory
    Repository,

    /// Print the path of the image's Dockerfile
    Dockerfile(TagArgs),

    /// Print the path of the image's x11docker run configuration
    Configfile(TagArgs),

    /// Create a basic template for this tag if none exists
    Touch(TagArgs),

    /// Remove the image's build cache
    Clean(TagArgs),

    /// Relabel an image
    Move(TransferArgs),

    /// Duplicate an image
    Copy(TransferArgs),

    /// Remove the image completely
    Remove(RemoveArgs),

    /// Make an archive of an image
    Backup(BackupArgs),

    /// Restore an image from an archive
    Restore(RestoreArgs),

    /// Build an image if necessary
    Build(BuildArgs),

    /// Build an image if necessary and run it
    Run(BuildArgs),

    /// Show or initialize the settings file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// A single image tag
#[derive(Parser, Debug)]
pub struct TagArgs {
    /// Image tag, e.g. desktop/lxqt
    pub tag: String,
}

/// Arguments for the images command
#[derive(Parser, Debug)]
pub struct ImagesArgs {
    /// Output format
    #[arg(short, long, default_value = "plain")]
    pub format: OutputFormat,
}

/// Arguments for the stop command
#[derive(Parser, Debug)]
pub struct StopArgs {
    /// Container name or ID
    pub container: String,

    /// Seconds to wait before killing the container
    #[arg(short, long, default_value = "10")]
    pub time: u32,
}

/// Arguments for the move and copy commands
#[derive(Parser, Debug)]
pub struct TransferArgs {
    /// Tag of the image to take from
    pub source_tag: String,

    /// Tag of the image to create
    pub target_tag: String,

    /// Only transfer the build environment, not the build cache
    #[arg(long)]
    pub only_build: bool,
}

/// Arguments for the remove command
#[derive(Parser, Debug)]
pub struct RemoveArgs {
    /// Image tag
    pub tag: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the backup command
#[derive(Parser, Debug)]
pub struct BackupArgs {
    /// Image tag
    pub tag: String,

    /// Archive file to write (gzip-compressed tar)
    pub archive: PathBuf,
}

/// Arguments for the restore command
#[derive(Parser, Debug)]
pub struct RestoreArgs {
    /// Image tag
    pub tag: String,

    /// Archive file to read
    pub archive: PathBuf,

    /// Replace an existing image without asking
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the build and run commands
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Image tag
    pub tag: String,

    /// Always build, bypassing docker's layer cache
    #[arg(short, long)]
    pub force: bool,

    /// Always build, keeping docker's layer cache
    #[arg(short, long)]
    pub suggest: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current settings
    Show,

    /// Show settings file path
    Path,

    /// Write default settings
    Init {
        /// Overwrite existing settings
        #[arg(short, long)]
        force: bool,
    },
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}

/// Output format for the images command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table with build state
    Table,
    /// JSON output
    Json,
    /// `tag : directory`, one per line
    Plain,
}
