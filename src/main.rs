//! dock - x11docker image workbench
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use dock::cli::commands;
use dock::cli::{Cli, Commands};
use dock::config::ConfigManager;
use dock::docker::create_executor;
use dock::error::DockResult;
use dock::repository::Repository;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, log_format: &str) {
    // 0 = warn, 1 = info, 2+ = debug
    let filter = match verbose {
        0 => EnvFilter::new("dock=warn"),
        1 => EnvFilter::new("dock=info"),
        _ => EnvFilter::new("dock=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    if log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run() -> DockResult<()> {
    let cli = Cli::parse();

    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let settings = manager.load().await?;

    init_logging(cli.verbose, &settings.general.log_format);
    debug!("Settings from {}", manager.path().display());

    // Commands that never touch the repository
    match cli.command {
        Commands::Config(args) => return commands::config(args, &settings, &manager).await,
        Commands::Completions(args) => return commands::completions(args),
        _ => {}
    }

    let repository = Repository::open(
        cli.repo
            .as_deref()
            .or(settings.repository.path.as_deref()),
    )?;
    let executor = create_executor(&settings);
    let executor = executor.as_ref();

    match cli.command {
        Commands::Config(_) | Commands::Completions(_) => unreachable!("handled above"),
        Commands::Images(args) => commands::images(args, &repository),
        Commands::Containers => commands::containers(executor).await,
        Commands::Stop(args) => commands::stop(args, executor).await,
        Commands::Prune => commands::prune(executor).await,
        Commands::Image(args) => commands::image(&args.tag, &repository),
        Commands::Repository => commands::repository(&repository),
        Commands::Dockerfile(args) => commands::dockerfile(&args.tag, &repository),
        Commands::Configfile(args) => commands::configfile(&args.tag, &repository),
        Commands::Touch(args) => commands::touch(args, &repository),
        Commands::Clean(args) => commands::clean(args, &repository),
        Commands::Move(args) => commands::move_image(args, &repository, executor).await,
        Commands::Copy(args) => commands::copy_image(args, &repository, executor).await,
        Commands::Remove(args) => commands::remove(args, &repository, executor).await,
        Commands::Backup(args) => commands::backup(args, &repository),
        Commands::Restore(args) => commands::restore(args, &repository, executor).await,
        Commands::Build(args) => commands::build(args, &repository, executor).await,
        Commands::Run(args) => commands::run(args, &repository, executor).await,
    }
}
