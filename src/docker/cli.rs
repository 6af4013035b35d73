//! Executor backed by the docker and x11docker command line tools

use crate::config::schema::DockerSettings;
use crate::docker::executor::Executor;
use crate::error::{DockError, DockResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// What `docker image inspect` prints for an unknown image
const NO_SUCH_IMAGE: &str = "No such image";

/// Runs docker/x11docker in the foreground, optionally through sudo
pub struct DockerExecutor {
    settings: DockerSettings,
}

impl DockerExecutor {
    /// Create a new executor from settings
    pub fn new(settings: DockerSettings) -> Self {
        Self { settings }
    }

    /// Program and leading arguments for `program`, honoring `sudo`
    fn command_line(&self, program: &str, args: &[String]) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 2);
        if self.settings.sudo {
            argv.push("sudo".to_string());
        }
        argv.push(program.to_string());
        argv.extend(args.iter().cloned());
        argv
    }

    fn command(&self, program: &str, args: &[String]) -> (Command, String) {
        let argv = self.command_line(program, args);
        let shown = argv.join(" ");
        let mut command = Command::new(&argv[0]);
        command.args(&argv[1..]);
        (command, shown)
    }

    /// Execute a command with inherited stdio, failing on nonzero exit
    async fn exec_foreground(
        &self,
        program: &str,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> DockResult<()> {
        let (mut command, shown) = self.command(program, args);
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }

        debug!("Executing: {}", shown);

        let status = command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| DockError::command_failed(shown.clone(), e))?;

        if status.success() {
            Ok(())
        } else {
            Err(DockError::ExecutionFailed {
                command: shown,
                code: status.code().unwrap_or(-1),
            })
        }
    }

    /// Execute a command quietly and report whether it succeeded
    async fn exec_quiet(&self, program: &str, args: &[String]) -> DockResult<bool> {
        let (mut command, shown) = self.command(program, args);
        debug!("Probing: {}", shown);

        let status = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| DockError::command_failed(shown, e))?;

        Ok(status.success())
    }

    /// Start the docker service when systemd reports it inactive.
    ///
    /// Returns true if the service had to be started.
    async fn ensure_service(&self) -> DockResult<bool> {
        if !self.settings.ensure_service {
            return Ok(false);
        }

        let active = self
            .exec_quiet("systemctl", &args(&["is-active", "docker"]))
            .await
            .unwrap_or_else(|e| {
                warn!("Could not query docker service: {}", e);
                true
            });
        if active {
            return Ok(false);
        }

        info!("Starting docker service");
        self.exec_foreground("systemctl", &args(&["start", "docker"]), None)
            .await?;
        Ok(true)
    }

    async fn docker(&self, docker_args: &[String], working_dir: Option<&Path>) -> DockResult<()> {
        self.exec_foreground(&self.settings.docker_bin, docker_args, working_dir)
            .await
    }

    /// Check if an image exists locally.
    ///
    /// Only docker's "No such image" answer counts as absent; any other
    /// failure of the inspect call is reported.
    async fn image_exists(&self, tag: &str) -> DockResult<bool> {
        let (mut command, shown) =
            self.command(&self.settings.docker_bin, &args(&["image", "inspect", tag]));
        debug!("Probing: {}", shown);

        let output = command
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| DockError::command_failed(shown.clone(), e))?;
        if output.status.success() {
            return Ok(true);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains(NO_SUCH_IMAGE) {
            return Ok(false);
        }

        warn!("{} failed: {}", shown, stderr.trim());
        Err(DockError::ExecutionFailed {
            command: shown,
            code: output.status.code().unwrap_or(-1),
        })
    }
}

impl Default for DockerExecutor {
    fn default() -> Self {
        Self::new(DockerSettings::default())
    }
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn label_filter(label: &str) -> String {
    format!("label={}", label)
}

#[async_trait]
impl Executor for DockerExecutor {
    async fn build(&self, working_dir: &Path, build_flags: &[String]) -> DockResult<()> {
        self.ensure_service().await?;

        let mut docker_args = args(&["build", "."]);
        docker_args.extend(build_flags.iter().cloned());

        info!("Building in {}", working_dir.display());
        self.docker(&docker_args, Some(working_dir)).await
    }

    async fn run(&self, working_dir: &Path, tag: &str, run_flags: &[String]) -> DockResult<()> {
        self.ensure_service().await?;

        let mut x11_args: Vec<String> = run_flags.to_vec();
        x11_args.push("--".to_string());
        x11_args.push(tag.to_string());

        info!("Running {}", tag);
        self.exec_foreground(&self.settings.x11docker_bin, &x11_args, Some(working_dir))
            .await
    }

    async fn remove_image(&self, tag: &str) -> DockResult<()> {
        self.ensure_service().await?;

        if !self.image_exists(tag).await? {
            debug!("No docker image for {}, nothing to remove", tag);
            return Ok(());
        }

        info!("Removing docker image {}", tag);
        self.docker(&args(&["rmi", tag]), None).await
    }

    async fn prune(&self, label: &str) -> DockResult<()> {
        self.ensure_service().await?;

        let filter = label_filter(label);
        self.docker(&args(&["container", "prune", "--filter", &filter]), None)
            .await?;
        self.docker(&args(&["image", "prune", "--filter", &filter]), None)
            .await
    }

    async fn list_containers(&self, label: &str) -> DockResult<()> {
        self.ensure_service().await?;
        self.docker(&args(&["ps", "--filter", &label_filter(label)]), None)
            .await
    }

    async fn stop_container(&self, container: &str, timeout_secs: u32) -> DockResult<()> {
        self.ensure_service().await?;
        let time = timeout_secs.to_string();
        self.docker(&args(&["stop", "--time", &time, container]), None)
            .await
    }

    fn executor_name(&self) -> &'static str {
        "Docker CLI"
    }
}
