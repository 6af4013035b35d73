//! Executor that records calls instead of running anything
//!
//! Useful for exercising the build-cache logic without a docker daemon.

use crate::docker::executor::Executor;
use crate::error::{DockError, DockResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// A single recorded executor call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Build {
        working_dir: PathBuf,
        flags: Vec<String>,
    },
    Run {
        working_dir: PathBuf,
        tag: String,
        flags: Vec<String>,
    },
    RemoveImage(String),
    Prune(String),
    ListContainers(String),
    StopContainer { container: String, timeout_secs: u32 },
}

/// Records every call; builds can be made to fail on demand
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<Call>>,
    fail_builds: Mutex<bool>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `build` calls fail with exit code 1
    pub fn fail_builds(&self, fail: bool) {
        *self.fail_builds.lock().unwrap_or_else(PoisonError::into_inner) = fail;
    }

    /// Snapshot of all calls so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `build` calls so far
    pub fn build_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Build { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn build(&self, working_dir: &Path, build_flags: &[String]) -> DockResult<()> {
        self.record(Call::Build {
            working_dir: working_dir.to_path_buf(),
            flags: build_flags.to_vec(),
        });

        if *self.fail_builds.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(DockError::ExecutionFailed {
                command: format!("docker build . {}", build_flags.join(" ")),
                code: 1,
            });
        }
        Ok(())
    }

    async fn run(&self, working_dir: &Path, tag: &str, run_flags: &[String]) -> DockResult<()> {
        self.record(Call::Run {
            working_dir: working_dir.to_path_buf(),
            tag: tag.to_string(),
            flags: run_flags.to_vec(),
        });
        Ok(())
    }

    async fn remove_image(&self, tag: &str) -> DockResult<()> {
        self.record(Call::RemoveImage(tag.to_string()));
        Ok(())
    }

    async fn prune(&self, label: &str) -> DockResult<()> {
        self.record(Call::Prune(label.to_string()));
        Ok(())
    }

    async fn list_containers(&self, label: &str) -> DockResult<()> {
        self.record(Call::ListContainers(label.to_string()));
        Ok(())
    }

    async fn stop_container(&self, container: &str, timeout_secs: u32) -> DockResult<()> {
        self.record(Call::StopContainer {
            container: container.to_string(),
            timeout_secs,
        });
        Ok(())
    }

    fn executor_name(&self) -> &'static str {
        "Recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_in_order() {
        let exec = RecordingExecutor::new();
        exec.prune("label").await.unwrap();
        exec.stop_container("abc", 5).await.unwrap();

        assert_eq!(
            exec.calls(),
            vec![
                Call::Prune("label".to_string()),
                Call::StopContainer {
                    container: "abc".to_string(),
                    timeout_secs: 5
                }
            ]
        );
    }

    #[tokio::test]
    async fn failing_builds_are_still_recorded() {
        let exec = RecordingExecutor::new();
        exec.fail_builds(true);

        let err = exec.build(Path::new("/tmp"), &[]).await.unwrap_err();
        assert!(err.is_execution_failure());
        assert_eq!(exec.build_count(), 1);
    }
}
