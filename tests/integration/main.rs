//! Integration tests for dock

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// dock with an isolated repository and settings file
    fn dock(home: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("dock");
        cmd.env_remove("DOCK_DESKTOP_X11_HOME")
            .arg("--repo")
            .arg(home.path().join("repo"))
            .arg("--config")
            .arg(home.path().join("config.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("dock")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Change-detected builds and lifecycle management for x11docker images",
            ));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("dock")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("dock"));
    }

    #[test]
    fn images_empty() {
        let home = TempDir::new().unwrap();
        dock(&home)
            .arg("images")
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn touch_then_list() {
        let home = TempDir::new().unwrap();
        dock(&home).args(["touch", "desktop/lxqt"]).assert().success();

        let dir = home.path().join("repo").join("images").join("desktop#lxqt");
        assert!(dir.join("build").join("Dockerfile").is_file());
        assert!(dir.join("build").join("image_config.json").is_file());

        dock(&home)
            .arg("images")
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "desktop/lxqt : {}",
                dir.display()
            )));

        dock(&home)
            .args(["images", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"state\": \"touched\""));
    }

    #[test]
    fn path_commands() {
        let home = TempDir::new().unwrap();
        let dir = home.path().join("repo").join("images").join("app");

        dock(&home)
            .arg("repository")
            .assert()
            .success()
            .stdout(predicate::str::contains(home.path().join("repo").display().to_string()));

        dock(&home)
            .args(["dockerfile", "app"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                dir.join("build").join("Dockerfile").display().to_string(),
            ));

        dock(&home)
            .args(["configfile", "app"])
            .assert()
            .success()
            .stdout(predicate::str::contains("image_config.json"));
    }

    #[test]
    fn invalid_tag_is_rejected() {
        let home = TempDir::new().unwrap();
        dock(&home)
            .args(["touch", "bad#tag"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid tag"));
    }

    #[test]
    fn build_missing_image() {
        let home = TempDir::new().unwrap();
        dock(&home)
            .args(["build", "ghost"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Image not found"));
    }

    #[test]
    fn clean_drops_cache() {
        let home = TempDir::new().unwrap();
        dock(&home).args(["touch", "app"]).assert().success();
        let cache = home.path().join("repo/images/app/.build_cache");
        std::fs::create_dir_all(&cache).unwrap();

        dock(&home).args(["clean", "app"]).assert().success();
        assert!(!cache.exists());
    }

    #[test]
    fn backup_and_restore_under_new_tag() {
        let home = TempDir::new().unwrap();
        let archive = home.path().join("app.tar.gz");
        dock(&home).args(["touch", "app"]).assert().success();

        dock(&home)
            .arg("backup")
            .arg("app")
            .arg(&archive)
            .assert()
            .success();
        assert!(archive.is_file());

        dock(&home)
            .arg("restore")
            .arg("copy/of/app")
            .arg(&archive)
            .assert()
            .success();
        assert!(home
            .path()
            .join("repo/images/copy#of#app/build/Dockerfile")
            .is_file());
    }

    #[test]
    fn restore_missing_archive() {
        let home = TempDir::new().unwrap();
        dock(&home)
            .args(["restore", "app", "/nonexistent/app.tar.gz"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Path not found"));
    }

    #[test]
    fn config_path_and_init() {
        let home = TempDir::new().unwrap();
        let path = home.path().join("config.toml");

        dock(&home)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains(path.display().to_string()));

        dock(&home).args(["config", "init"]).assert().success();
        assert!(path.is_file());

        dock(&home)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[docker]"));
    }

    #[test]
    fn completions_generate() {
        cargo_bin_cmd!("dock")
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("dock"));
    }
}

mod workflow_tests {
    use async_trait::async_trait;
    use dock::cli::args::{RestoreArgs, TransferArgs};
    use dock::cli::commands;
    use dock::docker::Executor;
    use dock::{BuildOptions, BuildOutcome, DockError, DockResult, Repository};
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Build { working_dir: PathBuf, flags: Vec<String> },
        Run(String),
        RemoveImage(String),
        Other,
    }

    /// Executor that only remembers what it was asked to do
    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingExecutor {
        fn new() -> Self {
            Self::default()
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn build_count(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Build { .. }))
                .count()
        }

        fn record(&self, call: Call) -> DockResult<()> {
            self.calls.lock().unwrap().push(call);
            Ok(())
        }
    }

    #[async_trait]
    impl Executor for RecordingExecutor {
        async fn build(&self, working_dir: &Path, build_flags: &[String]) -> DockResult<()> {
            self.record(Call::Build {
                working_dir: working_dir.to_path_buf(),
                flags: build_flags.to_vec(),
            })
        }

        async fn run(&self, _working_dir: &Path, tag: &str, _run_flags: &[String]) -> DockResult<()> {
            self.record(Call::Run(tag.to_string()))
        }

        async fn remove_image(&self, tag: &str) -> DockResult<()> {
            self.record(Call::RemoveImage(tag.to_string()))
        }

        async fn prune(&self, _label: &str) -> DockResult<()> {
            self.record(Call::Other)
        }

        async fn list_containers(&self, _label: &str) -> DockResult<()> {
            self.record(Call::Other)
        }

        async fn stop_container(&self, _container: &str, _timeout_secs: u32) -> DockResult<()> {
            self.record(Call::Other)
        }

        fn executor_name(&self) -> &'static str {
            "recording"
        }
    }

    fn restore_args(tag: &str, archive: &Path) -> RestoreArgs {
        RestoreArgs {
            tag: tag.to_string(),
            archive: archive.to_path_buf(),
            force: true,
        }
    }

    fn transfer(source: &str, target: &str, only_build: bool) -> TransferArgs {
        TransferArgs {
            source_tag: source.to_string(),
            target_tag: target.to_string(),
            only_build,
        }
    }

    fn built_repository(tag: &str) -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::open(Some(dir.path())).unwrap();
        let image = repo.get(tag).unwrap();
        image.touch().unwrap();
        image.cache_env().touch().unwrap();
        (dir, repo)
    }

    #[tokio::test]
    async fn edit_triggers_exactly_one_build() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::open(Some(dir.path())).unwrap();
        let executor = RecordingExecutor::new();
        let image = repo.get("app").unwrap();
        image.touch().unwrap();

        let first = image.build(&executor, BuildOptions::default()).await.unwrap();
        let second = image.build(&executor, BuildOptions::default()).await.unwrap();
        assert_eq!((first, second), (BuildOutcome::Built, BuildOutcome::UpToDate));

        fs::write(image.build_env().dockerfile(), "FROM alpine\n").unwrap();
        let third = image.build(&executor, BuildOptions::default()).await.unwrap();
        assert_eq!(third, BuildOutcome::Built);
        assert_eq!(executor.build_count(), 2);
    }

    #[tokio::test]
    async fn copy_builds_target_and_keeps_source() {
        let (_dir, repo) = built_repository("app/v1");
        let executor = RecordingExecutor::new();

        commands::copy_image(transfer("app/v1", "app/v2", false), &repo, &executor)
            .await
            .unwrap();

        let source = repo.get("app/v1").unwrap();
        let target = repo.get("app/v2").unwrap();
        assert!(source.exists());
        assert!(target.exists());
        assert!(!target.needs_build());

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            Call::Build { working_dir, flags } => {
                assert_eq!(working_dir, target.build_env().directory());
                assert!(flags.contains(&"--tag=app/v2".to_string()));
                assert!(!flags.contains(&"--no-cache".to_string()));
            }
            other => panic!("expected a build, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn move_builds_target_and_removes_source() {
        let (_dir, repo) = built_repository("app/v1");
        let executor = RecordingExecutor::new();

        commands::move_image(transfer("app/v1", "app/v2", false), &repo, &executor)
            .await
            .unwrap();

        assert!(!repo.contains("app/v1"));
        assert!(repo.contains("app/v2"));
        assert_eq!(executor.build_count(), 1);
        assert!(executor
            .calls()
            .contains(&Call::RemoveImage("app/v1".to_string())));
    }

    #[tokio::test]
    async fn transfer_refuses_existing_target() {
        let (_dir, repo) = built_repository("app/v1");
        repo.get("app/v2").unwrap().touch().unwrap();
        let executor = RecordingExecutor::new();

        let result = commands::copy_image(transfer("app/v1", "app/v2", false), &repo, &executor).await;
        assert!(matches!(result, Err(DockError::ImageExists(_))));

        let result = commands::move_image(transfer("app/v1", "app/v1", false), &repo, &executor).await;
        assert!(matches!(result, Err(DockError::User(_))));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn copy_only_build_replaces_build_environment() {
        let (_dir, repo) = built_repository("app/v1");
        let source = repo.get("app/v1").unwrap();
        fs::write(source.build_env().dockerfile(), "FROM debian\n").unwrap();
        let target = repo.get("app/v2").unwrap();
        target.touch().unwrap();
        let executor = RecordingExecutor::new();

        commands::copy_image(transfer("app/v1", "app/v2", true), &repo, &executor)
            .await
            .unwrap();

        assert_eq!(
            fs::read_to_string(target.build_env().dockerfile()).unwrap(),
            "FROM debian\n"
        );
        assert!(!target.needs_build());
    }

    #[tokio::test]
    async fn copy_of_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::open(Some(dir.path())).unwrap();
        let executor = RecordingExecutor::new();

        let result = commands::copy_image(transfer("ghost", "app", false), &repo, &executor).await;
        assert!(matches!(result, Err(DockError::ImageNotFound(_))));
    }

    #[tokio::test]
    async fn backup_restore_preserves_build_state() {
        let (dir, repo) = built_repository("app");
        let archive = dir.path().join("app.tar.gz");
        let image = repo.get("app").unwrap();

        image.backup(&archive).unwrap();
        let executor = RecordingExecutor::new();
        image.remove(&executor).await.unwrap();
        assert!(!image.exists());

        image.restore(&archive).unwrap();
        assert!(image.exists());
        assert!(!image.needs_build());
        assert!(matches!(image.restore(&archive), Err(DockError::ImageExists(_))));
    }

    #[tokio::test]
    async fn corrupt_archive_keeps_existing_image() {
        let (dir, repo) = built_repository("app");
        let archive = dir.path().join("broken.tar.gz");
        fs::write(&archive, "not a gzip stream").unwrap();
        let executor = RecordingExecutor::new();

        let result = commands::restore(restore_args("app", &archive), &repo, &executor).await;

        assert!(matches!(result, Err(DockError::Io { .. })));
        assert!(executor.calls().is_empty());
        let image = repo.get("app").unwrap();
        assert!(image.build_env().dockerfile().is_file());
        assert!(!image.needs_build());
    }

    #[tokio::test]
    async fn corrupt_archive_leaves_new_tag_absent() {
        let (dir, repo) = built_repository("app");
        let broken = dir.path().join("broken.tar.gz");
        fs::write(&broken, "not a gzip stream").unwrap();
        let executor = RecordingExecutor::new();

        let result = commands::restore(restore_args("fresh", &broken), &repo, &executor).await;
        assert!(result.is_err());
        assert!(!repo.contains("fresh"));
        let tags: Vec<String> = repo
            .iter()
            .unwrap()
            .map(|image| image.unwrap().tag().to_string())
            .collect();
        assert_eq!(tags, ["app"]);

        let archive = dir.path().join("app.tar.gz");
        repo.get("app").unwrap().backup(&archive).unwrap();
        commands::restore(restore_args("fresh", &archive), &repo, &executor)
            .await
            .unwrap();
        assert!(repo.contains("fresh"));
    }

    #[tokio::test]
    async fn forced_restore_replaces_existing_image() {
        let (dir, repo) = built_repository("app");
        let image = repo.get("app").unwrap();
        let archive = dir.path().join("app.tar.gz");
        image.backup(&archive).unwrap();
        fs::write(image.build_env().dockerfile(), "FROM alpine\n").unwrap();
        let executor = RecordingExecutor::new();

        commands::restore(restore_args("app", &archive), &repo, &executor)
            .await
            .unwrap();

        assert_eq!(executor.calls(), [Call::RemoveImage("app".to_string())]);
        assert_eq!(
            fs::read_to_string(image.build_env().dockerfile()).unwrap(),
            "FROM x11docker/lxqt"
        );
        assert!(!image.needs_build());
    }
}
