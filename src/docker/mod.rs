//! External executors
//!
//! [`DockerExecutor`] shells out to docker and x11docker.

mod cli;
mod executor;
#[cfg(test)]
mod recording;

pub use cli::DockerExecutor;
pub use executor::Executor;
#[cfg(test)]
pub(crate) use recording::{Call, RecordingExecutor};

use crate::config::Settings;

/// Create the executor described by the settings
pub fn create_executor(settings: &Settings) -> Box<dyn Executor> {
    Box::new(DockerExecutor::new(settings.docker.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_executor_uses_docker_cli() {
        let executor = create_executor(&Settings::default());
        assert_eq!(executor.executor_name(), "Docker CLI");
    }
}
