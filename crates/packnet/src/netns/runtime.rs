//! Container runtime: container id to host process id.

use super::command::{CommandRunner, args};
use crate::container::ContainerId;
use crate::error::PacknetError;
use std::sync::Arc;
use tracing::debug;

/// Resolves a container to the pid of its init process
#[async_trait::async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn pid(&self, container: &ContainerId) -> Result<u32, PacknetError>;
}

/// Docker CLI backed runtime
pub struct DockerRuntime {
    docker: String,
    runner: Arc<dyn CommandRunner>,
}

impl DockerRuntime {
    /// # Arguments
    /// * `docker` - path or name of the docker binary
    /// * `runner` - executes `docker inspect`
    pub fn new(docker: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            docker: docker.into(),
            runner,
        }
    }
}

#[async_trait::async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn pid(&self, container: &ContainerId) -> Result<u32, PacknetError> {
        let output = self
            .runner
            .run(&self.docker, &args(["inspect", "--format", "{{.State.Pid}}", container.as_str()]))
            .await?;
        let raw = output.stdout.trim();
        let pid: u32 = raw.parse().map_err(|e| PacknetError::ExternalCommandFailed {
            command: format!("{} inspect {}", self.docker, container),
            message: format!("unexpected pid {:?}: {}", raw, e),
        })?;
        if pid == 0 {
            return Err(PacknetError::ContainerNotRunning(container.to_string()));
        }
        debug!(container = %container, pid, "Resolved container pid");
        Ok(pid)
    }
}
