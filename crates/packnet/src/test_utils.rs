//! Test utilities for unit testing the attach pipeline
//!
//! This module provides command and runtime doubles plus helpers for setting
//! up a mock controller.

use crate::container::ContainerId;
use crate::error::PacknetError;
use crate::netns::command::{CommandOutput, CommandRunner, command_line};
use crate::netns::runtime::ContainerRuntime;
use contrail_client::MockContrailClient;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// CommandRunner that records every command line and answers from canned
/// responses keyed by command-line prefix; unmatched commands succeed silently
#[derive(Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<String>>,
    responses: Mutex<HashMap<String, CommandOutput>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed with `stdout` for commands starting with `prefix`
    pub fn respond(&self, prefix: &str, stdout: &str) {
        self.responses.lock().unwrap().insert(
            prefix.to_string(),
            CommandOutput {
                success: true,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
    }

    /// Exit non-zero with `stderr` for commands starting with `prefix`
    pub fn fail(&self, prefix: &str, stderr: &str) {
        self.responses.lock().unwrap().insert(
            prefix.to_string(),
            CommandOutput {
                success: false,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        );
    }

    /// Command lines run so far, in order
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CommandRunner for RecordingRunner {
    async fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput, PacknetError> {
        let line = command_line(program, args);
        self.commands.lock().unwrap().push(line.clone());
        let responses = self.responses.lock().unwrap();
        // Longest matching prefix wins
        let output = responses
            .iter()
            .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, output)| output.clone())
            .unwrap_or(CommandOutput {
                success: true,
                ..Default::default()
            });
        Ok(output)
    }
}

/// ContainerRuntime that resolves every container to one pid
pub struct StaticRuntime(pub u32);

#[async_trait::async_trait]
impl ContainerRuntime for StaticRuntime {
    async fn pid(&self, container: &ContainerId) -> Result<u32, PacknetError> {
        if self.0 == 0 {
            return Err(PacknetError::ContainerNotRunning(container.to_string()));
        }
        Ok(self.0)
    }
}

/// Mock controller with the `teemo` tenant project
pub fn create_test_controller() -> Arc<MockContrailClient> {
    let mock = MockContrailClient::new("http://test-contrail:8082");
    mock.add_project(&["default-domain", "teemo"]);
    Arc::new(mock)
}

/// Private subnet used by tests
pub const TEST_SUBNET: &str = "10.40.128.0/17";
