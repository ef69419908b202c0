//! Registration of host interfaces with the local vrouter agent.

use crate::container::ContainerId;
use crate::error::PacknetError;
use crate::netns::command::CommandRunner;
use crate::network::InstanceMetadata;
use std::sync::Arc;
use tracing::info;

/// Default name of the vrouter control program
pub const DEFAULT_VROUTER_CTL: &str = "vrouter-ctl";

/// Client of the vrouter control program
pub struct VrouterAgent {
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl VrouterAgent {
    /// Agent driven through the control program `program`
    pub fn new(program: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    /// Tell the agent that `host_interface` carries the traffic of `metadata.nic_id`
    pub async fn register(
        &self,
        metadata: &InstanceMetadata,
        host_interface: &str,
        container: &ContainerId,
    ) -> Result<(), PacknetError> {
        let arguments: Vec<String> = [
            "--mac-address",
            metadata.mac_address.as_str(),
            "--vm",
            metadata.instance_id.as_str(),
            "--vmi",
            metadata.nic_id.as_str(),
            "--interface",
            host_interface,
            "add",
            container.short(),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        self.runner.run(&self.program, &arguments).await?;
        info!(container = %container, interface = host_interface, nic = %metadata.nic_id, "Registered interface with vrouter");
        Ok(())
    }
}
