//! Namespace wiring
//!
//! Materializes a resolved attachment as a veth pair: the host end stays in
//! the root namespace as `veth-<short id>`, the peer moves into the
//! container's network namespace as `veth0` with the allocated MAC and a
//! point-to-point address towards the gateway.

pub mod command;
pub mod runtime;
#[cfg(test)]
mod netns_test;

use crate::container::ContainerId;
use crate::error::PacknetError;
use command::{CommandRunner, args};
use runtime::ContainerRuntime;
use std::sync::Arc;
use tracing::{debug, info};

/// Interface name inside the container
pub const CONTAINER_INTERFACE: &str = "veth0";

/// Host-side device name for a container
pub fn host_interface_name(container: &ContainerId) -> String {
    format!("veth-{}", container.short())
}

/// Peer name used while the device still lives in the host namespace
pub fn peer_interface_name(container: &ContainerId) -> String {
    format!("vetp-{}", container.short())
}

/// Creates and removes the veth pair of a container
pub struct NamespaceWirer {
    runner: Arc<dyn CommandRunner>,
    runtime: Arc<dyn ContainerRuntime>,
}

impl NamespaceWirer {
    /// Wirer running `ip`/`nsenter` through `runner`, resolving pids through `runtime`
    pub fn new(runner: Arc<dyn CommandRunner>, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runner, runtime }
    }

    async fn ip(&self, arguments: Vec<String>) -> Result<(), PacknetError> {
        self.runner.run("ip", &arguments).await?;
        Ok(())
    }

    async fn ip_in_netns(&self, pid: u32, arguments: &[&str]) -> Result<(), PacknetError> {
        let pid = pid.to_string();
        let mut full = args(["-n", "-t", pid.as_str(), "ip"]);
        full.extend(arguments.iter().map(|s| s.to_string()));
        self.runner.run("nsenter", &full).await?;
        Ok(())
    }

    /// Wire `container` into its namespace and return the host-side device name
    ///
    /// Fails on the first command that does not succeed; nothing created up
    /// to that point is cleaned up, [`NamespaceWirer::delete_interface`] does.
    pub async fn create_interface(
        &self,
        container: &ContainerId,
        mac: &str,
        ip: &str,
        gateway: &str,
    ) -> Result<String, PacknetError> {
        let host = host_interface_name(container);
        let peer = peer_interface_name(container);
        debug!(container = %container, host = %host, peer = %peer, "Creating veth pair");

        self.ip(args(["link", "add", host.as_str(), "type", "veth", "peer", "name", peer.as_str()]))
            .await?;

        let pid = self.runtime.pid(container).await?;
        let pid_arg = pid.to_string();
        self.ip(args(["link", "set", peer.as_str(), "netns", pid_arg.as_str()]))
            .await?;

        self.ip_in_netns(pid, &["link", "set", "dev", peer.as_str(), "name", CONTAINER_INTERFACE, "address", mac])
            .await?;
        self.ip(args(["link", "set", host.as_str(), "up"])).await?;
        self.ip_in_netns(pid, &["link", "set", CONTAINER_INTERFACE, "up"]).await?;

        let address = format!("{}/32", ip);
        self.ip_in_netns(pid, &["addr", "add", address.as_str(), "peer", gateway, "dev", CONTAINER_INTERFACE])
            .await?;
        self.ip_in_netns(pid, &["route", "add", "default", "via", gateway]).await?;

        info!(container = %container, host = %host, ip, gateway, mac, "Wired container namespace");
        Ok(host)
    }

    /// Remove the veth pair of `container`; absent devices are not an error
    pub async fn delete_interface(&self, container: &ContainerId) -> Result<(), PacknetError> {
        let host = host_interface_name(container);
        let exists = self
            .runner
            .output("ip", &args(["link", "show", host.as_str()]))
            .await?
            .success;
        if !exists {
            debug!(host = %host, "Host interface already absent");
            return Ok(());
        }

        // Deleting one end removes the pair
        self.ip(args(["link", "delete", host.as_str()])).await?;
        info!(container = %container, host = %host, "Deleted veth pair");
        Ok(())
    }
}
