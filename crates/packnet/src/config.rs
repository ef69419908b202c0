//! Command-line configuration.
//!
//! Every flag can also be set through a `PACKNET_*` environment variable.

use crate::container::ContainerId;
use crate::error::PacknetError;
use clap::{ArgGroup, Parser};
use ipnetwork::Ipv4Network;
use std::time::Duration;

/// packnet - attach containers to OpenContrail virtual networks
#[derive(Parser, Debug, Clone)]
#[command(name = "packnet")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("action").required(true).args(["start", "stop"])))]
pub struct Config {
    /// Contrail API server host
    #[arg(long, env = "PACKNET_SERVER", default_value = "localhost")]
    pub server: String,

    /// Contrail API server port
    #[arg(long, env = "PACKNET_PORT", default_value_t = 8082)]
    pub port: u16,

    /// Tenant (project) owning the network
    #[arg(long, env = "PACKNET_TENANT", default_value = "teemo")]
    pub tenant: String,

    /// Name of the tenant network
    #[arg(long, env = "PACKNET_NETWORK", default_value = "default")]
    pub network: String,

    /// Subnet of networks created by packnet
    #[arg(long, env = "PACKNET_PRIVATE_SUBNET", default_value = "10.40.128.0/17")]
    pub private_subnet: String,

    /// Keystone token sent as X-Auth-Token
    #[arg(long, env = "PACKNET_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Timeout of each API request, in seconds
    #[arg(long, env = "PACKNET_REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout: u64,

    /// Timeout of each external command, in seconds
    #[arg(long, env = "PACKNET_COMMAND_TIMEOUT", default_value_t = 30)]
    pub command_timeout: u64,

    /// vrouter control program
    #[arg(long, env = "PACKNET_VROUTER_CTL", default_value = "vrouter-ctl")]
    pub vrouter_ctl: String,

    /// docker binary used to resolve container pids
    #[arg(long, env = "PACKNET_DOCKER", default_value = "docker")]
    pub docker: String,

    /// Floating IP to attach on start (`:`-separated FQN)
    #[arg(long, env = "PACKNET_FLOATING_IP")]
    pub floating_ip: Option<String>,

    /// Attach the container with this id
    #[arg(long, value_name = "CONTAINER_ID")]
    pub start: Option<String>,

    /// Detach the container with this id
    #[arg(long, value_name = "CONTAINER_ID")]
    pub stop: Option<String>,
}

/// What to do with the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start(ContainerId),
    Stop(ContainerId),
}

impl Config {
    /// Selected action and its validated container id
    pub fn action(&self) -> Result<Action, PacknetError> {
        match (&self.start, &self.stop) {
            (Some(id), None) => Ok(Action::Start(ContainerId::new(id.as_str())?)),
            (None, Some(id)) => Ok(Action::Stop(ContainerId::new(id.as_str())?)),
            _ => Err(PacknetError::InvalidConfig(
                "exactly one of --start or --stop is required".to_string(),
            )),
        }
    }

    /// Reject settings that would only fail later against the controller
    pub fn validate(&self) -> Result<(), PacknetError> {
        self.private_subnet
            .parse::<Ipv4Network>()
            .map_err(|e| PacknetError::InvalidConfig(format!("invalid private subnet {}: {}", self.private_subnet, e)))?;
        for (flag, value) in [("tenant", &self.tenant), ("network", &self.network)] {
            if value.trim().is_empty() {
                return Err(PacknetError::InvalidConfig(format!("{} must not be empty", flag)));
            }
            // `:` separates FQN segments
            if value.contains(':') {
                return Err(PacknetError::InvalidConfig(format!("{} {:?} must not contain ':'", flag, value)));
            }
        }
        if self.floating_ip.as_deref().is_some_and(|fip| fip.split(':').any(str::is_empty)) {
            return Err(PacknetError::InvalidConfig(format!(
                "invalid floating IP name {:?}",
                self.floating_ip.as_deref().unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Base URL of the Contrail API server
    pub fn api_url(&self) -> String {
        format!("http://{}:{}", self.server, self.port)
    }

    /// Timeout of each controller request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Timeout of each external command
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout)
    }
}
