//! packnet
//!
//! Attaches a container to an OpenContrail virtual network:
//! - [`network`]: locate-or-create of the tenant network, virtual machine,
//!   interface and instance-ip in the controller, resolved into an
//!   [`InstanceMetadata`],
//! - [`netns`]: the veth pair that carries the attachment into the
//!   container's network namespace,
//! - [`vrouter`]: registration of the host-side device with the vrouter agent.

pub mod config;
pub mod container;
pub mod error;
pub mod lock;
pub mod netns;
pub mod network;
pub mod vrouter;
#[cfg(test)]
mod test_utils;

pub use config::{Action, Config};
pub use container::ContainerId;
pub use error::{PacknetError, StepContext};
pub use netns::NamespaceWirer;
pub use network::{AddressAllocator, ContrailAddressAllocator, InstanceManager, InstanceMetadata, NetworkManager};
pub use vrouter::VrouterAgent;
