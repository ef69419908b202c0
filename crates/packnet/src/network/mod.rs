//! Controller-side provisioning of a container attachment
//!
//! Every resource is located by a deterministic fully-qualified name and
//! created on a miss. Creates are always followed by a read by uuid, since the
//! controller only echoes identity on create and fills in subnets, MACs and
//! addresses on the stored object.

pub mod allocator;
pub mod instance;
pub mod manager;
#[cfg(test)]
mod network_test;

use crate::error::PacknetError;
use contrail_client::{
    ContrailClientTrait, ContrailResource, Project, VirtualNetwork, create_network_with_subnet, resource,
};
use serde::Serialize;
use tracing::{debug, info};

pub use allocator::{AddressAllocator, ContrailAddressAllocator};
pub use instance::InstanceManager;
pub use manager::NetworkManager;

/// Domain every tenant project lives in
pub const DEFAULT_DOMAIN: &str = "default-domain";

/// Network that addresses are drawn from before being bound in a tenant network
pub const ADDRESS_ALLOCATION_NETWORK: &str = "default-domain:default-project:addr-alloc";

/// Resolved attachment of one container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceMetadata {
    /// Virtual machine uuid
    pub instance_id: String,
    /// Interface uuid
    pub nic_id: String,
    /// First MAC address of the interface
    pub mac_address: String,
    /// Address bound in the tenant network
    pub ip_address: String,
    /// Default gateway of the tenant subnet
    pub gateway: String,
}

/// Read back an object the controller has just created
async fn confirm<T: ContrailResource>(client: &dyn ContrailClientTrait, uuid: &str) -> Result<T, PacknetError> {
    resource::find_by_uuid(client, uuid)
        .await
        .map_err(|source| PacknetError::ReadAfterWriteInconsistent {
            kind: T::KIND,
            uuid: uuid.to_string(),
            source,
        })
}

/// Create `object` and return the controller's view of it
///
/// # Returns
/// * `Ok(T)` - the object as read back by uuid
/// * `Err(PacknetError::CreateFailed)` - the create was rejected
/// * `Err(PacknetError::ReadAfterWriteInconsistent)` - the created object could not be read
pub async fn create_and_confirm<T: ContrailResource>(
    client: &dyn ContrailClientTrait,
    mut object: T,
) -> Result<T, PacknetError> {
    resource::create(client, &mut object)
        .await
        .map_err(|source| PacknetError::CreateFailed {
            kind: T::KIND,
            name: object.fq_name_str(),
            source,
        })?;
    info!("Created {} {} ({})", T::KIND, object.fq_name_str(), object.uuid());
    confirm(client, object.uuid()).await
}

/// Find a required object by name; absence is `PacknetError::NotFound`
pub async fn require<T: ContrailResource>(
    client: &dyn ContrailClientTrait,
    fq_name: &[String],
) -> Result<T, PacknetError> {
    resource::find_optional(client, fq_name)
        .await?
        .ok_or_else(|| PacknetError::NotFound {
            kind: T::KIND,
            name: fq_name.join(":"),
        })
}

/// Locate a network by name, creating it with a single `cidr` subnet on a miss
///
/// The owning project is the FQN minus its last segment. A create that
/// conflicts with a concurrent creator re-locates the winner's network.
pub async fn locate_or_create_network(
    client: &dyn ContrailClientTrait,
    fq_name: &[String],
    cidr: &str,
) -> Result<VirtualNetwork, PacknetError> {
    if let Some(network) = resource::find_optional::<VirtualNetwork>(client, fq_name).await? {
        debug!("Located network {} ({})", network.fq_name_str(), network.uuid);
        return Ok(network);
    }

    let Some((name, project_fq_name)) = fq_name.split_last().filter(|(_, project)| !project.is_empty()) else {
        return Err(PacknetError::InvalidConfig(format!(
            "network name {:?} has no project",
            fq_name.join(":")
        )));
    };
    let project: Project = require(client, project_fq_name).await?;

    let uuid = match create_network_with_subnet(client, &project.uuid, name, cidr).await {
        Ok(uuid) => uuid,
        Err(e) if e.is_conflict() => {
            debug!("Network {} created concurrently, re-locating", fq_name.join(":"));
            return require(client, fq_name).await;
        }
        Err(source) => {
            return Err(PacknetError::CreateFailed {
                kind: VirtualNetwork::KIND,
                name: fq_name.join(":"),
                source,
            });
        }
    };
    info!("Created network {} with subnet {} ({})", fq_name.join(":"), cidr, uuid);
    confirm(client, &uuid).await
}
