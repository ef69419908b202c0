//! Attachment pipeline: network, instance, interface, address.

use super::allocator::{AddressAllocator, ContrailAddressAllocator};
use super::instance::InstanceManager;
use super::{DEFAULT_DOMAIN, InstanceMetadata, locate_or_create_network, require};
use crate::error::{PacknetError, StepContext};
use crate::lock::KeyedLock;
use contrail_client::{
    ContrailClientTrait, ContrailResource, FloatingIp, InstanceIp, ResourceKind, VirtualNetwork, split_fq_name,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Orchestrates the controller resources of container attachments
///
/// Builds and releases for the same `(tenant, container)` pair are
/// serialized within this manager; different pairs run concurrently.
pub struct NetworkManager {
    client: Arc<dyn ContrailClientTrait>,
    instances: InstanceManager,
    private_subnet: String,
    locks: KeyedLock<(String, String)>,
}

impl NetworkManager {
    /// # Arguments
    /// * `client` - controller client
    /// * `allocator` - source of instance addresses
    /// * `private_subnet` - subnet of tenant networks created here
    pub fn new(
        client: Arc<dyn ContrailClientTrait>,
        allocator: Arc<dyn AddressAllocator>,
        private_subnet: impl Into<String>,
    ) -> Self {
        Self {
            instances: InstanceManager::new(Arc::clone(&client), allocator),
            client,
            private_subnet: private_subnet.into(),
            locks: KeyedLock::new(),
        }
    }

    /// Manager whose addresses come from the controller's allocation network
    pub fn with_contrail_allocator(client: Arc<dyn ContrailClientTrait>, private_subnet: impl Into<String>) -> Self {
        let private_subnet = private_subnet.into();
        let allocator = Arc::new(ContrailAddressAllocator::new(Arc::clone(&client), private_subnet.clone()));
        Self::new(client, allocator, private_subnet)
    }

    /// Per-container resource manager used by `build` and `release`
    pub fn instances(&self) -> &InstanceManager {
        &self.instances
    }

    /// Locate or create the network `domain:tenant:name`
    pub async fn locate_network(&self, tenant: &str, name: &str) -> Result<VirtualNetwork, PacknetError> {
        let fq_name = vec![DEFAULT_DOMAIN.to_string(), tenant.to_string(), name.to_string()];
        locate_or_create_network(self.client.as_ref(), &fq_name, &self.private_subnet).await
    }

    /// Provision everything `container` needs on `network_name` and resolve its attachment
    ///
    /// Safe to re-run after a partial failure: existing resources are
    /// re-located and only the missing ones are created.
    pub async fn build(
        &self,
        tenant: &str,
        network_name: &str,
        container: &str,
    ) -> Result<InstanceMetadata, PacknetError> {
        let _guard = self.locks.lock((tenant.to_string(), container.to_string())).await;
        let name = |resource: &str| format!("{}:{}:{}", DEFAULT_DOMAIN, tenant, resource);

        let network = self
            .locate_network(tenant, network_name)
            .await
            .step(ResourceKind::VirtualNetwork, &name(network_name))?;
        let instance = self
            .instances
            .locate_instance(tenant, container)
            .await
            .step(ResourceKind::VirtualMachine, &name(container))?;
        let nic = self
            .instances
            .locate_interface(Some(&network), &instance)
            .await
            .step(ResourceKind::VirtualMachineInterface, &name(container))?;
        let ip = self
            .instances
            .locate_instance_ip(&network, &nic)
            .await
            .step(ResourceKind::InstanceIp, &format!("{}_{}", tenant, container))?;
        let gateway = self
            .instances
            .locate_instance_gateway(&network)
            .step(ResourceKind::VirtualNetwork, &network.fq_name_str())?;
        let mac_address = self
            .instances
            .locate_mac_address(&nic.fq_name)
            .await
            .step(ResourceKind::VirtualMachineInterface, &nic.fq_name_str())?;

        let ip_address = ip.instance_ip_address.clone().ok_or_else(|| PacknetError::MissingAttribute {
            kind: InstanceIp::KIND,
            name: ip.fq_name_str(),
            attribute: "address",
        })?;

        let metadata = InstanceMetadata {
            instance_id: instance.uuid,
            nic_id: nic.uuid,
            mac_address,
            ip_address,
            gateway,
        };
        info!(
            tenant,
            container,
            ip = %metadata.ip_address,
            mac = %metadata.mac_address,
            "Resolved attachment"
        );
        Ok(metadata)
    }

    /// Delete the controller resources of `container`
    ///
    /// Releases the instance-ip and its allocation, the interface (floating
    /// IPs first) and the instance. Missing resources are skipped; the
    /// tenant network is shared and stays.
    pub async fn release(&self, tenant: &str, container: &str) -> Result<(), PacknetError> {
        let _guard = self.locks.lock((tenant.to_string(), container.to_string())).await;
        let name = format!("{}:{}:{}", DEFAULT_DOMAIN, tenant, container);

        let nic = self
            .instances
            .lookup_interface(tenant, container)
            .await
            .step(ResourceKind::VirtualMachineInterface, &name)?;
        match nic {
            Some(nic) => {
                self.instances
                    .release_instance_ip(tenant, nic.name(), &nic.uuid)
                    .await
                    .step(ResourceKind::InstanceIp, &format!("{}_{}", tenant, nic.name()))?;
                self.instances
                    .release_interface(tenant, container)
                    .await
                    .step(ResourceKind::VirtualMachineInterface, &name)?;
            }
            None => debug!("No interface for {}, skipping address release", name),
        }

        self.instances
            .release_instance(tenant, container)
            .await
            .step(ResourceKind::VirtualMachine, &name)?;
        info!(tenant, container, "Released attachment");
        Ok(())
    }

    /// Attach the floating IP named `floating_ip` to the interface of `container`
    pub async fn attach_floating_ip(&self, tenant: &str, container: &str, floating_ip: &str) -> Result<(), PacknetError> {
        let mut fip: FloatingIp = require(self.client.as_ref(), &split_fq_name(floating_ip))
            .await
            .step(ResourceKind::FloatingIp, floating_ip)?;
        let project = format!("{}:{}", DEFAULT_DOMAIN, tenant);
        self.instances
            .attach_floating_ip(container, &project, &mut fip)
            .await
            .step(ResourceKind::FloatingIp, floating_ip)
    }
}
