//! Per-container controller resources: virtual machine, interface, instance-ip.

use super::allocator::AddressAllocator;
use super::{DEFAULT_DOMAIN, create_and_confirm, require};
use crate::error::PacknetError;
use contrail_client::{
    ContrailClientTrait, ContrailError, ContrailResource, FloatingIp, InstanceIp, ResourceKind, VirtualMachine,
    VirtualMachineInterface, VirtualNetwork, resource, split_fq_name,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Locate-or-create and teardown of the resources owned by one container
pub struct InstanceManager {
    client: Arc<dyn ContrailClientTrait>,
    allocator: Arc<dyn AddressAllocator>,
}

fn tenant_fq_name(tenant: &str, name: &str) -> Vec<String> {
    vec![DEFAULT_DOMAIN.to_string(), tenant.to_string(), name.to_string()]
}

/// Name of the instance-ip binding an interface in its tenant network
fn instance_ip_name(tenant: &str, nic_name: &str) -> String {
    format!("{}_{}", tenant, nic_name)
}

/// Namespace segment of an object (`tenant` in `domain:tenant:name`)
fn namespace_of(fq_name: &[String]) -> Result<&str, PacknetError> {
    match fq_name {
        [.., namespace, _] => Ok(namespace.as_str()),
        _ => Err(PacknetError::InvalidConfig(format!(
            "{:?} has no namespace segment",
            fq_name.join(":")
        ))),
    }
}

/// Treat `NotFound` from a delete as already gone
fn ignore_not_found(result: Result<(), ContrailError>, kind: ResourceKind, name: &str) -> Result<(), PacknetError> {
    match result {
        Err(ContrailError::NotFound(_)) => {
            warn!("{} {} already deleted", kind, name);
            Ok(())
        }
        other => Ok(other?),
    }
}

impl InstanceManager {
    /// Create a manager over `client`, drawing addresses from `allocator`
    pub fn new(client: Arc<dyn ContrailClientTrait>, allocator: Arc<dyn AddressAllocator>) -> Self {
        Self { client, allocator }
    }

    fn client(&self) -> &dyn ContrailClientTrait {
        self.client.as_ref()
    }

    /// Locate or create the virtual machine `domain:tenant:name`
    pub async fn locate_instance(&self, tenant: &str, name: &str) -> Result<VirtualMachine, PacknetError> {
        let fq_name = tenant_fq_name(tenant, name);
        if let Some(instance) = resource::find_optional::<VirtualMachine>(self.client(), &fq_name).await? {
            debug!("Located instance {} ({})", instance.fq_name_str(), instance.uuid);
            return Ok(instance);
        }

        create_and_confirm(
            self.client(),
            VirtualMachine {
                fq_name,
                parent_type: Some("project".to_string()),
                ..Default::default()
            },
        )
        .await
    }

    /// Locate or create the interface of `instance`
    ///
    /// The interface is named after the instance (`domain:namespace:name`),
    /// independently of the network; `network` is only referenced on create.
    pub async fn locate_interface(
        &self,
        network: Option<&VirtualNetwork>,
        instance: &VirtualMachine,
    ) -> Result<VirtualMachineInterface, PacknetError> {
        let namespace = namespace_of(&instance.fq_name)?;
        let fq_name = tenant_fq_name(namespace, instance.name());
        if let Some(nic) = resource::find_optional::<VirtualMachineInterface>(self.client(), &fq_name).await? {
            debug!("Located interface {} ({})", nic.fq_name_str(), nic.uuid);
            return Ok(nic);
        }

        create_and_confirm(
            self.client(),
            VirtualMachineInterface {
                fq_name,
                parent_type: Some("project".to_string()),
                virtual_machine_refs: vec![instance.to_reference()],
                virtual_network_refs: network.map(|n| vec![n.to_reference()]).unwrap_or_default(),
                ..Default::default()
            },
        )
        .await
    }

    /// Interface `domain:tenant:name`, if it exists
    pub async fn lookup_interface(
        &self,
        tenant: &str,
        name: &str,
    ) -> Result<Option<VirtualMachineInterface>, PacknetError> {
        Ok(resource::find_optional(self.client(), &tenant_fq_name(tenant, name)).await?)
    }

    /// Locate or create the instance-ip binding `nic` into `network`
    ///
    /// The address comes from the allocator, keyed by the interface uuid.
    pub async fn locate_instance_ip(
        &self,
        network: &VirtualNetwork,
        nic: &VirtualMachineInterface,
    ) -> Result<InstanceIp, PacknetError> {
        let name = instance_ip_name(namespace_of(&nic.fq_name)?, nic.name());
        let fq_name = vec![name.clone()];
        if let Some(ip) = resource::find_optional::<InstanceIp>(self.client(), &fq_name).await? {
            debug!("Located instance-ip {} ({:?})", name, ip.instance_ip_address);
            return Ok(ip);
        }

        let address = self.allocator.locate_ip_address(&nic.uuid).await?;
        create_and_confirm(
            self.client(),
            InstanceIp {
                fq_name,
                instance_ip_address: Some(address),
                virtual_network_refs: vec![network.to_reference()],
                virtual_machine_interface_refs: vec![nic.to_reference()],
                ..Default::default()
            },
        )
        .await
    }

    /// Default gateway of the network's first subnet
    pub fn locate_instance_gateway(&self, network: &VirtualNetwork) -> Result<String, PacknetError> {
        let missing = |attribute| PacknetError::MissingAttribute {
            kind: VirtualNetwork::KIND,
            name: network.fq_name_str(),
            attribute,
        };
        let ipam_ref = network.network_ipam_refs.first().ok_or_else(|| missing("subnet association"))?;
        let subnet = ipam_ref.attr.ipam_subnets.first().ok_or_else(|| missing("subnet"))?;
        subnet.default_gateway.clone().ok_or_else(|| missing("default gateway"))
    }

    /// First MAC address of the interface named `fq_name`
    pub async fn locate_mac_address(&self, fq_name: &[String]) -> Result<String, PacknetError> {
        let nic: VirtualMachineInterface = require(self.client(), fq_name).await?;
        nic.mac_addresses()
            .first()
            .cloned()
            .ok_or_else(|| PacknetError::MissingAttribute {
                kind: VirtualMachineInterface::KIND,
                name: fq_name.join(":"),
                attribute: "MAC address",
            })
    }

    /// Delete the interface `domain:tenant:name` and the floating IPs pointing at it
    pub async fn release_interface(&self, tenant: &str, name: &str) -> Result<(), PacknetError> {
        let Some(nic) = self.lookup_interface(tenant, name).await? else {
            warn!("Interface {}:{}:{} not found, nothing to release", DEFAULT_DOMAIN, tenant, name);
            return Ok(());
        };

        for fip in &nic.floating_ip_back_refs {
            let fip_name = fip.to.join(":");
            let result = resource::delete_by_uuid(self.client(), ResourceKind::FloatingIp, &fip.uuid).await;
            ignore_not_found(result, ResourceKind::FloatingIp, &fip_name)?;
            info!("Deleted floating-ip {} of interface {}", fip_name, nic.fq_name_str());
        }

        let result = resource::delete(self.client(), &nic).await;
        ignore_not_found(result, ResourceKind::VirtualMachineInterface, &nic.fq_name_str())?;
        info!("Deleted interface {}", nic.fq_name_str());
        Ok(())
    }

    /// Delete the instance-ip of interface `nic_name`, then the allocation keyed by `uid`
    pub async fn release_instance_ip(&self, tenant: &str, nic_name: &str, uid: &str) -> Result<(), PacknetError> {
        let name = instance_ip_name(tenant, nic_name);
        match resource::find_optional::<InstanceIp>(self.client(), &[name.clone()]).await? {
            Some(ip) => {
                let result = resource::delete(self.client(), &ip).await;
                ignore_not_found(result, ResourceKind::InstanceIp, &name)?;
                info!("Deleted instance-ip {} ({:?})", name, ip.instance_ip_address);
            }
            None => warn!("Instance-ip {} not found", name),
        }
        self.allocator.release_ip_address(uid).await
    }

    /// Delete the virtual machine `domain:tenant:name`; absent is a no-op
    pub async fn release_instance(&self, tenant: &str, name: &str) -> Result<(), PacknetError> {
        let fq_name = tenant_fq_name(tenant, name);
        let Some(instance) = resource::find_optional::<VirtualMachine>(self.client(), &fq_name).await? else {
            warn!("Instance {} not found, nothing to release", fq_name.join(":"));
            return Ok(());
        };
        let result = resource::delete(self.client(), &instance).await;
        ignore_not_found(result, ResourceKind::VirtualMachine, &instance.fq_name_str())?;
        info!("Deleted instance {}", instance.fq_name_str());
        Ok(())
    }

    /// Point `floating_ip` at interface `<project>:<name>`
    ///
    /// No update is issued when the floating IP already references it.
    pub async fn attach_floating_ip(
        &self,
        name: &str,
        project: &str,
        floating_ip: &mut FloatingIp,
    ) -> Result<(), PacknetError> {
        let mut nic_fq_name = split_fq_name(project);
        nic_fq_name.push(name.to_string());
        let nic: VirtualMachineInterface = require(self.client(), &nic_fq_name).await?;

        if floating_ip
            .virtual_machine_interface_refs
            .iter()
            .any(|r| r.uuid == nic.uuid)
        {
            debug!("Floating-ip {} already attached to {}", floating_ip.fq_name_str(), nic.fq_name_str());
            return Ok(());
        }

        floating_ip.virtual_machine_interface_refs.push(nic.to_reference());
        resource::update(self.client(), &*floating_ip).await?;
        info!(
            "Attached floating-ip {} ({:?}) to {}",
            floating_ip.fq_name_str(),
            floating_ip.floating_ip_address,
            nic.fq_name_str()
        );
        Ok(())
    }
}
