//! Stable private addresses keyed by opaque identifier.

use super::{ADDRESS_ALLOCATION_NETWORK, create_and_confirm, locate_or_create_network};
use crate::error::PacknetError;
use contrail_client::{
    ContrailClientTrait, ContrailResource, InstanceIp, VirtualNetwork, resource, split_fq_name,
};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Hands out one address per identifier
#[async_trait::async_trait]
pub trait AddressAllocator: Send + Sync {
    /// Address bound to `uid`, binding a new one on first use
    async fn locate_ip_address(&self, uid: &str) -> Result<String, PacknetError>;

    /// Drop the binding of `uid`; unknown identifiers are ignored
    async fn release_ip_address(&self, uid: &str) -> Result<(), PacknetError>;
}

/// Allocator backed by instance-ips in the allocation network
pub struct ContrailAddressAllocator {
    client: Arc<dyn ContrailClientTrait>,
    private_subnet: String,
    network: OnceCell<VirtualNetwork>,
}

impl ContrailAddressAllocator {
    /// # Arguments
    /// * `client` - controller client
    /// * `private_subnet` - subnet of the allocation network, used if it has to be created
    pub fn new(client: Arc<dyn ContrailClientTrait>, private_subnet: impl Into<String>) -> Self {
        Self {
            client,
            private_subnet: private_subnet.into(),
            network: OnceCell::new(),
        }
    }

    /// The allocation network, located or created once per allocator
    async fn network(&self) -> Result<&VirtualNetwork, PacknetError> {
        self.network
            .get_or_try_init(|| async {
                locate_or_create_network(
                    self.client.as_ref(),
                    &split_fq_name(ADDRESS_ALLOCATION_NETWORK),
                    &self.private_subnet,
                )
                .await
            })
            .await
    }
}

fn address_of(ip: InstanceIp) -> Result<String, PacknetError> {
    let name = ip.fq_name_str();
    ip.instance_ip_address.ok_or(PacknetError::MissingAttribute {
        kind: InstanceIp::KIND,
        name,
        attribute: "address",
    })
}

#[async_trait::async_trait]
impl AddressAllocator for ContrailAddressAllocator {
    async fn locate_ip_address(&self, uid: &str) -> Result<String, PacknetError> {
        let fq_name = vec![uid.to_string()];
        if let Some(ip) = resource::find_optional::<InstanceIp>(self.client.as_ref(), &fq_name).await? {
            debug!("Located allocation {} ({})", uid, ip.uuid);
            return address_of(ip);
        }

        let network = self.network().await?;
        let ip = create_and_confirm(
            self.client.as_ref(),
            InstanceIp {
                fq_name,
                virtual_network_refs: vec![network.to_reference()],
                ..Default::default()
            },
        )
        .await?;
        address_of(ip)
    }

    async fn release_ip_address(&self, uid: &str) -> Result<(), PacknetError> {
        let fq_name = vec![uid.to_string()];
        match resource::find_optional::<InstanceIp>(self.client.as_ref(), &fq_name).await? {
            Some(ip) => {
                resource::delete(self.client.as_ref(), &ip).await?;
                debug!("Released allocation {} ({:?})", uid, ip.instance_ip_address);
            }
            None => debug!("No allocation bound to {}", uid),
        }
        Ok(())
    }
}
