//! Network provisioning helpers

use crate::contrail_trait::ContrailClientTrait;
use crate::error::ContrailError;
use crate::models::*;
use crate::resource;
use tracing::debug;

/// FQN of the IPAM that every network created here is associated with
pub const DEFAULT_NETWORK_IPAM: [&str; 3] = ["default-domain", "default-project", "default-network-ipam"];

/// Create a virtual network with a single subnet under a project
///
/// # Arguments
/// * `project_uuid` - uuid of the owning project
/// * `name` - network name (last FQN segment)
/// * `cidr` - subnet, e.g. "10.40.128.0/17"
///
/// # Returns
/// * `Ok(String)` - uuid of the created network
/// * `Err(ContrailError)` - the subnet is malformed or a remote call failed
pub async fn create_network_with_subnet(
    client: &dyn ContrailClientTrait,
    project_uuid: &str,
    name: &str,
    cidr: &str,
) -> Result<String, ContrailError> {
    let subnet = SubnetType::from_cidr(cidr)?;

    let project: Project = resource::find_by_uuid(client, project_uuid).await?;
    let ipam_fq_name: Vec<String> = DEFAULT_NETWORK_IPAM.iter().map(|s| s.to_string()).collect();
    let ipam: NetworkIpam = resource::find_by_name(client, &ipam_fq_name).await?;

    let mut fq_name = project.fq_name.clone();
    fq_name.push(name.to_string());

    let mut network = VirtualNetwork {
        fq_name,
        parent_type: Some("project".to_string()),
        network_ipam_refs: vec![IpamReference {
            to: ipam.fq_name.clone(),
            uuid: ipam.uuid.clone(),
            href: None,
            attr: VnSubnetsType {
                ipam_subnets: vec![IpamSubnetType {
                    subnet,
                    default_gateway: None,
                    subnet_uuid: None,
                }],
            },
        }],
        ..Default::default()
    };

    debug!("Creating network {} with subnet {}", network.fq_name_str(), cidr);
    resource::create(client, &mut network).await?;
    Ok(network.uuid)
}
