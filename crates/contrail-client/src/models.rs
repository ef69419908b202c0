//! Contrail configuration API models
//!
//! These models match the JSON objects served by the Contrail API server
//! (`/virtual-network/<uuid>`, `/instance-ip/<uuid>`, ...). Every field the
//! server may omit deserializes to its default, so an object read back right
//! after creation is representable even before the server fills in computed
//! attributes.

use crate::error::ContrailError;
use ipnetwork::Ipv4Network;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource types this client knows how to address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Project,
    NetworkIpam,
    VirtualNetwork,
    VirtualMachine,
    VirtualMachineInterface,
    InstanceIp,
    FloatingIp,
}

impl ResourceKind {
    /// REST type name, e.g. `virtual-network`
    pub fn type_name(self) -> &'static str {
        match self {
            ResourceKind::Project => "project",
            ResourceKind::NetworkIpam => "network-ipam",
            ResourceKind::VirtualNetwork => "virtual-network",
            ResourceKind::VirtualMachine => "virtual-machine",
            ResourceKind::VirtualMachineInterface => "virtual-machine-interface",
            ResourceKind::InstanceIp => "instance-ip",
            ResourceKind::FloatingIp => "floating-ip",
        }
    }

    /// REST collection name, e.g. `virtual-networks`
    pub fn collection(self) -> String {
        format!("{}s", self.type_name())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Reference to another object, as found in `*_refs` and `*_back_refs`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectReference {
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Object ownership and timestamps maintained by the API server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdPerms {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

/// Subnet prefix, e.g. `10.40.128.0` / `17`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubnetType {
    pub ip_prefix: String,
    pub ip_prefix_len: u8,
}

impl SubnetType {
    /// Parse an IPv4 CIDR string; host bits are masked off.
    pub fn from_cidr(cidr: &str) -> Result<Self, ContrailError> {
        let network: Ipv4Network = cidr
            .trim()
            .parse()
            .map_err(|e| ContrailError::InvalidRequest(format!("invalid subnet {}: {}", cidr, e)))?;
        Ok(Self {
            ip_prefix: network.network().to_string(),
            ip_prefix_len: network.prefix(),
        })
    }

    /// Parsed network
    pub fn network(&self) -> Result<Ipv4Network, ContrailError> {
        self.to_cidr()
            .parse()
            .map_err(|e| ContrailError::InvalidRequest(format!("invalid subnet {}: {}", self.to_cidr(), e)))
    }

    /// CIDR notation
    pub fn to_cidr(&self) -> String {
        format!("{}/{}", self.ip_prefix, self.ip_prefix_len)
    }
}

/// One subnet of an IPAM association
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpamSubnetType {
    pub subnet: SubnetType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_uuid: Option<String>,
}

/// Attribute of a virtual-network -> network-ipam reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VnSubnetsType {
    pub ipam_subnets: Vec<IpamSubnetType>,
}

/// Virtual-network -> network-ipam reference, carrying the subnets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpamReference {
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub attr: VnSubnetsType,
}

/// MAC addresses assigned to an interface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacAddressesType {
    pub mac_address: Vec<String>,
}

/// Administrative project (tenant)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    pub fq_name: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_perms: Option<IdPerms>,
}

/// IP address management object; owns the subnets of the networks referencing it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkIpam {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    pub fq_name: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_perms: Option<IdPerms>,
}

/// Tenant L3 network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualNetwork {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    pub fq_name: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_perms: Option<IdPerms>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub network_ipam_refs: Vec<IpamReference>,
}

/// Logical instance (one per attached container)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualMachine {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    pub fq_name: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_perms: Option<IdPerms>,
}

/// Network interface of a virtual machine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualMachineInterface {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    pub fq_name: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_perms: Option<IdPerms>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub virtual_machine_refs: Vec<ObjectReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub virtual_network_refs: Vec<ObjectReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_machine_interface_mac_addresses: Option<MacAddressesType>,
    // Back references are computed by the server and never written.
    #[serde(skip_serializing)]
    pub floating_ip_back_refs: Vec<ObjectReference>,
    #[serde(skip_serializing)]
    pub instance_ip_back_refs: Vec<ObjectReference>,
}

impl VirtualMachineInterface {
    /// Assigned MAC addresses, empty until the server allocates one
    pub fn mac_addresses(&self) -> &[String] {
        self.virtual_machine_interface_mac_addresses
            .as_ref()
            .map(|macs| macs.mac_address.as_slice())
            .unwrap_or_default()
    }
}

/// Address bound to an interface within a network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceIp {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    pub fq_name: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_perms: Option<IdPerms>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_uuid: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub virtual_network_refs: Vec<ObjectReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub virtual_machine_interface_refs: Vec<ObjectReference>,
}

/// NAT address that may be associated with interfaces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatingIp {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    pub fq_name: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_perms: Option<IdPerms>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floating_ip_address: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub virtual_machine_interface_refs: Vec<ObjectReference>,
}

/// Identity returned by the server for a freshly created object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatedRef {
    pub uuid: String,
    pub fq_name: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Common accessors for every typed Contrail object
pub trait ContrailResource: Serialize + DeserializeOwned + Send + Sync {
    /// REST type of this model
    const KIND: ResourceKind;

    fn uuid(&self) -> &str;
    fn fq_name(&self) -> &[String];
    fn set_uuid(&mut self, uuid: String);

    /// Last segment of the fully-qualified name
    fn name(&self) -> &str {
        self.fq_name().last().map(String::as_str).unwrap_or_default()
    }

    /// `:`-joined fully-qualified name
    fn fq_name_str(&self) -> String {
        self.fq_name().join(":")
    }

    /// Reference suitable for a `*_refs` list
    fn to_reference(&self) -> ObjectReference {
        ObjectReference {
            to: self.fq_name().to_vec(),
            uuid: self.uuid().to_string(),
            href: None,
        }
    }
}

macro_rules! contrail_resource {
    ($model:ty, $kind:expr) => {
        impl ContrailResource for $model {
            const KIND: ResourceKind = $kind;
            fn uuid(&self) -> &str { &self.uuid }
            fn fq_name(&self) -> &[String] { &self.fq_name }
            fn set_uuid(&mut self, uuid: String) { self.uuid = uuid; }
        }
    };
}

contrail_resource!(Project, ResourceKind::Project);
contrail_resource!(NetworkIpam, ResourceKind::NetworkIpam);
contrail_resource!(VirtualNetwork, ResourceKind::VirtualNetwork);
contrail_resource!(VirtualMachine, ResourceKind::VirtualMachine);
contrail_resource!(VirtualMachineInterface, ResourceKind::VirtualMachineInterface);
contrail_resource!(InstanceIp, ResourceKind::InstanceIp);
contrail_resource!(FloatingIp, ResourceKind::FloatingIp);

/// Split a `:`-separated fully-qualified name into its segments
pub fn split_fq_name(fq_name: &str) -> Vec<String> {
    fq_name.split(':').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subnet_from_cidr_masks_host_bits() {
        let subnet = SubnetType::from_cidr("10.40.130.7/17").unwrap();
        assert_eq!(subnet.ip_prefix, "10.40.128.0");
        assert_eq!(subnet.ip_prefix_len, 17);
        assert_eq!(subnet.to_cidr(), "10.40.128.0/17");
    }

    #[test]
    fn test_subnet_from_cidr_rejects_garbage() {
        let err = SubnetType::from_cidr("10.40.128.0/40").unwrap_err();
        assert!(matches!(err, ContrailError::InvalidRequest(_)));
        assert!(SubnetType::from_cidr("not-a-subnet").is_err());
    }

    #[test]
    fn test_virtual_network_deserializes_server_object() {
        let body = serde_json::json!({
            "uuid": "6f4c1f0e-1111-2222-3333-444455556666",
            "fq_name": ["default-domain", "teemo", "default"],
            "parent_type": "project",
            "network_ipam_refs": [{
                "to": ["default-domain", "default-project", "default-network-ipam"],
                "uuid": "ipam-uuid",
                "attr": {
                    "ipam_subnets": [{
                        "subnet": {"ip_prefix": "10.40.128.0", "ip_prefix_len": 17},
                        "default_gateway": "10.40.128.1",
                        "subnet_uuid": "subnet-uuid"
                    }]
                }
            }],
            "router_external": false
        });
        let network: VirtualNetwork = serde_json::from_value(body).unwrap();
        assert_eq!(network.name(), "default");
        assert_eq!(network.fq_name_str(), "default-domain:teemo:default");
        let subnets = &network.network_ipam_refs[0].attr.ipam_subnets;
        assert_eq!(subnets[0].default_gateway.as_deref(), Some("10.40.128.1"));
    }

    #[test]
    fn test_interface_back_refs_are_not_written() {
        let nic = VirtualMachineInterface {
            fq_name: split_fq_name("default-domain:teemo:abc"),
            floating_ip_back_refs: vec![ObjectReference {
                to: split_fq_name("default-domain:teemo:pool:fip"),
                uuid: "fip-uuid".to_string(),
                href: None,
            }],
            ..Default::default()
        };
        let value = serde_json::to_value(&nic).unwrap();
        assert!(value.get("floating_ip_back_refs").is_none());
        assert!(value.get("uuid").is_none());
        assert!(nic.mac_addresses().is_empty());
    }

    #[test]
    fn test_resource_kind_names() {
        assert_eq!(ResourceKind::VirtualMachineInterface.to_string(), "virtual-machine-interface");
        assert_eq!(ResourceKind::InstanceIp.collection(), "instance-ips");
    }
}
