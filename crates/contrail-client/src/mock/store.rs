//! Server-side behavior emulated by the mock
//!
//! Reference resolution, computed attributes (gateways, MACs, addresses) and
//! back-reference bookkeeping, applied to the JSON objects the mock stores.

use crate::error::ContrailError;
use crate::models::{IpamSubnetType, ResourceKind};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

const ALL_KINDS: [ResourceKind; 7] = [
    ResourceKind::Project,
    ResourceKind::NetworkIpam,
    ResourceKind::VirtualNetwork,
    ResourceKind::VirtualMachine,
    ResourceKind::VirtualMachineInterface,
    ResourceKind::InstanceIp,
    ResourceKind::FloatingIp,
];

/// Object kept by the mock, keyed by uuid
#[derive(Debug, Clone)]
pub(crate) struct StoredObject {
    pub(crate) kind: ResourceKind,
    pub(crate) value: Value,
}

pub(crate) type Objects = HashMap<String, StoredObject>;
pub(crate) type Names = HashMap<(ResourceKind, String), String>;

fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|segments| {
            segments
                .iter()
                .filter_map(|s| s.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn fq_name_of(value: &Value) -> Vec<String> {
    strings(value.get("fq_name"))
}

fn kind_for_ref_field(field: &str) -> Option<ResourceKind> {
    let type_name = field.strip_suffix("_refs")?.replace('_', "-");
    ALL_KINDS.into_iter().find(|kind| kind.type_name() == type_name)
}

fn forward_ref_fields(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|object| {
            object
                .keys()
                .filter(|key| key.ends_with("_refs") && !key.ends_with("_back_refs"))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Fill in missing uuids of `*_refs` entries and verify the targets exist
pub(crate) fn resolve_refs(objects: &Objects, names: &Names, value: &mut Value) -> Result<(), ContrailError> {
    for field in forward_ref_fields(value) {
        let Some(kind) = kind_for_ref_field(&field) else {
            continue;
        };
        let Some(entries) = value.get_mut(&field).and_then(Value::as_array_mut) else {
            continue;
        };
        for entry in entries {
            let uuid = entry.get("uuid").and_then(Value::as_str).unwrap_or_default().to_string();
            let resolved = if uuid.is_empty() {
                let to = strings(entry.get("to"));
                names.get(&(kind, to.join(":"))).cloned().ok_or_else(|| {
                    ContrailError::InvalidRequest(format!("{} reference to unknown {}", field, to.join(":")))
                })?
            } else if objects.get(&uuid).is_some_and(|stored| stored.kind == kind) {
                uuid
            } else {
                return Err(ContrailError::InvalidRequest(format!(
                    "{} reference to unknown {} {}",
                    field, kind, uuid
                )));
            };
            let to = objects.get(&resolved).map(|stored| fq_name_of(&stored.value)).unwrap_or_default();
            entry["uuid"] = json!(resolved);
            entry["to"] = json!(to);
        }
    }
    Ok(())
}

fn ref_uuids(value: &Value, field: &str) -> Vec<String> {
    value
        .get(field)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("uuid").and_then(Value::as_str).map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Objects holding a forward reference to `uuid`
pub(crate) fn referrers(objects: &Objects, uuid: &str) -> Vec<(ResourceKind, String)> {
    let mut found = Vec::new();
    for (referrer_uuid, stored) in objects {
        let refers = forward_ref_fields(&stored.value)
            .iter()
            .any(|field| ref_uuids(&stored.value, field).iter().any(|target| target == uuid));
        if refers {
            found.push((stored.kind, referrer_uuid.clone()));
        }
    }
    found.sort();
    found
}

/// Add computed `floating_ip_back_refs` / `instance_ip_back_refs` to an interface
pub(crate) fn add_interface_back_refs(objects: &Objects, uuid: &str, value: &mut Value) {
    let mut floating_ips = Vec::new();
    let mut instance_ips = Vec::new();
    for (kind, referrer) in referrers(objects, uuid) {
        let Some(stored) = objects.get(&referrer) else {
            continue;
        };
        let back_ref = json!({ "to": fq_name_of(&stored.value), "uuid": referrer });
        match kind {
            ResourceKind::FloatingIp => floating_ips.push(back_ref),
            ResourceKind::InstanceIp => instance_ips.push(back_ref),
            _ => {}
        }
    }
    if !floating_ips.is_empty() {
        value["floating_ip_back_refs"] = Value::Array(floating_ips);
    }
    if !instance_ips.is_empty() {
        value["instance_ip_back_refs"] = Value::Array(instance_ips);
    }
}

/// Assign gateways and subnet uuids to every IPAM subnet of a new network
pub(crate) fn compute_network_subnets(value: &mut Value) -> Result<(), ContrailError> {
    let Some(ipam_refs) = value.get_mut("network_ipam_refs").and_then(Value::as_array_mut) else {
        return Ok(());
    };
    for ipam_ref in ipam_refs {
        let Some(subnets) = ipam_ref
            .pointer_mut("/attr/ipam_subnets")
            .and_then(Value::as_array_mut)
        else {
            continue;
        };
        for subnet in subnets {
            let parsed: IpamSubnetType = serde_json::from_value(subnet.clone())?;
            let network = parsed.subnet.network()?;
            if parsed.default_gateway.is_none() {
                let gateway = network
                    .iter()
                    .nth(1)
                    .ok_or_else(|| ContrailError::InvalidRequest(format!("subnet {} too small", network)))?;
                subnet["default_gateway"] = json!(gateway.to_string());
            }
            if parsed.subnet_uuid.is_none() {
                subnet["subnet_uuid"] = json!(uuid::Uuid::new_v4().to_string());
            }
        }
    }
    Ok(())
}

/// Locally administered MAC derived from a counter
pub(crate) fn mac_for(counter: u64) -> String {
    let bytes = counter.to_be_bytes();
    format!(
        "02:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]
    )
}

/// Validate or allocate the address of a new instance-ip
pub(crate) fn assign_instance_ip(objects: &Objects, value: &mut Value) -> Result<(), ContrailError> {
    let network_uuid = ref_uuids(value, "virtual_network_refs")
        .into_iter()
        .next()
        .ok_or_else(|| ContrailError::InvalidRequest("instance-ip requires a virtual-network reference".to_string()))?;
    let network = objects
        .get(&network_uuid)
        .ok_or_else(|| ContrailError::InvalidRequest(format!("unknown virtual-network {}", network_uuid)))?;
    let subnet_value = network
        .value
        .pointer("/network_ipam_refs/0/attr/ipam_subnets/0")
        .cloned()
        .ok_or_else(|| ContrailError::InvalidRequest(format!("virtual-network {} has no subnet", network_uuid)))?;
    let subnet: IpamSubnetType = serde_json::from_value(subnet_value)?;
    let cidr = subnet.subnet.network()?;

    let used: HashSet<String> = objects
        .values()
        .filter(|stored| stored.kind == ResourceKind::InstanceIp)
        .filter(|stored| ref_uuids(&stored.value, "virtual_network_refs").contains(&network_uuid))
        .filter_map(|stored| {
            stored
                .value
                .get("instance_ip_address")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .collect();

    let requested = value
        .get("instance_ip_address")
        .and_then(Value::as_str)
        .map(str::to_string);
    let address = match requested {
        Some(requested) => {
            let parsed: Ipv4Addr = requested
                .parse()
                .map_err(|e| ContrailError::InvalidRequest(format!("invalid address {}: {}", requested, e)))?;
            if !cidr.contains(parsed) {
                return Err(ContrailError::InvalidRequest(format!(
                    "address {} is not in subnet {}",
                    requested, cidr
                )));
            }
            if used.contains(&requested) {
                return Err(ContrailError::Conflict(format!(
                    "address {} already in use in {}",
                    requested, network_uuid
                )));
            }
            requested
        }
        None => cidr
            .iter()
            .filter(|candidate| *candidate != cidr.network() && *candidate != cidr.broadcast())
            .map(|candidate| candidate.to_string())
            .find(|candidate| Some(candidate) != subnet.default_gateway.as_ref() && !used.contains(candidate))
            .ok_or_else(|| ContrailError::Api(format!("subnet {} exhausted", cidr)))?,
    };

    value["instance_ip_address"] = json!(address);
    if let Some(subnet_uuid) = subnet.subnet_uuid {
        value["subnet_uuid"] = json!(subnet_uuid);
    }
    Ok(())
}
