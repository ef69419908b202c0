//! Mock ContrailClient for unit testing
//!
//! This module provides an in-memory implementation of ContrailClientTrait that
//! behaves like a freshly installed API server: the default project and
//! default IPAM exist, create only echoes the new object's identity, and
//! attributes the server normally computes (gateways, MACs, addresses, back
//! references) appear on the next read.
//!
//! Every call is logged so tests can assert ordering, and failures can be
//! injected per operation and resource kind.

mod store;

use crate::contrail_trait::ContrailClientTrait;
use crate::error::ContrailError;
use crate::models::{CreatedRef, ResourceKind};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use store::{Names, Objects, StoredObject};

/// Operation recorded by the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    LookupByName,
    Read,
    Create,
    Update,
    Delete,
}

/// One recorded API call; `target` is the `:`-joined FQN for lookups and
/// creates, the uuid otherwise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub operation: MockOperation,
    pub kind: ResourceKind,
    pub target: String,
}

/// Mock ContrailClient for testing
#[derive(Clone)]
pub struct MockContrailClient {
    pub(crate) base_url: String,
    // In-memory storage, locked in this order: objects, names
    pub(crate) objects: Arc<Mutex<Objects>>,
    pub(crate) names: Arc<Mutex<Names>>,
    pub(crate) calls: Arc<Mutex<Vec<MockCall>>>,
    pub(crate) failures: Arc<Mutex<HashSet<(MockOperation, ResourceKind)>>>,
    // Counter for generating MAC addresses
    pub(crate) next_mac: Arc<Mutex<u64>>,
}

impl MockContrailClient {
    /// Create a new mock client seeded with the default project and IPAM
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Self {
            base_url: base_url.into(),
            objects: Arc::new(Mutex::new(HashMap::new())),
            names: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(HashSet::new())),
            next_mac: Arc::new(Mutex::new(1)),
        };
        client.add_project(&["default-domain", "default-project"]);
        client.add_object(
            ResourceKind::NetworkIpam,
            json!({
                "fq_name": ["default-domain", "default-project", "default-network-ipam"],
                "parent_type": "project",
            }),
        );
        client
    }

    /// Add a project to the mock store (for test setup); returns its uuid
    pub fn add_project(&self, fq_name: &[&str]) -> String {
        self.add_object(ResourceKind::Project, json!({ "fq_name": fq_name }))
    }

    /// Add a floating IP to the mock store (for test setup); returns its uuid
    pub fn add_floating_ip(&self, fq_name: &[&str], address: &str) -> String {
        self.add_object(
            ResourceKind::FloatingIp,
            json!({
                "fq_name": fq_name,
                "parent_type": "floating-ip-pool",
                "floating_ip_address": address,
            }),
        )
    }

    /// Add an arbitrary object without recording a call (for test setup)
    pub fn add_object(&self, kind: ResourceKind, object: Value) -> String {
        self.insert(kind, object)
            .unwrap_or_else(|e| panic!("mock setup failed for {}: {}", kind, e))
            .uuid
    }

    /// Stored object by FQN, with server-computed fields (for assertions)
    pub fn object(&self, kind: ResourceKind, fq_name: &[&str]) -> Option<Value> {
        let objects = self.objects.lock().unwrap();
        let names = self.names.lock().unwrap();
        let uuid = names.get(&(kind, fq_name.join(":")))?;
        objects.get(uuid).map(|stored| stored.value.clone())
    }

    /// Number of stored objects of a kind
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.objects
            .lock()
            .unwrap()
            .values()
            .filter(|stored| stored.kind == kind)
            .count()
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls of one operation, in order
    pub fn calls_of(&self, operation: MockOperation) -> Vec<MockCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.operation == operation)
            .collect()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Make every `operation` on `kind` fail until cleared
    pub fn fail_on(&self, operation: MockOperation, kind: ResourceKind) {
        self.failures.lock().unwrap().insert((operation, kind));
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    fn record(&self, operation: MockOperation, kind: ResourceKind, target: &str) -> Result<(), ContrailError> {
        self.calls.lock().unwrap().push(MockCall {
            operation,
            kind,
            target: target.to_string(),
        });
        if self.failures.lock().unwrap().contains(&(operation, kind)) {
            return Err(ContrailError::Api(format!(
                "injected {:?} failure for {} {}",
                operation, kind, target
            )));
        }
        Ok(())
    }

    fn allocate_mac(&self) -> String {
        let mut counter = self.next_mac.lock().unwrap();
        let mac = store::mac_for(*counter);
        *counter += 1;
        mac
    }

    fn insert(&self, kind: ResourceKind, mut object: Value) -> Result<CreatedRef, ContrailError> {
        if !object.is_object() {
            return Err(ContrailError::InvalidRequest(format!("{} body must be an object", kind)));
        }
        let fq_name = store::fq_name_of(&object);
        if fq_name.is_empty() {
            return Err(ContrailError::InvalidRequest(format!("{} requires fq_name", kind)));
        }
        if fq_name.len() > 1 && object.get("parent_type").and_then(Value::as_str).is_none() {
            return Err(ContrailError::InvalidRequest(format!(
                "{} {} requires parent_type",
                kind,
                fq_name.join(":")
            )));
        }
        let key = fq_name.join(":");

        let mut objects = self.objects.lock().unwrap();
        let mut names = self.names.lock().unwrap();
        if names.contains_key(&(kind, key.clone())) {
            return Err(ContrailError::Conflict(format!("{} {} already exists", kind, key)));
        }

        store::resolve_refs(&objects, &names, &mut object)?;
        match kind {
            ResourceKind::VirtualNetwork => store::compute_network_subnets(&mut object)?,
            ResourceKind::VirtualMachineInterface => {
                if object.get("virtual_machine_interface_mac_addresses").is_none() {
                    object["virtual_machine_interface_mac_addresses"] = json!({ "mac_address": [self.allocate_mac()] });
                }
            }
            ResourceKind::InstanceIp => store::assign_instance_ip(&objects, &mut object)?,
            _ => {}
        }

        let uuid = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        object["uuid"] = json!(uuid);
        object["name"] = json!(fq_name.last());
        object["id_perms"] = json!({ "enable": true, "created": now, "last_modified": now });

        objects.insert(uuid.clone(), StoredObject { kind, value: object });
        names.insert((kind, key), uuid.clone());

        Ok(CreatedRef {
            href: Some(format!("{}/{}/{}", self.base_url, kind.type_name(), uuid)),
            uuid,
            fq_name,
        })
    }
}

#[async_trait::async_trait]
impl ContrailClientTrait for MockContrailClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn uuid_by_name(&self, kind: ResourceKind, fq_name: &[String]) -> Result<String, ContrailError> {
        let key = fq_name.join(":");
        self.record(MockOperation::LookupByName, kind, &key)?;
        self.names
            .lock()
            .unwrap()
            .get(&(kind, key.clone()))
            .cloned()
            .ok_or_else(|| ContrailError::NotFound(format!("{} {} not found", kind, key)))
    }

    async fn read(&self, kind: ResourceKind, uuid: &str) -> Result<Value, ContrailError> {
        self.record(MockOperation::Read, kind, uuid)?;
        let objects = self.objects.lock().unwrap();
        let mut value = objects
            .get(uuid)
            .filter(|stored| stored.kind == kind)
            .map(|stored| stored.value.clone())
            .ok_or_else(|| ContrailError::NotFound(format!("{} {} not found", kind, uuid)))?;
        if kind == ResourceKind::VirtualMachineInterface {
            store::add_interface_back_refs(&objects, uuid, &mut value);
        }
        Ok(value)
    }

    async fn create(&self, kind: ResourceKind, object: Value) -> Result<CreatedRef, ContrailError> {
        let fq_name = store::fq_name_of(&object).join(":");
        self.record(MockOperation::Create, kind, &fq_name)?;
        self.insert(kind, object)
    }

    async fn update(&self, kind: ResourceKind, uuid: &str, mut object: Value) -> Result<(), ContrailError> {
        self.record(MockOperation::Update, kind, uuid)?;
        let mut objects = self.objects.lock().unwrap();
        let names = self.names.lock().unwrap();
        if !objects.get(uuid).is_some_and(|stored| stored.kind == kind) {
            return Err(ContrailError::NotFound(format!("{} {} not found", kind, uuid)));
        }
        store::resolve_refs(&objects, &names, &mut object)?;

        let Some(fields) = object.as_object() else {
            return Err(ContrailError::InvalidRequest(format!("{} body must be an object", kind)));
        };
        if let Some(stored) = objects.get_mut(uuid) {
            for (field, value) in fields {
                if field != "uuid" && field != "fq_name" && field != "id_perms" {
                    stored.value[field.as_str()] = value.clone();
                }
            }
            stored.value["id_perms"]["last_modified"] = json!(chrono::Utc::now().to_rfc3339());
        }
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, uuid: &str) -> Result<(), ContrailError> {
        self.record(MockOperation::Delete, kind, uuid)?;
        let mut objects = self.objects.lock().unwrap();
        let mut names = self.names.lock().unwrap();
        let Some(stored) = objects.get(uuid).filter(|stored| stored.kind == kind) else {
            return Err(ContrailError::NotFound(format!("{} {} not found", kind, uuid)));
        };
        let referrers = store::referrers(&objects, uuid);
        if !referrers.is_empty() {
            let holders: Vec<String> = referrers
                .iter()
                .map(|(referrer_kind, referrer)| format!("{} {}", referrer_kind, referrer))
                .collect();
            return Err(ContrailError::Conflict(format!(
                "{} {} is still referenced by {}",
                kind,
                uuid,
                holders.join(", ")
            )));
        }
        let key = store::fq_name_of(&stored.value).join(":");
        objects.remove(uuid);
        names.remove(&(kind, key));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use crate::resource;

    fn fqn(s: &str) -> Vec<String> {
        split_fq_name(s)
    }

    async fn network(mock: &MockContrailClient) -> VirtualNetwork {
        let project = mock.add_project(&["default-domain", "teemo"]);
        let uuid = crate::network::create_network_with_subnet(mock, &project, "net", "10.40.128.0/29")
            .await
            .unwrap();
        resource::find_by_uuid(mock, &uuid).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_returns_identity_only() {
        let mock = MockContrailClient::new("http://test-contrail:8082");
        let created = mock
            .create(
                ResourceKind::VirtualMachine,
                json!({"fq_name": ["default-domain", "teemo", "web"], "parent_type": "project"}),
            )
            .await
            .unwrap();
        assert_eq!(created.fq_name, fqn("default-domain:teemo:web"));
        assert!(created.href.unwrap().ends_with(&created.uuid));

        let conflict = mock
            .create(
                ResourceKind::VirtualMachine,
                json!({"fq_name": ["default-domain", "teemo", "web"], "parent_type": "project"}),
            )
            .await
            .unwrap_err();
        assert!(conflict.is_conflict());
    }

    #[tokio::test]
    async fn test_create_requires_parent_type_for_scoped_names() {
        let mock = MockContrailClient::new("http://test-contrail:8082");
        let err = mock
            .create(
                ResourceKind::VirtualMachine,
                json!({"fq_name": ["default-domain", "teemo", "web"]}),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ContrailError::InvalidRequest(_)));
        assert_eq!(mock.count(ResourceKind::VirtualMachine), 0);
    }

    #[tokio::test]
    async fn test_interface_gets_mac_and_back_refs() {
        let mock = MockContrailClient::new("http://test-contrail:8082");
        let mut vm = VirtualMachine {
            fq_name: fqn("default-domain:teemo:web"),
            parent_type: Some("project".to_string()),
            ..Default::default()
        };
        resource::create(&mock, &mut vm).await.unwrap();
        let mut nic = VirtualMachineInterface {
            fq_name: fqn("default-domain:teemo:web"),
            parent_type: Some("project".to_string()),
            virtual_machine_refs: vec![vm.to_reference()],
            ..Default::default()
        };
        resource::create(&mock, &mut nic).await.unwrap();

        let fip = mock.add_floating_ip(&["default-domain", "admin", "public", "pool", "fip1"], "192.0.2.10");
        let mut floating: FloatingIp = resource::find_by_uuid(&mock, &fip).await.unwrap();
        floating.virtual_machine_interface_refs.push(nic.to_reference());
        resource::update(&mock, &floating).await.unwrap();

        let read: VirtualMachineInterface = resource::find_by_uuid(&mock, &nic.uuid).await.unwrap();
        assert_eq!(read.mac_addresses(), ["02:00:00:00:00:01".to_string()]);
        assert_eq!(read.floating_ip_back_refs.len(), 1);
        assert_eq!(read.floating_ip_back_refs[0].uuid, fip);

        let err = resource::delete(&mock, &read).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_instance_ip_allocation_within_subnet() {
        let mock = MockContrailClient::new("http://test-contrail:8082");
        let net = network(&mock).await;

        let mut addresses = Vec::new();
        for name in ["a", "b", "c", "d", "e"] {
            let mut ip = InstanceIp {
                fq_name: vec![name.to_string()],
                virtual_network_refs: vec![net.to_reference()],
                ..Default::default()
            };
            resource::create(&mock, &mut ip).await.unwrap();
            let read: InstanceIp = resource::find_by_uuid(&mock, &ip.uuid).await.unwrap();
            addresses.push(read.instance_ip_address.unwrap());
        }
        // /29: .0 network, .1 gateway, .7 broadcast
        assert_eq!(addresses, ["10.40.128.2", "10.40.128.3", "10.40.128.4", "10.40.128.5", "10.40.128.6"]);

        let mut exhausted = InstanceIp {
            fq_name: vec!["f".to_string()],
            virtual_network_refs: vec![net.to_reference()],
            ..Default::default()
        };
        assert!(resource::create(&mock, &mut exhausted).await.is_err());
    }

    #[tokio::test]
    async fn test_instance_ip_requested_address_must_fit_subnet() {
        let mock = MockContrailClient::new("http://test-contrail:8082");
        let net = network(&mock).await;
        let mut ip = InstanceIp {
            fq_name: vec!["outside".to_string()],
            instance_ip_address: Some("10.40.200.1".to_string()),
            virtual_network_refs: vec![net.to_reference()],
            ..Default::default()
        };
        let err = resource::create(&mock, &mut ip).await.unwrap_err();
        assert!(matches!(err, ContrailError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_injected_failures_and_call_log() {
        let mock = MockContrailClient::new("http://test-contrail:8082");
        mock.fail_on(MockOperation::LookupByName, ResourceKind::Project);
        let err = mock
            .uuid_by_name(ResourceKind::Project, &fqn("default-domain:default-project"))
            .await
            .unwrap_err();
        assert!(matches!(err, ContrailError::Api(_)));

        mock.clear_failures();
        mock.uuid_by_name(ResourceKind::Project, &fqn("default-domain:default-project"))
            .await
            .unwrap();
        let lookups = mock.calls_of(MockOperation::LookupByName);
        assert_eq!(lookups.len(), 2);
        assert_eq!(lookups[0].target, "default-domain:default-project");
    }
}
