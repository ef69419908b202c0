//! Unit tests for create-and-confirm and network location

#[cfg(test)]
mod tests {
    use crate::error::PacknetError;
    use crate::network::{create_and_confirm, locate_or_create_network};
    use crate::test_utils::{TEST_SUBNET, create_test_controller};
    use contrail_client::{
        ContrailClientTrait, ContrailError, CreatedRef, MockContrailClient, MockOperation, ResourceKind,
        VirtualMachine, split_fq_name,
    };
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Controller that hides virtual networks from the first name lookup,
    /// as if another process created the network in between
    struct LateNetworkClient {
        inner: MockContrailClient,
        hidden: AtomicBool,
    }

    #[async_trait::async_trait]
    impl ContrailClientTrait for LateNetworkClient {
        fn base_url(&self) -> &str {
            self.inner.base_url()
        }

        async fn uuid_by_name(&self, kind: ResourceKind, fq_name: &[String]) -> Result<String, ContrailError> {
            if kind == ResourceKind::VirtualNetwork && self.hidden.swap(false, Ordering::SeqCst) {
                return Err(ContrailError::NotFound(fq_name.join(":")));
            }
            self.inner.uuid_by_name(kind, fq_name).await
        }

        async fn read(&self, kind: ResourceKind, uuid: &str) -> Result<Value, ContrailError> {
            self.inner.read(kind, uuid).await
        }

        async fn create(&self, kind: ResourceKind, object: Value) -> Result<CreatedRef, ContrailError> {
            self.inner.create(kind, object).await
        }

        async fn update(&self, kind: ResourceKind, uuid: &str, object: Value) -> Result<(), ContrailError> {
            self.inner.update(kind, uuid, object).await
        }

        async fn delete(&self, kind: ResourceKind, uuid: &str) -> Result<(), ContrailError> {
            self.inner.delete(kind, uuid).await
        }
    }

    #[tokio::test]
    async fn test_create_and_confirm_returns_stored_object() {
        let mock = create_test_controller();
        let vm = create_and_confirm(
            mock.as_ref(),
            VirtualMachine {
                fq_name: split_fq_name("default-domain:teemo:web"),
                parent_type: Some("project".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(!vm.uuid.is_empty());
        // Only the read back carries server-maintained fields
        assert!(vm.id_perms.is_some());
        let ops: Vec<MockOperation> = mock.calls().iter().map(|c| c.operation).collect();
        assert_eq!(ops, [MockOperation::Create, MockOperation::Read]);
    }

    #[tokio::test]
    async fn test_create_and_confirm_create_failure() {
        let mock = create_test_controller();
        mock.fail_on(MockOperation::Create, ResourceKind::VirtualMachine);

        let err = create_and_confirm(
            mock.as_ref(),
            VirtualMachine {
                fq_name: split_fq_name("default-domain:teemo:web"),
                parent_type: Some("project".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PacknetError::CreateFailed { kind: ResourceKind::VirtualMachine, .. }));
    }

    #[tokio::test]
    async fn test_create_and_confirm_read_failure() {
        let mock = create_test_controller();
        mock.fail_on(MockOperation::Read, ResourceKind::VirtualMachine);

        let err = create_and_confirm(
            mock.as_ref(),
            VirtualMachine {
                fq_name: split_fq_name("default-domain:teemo:web"),
                parent_type: Some("project".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PacknetError::ReadAfterWriteInconsistent { .. }));
        // The create itself went through
        assert_eq!(mock.count(ResourceKind::VirtualMachine), 1);
    }

    #[tokio::test]
    async fn test_locate_or_create_network_creates_once() {
        let mock = create_test_controller();
        let fq_name = split_fq_name("default-domain:teemo:default");

        let created = locate_or_create_network(mock.as_ref(), &fq_name, TEST_SUBNET).await.unwrap();
        let located = locate_or_create_network(mock.as_ref(), &fq_name, TEST_SUBNET).await.unwrap();

        assert_eq!(created.uuid, located.uuid);
        assert_eq!(mock.count(ResourceKind::VirtualNetwork), 1);
        let subnet = &created.network_ipam_refs[0].attr.ipam_subnets[0];
        assert_eq!(subnet.subnet.to_cidr(), TEST_SUBNET);
        assert_eq!(subnet.default_gateway.as_deref(), Some("10.40.128.1"));
    }

    #[tokio::test]
    async fn test_locate_or_create_network_unknown_project() {
        let mock = create_test_controller();
        let err = locate_or_create_network(mock.as_ref(), &split_fq_name("default-domain:nobody:default"), TEST_SUBNET)
            .await
            .unwrap_err();

        assert!(matches!(err, PacknetError::NotFound { kind: ResourceKind::Project, .. }));
        assert!(mock.calls_of(MockOperation::Create).is_empty());
    }

    #[tokio::test]
    async fn test_locate_or_create_network_lookup_error_is_not_absence() {
        let mock = create_test_controller();
        mock.fail_on(MockOperation::LookupByName, ResourceKind::VirtualNetwork);

        let err = locate_or_create_network(mock.as_ref(), &split_fq_name("default-domain:teemo:default"), TEST_SUBNET)
            .await
            .unwrap_err();

        assert!(matches!(err, PacknetError::Contrail(ContrailError::Api(_))));
        assert!(mock.calls_of(MockOperation::Create).is_empty());
    }

    #[tokio::test]
    async fn test_locate_or_create_network_conflict_relocates() {
        let mock = create_test_controller();
        let fq_name = split_fq_name("default-domain:teemo:default");
        let existing = locate_or_create_network(mock.as_ref(), &fq_name, TEST_SUBNET).await.unwrap();

        let client = LateNetworkClient {
            inner: (*mock).clone(),
            hidden: AtomicBool::new(true),
        };
        let network = locate_or_create_network(&client, &fq_name, TEST_SUBNET).await.unwrap();

        assert_eq!(network.uuid, existing.uuid);
        assert_eq!(mock.count(ResourceKind::VirtualNetwork), 1);
        assert_eq!(mock.calls_of(MockOperation::Create).len(), 2);
    }
}
