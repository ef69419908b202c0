//! Unit tests for namespace wiring

#[cfg(test)]
mod tests {
    use crate::container::ContainerId;
    use crate::error::PacknetError;
    use crate::netns::NamespaceWirer;
    use crate::test_utils::{RecordingRunner, StaticRuntime};
    use std::sync::Arc;

    fn wirer(runner: &Arc<RecordingRunner>, pid: u32) -> NamespaceWirer {
        NamespaceWirer::new(runner.clone(), Arc::new(StaticRuntime(pid)))
    }

    #[tokio::test]
    async fn test_create_interface_command_sequence() {
        let runner = Arc::new(RecordingRunner::new());
        let container = ContainerId::new("abc1234567890").unwrap();

        let host = wirer(&runner, 4242)
            .create_interface(&container, "02:00:00:00:00:01", "10.40.128.5", "10.40.128.1")
            .await
            .unwrap();

        assert_eq!(host, "veth-abc1234567");
        assert_eq!(
            runner.commands(),
            [
                "ip link add veth-abc1234567 type veth peer name vetp-abc1234567",
                "ip link set vetp-abc1234567 netns 4242",
                "nsenter -n -t 4242 ip link set dev vetp-abc1234567 name veth0 address 02:00:00:00:00:01",
                "ip link set veth-abc1234567 up",
                "nsenter -n -t 4242 ip link set veth0 up",
                "nsenter -n -t 4242 ip addr add 10.40.128.5/32 peer 10.40.128.1 dev veth0",
                "nsenter -n -t 4242 ip route add default via 10.40.128.1",
            ]
        );
    }

    #[tokio::test]
    async fn test_create_interface_stops_at_first_failure() {
        let runner = Arc::new(RecordingRunner::new());
        runner.fail("ip link set vetp-web netns", "RTNETLINK answers: Invalid argument");
        let container = ContainerId::new("web").unwrap();

        let err = wirer(&runner, 77)
            .create_interface(&container, "02:00:00:00:00:02", "10.40.128.6", "10.40.128.1")
            .await
            .unwrap_err();

        match err {
            PacknetError::ExternalCommandFailed { command, message } => {
                assert_eq!(command, "ip link set vetp-web netns 77");
                assert_eq!(message, "RTNETLINK answers: Invalid argument");
            }
            other => panic!("unexpected error: {other}"),
        }
        // No cleanup is attempted
        assert_eq!(runner.commands().len(), 2);
    }

    #[tokio::test]
    async fn test_create_interface_default_route_failure_is_fatal() {
        let runner = Arc::new(RecordingRunner::new());
        runner.fail("nsenter -n -t 77 ip route add", "RTNETLINK answers: File exists");
        let container = ContainerId::new("web").unwrap();

        let result = wirer(&runner, 77)
            .create_interface(&container, "02:00:00:00:00:02", "10.40.128.6", "10.40.128.1")
            .await;

        assert!(matches!(result, Err(PacknetError::ExternalCommandFailed { .. })));
    }

    #[tokio::test]
    async fn test_create_interface_container_not_running() {
        let runner = Arc::new(RecordingRunner::new());
        let container = ContainerId::new("web").unwrap();

        let err = wirer(&runner, 0)
            .create_interface(&container, "02:00:00:00:00:02", "10.40.128.6", "10.40.128.1")
            .await
            .unwrap_err();

        assert!(matches!(err, PacknetError::ContainerNotRunning(_)));
        assert_eq!(runner.commands(), ["ip link add veth-web type veth peer name vetp-web"]);
    }

    #[tokio::test]
    async fn test_delete_interface_removes_existing_pair() {
        let runner = Arc::new(RecordingRunner::new());
        let container = ContainerId::new("abc1234567890").unwrap();

        wirer(&runner, 4242).delete_interface(&container).await.unwrap();

        assert_eq!(
            runner.commands(),
            ["ip link show veth-abc1234567", "ip link delete veth-abc1234567"]
        );
    }

    #[tokio::test]
    async fn test_delete_interface_absent_is_noop() {
        let runner = Arc::new(RecordingRunner::new());
        runner.fail("ip link show", "Device \"veth-web\" does not exist.");
        let container = ContainerId::new("web").unwrap();

        wirer(&runner, 4242).delete_interface(&container).await.unwrap();

        assert_eq!(runner.commands(), ["ip link show veth-web"]);
    }
}
