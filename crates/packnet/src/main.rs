//! packnet
//!
//! `--start <id>` provisions the container's attachment in Contrail, wires its
//! network namespace and registers the host interface with the vrouter agent.
//! `--stop <id>` removes the veth pair and the container's Contrail resources.

use anyhow::Context;
use clap::Parser;
use contrail_client::ContrailClient;
use packnet::netns::command::SystemCommandRunner;
use packnet::netns::runtime::DockerRuntime;
use packnet::{Action, Config, ContainerId, NamespaceWirer, NetworkManager, VrouterAgent};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct App {
    config: Config,
    manager: NetworkManager,
    wirer: NamespaceWirer,
    vrouter: VrouterAgent,
}

impl App {
    fn new(config: Config) -> anyhow::Result<Self> {
        let client = ContrailClient::new(config.api_url(), config.auth_token.clone(), config.request_timeout())
            .context("failed to create Contrail client")?;
        let manager = NetworkManager::with_contrail_allocator(Arc::new(client), config.private_subnet.clone());

        let runner = Arc::new(SystemCommandRunner::new(config.command_timeout()));
        let runtime = Arc::new(DockerRuntime::new(config.docker.clone(), runner.clone()));
        let wirer = NamespaceWirer::new(runner.clone(), runtime);
        let vrouter = VrouterAgent::new(config.vrouter_ctl.clone(), runner);

        Ok(Self {
            config,
            manager,
            wirer,
            vrouter,
        })
    }

    async fn start(&self, container: &ContainerId) -> anyhow::Result<()> {
        let tenant = &self.config.tenant;
        let metadata = self
            .manager
            .build(tenant, &self.config.network, container.short())
            .await
            .with_context(|| format!("failed to provision {} in {}/{}", container, tenant, self.config.network))?;
        info!(
            "Attachment: {}",
            serde_json::to_string(&metadata).context("failed to encode attachment")?
        );

        if let Some(floating_ip) = &self.config.floating_ip {
            self.manager
                .attach_floating_ip(tenant, container.short(), floating_ip)
                .await
                .with_context(|| format!("failed to attach floating IP {}", floating_ip))?;
        }

        let host_interface = self
            .wirer
            .create_interface(container, &metadata.mac_address, &metadata.ip_address, &metadata.gateway)
            .await
            .with_context(|| format!("failed to wire namespace of {}", container))?;

        self.vrouter
            .register(&metadata, &host_interface, container)
            .await
            .with_context(|| format!("failed to register {} with vrouter", host_interface))?;

        info!("Container {} attached on {}", container, host_interface);
        Ok(())
    }

    async fn stop(&self, container: &ContainerId) -> anyhow::Result<()> {
        self.wirer
            .delete_interface(container)
            .await
            .with_context(|| format!("failed to remove veth pair of {}", container))?;
        self.manager
            .release(&self.config.tenant, container.short())
            .await
            .with_context(|| format!("failed to release {} in {}", container, self.config.tenant))?;

        info!("Container {} detached", container);
        Ok(())
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    config.validate()?;
    let action = config.action()?;

    info!("Configuration:");
    info!("  Contrail API: {}", config.api_url());
    info!("  Tenant: {}", config.tenant);
    info!("  Network: {}", config.network);

    let app = App::new(config)?;
    match action {
        Action::Start(container) => app.start(&container).await,
        Action::Stop(container) => app.stop(&container).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    if let Err(e) = run(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
