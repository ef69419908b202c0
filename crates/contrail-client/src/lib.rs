//! OpenContrail Configuration API Client
//!
//! A Rust client library for the Contrail configuration API server.
//! Provides typed models for the resources a container attachment needs
//! (projects, networks, virtual machines, interfaces, instance and floating
//! IPs) and name/uuid addressed CRUD over them.
//!
//! # Example
//!
//! ```no_run
//! use contrail_client::{ContrailClient, VirtualNetwork, resource, split_fq_name};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ContrailClient::for_server("localhost", 8082)?;
//!
//! // Look up a network by its fully-qualified name
//! let network: VirtualNetwork =
//!     resource::find_by_name(&client, &split_fq_name("default-domain:teemo:default")).await?;
//! println!("{} has uuid {}", network.fq_name.join(":"), network.uuid);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Name resolution**: `fq_name` to uuid through `/fqname-to-id`
//! - **Typed CRUD**: generic helpers over every [`ContrailResource`]
//! - **Network provisioning**: networks with a single IPAM subnet
//! - **Mocking**: an in-memory server behind the `test-util` feature

pub mod client;
pub mod common;
pub mod error;
pub mod models;
pub mod network;
pub mod resource;
#[path = "trait.rs"]
pub mod contrail_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::{ContrailClient, DEFAULT_REQUEST_TIMEOUT};
pub use common::HttpClient;
pub use contrail_trait::ContrailClientTrait;
pub use error::ContrailError;
pub use models::*;
pub use network::{DEFAULT_NETWORK_IPAM, create_network_with_subnet};
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockCall, MockContrailClient, MockOperation};
