//! ContrailClient trait for mocking
//!
//! This trait abstracts the Contrail API client to enable mocking in unit tests.
//! The concrete ContrailClient implements it over HTTP, and tests use the
//! in-memory `MockContrailClient`. Objects cross the trait as JSON so it stays
//! object-safe; the typed layer lives in [`crate::resource`].

use crate::error::ContrailError;
use crate::models::{CreatedRef, ResourceKind};

/// Trait for Contrail configuration API operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ContrailClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Resolve a fully-qualified name to the object's uuid
    async fn uuid_by_name(&self, kind: ResourceKind, fq_name: &[String]) -> Result<String, ContrailError>;

    /// Read an object by uuid (envelope already stripped)
    async fn read(&self, kind: ResourceKind, uuid: &str) -> Result<serde_json::Value, ContrailError>;

    /// Create an object; the server only echoes its identity back
    async fn create(&self, kind: ResourceKind, object: serde_json::Value) -> Result<CreatedRef, ContrailError>;

    /// Replace the writable fields of an existing object
    async fn update(&self, kind: ResourceKind, uuid: &str, object: serde_json::Value) -> Result<(), ContrailError>;

    /// Delete an object by uuid
    async fn delete(&self, kind: ResourceKind, uuid: &str) -> Result<(), ContrailError>;
}
