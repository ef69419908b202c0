//! Typed operations over [`ContrailClientTrait`]
//!
//! Every helper takes the client as a trait object so orchestration code can
//! run unchanged against the HTTP client or the mock.

use crate::contrail_trait::ContrailClientTrait;
use crate::error::ContrailError;
use crate::models::{ContrailResource, ResourceKind};
use tracing::debug;

/// Find an object by its fully-qualified name
pub async fn find_by_name<T: ContrailResource>(
    client: &dyn ContrailClientTrait,
    fq_name: &[String],
) -> Result<T, ContrailError> {
    let uuid = client.uuid_by_name(T::KIND, fq_name).await?;
    find_by_uuid(client, &uuid).await
}

/// Find an object by uuid
pub async fn find_by_uuid<T: ContrailResource>(
    client: &dyn ContrailClientTrait,
    uuid: &str,
) -> Result<T, ContrailError> {
    let value = client.read(T::KIND, uuid).await?;
    Ok(serde_json::from_value(value)?)
}

/// Find an object by name, mapping `NotFound` to `None`.
///
/// Any other error is returned as is; callers must not treat a failed
/// lookup as absence.
pub async fn find_optional<T: ContrailResource>(
    client: &dyn ContrailClientTrait,
    fq_name: &[String],
) -> Result<Option<T>, ContrailError> {
    match find_by_name(client, fq_name).await {
        Ok(object) => Ok(Some(object)),
        Err(ContrailError::NotFound(_)) => {
            debug!("{} {} does not exist", T::KIND, fq_name.join(":"));
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Create an object and record the uuid assigned by the server
pub async fn create<T: ContrailResource>(
    client: &dyn ContrailClientTrait,
    object: &mut T,
) -> Result<(), ContrailError> {
    let body = serde_json::to_value(&*object)?;
    let created = client.create(T::KIND, body).await?;
    if created.uuid.is_empty() {
        return Err(ContrailError::Api(format!(
            "create {} {} returned no uuid",
            T::KIND,
            object.fq_name().join(":")
        )));
    }
    object.set_uuid(created.uuid);
    Ok(())
}

/// Write back an existing object
pub async fn update<T: ContrailResource>(
    client: &dyn ContrailClientTrait,
    object: &T,
) -> Result<(), ContrailError> {
    let body = serde_json::to_value(object)?;
    client.update(T::KIND, object.uuid(), body).await
}

/// Delete an existing object
pub async fn delete<T: ContrailResource>(
    client: &dyn ContrailClientTrait,
    object: &T,
) -> Result<(), ContrailError> {
    client.delete(T::KIND, object.uuid()).await
}

/// Delete by type and uuid, without reading the object first
pub async fn delete_by_uuid(
    client: &dyn ContrailClientTrait,
    kind: ResourceKind,
    uuid: &str,
) -> Result<(), ContrailError> {
    client.delete(kind, uuid).await
}
