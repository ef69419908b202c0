//! Packnet error types.
//!
//! Controller failures arrive as [`ContrailError`]; everything the
//! orchestration and namespace wiring can fail on is a [`PacknetError`].
//! Pipeline steps wrap their failure in [`PacknetError::Step`] so the final
//! message names every resource on the way down.
//!
//! Variants that wrap another error expose it only through
//! [`std::error::Error::source`]; render the whole chain with `{:#}` on an
//! `anyhow::Error`.

use contrail_client::{ContrailError, ResourceKind};
use thiserror::Error;

/// Errors that can occur while attaching or detaching a container.
#[derive(Debug, Error)]
pub enum PacknetError {
    /// A resource that must exist does not
    #[error("{kind} not found: {name}")]
    NotFound { kind: ResourceKind, name: String },

    /// The controller rejected or failed a create
    #[error("failed to create {kind} {name}")]
    CreateFailed {
        kind: ResourceKind,
        name: String,
        #[source]
        source: ContrailError,
    },

    /// A freshly created object could not be read back
    #[error("created {kind} {uuid} could not be read back")]
    ReadAfterWriteInconsistent {
        kind: ResourceKind,
        uuid: String,
        #[source]
        source: ContrailError,
    },

    /// An attribute the controller computes is absent (gateway, MAC, subnet)
    #[error("{kind} {name} has no {attribute}")]
    MissingAttribute {
        kind: ResourceKind,
        name: String,
        attribute: &'static str,
    },

    /// An external command exited non-zero, could not start, or timed out
    #[error("command `{command}` failed: {message}")]
    ExternalCommandFailed { command: String, message: String },

    /// The container has no running process
    #[error("container {0} is not running")]
    ContainerNotRunning(String),

    /// Container identifier is empty or contains unsupported characters
    #[error("invalid container id {0:?}")]
    InvalidContainerId(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Controller API error
    #[error("Contrail request failed")]
    Contrail(#[from] ContrailError),

    /// Failure of one pipeline step
    #[error("{step}")]
    Step {
        step: String,
        #[source]
        source: Box<PacknetError>,
    },
}

impl PacknetError {
    /// Innermost error, with every `Step` layer removed
    pub fn root_cause(&self) -> &PacknetError {
        let mut current = self;
        while let PacknetError::Step { source, .. } = current {
            current = source;
        }
        current
    }

    /// Whether the root cause is a controller `NotFound`
    pub fn is_not_found(&self) -> bool {
        match self.root_cause() {
            PacknetError::NotFound { .. } => true,
            PacknetError::Contrail(e) => e.is_not_found(),
            _ => false,
        }
    }
}

/// Attach the identity of a pipeline step to an error
pub trait StepContext<T> {
    /// Wrap the error in a `<kind> <name>` step
    fn step(self, kind: ResourceKind, name: &str) -> Result<T, PacknetError>;

    /// Wrap the error with a free-form step description
    fn step_with<F: FnOnce() -> String>(self, describe: F) -> Result<T, PacknetError>;
}

impl<T, E: Into<PacknetError>> StepContext<T> for Result<T, E> {
    fn step(self, kind: ResourceKind, name: &str) -> Result<T, PacknetError> {
        self.step_with(|| format!("{} {}", kind, name))
    }

    fn step_with<F: FnOnce() -> String>(self, describe: F) -> Result<T, PacknetError> {
        self.map_err(|e| PacknetError::Step {
            step: describe(),
            source: Box::new(e.into()),
        })
    }
}
