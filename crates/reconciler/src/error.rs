//! Error types for the reconciler crate.

use thiserror::Error;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciler error types.
///
/// "Not found" is never an error here: clients return `Ok(None)` and the
/// reconcilers take the create path.
#[derive(Debug, Error)]
pub enum Error {
    /// The live object breaks an invariant the operator relies on. Retrying
    /// will not help and the object is not overwritten.
    #[error("structural mismatch in {kind} '{name}': {reason}")]
    StructuralMismatch {
        kind: &'static str,
        name: String,
        reason: String,
    },

    /// The desired change is not allowed (e.g. shrinking a volume).
    #[error("policy violation on {kind} '{name}': {reason}")]
    PolicyViolation {
        kind: &'static str,
        name: String,
        reason: String,
    },

    /// The instance spec cannot be turned into desired objects.
    #[error("invalid spec: {reason}")]
    InvalidSpec { reason: String },

    /// Operator wiring is incomplete or inconsistent.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A resource quantity string could not be parsed.
    #[error("invalid quantity '{value}': {reason}")]
    InvalidQuantity { value: String, reason: String },

    /// Concurrent modification detected by the platform.
    #[error("conflict writing {kind} '{name}': {reason}")]
    Conflict {
        kind: String,
        name: String,
        reason: String,
    },

    /// The API server refused the request (4xx other than 409 and 429), e.g.
    /// an immutable field change or a resize the storage class forbids.
    #[error("{kind} '{name}' rejected by the API server ({code}): {reason}")]
    Rejected {
        kind: String,
        name: String,
        code: u16,
        reason: String,
    },

    /// Connectivity or other retryable platform failure.
    #[error("transient platform error: {reason}")]
    Transient { reason: String },

    /// Error returned by the Kubernetes API client.
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Object (de)serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A per-type reconciler failed; `component` names which one.
    #[error("{component} reconciler failed: {source}")]
    Component {
        component: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a structural mismatch error.
    pub fn structural_mismatch(
        kind: &'static str,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::StructuralMismatch {
            kind,
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a policy violation error.
    pub fn policy_violation(
        kind: &'static str,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::PolicyViolation {
            kind,
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid spec error.
    pub fn invalid_spec(reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an invalid quantity error.
    pub fn invalid_quantity(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQuantity {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a write conflict error.
    pub fn conflict(
        kind: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            kind: kind.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an API rejection error.
    pub fn rejected(
        kind: impl Into<String>,
        name: impl Into<String>,
        code: u16,
        reason: impl Into<String>,
    ) -> Self {
        Self::Rejected {
            kind: kind.into(),
            name: name.into(),
            code,
            reason: reason.into(),
        }
    }

    /// Create a transient error.
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient {
            reason: reason.into(),
        }
    }

    /// Attach the failing component's name.
    pub fn in_component(self, component: &'static str) -> Self {
        Self::Component {
            component,
            source: Box::new(self),
        }
    }

    /// The innermost error, with component attribution stripped.
    pub fn root(&self) -> &Self {
        match self {
            Self::Component { source, .. } => source.root(),
            other => other,
        }
    }

    /// Name of the component that failed, if attributed.
    pub fn component(&self) -> Option<&'static str> {
        match self {
            Self::Component { component, .. } => Some(*component),
            _ => None,
        }
    }

    /// Whether the dispatcher should retry after a delay. API responses
    /// count only for conflicts, throttling and server errors; transport
    /// failures always do.
    pub fn is_transient(&self) -> bool {
        match self.root() {
            Self::Conflict { .. } | Self::Transient { .. } => true,
            Self::Kube(kube::Error::Api(response)) => is_retryable_status(response.code),
            Self::Kube(_) => true,
            _ => false,
        }
    }

    /// Whether retrying without a spec change is pointless.
    pub fn is_fatal(&self) -> bool {
        !self.is_transient()
    }
}

/// HTTP statuses worth retrying unchanged: 409, 429 and 5xx.
pub const fn is_retryable_status(code: u16) -> bool {
    matches!(code, 409 | 429 | 500..=599)
}
