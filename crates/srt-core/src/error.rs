//! Error taxonomy for the replay harness.
//!
//! Two families exist on purpose:
//!
//! - [`HarnessError`] covers harness-side failures: missing fixtures, shape
//!   problems, client construction, validator malfunctions. These fail a
//!   request or an operation.
//! - [`InvokeError`] covers the operation call itself. Invoke errors are
//!   *validated*, not propagated: a recorded-expected error matched against a
//!   live one is a passing result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::OperationKey;

/// Harness-side failure.
#[derive(Error, Debug, Clone)]
pub enum HarnessError {
    /// Fixture or baseline for a known operation is absent.
    #[error("no recorded data for {key}: {what}")]
    Missing { key: OperationKey, what: String },

    /// A fixture record cannot be coerced to the typed request.
    #[error("fixture shape mismatch at {path}: {message}")]
    Shape { path: String, message: String },

    /// A discriminator value has no registered variant.
    #[error("unknown variant for holder {holder:?}: discriminator value {value:?}")]
    UnknownVariant { holder: String, value: String },

    /// Client construction failed; no requests are attempted.
    #[error("client build failed: {0}")]
    Build(String),

    /// The validator itself malfunctioned (corrupt baseline and the like).
    #[error("validator failure for container {container_id:?}: {message}")]
    Validator {
        container_id: String,
        message: String,
    },

    /// Capability gate lookup failed. Fatal for the run.
    #[error("capability lookup failed for {key}: {message}")]
    Lookup { key: OperationKey, message: String },

    /// A list operation exceeded the pagination safety cap.
    #[error("pagination overran the safety cap after {pages} pages")]
    PaginationOverrun { pages: usize },
}

impl HarnessError {
    /// Shape error with a fixture-index path, e.g. `[3].ContainerId`.
    pub fn shape(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Shape {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Failure of a dispatched operation call.
///
/// Serializable so expected errors can be recorded in baselines.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvokeError {
    /// Connection-level failure before any service response.
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// The service answered with an error status.
    #[error("service error {status} ({code}): {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    /// The per-attempt timeout elapsed.
    #[error("attempt timed out")]
    Timeout,

    /// The run was cancelled while the call was in flight or backing off.
    #[error("cancelled")]
    Cancelled,
}

impl InvokeError {
    /// Transport failure from any displayable cause.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Service error with status, service code, and message.
    pub fn service(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// HTTP status of a service error, if this is one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result alias for harness-side operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OperationKey;

    #[test]
    fn shape_error_names_the_path() {
        let err = HarnessError::shape("[2].ContainerId", "expected string");
        assert_eq!(
            err.to_string(),
            "fixture shape mismatch at [2].ContainerId: expected string"
        );
    }

    #[test]
    fn unknown_variant_names_holder_and_value() {
        let err = HarnessError::UnknownVariant {
            holder: "InstanceDetails".into(),
            value: "SNAPSHOT".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("InstanceDetails"));
        assert!(msg.contains("SNAPSHOT"));
    }

    #[test]
    fn invoke_error_round_trips_through_json() {
        let err = InvokeError::service(503, "ServiceUnavailable", "try later");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "service");
        let back: InvokeError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn missing_error_mentions_operation() {
        let err = HarnessError::Missing {
            key: OperationKey::new("core", "GetGateway"),
            what: "requests".into(),
        };
        assert!(err.to_string().contains("core/GetGateway"));
    }
}
