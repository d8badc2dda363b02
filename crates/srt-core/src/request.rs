//! Request metadata and the traits operation request types implement.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::RetryPolicy;

/// Sub-structure of every request carrying the retry-policy slot.
///
/// The slot is written exactly once, by the harness immediately before
/// invocation, and only when retries are enabled for the run. An unset slot
/// means the transport performs a single attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestMetadata {
    /// Shared retry policy for this request, if retries are enabled.
    #[serde(skip)]
    pub retry_policy: Option<Arc<RetryPolicy>>,
}

impl RequestMetadata {
    /// Whether a retry policy has been installed.
    #[must_use]
    pub const fn has_retry_policy(&self) -> bool {
        self.retry_policy.is_some()
    }
}

/// Implemented by every operation request type so the harness can reach the
/// metadata slot without knowing the concrete shape.
pub trait SdkRequest: Send {
    /// Read access to the request metadata.
    fn metadata(&self) -> &RequestMetadata;

    /// The single mutation point used for retry-policy injection.
    fn metadata_mut(&mut self) -> &mut RequestMetadata;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RetryPolicyFactory;

    #[test]
    fn metadata_defaults_to_no_policy() {
        let meta = RequestMetadata::default();
        assert!(!meta.has_retry_policy());
    }

    #[test]
    fn retry_slot_is_not_serialized() {
        let meta = RequestMetadata {
            retry_policy: Some(RetryPolicyFactory::build_test_policy()),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
