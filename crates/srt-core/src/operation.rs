//! Operation identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one API call on one service, e.g. `core/ListGateways`.
///
/// Keys are case-sensitive short identifiers and never change after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationKey {
    /// Service identifier, e.g. `core`.
    pub service: String,
    /// Operation identifier, e.g. `GetGateway`.
    pub operation: String,
}

impl OperationKey {
    /// Build a key from service and operation identifiers.
    pub fn new(service: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            operation: operation.into(),
        }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.operation)
    }
}
