//! Capability gating: which (service, operation) pairs may run.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use srt_core::{HarnessError, HarnessResult, OperationKey};

/// Answers whether an operation is enabled for execution.
///
/// A disabled operation produces a skip, no further work and no failure.
/// A lookup error is a misconfigured harness and fatal for the run.
pub trait CapabilityGate: Send + Sync {
    /// Whether the operation should run.
    fn is_enabled(&self, key: &OperationKey) -> HarnessResult<bool>;
}

/// Gate backed by a fixed `{ service: [operations] }` table.
#[derive(Debug, Clone, Default)]
pub struct StaticGate {
    // None means everything is enabled.
    enabled: Option<HashMap<String, HashSet<String>>>,
}

impl StaticGate {
    /// Gate that enables every operation.
    #[must_use]
    pub const fn allow_all() -> Self {
        Self { enabled: None }
    }

    /// Gate from an explicit enablement table.
    pub fn from_table<I, S, O, OS>(table: I) -> Self
    where
        I: IntoIterator<Item = (S, O)>,
        S: Into<String>,
        O: IntoIterator<Item = OS>,
        OS: Into<String>,
    {
        let enabled = table
            .into_iter()
            .map(|(svc, ops)| (svc.into(), ops.into_iter().map(Into::into).collect()))
            .collect();
        Self {
            enabled: Some(enabled),
        }
    }

    /// Gate loaded from a JSON file of shape `{ "service": ["Operation", ...] }`.
    pub fn from_file(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| HarnessError::Lookup {
            key: OperationKey::new("*", "*"),
            message: format!("cannot read gate file {}: {e}", path.display()),
        })?;
        let table: HashMap<String, HashSet<String>> =
            serde_json::from_slice(&bytes).map_err(|e| HarnessError::Lookup {
                key: OperationKey::new("*", "*"),
                message: format!("malformed gate file {}: {e}", path.display()),
            })?;
        Ok(Self {
            enabled: Some(table),
        })
    }
}

impl CapabilityGate for StaticGate {
    fn is_enabled(&self, key: &OperationKey) -> HarnessResult<bool> {
        match &self.enabled {
            None => Ok(true),
            Some(table) => Ok(table
                .get(&key.service)
                .is_some_and(|ops| ops.contains(&key.operation))),
        }
    }
}
