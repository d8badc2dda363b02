//! In-memory fixture store for harness tests.

use std::collections::HashMap;

use srt_core::{HarnessError, HarnessResult, OperationKey};
use srt_harness::{Baseline, FixtureStore};

/// Fixture store holding request arrays and baselines in memory.
///
/// Built once with the builder methods, then handed to the harness behind an
/// `Arc`. Operations never registered report as missing, same as an absent
/// fixture file on disk would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    requests: HashMap<OperationKey, Vec<u8>>,
    baselines: HashMap<OperationKey, HashMap<String, Baseline>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the recorded request array for an operation.
    #[must_use]
    pub fn with_requests(mut self, key: OperationKey, raw: &str) -> Self {
        self.requests.insert(key, raw.as_bytes().to_vec());
        self
    }

    /// Register a baseline for one container of an operation.
    #[must_use]
    pub fn with_baseline(
        mut self,
        key: OperationKey,
        container_id: &str,
        baseline: Baseline,
    ) -> Self {
        self.baselines
            .entry(key)
            .or_default()
            .insert(container_id.to_owned(), baseline);
        self
    }
}

impl FixtureStore for MemoryStore {
    fn get_requests(&self, key: &OperationKey) -> HarnessResult<Vec<u8>> {
        self.requests.get(key).cloned().ok_or_else(|| HarnessError::Missing {
            key: key.clone(),
            what: "requests".to_owned(),
        })
    }

    fn get_baseline(&self, key: &OperationKey, container_id: &str) -> HarnessResult<Baseline> {
        self.baselines
            .get(key)
            .and_then(|map| map.get(container_id))
            .cloned()
            .ok_or_else(|| HarnessError::Missing {
                key: key.clone(),
                what: format!("baseline for container {container_id:?}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key() -> OperationKey {
        OperationKey::new("gateway", "GetGateway")
    }

    #[test]
    fn registered_fixtures_round_trip() {
        let store = MemoryStore::new()
            .with_requests(key(), r#"[]"#)
            .with_baseline(key(), "c1", Baseline::of_response(json!({"Id": "g1"})));

        assert_eq!(store.get_requests(&key()).unwrap(), b"[]");
        let baseline = store.get_baseline(&key(), "c1").unwrap();
        assert_eq!(baseline.response, Some(json!({"Id": "g1"})));
    }

    #[test]
    fn absent_operation_reports_missing() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get_requests(&key()),
            Err(HarnessError::Missing { .. })
        ));
        assert!(matches!(
            store.get_baseline(&key(), "c1"),
            Err(HarnessError::Missing { .. })
        ));
    }
}
