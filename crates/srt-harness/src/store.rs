//! Fixture storage: recorded request payloads and response baselines.
//!
//! A fixture set is keyed by (service, operation). The request side is a JSON
//! array of `{ ContainerId, Request }` objects; the baseline side maps
//! container ids to recorded expectations. Stores are shared by reference
//! across parallel operation runs and must be safe for concurrent reads.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use srt_core::{HarnessError, HarnessResult, InvokeError, OperationKey};

/// Recorded expectation for one container.
///
/// Exactly one of `response`, `responses`, or `error` is meaningful:
/// a single payload for unary operations, a page sequence for list
/// operations, or an expected invoke error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Baseline {
    /// Expected payload for a unary operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,

    /// Expected page sequence for a list operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<Vec<serde_json::Value>>,

    /// Expected invoke error, when the recorded call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ExpectedError>,

    /// Volatile fields excluded from comparison, in addition to the
    /// operation-level allowlist.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,
}

impl Baseline {
    /// Baseline expecting a single payload.
    #[must_use]
    pub fn of_response(response: serde_json::Value) -> Self {
        Self {
            response: Some(response),
            ..Self::default()
        }
    }

    /// Baseline expecting a page sequence.
    #[must_use]
    pub fn of_responses(responses: Vec<serde_json::Value>) -> Self {
        Self {
            responses: Some(responses),
            ..Self::default()
        }
    }

    /// Baseline expecting an invoke error.
    #[must_use]
    pub fn of_error(error: ExpectedError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Add container-level ignored fields.
    #[must_use]
    pub fn ignoring<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(fields.into_iter().map(Into::into));
        self
    }
}

/// Recorded invoke-error expectation. Unset parts match anything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedError {
    /// Expected HTTP status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Expected service error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Substring expected in the error display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_contains: Option<String>,
}

impl ExpectedError {
    /// Expectation on status and code.
    pub fn with_status(status: u16, code: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            code: Some(code.into()),
            message_contains: None,
        }
    }

    /// Whether a live invoke error satisfies this expectation.
    #[must_use]
    pub fn matches(&self, live: &InvokeError) -> bool {
        if let Some(want) = self.status {
            if live.status() != Some(want) {
                return false;
            }
        }
        if let Some(want) = &self.code {
            match live {
                InvokeError::Service { code, .. } if code == want => {}
                _ => return false,
            }
        }
        if let Some(want) = &self.message_contains {
            if !live.to_string().contains(want.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Source of recorded fixtures for operation runs.
pub trait FixtureStore: Send + Sync {
    /// Raw bytes of the recorded request array for an operation.
    fn get_requests(&self, key: &OperationKey) -> HarnessResult<Vec<u8>>;

    /// Recorded baseline for one container of an operation.
    fn get_baseline(&self, key: &OperationKey, container_id: &str) -> HarnessResult<Baseline>;
}

type BaselineMap = HashMap<String, Baseline>;

/// Directory-backed fixture store.
///
/// Layout: `<root>/<service>/<operation>.requests.json` and
/// `<root>/<service>/<operation>.baselines.json` (a JSON object keyed by
/// container id). Parsed baseline maps are cached per operation; reads hit
/// the cache under a shared lock, cold loads take the write lock once.
pub struct DirFixtureStore {
    root: PathBuf,
    baselines: RwLock<HashMap<OperationKey, Arc<BaselineMap>>>,
}

impl DirFixtureStore {
    /// Store rooted at a fixture directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            baselines: RwLock::new(HashMap::new()),
        }
    }

    fn requests_path(&self, key: &OperationKey) -> PathBuf {
        self.root
            .join(&key.service)
            .join(format!("{}.requests.json", key.operation))
    }

    fn baselines_path(&self, key: &OperationKey) -> PathBuf {
        self.root
            .join(&key.service)
            .join(format!("{}.baselines.json", key.operation))
    }

    fn load_baselines(&self, key: &OperationKey) -> HarnessResult<Arc<BaselineMap>> {
        if let Some(cached) = self.baselines.read().get(key) {
            return Ok(Arc::clone(cached));
        }
        let path = self.baselines_path(key);
        let bytes = std::fs::read(&path).map_err(|e| HarnessError::Missing {
            key: key.clone(),
            what: format!("baselines at {}: {e}", path.display()),
        })?;
        let map: BaselineMap =
            serde_json::from_slice(&bytes).map_err(|e| HarnessError::Validator {
                container_id: String::new(),
                message: format!("corrupt baselines at {}: {e}", path.display()),
            })?;
        let map = Arc::new(map);
        self.baselines
            .write()
            .entry(key.clone())
            .or_insert_with(|| Arc::clone(&map));
        Ok(map)
    }
}

impl FixtureStore for DirFixtureStore {
    fn get_requests(&self, key: &OperationKey) -> HarnessResult<Vec<u8>> {
        let path = self.requests_path(key);
        std::fs::read(&path).map_err(|e| HarnessError::Missing {
            key: key.clone(),
            what: format!("requests at {}: {e}", path.display()),
        })
    }

    fn get_baseline(&self, key: &OperationKey, container_id: &str) -> HarnessResult<Baseline> {
        let map = self.load_baselines(key)?;
        map.get(container_id).cloned().ok_or_else(|| {
            HarnessError::Missing {
                key: key.clone(),
                what: format!("baseline for container {container_id:?}"),
            }
        })
    }
}
