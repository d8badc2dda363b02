//! Static checks over a fixture tree.
//!
//! Used by the `srt-fixlint` binary to catch malformed recordings before a
//! replay run wastes service calls on them: request files must parse as
//! arrays of `{ ContainerId, Request }`, every container must have a
//! baseline, and baselines must not be vacuous.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Baseline;

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Blocks a replay run.
    Error,
    /// Suspicious but runnable (e.g. a baseline with no matching request).
    Warning,
}

/// One lint finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// `service/operation` the finding belongs to.
    pub operation: String,
    /// Severity.
    pub severity: Severity,
    /// Stable machine-readable kind (for CI parsing).
    pub kind: String,
    /// Human-readable detail.
    pub message: String,
}

impl Finding {
    fn error(operation: &str, kind: &str, message: impl Into<String>) -> Self {
        Self {
            operation: operation.to_owned(),
            severity: Severity::Error,
            kind: kind.to_owned(),
            message: message.into(),
        }
    }

    fn warning(operation: &str, kind: &str, message: impl Into<String>) -> Self {
        Self {
            operation: operation.to_owned(),
            severity: Severity::Warning,
            kind: kind.to_owned(),
            message: message.into(),
        }
    }
}

/// Lint report for a fixture tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintReport {
    /// Operations inspected.
    pub operations: usize,
    /// All findings, errors first is not guaranteed; filter by severity.
    pub findings: Vec<Finding>,
}

impl LintReport {
    /// Whether any error-severity finding exists.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.findings
            .iter()
            .any(|f| f.severity == Severity::Error)
    }

    /// Whether any finding exists at all.
    #[must_use]
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }
}

/// Lint every `<service>/<operation>.requests.json` under `root`.
///
/// I/O problems with the root itself surface as `Err`; per-operation
/// problems become findings.
pub fn lint_tree(root: &Path) -> std::io::Result<LintReport> {
    let mut findings = Vec::new();
    let mut operations = 0usize;

    for service_entry in std::fs::read_dir(root)? {
        let service_dir = service_entry?.path();
        if !service_dir.is_dir() {
            continue;
        }
        let service = service_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        for file_entry in std::fs::read_dir(&service_dir)? {
            let path = file_entry?.path();
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            let Some(op) = name.strip_suffix(".requests.json") else {
                continue;
            };
            operations += 1;
            let op_id = format!("{service}/{op}");
            lint_operation(&path, &service_dir, op, &op_id, &mut findings);
        }
    }

    Ok(LintReport {
        operations,
        findings,
    })
}

fn lint_operation(
    requests_path: &Path,
    service_dir: &Path,
    op: &str,
    op_id: &str,
    findings: &mut Vec<Finding>,
) {
    let container_ids = match read_container_ids(requests_path, op_id, findings) {
        Some(ids) => ids,
        None => return,
    };

    let baselines_path = service_dir.join(format!("{op}.baselines.json"));
    let baselines = match std::fs::read(&baselines_path) {
        Err(e) => {
            findings.push(Finding::error(
                op_id,
                "baselines_missing",
                format!("cannot read {}: {e}", baselines_path.display()),
            ));
            return;
        }
        Ok(bytes) => match serde_json::from_slice::<std::collections::HashMap<String, Baseline>>(
            &bytes,
        ) {
            Err(e) => {
                findings.push(Finding::error(
                    op_id,
                    "baselines_malformed",
                    format!("{}: {e}", baselines_path.display()),
                ));
                return;
            }
            Ok(map) => map,
        },
    };

    for id in &container_ids {
        match baselines.get(id) {
            None => findings.push(Finding::error(
                op_id,
                "baseline_absent",
                format!("container {id:?} has no baseline"),
            )),
            Some(b) if b.response.is_none() && b.responses.is_none() && b.error.is_none() => {
                findings.push(Finding::error(
                    op_id,
                    "baseline_vacuous",
                    format!("baseline for {id:?} has neither response nor error"),
                ));
            }
            Some(_) => {}
        }
    }
    for id in baselines.keys() {
        if !container_ids.contains(id) {
            findings.push(Finding::warning(
                op_id,
                "baseline_orphaned",
                format!("baseline {id:?} has no request record"),
            ));
        }
    }
}

fn read_container_ids(
    path: &Path,
    op_id: &str,
    findings: &mut Vec<Finding>,
) -> Option<HashSet<String>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            findings.push(Finding::error(
                op_id,
                "requests_unreadable",
                format!("{}: {e}", path.display()),
            ));
            return None;
        }
    };
    let records: Vec<Value> = match serde_json::from_slice(&bytes) {
        Ok(r) => r,
        Err(e) => {
            findings.push(Finding::error(
                op_id,
                "requests_malformed",
                format!("not a JSON array: {e}"),
            ));
            return None;
        }
    };

    let mut ids = HashSet::new();
    for (i, record) in records.iter().enumerate() {
        let obj = record.as_object();
        let cid = obj.and_then(|o| o.get("ContainerId")).and_then(Value::as_str);
        match cid {
            None => findings.push(Finding::error(
                op_id,
                "container_id_missing",
                format!("record [{i}] has no string ContainerId"),
            )),
            Some(id) => {
                if !ids.insert(id.to_owned()) {
                    findings.push(Finding::warning(
                        op_id,
                        "container_id_duplicate",
                        format!("container {id:?} appears more than once"),
                    ));
                }
            }
        }
        if !obj
            .and_then(|o| o.get("Request"))
            .is_some_and(Value::is_object)
        {
            findings.push(Finding::error(
                op_id,
                "request_missing",
                format!("record [{i}] has no Request object"),
            ));
        }
    }
    Some(ids)
}
