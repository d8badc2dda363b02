//! Response validation against recorded baselines.
//!
//! The validator's verdict is a message string: empty means the live result
//! matched the baseline; non-empty is a human-readable mismatch description.
//! Validator-internal failures (unreadable baseline and the like) are real
//! errors and abort the request instead.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use srt_core::{HarnessError, HarnessResult, InvokeError, OperationKey};

use crate::store::{Baseline, FixtureStore};

/// Most mismatch paths reported before truncating.
const MAX_DIFFS: usize = 10;

/// Compares live responses against the recorded baseline for a container.
pub struct ResponseValidator {
    store: Arc<dyn FixtureStore>,
    key: OperationKey,
    ignored: BTreeSet<String>,
}

impl ResponseValidator {
    /// Validator for one operation.
    pub fn new(store: Arc<dyn FixtureStore>, key: OperationKey) -> Self {
        Self {
            store,
            key,
            ignored: BTreeSet::new(),
        }
    }

    /// Add operation-level ignored fields (request ids, timestamps, other
    /// server-generated noise). Applied on both sides of the comparison.
    #[must_use]
    pub fn ignore_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Validate a live value (single response, list of responses, or nothing
    /// when the call failed) against the container's baseline.
    ///
    /// Returns the mismatch message, empty on success. `Err` is reserved for
    /// validator-internal failures.
    pub fn validate<Req, Live>(
        &self,
        container_id: &str,
        request: &Req,
        live: &Live,
        invoke_error: Option<&InvokeError>,
    ) -> HarnessResult<String>
    where
        Req: Serialize,
        Live: Serialize,
    {
        let baseline = self.store.get_baseline(&self.key, container_id)?;

        if let Some(err) = invoke_error {
            return Ok(self.check_error(container_id, request, &baseline, err));
        }
        if let Some(expected) = &baseline.error {
            let detail = serde_json::to_string(expected).unwrap_or_default();
            return Ok(format!(
                "container {container_id}: expected invoke error {detail} but the call succeeded"
            ));
        }

        let expected = match (&baseline.responses, &baseline.response) {
            (Some(pages), _) => Value::Array(pages.clone()),
            (None, Some(single)) => single.clone(),
            (None, None) => {
                return Err(HarnessError::Validator {
                    container_id: container_id.to_owned(),
                    message: "baseline carries neither a response nor an expected error".into(),
                })
            }
        };

        let live = serde_json::to_value(live).map_err(|e| HarnessError::Validator {
            container_id: container_id.to_owned(),
            message: format!("live value is not serializable: {e}"),
        })?;

        let ignored = self.combined_ignores(&baseline);
        let mut expected = expected;
        let mut live = live;
        strip_ignored(&mut expected, &ignored);
        strip_ignored(&mut live, &ignored);

        let mut diffs = Vec::new();
        diff_values("$", &expected, &live, &mut diffs);
        if diffs.is_empty() {
            return Ok(String::new());
        }

        tracing::debug!(
            container_id,
            request = %serde_json::to_string(request).unwrap_or_default(),
            mismatches = diffs.len(),
            "response diverged from baseline"
        );
        let shown = diffs.len().min(MAX_DIFFS);
        let mut message = format!(
            "container {container_id}: {} mismatch(es): {}",
            diffs.len(),
            diffs[..shown].join("; ")
        );
        if diffs.len() > shown {
            message.push_str("; ...");
        }
        Ok(message)
    }

    fn check_error<Req: Serialize>(
        &self,
        container_id: &str,
        request: &Req,
        baseline: &Baseline,
        live: &InvokeError,
    ) -> String {
        match &baseline.error {
            Some(expected) if expected.matches(live) => String::new(),
            Some(expected) => {
                let detail = serde_json::to_string(expected).unwrap_or_default();
                format!(
                    "container {container_id}: invoke error mismatch: expected {detail}, got {live}"
                )
            }
            None => {
                tracing::debug!(
                    container_id,
                    request = %serde_json::to_string(request).unwrap_or_default(),
                    error = %live,
                    "unexpected invoke error"
                );
                format!("container {container_id}: unexpected invoke error: {live}")
            }
        }
    }

    fn combined_ignores(&self, baseline: &Baseline) -> BTreeSet<String> {
        let mut all = self.ignored.clone();
        all.extend(baseline.ignore.iter().cloned());
        all
    }
}

/// Remove every occurrence of the named fields, at any depth, on either side.
fn strip_ignored(value: &mut Value, ignored: &BTreeSet<String>) {
    match value {
        Value::Object(fields) => {
            fields.retain(|name, _| !ignored.contains(name));
            for child in fields.values_mut() {
                strip_ignored(child, ignored);
            }
        }
        Value::Array(items) => {
            for item in items {
                strip_ignored(item, ignored);
            }
        }
        _ => {}
    }
}

/// Structural comparison producing `path: expected X, got Y` entries.
fn diff_values(path: &str, expected: &Value, live: &Value, out: &mut Vec<String>) {
    if out.len() > MAX_DIFFS {
        return;
    }
    match (expected, live) {
        (Value::Object(e), Value::Object(l)) => {
            for (name, ev) in e {
                match l.get(name) {
                    Some(lv) => diff_values(&format!("{path}.{name}"), ev, lv, out),
                    None => out.push(format!("{path}.{name}: expected {ev}, got nothing")),
                }
            }
            for (name, lv) in l {
                if !e.contains_key(name) {
                    out.push(format!("{path}.{name}: expected nothing, got {lv}"));
                }
            }
        }
        (Value::Array(e), Value::Array(l)) => {
            if e.len() != l.len() {
                out.push(format!(
                    "{path}: expected {} element(s), got {}",
                    e.len(),
                    l.len()
                ));
                return;
            }
            for (i, (ev, lv)) in e.iter().zip(l).enumerate() {
                diff_values(&format!("{path}[{i}]"), ev, lv, out);
            }
        }
        (e, l) if e == l => {}
        (e, l) => out.push(format!("{path}: expected {e}, got {l}")),
    }
}
