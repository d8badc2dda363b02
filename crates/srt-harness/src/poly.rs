//! Polymorphic request decoding.
//!
//! Recorded fixtures are loosely-typed JSON; request schemas may contain
//! sum-typed sub-objects discriminated by a named field (e.g. a `source`
//! field selecting between two detail shapes). The typed request types model
//! those as `#[serde(tag = ...)]` enums; this module carries the data-driven
//! registration table that maps observed discriminator values to canonical
//! variant tags, so fixtures survive round-trip into typed requests and
//! unknown values fail with a precise error instead of a generic serde one.
//!
//! Decoding is deterministic: registration tables use ordered maps and the
//! walk visits fields in the order the fixture recorded them.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;
use srt_core::{HarnessError, HarnessResult};

/// Registration for one sum-typed holder field.
#[derive(Debug, Clone)]
pub struct DiscriminatorSpec {
    /// Field inside the holder object whose value selects the variant.
    pub discriminator: String,
    // discriminator value -> canonical serde tag
    variants: BTreeMap<String, String>,
}

impl DiscriminatorSpec {
    /// Spec with the given discriminator field and no variants.
    pub fn new(discriminator: impl Into<String>) -> Self {
        Self {
            discriminator: discriminator.into(),
            variants: BTreeMap::new(),
        }
    }

    /// Register a discriminator value mapping to a canonical variant tag.
    /// Value and tag coincide for most schemas.
    #[must_use]
    pub fn with_variant(mut self, value: impl Into<String>, tag: impl Into<String>) -> Self {
        self.variants.insert(value.into(), tag.into());
        self
    }

    /// Canonical tag for a discriminator value, if registered.
    #[must_use]
    pub fn variant_tag(&self, value: &str) -> Option<&str> {
        self.variants.get(value).map(String::as_str)
    }
}

/// Table of holder-field registrations for one operation. Immutable once
/// built and shared freely across requests.
#[derive(Debug, Clone, Default)]
pub struct PolymorphicMap {
    holders: BTreeMap<String, DiscriminatorSpec>,
}

impl PolymorphicMap {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a holder field.
    #[must_use]
    pub fn register(mut self, holder: impl Into<String>, spec: DiscriminatorSpec) -> Self {
        self.holders.insert(holder.into(), spec);
        self
    }

    /// Registration for a holder field, if any.
    #[must_use]
    pub fn holder(&self, field: &str) -> Option<&DiscriminatorSpec> {
        self.holders.get(field)
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }
}

/// One decoded fixture entry. The container id is preserved even when the
/// typed decode failed, so verdicts can still name the container.
#[derive(Debug)]
pub struct DecodedRequest<T> {
    /// Baseline join key; empty when the record had no usable `ContainerId`.
    pub container_id: String,
    /// Typed request, or the per-record decode failure.
    pub request: HarnessResult<T>,
}

/// Decode a recorded request array into typed entries.
///
/// The outer `Err` covers input that is not a JSON array of objects; each
/// element then decodes independently so one malformed record cannot poison
/// its neighbors.
pub fn decode_requests<T: DeserializeOwned>(
    raw: &[u8],
    map: Option<&PolymorphicMap>,
) -> HarnessResult<Vec<DecodedRequest<T>>> {
    let records: Vec<Value> = serde_json::from_slice(raw)
        .map_err(|e| HarnessError::shape("$", format!("fixture is not a JSON array: {e}")))?;

    let decoded = records
        .iter()
        .enumerate()
        .map(|(i, record)| decode_record(i, record, map))
        .collect();
    Ok(decoded)
}

fn decode_record<T: DeserializeOwned>(
    index: usize,
    record: &Value,
    map: Option<&PolymorphicMap>,
) -> DecodedRequest<T> {
    let Some(obj) = record.as_object() else {
        return DecodedRequest {
            container_id: String::new(),
            request: Err(HarnessError::shape(
                format!("[{index}]"),
                "expected an object",
            )),
        };
    };

    let container_id = obj
        .get("ContainerId")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let Some(container_id) = container_id else {
        return DecodedRequest {
            container_id: String::new(),
            request: Err(HarnessError::shape(
                format!("[{index}].ContainerId"),
                "expected a string",
            )),
        };
    };

    let request = match obj.get("Request") {
        Some(req @ Value::Object(_)) => decode_typed(index, req.clone(), map),
        _ => Err(HarnessError::shape(
            format!("[{index}].Request"),
            "expected an object",
        )),
    };

    DecodedRequest {
        container_id,
        request,
    }
}

fn decode_typed<T: DeserializeOwned>(
    index: usize,
    mut request: Value,
    map: Option<&PolymorphicMap>,
) -> HarnessResult<T> {
    if let Some(map) = map.filter(|m| !m.is_empty()) {
        let mut path = format!("[{index}].Request");
        resolve_holders(&mut request, map, &mut path)?;
    }
    serde_json::from_value(request)
        .map_err(|e| HarnessError::shape(format!("[{index}].Request"), e.to_string()))
}

/// Walk the request object and canonicalize every registered holder field.
///
/// Holder fields may sit at any depth (a compute-details holder nests inside
/// an instance-configuration holder). Absent holders are fine; a present
/// holder must be an object carrying its discriminator field with a
/// registered value.
fn resolve_holders(
    value: &mut Value,
    map: &PolymorphicMap,
    path: &mut String,
) -> HarnessResult<()> {
    match value {
        Value::Object(fields) => {
            for (name, child) in fields.iter_mut() {
                let len = path.len();
                path.push('.');
                path.push_str(name);

                if let Some(spec) = map.holder(name) {
                    resolve_one_holder(name, child, spec, path)?;
                }
                resolve_holders(child, map, path)?;

                path.truncate(len);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                let len = path.len();
                path.push_str(&format!("[{i}]"));
                resolve_holders(item, map, path)?;
                path.truncate(len);
            }
        }
        _ => {}
    }
    Ok(())
}

fn resolve_one_holder(
    holder: &str,
    value: &mut Value,
    spec: &DiscriminatorSpec,
    path: &str,
) -> HarnessResult<()> {
    let Some(obj) = value.as_object_mut() else {
        return Err(HarnessError::shape(path, "holder field must be an object"));
    };
    let Some(observed) = obj.get(&spec.discriminator).and_then(Value::as_str) else {
        return Err(HarnessError::shape(
            format!("{path}.{}", spec.discriminator),
            "missing or non-string discriminator",
        ));
    };
    let Some(tag) = spec.variant_tag(observed) else {
        return Err(HarnessError::UnknownVariant {
            holder: holder.to_owned(),
            value: observed.to_owned(),
        });
    };
    obj.insert(spec.discriminator.clone(), Value::String(tag.to_owned()));
    Ok(())
}
