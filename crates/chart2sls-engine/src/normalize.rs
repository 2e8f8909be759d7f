//! Metadata normalization
//!
//! [`normalize`] is a structural fold over a document:
//!
//! - mappings owned by Tiller (`heritage: Tiller` or
//!   `app.kubernetes.io/managed-by: Tiller`) get the canonical
//!   `app.kubernetes.io/*` labels and are handed over to Salt,
//! - multiline strings lose their blank lines so they serialize as clean
//!   literal blocks,
//! - everything else is rebuilt unchanged.
//!
//! [`fixup_metadata`] injects the target namespace at the top level only.

use chart2sls_core::document::{self, Document};
use chart2sls_core::labels::{canonical, kind, legacy, owner};
use serde_yaml::{Mapping, Value};

use crate::error::{EngineError, Result};

const NAMESPACE: &str = "namespace";

/// Rewrite labels and multiline strings throughout a document
pub fn normalize(doc: Document) -> Document {
    match doc {
        Value::Mapping(map) => Value::Mapping(normalize_mapping(map)),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(normalize).collect()),
        Value::String(s) => Value::String(normalize_string(s)),
        Value::Tagged(mut tagged) => {
            tagged.value = normalize(std::mem::replace(&mut tagged.value, Value::Null));
            Value::Tagged(tagged)
        }
        scalar => scalar,
    }
}

fn normalize_mapping(mut map: Mapping) -> Mapping {
    if is_tiller_owned(&map) {
        migrate_labels(&mut map);
    }

    map.into_iter()
        .map(|(key, value)| (key, normalize(value)))
        .collect()
}

/// Whether a mapping carries the Helm v2 ownership marker
pub fn is_tiller_owned(map: &Mapping) -> bool {
    let is_tiller = |key: &str| map.get(key).and_then(Value::as_str) == Some(legacy::TILLER);
    is_tiller(legacy::HERITAGE) || is_tiller(canonical::MANAGED_BY)
}

fn migrate_labels(map: &mut Mapping) {
    copy_if_absent(map, legacy::APP, canonical::NAME);
    copy_if_absent(map, legacy::COMPONENT, canonical::COMPONENT);

    map.insert(legacy::HERITAGE.into(), owner::METALK8S.into());
    map.insert(canonical::PART_OF.into(), owner::METALK8S.into());
    map.insert(canonical::MANAGED_BY.into(), owner::SALT.into());
}

/// Copy `src` to `dest`; an existing `dest` is never overwritten
fn copy_if_absent(map: &mut Mapping, src: &str, dest: &str) {
    if map.contains_key(dest) {
        return;
    }
    if let Some(value) = map.get(src).cloned() {
        map.insert(dest.into(), value);
    }
}

/// Drop blank lines from multiline strings
pub fn normalize_string(value: String) -> String {
    if !value.contains('\n') {
        return value;
    }

    value
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Set `metadata.namespace` where the chart left it out
///
/// Only the top level is touched, plus the items of a `ConfigMapList`.
pub fn fixup_metadata(doc: &mut Document, namespace: &str) -> Result<()> {
    if doc.get("metadata").is_some_and(|metadata| !metadata.is_mapping()) {
        return Err(EngineError::malformed(
            document::describe(doc),
            "`metadata` is not a mapping",
        ));
    }

    if let Some(Value::Mapping(metadata)) = doc.get_mut("metadata") {
        if !metadata.contains_key(NAMESPACE) {
            metadata.insert(NAMESPACE.into(), namespace.into());
        }
    }

    if document::kind(doc) == Some(kind::CONFIG_MAP_LIST) {
        let Some(items) = doc.get_mut("items").and_then(Value::as_sequence_mut) else {
            return Err(EngineError::malformed(
                document::describe(doc),
                "`items` is missing or not a sequence",
            ));
        };

        for item in items.iter_mut() {
            if !item.is_mapping() {
                return Err(EngineError::malformed(
                    "ConfigMapList item",
                    "item is not a mapping",
                ));
            }
            fixup_metadata(item, namespace)?;
        }
    }

    Ok(())
}
