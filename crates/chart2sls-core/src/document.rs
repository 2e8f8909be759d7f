//! Accessors over rendered manifests
//!
//! A document is kept as a plain [`serde_yaml::Value`]: charts render
//! arbitrary CRDs, so nothing beyond `kind` and `metadata` is typed.

use serde_yaml::Value;

use crate::labels::helm;

/// One document of a manifest stream
pub type Document = Value;

/// `kind` of a manifest, if it is a string
pub fn kind(doc: &Document) -> Option<&str> {
    doc.get("kind").and_then(Value::as_str)
}

/// `metadata.name` of a manifest, if it is a string
pub fn name(doc: &Document) -> Option<&str> {
    doc.get("metadata")?.get("name")?.as_str()
}

/// `metadata.annotations[key]`, if it is a string
pub fn annotation<'a>(doc: &'a Document, key: &str) -> Option<&'a str> {
    doc.get("metadata")?.get("annotations")?.get(key)?.as_str()
}

/// Whether the document carries no content at all
///
/// Covers the bare `---` separators Helm emits around skipped templates.
pub fn is_empty(doc: &Document) -> bool {
    match doc {
        Value::Null => true,
        Value::Mapping(map) => map.is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Whether the document is a `helm test` hook
pub fn is_test_hook(doc: &Document) -> bool {
    annotation(doc, helm::HOOK) == Some(helm::TEST_SUCCESS)
}

/// Short `Kind/name` label for log lines
pub fn describe(doc: &Document) -> String {
    format!(
        "{}/{}",
        kind(doc).unwrap_or("<no kind>"),
        name(doc).unwrap_or("<no name>")
    )
}
