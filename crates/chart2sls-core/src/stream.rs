//! Multi-document YAML streams
//!
//! `split` turns the renderer output into documents in stream order and
//! `join` writes them back as one stream. Output is deterministic: mapping
//! keys are either sorted or kept in input order, never hashed.
//!
//! Both ends follow the loader Salt uses: a repeated mapping key keeps its
//! last value, and strings a YAML 1.1 loader would resolve to another type
//! are written single-quoted.

use std::fmt;

use serde::de::{
    self, Deserialize, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor,
};
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};

use crate::document::Document;
use crate::error::{CoreError, Result};
use crate::yaml11;

/// Separator written between two serialized documents
pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// Key ordering used when serializing mappings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOrder {
    /// Sort keys lexicographically (same layout as PyYAML's `safe_dump`)
    #[default]
    Sorted,
    /// Keep keys in the order the renderer produced them
    Preserve,
}

/// Parse a multi-document stream, keeping document order
///
/// Empty documents (bare `---`) are returned as `Value::Null`; dropping
/// them is left to the filter.
pub fn split(input: &str) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for deserializer in serde_yaml::Deserializer::from_str(input) {
        let LastWins(document) = LastWins::deserialize(deserializer)?;
        documents.push(document);
    }
    tracing::debug!(count = documents.len(), "parsed manifest stream");
    Ok(documents)
}

/// Serialize documents into a single stream
///
/// Strings containing line breaks come out as literal block scalars.
pub fn join(documents: &[Document], order: KeyOrder) -> Result<String> {
    let marker = unused_marker(documents);
    let mut out = String::new();

    for (index, document) in documents.iter().enumerate() {
        if index > 0 {
            out.push_str(DOCUMENT_SEPARATOR);
        }

        let document = match order {
            KeyOrder::Preserve => document.clone(),
            KeyOrder::Sorted => sort_keys(document),
        };

        let mut shield = QuoteShield::new(&marker);
        let document = shield.apply(document);
        let rendered = serde_yaml::to_string(&document)
            .map_err(|source| CoreError::Serialize { index, source })?;

        out.push_str(&shield.restore(rendered));
    }

    Ok(out)
}

/// Value deserialized the way PyYAML loads it: a repeated mapping key
/// replaces the earlier value instead of failing the whole stream
struct LastWins(Value);

impl<'de> Deserialize<'de> for LastWins {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(LastWinsVisitor).map(LastWins)
    }
}

struct LastWinsVisitor;

impl<'de> Visitor<'de> for LastWinsVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Value, D::Error> {
        LastWins::deserialize(deserializer).map(|LastWins(value)| value)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(LastWins(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Value, A::Error> {
        let mut mapping = Mapping::new();
        while let Some((LastWins(key), LastWins(value))) = map.next_entry()? {
            if mapping.contains_key(&key) {
                tracing::warn!(key = ?key, "duplicate mapping key, keeping the last value");
            }
            mapping.insert(key, value);
        }
        Ok(Value::Mapping(mapping))
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> std::result::Result<Value, A::Error> {
        let (tag, contents): (String, _) = data.variant()?;
        if tag.is_empty() {
            return Err(de::Error::custom("empty YAML tag"));
        }
        let LastWins(value) = contents.newtype_variant()?;
        Ok(Value::Tagged(Box::new(TaggedValue {
            tag: Tag::new(tag),
            value,
        })))
    }
}

/// Swaps YAML 1.1 implicit strings for plain placeholders before
/// serialization, then writes them back single-quoted
struct QuoteShield<'a> {
    marker: &'a str,
    quoted: Vec<String>,
}

impl<'a> QuoteShield<'a> {
    fn new(marker: &'a str) -> Self {
        Self {
            marker,
            quoted: Vec::new(),
        }
    }

    fn placeholder(&self, index: usize) -> String {
        format!("{marker}{index}{marker}", marker = self.marker)
    }

    fn apply(&mut self, value: Value) -> Value {
        match value {
            Value::String(s) if yaml11::is_implicit(&s) => {
                let placeholder = self.placeholder(self.quoted.len());
                self.quoted.push(s);
                Value::String(placeholder)
            }
            Value::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(key, value)| (self.apply(key), self.apply(value)))
                    .collect(),
            ),
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(|item| self.apply(item)).collect())
            }
            Value::Tagged(mut tagged) => {
                tagged.value = self.apply(std::mem::replace(&mut tagged.value, Value::Null));
                Value::Tagged(tagged)
            }
            other => other,
        }
    }

    fn restore(&self, mut text: String) -> String {
        for (index, original) in self.quoted.iter().enumerate() {
            text = text.replace(&self.placeholder(index), &yaml11::single_quoted(original));
        }
        text
    }
}

/// Placeholder delimiter that no string of `documents` contains
fn unused_marker(documents: &[Document]) -> String {
    let mut marker = String::from("__chart2sls_quoted__");
    while documents.iter().any(|doc| mentions(doc, &marker)) {
        marker.push('_');
    }
    marker
}

fn mentions(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.contains(needle),
        Value::Mapping(map) => map
            .iter()
            .any(|(key, value)| mentions(key, needle) || mentions(value, needle)),
        Value::Sequence(seq) => seq.iter().any(|item| mentions(item, needle)),
        Value::Tagged(tagged) => mentions(&tagged.value, needle),
        _ => false,
    }
}

/// Deep copy of `value` with every mapping sorted by key
pub fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut entries: Vec<(&Value, &Value)> = map.iter().collect();
            entries.sort_by_cached_key(|(key, _)| key_rank(key));
            Value::Mapping(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), sort_keys(value)))
                    .collect::<Mapping>(),
            )
        }
        Value::Sequence(seq) => Value::Sequence(seq.iter().map(sort_keys).collect()),
        Value::Tagged(tagged) => {
            let mut tagged = tagged.clone();
            tagged.value = sort_keys(&tagged.value);
            Value::Tagged(tagged)
        }
        other => other.clone(),
    }
}

/// String keys sort before any other key type, then by text
fn key_rank(key: &Value) -> (bool, String) {
    match key {
        Value::String(s) => (false, s.clone()),
        other => (true, serde_yaml::to_string(other).unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_preserves_order() {
        let docs = split("kind: A\n---\nkind: B\n---\nkind: C\n").unwrap();
        let kinds: Vec<_> = docs
            .iter()
            .map(|d| d.get("kind").and_then(Value::as_str).unwrap())
            .collect();
        assert_eq!(kinds, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_split_keeps_empty_documents() {
        let docs = split("---\n# Source: chart/templates/empty.yaml\n---\nkind: A\n").unwrap();
        assert_eq!(docs.last().and_then(|d| d.get("kind")), Some(&Value::from("A")));
        assert!(docs.iter().any(Value::is_null));
    }

    #[test]
    fn test_split_invalid_yaml() {
        let err = split("kind: A\n  bad: [indent\n").unwrap_err();
        assert!(matches!(err, CoreError::YamlParse(_)));
    }

    #[test]
    fn test_split_duplicate_key_keeps_last() {
        let docs = split("kind: A\nmetadata:\n  name: x\n  labels: {}\n  name: y\n").unwrap();
        assert_eq!(docs[0]["metadata"]["name"], Value::from("y"));
        let keys: Vec<_> = docs[0]["metadata"]
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["name", "labels"]);
    }

    #[test]
    fn test_split_scalars_and_tags() {
        let docs = split("a: 1\nb: -2\nc: 1.5\nd: true\ne: ~\nf: !Ref target\ng: [x, 3]\n").unwrap();
        let doc = &docs[0];
        assert_eq!(doc["a"], Value::from(1));
        assert_eq!(doc["b"], Value::from(-2));
        assert_eq!(doc["c"], Value::from(1.5));
        assert_eq!(doc["d"], Value::Bool(true));
        assert!(doc["e"].is_null());
        assert!(matches!(doc["f"], Value::Tagged(_)));
        assert_eq!(doc["g"][1], Value::from(3));
    }

    #[test]
    fn test_join_quotes_yaml11_implicit_strings() {
        let input = "data:\n  a: 'yes'\n  b: 'on'\n  c: 'off'\n  d: 'y'\n  e: 'NO'\n  f: '1:20'\n  g: '1_000'\n  h: '2001-12-14'\n  i: 'true'\n  j: plain\n";
        let docs = split(input).unwrap();
        let out = join(&docs, KeyOrder::Sorted).unwrap();
        assert_eq!(
            out,
            "data:\n  a: 'yes'\n  b: 'on'\n  c: 'off'\n  d: 'y'\n  e: 'NO'\n  f: '1:20'\n  g: '1_000'\n  h: '2001-12-14'\n  i: 'true'\n  j: plain\n"
        );
        assert_eq!(split(&out).unwrap(), docs);
    }

    #[test]
    fn test_join_quotes_keys_and_sequence_items() {
        let docs = split("'on': [a, 'off', '1:20']\n").unwrap();
        let out = join(&docs, KeyOrder::Preserve).unwrap();
        assert_eq!(out, "'on':\n- a\n- 'off'\n- '1:20'\n");
    }

    #[test]
    fn test_join_marker_in_content() {
        let docs = split("a: __chart2sls_quoted__0__chart2sls_quoted__\nb: 'on'\n").unwrap();
        let out = join(&docs, KeyOrder::Sorted).unwrap();
        assert_eq!(out, "a: __chart2sls_quoted__0__chart2sls_quoted__\nb: 'on'\n");
    }

    #[test]
    fn test_join_sorted() {
        let docs = split("b: 1\na: 2\n---\nc: 3\n").unwrap();
        let out = join(&docs, KeyOrder::Sorted).unwrap();
        assert_eq!(out, "a: 2\nb: 1\n---\nc: 3\n");
    }

    #[test]
    fn test_join_preserve() {
        let docs = split("b: 1\na: 2\n").unwrap();
        let out = join(&docs, KeyOrder::Preserve).unwrap();
        assert_eq!(out, "b: 1\na: 2\n");
    }

    #[test]
    fn test_join_sorts_nested_mappings() {
        let docs = split("spec:\n  z: 1\n  y:\n  - b: 1\n    a: 2\n").unwrap();
        let out = join(&docs, KeyOrder::Sorted).unwrap();
        assert_eq!(out, "spec:\n  y:\n  - a: 2\n    b: 1\n  z: 1\n");
    }

    #[test]
    fn test_join_empty() {
        assert_eq!(join(&[], KeyOrder::Sorted).unwrap(), "");
    }

    #[test]
    fn test_join_multiline_as_literal_block() {
        let mut map = Mapping::new();
        map.insert("script".into(), "echo a\necho b".into());
        let out = join(&[Value::Mapping(map)], KeyOrder::Sorted).unwrap();
        assert!(out.starts_with("script: |"), "got: {out}");
        assert!(out.contains("  echo a\n  echo b\n"), "got: {out}");
    }
}
