//! Prometheus rule pruning
//!
//! Charts such as kube-prometheus-stack ship rule groups MetalK8s does not
//! want. A [`DropSet`] names the `alert` / `record` rules to remove per
//! group; groups emptied by the removal disappear, and a `PrometheusRule`
//! left without any group is not emitted at all.

use chart2sls_core::document::{self, Document};
use chart2sls_core::DropSet;
use serde_yaml::Value;
use std::collections::BTreeSet;

/// Keys identifying a rule inside its group
const RULE_ID_KEYS: [&str; 2] = ["alert", "record"];

/// Outcome of pruning one document
#[derive(Debug, Clone, PartialEq)]
pub enum Pruned {
    /// Nothing matched the drop-set; the document is returned as-is
    Unchanged(Document),
    /// Some rules were removed and at least one group survives
    Updated { document: Document, removed: usize },
    /// Every rule was removed; the document must not be emitted
    Suppressed { removed: usize },
}

impl Pruned {
    /// The document to emit, if any
    pub fn into_document(self) -> Option<Document> {
        match self {
            Pruned::Unchanged(document) | Pruned::Updated { document, .. } => Some(document),
            Pruned::Suppressed { .. } => None,
        }
    }

    /// Number of rules removed
    pub fn removed(&self) -> usize {
        match self {
            Pruned::Unchanged(_) => 0,
            Pruned::Updated { removed, .. } | Pruned::Suppressed { removed } => *removed,
        }
    }
}

/// Remove the rules named in `drop_set` from `spec.groups`
///
/// A document without groups, or whose groups have no drop entry hitting
/// one of their rules, is [`Pruned::Unchanged`]. That case is distinct
/// from [`Pruned::Suppressed`], which only happens once rules were removed.
///
/// Groups that had no rules to begin with follow the outcome: they are
/// kept as-is when the document is `Unchanged`, and omitted along with
/// emptied groups as soon as any rule is removed.
pub fn prune_rules(mut doc: Document, drop_set: &DropSet) -> Pruned {
    let removed = count_dropped(&doc, drop_set);
    if removed == 0 {
        return Pruned::Unchanged(doc);
    }

    let Some(groups) = groups_mut(&mut doc) else {
        return Pruned::Unchanged(doc);
    };

    let kept: Vec<Value> = std::mem::take(groups)
        .into_iter()
        .filter_map(|group| prune_group(group, drop_set))
        .collect();

    if kept.is_empty() {
        tracing::debug!(
            document = %document::describe(&doc),
            removed,
            "all rule groups pruned, suppressing document"
        );
        return Pruned::Suppressed { removed };
    }

    *groups = kept;
    tracing::debug!(document = %document::describe(&doc), removed, "pruned rules");
    Pruned::Updated {
        document: doc,
        removed,
    }
}

/// Number of rules in `doc` that `drop_set` would remove
pub fn count_dropped(doc: &Document, drop_set: &DropSet) -> usize {
    let Some(groups) = groups(doc) else {
        return 0;
    };

    groups
        .iter()
        .map(|group| {
            let Some(to_drop) = group_drops(group, drop_set) else {
                return 0;
            };
            rules(group)
                .map(|rules| rules.iter().filter(|rule| is_dropped(rule, to_drop)).count())
                .unwrap_or(0)
        })
        .sum()
}

fn groups(doc: &Document) -> Option<&Vec<Value>> {
    doc.get("spec")?.get("groups")?.as_sequence()
}

fn groups_mut(doc: &mut Document) -> Option<&mut Vec<Value>> {
    doc.get_mut("spec")?.get_mut("groups")?.as_sequence_mut()
}

fn rules(group: &Value) -> Option<&Vec<Value>> {
    group.get("rules")?.as_sequence()
}

fn group_drops<'a>(group: &Value, drop_set: &'a DropSet) -> Option<&'a BTreeSet<String>> {
    let name = group.get("name")?.as_str()?;
    drop_set.rules_for(name)
}

/// Filter one group, returning it only if a rule survives
fn prune_group(mut group: Value, drop_set: &DropSet) -> Option<Value> {
    let to_drop = group_drops(&group, drop_set);

    let surviving = match group.get_mut("rules").and_then(Value::as_sequence_mut) {
        Some(rules) => {
            if let Some(to_drop) = to_drop {
                rules.retain(|rule| !is_dropped(rule, to_drop));
            }
            rules.len()
        }
        None => 0,
    };

    (surviving > 0).then_some(group)
}

fn is_dropped(rule: &Value, to_drop: &BTreeSet<String>) -> bool {
    RULE_ID_KEYS.iter().any(|key| {
        rule.get(*key)
            .and_then(Value::as_str)
            .is_some_and(|id| to_drop.contains(id))
    })
}
