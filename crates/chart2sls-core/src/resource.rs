//! Manifest references and the exclusion list

use std::collections::BTreeSet;

use crate::document::{self, Document};

/// Reference to a manifest by kind and name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceRef {
    pub kind: String,
    pub name: String,
}

impl ResourceRef {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Whether `doc` has exactly this kind and `metadata.name`
    pub fn matches(&self, doc: &Document) -> bool {
        document::kind(doc) == Some(self.kind.as_str())
            && document::name(doc) == Some(self.name.as_str())
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Manifests to leave out of the output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList(BTreeSet<ResourceRef>);

impl ExclusionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: ResourceRef) {
        self.0.insert(resource);
    }

    /// The entry matching `doc`, if any
    pub fn find(&self, doc: &Document) -> Option<&ResourceRef> {
        self.0.iter().find(|resource| resource.matches(doc))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<ResourceRef> for ExclusionList {
    fn from_iter<I: IntoIterator<Item = ResourceRef>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> Document {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_matches_kind_and_name() {
        let r = ResourceRef::new("Deployment", "grafana");
        assert!(r.matches(&doc("kind: Deployment\nmetadata:\n  name: grafana\n")));
        assert!(!r.matches(&doc("kind: Deployment\nmetadata:\n  name: other\n")));
        assert!(!r.matches(&doc("kind: Service\nmetadata:\n  name: grafana\n")));
        assert!(!r.matches(&doc("kind: Deployment\n")));
    }

    #[test]
    fn test_exclusion_list_find() {
        let list: ExclusionList = [
            ResourceRef::new("Deployment", "grafana"),
            ResourceRef::new("ConfigMap", "dashboards"),
        ]
        .into_iter()
        .collect();

        let found = list.find(&doc("kind: ConfigMap\nmetadata:\n  name: dashboards\n"));
        assert_eq!(found, Some(&ResourceRef::new("ConfigMap", "dashboards")));
        assert!(list.find(&doc("kind: ConfigMap\nmetadata:\n  name: other\n")).is_none());
        assert_eq!(list.len(), 2);
        assert!(!list.is_empty());
        assert!(ExclusionList::new().is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(ResourceRef::new("Service", "web").to_string(), "Service/web");
    }
}
