//! Document filter
//!
//! `keep` decides whether a rendered document enters the rewrite at all;
//! `remove` decides whether a rewritten document is left out of the output.

use chart2sls_core::document::{self, Document};
use chart2sls_core::ExclusionList;

/// Whether a document should be rewritten and emitted
///
/// Empty documents and `helm test` hooks are dropped.
pub fn keep(doc: &Document) -> bool {
    if document::is_empty(doc) {
        return false;
    }

    if document::is_test_hook(doc) {
        tracing::debug!(document = %document::describe(doc), "dropping test hook");
        return false;
    }

    true
}

/// Whether a document is named in the exclusion list
///
/// Matching uses `kind` and `metadata.name`, which the rewrite never changes.
pub fn remove(doc: &Document, exclusions: &ExclusionList) -> bool {
    match exclusions.find(doc) {
        Some(resource) => {
            tracing::debug!(%resource, "removing excluded manifest");
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart2sls_core::ResourceRef;
    use serde_yaml::Value;

    fn doc(yaml: &str) -> Document {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_keep_regular_document() {
        assert!(keep(&doc("kind: Service\nmetadata:\n  name: web\n")));
    }

    #[test]
    fn test_keep_drops_empty() {
        assert!(!keep(&Value::Null));
        assert!(!keep(&doc("{}")));
    }

    #[test]
    fn test_keep_drops_test_hooks() {
        let hook = doc(
            r#"
kind: Pod
metadata:
  name: grafana-test
  annotations:
    helm.sh/hook: test-success
"#,
        );
        assert!(!keep(&hook));
    }

    #[test]
    fn test_keep_other_hooks() {
        let hook = doc(
            r#"
kind: Job
metadata:
  name: migrate
  annotations:
    helm.sh/hook: pre-install
"#,
        );
        assert!(keep(&hook));
    }

    #[test]
    fn test_remove_excluded_pair_only() {
        let exclusions: ExclusionList = [ResourceRef::new("ConfigMap", "dashboards")]
            .into_iter()
            .collect();

        let excluded = doc("kind: ConfigMap\nmetadata:\n  name: dashboards\n");
        let same_kind = doc("kind: ConfigMap\nmetadata:\n  name: settings\n");
        let same_name = doc("kind: Secret\nmetadata:\n  name: dashboards\n");

        assert!(remove(&excluded, &exclusions));
        assert!(!remove(&same_kind, &exclusions));
        assert!(!remove(&same_name, &exclusions));
    }

    #[test]
    fn test_remove_with_empty_list() {
        let d = doc("kind: ConfigMap\nmetadata:\n  name: dashboards\n");
        assert!(!remove(&d, &ExclusionList::new()));
    }
}
