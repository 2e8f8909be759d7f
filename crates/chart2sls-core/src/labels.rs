//! Well-known label, annotation and kind names
//!
//! Helm v2 (Tiller) charts stamp their objects with `heritage: Tiller` and
//! the short `app` / `component` labels. MetalK8s deploys the same objects
//! through Salt, so ownership labels are rewritten to the canonical
//! `app.kubernetes.io/*` set.

/// Legacy (Helm v2) label keys
pub mod legacy {
    /// Ownership marker set by Tiller
    pub const HERITAGE: &str = "heritage";
    /// Short application name label
    pub const APP: &str = "app";
    /// Short component label
    pub const COMPONENT: &str = "component";
    /// Value of the ownership labels on Tiller-rendered objects
    pub const TILLER: &str = "Tiller";
}

/// Canonical `app.kubernetes.io/*` label keys
pub mod canonical {
    pub const NAME: &str = "app.kubernetes.io/name";
    pub const COMPONENT: &str = "app.kubernetes.io/component";
    pub const PART_OF: &str = "app.kubernetes.io/part-of";
    pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
}

/// Values written by the normalizer
pub mod owner {
    /// New `heritage` and `part-of` value
    pub const METALK8S: &str = "metalk8s";
    /// New `managed-by` value
    pub const SALT: &str = "salt";
}

/// Helm annotations
pub mod helm {
    /// Hook phase annotation
    pub const HOOK: &str = "helm.sh/hook";
    /// Hook value of `helm test` pods
    pub const TEST_SUCCESS: &str = "test-success";
}

/// Object kinds with special handling
pub mod kind {
    /// prometheus-operator rule object
    pub const PROMETHEUS_RULE: &str = "PrometheusRule";
    /// List wrapper around ConfigMaps
    pub const CONFIG_MAP_LIST: &str = "ConfigMapList";
}
