//! chart2sls Core - types shared by the rendering pipeline
//!
//! This crate provides:
//! - `Document`: one rendered manifest, kept as a `serde_yaml::Value`
//! - `stream`: splitting and joining multi-document YAML streams
//! - `DropSet`: Prometheus rules to remove, per rule group
//! - `ExclusionList`: manifests to leave out, by kind and name
//! - `labels`: label, annotation and kind names the pipeline looks at
//! - `yaml11`: which strings a YAML 1.1 loader would not read back as strings

pub mod document;
pub mod drop_set;
pub mod error;
pub mod labels;
pub mod resource;
pub mod stream;
pub mod yaml11;

pub use document::Document;
pub use drop_set::DropSet;
pub use error::{CoreError, Result};
pub use resource::{ExclusionList, ResourceRef};
pub use stream::{KeyOrder, join, split};
