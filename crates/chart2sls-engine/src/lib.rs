//! chart2sls Engine - rewrites rendered Helm charts into Salt states
//!
//! The engine takes the manifest stream produced by `helm template` and
//! turns it into a MetalK8s Salt state template:
//! - drops empty documents, test hooks and excluded manifests
//! - prunes Prometheus rules named in a drop-set
//! - hands Tiller-owned labels over to Salt and injects the namespace
//! - replaces magic strings with Jinja expressions
//! - wraps everything in the Salt prologue and raw block

pub mod envelope;
pub mod error;
pub mod filter;
pub mod magic;
pub mod normalize;
pub mod pipeline;
pub mod prune;
pub mod syntax;

pub use envelope::{Envelope, EnvelopeOptions, ServiceConfig};
pub use error::{EngineError, Result, SyntaxError};
pub use magic::{MagicToken, TokenKind};
pub use pipeline::{Pipeline, PipelineBuilder, RenderOutput, RenderStats};
pub use prune::Pruned;
