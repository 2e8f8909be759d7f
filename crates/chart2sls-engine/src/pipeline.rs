//! End-to-end rendering of one chart
//!
//! Stages, in order:
//! 1. split the renderer output into documents
//! 2. filter out empty documents and test hooks
//! 3. prune Prometheus rules named in the drop-set
//! 4. normalize labels, multiline strings and namespaces
//! 5. join the surviving documents back into a stream
//! 6. replace magic strings with Jinja expressions
//! 7. wrap the result in the Salt envelope

use chart2sls_core::document::{self, Document};
use chart2sls_core::labels::kind;
use chart2sls_core::{DropSet, ExclusionList, KeyOrder, ResourceRef};

use crate::envelope::{Envelope, EnvelopeOptions, ServiceConfig};
use crate::error::Result;
use crate::filter;
use crate::magic;
use crate::normalize::{fixup_metadata, normalize};
use crate::prune::{Pruned, prune_rules};
use crate::syntax;

/// Counters collected over one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Documents found in the input stream
    pub parsed: usize,
    /// Empty documents and test hooks
    pub dropped: usize,
    /// PrometheusRules left without any rule
    pub suppressed: usize,
    /// Documents matched by the exclusion list
    pub excluded: usize,
    /// Rules removed by the drop-set
    pub rules_removed: usize,
    /// Documents written to the output
    pub emitted: usize,
    /// Magic strings replaced
    pub tokens: usize,
}

/// Result of a complete run
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// The Salt state template
    pub text: String,
    pub stats: RenderStats,
}

/// Pipeline builder
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    chart: String,
    namespace: String,
    drop_set: DropSet,
    exclusions: ExclusionList,
    service_configs: Vec<ServiceConfig>,
    key_order: KeyOrder,
    envelope: EnvelopeOptions,
    check_syntax: bool,
}

impl PipelineBuilder {
    pub fn new(chart: impl Into<String>) -> Self {
        Self {
            chart: chart.into(),
            namespace: "default".to_string(),
            drop_set: DropSet::new(),
            exclusions: ExclusionList::new(),
            service_configs: Vec::new(),
            key_order: KeyOrder::default(),
            envelope: EnvelopeOptions::default(),
            check_syntax: false,
        }
    }

    /// Namespace injected into manifests lacking one
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn drop_set(mut self, drop_set: DropSet) -> Self {
        self.drop_set = drop_set;
        self
    }

    pub fn exclusions(mut self, exclusions: ExclusionList) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Leave one more manifest out of the output
    pub fn exclude(mut self, resource: ResourceRef) -> Self {
        self.exclusions.insert(resource);
        self
    }

    pub fn service_config(mut self, config: ServiceConfig) -> Self {
        self.service_configs.push(config);
        self
    }

    pub fn service_configs(mut self, configs: impl IntoIterator<Item = ServiceConfig>) -> Self {
        self.service_configs.extend(configs);
        self
    }

    pub fn key_order(mut self, order: KeyOrder) -> Self {
        self.key_order = order;
        self
    }

    pub fn envelope(mut self, options: EnvelopeOptions) -> Self {
        self.envelope = options;
        self
    }

    /// Compile the generated body with minijinja before returning it
    pub fn check_syntax(mut self, check: bool) -> Self {
        self.check_syntax = check;
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            chart: self.chart,
            namespace: self.namespace,
            drop_set: self.drop_set,
            exclusions: self.exclusions,
            service_configs: self.service_configs,
            key_order: self.key_order,
            envelope: self.envelope,
            check_syntax: self.check_syntax,
        }
    }
}

/// Chart-to-Salt-state transformation, configured once per run
#[derive(Debug, Clone)]
pub struct Pipeline {
    chart: String,
    namespace: String,
    drop_set: DropSet,
    exclusions: ExclusionList,
    service_configs: Vec<ServiceConfig>,
    key_order: KeyOrder,
    envelope: EnvelopeOptions,
    check_syntax: bool,
}

impl Pipeline {
    pub fn builder(chart: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(chart)
    }

    /// Filter, prune and normalize one document
    ///
    /// Returns `None` when the document is not part of the output.
    pub fn transform_document(
        &self,
        doc: Document,
        stats: &mut RenderStats,
    ) -> Result<Option<Document>> {
        if !filter::keep(&doc) {
            stats.dropped += 1;
            return Ok(None);
        }

        // Exclusions name the manifest as the chart rendered it
        let excluded = filter::remove(&doc, &self.exclusions);

        let doc = if !self.drop_set.is_empty()
            && document::kind(&doc) == Some(kind::PROMETHEUS_RULE)
        {
            let pruned = prune_rules(doc, &self.drop_set);
            stats.rules_removed += pruned.removed();
            match pruned.into_document() {
                Some(doc) => doc,
                None => {
                    stats.suppressed += 1;
                    return Ok(None);
                }
            }
        } else {
            doc
        };

        let mut doc = normalize(doc);
        fixup_metadata(&mut doc, &self.namespace)?;

        if excluded {
            stats.excluded += 1;
            return Ok(None);
        }

        stats.emitted += 1;
        Ok(Some(doc))
    }

    /// Run stages 2 to 4 over a whole stream, preserving order
    pub fn transform_documents(
        &self,
        documents: Vec<Document>,
        stats: &mut RenderStats,
    ) -> Result<Vec<Document>> {
        stats.parsed += documents.len();

        let mut kept = Vec::with_capacity(documents.len());
        for doc in documents {
            if let Some(doc) = self.transform_document(doc, stats)? {
                kept.push(doc);
            }
        }
        Ok(kept)
    }

    /// Run stages 1 to 6: the raw-block body of the state file
    pub fn render_body(&self, input: &str, stats: &mut RenderStats) -> Result<String> {
        let documents = chart2sls_core::split(input)?;
        let documents = self.transform_documents(documents, stats)?;
        let joined = chart2sls_core::join(&documents, self.key_order)?;

        let (body, tokens) = magic::substitute_counted(&joined);
        stats.tokens += tokens;

        if self.check_syntax {
            syntax::check_body(&body)?;
        }

        Ok(body.into_owned())
    }

    /// The envelope for this chart
    pub fn envelope(&self) -> Envelope<'_> {
        Envelope {
            chart: &self.chart,
            namespace: &self.namespace,
            service_configs: &self.service_configs,
            options: &self.envelope,
        }
    }

    /// Turn renderer output into a complete Salt state template
    pub fn run(&self, input: &str) -> Result<RenderOutput> {
        let mut stats = RenderStats::default();
        let body = self.render_body(input, &mut stats)?;
        let text = self.envelope().wrap(&body);

        tracing::info!(
            chart = %self.chart,
            parsed = stats.parsed,
            emitted = stats.emitted,
            dropped = stats.dropped,
            excluded = stats.excluded,
            suppressed = stats.suppressed,
            rules_removed = stats.rules_removed,
            tokens = stats.tokens,
            "rendered chart"
        );

        Ok(RenderOutput { text, stats })
    }
}
