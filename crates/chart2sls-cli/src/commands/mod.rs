//! Command implementations

pub mod render;
pub mod transform;

use std::io::Write;
use std::path::PathBuf;

use chart2sls_core::{DropSet, ExclusionList, KeyOrder, ResourceRef};
use chart2sls_engine::{Pipeline, RenderOutput, ServiceConfig};
use clap::Args;
use console::style;

use crate::error::Result;

/// Options shared by every command that runs the pipeline
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Target namespace
    #[arg(short, long, default_value = "default")]
    pub namespace: String,

    /// Expose a service configuration to the template (repeatable)
    #[arg(long = "service-config", num_args = 2, value_names = ["NAME", "CONFIGMAP"])]
    pub service_config: Vec<String>,

    /// YAML file listing Prometheus rules to drop, per rule group
    #[arg(long = "drop-prometheus-rules", value_name = "FILE")]
    pub drop_prometheus_rules: Option<PathBuf>,

    /// Leave a manifest out of the output (repeatable)
    #[arg(long = "remove-manifest", num_args = 2, value_names = ["KIND", "NAME"])]
    pub remove_manifest: Vec<String>,

    /// Keep mapping keys in the renderer's order instead of sorting them
    #[arg(long)]
    pub preserve_key_order: bool,

    /// Check that the generated template compiles as Jinja
    #[arg(long)]
    pub check: bool,
}

impl PipelineArgs {
    /// Build the pipeline for one chart
    pub fn pipeline(&self, chart: &str, debug: bool) -> Result<Pipeline> {
        let drop_set = match &self.drop_prometheus_rules {
            Some(path) => {
                let drop_set = DropSet::from_file(path)?;
                if debug {
                    eprintln!(
                        "{} Loaded {} rule group(s) to prune from {}",
                        style("DEBUG").dim(),
                        drop_set.group_count(),
                        path.display()
                    );
                }
                drop_set
            }
            None => DropSet::new(),
        };

        let exclusions: ExclusionList = self
            .remove_manifest
            .chunks_exact(2)
            .map(|pair| ResourceRef::new(&pair[0], &pair[1]))
            .collect();

        if debug && !exclusions.is_empty() {
            eprintln!(
                "{} Excluding {} manifest(s) from the output",
                style("DEBUG").dim(),
                exclusions.len()
            );
        }

        let service_configs = self
            .service_config
            .chunks_exact(2)
            .map(|pair| ServiceConfig::new(&pair[0], &pair[1]));

        let key_order = if self.preserve_key_order {
            KeyOrder::Preserve
        } else {
            KeyOrder::Sorted
        };

        Ok(Pipeline::builder(chart)
            .namespace(&self.namespace)
            .drop_set(drop_set)
            .exclusions(exclusions)
            .service_configs(service_configs)
            .key_order(key_order)
            .check_syntax(self.check)
            .build())
    }
}

/// Run the pipeline and write the template to stdout
pub fn emit(pipeline: &Pipeline, input: &str, debug: bool) -> Result<()> {
    let RenderOutput { text, stats } = pipeline.run(input)?;

    if debug {
        eprintln!(
            "{} {} of {} document(s) emitted, {} rule(s) pruned, {} magic string(s) replaced",
            style("DEBUG").dim(),
            stats.emitted,
            stats.parsed,
            stats.rules_removed,
            stats.tokens
        );
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;

    Ok(())
}
