//! Render command - run the chart renderer, then the pipeline

use std::path::Path;

use console::style;

use super::{PipelineArgs, emit};
use crate::error::Result;
use crate::helm::Renderer;

pub fn run(
    name: &str,
    values: &Path,
    chart_path: &Path,
    helm: &Path,
    args: &PipelineArgs,
    debug: bool,
) -> Result<()> {
    let pipeline = args.pipeline(name, debug)?;

    if debug {
        eprintln!(
            "{} Rendering {} from {} into namespace {}",
            style("DEBUG").dim(),
            name,
            chart_path.display(),
            args.namespace
        );
    }

    let manifests = Renderer::new(helm).render(name, &args.namespace, values, chart_path)?;

    emit(&pipeline, &manifests, debug)
}
