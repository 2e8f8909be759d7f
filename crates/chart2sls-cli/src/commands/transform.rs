//! Transform command - run the pipeline over an already rendered stream

use std::fs;
use std::io::Read;
use std::path::Path;

use console::style;

use super::{PipelineArgs, emit};
use crate::error::{CliError, Result};

pub fn run(name: &str, input: Option<&Path>, args: &PipelineArgs, debug: bool) -> Result<()> {
    let pipeline = args.pipeline(name, debug)?;
    let manifests = read_input(input)?;

    if debug {
        eprintln!(
            "{} Read {} byte(s) of manifests from {}",
            style("DEBUG").dim(),
            manifests.len(),
            input.map_or_else(|| "stdin".to_string(), |path| path.display().to_string())
        );
    }

    emit(&pipeline, &manifests, debug)
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => fs::read_to_string(path).map_err(|err| {
            CliError::io_with_help(
                format!("cannot read {}: {}", path.display(), err),
                "pass the output of `helm template` with --input, or pipe it on stdin",
            )
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
