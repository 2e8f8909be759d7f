//! Compile-only check of the generated template
//!
//! Salt is the one rendering the state, with its own globals and
//! extensions, so only the raw-block body is checked here: it must parse
//! as Jinja once wrapped in the envelope's raw markers. Nothing is rendered.

use minijinja::Environment;

use crate::envelope::{RAW_CLOSE, RAW_OPEN};
use crate::error::SyntaxError;

/// Name shown in diagnostics for the checked body
const TEMPLATE_NAME: &str = "rendered.sls";

/// Check that `body` compiles inside the raw block
pub fn check_body(body: &str) -> Result<(), SyntaxError> {
    let source = format!("{RAW_OPEN}\n{body}{RAW_CLOSE}");
    let env = Environment::new();

    match env.template_from_str(&source) {
        Ok(_) => Ok(()),
        Err(err) => Err(SyntaxError::from_minijinja(&err, TEMPLATE_NAME, &source)),
    }
}
