//! Engine error types

use chart2sls_core::CoreError;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Main engine error type
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    #[error(transparent)]
    #[diagnostic(code(chart2sls::engine::stream))]
    Core(#[from] CoreError),

    /// A manifest breaks an assumption the rewrite depends on
    #[error("Malformed manifest {document}: {reason}")]
    #[diagnostic(
        code(chart2sls::engine::malformed_document),
        help("the chart rendered an object the pipeline cannot rewrite; check its templates")
    )]
    MalformedDocument { document: String, reason: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),
}

impl EngineError {
    pub fn malformed(document: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            document: document.into(),
            reason: reason.into(),
        }
    }
}

/// The generated template does not compile as Jinja
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("Generated template is not valid Jinja: {message}")]
#[diagnostic(
    code(chart2sls::engine::syntax),
    help("a magic string argument probably contains unbalanced Jinja syntax")
)]
pub struct SyntaxError {
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("error occurred here")]
    pub span: Option<SourceSpan>,
}

impl SyntaxError {
    pub fn from_minijinja(err: &minijinja::Error, name: &str, source: &str) -> Self {
        let span = err.line().and_then(|line| line_span(source, line));

        Self {
            message: err.detail().unwrap_or("syntax error").to_string(),
            src: NamedSource::new(name, source.to_string()),
            span,
        }
    }
}

/// Span covering a whole 1-based line
fn line_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;

    for (index, line) in source.lines().enumerate() {
        if index + 1 == line_num {
            return Some(SourceSpan::new(offset.into(), line.len()));
        }
        offset += line.len() + 1;
    }

    None
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_span() {
        let source = "first\nsecond line\nthird";
        let span = line_span(source, 2).unwrap();
        assert_eq!(span.offset(), 6);
        assert_eq!(span.len(), 11);
        assert!(line_span(source, 4).is_none());
    }

    #[test]
    fn test_malformed_message() {
        let err = EngineError::malformed("ConfigMapList/cms", "missing items");
        assert_eq!(
            err.to_string(),
            "Malformed manifest ConfigMapList/cms: missing items"
        );
    }
}
