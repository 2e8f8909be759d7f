//! Magic string substitution
//!
//! Chart values cannot contain Jinja (Helm would choke on it, and the
//! rendered manifests are emitted inside a `{% raw %}` block anyway), so
//! values reference Salt-side data through placeholders:
//!
//! | placeholder                 | becomes                                   |
//! |-----------------------------|-------------------------------------------|
//! | `__var__(path)`             | `{{ path }}`                              |
//! | `__var_tojson__(path)`      | `{{ path \| tojson }}`                    |
//! | `__escape__(text)`          | `"text"`, with `text` evaluated by Jinja  |
//! | `__image__(name)`           | `{{ build_image_name("name", False) }}`   |
//! | `__full_image__(name)`      | `{{ build_image_name("name") }}`          |
//!
//! Each replacement closes the raw block, emits the expression and reopens
//! the raw block, so only these spans are ever interpreted by Jinja.
//!
//! The text is scanned once, left to right. Output of a replacement is never
//! scanned again, and a placeholder whose argument does not fit its grammar
//! is left verbatim.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::ops::Range;

/// Closes the raw block before an expression
pub const RAW_EXIT: &str = "{% endraw -%}";
/// Reopens the raw block after an expression
pub const RAW_ENTER: &str = "{%- raw %}";
/// Salt macro resolving a logical image name to a registry reference
pub const IMAGE_HELPER: &str = "build_image_name";

static HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"__(var_tojson|var|escape|full_image|image)__\(").expect("valid regex")
});

// Dotted paths; later segments may carry parentheses for simple calls
static PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[\w-]+(?:\.[\w\-()]+)*\)").expect("valid regex"));

// Same as PATH, plus `|` so a filter chain can follow the path
static FILTERED_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[\w-]+(?:\.[\w\-()|]+)*\)").expect("valid regex"));

static IMAGE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A[\w-]+\)").expect("valid regex"));

/// The five placeholder kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Var,
    VarToJson,
    Escape,
    Image,
    FullImage,
}

impl TokenKind {
    pub const ALL: [TokenKind; 5] = [
        TokenKind::Var,
        TokenKind::VarToJson,
        TokenKind::Escape,
        TokenKind::Image,
        TokenKind::FullImage,
    ];

    /// Placeholder prefix, without the opening parenthesis
    pub fn prefix(self) -> &'static str {
        match self {
            TokenKind::Var => "__var__",
            TokenKind::VarToJson => "__var_tojson__",
            TokenKind::Escape => "__escape__",
            TokenKind::Image => "__image__",
            TokenKind::FullImage => "__full_image__",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "var" => Some(TokenKind::Var),
            "var_tojson" => Some(TokenKind::VarToJson),
            "escape" => Some(TokenKind::Escape),
            "image" => Some(TokenKind::Image),
            "full_image" => Some(TokenKind::FullImage),
            _ => None,
        }
    }

    /// Length of the argument at the start of `rest`, excluding the
    /// closing parenthesis
    fn argument_len(self, rest: &str) -> Option<usize> {
        let grammar = match self {
            TokenKind::Var => &PATH,
            TokenKind::VarToJson => &FILTERED_PATH,
            TokenKind::Image | TokenKind::FullImage => &IMAGE_NAME,
            TokenKind::Escape => return balanced_len(rest),
        };
        grammar.find(rest).map(|m| m.end() - 1)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Text up to the `)` closing the escape, on the same line
fn balanced_len(rest: &str) -> Option<usize> {
    let mut depth = 0usize;

    for (index, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(index),
            ')' => depth -= 1,
            '\n' => return None,
            _ => {}
        }
    }

    None
}

/// A placeholder found in the serialized stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicToken<'a> {
    pub kind: TokenKind,
    pub argument: &'a str,
    /// Byte range of the whole placeholder in the scanned text
    pub span: Range<usize>,
}

impl MagicToken<'_> {
    /// The Jinja text replacing the placeholder, between the raw markers
    pub fn expression(&self) -> String {
        match self.kind {
            TokenKind::Var => format!("{{{{ {} }}}}", self.argument),
            TokenKind::VarToJson => format!("{{{{ {} | tojson }}}}", self.argument),
            TokenKind::Escape => self.argument.to_string(),
            TokenKind::Image => format!("{{{{ {}(\"{}\", False) }}}}", IMAGE_HELPER, self.argument),
            TokenKind::FullImage => format!("{{{{ {}(\"{}\") }}}}", IMAGE_HELPER, self.argument),
        }
    }

    /// Append the full replacement, raw markers included
    pub fn write_to(&self, out: &mut String) {
        let quote = if self.kind == TokenKind::Escape { "\"" } else { "" };
        out.push_str(quote);
        out.push_str(RAW_EXIT);
        out.push_str(&self.expression());
        out.push_str(RAW_ENTER);
        out.push_str(quote);
    }
}

/// Piece of scanned text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Token(MagicToken<'a>),
}

/// Left-to-right scanner splitting text into literal runs and placeholders
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Segments<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Next well-formed placeholder at or after `self.pos`
    fn next_token(&self) -> Option<MagicToken<'a>> {
        let mut search = self.pos;

        while let Some(caps) = HEAD.captures_at(self.text, search) {
            let head = caps.get(0)?;
            let kind = caps.get(1).and_then(|name| TokenKind::from_name(name.as_str()))?;
            let arg_start = head.end();

            match kind.argument_len(&self.text[arg_start..]) {
                Some(len) => {
                    let arg_end = arg_start + len;
                    return Some(MagicToken {
                        kind,
                        argument: &self.text[arg_start..arg_end],
                        span: head.start()..arg_end + 1,
                    });
                }
                None => search = arg_start,
            }
        }

        None
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        if self.pos >= self.text.len() {
            return None;
        }

        match self.next_token() {
            Some(token) if token.span.start > self.pos => {
                let text = &self.text[self.pos..token.span.start];
                self.pos = token.span.start;
                Some(Segment::Text(text))
            }
            Some(token) => {
                self.pos = token.span.end;
                Some(Segment::Token(token))
            }
            None => {
                let text = &self.text[self.pos..];
                self.pos = self.text.len();
                Some(Segment::Text(text))
            }
        }
    }
}

/// All placeholders in `text`, in order
pub fn tokens(text: &str) -> Vec<MagicToken<'_>> {
    Segments::new(text)
        .filter_map(|segment| match segment {
            Segment::Token(token) => Some(token),
            Segment::Text(_) => None,
        })
        .collect()
}

/// Replace every placeholder, returning the text and the number replaced
///
/// Text without placeholders is returned borrowed and unchanged.
pub fn substitute_counted(text: &str) -> (Cow<'_, str>, usize) {
    let mut out = String::with_capacity(text.len());
    let mut count = 0;

    for segment in Segments::new(text) {
        match segment {
            Segment::Text(literal) => out.push_str(literal),
            Segment::Token(token) => {
                tracing::trace!(kind = %token.kind, argument = token.argument, "substituting");
                token.write_to(&mut out);
                count += 1;
            }
        }
    }

    if count == 0 {
        (Cow::Borrowed(text), 0)
    } else {
        (Cow::Owned(out), count)
    }
}

/// Replace every placeholder in `text`
pub fn substitute(text: &str) -> Cow<'_, str> {
    substitute_counted(text).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::{Environment, Error, ErrorKind, context};

    /// Render the substituted text the way Salt would
    fn render(substituted: &str, ctx: minijinja::Value) -> String {
        let mut env = Environment::new();
        env.add_function("build_image_name", |name: String, full: Option<bool>| {
            if full.unwrap_or(true) {
                format!("registry.local/{name}:1.0")
            } else {
                format!("registry.local/{name}")
            }
        });
        env.add_filter("tojson", |value: minijinja::Value| {
            serde_json::to_string(&value).map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))
        });
        let source = format!("{{% raw %}}{substituted}{{% endraw %}}");
        env.render_str(&source, ctx).unwrap()
    }

    /// Split on raw markers: (text before, expression, text after)
    fn split_single(out: &str) -> (&str, &str, &str) {
        assert_eq!(out.matches(RAW_EXIT).count(), 1, "{out}");
        assert_eq!(out.matches(RAW_ENTER).count(), 1, "{out}");
        let (before, rest) = out.split_once(RAW_EXIT).unwrap();
        let (expr, after) = rest.split_once(RAW_ENTER).unwrap();
        (before, expr, after)
    }

    #[test]
    fn test_var() {
        let out = substitute("port: __var__(config.spec.port)\n");
        assert_eq!(out, "port: {% endraw -%}{{ config.spec.port }}{%- raw %}\n");
    }

    #[test]
    fn test_var_tojson() {
        let out = substitute("args: __var_tojson__(config.spec.args)\n");
        assert_eq!(
            out,
            "args: {% endraw -%}{{ config.spec.args | tojson }}{%- raw %}\n"
        );
    }

    #[test]
    fn test_var_tojson_with_filter_chain() {
        let found = tokens("x: __var_tojson__(cfg.items|list)\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].argument, "cfg.items|list");
    }

    #[test]
    fn test_var_rejects_pipe() {
        // only the tojson flavour accepts filter chains
        let text = "x: __var__(cfg.items|list)\n";
        assert_eq!(substitute(text), text);
    }

    #[test]
    fn test_var_with_call_segment() {
        let found = tokens("x: __var__(pillar.networks.get()) y\n");
        assert_eq!(found[0].argument, "pillar.networks.get()");
    }

    #[test]
    fn test_escape() {
        let out = substitute("host: __escape__(grains.fqdn)\n");
        assert_eq!(out, "host: \"{% endraw -%}grains.fqdn{%- raw %}\"\n");
    }

    #[test]
    fn test_escape_stops_at_balancing_paren() {
        let found = tokens("a: __escape__(f(x) ~ g(y)) and (more)\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].argument, "f(x) ~ g(y)");
    }

    #[test]
    fn test_escape_does_not_span_lines() {
        let text = "a: __escape__(unclosed\nb: c)\n";
        assert_eq!(substitute(text), text);
    }

    #[test]
    fn test_image() {
        let out = substitute("image: __image__(nginx)\n");
        let (before, expr, after) = split_single(&out);
        assert_eq!(before, "image: ");
        assert_eq!(expr, "{{ build_image_name(\"nginx\", False) }}");
        assert_eq!(after, "\n");
    }

    #[test]
    fn test_full_image() {
        let out = substitute("image: __full_image__(kube-state-metrics)\n");
        assert_eq!(
            out,
            "image: {% endraw -%}{{ build_image_name(\"kube-state-metrics\") }}{%- raw %}\n"
        );
    }

    #[test]
    fn test_no_tokens_is_borrowed() {
        let text = "kind: ConfigMap\ndata:\n  tpl: '{{ .Values.x }}'\n";
        let (out, count) = substitute_counted(text);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, text);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_each_kind_splits_raw_region_once() {
        let samples = [
            (TokenKind::Var, "__var__(a.b)"),
            (TokenKind::VarToJson, "__var_tojson__(a.b)"),
            (TokenKind::Escape, "__escape__(a.b)"),
            (TokenKind::Image, "__image__(nginx)"),
            (TokenKind::FullImage, "__full_image__(nginx)"),
        ];
        assert_eq!(samples.len(), TokenKind::ALL.len());

        for (kind, sample) in samples {
            let text = format!("key: {sample} # {{{{ not a token }}}}\n");
            let found = tokens(&text);
            assert_eq!(found.len(), 1, "{kind}");
            assert_eq!(found[0].kind, kind);

            let out = substitute(&text);
            let (before, _, after) = split_single(&out);
            assert!(before.starts_with("key: "), "{kind}: {out}");
            assert!(after.ends_with(" # {{ not a token }}\n"), "{kind}: {out}");
        }
    }

    #[test]
    fn test_prefixes_do_not_overlap() {
        let found = tokens("__full_image__(a) __image__(b) __var_tojson__(c) __var__(d)");
        let kinds: Vec<_> = found.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::FullImage,
                TokenKind::Image,
                TokenKind::VarToJson,
                TokenKind::Var
            ]
        );
    }

    #[test]
    fn test_malformed_head_left_verbatim() {
        let text = "a: __image__(bad name) b: __image__(good)\n";
        let found = tokens(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].argument, "good");
        let out = substitute(text);
        assert!(out.starts_with("a: __image__(bad name) b: {% endraw -%}"));
    }

    #[test]
    fn test_replacement_is_not_rescanned() {
        // The escape emits text that looks like a placeholder; it must stay literal
        let out = substitute("a: __escape__(x ~ '__image__(y)')\n");
        assert_eq!(out.matches(RAW_EXIT).count(), 1);
        assert!(out.contains("x ~ '__image__(y)'"));
    }

    #[test]
    fn test_spans() {
        let text = "ab __var__(x) cd";
        let token = &tokens(text)[0];
        assert_eq!(&text[token.span.clone()], "__var__(x)");
    }

    #[test]
    fn test_renders_with_jinja() {
        let text = "\
image: __image__(nginx)
full: __full_image__(nginx)
port: __var__(config.port)
ports: __var_tojson__(config.ports)
host: __escape__({{ host }})
raw: '{{ left alone }}'
";
        let out = substitute(text);
        let rendered = render(
            &out,
            context! {
                config => context! { port => 8080, ports => vec![80, 443] },
                host => "node-1",
            },
        );
        assert_eq!(
            rendered,
            "\
image: registry.local/nginx
full: registry.local/nginx:1.0
port: 8080
ports: [80,443]
host: \"node-1\"
raw: '{{ left alone }}'
"
        );
    }
}
