//! YAML 1.1 implicit scalar resolution
//!
//! `serde_yaml` decides whether a string needs quotes by YAML 1.2 rules,
//! but the generated states are loaded by Salt through PyYAML, which
//! resolves plain scalars by YAML 1.1 rules. Strings such as `on`, `NO`,
//! `1:20` or `2001-12-14` would come back as booleans, integers or dates.
//! The patterns below are those of the YAML 1.1 type repository, as
//! implemented by PyYAML's resolver.

use once_cell::sync::Lazy;
use regex::RegexSet;

static IMPLICIT: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        // bool
        r"\A(?:y|Y|yes|Yes|YES|n|N|no|No|NO|true|True|TRUE|false|False|FALSE|on|On|ON|off|Off|OFF)\z",
        // int, including base 60
        r"\A(?:[-+]?0b[0-1_]+|[-+]?0[0-7_]+|[-+]?(?:0|[1-9][0-9_]*)|[-+]?0x[0-9a-fA-F_]+|[-+]?[1-9][0-9_]*(?::[0-5]?[0-9])+)\z",
        // float, including base 60
        r"\A(?:[-+]?[0-9][0-9_]*\.[0-9_]*(?:[eE][-+][0-9]+)?|\.[0-9][0-9_]*(?:[eE][-+][0-9]+)?|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))\z",
        // null
        r"\A(?:~|null|Null|NULL|)\z",
        // timestamp
        r"\A(?:[0-9]{4}-[0-9]{2}-[0-9]{2}|[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}(?:[Tt]|[ \t]+)[0-9]{1,2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]*)?(?:[ \t]*(?:Z|[-+][0-9]{1,2}(?::[0-9]{2})?))?)\z",
        // merge key and value indicator
        r"\A(?:<<|=)\z",
    ])
    .expect("valid regex")
});

/// Whether a YAML 1.1 loader would read `s`, written plain, as a non-string
pub fn is_implicit(s: &str) -> bool {
    IMPLICIT.is_match(s)
}

/// `s` as a single-quoted scalar
pub fn single_quoted(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
