//! Glob matching for component names.
//!
//! Globs support two wildcards: `*` (zero or more characters) and `?` (exactly
//! one character). Matching is case-insensitive and anchored at both ends, so
//! `*.Core` matches `Orders.Core` but not `Orders.Core.Tests`. Every other
//! character is literal.
//!
//! Dependency rule patterns may contain the `{module}` token, which callers
//! expand with [`expand_module`] before matching.

use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Token replaced by the evaluating component's module name.
pub const MODULE_TOKEN: &str = "{module}";

const MAX_COMPILED_SIZE: usize = 1 << 20;

/// A glob compiled once for repeated matching.
///
/// A glob that fails to compile is kept as a never-matching matcher.
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    glob: String,
    regex: Option<Regex>,
}

impl GlobMatcher {
    pub fn new(glob: &str) -> Self {
        let regex = match compile_glob(glob) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!("Ignoring pattern '{}' that cannot be compiled: {}", glob, e);
                None
            }
        };
        Self {
            glob: glob.to_string(),
            regex,
        }
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(name))
    }

    pub fn glob(&self) -> &str {
        &self.glob
    }

    /// Whether the glob compiled; a broken glob matches nothing.
    pub fn is_valid(&self) -> bool {
        self.regex.is_some()
    }
}

fn compile_glob(glob: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&glob_to_regex(glob))
        .case_insensitive(true)
        .size_limit(MAX_COMPILED_SIZE)
        .build()
}

/// Translate a glob into an anchored regular expression.
pub fn glob_to_regex(glob: &str) -> String {
    let mut pattern = String::with_capacity(glob.len() + 8);
    pattern.push('^');
    let mut literal = String::new();
    for ch in glob.chars() {
        match ch {
            '*' | '?' => {
                pattern.push_str(&regex::escape(&literal));
                literal.clear();
                pattern.push_str(if ch == '*' { ".*" } else { "." });
            }
            _ => literal.push(ch),
        }
    }
    pattern.push_str(&regex::escape(&literal));
    pattern.push('$');
    pattern
}

/// One-shot match of `name` against `glob`.
pub fn matches_glob(name: &str, glob: &str) -> bool {
    GlobMatcher::new(glob).is_match(name)
}

/// Whether `name` matches any of the globs.
pub fn matches_any<'a, I>(name: &str, globs: I) -> bool
where
    I: IntoIterator<Item = &'a String>,
{
    globs.into_iter().any(|glob| matches_glob(name, glob))
}

/// Substitute the `{module}` token with a module name.
pub fn expand_module(pattern: &str, module_name: &str) -> String {
    pattern.replace(MODULE_TOKEN, module_name)
}

/// Whether a string carries a wildcard character.
pub fn has_wildcard(value: &str) -> bool {
    value.contains('*') || value.contains('?')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_star_matches_any_prefix() {
        assert!(matches_glob("Orders.Core", "*.Core"));
        assert!(matches_glob(".Core", "*.Core"));
        assert!(!matches_glob("Orders.Core.Tests", "*.Core"));
        assert!(!matches_glob("OrdersCore", "*.Core"));
    }

    #[test]
    fn test_question_mark_matches_exactly_one() {
        assert!(matches_glob("Module1.Core", "Module?.Core"));
        assert!(!matches_glob("Module.Core", "Module?.Core"));
        assert!(!matches_glob("Module12.Core", "Module?.Core"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert!(matches_glob("orders.core", "*.Core"));
        assert!(matches_glob("SHARED.CORE", "Shared.Core"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches_glob("a+b(c)", "a+b(c)"));
        assert!(!matches_glob("aab(c)", "a+b(c)"));
        assert!(matches_glob("x[1].y", "x[1].*"));
        assert!(!matches_glob("xAy", "x.y"));
    }

    #[test]
    fn test_module_expansion() {
        assert_eq!(expand_module("{module}.Core", "Orders"), "Orders.Core");
        assert_eq!(expand_module("Shared.Core", "Orders"), "Shared.Core");
        assert!(matches_glob("Orders.Core", &expand_module("{module}.Core", "Orders")));
        assert!(!matches_glob("Billing.Core", &expand_module("{module}.Core", "Orders")));
    }

    #[test]
    fn test_uncompilable_glob_matches_nothing() {
        let huge = "a".repeat(MAX_COMPILED_SIZE * 2);
        let matcher = GlobMatcher::new(&huge);
        assert!(!matcher.is_valid());
        assert!(!matcher.is_match(&huge));
    }

    #[test]
    fn test_empty_glob_matches_only_empty() {
        assert!(matches_glob("", ""));
        assert!(!matches_glob("x", ""));
    }

    proptest! {
        #[test]
        fn literal_without_wildcards_matches(glob in "[A-Za-z0-9.*?_-]{0,16}") {
            let literal: String = glob.chars().filter(|c| *c != '*' && *c != '?').collect();
            let only_stars = !glob.contains('?');
            // `?` must consume a character, so the stripped literal only matches star-only globs.
            if only_stars {
                prop_assert!(matches_glob(&literal, &glob));
            }
        }

        #[test]
        fn wildcard_free_glob_is_anchored(glob in "[A-Za-z0-9._-]{1,16}", extra in "[A-Za-z0-9]{1,4}") {
            let longer = format!("{}{}", glob, extra);
            prop_assert!(matches_glob(&glob, &glob));
            prop_assert!(!matches_glob(&longer, &glob));
            let prefixed = format!("{}{}", extra, glob);
            prop_assert!(!matches_glob(&prefixed, &glob));
        }
    }
}
