//! # Pattern Module
//!
//! Compilation of uri templates into matchable regular expressions.
//!
//! A template is plain text with `{name}` or `{name: regex}` placeholders:
//!
//! - `{id}` matches one non-empty path segment (never crosses a `/`).
//! - `{id: [0-9]+}` matches the user-supplied expression; POSIX shorthands
//!   (`:digit:`, `:alpha:`, ...) are expanded first.
//! - Text outside placeholders passes through unescaped, so templates may
//!   embed raw regex syntax directly (`/.*` catch-alls, optional suffix
//!   groups like `(\.(json|xml))?`).
//!
//! Each placeholder becomes a machine-named capturing group (`param0`,
//! `param1`, ...) because user parameter names may repeat across routes or be
//! invalid group identifiers; the binding keeps the side list mapping group
//! index to the original name, in encounter order. The emitted regex is
//! anchored for whole-path matching.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use tracing::trace;

use crate::error::RouterError;

/// Matches `{id}` and `{id: .*}`; group 1 captures the parameter name,
/// group 3 the user regex when present.
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(.*?)(:\s(.*?))?\}").expect("placeholder regex compiles"));

/// Maximum number of path parameters held inline before spilling to the heap.
/// Most routes have well under eight placeholders.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the match hot path.
///
/// Parameter names come from the compiled table and are shared as `Arc<str>`;
/// values are per-request substrings of the path.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

fn group_name(index: usize) -> String {
    format!("param{}", index)
}

/// A uri template compiled to a regex plus its ordered parameter names.
///
/// Invariant: `parameter_names` has one entry per generated capturing group,
/// in left-to-right template order.
#[derive(Debug, Clone)]
pub struct UriPatternBinding {
    uri_pattern: String,
    regex: String,
    pattern: Regex,
    parameter_names: Vec<Arc<str>>,
}

impl UriPatternBinding {
    /// Compile a uri template.
    ///
    /// Fails with [`RouterError::PatternCompile`] when an inline regex (or raw
    /// regex text embedded in the template) is malformed.
    pub fn compile(uri_pattern: &str) -> Result<Self, RouterError> {
        let (regex, parameter_names) = template_regex(uri_pattern);
        // Whole-path semantics: the pattern must cover the request path
        // entirely, not merely occur somewhere inside it.
        let anchored = format!("^(?:{})$", regex);
        let pattern = Regex::new(&anchored).map_err(|source| RouterError::PatternCompile {
            uri_pattern: uri_pattern.to_string(),
            source,
        })?;

        trace!(uri_pattern = %uri_pattern, regex = %regex, "Compiled uri pattern");

        Ok(Self {
            uri_pattern: uri_pattern.to_string(),
            regex,
            pattern,
            parameter_names,
        })
    }

    pub fn uri_pattern(&self) -> &str {
        &self.uri_pattern
    }

    /// The emitted regex, without the whole-path anchors.
    pub fn regex(&self) -> &str {
        &self.regex
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Parameter names in capturing-group order.
    pub fn parameter_names(&self) -> &[Arc<str>] {
        &self.parameter_names
    }

    /// Whether `path` matches this pattern in its entirety.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// Match `path` and extract the named path parameters.
    ///
    /// Returns `None` when the path does not match. A capturing group that
    /// matched nothing (an unused optional group) contributes no entry.
    #[must_use]
    pub fn extract(&self, path: &str) -> Option<ParamVec> {
        let captures = self.pattern.captures(path)?;

        let mut params = ParamVec::new();
        for (index, name) in self.parameter_names.iter().enumerate() {
            if let Some(m) = captures.name(&group_name(index)) {
                params.push((Arc::clone(name), m.as_str().to_string()));
            }
        }

        Some(params)
    }
}

/// Translate a template into (regex text, ordered parameter names).
fn template_regex(uri_pattern: &str) -> (String, Vec<Arc<str>>) {
    let mut regex = String::with_capacity(uri_pattern.len() + 16);
    let mut parameter_names: Vec<Arc<str>> = Vec::new();
    let mut last = 0;

    for captures in PLACEHOLDER.captures_iter(uri_pattern) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        regex.push_str(&uri_pattern[last..whole.start()]);

        let index = parameter_names.len();
        match captures.get(3) {
            Some(user_regex) => {
                let expanded = replace_posix_classes(user_regex.as_str());
                regex.push_str(&format!("(?P<{}>{})", group_name(index), expanded));
            }
            None => {
                // Default: one non-empty path segment.
                regex.push_str(&format!("(?P<{}>[^/]+)", group_name(index)));
            }
        }

        let name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        parameter_names.push(Arc::from(name));
        last = whole.end();
    }

    regex.push_str(&uri_pattern[last..]);

    (regex, parameter_names)
}

/// Expand POSIX character-class shorthands to regex-crate syntax.
///
/// `:alpha:` is deliberately Unicode-aware (any letter), the rest are ASCII.
fn replace_posix_classes(input: &str) -> String {
    input
        .replace(":alnum:", "[0-9A-Za-z]")
        .replace(":alpha:", r"\p{L}")
        .replace(":ascii:", r"[\x00-\x7F]")
        .replace(":digit:", "[0-9]")
        .replace(":xdigit:", "[0-9A-Fa-f]")
}

/// Regex locating the placeholder(s) for one specific parameter key in a raw
/// template, i.e. `{key}` or `{key: ...}`. Used by reverse uri generation.
pub(crate) fn key_placeholder(key: &str) -> Regex {
    let pattern = format!(r"\{{({})(:\s([^}}]*))?\}}", regex::escape(key));
    // The key is escaped, so the pattern is as valid as PLACEHOLDER itself.
    Regex::new(&pattern).expect("escaped placeholder regex compiles")
}
