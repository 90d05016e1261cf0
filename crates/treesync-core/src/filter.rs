//! Ignore rules - decide whether a path is excluded from watching/syncing
//!
//! A rule is one of:
//! - **Directory substring**, written with a trailing `/`: matches when the
//!   base name *contains* the trimmed text (e.g. `cache/` ignores
//!   `.cache`, `cached-items`, ...).
//! - **Wildcard**, containing `*`: matches when the base name starts or
//!   ends with the remainder after stripping the `*` (e.g. `*.tmp`, `tmp*`).
//! - **Inert**: anything else. Such a rule never matches; config
//!   validation warns about them.
//!
//! Matching looks at the base name only. An ignored *directory* therefore
//! does not transitively suppress anything nested deeper inside it: a
//! descendant is only excluded when its own base name matches a rule.

use std::path::Path;

// ============================================================================
// IgnoreRule
// ============================================================================

/// One parsed ignore pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreRule {
    /// Trailing-`/` form: base name must contain this text.
    DirSubstring(String),
    /// `*` form: base name must start or end with this literal.
    Wildcard(String),
    /// Neither form: never matches anything.
    Inert(String),
}

impl IgnoreRule {
    /// Parse one raw rule string into its matching form.
    pub fn parse(raw: &str) -> Self {
        if raw.ends_with('/') {
            IgnoreRule::DirSubstring(raw.replace('/', ""))
        } else if raw.contains('*') {
            IgnoreRule::Wildcard(raw.replace('*', ""))
        } else {
            IgnoreRule::Inert(raw.to_string())
        }
    }

    /// Whether this rule matches the given base name.
    pub fn matches(&self, base_name: &str) -> bool {
        match self {
            IgnoreRule::DirSubstring(text) => !text.is_empty() && base_name.contains(text),
            IgnoreRule::Wildcard(literal) => {
                !literal.is_empty()
                    && (base_name.starts_with(literal.as_str())
                        || base_name.ends_with(literal.as_str()))
            }
            IgnoreRule::Inert(_) => false,
        }
    }
}

// ============================================================================
// IgnoreFilter
// ============================================================================

/// Ordered list of ignore rules applied to path base names.
///
/// Pure function of (path, rule list); no side effects.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    rules: Vec<IgnoreRule>,
}

impl IgnoreFilter {
    /// Build a filter from raw rule strings (typically `config.sync.ignored`).
    pub fn new<S: AsRef<str>>(raw_rules: &[S]) -> Self {
        let rules = raw_rules
            .iter()
            .map(|r| IgnoreRule::parse(r.as_ref()))
            .collect();
        Self { rules }
    }

    /// Returns `true` when any rule matches the path's base name.
    ///
    /// The path may be absolute or relative; only the final component is
    /// examined.
    pub fn should_ignore(&self, path: &Path) -> bool {
        let base_name = match path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => return false,
        };
        self.rules.iter().any(|rule| rule.matches(&base_name))
    }

    /// The parsed rules, for diagnostics.
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// True when the filter has no rules at all.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
