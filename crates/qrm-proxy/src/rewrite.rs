//! Local-to-remote path rewriting.

/// A prefix rewrite. `prefix` matches whole path segments only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteRule {
    pub prefix: &'static str,
    pub replacement: &'static str,
}

/// Proxy rules, most specific first; the first match wins.
pub const RULES: &[RewriteRule] = &[
    RewriteRule {
        prefix: "/api/list",
        replacement: "/api/1/list",
    },
    RewriteRule {
        prefix: "/api",
        replacement: "/api/1/validate",
    },
];

impl RewriteRule {
    /// Applies the rule to `path`, or `None` if the prefix does not match.
    ///
    /// The remainder after the prefix is kept, except a bare trailing `/`:
    /// `/api/` becomes `/api/1/validate`, `/api/x` becomes `/api/1/validate/x`.
    pub fn apply(&self, path: &str) -> Option<String> {
        let rest = path.strip_prefix(self.prefix)?;
        if !(rest.is_empty() || rest.starts_with('/')) {
            return None;
        }
        let rest = if rest == "/" { "" } else { rest };
        Some(format!("{}{rest}", self.replacement))
    }
}

/// Rewrites a local path using the first matching rule in `RULES`.
pub fn rewrite_path(path: &str) -> Option<String> {
    RULES.iter().find_map(|rule| rule.apply(path))
}
