//! Allow/deny glob policy over exposed tool names
//!
//! Patterns are compiled into literal segments split on `*`; every other
//! character matches itself. A pattern without `*` must match exactly.

/// Compiled glob pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    source: String,
    parts: Vec<String>,
}

impl GlobPattern {
    /// Compile a pattern where `*` matches any substring
    pub fn compile(pattern: &str) -> Self {
        Self {
            source: pattern.to_string(),
            parts: pattern.split('*').map(String::from).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match the whole of `text`
    pub fn matches(&self, text: &str) -> bool {
        let (first, last, middle) = match self.parts.as_slice() {
            [] => return text.is_empty(),
            [only] => return text == only,
            [first, middle @ .., last] => (first, last, middle),
        };

        if text.len() < first.len() + last.len() {
            return false;
        }
        if !text.starts_with(first.as_str()) || !text.ends_with(last.as_str()) {
            return false;
        }

        let mut rest = &text[first.len()..text.len() - last.len()];
        for part in middle.iter().filter(|p| !p.is_empty()) {
            match rest.find(part.as_str()) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
        true
    }
}

/// Compiled allow/deny lists
#[derive(Debug, Clone, Default)]
pub struct ToolPolicy {
    allow: Vec<GlobPattern>,
    deny: Vec<GlobPattern>,
}

impl ToolPolicy {
    pub fn new<S: AsRef<str>>(allow: &[S], deny: &[S]) -> Self {
        Self {
            allow: allow.iter().map(|p| GlobPattern::compile(p.as_ref())).collect(),
            deny: deny.iter().map(|p| GlobPattern::compile(p.as_ref())).collect(),
        }
    }

    /// Empty allow admits everything; deny always has the last word
    pub fn allows(&self, name: &str) -> bool {
        let allowed = self.allow.is_empty() || self.allow.iter().any(|p| p.matches(name));
        allowed && !self.deny.iter().any(|p| p.matches(name))
    }
}

/// Evaluate a tool name against allow and deny globs
pub fn is_tool_allowed<S: AsRef<str>>(name: &str, allow: &[S], deny: &[S]) -> bool {
    ToolPolicy::new(allow, deny).allows(name)
}
