//! Route path matching.
//!
//! # Responsibilities
//! - Compile a route path into an anchored, case-insensitive pattern
//! - Match candidate paths and return capture groups by value
//! - Substitute values back into capture groups to build URLs
//!
//! # Design Decisions
//! - Literal equality is checked before the regex (fast path)
//! - Patterns are compiled once at registration time
//! - Matching never mutates the pattern, so one route can serve many requests
//!   concurrently

use regex::{Regex, RegexBuilder};

/// A compiled route path.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
}

impl PathPattern {
    /// Compile `path`. Leading `^` and trailing `$` are accepted but not needed.
    pub fn compile(path: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&format!("^{}$", strip_anchors(path)))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            source: path.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Number of capture groups in the pattern.
    pub fn capture_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    /// Captures for `candidate`, or `None` if it does not match. A literal
    /// match yields no captures.
    pub fn matches(&self, candidate: &str) -> Option<Vec<Option<String>>> {
        if self.source == candidate {
            return Some(Vec::new());
        }
        self.regex.captures(candidate).map(|caps| {
            caps.iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect()
        })
    }

    /// Replace each top-level group with the next value of `args`. Returns the
    /// index of the first group without a value on failure.
    ///
    /// Parentheses inside a character class (`[^)]`) are not groups.
    pub fn substitute(&self, args: &[&str]) -> Result<String, usize> {
        let mut out = String::with_capacity(self.source.len());
        let mut chars = strip_anchors(&self.source).chars().peekable();
        let mut depth = 0usize;
        let mut class = 0usize;
        let mut index = 0usize;

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    let escaped = chars.next();
                    if depth == 0 {
                        if class > 0 {
                            out.push(c);
                        }
                        out.extend(escaped);
                    }
                }
                '[' => {
                    if depth == 0 {
                        out.push(c);
                    }
                    if class == 0 {
                        // a leading `]` (after an optional `^`) is a class member
                        for member in ['^', ']'] {
                            if let Some(m) = chars.next_if_eq(&member) {
                                if depth == 0 {
                                    out.push(m);
                                }
                            }
                        }
                    }
                    class += 1;
                }
                ']' if class > 0 => {
                    class -= 1;
                    if depth == 0 {
                        out.push(c);
                    }
                }
                '(' if class == 0 => {
                    if depth == 0 {
                        out.push_str(args.get(index).ok_or(index)?);
                        index += 1;
                    }
                    depth += 1;
                }
                ')' if class == 0 && depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        // a quantifier on the group belongs to the group
                        chars.next_if(|q| matches!(q, '?' | '*' | '+'));
                    }
                }
                _ if depth > 0 => {}
                _ => out.push(c),
            }
        }
        Ok(out)
    }
}

fn strip_anchors(path: &str) -> &str {
    let path = path.strip_prefix('^').unwrap_or(path);
    if path.ends_with("\\$") {
        return path;
    }
    path.strip_suffix('$').unwrap_or(path)
}
