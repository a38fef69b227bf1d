//! Shell-style wildcard matching for key listings.
//!
//! `*` matches any run of characters, `?` one character and `[...]` one
//! character from a set (`[!...]` negates). Everything else is literal.

use regex::Regex;

use crate::error::{SummaryError, SummaryResult};

/// Compiled wildcard pattern.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    regex: Regex,
}

impl KeyPattern {
    pub fn new(pattern: &str) -> SummaryResult<Self> {
        let mut expr = String::with_capacity(pattern.len() * 2 + 2);
        expr.push('^');

        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                '[' => {
                    let mut class = String::from("[");
                    if chars.peek() == Some(&'!') {
                        chars.next();
                        class.push('^');
                    }
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        if c == '\\' || c == '[' || c == '^' {
                            class.push('\\');
                        }
                        class.push(c);
                    }
                    if !closed {
                        return Err(SummaryError::InvalidPattern(pattern.to_string()));
                    }
                    class.push(']');
                    expr.push_str(&class);
                }
                other => expr.push_str(&regex::escape(&other.to_string())),
            }
        }

        expr.push('$');
        let regex =
            Regex::new(&expr).map_err(|_| SummaryError::InvalidPattern(pattern.to_string()))?;
        Ok(Self { regex })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}
