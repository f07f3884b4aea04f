//! Text patterns used by assertions and waits.
//!
//! A pattern prefixed with `regex:` is a regular expression that must match
//! somewhere in the actual text. Anything else must equal it exactly.

use std::fmt;

use regex::Regex;

use crate::error::CommandError;

const REGEX_PREFIX: &str = "regex:";

/// An expected value: verbatim text or a regular expression.
#[derive(Debug, Clone)]
pub enum Pattern {
    Exact(String),
    Regex(Regex),
}

impl Pattern {
    /// Parses a pattern argument.
    ///
    /// An invalid regular expression is an argument error.
    pub fn parse(raw: &str) -> Result<Self, CommandError> {
        match raw.strip_prefix(REGEX_PREFIX) {
            Some(expr) => Regex::new(expr).map(Pattern::Regex).map_err(|e| {
                CommandError::InvalidArgument(format!("invalid pattern '{}': {}", raw, e))
            }),
            None => Ok(Pattern::Exact(raw.to_string())),
        }
    }

    pub fn is_match(&self, actual: &str) -> bool {
        match self {
            Pattern::Exact(expected) => actual == expected,
            Pattern::Regex(re) => re.is_match(actual),
        }
    }

    /// Whether the pattern occurs somewhere in `haystack`.
    pub fn is_found_in(&self, haystack: &str) -> bool {
        match self {
            Pattern::Exact(expected) => haystack.contains(expected.as_str()),
            Pattern::Regex(re) => re.is_match(haystack),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact(expected) => write!(f, "'{}'", expected),
            Pattern::Regex(re) => write!(f, "{}{}", REGEX_PREFIX, re.as_str()),
        }
    }
}
