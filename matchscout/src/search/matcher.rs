use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::errors::ScanResult;

const SIMPLE_PATTERN_THRESHOLD: usize = 32;

/// A content pattern as supplied by the caller
#[derive(Debug, Clone)]
pub enum MatchPattern {
    /// Pattern text, compiled as a regular expression with no flags
    Literal(String),
    /// A pre-built regular expression, used as-is
    Regex(Regex),
}

impl From<&str> for MatchPattern {
    fn from(pattern: &str) -> Self {
        MatchPattern::Literal(pattern.to_string())
    }
}

impl From<String> for MatchPattern {
    fn from(pattern: String) -> Self {
        MatchPattern::Literal(pattern)
    }
}

impl From<Regex> for MatchPattern {
    fn from(regex: Regex) -> Self {
        MatchPattern::Regex(regex)
    }
}

impl fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPattern::Literal(text) => write!(f, "{}", text),
            MatchPattern::Regex(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

/// Strategy for testing file content
#[derive(Debug, Clone)]
enum MatchStrategy {
    Simple(String),
    Regex(Arc<Regex>),
}

/// Compiled content pattern shared by every predicate evaluation of a scan
#[derive(Debug, Clone)]
pub struct ContentMatcher {
    strategy: MatchStrategy,
}

impl ContentMatcher {
    /// Compiles a pattern. Literal text without regex metacharacters is
    /// searched as a plain substring, which finds the same matches.
    pub fn new(pattern: impl Into<MatchPattern>) -> ScanResult<Self> {
        let strategy = match pattern.into() {
            MatchPattern::Literal(text) if Self::is_simple_pattern(&text) => {
                MatchStrategy::Simple(text)
            }
            MatchPattern::Literal(text) => MatchStrategy::Regex(Arc::new(Regex::new(&text)?)),
            MatchPattern::Regex(regex) => MatchStrategy::Regex(Arc::new(regex)),
        };
        debug!("Compiled content pattern as {:?}", strategy);
        Ok(Self { strategy })
    }

    /// Determines if a pattern can use plain substring search
    fn is_simple_pattern(pattern: &str) -> bool {
        pattern.len() < SIMPLE_PATTERN_THRESHOLD
            && !pattern.contains(|c: char| c.is_ascii_punctuation() && c != '_' && c != '-')
    }

    /// Returns true if the pattern matches anywhere in `text`
    pub fn is_match(&self, text: &str) -> bool {
        match &self.strategy {
            MatchStrategy::Simple(pattern) => text.contains(pattern.as_str()),
            MatchStrategy::Regex(regex) => regex.is_match(text),
        }
    }

    /// The pattern source text
    pub fn as_str(&self) -> &str {
        match &self.strategy {
            MatchStrategy::Simple(pattern) => pattern,
            MatchStrategy::Regex(regex) => regex.as_str(),
        }
    }
}
