//! Key pattern matching for bulk invalidation.

use regex::Regex;
use tracing::warn;

/// Matcher over cache keys.
///
/// Patterns are regular expressions matched anywhere in the key; a pattern
/// that does not compile is matched as a literal substring instead.
#[derive(Debug, Clone)]
pub enum KeyPattern {
    Regex(Regex),
    Literal(String),
}

impl KeyPattern {
    pub fn new(pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(re) => KeyPattern::Regex(re),
            Err(e) => {
                warn!("Invalid key pattern '{}', matching literally: {}", pattern, e);
                KeyPattern::Literal(pattern.to_string())
            }
        }
    }

    /// Matches every key starting with `prefix`, taken literally.
    pub fn prefix(prefix: &str) -> Self {
        // An escaped literal always compiles
        match Regex::new(&format!("^{}", regex::escape(prefix))) {
            Ok(re) => KeyPattern::Regex(re),
            Err(_) => KeyPattern::Literal(prefix.to_string()),
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyPattern::Regex(re) => re.is_match(key),
            KeyPattern::Literal(s) => key.contains(s.as_str()),
        }
    }
}
