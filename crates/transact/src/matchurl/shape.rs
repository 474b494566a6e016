//! Admission filter for conditional expressions.

use regex::Regex;

/// Shape filter deciding which conditional expressions enter batch
/// resolution.
///
/// The accepted shape is `<target>?<param>=<value>`: a non-empty target, a
/// plain lowercase parameter name (no modifiers, no underscore-prefixed
/// specials), and a non-empty first value. Expressions failing the check are
/// not an error; they are left for the write phase to resolve on its own.
#[derive(Debug, Clone)]
pub struct MatchUrlPattern {
    pattern: Regex,
}

impl MatchUrlPattern {
    /// Compiles the filter.
    pub fn new() -> Self {
        MatchUrlPattern {
            pattern: Regex::new(r"^[^?]+\?[a-z0-9-]+=[^&,]+").expect("fixed pattern is valid"),
        }
    }

    /// Returns `true` if the expression has the batched-resolution shape.
    pub fn is_match(&self, expression: &str) -> bool {
        self.pattern.is_match(expression)
    }
}

impl Default for MatchUrlPattern {
    fn default() -> Self {
        MatchUrlPattern::new()
    }
}
