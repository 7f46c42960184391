//! Name matching for list-then-match resource discovery.
//!
//! Topics and APIs have no deterministic identifiers; they are found by
//! listing and comparing names. The comparison rule is explicit here instead
//! of inline string containment, so each call site states what it tolerates.

use std::fmt;

/// How a candidate name is compared during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    /// Candidate must equal the name exactly.
    Exact(String),
    /// Candidate must contain the fragment anywhere.
    Contains(String),
}

impl NameMatch {
    pub fn exact(name: impl Into<String>) -> Self {
        Self::Exact(name.into())
    }

    pub fn contains(fragment: impl Into<String>) -> Self {
        Self::Contains(fragment.into())
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            NameMatch::Exact(name) => candidate == name,
            NameMatch::Contains(fragment) => candidate.contains(fragment),
        }
    }
}

impl fmt::Display for NameMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameMatch::Exact(name) => write!(f, "name \"{name}\""),
            NameMatch::Contains(fragment) => write!(f, "name containing \"{fragment}\""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_requires_equality() {
        let m = NameMatch::exact("inventory-api-main");
        assert!(m.matches("inventory-api-main"));
        assert!(!m.matches("inventory-api-main-v2"));
        assert!(!m.matches("inventory-api"));
    }

    #[test]
    fn contains_accepts_any_position() {
        let m = NameMatch::contains("low-stock");
        assert!(m.matches("low-stock-inventory-main"));
        assert!(m.matches("arn:aws:sns:us-east-1:123456789012:low-stock-inventory-main"));
        assert!(m.matches("low-stock"));
        assert!(!m.matches("high-stock-alerts"));
    }

    #[test]
    fn display_names_the_rule() {
        assert_eq!(
            NameMatch::exact("a").to_string(),
            "name \"a\""
        );
        assert_eq!(
            NameMatch::contains("b").to_string(),
            "name containing \"b\""
        );
    }
}
