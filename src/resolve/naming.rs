//! The derivative-marker naming convention.
//!
//! Derivatives are denoted by trailing marker characters: `f` → `f_` →
//! `f__`, and the derivatives of functions from module `m`, when not
//! colocated, live in a sibling module `m_`. The convention is a de facto
//! wire format for cross-module resolution, so it is kept in one place as
//! pure functions.

/// The marker character appended once per differentiation order.
pub const MARKER: char = '_';

/// Upper bound on the derivative orders the resolver will chase. Names
/// beyond this bound are reported as a cycle instead of recursed into.
pub const MAX_DERIVATIVE_ORDER: usize = 32;

/// Candidate name for the `order`-th derivative of `name`.
pub fn derivative_name(name: &str, order: usize) -> String {
    let mut candidate = String::with_capacity(name.len() + order);
    candidate.push_str(name);
    for _ in 0..order {
        candidate.push(MARKER);
    }
    candidate
}

/// Name of the first derivative of `name`.
pub fn mark(name: &str) -> String {
    derivative_name(name, 1)
}

/// Strip exactly one trailing marker, if present.
pub fn strip_one(name: &str) -> Option<&str> {
    name.strip_suffix(MARKER)
}

/// Strip all trailing markers, recovering the base name.
pub fn base(name: &str) -> &str {
    name.trim_end_matches(MARKER)
}

/// Number of trailing markers on `name`.
pub fn order(name: &str) -> usize {
    name.len() - base(name).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivative_name_appends_markers() {
        assert_eq!(derivative_name("thrust", 0), "thrust");
        assert_eq!(derivative_name("thrust", 1), "thrust_");
        assert_eq!(derivative_name("thrust", 3), "thrust___");
        assert_eq!(mark("thrust"), "thrust_");
    }

    #[test]
    fn order_counts_trailing_markers_only() {
        assert_eq!(order("thrust"), 0);
        assert_eq!(order("thrust__"), 2);
        // Interior markers are part of the base name.
        assert_eq!(order("max_thrust"), 0);
        assert_eq!(base("max_thrust_"), "max_thrust");
    }

    #[test]
    fn strip_round_trips() {
        assert_eq!(strip_one("f__"), Some("f_"));
        assert_eq!(strip_one("f"), None);
        assert_eq!(base(&derivative_name("f", 5)), "f");
    }
}
