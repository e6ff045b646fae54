//! Duplicate detection for comment placement.
//!
//! The single source of truth for every "already posted" decision in the
//! engine. The containment check is asymmetric: the candidate text must
//! appear inside the existing comment, not the other way around.

/// Decide whether `existing` already covers `candidate`.
///
/// Both sides are trimmed and lowercased; absent or empty text on either
/// side is never a duplicate.
pub fn is_duplicate(candidate: &str, existing: Option<&str>) -> bool {
    let candidate = candidate.trim().to_lowercase();
    if candidate.is_empty() {
        return false;
    }

    let Some(existing) = existing else {
        return false;
    };
    let existing = existing.trim().to_lowercase();
    if existing.is_empty() {
        return false;
    }

    existing.contains(&candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sides_never_match() {
        assert!(!is_duplicate("", Some("hello")));
        assert!(!is_duplicate("   ", Some("hello")));
        assert!(!is_duplicate("hello", Some("")));
        assert!(!is_duplicate("hello", Some("   ")));
        assert!(!is_duplicate("hello", None));
    }

    #[test]
    fn self_duplicate_for_non_empty_text() {
        assert!(is_duplicate("promo text", Some("promo text")));
    }

    #[test]
    fn case_and_surrounding_whitespace_ignored() {
        assert!(is_duplicate("  Hello World ", Some("hello world")));
        assert!(is_duplicate("HELLO", Some("  say hello there ")));
    }

    #[test]
    fn containment_is_asymmetric() {
        assert!(is_duplicate("hello", Some("hello world")));
        assert!(!is_duplicate("hello world", Some("hello")));
    }

    #[test]
    fn inner_whitespace_is_significant() {
        assert!(!is_duplicate("hello  world", Some("hello world")));
    }
}
