//! Username derivation and collision-free resolution
//!
//! Username comparisons are case-insensitive throughout; the provider
//! treats `Alice` and `alice` as the same account name.

use crate::directory::DirectorySnapshot;
use std::collections::HashSet;

/// Placeholder base when no name parts are available
const PLACEHOLDER_USERNAME: &str = "pending";

/// Case-insensitive membership test against a snapshot
///
/// Returns `false` for an empty snapshot or an absent name; never an error.
pub fn exists(username: &str, snapshot: &DirectorySnapshot) -> bool {
    snapshot.contains_username(username)
}

/// Derive a collision-free username from a base candidate
///
/// Returns `base` unchanged when it is not taken. Otherwise probes
/// `base1`, `base2`, ... and returns the first free candidate. Both the
/// base and the suffixed candidates are compared case-insensitively.
/// Deterministic, and terminates within `taken.len() + 1` probes.
pub fn resolve_unique(base: &str, taken: &HashSet<String>) -> String {
    let taken_lower: HashSet<String> = taken.iter().map(|n| n.to_lowercase()).collect();

    if !taken_lower.contains(&base.to_lowercase()) {
        return base.to_string();
    }

    let mut counter = 1;
    loop {
        let candidate = format!("{}{}", base, counter);
        if !taken_lower.contains(&candidate.to_lowercase()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Build the starting username from name parts
///
/// Both parts present: lowercased first name, a hyphen, and the first
/// letter of the last name. One part: that part lowercased. Spaces become
/// hyphens either way. Neither part: a fixed placeholder.
pub fn derive_base_username(first_name: &str, last_name: &str) -> String {
    let first = first_name.trim();
    let last = last_name.trim();

    let base = if !first.is_empty() && !last.is_empty() {
        let initial = last.chars().next().unwrap().to_lowercase().to_string();
        format!("{}-{}", first.to_lowercase(), initial)
    } else if !first.is_empty() {
        first.to_lowercase()
    } else if !last.is_empty() {
        last.to_lowercase()
    } else {
        return PLACEHOLDER_USERNAME.to_string();
    };

    base.replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{test_user, DirectorySnapshot};

    fn taken(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_exists_case_insensitive() {
        let snapshot = DirectorySnapshot::new(vec![test_user("1", "Alice")]);

        assert_eq!(exists("Alice", &snapshot), exists("alice", &snapshot));
        assert!(exists("aLiCe", &snapshot));
        assert!(!exists("bob", &snapshot));
    }

    #[test]
    fn test_exists_empty_snapshot_is_false() {
        assert!(!exists("anyone", &DirectorySnapshot::default()));
    }

    #[test]
    fn test_resolve_unique_untaken_base_unchanged() {
        assert_eq!(resolve_unique("jdoe", &taken(&["asmith"])), "jdoe");
        assert_eq!(resolve_unique("jdoe", &HashSet::new()), "jdoe");
    }

    #[test]
    fn test_resolve_unique_suffixes_from_one() {
        assert_eq!(resolve_unique("jdoe", &taken(&["jdoe"])), "jdoe1");
    }

    #[test]
    fn test_resolve_unique_skips_taken_suffixes() {
        assert_eq!(resolve_unique("jdoe", &taken(&["jdoe", "jdoe1"])), "jdoe2");
    }

    #[test]
    fn test_resolve_unique_case_insensitive() {
        assert_eq!(resolve_unique("jdoe", &taken(&["JDoe"])), "jdoe1");
        assert_eq!(resolve_unique("JDoe", &taken(&["jdoe", "JDOE1"])), "JDoe2");
    }

    #[test]
    fn test_resolve_unique_result_never_taken() {
        let names = taken(&["u", "u1", "u2", "u3", "u5"]);
        let result = resolve_unique("u", &names);
        assert_eq!(result, "u4");
        assert!(!names.contains(&result));
    }

    #[test]
    fn test_resolve_unique_deterministic() {
        let names = taken(&["jdoe", "jdoe1", "jdoe2"]);
        let first = resolve_unique("jdoe", &names);
        for _ in 0..10 {
            assert_eq!(resolve_unique("jdoe", &names), first);
        }
    }

    #[test]
    fn test_derive_base_username_both_names() {
        assert_eq!(derive_base_username("Jane", "Doe"), "jane-d");
    }

    #[test]
    fn test_derive_base_username_first_only() {
        assert_eq!(derive_base_username("Jane", ""), "jane");
    }

    #[test]
    fn test_derive_base_username_last_only() {
        assert_eq!(derive_base_username("", "Doe"), "doe");
    }

    #[test]
    fn test_derive_base_username_neither() {
        assert_eq!(derive_base_username("", ""), "pending");
        assert_eq!(derive_base_username("  ", " "), "pending");
    }

    #[test]
    fn test_derive_base_username_spaces_become_hyphens() {
        assert_eq!(derive_base_username("Mary Jane", "Watson"), "mary-jane-w");
        assert_eq!(derive_base_username("Mary Jane", ""), "mary-jane");
    }
}
