//! Cart name generation.
//!
//! New carts are named "My Cart #NNN" with the lowest unused three-digit
//! suffix. Existing names are scanned for a trailing `#NNN` pattern; when
//! every suffix in 1..=999 is taken the generator falls back to a random
//! suffix in the same range, accepting a possible collision.

use std::collections::HashSet;

use rand::Rng;

const NAME_PREFIX: &str = "My Cart";
const MAX_SUFFIX: u32 = 999;

/// Pick a cart name whose numeric suffix is not used by any existing name.
#[must_use]
pub fn generate_cart_name<'a>(existing: impl IntoIterator<Item = &'a str>) -> String {
    let used: HashSet<u32> = existing
        .into_iter()
        .filter_map(trailing_suffix)
        .collect();

    for candidate in 1..=MAX_SUFFIX {
        if !used.contains(&candidate) {
            return format!("{NAME_PREFIX} #{candidate:03}");
        }
    }

    // Every suffix is taken; a collision is acceptable here.
    let fallback = rand::rng().random_range(1..=MAX_SUFFIX);
    format!("{NAME_PREFIX} #{fallback:03}")
}

/// Parse a trailing `#NNN` suffix (1-3 digits) from a cart name.
fn trailing_suffix(name: &str) -> Option<u32> {
    let (_, tail) = name.rsplit_once('#')?;
    if tail.is_empty() || tail.len() > 3 || !tail.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_cart_gets_001() {
        assert_eq!(generate_cart_name([]), "My Cart #001");
    }

    #[test]
    fn picks_next_unused_suffix() {
        let existing = ["My Cart #001", "My Cart #002", "My Cart #003"];
        assert_eq!(generate_cart_name(existing), "My Cart #004");
    }

    #[test]
    fn fills_gaps_with_lowest_unused() {
        let existing = ["My Cart #001", "My Cart #003"];
        assert_eq!(generate_cart_name(existing), "My Cart #002");
    }

    #[test]
    fn ignores_names_without_numeric_suffix() {
        let existing = ["Groceries", "My Cart #abc", "Trip #12345"];
        assert_eq!(generate_cart_name(existing), "My Cart #001");
    }

    #[test]
    fn unpadded_suffixes_still_count() {
        let existing = ["Old Cart #1", "My Cart #002"];
        assert_eq!(generate_cart_name(existing), "My Cart #003");
    }

    #[test]
    fn falls_back_to_random_when_exhausted() {
        let all: Vec<String> = (1..=999).map(|n| format!("My Cart #{n:03}")).collect();
        let name = generate_cart_name(all.iter().map(String::as_str));
        let suffix = name
            .rsplit_once('#')
            .and_then(|(_, tail)| tail.parse::<u32>().ok())
            .unwrap();
        assert!((1..=999).contains(&suffix));
        assert!(name.starts_with("My Cart #"));
    }
}
