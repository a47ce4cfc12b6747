//! Slug derivation for public spot URLs.
//!
//! The slug is part of the public route (`/{country}/{city}/{name}`), so the
//! byte layout must stay stable across releases. Segments are lower-cased and
//! every maximal run of characters outside `[a-z0-9]` collapses to a single
//! hyphen. Leading and trailing hyphens are kept on purpose.

/// Builds the full slug, `country/city/name`.
pub fn slug(name: &str, city: &str, country: &str) -> String {
    format!("{}/{}/{}", segment(country), segment(city), segment(name))
}

/// Normalizes a single slug segment.
pub fn segment(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for ch in input.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_slug() {
        assert_eq!(
            slug("Al-Noor Mosque", "New York", "USA"),
            "usa/new-york/al-noor-mosque"
        );
    }

    #[test]
    fn test_stable_across_calls() {
        let first = slug("Quiet Room", "NYC", "USA");
        let second = slug("Quiet Room", "NYC", "USA");
        assert_eq!(first, second);
        assert_eq!(first, "usa/nyc/quiet-room");
    }

    #[test]
    fn test_runs_collapse_to_one_hyphen() {
        assert_eq!(segment("St.  Mary's"), "st-mary-s");
    }

    #[test]
    fn test_no_trimming_of_edge_hyphens() {
        assert_eq!(segment(" padded "), "-padded-");
        assert_eq!(segment("!!"), "-");
    }

    #[test]
    fn test_non_ascii_becomes_hyphen() {
        assert_eq!(segment("Köln"), "k-ln");
    }

    #[test]
    fn test_digits_survive() {
        assert_eq!(segment("Room 42"), "room-42");
    }
}
