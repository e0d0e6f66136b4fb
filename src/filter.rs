/// Substring row filter.
///
/// A row is visible when the concatenation of all its cell texts contains
/// the trimmed filter text, case-insensitively. The empty (or whitespace
/// only) filter matches every row.

/// Normalize the raw filter line into the needle used for matching.
pub fn needle(filter: &str) -> String {
    filter.trim().to_lowercase()
}

/// Does a row with the given cells match the normalized needle?
pub fn row_matches(needle: &str, cells: impl Iterator<Item = impl AsRef<str>>) -> bool {
    if needle.is_empty() {
        return true;
    }
    let full_text: String = cells.map(|c| c.as_ref().to_lowercase()).collect();
    full_text.contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(filter: &str, cells: &[&str]) -> bool {
        row_matches(&needle(filter), cells.iter())
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(matches("", &["Mug", "€10"]));
        assert!(matches("   ", &[]));
    }

    #[test]
    fn filter_is_trimmed_and_case_insensitive() {
        assert!(matches("  MUG  ", &["Coffee Mug", "€10"]));
        assert!(matches("mug", &["COFFEE MUG"]));
        assert!(!matches("mug", &["Teapot", "€15"]));
    }

    #[test]
    fn match_spans_the_whole_row_text() {
        // Plain substring containment over the row text, no tokenization.
        assert!(matches("10", &["Mug", "€10", "3"]));
        assert!(matches("€1", &["Teapot", "€15"]));
    }
}
