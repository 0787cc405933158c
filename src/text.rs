//! Text normalization and the similarity ratio used by the duplicate
//! suppressor.

use similar::{Algorithm, TextDiff};

/// Lowercase, drop punctuation/symbols (emoji included), collapse
/// whitespace runs to a single space.
pub fn normalize(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Matching-blocks ratio `2·M / T`, where `M` is the number of chars the
/// character diff keeps in common and `T` the combined length.  Two empty
/// strings are identical (`1.0`).
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_chars(a, b);
    f64::from(diff.ratio())
}
