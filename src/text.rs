//! Text normalization and term generation.
//!
//! Descriptions and merchant names are lowercased, every character outside
//! `[a-z0-9]` becomes a space, and whitespace is collapsed. The combined text
//! of a record is never empty: a record with no usable text maps to
//! [`UNKNOWN_TEXT`] so its text channel is not all zeros.

/// Placeholder for records whose description and merchant normalize to nothing
pub const UNKNOWN_TEXT: &str = "unknown transaction";

/// Canonicalize free text.
pub fn normalize(text: &str) -> String {
    let mapped: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { ' ' })
        .collect();

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized `description merchant`, or [`UNKNOWN_TEXT`] when both are empty.
pub fn combine(description: &str, merchant: Option<&str>) -> String {
    let description = normalize(description);
    let merchant = merchant.map(normalize).unwrap_or_default();

    match (description.is_empty(), merchant.is_empty()) {
        (true, true) => UNKNOWN_TEXT.to_string(),
        (false, true) => description,
        (true, false) => merchant,
        (false, false) => format!("{description} {merchant}"),
    }
}

/// Unigrams followed by n-grams of adjacent tokens up to `ngram_max`.
///
/// Expects normalized text; duplicates are kept so callers can count them.
pub fn terms(normalized: &str, ngram_max: usize) -> Vec<String> {
    let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    let mut out: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

    for n in 2..=ngram_max.max(1) {
        if tokens.len() < n {
            break;
        }
        out.extend(tokens.windows(n).map(|w| w.join(" ")));
    }

    out
}
