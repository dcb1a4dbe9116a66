//! Comma-separated tag and category lists.

/// Split a comma-separated form field into trimmed, non-empty entries.
///
/// Duplicates are removed, keeping the first occurrence.
///
/// ```
/// use folio_core::parse_tags;
///
/// assert_eq!(parse_tags(" rust, axum,,rust "), vec!["rust", "axum"]);
/// ```
#[must_use]
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_owned());
        }
    }
    tags
}

/// Render a tag list back into the form field representation.
#[must_use]
pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}
