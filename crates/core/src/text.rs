//! String helpers used when building and unpacking listing queries.

/// Separator used by `STRING_AGG` for genre and collection names.
///
/// The ASCII unit separator (`CHR(31)` in SQL), which never appears in a name.
pub const LIST_DELIMITER: char = '\u{1f}';

/// Split a `STRING_AGG` result back into its items.
///
/// `None` and the empty string both yield an empty list, never `[""]`.
/// Items are trimmed and blank items dropped; order is preserved.
pub fn split_delimited(value: Option<&str>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(v) => v
            .split(LIST_DELIMITER)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Build an `ILIKE` pattern matching `term` anywhere in the column.
///
/// `%`, `_` and `\` in the term are escaped so they match literally
/// (PostgreSQL's default `LIKE` escape character is `\`).
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Trim a free-text filter; blank input counts as absent.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
