//! Search filtering for the popup launcher list.

/// Items containing `query`, case-insensitively, in their original order.
///
/// An empty query matches everything.
pub fn filter<'a, S: AsRef<str>>(items: &'a [S], query: &str) -> Vec<&'a str> {
    let needle = query.to_lowercase();
    let mut matches = Vec::new();
    for item in items {
        let item: &str = item.as_ref();
        if needle.is_empty() || item.to_lowercase().contains(&needle) {
            matches.push(item);
        }
    }
    matches
}
