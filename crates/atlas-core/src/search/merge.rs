//! Merging of result lists from independent search paths

use std::collections::HashSet;

use super::searchable::Searchable;

/// Union of `first` and `second` keyed by entity identity.
///
/// Keeps first-seen order, so every entry of `first` precedes entries that
/// only `second` produced. Truncated to `limit`.
pub fn union_by_identity<T: Searchable>(first: Vec<T>, second: Vec<T>, limit: usize) -> Vec<T> {
    let mut seen = HashSet::new();

    first
        .into_iter()
        .chain(second)
        .filter(|item| seen.insert(item.identity()))
        .take(limit)
        .collect()
}
