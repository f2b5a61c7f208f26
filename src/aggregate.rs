//! Shared grouping and filtering primitives used by both engines.
//!
//! Grouping preserves first-seen key order and element order within each
//! group, so the PI and scrum views agree on ordering without re-sorting.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::hash::Hash;

/// Group items by a derived key. Keys appear in first-seen order; items
/// keep their input order within each group.
pub fn group_by<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<(K, Vec<T>)>
where
    K: Eq + Hash + Clone,
    F: FnMut(&T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let k = key(&item);
        match index.get(&k) {
            Some(&slot) => groups[slot].1.push(item),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![item]));
            }
        }
    }
    groups
}

/// Inclusive timestamp range check; a None bound is unbounded on that side.
pub fn in_range(
    ts: DateTime<Utc>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    if let Some(from) = from {
        if ts < from {
            return false;
        }
    }
    if let Some(to) = to {
        if ts > to {
            return false;
        }
    }
    true
}

/// Multi-value filter check. An empty allow list admits everything; a
/// missing value never matches a non-empty list.
pub fn matches_filter(value: Option<&str>, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    value.is_some_and(|v| allowed.iter().any(|a| a == v))
}
