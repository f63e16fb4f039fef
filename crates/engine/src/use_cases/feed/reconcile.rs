//! Merge of the live window with extension pages.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::Hash;

use crate::infrastructure::ports::{Document, StoreQuery};

/// Concatenate `live` (fresher) and `extension`, keep the first occurrence
/// of every id, then sort with `compare`.
///
/// The sort is stable, so items that compare equal keep live-first order.
pub fn reconcile<T, K>(
    live: &[T],
    extension: &[T],
    id_of: impl Fn(&T) -> K,
    compare: impl Fn(&T, &T) -> Ordering,
) -> Vec<T>
where
    T: Clone,
    K: Eq + Hash,
{
    let mut seen = HashSet::with_capacity(live.len() + extension.len());
    let mut merged: Vec<T> = live
        .iter()
        .chain(extension)
        .filter(|item| seen.insert(id_of(item)))
        .cloned()
        .collect();
    merged.sort_by(|a, b| compare(a, b));
    merged
}

/// [`reconcile`] over store documents in `query` order.
pub fn reconcile_documents(
    query: &StoreQuery,
    live: &[Document],
    extension: &[Document],
) -> Vec<Document> {
    reconcile(live, extension, |doc| doc.id.clone(), |a, b| query.compare(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: &'static str,
        rank: u32,
        version: u32,
    }

    fn row(id: &'static str, rank: u32) -> Row {
        Row {
            id,
            rank,
            version: 0,
        }
    }

    fn ids(rows: &[Row]) -> Vec<&'static str> {
        rows.iter().map(|r| r.id).collect()
    }

    fn merge(live: &[Row], extension: &[Row]) -> Vec<Row> {
        reconcile(live, extension, |r| r.id, |a, b| a.rank.cmp(&b.rank))
    }

    #[test]
    fn overlapping_pages_are_deduplicated() {
        let live = [row("A", 1), row("B", 2), row("C", 3)];
        let extension = [row("C", 3), row("D", 4), row("E", 5)];
        assert_eq!(ids(&merge(&live, &extension)), vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn live_copy_wins_over_extension_copy() {
        let mut fresh = row("C", 3);
        fresh.version = 2;
        let merged = merge(&[fresh.clone()], &[row("C", 3)]);
        assert_eq!(merged, vec![fresh]);
    }

    #[test]
    fn bumped_item_moves_to_its_new_position() {
        // "D" got a reply: the live window now holds it on top while the
        // extension page still has the stale copy further down.
        let live = [row("D", 0), row("A", 1), row("B", 2)];
        let extension = [row("C", 3), row("D", 4), row("E", 5)];
        assert_eq!(ids(&merge(&live, &extension)), vec!["D", "A", "B", "C", "E"]);
    }

    #[test]
    fn no_item_appears_twice_even_from_repeated_pages() {
        let live = [row("A", 1)];
        let extension = [row("B", 2), row("C", 3), row("B", 2), row("C", 3)];
        assert_eq!(ids(&merge(&live, &extension)), vec!["A", "B", "C"]);
    }

    #[test]
    fn empty_inputs() {
        assert!(merge(&[], &[]).is_empty());
        assert_eq!(ids(&merge(&[], &[row("X", 1)])), vec!["X"]);
    }
}
