//! Ordered-collection helpers for drag reordering.
//!
//! # Responsibility
//! - Apply list-move semantics (`from offsets → to offset`) to a vector.
//! - Write a reordered filtered view back into its backing collection.
//!
//! # Invariants
//! - Items outside the reordered scope keep their backing index.
//! - Invalid input leaves the collection untouched and returns `false`.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Moves the elements at `offsets` so they sit, in their original relative
/// order, before the element that was at `destination`.
///
/// `destination` is an index into the collection before the move and may
/// equal `items.len()` to move to the end. Duplicate offsets are ignored.
/// Returns `false` (no change) when the offsets are empty or any index is
/// out of range.
pub fn move_offsets<T>(items: &mut Vec<T>, offsets: &[usize], destination: usize) -> bool {
    let len = items.len();
    if offsets.is_empty() || destination > len || offsets.iter().any(|&index| index >= len) {
        return false;
    }

    let mut sorted = offsets.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let removed_before = sorted.iter().filter(|&&index| index < destination).count();
    let insert_at = destination - removed_before;

    let mut moved = Vec::with_capacity(sorted.len());
    for &index in sorted.iter().rev() {
        moved.push(items.remove(index));
    }
    moved.reverse();
    items.splice(insert_at..insert_at, moved);
    true
}

/// Rewrites the order of the in-scope items of `backing` to `new_order`.
///
/// The slots occupied by in-scope items are refilled in `new_order`; items
/// outside the scope are not moved. `new_order` must be a permutation of the
/// keys of the in-scope items, otherwise nothing changes and `false` is
/// returned.
pub fn apply_scoped_order<T, K>(
    backing: &mut Vec<T>,
    key_of: impl Fn(&T) -> K,
    in_scope: impl Fn(&T) -> bool,
    new_order: &[K],
) -> bool
where
    K: Eq + Hash + Copy,
{
    let slots: Vec<usize> = backing
        .iter()
        .enumerate()
        .filter(|(_, item)| in_scope(*item))
        .map(|(index, _)| index)
        .collect();
    if slots.len() != new_order.len() {
        return false;
    }

    let slot_by_key: HashMap<K, usize> = slots
        .iter()
        .map(|&index| (key_of(&backing[index]), index))
        .collect();
    if slot_by_key.len() != slots.len() {
        return false;
    }

    // source backing index for each scoped slot, in the requested order
    let mut sources = Vec::with_capacity(new_order.len());
    let mut seen = HashSet::with_capacity(new_order.len());
    for key in new_order {
        let Some(&source) = slot_by_key.get(key) else {
            return false;
        };
        if !seen.insert(*key) {
            return false;
        }
        sources.push(source);
    }

    let mut taken: Vec<Option<T>> = std::mem::take(backing).into_iter().map(Some).collect();
    let mut target_source: Vec<usize> = (0..taken.len()).collect();
    for (slot, source) in slots.iter().zip(sources) {
        target_source[*slot] = source;
    }

    backing.extend(
        target_source
            .into_iter()
            .filter_map(|source| taken[source].take()),
    );
    true
}
