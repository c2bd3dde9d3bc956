//! In-place ordering of scene objects by their position-sum key (`x + y`).
//!
//! Two collections that complete loading in arbitrary order are sorted by the
//! same key once both are full, so index `i` means the same shelf slot in each.

use thiserror::Error;

use crate::types::Vec3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderingError {
    #[error("collection holds {actual} of {expected} entries")]
    Underpopulated { expected: usize, actual: usize },
}

/// Anything with a world position.
pub trait PositionKey {
    fn position(&self) -> Vec3;

    /// Sort key: world X plus world Y.
    #[inline]
    fn position_sum(&self) -> f32 {
        let p = self.position();
        p.x + p.y
    }
}

impl PositionKey for Vec3 {
    fn position(&self) -> Vec3 {
        *self
    }
}

/// Tuples sort by their first element.
impl<A: PositionKey, B> PositionKey for (A, B) {
    fn position(&self) -> Vec3 {
        self.0.position()
    }
}

/// Sort `list[start..=end]` ascending by position sum.
///
/// Lomuto partition with the last element as pivot. Empty or single-element
/// ranges (`start >= end`) are left untouched; `end` past the list is clamped.
pub fn quick_sort<T: PositionKey>(list: &mut [T], start: usize, end: usize) {
    if list.is_empty() {
        return;
    }
    let end = end.min(list.len() - 1);
    if start >= end {
        return;
    }
    let pivot = partition(list, start, end);
    if pivot > start {
        quick_sort(list, start, pivot - 1);
    }
    quick_sort(list, pivot + 1, end);
}

fn partition<T: PositionKey>(list: &mut [T], start: usize, end: usize) -> usize {
    let pivot = list[end].position_sum();
    let mut store = start;
    for i in start..end {
        if list[i].position_sum() < pivot {
            list.swap(i, store);
            store += 1;
        }
    }
    list.swap(store, end);
    store
}

/// Sort the whole collection, refusing to run before it holds `expected` entries.
pub fn sort_full_population<T: PositionKey>(
    list: &mut [T],
    expected: usize,
) -> Result<(), OrderingError> {
    if list.len() < expected {
        return Err(OrderingError::Underpopulated {
            expected,
            actual: list.len(),
        });
    }
    if let Some(last) = list.len().checked_sub(1) {
        quick_sort(list, 0, last);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<T: PositionKey>(list: &[T]) -> Vec<f32> {
        list.iter().map(PositionKey::position_sum).collect()
    }

    fn is_sorted(keys: &[f32]) -> bool {
        keys.windows(2).all(|w| w[0] <= w[1])
    }

    #[test]
    fn sorts_shuffled_positions() {
        let mut list = vec![
            Vec3::new(3.0, 1.0, 0.0),
            Vec3::new(-2.0, 0.5, 9.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, -4.0, 1.0),
            Vec3::new(-7.0, 3.0, 2.0),
        ];
        let mut before = keys(&list);
        let len = list.len();
        quick_sort(&mut list, 0, len - 1);
        let after = keys(&list);
        assert!(is_sorted(&after));
        before.sort_by(f32::total_cmp);
        assert_eq!(before, after);
    }

    #[test]
    fn equal_keys_terminate() {
        let mut list = vec![Vec3::new(1.0, 1.0, 0.0); 24];
        quick_sort(&mut list, 0, 23);
        assert!(list.iter().all(|p| p.position_sum() == 2.0));
    }

    #[test]
    fn handles_sorted_and_reversed_input() {
        let mut sorted: Vec<Vec3> = (0..24).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let mut reversed: Vec<Vec3> = sorted.iter().rev().copied().collect();
        quick_sort(&mut sorted, 0, 23);
        quick_sort(&mut reversed, 0, 23);
        assert_eq!(sorted, reversed);
        assert!(is_sorted(&keys(&sorted)));
    }

    #[test]
    fn empty_and_single_ranges_are_no_ops() {
        let mut empty: Vec<Vec3> = Vec::new();
        quick_sort(&mut empty, 0, 0);
        assert!(empty.is_empty());

        let mut list = vec![Vec3::new(5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
        quick_sort(&mut list, 1, 1);
        assert_eq!(list[0].x, 5.0);
        quick_sort(&mut list, 1, 0);
        assert_eq!(list[0].x, 5.0);
    }

    #[test]
    fn pairs_sort_by_first_element() {
        let mut list = vec![
            (Vec3::new(2.0, 0.0, 0.0), "b"),
            (Vec3::new(1.0, 0.0, 0.0), "a"),
        ];
        quick_sort(&mut list, 0, 1);
        assert_eq!(list[0].1, "a");
    }

    #[test]
    fn guard_rejects_partial_population() {
        let mut list = vec![Vec3::zeros(); 23];
        assert_eq!(
            sort_full_population(&mut list, 24),
            Err(OrderingError::Underpopulated {
                expected: 24,
                actual: 23
            })
        );
        list.push(Vec3::zeros());
        assert!(sort_full_population(&mut list, 24).is_ok());
    }
}
