//! Query set assertions.
//!
//! Equivalent to Django's `assertQuerysetEqual(..., ordered=False)`: both
//! query sets are evaluated and compared as multisets of model instances.

use std::fmt::Debug;

use easy_scoping_db::{Model, QuerySet};

fn evaluate<M: Model>(qs: &QuerySet<M>, side: &str) -> Vec<M> {
    qs.fetch()
        .unwrap_or_else(|e| panic!("Failed to evaluate {side} query set: {e}"))
}

/// Returns the instances of `left` with no counterpart in `right`, and the
/// instances of `right` left over after matching.
fn unmatched<M: PartialEq>(left: Vec<M>, mut right: Vec<M>) -> (Vec<M>, Vec<M>) {
    let mut missing = Vec::new();
    for item in left {
        match right.iter().position(|candidate| *candidate == item) {
            Some(idx) => {
                right.swap_remove(idx);
            }
            None => missing.push(item),
        }
    }
    (missing, right)
}

/// Asserts that two query sets hold the same instances, in any order.
///
/// # Panics
///
/// Panics if either query set fails to evaluate or if the contents differ.
pub fn assert_queryset_equal<M>(left: &QuerySet<M>, right: &QuerySet<M>)
where
    M: Model + PartialEq + Debug,
{
    let left_items = evaluate(left, "left");
    let right_items = evaluate(right, "right");
    let (left_len, right_len) = (left_items.len(), right_items.len());
    let (only_left, only_right) = unmatched(left_items, right_items);
    assert!(
        only_left.is_empty() && only_right.is_empty(),
        "Query sets differ ({left_len} vs {right_len} instances).\n\
         Only in left: {only_left:?}\n\
         Only in right: {only_right:?}"
    );
}

/// Asserts that two query sets do not hold the same instances.
///
/// # Panics
///
/// Panics if either query set fails to evaluate or if the contents are equal.
pub fn assert_queryset_not_equal<M>(left: &QuerySet<M>, right: &QuerySet<M>)
where
    M: Model + PartialEq + Debug,
{
    let (only_left, only_right) = unmatched(evaluate(left, "left"), evaluate(right, "right"));
    assert!(
        !(only_left.is_empty() && only_right.is_empty()),
        "Query sets are equal but were expected to differ"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_ignores_order() {
        let (l, r) = unmatched(vec![1, 2, 3], vec![3, 1, 2]);
        assert!(l.is_empty());
        assert!(r.is_empty());
    }

    #[test]
    fn test_unmatched_counts_duplicates() {
        let (l, r) = unmatched(vec![1, 1, 2], vec![1, 2, 2]);
        assert_eq!(l, vec![1]);
        assert_eq!(r, vec![2]);
    }
}
