//! Manual drag reordering.
//!
//! # Responsibility
//! - Splice one element of the displayed list to a new position.
//! - Turn the spliced list into the full set of records to rewrite.
//!
//! # Invariants
//! - Indices are validated against the displayed list, not the full set.
//! - Out-of-range indices or `from == to` produce no plan.
//! - The plan always covers every task of the full set, in full-set order.

use crate::model::task::{Task, TaskId};
use std::collections::HashMap;

/// Moves the element at `from` to `to` (remove then insert, not swap).
///
/// Returns `None` when either index is outside `[0, len)` or `from == to`.
pub fn splice<T: Clone>(items: &[T], from: usize, to: usize) -> Option<Vec<T>> {
    if from == to || from >= items.len() || to >= items.len() {
        return None;
    }

    let mut moved = items.to_vec();
    let item = moved.remove(from);
    moved.insert(to, item);
    Some(moved)
}

/// Builds the whole-table rewrite for one drag gesture.
///
/// Displayed tasks get `order` set to their new position. Tasks hidden by
/// the active filter are rewritten unchanged.
pub fn plan_reorder(full: &[Task], displayed: &[Task], from: usize, to: usize) -> Option<Vec<Task>> {
    let spliced = splice(displayed, from, to)?;
    let positions: HashMap<TaskId, i64> = spliced
        .iter()
        .zip(0_i64..)
        .map(|(task, position)| (task.id, position))
        .collect();

    let plan = full
        .iter()
        .map(|task| {
            let mut rewritten = task.clone();
            if let Some(position) = positions.get(&task.id) {
                rewritten.order = *position;
            }
            rewritten
        })
        .collect();
    Some(plan)
}
