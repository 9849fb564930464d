// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Assignment of `order` values.
//!
//! A scope is a subset of a collection that is sequenced on its own: the
//! tasks sharing one `category_id` (including `None`), or the whole category
//! list. Every function here computes the complete new sequence for a scope
//! before touching any `order` field, and always writes `0..n` back.

use chrono::{DateTime, Utc};
use common::{Category, Task};
use std::collections::HashSet;

/// Anything carrying a position in an ordered scope.
pub trait Ordered {
    fn id(&self) -> &str;
    fn order(&self) -> u32;
    fn set_order(&mut self, order: u32);
    fn created_at(&self) -> DateTime<Utc>;
}

impl Ordered for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Ordered for Category {
    fn id(&self) -> &str {
        &self.id
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Indices of the items selected by `in_scope`, in display order.
///
/// Ties on `order` (possible in data written by older versions) fall back
/// to creation time, then to storage position.
pub fn display_sequence<T: Ordered>(items: &[T], in_scope: impl Fn(&T) -> bool) -> Vec<usize> {
    let mut sequence: Vec<usize> = (0..items.len()).filter(|&i| in_scope(&items[i])).collect();
    sequence.sort_by_key(|&i| (items[i].order(), items[i].created_at()));
    sequence
}

/// Display sequence of the tasks in `scope`.
pub fn task_sequence(tasks: &[Task], scope: Option<&str>) -> Vec<usize> {
    display_sequence(tasks, |task| task.in_scope(scope))
}

/// Display sequence of all categories.
pub fn category_sequence(categories: &[Category]) -> Vec<usize> {
    display_sequence(categories, |_| true)
}

/// Writes `0..n` into the items at `sequence`, in that order.
pub fn apply_sequence<T: Ordered>(items: &mut [T], sequence: &[usize]) {
    for (position, &index) in sequence.iter().enumerate() {
        items[index].set_order(u32::try_from(position).unwrap_or(u32::MAX));
    }
}

/// Order value for an item appended to `scope`: one past the current
/// maximum, or 0 if the scope is empty.
pub fn next_task_order(tasks: &[Task], scope: Option<&str>) -> u32 {
    tasks
        .iter()
        .filter(|task| task.in_scope(scope))
        .map(|task| task.order.saturating_add(1))
        .max()
        .unwrap_or(0)
}

/// Restores `0..n` in `scope` while keeping the current relative order.
pub fn renormalize_tasks(tasks: &mut [Task], scope: Option<&str>) {
    let sequence = task_sequence(tasks, scope);
    apply_sequence(tasks, &sequence);
}

/// Restores `0..n` across all categories while keeping their relative order.
pub fn renormalize_categories(categories: &mut [Category]) {
    let sequence = category_sequence(categories);
    apply_sequence(categories, &sequence);
}

/// Files every task whose category is not among `categories` as
/// uncategorized, appended after the existing uncategorized tasks in their
/// previous relative order. Returns how many tasks were moved.
pub fn uncategorize_dangling(tasks: &mut [Task], categories: &[Category]) -> usize {
    let known: HashSet<&str> = categories.iter().map(|c| c.id.as_str()).collect();
    let dangling = display_sequence(tasks, |task| {
        task.category_id
            .as_deref()
            .is_some_and(|id| !known.contains(id))
    });
    if dangling.is_empty() {
        return 0;
    }

    let mut sequence = task_sequence(tasks, None);
    for &i in &dangling {
        tasks[i].category_id = None;
    }
    sequence.extend(dangling.iter().copied());
    apply_sequence(tasks, &sequence);
    dangling.len()
}

/// Rearranges `sequence` to follow `ids`.
///
/// Ids that appear in `sequence` take the leading positions in the order
/// given; ids not in `sequence` and repeated ids are ignored. Members not
/// named in `ids` follow in their previous relative order.
pub fn arrange<T: Ordered>(items: &[T], sequence: &[usize], ids: &[String]) -> Vec<usize> {
    let mut placed = HashSet::with_capacity(sequence.len());
    let mut arranged = Vec::with_capacity(sequence.len());

    for id in ids {
        if let Some(&index) = sequence.iter().find(|&&i| items[i].id() == id) {
            if placed.insert(index) {
                arranged.push(index);
            }
        }
    }
    arranged.extend(sequence.iter().copied().filter(|i| !placed.contains(i)));
    arranged
}

/// Swaps the item `id` with its neighbour in `sequence`.
/// Returns `None` if the item is not in `sequence` or already at the edge.
pub fn shift<T: Ordered>(
    items: &[T],
    sequence: &[usize],
    id: &str,
    direction: Direction,
) -> Option<Vec<usize>> {
    let at = sequence.iter().position(|&i| items[i].id() == id)?;
    let neighbour = match direction {
        Direction::Up => at.checked_sub(1)?,
        Direction::Down => Some(at + 1).filter(|&n| n < sequence.len())?,
    };
    let mut shifted = sequence.to_vec();
    shifted.swap(at, neighbour);
    Some(shifted)
}

/// Moves the item `id` to position `target` in `sequence`, clamping
/// `target` to the last position. Returns `None` if the item is not in
/// `sequence`.
pub fn move_to<T: Ordered>(
    items: &[T],
    sequence: &[usize],
    id: &str,
    target: usize,
) -> Option<Vec<usize>> {
    let at = sequence.iter().position(|&i| items[i].id() == id)?;
    let mut moved = sequence.to_vec();
    let index = moved.remove(at);
    moved.insert(target.min(moved.len()), index);
    Some(moved)
}

/// True when the orders at `sequence` are exactly `0..n` in that order.
pub fn is_contiguous<T: Ordered>(items: &[T], sequence: &[usize]) -> bool {
    sequence
        .iter()
        .enumerate()
        .all(|(position, &i)| items[i].order() as usize == position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, scope: Option<&str>, order: u32) -> Task {
        let mut task = Task::new(id, scope.map(str::to_string), order).unwrap();
        task.id = id.to_string();
        task
    }

    fn ids_of(tasks: &[Task], sequence: &[usize]) -> Vec<String> {
        sequence.iter().map(|&i| tasks[i].id.clone()).collect()
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_task_sequence_is_scoped_and_sorted() {
        let tasks = vec![
            task("b", None, 1),
            task("x", Some("g1"), 0),
            task("a", None, 0),
        ];

        assert_eq!(ids_of(&tasks, &task_sequence(&tasks, None)), ids(&["a", "b"]));
        assert_eq!(ids_of(&tasks, &task_sequence(&tasks, Some("g1"))), ids(&["x"]));
        assert!(task_sequence(&tasks, Some("g2")).is_empty());
    }

    #[test]
    fn test_next_order() {
        let tasks = vec![task("a", None, 0), task("b", None, 4), task("x", Some("g1"), 9)];

        assert_eq!(next_task_order(&tasks, None), 5);
        assert_eq!(next_task_order(&tasks, Some("g1")), 10);
        assert_eq!(next_task_order(&tasks, Some("g2")), 0);
    }

    #[test]
    fn test_renormalize_closes_gaps_and_breaks_ties() {
        let mut tasks = vec![
            task("c", None, 7),
            task("a", None, 2),
            task("b", None, 2),
            task("x", Some("g1"), 5),
        ];
        tasks[2].created_at = tasks[1].created_at + chrono::Duration::seconds(1);

        renormalize_tasks(&mut tasks, None);

        let sequence = task_sequence(&tasks, None);
        assert_eq!(ids_of(&tasks, &sequence), ids(&["a", "b", "c"]));
        assert!(is_contiguous(&tasks, &sequence));
        // Other scopes are untouched.
        assert_eq!(tasks[3].order, 5);
    }

    #[test]
    fn test_arrange_follows_ids_then_keeps_the_rest() {
        let tasks = vec![
            task("a", None, 0),
            task("b", None, 1),
            task("c", None, 2),
            task("x", Some("g1"), 0),
        ];
        let sequence = task_sequence(&tasks, None);

        let arranged = arrange(&tasks, &sequence, &ids(&["c", "x", "c", "zzz", "a"]));

        assert_eq!(ids_of(&tasks, &arranged), ids(&["c", "a", "b"]));
    }

    #[test]
    fn test_shift_swaps_with_neighbour() {
        let tasks = vec![task("a", None, 0), task("b", None, 1), task("c", None, 2)];
        let sequence = task_sequence(&tasks, None);

        let up = shift(&tasks, &sequence, "b", Direction::Up).unwrap();
        assert_eq!(ids_of(&tasks, &up), ids(&["b", "a", "c"]));

        let down = shift(&tasks, &sequence, "b", Direction::Down).unwrap();
        assert_eq!(ids_of(&tasks, &down), ids(&["a", "c", "b"]));
    }

    #[test]
    fn test_shift_is_none_at_the_edges() {
        let tasks = vec![task("a", None, 0), task("b", None, 1)];
        let sequence = task_sequence(&tasks, None);

        assert_eq!(shift(&tasks, &sequence, "a", Direction::Up), None);
        assert_eq!(shift(&tasks, &sequence, "b", Direction::Down), None);
        assert_eq!(shift(&tasks, &sequence, "missing", Direction::Up), None);
    }

    #[test]
    fn test_move_to_clamps_target() {
        let tasks = vec![task("a", None, 0), task("b", None, 1), task("c", None, 2)];
        let sequence = task_sequence(&tasks, None);

        let moved = move_to(&tasks, &sequence, "a", 1).unwrap();
        assert_eq!(ids_of(&tasks, &moved), ids(&["b", "a", "c"]));

        let moved = move_to(&tasks, &sequence, "a", 99).unwrap();
        assert_eq!(ids_of(&tasks, &moved), ids(&["b", "c", "a"]));

        let moved = move_to(&tasks, &sequence, "c", 0).unwrap();
        assert_eq!(ids_of(&tasks, &moved), ids(&["c", "a", "b"]));
    }

    #[test]
    fn test_dangling_tasks_join_the_uncategorized_scope() {
        let mut home = Category::new("Home", "#50c878", 0).unwrap();
        home.id = "home".to_string();
        let mut tasks = vec![
            task("gone-2", Some("gone"), 1),
            task("loose", None, 0),
            task("dishes", Some("home"), 0),
            task("gone-1", Some("gone"), 0),
        ];

        let moved = uncategorize_dangling(&mut tasks, &[home.clone()]);

        assert_eq!(moved, 2);
        let sequence = task_sequence(&tasks, None);
        assert_eq!(ids_of(&tasks, &sequence), ids(&["loose", "gone-1", "gone-2"]));
        assert!(is_contiguous(&tasks, &sequence));
        assert_eq!(tasks[2].category_id.as_deref(), Some("home"));
        assert_eq!(uncategorize_dangling(&mut tasks, &[home]), 0);
    }

    #[test]
    fn test_categories_share_one_scope() {
        let mut categories = vec![
            Category::new("Work", "#4a90d9", 3).unwrap(),
            Category::new("Home", "#50c878", 1).unwrap(),
        ];

        renormalize_categories(&mut categories);

        assert_eq!(categories[0].order, 1);
        assert_eq!(categories[1].order, 0);
        assert!(is_contiguous(&categories, &category_sequence(&categories)));
    }
}
