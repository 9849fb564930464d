// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::ordering;

use common::{Category, Task};

/// Which tasks a list should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    Uncategorized,
    Category(String),
}

/// Tasks of one scope in display order, with the category that owns them.
/// `category` is `None` for the uncategorized group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGroup {
    pub category: Option<Category>,
    pub tasks: Vec<Task>,
}

impl TaskGroup {
    pub fn scope(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.id.as_str())
    }
}

/// Tasks of `scope`, sorted by `order`.
pub fn tasks_in_scope(tasks: &[Task], scope: Option<&str>) -> Vec<Task> {
    ordering::task_sequence(tasks, scope)
        .into_iter()
        .map(|i| tasks[i].clone())
        .collect()
}

/// Categories sorted by `order`.
pub fn sorted_categories(categories: &[Category]) -> Vec<Category> {
    ordering::category_sequence(categories)
        .into_iter()
        .map(|i| categories[i].clone())
        .collect()
}

/// Uncategorized tasks in display order, followed by any task whose
/// category is not in `categories`.
fn uncategorized(tasks: &[Task], categories: &[Category]) -> Vec<Task> {
    let mut listed = tasks_in_scope(tasks, None);
    let dangling = ordering::display_sequence(tasks, |task| {
        task.category_id
            .as_deref()
            .is_some_and(|id| !categories.iter().any(|c| c.id == id))
    });
    listed.extend(dangling.into_iter().map(|i| tasks[i].clone()));
    listed
}

/// Groups tasks by category for display.
///
/// The uncategorized group always comes first and is present even when
/// empty; one group per category follows in category order. Tasks filed
/// under a category that does not exist are shown as uncategorized.
pub fn group_tasks(tasks: &[Task], categories: &[Category]) -> Vec<TaskGroup> {
    let mut groups = Vec::with_capacity(categories.len() + 1);
    groups.push(TaskGroup {
        category: None,
        tasks: uncategorized(tasks, categories),
    });
    for category in sorted_categories(categories) {
        let scoped = tasks_in_scope(tasks, Some(&category.id));
        groups.push(TaskGroup {
            category: Some(category),
            tasks: scoped,
        });
    }
    groups
}

/// Tasks selected by `filter`, in display order. `All` lists the groups
/// of [`group_tasks`] one after another.
pub fn filter_tasks(tasks: &[Task], categories: &[Category], filter: &TaskFilter) -> Vec<Task> {
    match filter {
        TaskFilter::All => group_tasks(tasks, categories)
            .into_iter()
            .flat_map(|group| group.tasks)
            .collect(),
        TaskFilter::Uncategorized => uncategorized(tasks, categories),
        TaskFilter::Category(id) => tasks_in_scope(tasks, Some(id)),
    }
}

/// The category a task is filed under, if any.
pub fn category_of<'a>(task: &Task, categories: &'a [Category]) -> Option<&'a Category> {
    let id = task.category_id.as_deref()?;
    categories.iter().find(|c| c.id == id)
}
