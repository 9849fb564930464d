// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::gateway::Gateway;
use crate::ordering::{self, Direction};
use crate::storage::KeyValueStore;

use common::{non_blank, palette, Category, CategoryPatch, Task, TaskPatch, ValidationError};
use tracing::{debug, error, info, warn};

/// Both collections as an operation left them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub categories: Vec<Category>,
}

/// Command surface over the task and category collections.
///
/// Each call re-reads what it needs from the store, computes the complete
/// new collection (orders included), writes it back and returns it. Nothing
/// is cached between calls. Calls are not serialized against each other:
/// two interleaved commands on the same store can lose one update.
pub struct TaskBook<S> {
    gateway: Gateway<S>,
}

impl<S: KeyValueStore> TaskBook<S> {
    pub fn new(store: S) -> Self {
        Self {
            gateway: Gateway::new(store),
        }
    }

    pub fn gateway(&self) -> &Gateway<S> {
        &self.gateway
    }

    /// Loads both collections, running the legacy category migration if due.
    ///
    /// Tasks pointing at a category that no longer exists are returned as
    /// uncategorized, after the existing uncategorized tasks. Nothing is
    /// written back; an unreadable category blob must not cost every task
    /// its category.
    pub async fn load(&self) -> Snapshot {
        let mut tasks = self.gateway.load_tasks().await;
        let categories = self.gateway.load_categories().await;
        let released = ordering::uncategorize_dangling(&mut tasks, &categories);
        if released > 0 {
            warn!(
                "{} tasks reference missing categories; listing them as uncategorized.",
                released
            );
        }
        Snapshot { tasks, categories }
    }

    // --- Tasks ---

    /// Appends a task at the end of its category's scope.
    /// An unknown `category_id` files the task as uncategorized.
    pub async fn add_task(
        &self,
        text: &str,
        category_id: Option<&str>,
    ) -> Result<Task, ValidationError> {
        let mut task = Task::new(text, None, 0)?;

        let mut tasks = self.gateway.load_tasks().await;
        task.category_id = self.resolve_category(category_id).await;
        task.order = ordering::next_task_order(&tasks, task.category_id.as_deref());

        let scope = task.category_id.clone();
        tasks.push(task);
        ordering::renormalize_tasks(&mut tasks, scope.as_deref());
        // Renormalizing rewrites orders in place; the new task is still last.
        let added = tasks[tasks.len() - 1].clone();

        self.gateway.save_tasks(&tasks).await;
        info!("Added task {} to scope {:?}.", added.id, scope);
        Ok(added)
    }

    /// Applies `patch` to the task `id`. Moving a task to another category
    /// appends it to the end of that scope and closes the gap it leaves.
    pub async fn update_task(
        &self,
        id: &str,
        patch: TaskPatch,
    ) -> Result<Vec<Task>, ValidationError> {
        let text = match patch.text.as_deref() {
            Some(text) => Some(non_blank(text).ok_or(ValidationError::EmptyText)?),
            None => None,
        };

        let mut tasks = self.gateway.load_tasks().await;
        let Some(index) = tasks.iter().position(|t| t.id == id) else {
            debug!("Update of unknown task {} ignored.", id);
            return Ok(tasks);
        };

        if let Some(target) = patch.category_id {
            let target = self.resolve_category(target.as_deref()).await;
            let current = tasks[index].category_id.clone();
            if target != current {
                tasks[index].order = ordering::next_task_order(&tasks, target.as_deref());
                tasks[index].category_id = target.clone();
                ordering::renormalize_tasks(&mut tasks, current.as_deref());
                ordering::renormalize_tasks(&mut tasks, target.as_deref());
                debug!("Task {} moved from {:?} to {:?}.", id, current, target);
            }
        }
        if let Some(text) = text {
            tasks[index].text = text;
        }
        if let Some(completed) = patch.completed {
            tasks[index].completed = completed;
        }

        self.gateway.save_tasks(&tasks).await;
        Ok(tasks)
    }

    /// Flips the completion flag of the task `id`.
    pub async fn toggle_task(&self, id: &str) -> Vec<Task> {
        let mut tasks = self.gateway.load_tasks().await;
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            debug!("Toggle of unknown task {} ignored.", id);
            return tasks;
        };
        task.completed = !task.completed;

        self.gateway.save_tasks(&tasks).await;
        tasks
    }

    /// Removes the task `id` and closes the gap in its scope.
    pub async fn delete_task(&self, id: &str) -> Vec<Task> {
        let mut tasks = self.gateway.load_tasks().await;
        let Some(index) = tasks.iter().position(|t| t.id == id) else {
            debug!("Delete of unknown task {} ignored.", id);
            return tasks;
        };
        let removed = tasks.remove(index);
        ordering::renormalize_tasks(&mut tasks, removed.category_id.as_deref());

        self.gateway.save_tasks(&tasks).await;
        info!("Deleted task {}.", id);
        tasks
    }

    /// Re-sequences one scope to follow `ids`. Tasks in other scopes keep
    /// their order; scope members missing from `ids` go after the listed ones.
    pub async fn reorder_tasks(&self, scope: Option<&str>, ids: &[String]) -> Vec<Task> {
        let mut tasks = self.gateway.load_tasks().await;
        let sequence = ordering::task_sequence(&tasks, scope);
        let arranged = ordering::arrange(&tasks, &sequence, ids);
        ordering::apply_sequence(&mut tasks, &arranged);

        self.gateway.save_tasks(&tasks).await;
        tasks
    }

    /// Swaps the task `id` with its neighbour in its own scope.
    /// Nothing is written when the task is already at that edge.
    pub async fn move_task(&self, id: &str, direction: Direction) -> Vec<Task> {
        let mut tasks = self.gateway.load_tasks().await;
        let Some(scope) = scope_of(&tasks, id) else {
            return tasks;
        };
        let sequence = ordering::task_sequence(&tasks, scope.as_deref());
        let Some(shifted) = ordering::shift(&tasks, &sequence, id, direction) else {
            debug!("Task {} is already at the {:?} edge.", id, direction);
            return tasks;
        };
        ordering::apply_sequence(&mut tasks, &shifted);

        self.gateway.save_tasks(&tasks).await;
        tasks
    }

    pub async fn move_task_up(&self, id: &str) -> Vec<Task> {
        self.move_task(id, Direction::Up).await
    }

    pub async fn move_task_down(&self, id: &str) -> Vec<Task> {
        self.move_task(id, Direction::Down).await
    }

    /// Moves the task `id` to `position` inside its scope (clamped to the end).
    pub async fn move_task_to(&self, id: &str, position: usize) -> Vec<Task> {
        let mut tasks = self.gateway.load_tasks().await;
        let Some(scope) = scope_of(&tasks, id) else {
            return tasks;
        };
        let sequence = ordering::task_sequence(&tasks, scope.as_deref());
        let Some(moved) = ordering::move_to(&tasks, &sequence, id, position) else {
            return tasks;
        };
        ordering::apply_sequence(&mut tasks, &moved);

        self.gateway.save_tasks(&tasks).await;
        tasks
    }

    // --- Categories ---

    /// Appends a category after all existing ones. Colours outside the
    /// palette are kept as given.
    pub async fn add_category(&self, name: &str, color: &str) -> Result<Category, ValidationError> {
        let mut category = Category::new(name, color, 0)?;
        note_custom_color(&category.color);

        let mut categories = self.gateway.load_categories().await;
        category.order = u32::try_from(categories.len()).unwrap_or(u32::MAX);
        categories.push(category);
        ordering::renormalize_categories(&mut categories);
        let added = categories[categories.len() - 1].clone();

        self.gateway.save_categories(&categories).await;
        info!("Added category {}.", added.id);
        Ok(added)
    }

    /// Applies `patch` to the category `id`.
    pub async fn update_category(
        &self,
        id: &str,
        patch: CategoryPatch,
    ) -> Result<Vec<Category>, ValidationError> {
        let name = match patch.name.as_deref() {
            Some(name) => Some(non_blank(name).ok_or(ValidationError::EmptyName)?),
            None => None,
        };

        let mut categories = self.gateway.load_categories().await;
        let Some(category) = categories.iter_mut().find(|c| c.id == id) else {
            debug!("Update of unknown category {} ignored.", id);
            return Ok(categories);
        };
        if let Some(name) = name {
            category.name = name;
        }
        if let Some(color) = patch.color {
            note_custom_color(&color);
            category.color = color;
        }
        if let Some(collapsed) = patch.collapsed {
            category.collapsed = collapsed;
        }

        self.gateway.save_categories(&categories).await;
        Ok(categories)
    }

    /// Flips whether the category `id` is shown collapsed.
    pub async fn toggle_category_collapsed(&self, id: &str) -> Vec<Category> {
        let mut categories = self.gateway.load_categories().await;
        let Some(category) = categories.iter_mut().find(|c| c.id == id) else {
            return categories;
        };
        category.collapsed = !category.collapsed;

        self.gateway.save_categories(&categories).await;
        categories
    }

    /// Deletes the category `id`. Its tasks become uncategorized and are
    /// appended, in their previous order, after the existing uncategorized
    /// tasks. No task is deleted. Tasks still pointing at categories that
    /// were lost earlier are uncategorized in the same write.
    ///
    /// Tasks are written before categories. If the task write fails the
    /// category is kept and the stored state is returned unchanged; if the
    /// category write fails the category survives with no tasks. Either way
    /// no stored task points at a missing category.
    pub async fn delete_category(&self, id: &str) -> Snapshot {
        let mut categories = self.gateway.load_categories().await;
        let mut tasks = self.gateway.load_tasks().await;
        let Some(index) = categories.iter().position(|c| c.id == id) else {
            debug!("Delete of unknown category {} ignored.", id);
            return Snapshot { tasks, categories };
        };
        let stored = Snapshot {
            tasks: tasks.clone(),
            categories: categories.clone(),
        };

        categories.remove(index);
        ordering::renormalize_categories(&mut categories);
        let released = ordering::uncategorize_dangling(&mut tasks, &categories);

        if !self.gateway.save_tasks(&tasks).await {
            error!("Category {} not deleted: its tasks could not be uncategorized.", id);
            return stored;
        }
        self.gateway.save_categories(&categories).await;
        info!(
            "Deleted category {}; {} tasks are now uncategorized.",
            id, released
        );

        Snapshot { tasks, categories }
    }

    /// Re-sequences all categories to follow `ids`.
    pub async fn reorder_categories(&self, ids: &[String]) -> Vec<Category> {
        let mut categories = self.gateway.load_categories().await;
        let sequence = ordering::category_sequence(&categories);
        let arranged = ordering::arrange(&categories, &sequence, ids);
        ordering::apply_sequence(&mut categories, &arranged);

        self.gateway.save_categories(&categories).await;
        categories
    }

    /// Swaps the category `id` with its neighbour. No-op at the edges.
    pub async fn move_category(&self, id: &str, direction: Direction) -> Vec<Category> {
        let mut categories = self.gateway.load_categories().await;
        let sequence = ordering::category_sequence(&categories);
        let Some(shifted) = ordering::shift(&categories, &sequence, id, direction) else {
            return categories;
        };
        ordering::apply_sequence(&mut categories, &shifted);

        self.gateway.save_categories(&categories).await;
        categories
    }

    /// Moves the category `id` to `position` (clamped to the end).
    pub async fn move_category_to(&self, id: &str, position: usize) -> Vec<Category> {
        let mut categories = self.gateway.load_categories().await;
        let sequence = ordering::category_sequence(&categories);
        let Some(moved) = ordering::move_to(&categories, &sequence, id, position) else {
            return categories;
        };
        ordering::apply_sequence(&mut categories, &moved);

        self.gateway.save_categories(&categories).await;
        categories
    }

    /// Returns `category_id` if it names an existing category, `None` otherwise.
    async fn resolve_category(&self, category_id: Option<&str>) -> Option<String> {
        let wanted = category_id?;
        let categories = self.gateway.load_categories().await;
        if categories.iter().any(|c| c.id == wanted) {
            Some(wanted.to_string())
        } else {
            warn!("Unknown category {}; filing task as uncategorized.", wanted);
            None
        }
    }
}

fn note_custom_color(color: &str) {
    if !palette::is_palette_color(color) {
        debug!("Colour {} is not in the palette; keeping it as given.", color);
    }
}

fn scope_of(tasks: &[Task], id: &str) -> Option<Option<String>> {
    tasks
        .iter()
        .find(|t| t.id == id)
        .map(|t| t.category_id.clone())
}
