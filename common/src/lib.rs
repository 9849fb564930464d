// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
pub mod palette;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[allow(clippy::doc_overindented_list_items)]
/// Represents a task on the list.
///
/// Derivation attributes (derive):
/// - `Serialize`, `Deserialize`: Allows conversion to/from the JSON blob
///    stored under the `tasks` key.
/// - `Debug`, `Clone`, `PartialEq`: Needed to compare collections before
///    and after a storage round trip.
///
/// Field names on disk are camelCase. The category reference is written as
/// `groupId`; older blobs used `categoryId` and are read by the migration
/// layer, never by this type directly.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,

    pub text: String,

    pub completed: bool,

    // Stored as epoch milliseconds, the precision we keep in memory as well.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    /// `None` means the task is uncategorized.
    #[serde(rename = "groupId")]
    pub category_id: Option<String>,

    /// Position inside the task's scope (all tasks sharing `category_id`).
    pub order: u32,
}

impl Task {
    /// Builds a new task with a fresh id.
    /// Fails if `text` is blank once trimmed.
    pub fn new(
        text: &str,
        category_id: Option<String>,
        order: u32,
    ) -> Result<Self, ValidationError> {
        let text = non_blank(text).ok_or(ValidationError::EmptyText)?;
        Ok(Self {
            id: new_id(),
            text,
            completed: false,
            created_at: now_millis(),
            category_id,
            order,
        })
    }

    /// Returns true when the task lives in the given scope.
    pub fn in_scope(&self, scope: Option<&str>) -> bool {
        self.category_id.as_deref() == scope
    }
}

/// A named group of tasks. Categories share a single global ordering.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,

    pub name: String,

    // One of `palette::CATEGORY_COLORS`, not validated further.
    pub color: String,

    pub order: u32,

    /// UI state only: whether the category's task list is hidden.
    #[serde(default)]
    pub collapsed: bool,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Builds a new, expanded category with a fresh id.
    /// Fails if `name` is blank once trimmed.
    pub fn new(name: &str, color: &str, order: u32) -> Result<Self, ValidationError> {
        let name = non_blank(name).ok_or(ValidationError::EmptyName)?;
        Ok(Self {
            id: new_id(),
            name,
            color: color.to_string(),
            order,
            collapsed: false,
            created_at: now_millis(),
        })
    }
}

/// Changes to apply to an existing task. `None` leaves a field as is.
///
/// `category_id` is doubly optional: `Some(None)` moves the task to the
/// uncategorized scope, `None` keeps its current category.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub category_id: Option<Option<String>>,
}

/// Changes to apply to an existing category. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub collapsed: Option<bool>,
}

/// Why a mutation was refused. The collections are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    EmptyText,
    EmptyName,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyText => write!(f, "task text cannot be empty"),
            ValidationError::EmptyName => write!(f, "category name cannot be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Trims `input` and returns it, or `None` if nothing is left.
pub fn non_blank(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Generates a fresh entity id (UUID v4, hyphenated).
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time truncated to milliseconds, so that a freshly built record
/// compares equal to itself after a save/load cycle.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
