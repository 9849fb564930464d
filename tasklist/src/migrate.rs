// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Conversion of stored blobs into the current record shapes.
//!
//! Every record read from storage passes through here exactly once, so the
//! rest of the crate only ever sees `common::Task` and `common::Category`
//! with all fields populated. Older shapes are handled by lenient "stored"
//! structs whose fields are all optional. Previous field names get fields of
//! their own and are coalesced with the current ones, so a record carrying
//! both spellings still loads.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use common::{palette, Category, Task};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Generation of the category store a blob was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategorySchema {
    /// Records under the legacy `categories` key: no `collapsed`, and
    /// positions are taken from the array index regardless of any `order`.
    Legacy,
    /// Records under the `groups` key.
    Current,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    id: Option<String>,
    text: Option<String>,
    title: Option<String>,
    completed: Option<bool>,
    is_completed: Option<bool>,
    created_at: Option<StoredTimestamp>,
    group_id: Option<String>,
    category_id: Option<String>,
    order: Option<Value>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct StoredCategory {
    id: Option<String>,
    name: Option<String>,
    title: Option<String>,
    color: Option<String>,
    order: Option<Value>,
    collapsed: Option<bool>,
    created_at: Option<StoredTimestamp>,
}

/// Timestamps have been written as epoch milliseconds, epoch seconds
/// (possibly fractional) and RFC 3339 strings.
///
/// Numbers are always counted from the Unix epoch. Records encoded with
/// Swift's default `Date` strategy count seconds from 2001-01-01 and so
/// load about 31 years early; the value only breaks ties between equal
/// `order`s, so they are not corrected.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum StoredTimestamp {
    Integer(i64),
    Float(f64),
    Text(String),
}

// Anything below this is read as seconds: 1e11 ms is early 1973.
const MILLIS_THRESHOLD: f64 = 1e11;

impl StoredTimestamp {
    fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            StoredTimestamp::Integer(value) => from_number(*value as f64),
            StoredTimestamp::Float(value) => from_number(*value),
            StoredTimestamp::Text(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

fn from_number(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let millis = if value.abs() >= MILLIS_THRESHOLD {
        value
    } else {
        value * 1000.0
    };
    DateTime::from_timestamp_millis(millis.round() as i64)
}

/// Parses the blob stored under the tasks key.
///
/// Fails only if the blob is not a JSON array. Individual records that
/// cannot be salvaged (no id, blank text, duplicate id) are dropped with a
/// warning; missing fields get their defaults, and a missing `order` takes
/// the record's position in the array.
pub fn tasks_from_json(blob: &str) -> Result<Vec<Task>> {
    let records: Vec<Value> = serde_json::from_str(blob).context("tasks blob is not a JSON array")?;
    let loaded_at = common::now_millis();
    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let stored: StoredTask = match serde_json::from_value(record) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(index, "Skipping unreadable task record: {}", e);
                continue;
            }
        };
        let Some(task) = task_from_stored(stored, index, loaded_at) else {
            warn!(index, "Skipping task record without id or text");
            continue;
        };
        if !seen.insert(task.id.clone()) {
            warn!(index, id = %task.id, "Skipping task record with duplicate id");
            continue;
        }
        tasks.push(task);
    }

    Ok(tasks)
}

/// Parses a category blob written under the given schema generation.
/// Record-level handling matches [`tasks_from_json`].
pub fn categories_from_json(blob: &str, schema: CategorySchema) -> Result<Vec<Category>> {
    let records: Vec<Value> =
        serde_json::from_str(blob).context("categories blob is not a JSON array")?;
    let loaded_at = common::now_millis();
    let mut seen = HashSet::new();
    let mut categories = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let stored: StoredCategory = match serde_json::from_value(record) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(index, "Skipping unreadable category record: {}", e);
                continue;
            }
        };
        let Some(category) = category_from_stored(stored, index, schema, loaded_at) else {
            warn!(index, "Skipping category record without id or name");
            continue;
        };
        if !seen.insert(category.id.clone()) {
            warn!(index, id = %category.id, "Skipping category record with duplicate id");
            continue;
        }
        categories.push(category);
    }

    Ok(categories)
}

fn task_from_stored(stored: StoredTask, index: usize, loaded_at: DateTime<Utc>) -> Option<Task> {
    let id = stored.id.filter(|id| !id.is_empty())?;
    let text = stored
        .text
        .as_deref()
        .and_then(common::non_blank)
        .or_else(|| stored.title.as_deref().and_then(common::non_blank))?;
    let category_id = stored
        .group_id
        .or(stored.category_id)
        .filter(|id| !id.is_empty());

    Some(Task {
        id,
        text,
        completed: stored.completed.or(stored.is_completed).unwrap_or(false),
        created_at: stored
            .created_at
            .and_then(|ts| ts.to_datetime())
            .unwrap_or(loaded_at),
        category_id,
        order: order_or_position(stored.order.as_ref(), index),
    })
}

fn category_from_stored(
    stored: StoredCategory,
    index: usize,
    schema: CategorySchema,
    loaded_at: DateTime<Utc>,
) -> Option<Category> {
    let id = stored.id.filter(|id| !id.is_empty())?;
    let name = stored
        .name
        .as_deref()
        .and_then(common::non_blank)
        .or_else(|| stored.title.as_deref().and_then(common::non_blank))?;
    let color = stored
        .color
        .filter(|color| !color.trim().is_empty())
        .unwrap_or_else(|| palette::color_for_index(index).to_string());
    let (order, collapsed) = match schema {
        CategorySchema::Legacy => (position(index), false),
        CategorySchema::Current => (
            order_or_position(stored.order.as_ref(), index),
            stored.collapsed.unwrap_or(false),
        ),
    };

    Some(Category {
        id,
        name,
        color,
        order,
        collapsed,
        created_at: stored
            .created_at
            .and_then(|ts| ts.to_datetime())
            .unwrap_or(loaded_at),
    })
}

fn order_or_position(order: Option<&Value>, index: usize) -> u32 {
    order
        .and_then(stored_order)
        .unwrap_or_else(|| position(index))
}

/// Accepts any JSON number holding a whole value in `u32` range, so `2.0`
/// reads as 2. Anything else is unusable.
fn stored_order(value: &Value) -> Option<u32> {
    if let Some(order) = value.as_u64() {
        return u32::try_from(order).ok();
    }
    let order = value.as_f64()?;
    if order.is_finite() && order.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&order) {
        Some(order as u32)
    } else {
        None
    }
}

fn position(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}
