// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
pub mod config;
pub mod gateway;
pub mod migrate;
pub mod operations;
pub mod ordering;
pub mod storage;
pub mod views;

pub use gateway::Gateway;
pub use operations::{Snapshot, TaskBook};
pub use ordering::Direction;
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use views::{TaskFilter, TaskGroup};
