// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::migrate::{self, CategorySchema};
use crate::storage::KeyValueStore;

use common::{Category, Task};
use serde::Serialize;
use tracing::{debug, error, info, warn};

pub const TASKS_KEY: &str = "tasks";
pub const GROUPS_KEY: &str = "groups";
/// Superseded by [`GROUPS_KEY`]; read once for migration, never written.
pub const LEGACY_CATEGORIES_KEY: &str = "categories";

/// Loads and saves whole collections through a [`KeyValueStore`].
///
/// Storage failures never reach the caller: a failed or corrupt read yields
/// an empty collection, and a failed write is logged and reported through
/// the `bool` returned by the save methods.
pub struct Gateway<S> {
    store: S,
}

impl<S: KeyValueStore> Gateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns every stored task in storage order.
    pub async fn load_tasks(&self) -> Vec<Task> {
        let blob = match self.store.get(TASKS_KEY).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!("Failed to read tasks, starting empty: {:?}", e);
                return Vec::new();
            }
        };

        match migrate::tasks_from_json(&blob) {
            Ok(tasks) => {
                debug!("Loaded {} tasks.", tasks.len());
                tasks
            }
            Err(e) => {
                error!("Stored tasks are corrupt, starting empty: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Overwrites the stored task collection. Returns false if the write failed.
    pub async fn save_tasks(&self, tasks: &[Task]) -> bool {
        self.write(TASKS_KEY, tasks).await
    }

    /// Returns every stored category in storage order.
    ///
    /// When nothing has ever been written under [`GROUPS_KEY`], the legacy
    /// [`LEGACY_CATEGORIES_KEY`] blob is converted, written under the new key
    /// and returned. Once the new key exists the legacy one is not read again.
    pub async fn load_categories(&self) -> Vec<Category> {
        let blob = match self.store.get(GROUPS_KEY).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return self.migrate_legacy_categories().await,
            Err(e) => {
                error!("Failed to read categories, starting empty: {:?}", e);
                return Vec::new();
            }
        };

        match migrate::categories_from_json(&blob, CategorySchema::Current) {
            Ok(categories) => {
                debug!("Loaded {} categories.", categories.len());
                categories
            }
            Err(e) => {
                error!("Stored categories are corrupt, starting empty: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Overwrites the stored category collection. Returns false if the write failed.
    pub async fn save_categories(&self, categories: &[Category]) -> bool {
        self.write(GROUPS_KEY, categories).await
    }

    async fn migrate_legacy_categories(&self) -> Vec<Category> {
        let blob = match self.store.get(LEGACY_CATEGORIES_KEY).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!("Failed to read legacy categories: {:?}", e);
                return Vec::new();
            }
        };

        let categories = match migrate::categories_from_json(&blob, CategorySchema::Legacy) {
            Ok(categories) => categories,
            Err(e) => {
                warn!("Legacy categories are corrupt, nothing to migrate: {:?}", e);
                return Vec::new();
            }
        };

        if self.save_categories(&categories).await {
            info!(
                "Migrated {} categories from '{}' to '{}'.",
                categories.len(),
                LEGACY_CATEGORIES_KEY,
                GROUPS_KEY
            );
        } else {
            warn!("Legacy categories migrated in memory only; will retry on next load.");
        }

        categories
    }

    async fn write<T: Serialize>(&self, key: &str, records: &[T]) -> bool {
        let blob = match serde_json::to_string(records) {
            Ok(blob) => blob,
            Err(e) => {
                error!("Failed to serialize '{}': {:?}", key, e);
                return false;
            }
        };

        match self.store.set(key, &blob).await {
            Ok(()) => {
                debug!("Saved {} records under '{}'.", records.len(), key);
                true
            }
            Err(e) => {
                error!("Failed to save '{}', changes are not durable: {:?}", key, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Memory store that records how often each key is read and can be
    /// told to fail all writes.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        reads: Mutex<HashMap<String, usize>>,
        fail_writes: bool,
    }

    impl CountingStore {
        fn reads_of(&self, key: &str) -> usize {
            self.reads.lock().get(key).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl KeyValueStore for CountingStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            *self.reads.lock().entry(key.to_string()).or_default() += 1;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes {
                return Err(anyhow!("disk full"));
            }
            self.inner.set(key, value).await
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow!("io error"))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("io error"))
        }
    }

    #[tokio::test]
    async fn test_empty_store_loads_empty_collections() {
        let gateway = Gateway::new(MemoryStore::new());

        assert!(gateway.load_tasks().await.is_empty());
        assert!(gateway.load_categories().await.is_empty());
        // Nothing to migrate, so nothing is written.
        assert_eq!(gateway.store().peek(GROUPS_KEY), None);
    }

    #[tokio::test]
    async fn test_corrupt_blob_loads_empty() {
        let store = MemoryStore::new();
        store.seed(TASKS_KEY, "{{{ definitely not json");
        store.seed(GROUPS_KEY, "42");
        let gateway = Gateway::new(store);

        assert!(gateway.load_tasks().await.is_empty());
        assert!(gateway.load_categories().await.is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_loads_empty_and_write_failure_reports_false() {
        let gateway = Gateway::new(BrokenStore);

        assert!(gateway.load_tasks().await.is_empty());
        assert!(gateway.load_categories().await.is_empty());

        let task = Task::new("Buy milk", None, 0).unwrap();
        assert!(!gateway.save_tasks(&[task]).await);
    }

    #[tokio::test]
    async fn test_task_round_trip_is_idempotent() {
        let gateway = Gateway::new(MemoryStore::new());
        let mut tasks = vec![
            Task::new("Buy milk", None, 0).unwrap(),
            Task::new("Walk dog", Some("g1".to_string()), 0).unwrap(),
        ];
        tasks[1].completed = true;

        assert!(gateway.save_tasks(&tasks).await);
        let first = gateway.load_tasks().await;
        assert!(gateway.save_tasks(&first).await);
        let second = gateway.load_tasks().await;

        assert_eq!(first, tasks);
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_legacy_categories_migrate_exactly_once() {
        let store = CountingStore::default();
        store.inner.seed(
            LEGACY_CATEGORIES_KEY,
            r##"[{"id":"c1","name":"Work","color":"#4a90d9"},{"id":"c2","name":"Home","color":"#50c878"}]"##,
        );
        let gateway = Gateway::new(store);

        let migrated = gateway.load_categories().await;
        assert_eq!(migrated.len(), 2);
        assert_eq!(migrated[0].id, "c1");
        assert_eq!(migrated[0].order, 0);
        assert_eq!(migrated[1].id, "c2");
        assert_eq!(migrated[1].order, 1);
        assert!(migrated.iter().all(|c| !c.collapsed));
        assert!(gateway.store().inner.peek(GROUPS_KEY).is_some());
        assert_eq!(gateway.store().reads_of(LEGACY_CATEGORIES_KEY), 1);

        let again = gateway.load_categories().await;
        assert_eq!(again, migrated);
        assert_eq!(gateway.store().reads_of(LEGACY_CATEGORIES_KEY), 1);
    }

    #[tokio::test]
    async fn test_failed_migration_write_is_retried_next_load() {
        let store = CountingStore {
            fail_writes: true,
            ..Default::default()
        };
        store
            .inner
            .seed(LEGACY_CATEGORIES_KEY, r#"[{"id":"c1","name":"Work"}]"#);
        let gateway = Gateway::new(store);

        assert_eq!(gateway.load_categories().await.len(), 1);
        assert_eq!(gateway.load_categories().await.len(), 1);
        assert_eq!(gateway.store().reads_of(LEGACY_CATEGORIES_KEY), 2);
        assert_eq!(gateway.store().inner.peek(GROUPS_KEY), None);
    }

    #[tokio::test]
    async fn test_existing_groups_key_shadows_legacy_key() {
        let store = CountingStore::default();
        store.inner.seed(GROUPS_KEY, "[]");
        store
            .inner
            .seed(LEGACY_CATEGORIES_KEY, r#"[{"id":"c1","name":"Work"}]"#);
        let gateway = Gateway::new(store);

        assert!(gateway.load_categories().await.is_empty());
        assert_eq!(gateway.store().reads_of(LEGACY_CATEGORIES_KEY), 0);
    }

    #[tokio::test]
    async fn test_legacy_key_is_left_in_place() {
        let store = MemoryStore::new();
        let legacy = r#"[{"id":"c1","name":"Work"}]"#;
        store.seed(LEGACY_CATEGORIES_KEY, legacy);
        let gateway = Gateway::new(store);

        gateway.load_categories().await;

        assert_eq!(
            gateway.store().peek(LEGACY_CATEGORIES_KEY).as_deref(),
            Some(legacy)
        );
    }
}
