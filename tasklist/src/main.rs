// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use tasklist::config::Config;
use tasklist::views;
use tasklist::{SqliteStore, TaskBook};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:?}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Opening task store at {}", config.database_url);

    let store = match SqliteStore::connect(&config.database_url).await {
        Ok(store) => {
            tracing::info!("Database connection was made successfully.");
            store
        }
        Err(e) => {
            tracing::error!("Failed to connect with the database: {:?}", e);
            std::process::exit(1);
        }
    };

    // Loading runs the one-time category migration when needed.
    let book = TaskBook::new(store);
    let snapshot = book.load().await;

    tracing::info!(
        "Loaded {} tasks in {} categories.",
        snapshot.tasks.len(),
        snapshot.categories.len()
    );

    for group in views::group_tasks(&snapshot.tasks, &snapshot.categories) {
        let done = group.tasks.iter().filter(|t| t.completed).count();
        let label = group
            .category
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("Uncategorized");
        tracing::info!("{}: {} tasks, {} done", label, group.tasks.len(), done);
    }
}
