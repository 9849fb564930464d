// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{bail, Result};

// Used when the environment does not override it.
pub const DEFAULT_DB_URL: &str = "sqlite://database/tasklist.db";
pub const DB_URL_ENV: &str = "TASKLIST_DB_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup(DB_URL_ENV)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_DB_URL.to_string());

        if !database_url.starts_with("sqlite:") {
            bail!("{} must be a sqlite: URL, got '{}'", DB_URL_ENV, database_url);
        }

        Ok(Self { database_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.database_url, DEFAULT_DB_URL);

        let blank = Config::from_lookup(|_| Some("  ".to_string())).unwrap();
        assert_eq!(blank.database_url, DEFAULT_DB_URL);
    }

    #[test]
    fn test_url_from_environment() {
        let config = Config::from_lookup(|key| {
            (key == DB_URL_ENV).then(|| "sqlite://elsewhere/tasks.db".to_string())
        })
        .unwrap();
        assert_eq!(config.database_url, "sqlite://elsewhere/tasks.db");
    }

    #[test]
    fn test_non_sqlite_url_is_rejected() {
        let result = Config::from_lookup(|_| Some("postgres://localhost/tasks".to_string()));
        assert!(result.is_err());
    }
}
