//! Object repository: symbolic element names mapped to locator strings.
//!
//! How a repository is persisted is up to the caller. [`MapRepository`] is an
//! in-memory implementation that can be filled programmatically or loaded
//! from a JSON document, where nested objects are flattened into dotted names:
//!
//! ```json
//! { "login": { "user": "id=username", "submit": "css=button[type=submit]" } }
//! ```
//!
//! yields `login.user` and `login.submit`.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::config::ConfigError;

/// Source of locator strings for symbolic element names.
pub trait ObjectRepository: Send + Sync {
    /// Returns the locator string stored under `name`, if any.
    fn resolve(&self, name: &str) -> Option<String>;
}

/// In-memory object repository.
#[derive(Debug, Clone, Default)]
pub struct MapRepository {
    entries: HashMap<String, String>,
}

impl MapRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, name: impl Into<String>, locator: impl Into<String>) {
        self.entries.insert(name.into(), locator.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a JSON repository document.
    ///
    /// Leaves must be strings; anything else is rejected.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let root: Value = serde_json::from_str(json)?;
        let mut repo = Self::new();
        match root {
            Value::Object(_) => flatten_into(&mut repo.entries, String::new(), &root)?,
            _ => {
                return Err(ConfigError::Invalid(
                    "object repository must be a JSON object".to_string(),
                ))
            }
        }
        Ok(repo)
    }

    /// Loads a JSON repository document from disk.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

impl ObjectRepository for MapRepository {
    fn resolve(&self, name: &str) -> Option<String> {
        self.entries.get(name).cloned()
    }
}

fn flatten_into(
    entries: &mut HashMap<String, String>,
    prefix: String,
    value: &Value,
) -> Result<(), ConfigError> {
    match value {
        Value::String(locator) => {
            entries.insert(prefix, locator.clone());
            Ok(())
        }
        Value::Object(map) => {
            for (key, child) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(entries, name, child)?;
            }
            Ok(())
        }
        other => Err(ConfigError::Invalid(format!(
            "object repository entry '{}' must be a string, got {}",
            prefix, other
        ))),
    }
}
