//! Process-wide secret store.
//!
//! Credentials come from a flat TOML table (`KEY = "value"`), overlaid by
//! process environment variables of the same name. The store is built once
//! at startup and never mutated afterwards.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{GuideError, Result};

/// Name of the model-service credential.
pub const API_KEY_NAME: &str = "GOOGLE_API_KEY";

/// Read-only key/value credential store.
#[derive(Clone, Default)]
pub struct SecretStore {
    values: HashMap<String, String>,
}

// Values never appear in Debug output.
impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("SecretStore").field("keys", &keys).finish()
    }
}

impl SecretStore {
    /// Build a store from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a secrets file. Non-string values are ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table: toml::Table = toml::from_str(&content)?;
        let values = table
            .into_iter()
            .filter_map(|(k, v)| match v {
                toml::Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect::<HashMap<_, _>>();
        info!(path = %path.display(), keys = values.len(), "Secrets file loaded");
        Ok(Self { values })
    }

    /// Load the secrets file if present, then overlay any of `env_names` set
    /// in the process environment.
    pub fn load(path: &Path, env_names: &[&str]) -> Self {
        let mut store = match Self::from_file(path) {
            Ok(store) => store,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No usable secrets file");
                Self::default()
            }
        };
        for name in env_names {
            if let Ok(value) = std::env::var(name) {
                store.values.insert((*name).to_string(), value);
            }
        }
        store
    }

    /// Look up a secret, treating blank values as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Look up a secret that the application cannot run without.
    pub fn require(&self, name: &str) -> Result<String> {
        self.get(name)
            .map(str::to_string)
            .ok_or_else(|| GuideError::MissingCredential(name.to_string()))
    }
}
