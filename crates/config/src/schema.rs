use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Base URL used when neither the config file nor the environment names one.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/api";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlazaConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
}

/// Remote API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Endpoint every request is sent to; the logical method travels in the
    /// `route` query parameter.
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.into(),
        }
    }
}

/// Durable client state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Override for the key-value file holding the token and theme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl PlazaConfig {
    /// Apply `PLAZA_*` overrides using `lookup` to read variables.
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("PLAZA_API_URL").filter(|v| !v.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(path) = lookup("PLAZA_STORAGE_PATH").filter(|v| !v.is_empty()) {
            self.storage.path = Some(PathBuf::from(path));
        }
    }
}
