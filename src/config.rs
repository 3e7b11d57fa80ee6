use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_DB_PATH: &str = "shopwise.db";
pub const HISTORY_KEY: &str = "shopwise_history";
pub const CONFIG_FILE: &str = "shopwise.json";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub db_path: String,
    pub history_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.into(),
            endpoint: DEFAULT_ENDPOINT.into(),
            db_path: DEFAULT_DB_PATH.into(),
            history_key: HISTORY_KEY.into(),
        }
    }
}

// Every field optional; absent ones keep the default.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    api_key: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    db_path: Option<String>,
    history_key: Option<String>,
}

impl AppConfig {
    pub fn load() -> Self {
        let mut config = Self::default();
        config.apply_file(Path::new(CONFIG_FILE));
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn apply_file(&mut self, path: &Path) {
        let Ok(data) = std::fs::read_to_string(path) else {
            return;
        };
        match serde_json::from_str::<FileConfig>(&data) {
            Ok(file) => {
                if file.api_key.is_some() {
                    self.api_key = file.api_key;
                }
                if let Some(model) = file.model {
                    self.model = model;
                }
                if let Some(endpoint) = file.endpoint {
                    self.endpoint = endpoint;
                }
                if let Some(db_path) = file.db_path {
                    self.db_path = db_path;
                }
                if let Some(key) = file.history_key {
                    self.history_key = key;
                }
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file"),
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(model) = non_empty("SHOPWISE_MODEL") {
            self.model = model;
        }
        if let Some(endpoint) = non_empty("SHOPWISE_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(db_path) = non_empty("SHOPWISE_DB") {
            self.db_path = db_path;
        }
    }
}
