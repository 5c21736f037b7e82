use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct InsightsConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_seconds: 120,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub preferences_path: String,
    pub downloads_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            preferences_path: "~/.config/insights/preferences.json".to_string(),
            downloads_dir: ".".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn preferences_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.preferences_path).into_owned())
    }

    pub fn downloads_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.downloads_dir).into_owned())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UiConfig {
    pub toast_seconds: u64,
    pub page_size: usize,
    pub recent_conversations: usize,
    pub sample_questions: usize,
    pub preview_chars: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            toast_seconds: 5,
            page_size: 10,
            recent_conversations: 3,
            sample_questions: 5,
            preview_chars: 200,
        }
    }
}

impl UiConfig {
    pub fn toast_ttl(&self) -> Duration {
        Duration::from_secs(self.toast_seconds)
    }
}

impl InsightsConfig {
    /// Layers `path` (optional) under `INSIGHTS__*` environment variables.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        Self::load_with_prefix(path, "INSIGHTS")
    }

    fn load_with_prefix(path: &str, prefix: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix(prefix).separator("__"))
            .build()?;
        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = InsightsConfig::load("/nonexistent/insights-test-config").unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.ui.page_size, 10);
        assert_eq!(config.ui.toast_ttl(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"http://analytics.local:8080\"\ntimeout_seconds = 30\n\n[ui]\ntoast_seconds = 3\npage_size = 25\nrecent_conversations = 3\nsample_questions = 5\npreview_chars = 200"
        )
        .unwrap();

        let config = InsightsConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.api.base_url, "http://analytics.local:8080");
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.ui.page_size, 25);
        assert_eq!(config.storage.downloads_dir, ".");
    }

    #[test]
    fn test_section_with_one_key_keeps_other_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[ui]\npage_size = 25").unwrap();

        let config = InsightsConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.ui.page_size, 25);
        assert_eq!(config.ui.toast_seconds, 5);
        assert_eq!(config.ui.preview_chars, 200);
        assert_eq!(config.api.timeout_seconds, 120);
    }

    #[test]
    fn test_env_base_url_alone_overrides_default() {
        // Own prefix so parallel tests reading INSIGHTS__* are unaffected.
        std::env::set_var("INSIGHTS_ENVONLY__API__BASE_URL", "http://analytics.local:8080");
        let config =
            InsightsConfig::load_with_prefix("/nonexistent/insights-test-config", "INSIGHTS_ENVONLY");
        std::env::remove_var("INSIGHTS_ENVONLY__API__BASE_URL");

        let config = config.unwrap();
        assert_eq!(config.api.base_url, "http://analytics.local:8080");
        assert_eq!(config.api.timeout(), Duration::from_secs(120));
        assert_eq!(config.ui.page_size, 10);
    }
}
