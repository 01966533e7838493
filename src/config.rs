use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steam_api_key: Option<String>,
    pub notifications_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_sound_path: Option<String>,
    /// Override for the public documents root (`C:\Users\Public` style).
    /// Left unset, the platform default is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_dir: Option<String>,
    /// Override for the roaming app-data root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_data_dir: Option<String>,
    #[serde(default = "default_debounce_ms")]
    pub classifier_debounce_ms: u64,
    /// Window for the appended-line / direct JSON-diff unlock checks.
    #[serde(default = "default_direct_window")]
    pub classifier_direct_window_secs: i64,
    /// Wider window for the re-parsed-record fallback check.
    #[serde(default = "default_fallback_window")]
    pub classifier_fallback_window_secs: i64,
    /// How long an "already notified" entry is remembered.
    #[serde(default = "default_notified_ttl")]
    pub notified_ttl_secs: u64,
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_direct_window() -> i64 {
    10
}

fn default_fallback_window() -> i64 {
    30
}

fn default_notified_ttl() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            steam_api_key: None,
            notifications_enabled: true,
            notification_sound_path: None,
            public_dir: None,
            app_data_dir: None,
            classifier_debounce_ms: default_debounce_ms(),
            classifier_direct_window_secs: default_direct_window(),
            classifier_fallback_window_secs: default_fallback_window(),
            notified_ttl_secs: default_notified_ttl(),
        }
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigManager {
    pub fn new() -> Self {
        let config_path = Self::get_config_path();
        let config = Self::load_from_file(&config_path);

        Self { config_path, config }
    }

    fn get_config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .expect("Could not find config directory")
            .join("trophyvault");

        fs::create_dir_all(&config_dir).ok();
        config_dir.join("config.json")
    }

    fn load_from_file(path: &PathBuf) -> AppConfig {
        if let Ok(contents) = fs::read_to_string(path) {
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            AppConfig::default()
        }
    }

    fn save_to_file(&self) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(&self.config)?;
        fs::write(&self.config_path, json)?;
        Ok(())
    }

    pub fn get_all(&self) -> AppConfig {
        self.config.clone()
    }

    pub fn set_all(&mut self, config: AppConfig) {
        self.config = config;
        self.save_to_file().ok();
    }
}
