use crate::errors::AppResult;
use chrono::Locale;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

pub const DATABASE_NAME: &str = "TaskNavyDB";
pub const SCHEMA_VERSION: u32 = 1;

const DEFAULT_LOCALE: &str = "en_US";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub locale: String,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tasknavy");
        Config {
            data_dir,
            locale: DEFAULT_LOCALE.to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Reads the config file (if any) and applies `TASKNAVY_*` overrides.
    pub fn load() -> AppResult<Self> {
        let path = config_path();
        let mut config = match path {
            Some(ref path) if path.exists() => {
                let raw = fs::read_to_string(path)?;
                Config::from_toml_str(&raw)?
            }
            _ => Config::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> AppResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("TASKNAVY_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(locale) = lookup("TASKNAVY_LOCALE").filter(|v| !v.trim().is_empty()) {
            self.locale = locale;
        }
        if let Some(filter) = lookup("TASKNAVY_LOG").filter(|v| !v.trim().is_empty()) {
            self.log_filter = filter;
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.sqlite3", DATABASE_NAME))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn chrono_locale(&self) -> Locale {
        match Locale::try_from(self.locale.as_str()) {
            Ok(locale) => locale,
            Err(_) => {
                tracing::warn!(locale = %self.locale, "unknown locale, falling back to {}", DEFAULT_LOCALE);
                Locale::en_US
            }
        }
    }
}

fn config_path() -> Option<PathBuf> {
    match env::var("TASKNAVY_CONFIG") {
        Ok(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
        _ => dirs::config_dir().map(|dir| dir.join("tasknavy").join("config.toml")),
    }
}
