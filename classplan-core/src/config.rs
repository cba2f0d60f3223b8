//! Configuration at ~/.config/classplan/config.toml, overridable by `CLASSPLAN_*`
//! environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_EVENT_COLOR, DEFAULT_HOLIDAY_OFFSET_DAYS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_UPDATE_POLL,
};
use crate::error::{ClassplanError, ClassplanResult};
use crate::model::Color;

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_holiday_offset_days() -> u64 {
    DEFAULT_HOLIDAY_OFFSET_DAYS
}

fn default_update_poll_ms() -> u64 {
    DEFAULT_UPDATE_POLL.as_millis() as u64
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassplanConfig {
    /// Base url every catalog uri is resolved against.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_holiday_offset_days")]
    pub holiday_offset_days: u64,

    #[serde(default)]
    pub default_color: Color,

    #[serde(default = "default_update_poll_ms")]
    pub update_poll_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Serve the catalog from a JSON fixture instead of `api_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixture: Option<PathBuf>,
}

impl Default for ClassplanConfig {
    fn default() -> Self {
        ClassplanConfig {
            api_url: default_api_url(),
            holiday_offset_days: DEFAULT_HOLIDAY_OFFSET_DAYS,
            default_color: Color::default(),
            update_poll_ms: default_update_poll_ms(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            fixture: None,
        }
    }
}

impl ClassplanConfig {
    pub fn config_path() -> ClassplanResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ClassplanError::Config("Could not determine config directory".into()))?
            .join("classplan");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the user's config, writing a commented template on first run.
    pub fn load() -> ClassplanResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load `path` (if it exists) layered under `CLASSPLAN_*` variables.
    pub fn load_from(path: &Path) -> ClassplanResult<Self> {
        let config: ClassplanConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("CLASSPLAN").try_parsing(true))
            .build()
            .map_err(|e| ClassplanError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ClassplanError::Config(e.to_string()))?;

        tracing::debug!(path = %path.display(), api_url = %config.api_url, "Loaded config");
        Ok(config)
    }

    pub fn fixture_path(&self) -> Option<PathBuf> {
        self.fixture
            .as_ref()
            .map(|p| PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned()))
    }

    pub fn update_poll(&self) -> Duration {
        Duration::from_millis(self.update_poll_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Save to `path` as TOML.
    pub fn save_to(&self, path: &Path) -> ClassplanResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ClassplanError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ClassplanError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> ClassplanResult<()> {
        let contents = format!(
            "\
# classplan configuration

# Section catalog api:
# api_url = \"{DEFAULT_API_URL}\"

# Days the calendar skips past the start of term:
# holiday_offset_days = {DEFAULT_HOLIDAY_OFFSET_DAYS}

# Color of events without a color of their own:
# default_color = \"{DEFAULT_EVENT_COLOR}\"

# How often to check for catalog imports, in milliseconds:
# update_poll_ms = {}

# request_timeout_secs = {DEFAULT_REQUEST_TIMEOUT_SECS}

# Serve the catalog from a JSON file instead:
# fixture = \"~/classplan-fixture.json\"
",
            default_update_poll_ms()
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClassplanError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ClassplanError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        ClassplanConfig::create_default_config(&path).unwrap();
        let config = ClassplanConfig::load_from(&path).unwrap();

        assert_eq!(config, ClassplanConfig::default());
        assert_eq!(config.update_poll(), Duration::from_millis(7500));
    }

    #[test]
    fn missing_file_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClassplanConfig::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.holiday_offset_days, 14);
        assert_eq!(config.default_color.as_str(), "#3788d8");
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_url = \"https://catalog.example.edu/api/\"\n\
             holiday_offset_days = 7\n\
             default_color = \"#AA0000\"\n\
             fixture = \"~/fixture.json\"\n",
        )
        .unwrap();

        let config = ClassplanConfig::load_from(&path).unwrap();

        assert_eq!(config.api_url, "https://catalog.example.edu/api/");
        assert_eq!(config.holiday_offset_days, 7);
        assert_eq!(config.default_color.as_str(), "#aa0000");
        assert!(config.fixture_path().unwrap().ends_with("fixture.json"));
    }

    #[test]
    fn invalid_color_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_color = \"teal\"\n").unwrap();

        let err = ClassplanConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ClassplanError::Config(_)));
    }

    #[test]
    fn save_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = ClassplanConfig {
            update_poll_ms: 1000,
            ..ClassplanConfig::default()
        };

        config.save_to(&path).unwrap();

        assert_eq!(ClassplanConfig::load_from(&path).unwrap(), config);
    }
}
