use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::action::ActionConfig;

const DEFAULT_REFRESH_MS: u64 = 1000;
const DEFAULT_HOLD_MS: u64 = 500;
const DEFAULT_DOUBLE_TAP_MS: u64 = 250;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find config directory")]
    NoConfigDir,
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write config: {0}")]
    Write(#[from] std::io::Error),
}

/// One button in the row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityConfig {
    pub entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_icon: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_name: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tap_action: Option<ActionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_action: Option<ActionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_tap_action: Option<ActionConfig>,
}

impl EntityConfig {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Default::default()
        }
    }

    /// Badges are shown unless explicitly turned off
    pub fn shows_icon(&self) -> bool {
        self.show_icon != Some(false)
    }
}

/// Hex colors overriding the built-in palette
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unavailable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowConfig {
    /// Buttons, in render order
    #[serde(default)]
    pub entities: Vec<EntityConfig>,

    /// JSON snapshot file pushed by the host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,

    /// How often the state file is polled
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,

    /// Press duration that counts as a hold
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,

    /// Window for a second tap to count as a double-tap
    #[serde(default = "default_double_tap_ms")]
    pub double_tap_ms: u64,

    #[serde(default)]
    pub theme: ThemeConfig,
}

fn default_refresh_ms() -> u64 {
    DEFAULT_REFRESH_MS
}

fn default_hold_ms() -> u64 {
    DEFAULT_HOLD_MS
}

fn default_double_tap_ms() -> u64 {
    DEFAULT_DOUBLE_TAP_MS
}

impl Default for RowConfig {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            state_file: None,
            refresh_ms: DEFAULT_REFRESH_MS,
            hold_ms: DEFAULT_HOLD_MS,
            double_tap_ms: DEFAULT_DOUBLE_TAP_MS,
            theme: ThemeConfig::default(),
        }
    }
}

impl RowConfig {
    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("buttonrow");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load the default config file, falling back to defaults on any problem
    pub fn load() -> Self {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return RowConfig::default(),
        };

        if path.exists() {
            match Self::load_from(&path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("{}", e),
            }
            return RowConfig::default();
        }

        let config = RowConfig::default();
        if let Err(e) = config.save_to(&path) {
            tracing::warn!("Could not write default config: {}", e);
        }
        config
    }

    /// Load a specific config file; errors are returned, not swallowed
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let mut clean_config = self.clone();

        // Entries without an entity id can never render
        clean_config.entities.retain(|e| !e.entity.trim().is_empty());

        let content = toml::to_string_pretty(&clean_config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionType;

    #[test]
    fn test_parse_row_config() {
        let content = r##"
state_file = "/tmp/states.json"
hold_ms = 700

[[entities]]
entity = "light.kitchen"
name = "Kitchen"
show_name = true

[[entities]]
entity = "switch.fan"
show_icon = false
hold_action = { action = "more-info" }

[[entities]]
entity = "scene.movie"
icon = "mdi:movie"

[entities.tap_action]
action = "call-service"
service = "scene.turn_on"
service_data = { transition = 2 }
confirmation = { text = "Start movie mode?" }

[theme]
active = "#ffc107"
"##;
        let config = RowConfig::from_toml(content).unwrap();

        assert_eq!(config.entities.len(), 3);
        assert_eq!(config.hold_ms, 700);
        assert_eq!(config.double_tap_ms, DEFAULT_DOUBLE_TAP_MS);
        assert_eq!(config.refresh_ms, DEFAULT_REFRESH_MS);
        assert_eq!(config.state_file, Some(PathBuf::from("/tmp/states.json")));

        let kitchen = &config.entities[0];
        assert_eq!(kitchen.name.as_deref(), Some("Kitchen"));
        assert_eq!(kitchen.show_name, Some(true));
        assert!(kitchen.shows_icon());

        let fan = &config.entities[1];
        assert!(!fan.shows_icon());
        assert_eq!(fan.hold_action.as_ref().unwrap().action, ActionType::MoreInfo);

        let scene = &config.entities[2];
        let tap = scene.tap_action.as_ref().unwrap();
        assert_eq!(tap.action, ActionType::CallService);
        assert_eq!(tap.service.as_deref(), Some("scene.turn_on"));
        assert_eq!(tap.service_data.as_ref().unwrap()["transition"], 2);
        assert_eq!(
            tap.confirmation.as_ref().unwrap().text.as_deref(),
            Some("Start movie mode?")
        );

        assert_eq!(config.theme.active.as_deref(), Some("#ffc107"));
    }

    #[test]
    fn test_config_serialization() {
        let mut config = RowConfig::default();
        config.entities.push(EntityConfig {
            entity: "light.a".to_string(),
            name: Some("Lamp".to_string()),
            double_tap_action: Some(crate::action::ActionConfig::toggle()),
            ..Default::default()
        });

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized = RowConfig::from_toml(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_save_drops_blank_entities() {
        let path = std::env::temp_dir().join(format!("buttonrow-config-{}.toml", std::process::id()));
        let mut config = RowConfig::default();
        config.entities.push(EntityConfig::new("light.a"));
        config.entities.push(EntityConfig::new("  "));

        config.save_to(&path).unwrap();
        let loaded = RowConfig::load_from(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.entities, vec![EntityConfig::new("light.a")]);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = RowConfig::load_from(Path::new("/nonexistent/buttonrow.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
