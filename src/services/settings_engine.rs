// Smartmark Settings Engine
// Loads and saves `AppSettings` as JSON at the platform config path, and
// layers environment overrides on top of what was loaded.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::{AppSettings, BackendSettings};

/// Directory for the local store; replaces any configured `database_path`.
pub const ENV_DATA_DIR: &str = "SMARTMARK_DATA_DIR";
/// Hosted project URL; together with [`ENV_ANON_KEY`] switches to the REST backend.
pub const ENV_BACKEND_URL: &str = "SMARTMARK_BACKEND_URL";
pub const ENV_ANON_KEY: &str = "SMARTMARK_ANON_KEY";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<AppSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &AppSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: AppSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise, uses `settings.json` in the platform config directory.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override.unwrap_or_else(|| {
            platform::get_config_dir()
                .join("settings.json")
                .to_string_lossy()
                .to_string()
        });

        Self {
            config_path,
            settings: AppSettings::default(),
        }
    }

    /// Applies `SMARTMARK_*` environment overrides to the in-memory settings.
    ///
    /// Overrides are never written back by `save`.
    pub fn apply_env_overrides(&mut self) -> &AppSettings {
        apply_overrides(&mut self.settings, |key| env::var(key).ok());
        &self.settings
    }
}

/// Applies overrides looked up through `lookup` (normally the process environment).
pub fn apply_overrides<F>(settings: &mut AppSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let (Some(base_url), Some(anon_key)) = (get(ENV_BACKEND_URL), get(ENV_ANON_KEY)) {
        info!(base_url = %base_url, "backend overridden from environment");
        let (table, redirect_to) = match &settings.backend {
            BackendSettings::Rest {
                table, redirect_to, ..
            } => (table.clone(), redirect_to.clone()),
            BackendSettings::Local { .. } => ("bookmarks".to_string(), None),
        };
        settings.backend = BackendSettings::Rest {
            base_url,
            anon_key,
            table,
            redirect_to,
        };
        return;
    }

    if let Some(dir) = get(ENV_DATA_DIR) {
        if let BackendSettings::Local { database_path } = &mut settings.backend {
            let path = PathBuf::from(dir).join(crate::backend::LOCAL_DATABASE_FILE);
            debug!(path = %path.display(), "local store path overridden from environment");
            *database_path = Some(path.to_string_lossy().to_string());
        }
    }
}

/// `general.language` → `/general/language`.
fn to_pointer(key: &str) -> String {
    key.split('.').fold(String::new(), |mut pointer, part| {
        pointer.push('/');
        pointer.push_str(part);
        pointer
    })
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// A missing file yields defaults; a malformed one is an error.
    fn load(&mut self) -> Result<AppSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            debug!(path = %self.config_path, "no settings file, using defaults");
            self.settings = AppSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        self.settings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        Ok(self.settings.clone())
    }

    /// Saves the current settings, creating parent directories as needed.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))
    }

    fn get_settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Updates one setting by dot-notation key (`"confirm_delete"`,
    /// `"backend.database_path"`) and saves.
    ///
    /// The key must already exist; the result must still deserialize.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        let slot = json_value
            .pointer_mut(&to_pointer(key))
            .ok_or_else(|| SettingsError::InvalidKey(format!("Key '{}' not found in settings", key)))?;
        *slot = value;

        self.settings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;

        self.save()
    }

    /// Resets all settings to defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = AppSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
