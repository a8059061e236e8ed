use serde::{Deserialize, Serialize};

/// Top-level application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub backend: BackendSettings,
    /// Provider used when a sign-in request names none.
    pub default_provider: String,
    /// Ask for confirmation before deleting a bookmark.
    pub confirm_delete: bool,
    /// `tracing` filter directive used when `SMARTMARK_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            default_provider: "google".to_string(),
            confirm_delete: false,
            log_filter: "info".to_string(),
        }
    }
}

/// Which collaborator to talk to, and how.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendSettings {
    /// In-process SQLite store. `None` means the platform data directory.
    Local { database_path: Option<String> },
    /// Hosted auth + REST record store.
    Rest {
        base_url: String,
        anon_key: String,
        #[serde(default = "default_table")]
        table: String,
        #[serde(default)]
        redirect_to: Option<String>,
    },
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings::Local {
            database_path: None,
        }
    }
}

fn default_table() -> String {
    "bookmarks".to_string()
}

/// Light or dark presentation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}
