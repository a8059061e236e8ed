// Smartmark platform paths
// Resolves where settings and the local store live on each OS.
//
// Linux follows XDG, macOS uses Application Support, Windows uses %APPDATA%.

use std::env;
use std::path::PathBuf;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const APP_DIR: &str = "smartmark";
#[cfg(any(target_os = "macos", target_os = "windows"))]
const APP_DIR: &str = "Smartmark";

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// `$VAR` if it is set and non-empty, otherwise `fallback`.
fn env_dir_or(var: &str, fallback: impl FnOnce() -> PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(value) if !value.is_empty() => PathBuf::from(value),
        _ => fallback(),
    }
}

/// Returns the directory holding `settings.json`.
///
/// - **Linux**: `$XDG_CONFIG_HOME/smartmark` or `~/.config/smartmark`
/// - **macOS**: `~/Library/Application Support/Smartmark`
/// - **Windows**: `%APPDATA%/Smartmark`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        home_dir().join("Library").join("Application Support").join(APP_DIR)
    }
    #[cfg(target_os = "windows")]
    {
        env_dir_or("APPDATA", || PathBuf::from("C:\\Users\\Default\\AppData\\Roaming")).join(APP_DIR)
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        env_dir_or("XDG_CONFIG_HOME", || home_dir().join(".config")).join(APP_DIR)
    }
}

/// Returns the directory holding the local bookmark store.
///
/// - **Linux**: `$XDG_DATA_HOME/smartmark` or `~/.local/share/smartmark`
/// - **macOS**: `~/Library/Application Support/Smartmark`
/// - **Windows**: `%APPDATA%/Smartmark`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        home_dir().join("Library").join("Application Support").join(APP_DIR)
    }
    #[cfg(target_os = "windows")]
    {
        env_dir_or("APPDATA", || PathBuf::from("C:\\Users\\Default\\AppData\\Roaming")).join(APP_DIR)
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        env_dir_or("XDG_DATA_HOME", || home_dir().join(".local").join("share")).join(APP_DIR)
    }
}
