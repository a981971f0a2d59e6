use dirs::home_dir;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    pub host: String,
    pub basic_auth: String,
    pub username: String,
    pub password: String,
    /// Per-request HTTP timeout. Unset means requests wait as long as the server takes.
    pub timeout_secs: Option<u64>,
    pub socket_path: String,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            host: "http://127.0.0.1:5013".to_string(),
            basic_auth: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: None,
            socket_path: "/socket.io/".to_string(),
        }
    }
}

impl AdminSettings {
    /// Whether login credentials are configured
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }
}

/// Get configuration file path, creating `~/.srms` if needed
pub fn get_config_path() -> Option<PathBuf> {
    let mut path = home_dir()?;
    path.push(".srms");
    fs::create_dir_all(&path).ok();
    path.push("admin_config.json");
    Some(path)
}

/// Load settings from the default configuration file
pub fn load_settings() -> AdminSettings {
    match get_config_path() {
        Some(path) => load_settings_from(&path),
        None => {
            error!("Could not find home directory, using default settings");
            AdminSettings::default()
        }
    }
}

/// Load settings from a specific file, falling back to defaults
pub fn load_settings_from(path: &Path) -> AdminSettings {
    match fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            error!("Failed to parse admin config {}: {}", path.display(), e);
            AdminSettings::default()
        }),
        Err(_) => {
            debug!("Admin config file {} not found, using defaults", path.display());
            AdminSettings::default()
        }
    }
}

/// Save settings to a specific file
pub fn save_settings_to(path: &Path, settings: &AdminSettings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    info!("Admin settings saved to {}", path.display());
    Ok(())
}

/// Save settings to the default configuration file
pub fn save_settings(settings: &AdminSettings) -> Result<()> {
    let path = get_config_path().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "Could not find home directory")
    })?;
    save_settings_to(&path, settings)
}
