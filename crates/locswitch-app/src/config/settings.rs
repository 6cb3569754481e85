//! Settings and preferences files in the locswitch config directory

use std::path::{Path, PathBuf};

use super::types::{Settings, UserPreferences};
use locswitch_core::prelude::*;
use locswitch_core::MovementType;

const CONFIG_FILENAME: &str = "config.toml";
const PREFERENCES_FILENAME: &str = "preferences.toml";
const APP_DIR: &str = "locswitch";

/// Default config directory (`~/.config/locswitch` on Linux)
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Default support file store (`~/.local/share/locswitch/support` on Linux)
pub fn default_support_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("support")
}

/// Default support file mirror (`~/.local/share/locswitch/mirror` on Linux)
pub fn default_mirror_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("mirror")
}

/// Load settings from `<config_dir>/config.toml`
///
/// Returns default settings if file doesn't exist or can't be parsed.
pub fn load_settings(config_dir: &Path) -> Settings {
    read_settings(config_dir).unwrap_or_else(|e| {
        warn!("{}, using default settings", e);
        Settings::default()
    })
}

/// Read `<config_dir>/config.toml`, failing on a file that is not valid
///
/// A missing file is not an error and yields the defaults.
pub fn read_settings(config_dir: &Path) -> Result<Settings> {
    let config_path = config_dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let settings = toml::from_str(&content).map_err(|e| {
        Error::config_invalid(format!("{}: {}", config_path.display(), e.message()))
    })?;

    debug!("Loaded settings from {:?}", config_path);
    Ok(settings)
}

/// Create a commented default config.toml if none exists
pub fn init_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir)
            .map_err(|e| Error::config(format!("Failed to create config dir: {}", e)))?;
    }

    let config_path = config_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        let default_content = r#"# locswitch configuration

[movement]
# default_type = "walk"   # walk | cycle | drive

[support]
# directory = "/path/to/support/files"
# mirror = "/path/to/mirror"

[host]
enabled = true
# latitude = 37.3349
# longitude = -122.0090

# [[devices]]
# id = "00008110-001A2B3C4D5E"
# name = "iPhone"
# connection = "usb"      # usb | network
# os_version = "17.4"
"#;
        std::fs::write(&config_path, default_content)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config at {:?}", config_path);
    }

    Ok(())
}

/// Load preferences from `<config_dir>/preferences.toml`
///
/// Returns None if the file doesn't exist or can't be parsed.
pub fn load_user_preferences(config_dir: &Path) -> Option<UserPreferences> {
    let prefs_path = config_dir.join(PREFERENCES_FILENAME);

    if !prefs_path.exists() {
        debug!("No preferences file at {:?}", prefs_path);
        return None;
    }

    match std::fs::read_to_string(&prefs_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(prefs) => {
                debug!("Loaded user preferences from {:?}", prefs_path);
                Some(prefs)
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", prefs_path, e);
                None
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", prefs_path, e);
            None
        }
    }
}

/// Save preferences to `<config_dir>/preferences.toml`
///
/// Writes to a temp file then renames it over the old one.
pub fn save_user_preferences(config_dir: &Path, prefs: &UserPreferences) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir)
            .map_err(|e| Error::config(format!("Failed to create config dir: {}", e)))?;
    }

    let prefs_path = config_dir.join(PREFERENCES_FILENAME);
    let temp_path = config_dir.join(".preferences.toml.tmp");

    let header = "# Operator preferences, rewritten by locswitch\n\n";
    let content = toml::to_string_pretty(prefs)
        .map_err(|e| Error::config(format!("Failed to serialize preferences: {}", e)))?;

    std::fs::write(&temp_path, format!("{}{}", header, content))
        .context("Failed to write preferences temp file")?;

    std::fs::rename(&temp_path, &prefs_path).context("Failed to replace preferences.toml")?;

    debug!("Saved user preferences to {:?}", prefs_path);
    Ok(())
}

/// Remember the movement type, preserving other preferences
pub fn save_last_movement_type(config_dir: &Path, movement_type: MovementType) -> Result<()> {
    let mut prefs = load_user_preferences(config_dir).unwrap_or_default();
    prefs.last_movement_type = Some(movement_type);
    save_user_preferences(config_dir, &prefs)
}

/// Remember the selected device, preserving other preferences
pub fn save_last_device(config_dir: &Path, device_id: Option<&str>) -> Result<()> {
    let mut prefs = load_user_preferences(config_dir).unwrap_or_default();
    prefs.last_device = device_id.map(|s| s.to_string());
    save_user_preferences(config_dir, &prefs)
}
