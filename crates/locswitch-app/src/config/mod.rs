//! Configuration file parsing for locswitch
//!
//! Supports:
//! - `config.toml` - Global settings (movement, support files, host, devices)
//! - `preferences.toml` - Operator choices remembered between runs

pub mod settings;
pub mod types;

pub use settings::{
    default_config_dir, default_mirror_dir, default_support_dir, init_config_dir, load_settings,
    load_user_preferences, read_settings, save_last_device, save_last_movement_type,
    save_user_preferences,
};
pub use types::*;
