//! Operator movement-type control state

use std::path::PathBuf;
use std::sync::RwLock;

use locswitch_core::prelude::*;
use locswitch_core::MovementType;

use crate::config;
use crate::ui::MovementTypeSource;

/// The movement type picker, optionally persisted to preferences.toml
#[derive(Debug, Default)]
pub struct MovementControls {
    current: RwLock<Option<MovementType>>,
    config_dir: Option<PathBuf>,
}

impl MovementControls {
    /// In-memory controls starting at `initial`
    pub fn new(initial: Option<MovementType>) -> Self {
        Self {
            current: RwLock::new(initial),
            config_dir: None,
        }
    }

    /// Controls restored from and saved to `config_dir`
    ///
    /// The remembered choice wins over `fallback` (the configured default).
    pub fn persisted(config_dir: impl Into<PathBuf>, fallback: Option<MovementType>) -> Self {
        let config_dir = config_dir.into();
        let remembered =
            config::load_user_preferences(&config_dir).and_then(|p| p.last_movement_type);
        Self {
            current: RwLock::new(remembered.or(fallback)),
            config_dir: Some(config_dir),
        }
    }

    /// Record the operator's choice
    pub fn select(&self, movement_type: MovementType) -> Result<()> {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(movement_type);
        debug!("Movement type set to {}", movement_type);

        match &self.config_dir {
            Some(dir) => config::save_last_movement_type(dir, movement_type),
            None => Ok(()),
        }
    }
}

impl MovementTypeSource for MovementControls {
    fn last_movement_type(&self) -> Option<MovementType> {
        *self.current.read().unwrap_or_else(|e| e.into_inner())
    }
}
