//! Engine configuration
//!
//! YAML-backed settings for the render context and waveform display.
//! Loading is forgiving: a missing or unparsable file falls back to
//! defaults with a log line, so a bad config never prevents startup.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE};

/// Top-level engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Render sample rate in Hz
    pub sample_rate: u32,
    /// Frames per render block
    pub block_size: usize,
    /// Default waveform viewport width in pixels
    pub summary_width: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            summary_width: 800,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file
    ///
    /// If the file doesn't exist, returns the default config. If the file
    /// exists but is invalid, logs a warning and returns the default config.
    pub fn load(path: &Path) -> Self {
        log::info!("config: loading from {:?}", path);

        if !path.exists() {
            log::info!("config: file doesn't exist, using defaults");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str::<Self>(&contents) {
                Ok(config) => {
                    log::info!("config: loaded from {:?}", path);
                    config
                }
                Err(e) => {
                    log::warn!("config: failed to parse: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("config: failed to read file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to a YAML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        log::info!("config: saving to {:?}", path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }
}
