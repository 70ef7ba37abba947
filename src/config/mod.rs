// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for the soundboard.
//!
//! This module provides data structures for loading the fixed sound
//! catalog, history settings and recording options from YAML.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::sound::SoundRef;

/// Root configuration for a board
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardConfig {
    /// Fixed sounds, in display order
    #[serde(default = "default_catalog")]
    pub catalog: Vec<CatalogEntry>,
    /// Buttons per catalog row
    #[serde(default = "default_row_width")]
    pub row_width: usize,
    /// Recorded clip history
    #[serde(default)]
    pub history: HistoryConfig,
    /// Recording options
    #[serde(default)]
    pub recording: RecordingConfig,
}

impl BoardConfig {
    /// Load a board configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a board configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Check the configuration for problems
    pub fn validate(&self) -> Result<()> {
        if self.catalog.is_empty() {
            bail!("Sound catalog is empty");
        }

        let mut seen = HashSet::new();
        for entry in &self.catalog {
            if entry.key.trim().is_empty() {
                bail!("Catalog entry for {:?} has an empty key", entry.asset);
            }
            if !seen.insert(entry.key.as_str()) {
                bail!("Duplicate catalog key: {}", entry.key);
            }
        }

        if self.row_width == 0 {
            bail!("row_width must be at least 1");
        }
        if self.history.capacity == 0 {
            bail!("history.capacity must be at least 1");
        }
        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            row_width: default_row_width(),
            history: HistoryConfig::default(),
            recording: RecordingConfig::default(),
        }
    }
}

fn default_catalog() -> Vec<CatalogEntry> {
    (1..=6)
        .map(|n| CatalogEntry {
            key: format!("beat{}", n),
            asset: format!("sounds/beat{}.mp3", n),
        })
        .collect()
}
fn default_row_width() -> usize {
    3
}
fn default_capacity() -> usize {
    3
}
fn default_true() -> bool {
    true
}

/// One fixed sound
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    /// Stable key used by the UI
    pub key: String,
    /// Bundled asset identifier
    pub asset: String,
}

impl CatalogEntry {
    /// Reference to the asset
    pub fn sound(&self) -> SoundRef {
        SoundRef::asset(self.asset.clone())
    }
}

/// Recorded clip history settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryConfig {
    /// Number of recordings kept
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// Recording quality preset
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordingQuality {
    /// High quality (AAC 44.1 kHz stereo)
    High,
    /// Low quality (AMR/AAC 44.1 kHz mono, low bitrate)
    Low,
}

impl Default for RecordingQuality {
    fn default() -> Self {
        RecordingQuality::High
    }
}

/// Audio session options applied before recording
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordingConfig {
    /// Quality preset
    #[serde(default)]
    pub quality: RecordingQuality,
    /// Allow the shared audio session to record
    #[serde(default = "default_true")]
    pub allows_recording: bool,
    /// Keep playing when the device is in silent mode
    #[serde(default = "default_true")]
    pub plays_in_silent_mode: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            quality: RecordingQuality::default(),
            allows_recording: true,
            plays_in_silent_mode: true,
        }
    }
}
