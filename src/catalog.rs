// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Fixed sound catalog.

use crate::config::BoardConfig;
use crate::sound::SoundRef;

/// Ordered set of (key, sound) pairs
#[derive(Debug, Clone, PartialEq)]
pub struct SoundCatalog {
    entries: Vec<(String, SoundRef)>,
}

impl SoundCatalog {
    /// Create from ordered pairs
    pub fn new<K: Into<String>>(entries: impl IntoIterator<Item = (K, SoundRef)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, sound)| (key.into(), sound))
                .collect(),
        }
    }

    /// Build from configuration
    pub fn from_config(config: &BoardConfig) -> Self {
        Self::new(
            config
                .catalog
                .iter()
                .map(|entry| (entry.key.clone(), entry.sound())),
        )
    }

    /// Look up a sound by key
    pub fn get(&self, key: &str) -> Option<&SoundRef> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, sound)| sound)
    }

    /// Keys in display order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Entries in display order
    pub fn entries(&self) -> &[(String, SoundRef)] {
        &self.entries
    }

    /// Entries grouped into rows for display
    pub fn rows(&self, width: usize) -> Vec<&[(String, SoundRef)]> {
        self.entries.chunks(width.max(1)).collect()
    }

    /// Number of sounds
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SoundCatalog {
    fn default() -> Self {
        Self::from_config(&BoardConfig::default())
    }
}
