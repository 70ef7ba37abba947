// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sound references.
//!
//! A `SoundRef` points at something a playback backend can open: either an
//! asset bundled with the application or a location produced by a recording.
//! The referenced file is owned by whoever stores it, never by the board.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque locator for a playable audio source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum SoundRef {
    /// Asset bundled with the application (e.g. "sounds/beat1.mp3")
    Asset(String),
    /// Filesystem or platform URI, typically a finished recording
    Uri(String),
}

impl SoundRef {
    /// Create an asset reference
    pub fn asset(id: impl Into<String>) -> Self {
        SoundRef::Asset(id.into())
    }

    /// Create a URI reference
    pub fn uri(location: impl Into<String>) -> Self {
        SoundRef::Uri(location.into())
    }

    /// The raw location string
    pub fn location(&self) -> &str {
        match self {
            SoundRef::Asset(id) => id,
            SoundRef::Uri(location) => location,
        }
    }

    /// Check if this refers to a recorded clip rather than a bundled asset
    pub fn is_recording(&self) -> bool {
        matches!(self, SoundRef::Uri(_))
    }
}

impl fmt::Display for SoundRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoundRef::Asset(id) => write!(f, "asset:{}", id),
            SoundRef::Uri(location) => write!(f, "{}", location),
        }
    }
}
