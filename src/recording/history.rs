// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Bounded history of finished recordings.
//!
//! Keeps the most recent recordings in insertion order. When a new clip
//! would exceed capacity the oldest one is evicted. Each clip gets a stable
//! id alongside its position, because positions shift whenever the history
//! changes.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::audio::{PlaybackBackend, PlaybackError, PlaybackSlot};
use crate::sound::SoundRef;

/// Number of recordings kept by default
pub const DEFAULT_CAPACITY: usize = 3;

/// Stable clip identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClipId(u64);

impl ClipId {
    /// Raw ordinal
    pub fn ordinal(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clip-{}", self.0)
    }
}

/// A finished recording kept in history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipEntry {
    /// Stable id
    pub id: ClipId,
    /// Where the recording lives
    pub sound: SoundRef,
    /// Insertion order; strictly increasing
    pub ordinal: u64,
}

/// What the UI needs to draw one clip button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClipView {
    /// Current position
    pub index: usize,
    /// 1-based label number ("Sound 1")
    pub display_ordinal: usize,
    /// Stable id
    pub id: ClipId,
}

/// Clip lookup and playback errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipError {
    /// Position out of range, usually a stale render
    #[error("No clip at index {index} (history holds {len})")]
    Index { index: usize, len: usize },
    /// Clip was deleted or evicted
    #[error("Unknown clip {0}")]
    Unknown(ClipId),
    /// Clip found but could not be played
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// Fixed-capacity FIFO of recordings
#[derive(Debug, Clone)]
pub struct ClipHistory {
    entries: VecDeque<ClipEntry>,
    capacity: usize,
    next_ordinal: u64,
}

impl ClipHistory {
    /// Create a history holding `DEFAULT_CAPACITY` clips
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a history with a custom capacity (at least 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            next_ordinal: 0,
        }
    }

    /// Append a recording, evicting the oldest when full
    pub fn add(&mut self, sound: SoundRef) -> ClipId {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        let id = ClipId(ordinal);

        self.entries.push_back(ClipEntry { id, sound, ordinal });
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                debug!(clip = %evicted.id, sound = %evicted.sound, "evicted oldest clip");
            }
        }

        debug!(clip = %id, len = self.entries.len(), "clip added");
        id
    }

    /// Entry at a position
    pub fn get(&self, index: usize) -> Result<&ClipEntry, ClipError> {
        self.entries.get(index).ok_or(ClipError::Index {
            index,
            len: self.entries.len(),
        })
    }

    /// Sound at a position
    pub fn sound_at(&self, index: usize) -> Result<SoundRef, ClipError> {
        self.get(index).map(|entry| entry.sound.clone())
    }

    /// Entry with an id
    pub fn find(&self, id: ClipId) -> Result<&ClipEntry, ClipError> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .ok_or(ClipError::Unknown(id))
    }

    /// Current position of a clip
    pub fn position(&self, id: ClipId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    /// Play the clip at a position
    ///
    /// For owners that hold the history directly. When the history sits
    /// behind a lock, copy the sound out with [`sound_at`](Self::sound_at)
    /// and play it after releasing the lock, as `Soundboard` does, so other
    /// history operations are not blocked for the length of a device open.
    pub async fn play_at<B: PlaybackBackend + 'static>(
        &self,
        index: usize,
        slot: &PlaybackSlot<B>,
    ) -> Result<(), ClipError> {
        let sound = self.sound_at(index)?;
        slot.play(sound).await?;
        Ok(())
    }

    /// Play a clip by id
    ///
    /// Same locking caveat as [`play_at`](Self::play_at); the locked form
    /// is [`find`](Self::find) followed by a slot play.
    pub async fn play<B: PlaybackBackend + 'static>(
        &self,
        id: ClipId,
        slot: &PlaybackSlot<B>,
    ) -> Result<(), ClipError> {
        let sound = self.find(id)?.sound.clone();
        slot.play(sound).await?;
        Ok(())
    }

    /// Remove the clip at a position
    ///
    /// Playback is left alone even if this clip is the one playing.
    pub fn delete_at(&mut self, index: usize) -> Result<ClipEntry, ClipError> {
        let len = self.entries.len();
        let entry = self
            .entries
            .remove(index)
            .ok_or(ClipError::Index { index, len })?;
        debug!(clip = %entry.id, "clip deleted");
        Ok(entry)
    }

    /// Remove a clip by id
    pub fn delete(&mut self, id: ClipId) -> Result<ClipEntry, ClipError> {
        let index = self.position(id).ok_or(ClipError::Unknown(id))?;
        self.delete_at(index)
    }

    /// Render rows for the UI
    pub fn views(&self) -> Vec<ClipView> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| ClipView {
                index,
                display_ordinal: index + 1,
                id: entry.id,
            })
            .collect()
    }

    /// Entries oldest first
    pub fn iter(&self) -> impl Iterator<Item = &ClipEntry> {
        self.entries.iter()
    }

    /// Sounds oldest first
    pub fn sounds(&self) -> Vec<SoundRef> {
        self.entries.iter().map(|entry| entry.sound.clone()).collect()
    }

    /// Number of clips held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of clips held
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ClipHistory {
    fn default() -> Self {
        Self::new()
    }
}
