// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Soundboard facade.
//!
//! Ties the playback slot, recording session, clip history and sound
//! catalog together behind the five actions a UI can send, and produces the
//! snapshot the UI renders after each one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::audio::{
    PermissionProvider, PermissionStatus, PlaybackBackend, PlaybackError, PlaybackSlot,
    PlaybackStatus, RecordingBackend,
};
use crate::catalog::SoundCatalog;
use crate::config::{BoardConfig, RecordingConfig};
use crate::recording::{
    ClipError, ClipHistory, ClipId, ClipView, RecordingError, RecordingSession, RecordingStatus,
    SavedHook, ToggleOutcome,
};
use crate::sound::SoundRef;

/// One user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Play a catalog sound by key
    PlayFixed(String),
    /// Stop whatever is playing
    StopPlayback,
    /// Start or stop recording
    ToggleRecording,
    /// Play the recorded clip at a position
    PlayClip(usize),
    /// Delete the recorded clip at a position
    DeleteClip(usize),
}

/// Everything the UI needs to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    /// Playback slot state
    pub playback: PlaybackStatus,
    /// Recording session state
    pub recording: RecordingStatus,
    /// Recorded clips, oldest first
    pub clips: Vec<ClipView>,
}

/// Result of one action, with the state to render either way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    /// Board state after the action
    pub snapshot: BoardSnapshot,
    /// Why the action failed, if it did
    pub error: Option<SoundboardError>,
}

/// Soundboard error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoundboardError {
    /// Key not in the catalog
    #[error("Unknown sound: {0}")]
    UnknownSound(String),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error(transparent)]
    Recording(#[from] RecordingError),
    #[error(transparent)]
    Clip(#[from] ClipError),
}

/// The board a UI talks to
pub struct Soundboard<A, R, P>
where
    A: PlaybackBackend,
    R: RecordingBackend,
    P: PermissionProvider,
{
    catalog: SoundCatalog,
    row_width: usize,
    playback: PlaybackSlot<A>,
    recorder: RecordingSession<R, P>,
    /// Shared with the recorder's saved-clip hook; never held across an await
    history: Arc<Mutex<ClipHistory>>,
}

impl<A, R, P> Soundboard<A, R, P>
where
    A: PlaybackBackend + 'static,
    R: RecordingBackend + 'static,
    P: PermissionProvider + 'static,
{
    /// Create a board from its parts
    pub fn new(
        catalog: SoundCatalog,
        history_capacity: usize,
        recording: RecordingConfig,
        playback: A,
        recorder: R,
        permissions: P,
    ) -> Self {
        let history = Arc::new(Mutex::new(ClipHistory::with_capacity(history_capacity)));
        let sink = Arc::clone(&history);
        let on_saved: SavedHook = Arc::new(move |sound: &SoundRef| {
            let id = lock_history(&sink).add(sound.clone());
            info!(clip = %id, sound = %sound, "recording added to history");
        });

        Self {
            catalog,
            row_width: 3,
            playback: PlaybackSlot::new(playback),
            recorder: RecordingSession::with_saved_hook(recorder, permissions, recording, on_saved),
            history,
        }
    }

    /// Create a board from configuration
    pub fn from_config(config: &BoardConfig, playback: A, recorder: R, permissions: P) -> Self {
        let mut board = Self::new(
            SoundCatalog::from_config(config),
            config.history.capacity,
            config.recording.clone(),
            playback,
            recorder,
            permissions,
        );
        board.row_width = config.row_width;
        board
    }

    /// Fixed sounds
    pub fn catalog(&self) -> &SoundCatalog {
        &self.catalog
    }

    /// Buttons per catalog row
    pub fn row_width(&self) -> usize {
        self.row_width
    }

    /// Playback slot
    pub fn playback(&self) -> &PlaybackSlot<A> {
        &self.playback
    }

    /// Recording session
    pub fn recorder(&self) -> &RecordingSession<R, P> {
        &self.recorder
    }

    /// Ask for microphone access when the board is first shown
    pub async fn prime_permission(&self) -> PermissionStatus {
        self.recorder.prime_permission().await
    }

    /// Apply one action and return the resulting snapshot
    pub async fn dispatch(&self, action: Action) -> Result<BoardSnapshot, SoundboardError> {
        let report = self.apply(action).await;
        match report.error {
            Some(e) => Err(e),
            None => Ok(report.snapshot),
        }
    }

    /// Apply one action; the snapshot is taken whether or not it failed
    pub async fn apply(&self, action: Action) -> ActionReport {
        debug!(?action, "dispatch");
        let result = match action {
            Action::PlayFixed(key) => self.play_fixed(&key).await,
            Action::StopPlayback => {
                self.stop_playback().await;
                Ok(())
            }
            Action::ToggleRecording => self.toggle_recording().await.map(|_| ()),
            Action::PlayClip(index) => self.play_clip(index).await,
            Action::DeleteClip(index) => self.delete_clip(index),
        };
        ActionReport {
            snapshot: self.snapshot(),
            error: result.err(),
        }
    }

    /// Play a catalog sound
    pub async fn play_fixed(&self, key: &str) -> Result<(), SoundboardError> {
        let sound = self
            .catalog
            .get(key)
            .cloned()
            .ok_or_else(|| SoundboardError::UnknownSound(key.to_string()))?;
        self.playback.play(sound).await?;
        Ok(())
    }

    /// Stop playback
    pub async fn stop_playback(&self) {
        self.playback.stop().await;
    }

    /// Start or stop recording
    ///
    /// A saved recording joins the history before the session reports idle.
    pub async fn toggle_recording(&self) -> Result<ToggleOutcome, SoundboardError> {
        Ok(self.recorder.toggle().await?)
    }

    /// Play the recorded clip at a position
    pub async fn play_clip(&self, index: usize) -> Result<(), SoundboardError> {
        let sound = lock_history(&self.history).sound_at(index)?;
        self.playback.play(sound).await?;
        Ok(())
    }

    /// Play a recorded clip by id
    pub async fn play_clip_id(&self, id: ClipId) -> Result<(), SoundboardError> {
        let sound = lock_history(&self.history).find(id)?.sound.clone();
        self.playback.play(sound).await?;
        Ok(())
    }

    /// Delete the recorded clip at a position
    pub fn delete_clip(&self, index: usize) -> Result<(), SoundboardError> {
        lock_history(&self.history).delete_at(index)?;
        Ok(())
    }

    /// Delete a recorded clip by id
    pub fn delete_clip_id(&self, id: ClipId) -> Result<(), SoundboardError> {
        lock_history(&self.history).delete(id)?;
        Ok(())
    }

    /// Current state for rendering
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            playback: self.playback.status(),
            recording: self.recorder.status(),
            clips: lock_history(&self.history).views(),
        }
    }

    /// Release every open resource before the board goes away
    ///
    /// A recording still in progress is finalized and kept in the history.
    pub async fn teardown(&self) {
        self.playback.teardown().await;
        if let Some(sound) = self.recorder.teardown().await {
            info!(sound = %sound, "recording finalized on teardown");
        }
    }
}

/// History mutations complete before they can panic, so a poisoned lock
/// still guards consistent data
fn lock_history(history: &Mutex<ClipHistory>) -> MutexGuard<'_, ClipHistory> {
    history.lock().unwrap_or_else(PoisonError::into_inner)
}
