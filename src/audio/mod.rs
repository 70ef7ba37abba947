// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio playback for the soundboard.
//!
//! This module provides:
//! - Collaborator traits for the platform audio backend and permissions
//! - The playback slot that owns the single open playback resource
//! - An in-process simulated backend

pub mod backend;
pub mod sim;
pub mod slot;

pub use backend::{
    BackendError, PermissionProvider, PermissionStatus, PlaybackBackend, RecordingBackend,
};
pub use sim::{SimBackend, SimPlayback, SimRecording};
pub use slot::{PlaybackSlot, PlaybackStatus};

use std::future::Future;
use std::panic;

use thiserror::Error;
use tracing::warn;

use crate::sound::SoundRef;

/// Playback error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Source missing or unreadable
    #[error("Failed to open {sound}: {source}")]
    Open {
        sound: SoundRef,
        #[source]
        source: BackendError,
    },
    /// Source opened but the device refused to play it
    #[error("Failed to start {sound}: {source}")]
    Start {
        sound: SoundRef,
        #[source]
        source: BackendError,
    },
    /// The runtime shut down before the operation finished
    #[error("Playback of {sound} interrupted")]
    Interrupted { sound: SoundRef },
}

impl PlaybackError {
    /// Sound the failed operation was for
    pub fn sound(&self) -> &SoundRef {
        match self {
            PlaybackError::Open { sound, .. }
            | PlaybackError::Start { sound, .. }
            | PlaybackError::Interrupted { sound } => sound,
        }
    }
}

/// Run a device sequence on its own task and wait for it
///
/// The sequence keeps going if the waiting future is dropped. Returns
/// `None` only when the runtime cancels the task; a panic is resumed.
pub(crate) async fn run_to_completion<F>(sequence: F) -> Option<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match tokio::spawn(sequence).await {
        Ok(output) => Some(output),
        Err(e) if e.is_panic() => panic::resume_unwind(e.into_panic()),
        Err(e) => {
            warn!(error = %e, "device task cancelled");
            None
        }
    }
}
