// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Platform collaborator seams.
//!
//! The board never touches a device directly. Playback, recording and
//! microphone permission are reached through these traits, which a host
//! implements on top of its native audio API.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::RecordingConfig;
use crate::sound::SoundRef;

/// Failure reported by a platform collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
}

impl BackendError {
    /// Create a backend error from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Native playback resources
///
/// A handle returned by `open` must eventually be passed to `close`
/// exactly once.
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// Opened playback resource
    type Handle: Send + Sync + 'static;

    /// Load a source and return a handle for it
    async fn open(&self, sound: &SoundRef) -> Result<Self::Handle, BackendError>;

    /// Begin playing an opened handle
    async fn start(&self, handle: &Self::Handle) -> Result<(), BackendError>;

    /// Stop a playing handle without releasing it
    async fn stop(&self, handle: &Self::Handle) -> Result<(), BackendError>;

    /// Release the handle
    async fn close(&self, handle: Self::Handle) -> Result<(), BackendError>;
}

/// Native recording resources
#[async_trait]
pub trait RecordingBackend: Send + Sync {
    /// In-progress recording resource
    type Recording: Send + Sync + 'static;

    /// Switch the shared audio session into recording mode
    async fn configure(&self, config: &RecordingConfig) -> Result<(), BackendError>;

    /// Start capturing from the microphone
    async fn open(&self, config: &RecordingConfig) -> Result<Self::Recording, BackendError>;

    /// Stop capturing, write the clip out and release the resource
    ///
    /// The recording is consumed whether or not the clip could be saved.
    async fn stop_and_finalize(&self, recording: Self::Recording) -> Result<SoundRef, BackendError>;
}

/// Microphone permission state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// User allowed microphone access
    Granted,
    /// User refused microphone access
    Denied,
    /// User has not been asked yet
    Undetermined,
}

impl PermissionStatus {
    /// Check if recording is allowed
    pub fn is_granted(self) -> bool {
        self == PermissionStatus::Granted
    }
}

/// Process-wide microphone permission
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Current permission status; may change externally at any time
    async fn status(&self) -> PermissionStatus;

    /// Ask the user; answers `Granted` or `Denied`
    async fn request(&self) -> PermissionStatus;
}
