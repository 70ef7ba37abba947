// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Microphone recording and recorded clip history.
//!
//! This module provides:
//! - The permission-gated record/stop session
//! - The bounded history of finished recordings

pub mod history;
pub mod session;

pub use history::{ClipEntry, ClipError, ClipHistory, ClipId, ClipView, DEFAULT_CAPACITY};
pub use session::{RecordingSession, RecordingStatus, SavedHook, ToggleOutcome};

use thiserror::Error;

use crate::audio::BackendError;

/// Recording error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordingError {
    /// User refused microphone access
    #[error("Microphone permission denied")]
    PermissionDenied,
    /// Another record/stop is still in flight
    #[error("Recording session is busy")]
    Busy,
    /// Audio session could not be switched to recording mode
    #[error("Failed to configure audio session: {0}")]
    Configure(#[source] BackendError),
    /// Microphone could not be opened
    #[error("Failed to start recording: {0}")]
    Open(#[source] BackendError),
    /// Recording could not be saved
    #[error("Failed to save recording: {0}")]
    Finalize(#[source] BackendError),
    /// The runtime shut down before the toggle finished
    #[error("Recording operation interrupted")]
    Interrupted,
}
