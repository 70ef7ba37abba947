// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Soundboard audio session core.
//!
//! Plays fixed sounds, records short clips from the microphone and keeps a
//! small history of the latest recordings, while guaranteeing that at most
//! one playback resource and one recording resource are open at a time.

pub mod audio;
pub mod board;
pub mod catalog;
pub mod config;
pub mod recording;
pub mod sound;

pub use audio::{
    BackendError, PermissionProvider, PermissionStatus, PlaybackBackend, PlaybackError,
    PlaybackSlot, PlaybackStatus, RecordingBackend, SimBackend,
};
pub use board::{Action, ActionReport, BoardSnapshot, Soundboard, SoundboardError};
pub use catalog::SoundCatalog;
pub use config::{BoardConfig, RecordingConfig, RecordingQuality};
pub use recording::{
    ClipEntry, ClipError, ClipHistory, ClipId, ClipView, RecordingError, RecordingSession,
    RecordingStatus, SavedHook, ToggleOutcome,
};
pub use sound::SoundRef;
