// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! In-process simulated audio backend.
//!
//! Implements playback, recording and permission collaborators without a
//! device. Every call is counted, every call suspends at least once (or for
//! the configured latency), and failures can be injected, so the console
//! front end and the tests can observe exactly which resources are open.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::backend::{
    BackendError, PermissionProvider, PermissionStatus, PlaybackBackend, RecordingBackend,
};
use crate::config::RecordingConfig;
use crate::sound::SoundRef;

/// Simulated playback handle
#[derive(Debug)]
pub struct SimPlayback {
    id: u64,
    sound: SoundRef,
}

impl SimPlayback {
    /// Sound this handle was opened for
    pub fn sound(&self) -> &SoundRef {
        &self.sound
    }
}

/// Simulated recording handle
#[derive(Debug)]
pub struct SimRecording {
    id: u64,
}

#[derive(Default)]
struct Counters {
    playback_opens: AtomicUsize,
    playback_starts: AtomicUsize,
    playback_stops: AtomicUsize,
    playback_closes: AtomicUsize,
    open_playback: AtomicUsize,
    max_open_playback: AtomicUsize,
    configures: AtomicUsize,
    recording_opens: AtomicUsize,
    finalizes: AtomicUsize,
    permission_checks: AtomicUsize,
    permission_requests: AtomicUsize,
}

struct SimState {
    counters: Counters,
    next_id: AtomicU64,
    latency: Mutex<Duration>,
    missing: Mutex<HashSet<SoundRef>>,
    playing: Mutex<HashMap<u64, SoundRef>>,
    fail_start: AtomicBool,
    fail_recording_open: AtomicBool,
    fail_finalize: AtomicBool,
    permission: Mutex<PermissionStatus>,
    request_answer: Mutex<PermissionStatus>,
    recordings_dir: String,
}

/// Simulated device; clones share state
#[derive(Clone)]
pub struct SimBackend {
    state: Arc<SimState>,
}

impl SimBackend {
    /// Create a backend with permission already granted and no latency
    pub fn new() -> Self {
        Self::with_recordings_dir("file:///sim/recordings")
    }

    /// Create a backend writing recordings under the given URI prefix
    pub fn with_recordings_dir(dir: impl Into<String>) -> Self {
        Self {
            state: Arc::new(SimState {
                counters: Counters::default(),
                next_id: AtomicU64::new(1),
                latency: Mutex::new(Duration::ZERO),
                missing: Mutex::new(HashSet::new()),
                playing: Mutex::new(HashMap::new()),
                fail_start: AtomicBool::new(false),
                fail_recording_open: AtomicBool::new(false),
                fail_finalize: AtomicBool::new(false),
                permission: Mutex::new(PermissionStatus::Granted),
                request_answer: Mutex::new(PermissionStatus::Granted),
                recordings_dir: dir.into().trim_end_matches('/').to_string(),
            }),
        }
    }

    /// Set the delay applied to every call
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut current) = self.state.latency.lock() {
            *current = latency;
        }
    }

    /// Make opening this sound fail
    pub fn set_missing(&self, sound: SoundRef) {
        if let Ok(mut missing) = self.state.missing.lock() {
            missing.insert(sound);
        }
    }

    /// Make starting playback fail
    pub fn set_fail_start(&self, fail: bool) {
        self.state.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Make opening the microphone fail
    pub fn set_fail_recording_open(&self, fail: bool) {
        self.state.fail_recording_open.store(fail, Ordering::SeqCst);
    }

    /// Make finalizing recordings fail
    pub fn set_fail_finalize(&self, fail: bool) {
        self.state.fail_finalize.store(fail, Ordering::SeqCst);
    }

    /// Set the current permission status
    pub fn set_permission(&self, status: PermissionStatus) {
        if let Ok(mut current) = self.state.permission.lock() {
            *current = status;
        }
    }

    /// Set what the user answers when asked
    pub fn set_request_answer(&self, answer: PermissionStatus) {
        if let Ok(mut current) = self.state.request_answer.lock() {
            *current = answer;
        }
    }

    /// Number of playback handles opened
    pub fn playback_opens(&self) -> usize {
        self.state.counters.playback_opens.load(Ordering::SeqCst)
    }

    /// Number of playback starts
    pub fn playback_starts(&self) -> usize {
        self.state.counters.playback_starts.load(Ordering::SeqCst)
    }

    /// Number of playback stops
    pub fn playback_stops(&self) -> usize {
        self.state.counters.playback_stops.load(Ordering::SeqCst)
    }

    /// Number of playback handles closed
    pub fn playback_closes(&self) -> usize {
        self.state.counters.playback_closes.load(Ordering::SeqCst)
    }

    /// Playback handles open right now
    pub fn open_playback(&self) -> usize {
        self.state.counters.open_playback.load(Ordering::SeqCst)
    }

    /// Highest number of playback handles ever open at once
    pub fn max_open_playback(&self) -> usize {
        self.state.counters.max_open_playback.load(Ordering::SeqCst)
    }

    /// Number of audio session configurations
    pub fn configures(&self) -> usize {
        self.state.counters.configures.load(Ordering::SeqCst)
    }

    /// Number of recordings opened
    pub fn recording_opens(&self) -> usize {
        self.state.counters.recording_opens.load(Ordering::SeqCst)
    }

    /// Number of stop-and-finalize calls
    pub fn finalizes(&self) -> usize {
        self.state.counters.finalizes.load(Ordering::SeqCst)
    }

    /// Recordings open right now
    pub fn open_recordings(&self) -> usize {
        self.recording_opens().saturating_sub(self.finalizes())
    }

    /// Number of permission status checks
    pub fn permission_checks(&self) -> usize {
        self.state.counters.permission_checks.load(Ordering::SeqCst)
    }

    /// Number of permission requests
    pub fn permission_requests(&self) -> usize {
        self.state.counters.permission_requests.load(Ordering::SeqCst)
    }

    /// Sounds currently started and not yet stopped
    pub fn playing(&self) -> Vec<SoundRef> {
        match self.state.playing.lock() {
            Ok(playing) => {
                let mut entries: Vec<_> = playing.iter().collect();
                entries.sort_by_key(|(id, _)| **id);
                entries.into_iter().map(|(_, sound)| sound.clone()).collect()
            }
            Err(_) => Vec::new(),
        }
    }

    fn next_id(&self) -> u64 {
        self.state.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Suspend like a native call would
    async fn settle(&self) {
        let latency = self
            .state
            .latency
            .lock()
            .map(|l| *l)
            .unwrap_or(Duration::ZERO);
        if latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(latency).await;
        }
    }

    fn poisoned() -> BackendError {
        BackendError::new("simulated device state poisoned")
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackBackend for SimBackend {
    type Handle = SimPlayback;

    async fn open(&self, sound: &SoundRef) -> Result<SimPlayback, BackendError> {
        self.settle().await;
        let missing = self
            .state
            .missing
            .lock()
            .map_err(|_| Self::poisoned())?
            .contains(sound);
        if missing {
            return Err(BackendError::new(format!("{} not found", sound)));
        }

        let counters = &self.state.counters;
        counters.playback_opens.fetch_add(1, Ordering::SeqCst);
        let open = counters.open_playback.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_open_playback.fetch_max(open, Ordering::SeqCst);

        let handle = SimPlayback {
            id: self.next_id(),
            sound: sound.clone(),
        };
        debug!(id = handle.id, sound = %sound, "sim: playback opened");
        Ok(handle)
    }

    async fn start(&self, handle: &SimPlayback) -> Result<(), BackendError> {
        self.settle().await;
        if self.state.fail_start.load(Ordering::SeqCst) {
            return Err(BackendError::new("output device busy"));
        }
        self.state
            .counters
            .playback_starts
            .fetch_add(1, Ordering::SeqCst);
        self.state
            .playing
            .lock()
            .map_err(|_| Self::poisoned())?
            .insert(handle.id, handle.sound.clone());
        Ok(())
    }

    async fn stop(&self, handle: &SimPlayback) -> Result<(), BackendError> {
        self.settle().await;
        self.state
            .counters
            .playback_stops
            .fetch_add(1, Ordering::SeqCst);
        self.state
            .playing
            .lock()
            .map_err(|_| Self::poisoned())?
            .remove(&handle.id);
        Ok(())
    }

    async fn close(&self, handle: SimPlayback) -> Result<(), BackendError> {
        self.settle().await;
        let counters = &self.state.counters;
        counters.playback_closes.fetch_add(1, Ordering::SeqCst);
        counters.open_playback.fetch_sub(1, Ordering::SeqCst);
        self.state
            .playing
            .lock()
            .map_err(|_| Self::poisoned())?
            .remove(&handle.id);
        debug!(id = handle.id, "sim: playback closed");
        Ok(())
    }
}

#[async_trait]
impl RecordingBackend for SimBackend {
    type Recording = SimRecording;

    async fn configure(&self, config: &RecordingConfig) -> Result<(), BackendError> {
        self.settle().await;
        if !config.allows_recording {
            return Err(BackendError::new("audio session does not allow recording"));
        }
        self.state.counters.configures.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn open(&self, config: &RecordingConfig) -> Result<SimRecording, BackendError> {
        self.settle().await;
        if self.state.fail_recording_open.load(Ordering::SeqCst) {
            return Err(BackendError::new("microphone unavailable"));
        }
        self.state
            .counters
            .recording_opens
            .fetch_add(1, Ordering::SeqCst);
        let recording = SimRecording { id: self.next_id() };
        debug!(id = recording.id, quality = ?config.quality, "sim: recording opened");
        Ok(recording)
    }

    async fn stop_and_finalize(&self, recording: SimRecording) -> Result<SoundRef, BackendError> {
        self.settle().await;
        self.state.counters.finalizes.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_finalize.load(Ordering::SeqCst) {
            return Err(BackendError::new("failed to write recording"));
        }
        Ok(SoundRef::uri(format!(
            "{}/recording-{}.m4a",
            self.state.recordings_dir, recording.id
        )))
    }
}

#[async_trait]
impl PermissionProvider for SimBackend {
    async fn status(&self) -> PermissionStatus {
        self.settle().await;
        self.state
            .counters
            .permission_checks
            .fetch_add(1, Ordering::SeqCst);
        self.state
            .permission
            .lock()
            .map(|p| *p)
            .unwrap_or(PermissionStatus::Denied)
    }

    async fn request(&self) -> PermissionStatus {
        self.settle().await;
        self.state
            .counters
            .permission_requests
            .fetch_add(1, Ordering::SeqCst);
        let answer = self
            .state
            .request_answer
            .lock()
            .map(|a| *a)
            .unwrap_or(PermissionStatus::Denied);
        self.set_permission(answer);
        answer
    }
}
