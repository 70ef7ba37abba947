// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Record/stop session.
//!
//! One toggle drives the whole lifecycle: from idle it checks permission,
//! configures the audio session and opens the microphone; while recording it
//! stops and finalizes the clip. A toggle that arrives while another is
//! still waiting on permission or finalizing is rejected with `Busy`.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use super::RecordingError;
use crate::audio::{run_to_completion, PermissionProvider, PermissionStatus, RecordingBackend};
use crate::config::RecordingConfig;
use crate::sound::SoundRef;

/// Recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingStatus {
    /// Not recording
    Idle,
    /// Checking or asking for microphone access, then opening
    AwaitingPermission,
    /// Actively recording
    Recording,
    /// Stopping and saving the clip
    Finalizing,
}

impl RecordingStatus {
    /// Check if a toggle is in flight
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            RecordingStatus::AwaitingPermission | RecordingStatus::Finalizing
        )
    }
}

impl Default for RecordingStatus {
    fn default() -> Self {
        RecordingStatus::Idle
    }
}

/// Result of a successful toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Recording began
    Started,
    /// Recording ended and was saved here
    Stopped(SoundRef),
}

/// Called with every clip the session saves
pub type SavedHook = Arc<dyn Fn(&SoundRef) + Send + Sync>;

/// Exclusive access to the open recording for one toggle
type Gate<T> = OwnedMutexGuard<Option<T>>;

/// State shared with the task running a toggle
struct Shared<R: RecordingBackend, P: PermissionProvider> {
    /// Platform recorder
    backend: R,
    /// Microphone permission
    permissions: P,
    /// Audio session options
    config: RecordingConfig,
    /// Status feed
    status: watch::Sender<RecordingStatus>,
    /// Receives saved clips before the session returns to idle
    on_saved: Option<SavedHook>,
}

/// Owner of the one recording resource
///
/// A toggle that has passed the busy check runs to completion on its own
/// task; the saved-clip hook sees its result even if the caller stopped
/// waiting.
pub struct RecordingSession<R: RecordingBackend, P: PermissionProvider> {
    shared: Arc<Shared<R, P>>,
    /// Open recording; the lock is held for the whole of each toggle
    active: Arc<Mutex<Option<R::Recording>>>,
}

impl<R, P> RecordingSession<R, P>
where
    R: RecordingBackend + 'static,
    P: PermissionProvider + 'static,
{
    /// Create an idle session
    pub fn new(backend: R, permissions: P, config: RecordingConfig) -> Self {
        Self::build(backend, permissions, config, None)
    }

    /// Create an idle session that reports every saved clip
    pub fn with_saved_hook(
        backend: R,
        permissions: P,
        config: RecordingConfig,
        on_saved: SavedHook,
    ) -> Self {
        Self::build(backend, permissions, config, Some(on_saved))
    }

    fn build(
        backend: R,
        permissions: P,
        config: RecordingConfig,
        on_saved: Option<SavedHook>,
    ) -> Self {
        let (status, _) = watch::channel(RecordingStatus::Idle);
        Self {
            shared: Arc::new(Shared {
                backend,
                permissions,
                config,
                status,
                on_saved,
            }),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Get the recording options
    pub fn config(&self) -> &RecordingConfig {
        &self.shared.config
    }

    /// Current status
    pub fn status(&self) -> RecordingStatus {
        *self.shared.status.borrow()
    }

    /// Subscribe to status changes
    pub fn subscribe(&self) -> watch::Receiver<RecordingStatus> {
        self.shared.status.subscribe()
    }

    /// Ask for microphone access ahead of the first recording
    pub async fn prime_permission(&self) -> PermissionStatus {
        let status = self.shared.permissions.request().await;
        debug!(?status, "microphone permission primed");
        status
    }

    /// Start recording when idle, stop and save when recording
    pub async fn toggle(&self) -> Result<ToggleOutcome, RecordingError> {
        let gate = Arc::clone(&self.active).try_lock_owned().map_err(|_| {
            debug!(status = ?self.status(), "toggle rejected, session busy");
            RecordingError::Busy
        })?;
        let shared = Arc::clone(&self.shared);

        run_to_completion(async move { shared.toggle(gate).await })
            .await
            .unwrap_or(Err(RecordingError::Interrupted))
    }

    /// Finalize any open recording before the owner goes away
    ///
    /// Waits for an in-flight toggle first. Returns the saved clip, if one
    /// was open and could be saved.
    pub async fn teardown(&self) -> Option<SoundRef> {
        let gate = Arc::clone(&self.active).lock_owned().await;
        let shared = Arc::clone(&self.shared);

        run_to_completion(async move { shared.teardown(gate).await })
            .await
            .flatten()
    }
}

impl<R: RecordingBackend, P: PermissionProvider> Shared<R, P> {
    async fn toggle(
        &self,
        mut active: Gate<R::Recording>,
    ) -> Result<ToggleOutcome, RecordingError> {
        match active.take() {
            None => {
                let recording = self.start().await?;
                *active = Some(recording);
                self.status.send_replace(RecordingStatus::Recording);
                info!("recording started");
                Ok(ToggleOutcome::Started)
            }
            Some(recording) => {
                let sound = self.finalize(recording).await?;
                info!(sound = %sound, "recording saved");
                Ok(ToggleOutcome::Stopped(sound))
            }
        }
    }

    async fn teardown(&self, mut active: Gate<R::Recording>) -> Option<SoundRef> {
        let recording = active.take()?;

        debug!("finalizing recording on teardown");
        match self.finalize(recording).await {
            Ok(sound) => Some(sound),
            Err(e) => {
                warn!(error = %e, "recording lost on teardown");
                None
            }
        }
    }

    /// Idle → Recording; the session is back to Idle on any error
    async fn start(&self) -> Result<R::Recording, RecordingError> {
        self.status.send_replace(RecordingStatus::AwaitingPermission);

        let result = self.open().await;
        if let Err(e) = &result {
            warn!(error = %e, "recording not started");
            self.status.send_replace(RecordingStatus::Idle);
        }
        result
    }

    async fn open(&self) -> Result<R::Recording, RecordingError> {
        self.ensure_permission().await?;

        self.backend
            .configure(&self.config)
            .await
            .map_err(RecordingError::Configure)?;

        self.backend
            .open(&self.config)
            .await
            .map_err(RecordingError::Open)
    }

    /// Permission can be revoked externally, so it is checked every time
    async fn ensure_permission(&self) -> Result<(), RecordingError> {
        let status = self.permissions.status().await;
        if status.is_granted() {
            return Ok(());
        }

        debug!(?status, "requesting microphone permission");
        if self.permissions.request().await.is_granted() {
            Ok(())
        } else {
            Err(RecordingError::PermissionDenied)
        }
    }

    /// Recording → Finalizing → Idle
    async fn finalize(&self, recording: R::Recording) -> Result<SoundRef, RecordingError> {
        self.status.send_replace(RecordingStatus::Finalizing);
        let result = self
            .backend
            .stop_and_finalize(recording)
            .await
            .map_err(RecordingError::Finalize);

        match &result {
            Ok(sound) => {
                if let Some(on_saved) = &self.on_saved {
                    on_saved(sound);
                }
            }
            Err(e) => warn!(error = %e, "recording could not be saved"),
        }
        self.status.send_replace(RecordingStatus::Idle);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SimBackend;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::time::timeout;

    fn session(backend: &SimBackend) -> RecordingSession<SimBackend, SimBackend> {
        RecordingSession::new(backend.clone(), backend.clone(), RecordingConfig::default())
    }

    #[tokio::test]
    async fn test_start_stop() {
        let backend = SimBackend::new();
        let session = session(&backend);

        assert_eq!(session.toggle().await.unwrap(), ToggleOutcome::Started);
        assert_eq!(session.status(), RecordingStatus::Recording);
        assert_eq!(backend.configures(), 1);

        let ToggleOutcome::Stopped(sound) = session.toggle().await.unwrap() else {
            panic!("expected a saved clip");
        };
        assert!(sound.is_recording());
        assert_eq!(session.status(), RecordingStatus::Idle);
        assert_eq!(backend.open_recordings(), 0);
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let backend = SimBackend::new();
        backend.set_permission(PermissionStatus::Denied);
        backend.set_request_answer(PermissionStatus::Denied);
        let session = session(&backend);

        let err = session.toggle().await.unwrap_err();

        assert_eq!(err, RecordingError::PermissionDenied);
        assert_eq!(session.status(), RecordingStatus::Idle);
        assert_eq!(backend.recording_opens(), 0);
        assert_eq!(backend.configures(), 0);
    }

    #[tokio::test]
    async fn test_undetermined_permission_is_requested() {
        let backend = SimBackend::new();
        backend.set_permission(PermissionStatus::Undetermined);
        backend.set_request_answer(PermissionStatus::Granted);
        let session = session(&backend);

        assert_eq!(session.toggle().await.unwrap(), ToggleOutcome::Started);
        assert_eq!(backend.permission_requests(), 1);
    }

    #[tokio::test]
    async fn test_permission_rechecked_each_start() {
        let backend = SimBackend::new();
        let session = session(&backend);

        session.toggle().await.unwrap();
        session.toggle().await.unwrap();

        // Revoked behind the session's back
        backend.set_permission(PermissionStatus::Denied);
        backend.set_request_answer(PermissionStatus::Denied);

        assert_eq!(
            session.toggle().await.unwrap_err(),
            RecordingError::PermissionDenied
        );
        assert_eq!(backend.permission_checks(), 2);
        assert_eq!(backend.recording_opens(), 1);
    }

    #[tokio::test]
    async fn test_busy_while_awaiting_permission() {
        let backend = SimBackend::new();
        backend.set_latency(Duration::from_millis(5));
        let session = session(&backend);

        let (first, second) = tokio::join!(session.toggle(), session.toggle());

        assert_eq!(first.unwrap(), ToggleOutcome::Started);
        assert_eq!(second.unwrap_err(), RecordingError::Busy);
        assert_eq!(session.status(), RecordingStatus::Recording);
        assert_eq!(backend.recording_opens(), 1);
    }

    #[tokio::test]
    async fn test_busy_while_finalizing() {
        let backend = SimBackend::new();
        backend.set_latency(Duration::from_millis(5));
        let session = session(&backend);
        session.toggle().await.unwrap();

        let (first, second) = tokio::join!(session.toggle(), session.toggle());

        assert!(matches!(first.unwrap(), ToggleOutcome::Stopped(_)));
        assert_eq!(second.unwrap_err(), RecordingError::Busy);
        assert_eq!(session.status(), RecordingStatus::Idle);
        assert_eq!(backend.finalizes(), 1);
    }

    #[tokio::test]
    async fn test_finalize_error_returns_to_idle() {
        let backend = SimBackend::new();
        backend.set_fail_finalize(true);
        let session = session(&backend);

        session.toggle().await.unwrap();
        let err = session.toggle().await.unwrap_err();

        assert!(matches!(err, RecordingError::Finalize(_)));
        assert_eq!(session.status(), RecordingStatus::Idle);

        // The session can start again
        backend.set_fail_finalize(false);
        assert_eq!(session.toggle().await.unwrap(), ToggleOutcome::Started);
    }

    #[tokio::test]
    async fn test_open_error_returns_to_idle() {
        let backend = SimBackend::new();
        backend.set_fail_recording_open(true);
        let session = session(&backend);

        let err = session.toggle().await.unwrap_err();

        assert!(matches!(err, RecordingError::Open(_)));
        assert_eq!(session.status(), RecordingStatus::Idle);
    }

    #[tokio::test]
    async fn test_configure_error() {
        let backend = SimBackend::new();
        let config = RecordingConfig {
            allows_recording: false,
            ..RecordingConfig::default()
        };
        let session = RecordingSession::new(backend.clone(), backend.clone(), config);

        let err = session.toggle().await.unwrap_err();

        assert!(matches!(err, RecordingError::Configure(_)));
        assert_eq!(backend.recording_opens(), 0);
    }

    #[tokio::test]
    async fn test_teardown_finalizes_once() {
        let backend = SimBackend::new();
        let session = session(&backend);

        assert_eq!(session.teardown().await, None);

        session.toggle().await.unwrap();
        assert!(session.teardown().await.is_some());
        assert_eq!(session.teardown().await, None);

        assert_eq!(backend.finalizes(), 1);
        assert_eq!(backend.open_recordings(), 0);
        assert_eq!(session.status(), RecordingStatus::Idle);
    }

    #[tokio::test]
    async fn test_teardown_waits_for_toggle() {
        let backend = SimBackend::new();
        backend.set_latency(Duration::from_millis(5));
        let session = session(&backend);

        let (toggled, saved) = tokio::join!(session.toggle(), session.teardown());

        assert_eq!(toggled.unwrap(), ToggleOutcome::Started);
        assert!(saved.is_some());
        assert_eq!(backend.recording_opens(), 1);
        assert_eq!(backend.finalizes(), 1);
        assert_eq!(backend.open_recordings(), 0);
        assert_eq!(session.status(), RecordingStatus::Idle);
    }

    #[tokio::test]
    async fn test_abandoned_start_still_records() {
        let backend = SimBackend::new();
        backend.set_latency(Duration::from_millis(10));
        let session = session(&backend);

        let result = timeout(Duration::from_millis(5), session.toggle()).await;
        assert!(result.is_err());

        let mut rx = session.subscribe();
        rx.wait_for(|status| *status == RecordingStatus::Recording)
            .await
            .unwrap();
        assert_eq!(backend.open_recordings(), 1);

        assert!(session.teardown().await.is_some());
        assert_eq!(backend.open_recordings(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_stop_still_saves() {
        let backend = SimBackend::new();
        let saved = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&saved);
        let session = RecordingSession::with_saved_hook(
            backend.clone(),
            backend.clone(),
            RecordingConfig::default(),
            Arc::new(move |sound: &SoundRef| sink.lock().unwrap().push(sound.clone())),
        );
        session.toggle().await.unwrap();
        backend.set_latency(Duration::from_millis(10));

        let result = timeout(Duration::from_millis(5), session.toggle()).await;
        assert!(result.is_err());

        let mut rx = session.subscribe();
        rx.wait_for(|status| *status == RecordingStatus::Idle)
            .await
            .unwrap();
        assert_eq!(backend.finalizes(), 1);
        assert_eq!(backend.open_recordings(), 0);
        assert_eq!(saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_saved_hook_skips_failures() {
        let backend = SimBackend::new();
        let saved = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&saved);
        let session = RecordingSession::with_saved_hook(
            backend.clone(),
            backend.clone(),
            RecordingConfig::default(),
            Arc::new(move |sound: &SoundRef| sink.lock().unwrap().push(sound.clone())),
        );

        session.toggle().await.unwrap();
        let ToggleOutcome::Stopped(sound) = session.toggle().await.unwrap() else {
            panic!("expected a saved clip");
        };
        backend.set_fail_finalize(true);
        session.toggle().await.unwrap();
        session.toggle().await.unwrap_err();

        assert_eq!(*saved.lock().unwrap(), vec![sound]);
    }

    #[tokio::test]
    async fn test_prime_permission() {
        let backend = SimBackend::new();
        backend.set_permission(PermissionStatus::Undetermined);
        let session = session(&backend);

        assert_eq!(session.prime_permission().await, PermissionStatus::Granted);
        assert_eq!(backend.permission_requests(), 1);
    }

    #[test]
    fn test_transient_states() {
        assert!(RecordingStatus::AwaitingPermission.is_transient());
        assert!(RecordingStatus::Finalizing.is_transient());
        assert!(!RecordingStatus::Idle.is_transient());
        assert!(!RecordingStatus::Recording.is_transient());
    }
}
