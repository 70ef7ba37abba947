// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Single-resource playback slot.
//!
//! The slot owns at most one open playback handle. Starting a new sound
//! always releases the previous handle before the next one is opened, and
//! every operation runs behind one FIFO gate so that overlapping calls queue
//! instead of interleaving their release/open sequences. A caller that gives
//! up while queued leaves nothing behind; one that gives up mid-operation
//! leaves the operation to finish.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use super::backend::PlaybackBackend;
use super::{run_to_completion, PlaybackError};
use crate::sound::SoundRef;

/// Observable playback state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "sound", rename_all = "snake_case")]
pub enum PlaybackStatus {
    /// Nothing open
    Empty,
    /// Sound open and playing
    Playing(SoundRef),
    /// Sound open but no longer playing
    Stopped(SoundRef),
}

impl PlaybackStatus {
    /// Check if a sound is playing
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackStatus::Playing(_))
    }

    /// Sound currently held, if any
    pub fn sound(&self) -> Option<&SoundRef> {
        match self {
            PlaybackStatus::Empty => None,
            PlaybackStatus::Playing(sound) | PlaybackStatus::Stopped(sound) => Some(sound),
        }
    }
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        PlaybackStatus::Empty
    }
}

/// Handle held by the slot
struct Held<H> {
    handle: H,
    sound: SoundRef,
    playing: bool,
}

/// Exclusive access to the held handle for one operation
type Gate<H> = OwnedMutexGuard<Option<Held<H>>>;

/// State shared with the task running an operation
struct Shared<B: PlaybackBackend> {
    /// Platform backend
    backend: B,
    /// Status feed, readable while an operation is in flight
    status: watch::Sender<PlaybackStatus>,
}

/// Owner of the one open playback resource
///
/// Once an operation has the gate it runs to completion on its own task,
/// so dropping the caller's future never strands an open handle.
pub struct PlaybackSlot<B: PlaybackBackend> {
    shared: Arc<Shared<B>>,
    /// Held handle; the lock is the pending-operation gate
    held: Arc<Mutex<Option<Held<B::Handle>>>>,
}

impl<B: PlaybackBackend + 'static> PlaybackSlot<B> {
    /// Create an empty slot
    pub fn new(backend: B) -> Self {
        let (status, _) = watch::channel(PlaybackStatus::Empty);
        Self {
            shared: Arc::new(Shared { backend, status }),
            held: Arc::new(Mutex::new(None)),
        }
    }

    /// Get the backend
    pub fn backend(&self) -> &B {
        &self.shared.backend
    }

    /// Current status
    pub fn status(&self) -> PlaybackStatus {
        self.shared.status.borrow().clone()
    }

    /// Subscribe to status changes
    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.shared.status.subscribe()
    }

    /// Play a sound, replacing whatever is held
    ///
    /// The previous handle is fully released before the new one is opened.
    /// On failure the slot is left empty.
    pub async fn play(&self, sound: SoundRef) -> Result<(), PlaybackError> {
        let gate = Arc::clone(&self.held).lock_owned().await;
        let shared = Arc::clone(&self.shared);
        let queued = sound.clone();

        run_to_completion(async move { shared.play(gate, queued).await })
            .await
            .unwrap_or(Err(PlaybackError::Interrupted { sound }))
    }

    /// Stop and release the held sound
    ///
    /// Never fails; stopping an empty slot does nothing.
    pub async fn stop(&self) {
        let gate = Arc::clone(&self.held).lock_owned().await;
        let shared = Arc::clone(&self.shared);

        if run_to_completion(async move { shared.stop(gate).await })
            .await
            .is_none()
        {
            warn!("playback stop interrupted");
        }
    }

    /// Mark the held sound as played to the end
    ///
    /// The handle stays open until it is replaced, stopped or torn down.
    pub async fn finished(&self) {
        let mut held = self.held.lock().await;
        if let Some(current) = held.as_mut() {
            if current.playing {
                current.playing = false;
                debug!(sound = %current.sound, "playback finished");
                self.shared
                    .status
                    .send_replace(PlaybackStatus::Stopped(current.sound.clone()));
            }
        }
    }

    /// Release everything before the owner goes away
    pub async fn teardown(&self) {
        debug!("tearing down playback slot");
        self.stop().await;
    }
}

impl<B: PlaybackBackend> Shared<B> {
    async fn play(
        &self,
        mut held: Gate<B::Handle>,
        sound: SoundRef,
    ) -> Result<(), PlaybackError> {
        if let Some(previous) = held.take() {
            self.release(previous).await;
            self.status.send_replace(PlaybackStatus::Empty);
        }

        debug!(sound = %sound, "opening playback");
        let handle = self
            .backend
            .open(&sound)
            .await
            .map_err(|source| {
                warn!(sound = %sound, error = %source, "playback open failed");
                PlaybackError::Open {
                    sound: sound.clone(),
                    source,
                }
            })?;

        if let Err(source) = self.backend.start(&handle).await {
            warn!(sound = %sound, error = %source, "playback start failed");
            if let Err(e) = self.backend.close(handle).await {
                warn!(sound = %sound, error = %e, "failed to close unstarted playback");
            }
            return Err(PlaybackError::Start { sound, source });
        }

        info!(sound = %sound, "playing");
        *held = Some(Held {
            handle,
            sound: sound.clone(),
            playing: true,
        });
        self.status.send_replace(PlaybackStatus::Playing(sound));
        Ok(())
    }

    async fn stop(&self, mut held: Gate<B::Handle>) {
        match held.take() {
            Some(current) => {
                debug!(sound = %current.sound, "stopping playback");
                self.release(current).await;
                self.status.send_replace(PlaybackStatus::Empty);
            }
            None => debug!("stop on empty slot"),
        }
    }

    /// Stop (if playing) and close a handle; failures are logged
    async fn release(&self, current: Held<B::Handle>) {
        if current.playing {
            if let Err(e) = self.backend.stop(&current.handle).await {
                warn!(sound = %current.sound, error = %e, "failed to stop playback");
            }
        }
        if let Err(e) = self.backend.close(current.handle).await {
            warn!(sound = %current.sound, error = %e, "failed to close playback");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SimBackend;
    use std::time::Duration;
    use tokio::time::timeout;

    fn beat(n: u32) -> SoundRef {
        SoundRef::asset(format!("sounds/beat{}.mp3", n))
    }

    #[tokio::test]
    async fn test_play_opens_and_starts() {
        let backend = SimBackend::new();
        let slot = PlaybackSlot::new(backend.clone());

        slot.play(beat(1)).await.unwrap();

        assert_eq!(slot.status(), PlaybackStatus::Playing(beat(1)));
        assert_eq!(backend.playback_opens(), 1);
        assert_eq!(backend.playback_starts(), 1);
        assert_eq!(backend.open_playback(), 1);
    }

    #[tokio::test]
    async fn test_play_releases_previous_first() {
        let backend = SimBackend::new();
        let slot = PlaybackSlot::new(backend.clone());

        slot.play(beat(1)).await.unwrap();
        slot.play(beat(2)).await.unwrap();

        assert_eq!(slot.status(), PlaybackStatus::Playing(beat(2)));
        assert_eq!(backend.playback_stops(), 1);
        assert_eq!(backend.playback_closes(), 1);
        assert_eq!(backend.open_playback(), 1);
        assert_eq!(backend.max_open_playback(), 1);
    }

    #[tokio::test]
    async fn test_open_failure_leaves_empty() {
        let backend = SimBackend::new();
        backend.set_missing(beat(9));
        let slot = PlaybackSlot::new(backend.clone());

        slot.play(beat(1)).await.unwrap();
        let err = slot.play(beat(9)).await.unwrap_err();

        assert!(matches!(err, PlaybackError::Open { .. }));
        assert_eq!(slot.status(), PlaybackStatus::Empty);
        assert_eq!(backend.open_playback(), 0);
    }

    #[tokio::test]
    async fn test_start_failure_closes_handle() {
        let backend = SimBackend::new();
        backend.set_fail_start(true);
        let slot = PlaybackSlot::new(backend.clone());

        let err = slot.play(beat(1)).await.unwrap_err();

        assert!(matches!(err, PlaybackError::Start { .. }));
        assert_eq!(slot.status(), PlaybackStatus::Empty);
        assert_eq!(backend.playback_closes(), 1);
        assert_eq!(backend.open_playback(), 0);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let backend = SimBackend::new();
        let slot = PlaybackSlot::new(backend.clone());

        slot.stop().await;
        slot.play(beat(1)).await.unwrap();
        slot.stop().await;
        slot.stop().await;

        assert_eq!(slot.status(), PlaybackStatus::Empty);
        assert_eq!(backend.playback_stops(), 1);
        assert_eq!(backend.playback_closes(), 1);
    }

    #[tokio::test]
    async fn test_finished_keeps_handle_open() {
        let backend = SimBackend::new();
        let slot = PlaybackSlot::new(backend.clone());

        slot.play(beat(3)).await.unwrap();
        slot.finished().await;
        assert_eq!(slot.status(), PlaybackStatus::Stopped(beat(3)));
        assert_eq!(backend.open_playback(), 1);

        // Already stopped: release closes without a second stop
        slot.teardown().await;
        assert_eq!(backend.playback_stops(), 0);
        assert_eq!(backend.playback_closes(), 1);
        assert_eq!(slot.status(), PlaybackStatus::Empty);
    }

    #[tokio::test]
    async fn test_overlapping_plays_queue() {
        let backend = SimBackend::new();
        backend.set_latency(Duration::from_millis(5));
        let slot = PlaybackSlot::new(backend.clone());

        let (a, b) = tokio::join!(slot.play(beat(1)), slot.play(beat(2)));
        a.unwrap();
        b.unwrap();

        assert_eq!(slot.status(), PlaybackStatus::Playing(beat(2)));
        assert_eq!(backend.open_playback(), 1);
        assert_eq!(backend.max_open_playback(), 1);
        assert_eq!(backend.playing(), vec![beat(2)]);
    }

    #[tokio::test]
    async fn test_stop_during_open_applies_after() {
        let backend = SimBackend::new();
        backend.set_latency(Duration::from_millis(5));
        let slot = PlaybackSlot::new(backend.clone());

        let (played, ()) = tokio::join!(slot.play(beat(1)), slot.stop());
        played.unwrap();

        assert_eq!(slot.status(), PlaybackStatus::Empty);
        assert_eq!(backend.open_playback(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_play_still_releases_on_teardown() {
        let backend = SimBackend::new();
        backend.set_latency(Duration::from_millis(10));
        let slot = PlaybackSlot::new(backend.clone());

        // Gives up between open and start
        let result = timeout(Duration::from_millis(15), slot.play(beat(1))).await;
        assert!(result.is_err());

        slot.teardown().await;

        assert_eq!(backend.playback_opens(), 1);
        assert_eq!(backend.playback_closes(), 1);
        assert_eq!(backend.open_playback(), 0);
        assert_eq!(slot.status(), PlaybackStatus::Empty);
    }

    #[tokio::test]
    async fn test_abandoned_play_completes() {
        let backend = SimBackend::new();
        backend.set_latency(Duration::from_millis(10));
        let slot = PlaybackSlot::new(backend.clone());
        slot.play(beat(1)).await.unwrap();

        // Gives up while the previous sound is being released
        let result = timeout(Duration::from_millis(5), slot.play(beat(2))).await;
        assert!(result.is_err());

        let mut rx = slot.subscribe();
        rx.wait_for(|status| *status == PlaybackStatus::Playing(beat(2)))
            .await
            .unwrap();
        assert_eq!(backend.open_playback(), 1);
        assert_eq!(backend.playing(), vec![beat(2)]);
    }

    #[tokio::test]
    async fn test_abandoned_while_queued_does_nothing() {
        let backend = SimBackend::new();
        backend.set_latency(Duration::from_millis(10));
        let slot = PlaybackSlot::new(backend.clone());

        let (first, second) = tokio::join!(
            slot.play(beat(1)),
            timeout(Duration::from_millis(5), slot.play(beat(2)))
        );
        first.unwrap();
        assert!(second.is_err());

        assert_eq!(slot.status(), PlaybackStatus::Playing(beat(1)));
        assert_eq!(backend.playback_opens(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_sees_changes() {
        let backend = SimBackend::new();
        let slot = PlaybackSlot::new(backend);
        let mut rx = slot.subscribe();

        slot.play(beat(4)).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), PlaybackStatus::Playing(beat(4)));
    }
}
