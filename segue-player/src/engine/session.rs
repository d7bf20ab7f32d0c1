//! Playback session
//!
//! The user-intent surface over the loop coordinator: select, toggle,
//! pause, stop, seek, plus the read-only time readouts the UI renders.

use crate::engine::coordinator::LoopCoordinator;
use crate::state::SharedState;
use crate::Result;
use segue_common::events::EngineState;
use segue_common::Clip;
use std::sync::Arc;
use tracing::debug;

/// Per-clip session state and user intents.
pub struct PlaybackSession {
    coordinator: Arc<LoopCoordinator>,
    state: Arc<SharedState>,
}

impl PlaybackSession {
    pub fn new(coordinator: Arc<LoopCoordinator>, state: Arc<SharedState>) -> Arc<Self> {
        Arc::new(Self { coordinator, state })
    }

    pub fn coordinator(&self) -> &Arc<LoopCoordinator> {
        &self.coordinator
    }

    /// Bind a clip and start looping it, replacing any current clip.
    pub async fn select(&self, clip: Clip) -> Result<()> {
        self.coordinator.start(clip).await
    }

    /// Toggle semantics:
    /// - different clip (or nothing playing): start it
    /// - same clip playing: pause (both channels, fades cancelled)
    /// - same clip paused: resume
    pub async fn toggle(&self, clip: Clip) -> Result<()> {
        let current = self.coordinator.current_clip();
        let state = self.state.engine_state().await;

        let same_clip = current
            .as_ref()
            .map(|c| c.clip_id == clip.clip_id)
            .unwrap_or(false);

        match (same_clip, state) {
            (true, EngineState::Playing) | (true, EngineState::Crossfading) => {
                debug!("Toggle: pausing current clip");
                self.coordinator.pause().await;
                Ok(())
            }
            (true, EngineState::Paused) => {
                debug!("Toggle: resuming current clip");
                self.coordinator.resume().await;
                Ok(())
            }
            _ => {
                debug!("Toggle: starting clip {}", clip.clip_id);
                self.coordinator.start(clip).await
            }
        }
    }

    /// Explicit pause.
    pub async fn pause(&self) {
        self.coordinator.pause().await;
    }

    /// Resume from pause.
    pub async fn resume(&self) {
        self.coordinator.resume().await;
    }

    /// Stop and return to Idle.
    pub async fn stop(&self) {
        self.coordinator.stop().await;
    }

    /// Seek the active channel; clears the crossfade guard.
    pub async fn seek(&self, seconds: f64) {
        self.coordinator.seek(seconds).await;
    }

    /// Elapsed seconds on the active channel.
    pub fn elapsed(&self) -> f64 {
        self.coordinator.channel_pair().active().position()
    }

    /// Decoded duration of the active channel's clip, when known.
    pub fn duration(&self) -> Option<f64> {
        self.coordinator.channel_pair().active().duration()
    }

    /// Progress through the clip in [0.0, 1.0]; 0.0 while duration is
    /// unknown.
    pub fn progress_fraction(&self) -> f64 {
        match self.duration() {
            Some(duration) if duration > 0.0 => (self.elapsed() / duration).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}
