//! Shared playback state
//!
//! Thread-safe shared state for coordination between the engine, the HTTP
//! handlers, and the SSE broadcaster. Uses RwLock for concurrent read
//! access with rare writes.

use segue_common::events::{EngineState, EventBus, SegueEvent};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// UI-facing readout for the currently bound clip
#[derive(Debug, Clone)]
pub struct CurrentClip {
    /// Clip identity
    pub clip_id: Uuid,
    /// Active-channel position in milliseconds
    pub position_ms: u64,
    /// Decoded duration in milliseconds (0 until the clip is loaded)
    pub duration_ms: u64,
}

/// Shared state accessible by all components
pub struct SharedState {
    /// Current engine state
    engine_state: RwLock<EngineState>,

    /// Currently bound clip readout (None when Idle)
    current_clip: RwLock<Option<CurrentClip>>,

    /// Master volume (0.0-1.0)
    volume: RwLock<f32>,

    /// Event broadcaster for SSE
    events: EventBus,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            engine_state: RwLock::new(EngineState::Idle),
            current_clip: RwLock::new(None),
            volume: RwLock::new(0.75),
            events: EventBus::new(100),
        }
    }

    /// Broadcast an event to all SSE listeners (no-subscriber is fine)
    pub fn broadcast_event(&self, event: SegueEvent) {
        self.events.emit_lossy(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<SegueEvent> {
        self.events.subscribe()
    }

    pub async fn engine_state(&self) -> EngineState {
        *self.engine_state.read().await
    }

    /// Set engine state, broadcasting a PlaybackStateChanged event when the
    /// state actually changes.
    pub async fn set_engine_state(&self, state: EngineState) {
        let mut guard = self.engine_state.write().await;
        if *guard != state {
            *guard = state;
            self.broadcast_event(SegueEvent::PlaybackStateChanged {
                state,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    pub async fn current_clip(&self) -> Option<CurrentClip> {
        self.current_clip.read().await.clone()
    }

    pub async fn set_current_clip(&self, clip: Option<CurrentClip>) {
        *self.current_clip.write().await = clip;
    }

    pub async fn volume(&self) -> f32 {
        *self.volume.read().await
    }

    pub async fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        *self.volume.write().await = volume;
        self.broadcast_event(SegueEvent::VolumeChanged {
            volume,
            timestamp: chrono::Utc::now(),
        });
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
