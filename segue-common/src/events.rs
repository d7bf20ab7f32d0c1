//! Event types and EventBus for the segue playback service
//!
//! Events are broadcast via the EventBus (tokio::broadcast) and serialized
//! for SSE transmission to connected clients.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Engine state as observed from outside the loop coordinator.
///
/// `Crossfading` is transient: the coordinator enters it while dispatching
/// the two fade jobs and returns to `Playing` as soon as the role swap has
/// happened, which is within the same trigger call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// No clip bound; both channels paused and reset
    Idle,
    /// Active channel audible (fade-in may still be ramping)
    Playing,
    /// Crossfade dispatch in progress
    Crossfading,
    /// User-paused; both channels hold volume and position
    Paused,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Idle => "idle",
            EngineState::Playing => "playing",
            EngineState::Crossfading => "crossfading",
            EngineState::Paused => "paused",
        }
    }
}

/// Segue event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SegueEvent {
    /// Engine state changed
    PlaybackStateChanged {
        state: EngineState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A new clip was bound and loop playback started
    ClipSelected {
        clip_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback progress update (periodic while playing)
    PlaybackProgress {
        clip_id: Uuid,
        position_ms: u64,
        duration_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A loop-boundary crossfade was dispatched
    CrossfadeStarted {
        clip_id: Uuid,
        position_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Master volume changed
    VolumeChanged {
        volume: f32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A clip source failed to load or play; session returned to Idle
    PlaybackFailed {
        clip_id: Uuid,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SegueEvent {
    /// Event type string for the SSE `event:` field
    pub fn type_str(&self) -> &'static str {
        match self {
            SegueEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            SegueEvent::ClipSelected { .. } => "ClipSelected",
            SegueEvent::PlaybackProgress { .. } => "PlaybackProgress",
            SegueEvent::CrossfadeStarted { .. } => "CrossfadeStarted",
            SegueEvent::VolumeChanged { .. } => "VolumeChanged",
            SegueEvent::PlaybackFailed { .. } => "PlaybackFailed",
        }
    }
}

// ========================================
// EventBus
// ========================================

/// One-to-many event broadcasting over tokio::broadcast.
///
/// Slow subscribers lag and drop old events rather than blocking emitters.
pub struct EventBus {
    tx: broadcast::Sender<SegueEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<SegueEvent> {
        self.tx.subscribe()
    }

    /// Emit an event; returns the subscriber count or an error when nobody
    /// is listening.
    pub fn emit(&self, event: SegueEvent) -> Result<usize, broadcast::error::SendError<SegueEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the no-subscribers case.
    ///
    /// Progress ticks and other high-frequency events use this path.
    pub fn emit_lossy(&self, event: SegueEvent) {
        let _ = self.tx.send(event);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

// ========================================
// Tests
// ========================================
