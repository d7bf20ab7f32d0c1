//! Playback channels and the active/inactive role pair
//!
//! Exactly two channels exist for the lifetime of the engine. They are
//! never created or destroyed, only rebound to new clips; the "active"
//! role moves between them by flipping an index, never by moving the
//! channel objects.

use crate::audio::PlaybackUnit;
use crate::Result;
use segue_common::Clip;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// One playback channel: a playback unit plus the identity of the clip
/// currently bound to it.
pub struct Channel {
    /// Stable label for logs
    label: &'static str,
    unit: Arc<dyn PlaybackUnit>,
    bound_clip: Mutex<Option<Uuid>>,
}

impl Channel {
    pub fn new(label: &'static str, unit: Arc<dyn PlaybackUnit>) -> Self {
        Self {
            label,
            unit,
            bound_clip: Mutex::new(None),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Load the clip's source into the unit and record the binding.
    pub async fn bind(&self, clip: &Clip) -> Result<()> {
        self.unit.load(&clip.source_uri).await?;
        *self.bound_clip.lock().unwrap() = Some(clip.clip_id);
        Ok(())
    }

    /// Drop the binding without touching the unit's decoded data.
    pub fn unbind(&self) {
        *self.bound_clip.lock().unwrap() = None;
    }

    pub fn bound_clip(&self) -> Option<Uuid> {
        *self.bound_clip.lock().unwrap()
    }

    /// Stale-tick check: is this channel still carrying the given clip?
    pub fn is_bound_to(&self, clip_id: Uuid) -> bool {
        self.bound_clip() == Some(clip_id)
    }

    /// Pause and rewind; the idle-inactive resting state.
    pub fn reset(&self) {
        self.unit.pause();
        self.unit.seek(0.0);
    }

    // Transport passthroughs

    pub fn set_volume(&self, volume: f32) {
        self.unit.set_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.unit.volume()
    }

    pub fn position(&self) -> f64 {
        self.unit.position()
    }

    pub fn seek(&self, seconds: f64) {
        self.unit.seek(seconds);
    }

    pub fn play(&self) {
        self.unit.play();
    }

    pub fn pause(&self) {
        self.unit.pause();
    }

    pub fn is_playing(&self) -> bool {
        self.unit.is_playing()
    }

    pub fn duration(&self) -> Option<f64> {
        self.unit.duration()
    }
}

/// The two fixed channels plus the index of the currently active one.
///
/// Exactly one channel is active at any instant, even mid-crossfade; the
/// role flips atomically in `swap`.
pub struct ChannelPair {
    channels: [Arc<Channel>; 2],
    active: AtomicUsize,
}

impl ChannelPair {
    pub fn new(first: Arc<dyn PlaybackUnit>, second: Arc<dyn PlaybackUnit>) -> Self {
        Self {
            channels: [
                Arc::new(Channel::new("a", first)),
                Arc::new(Channel::new("b", second)),
            ],
            active: AtomicUsize::new(0),
        }
    }

    pub fn active(&self) -> Arc<Channel> {
        Arc::clone(&self.channels[self.active.load(Ordering::Acquire)])
    }

    pub fn inactive(&self) -> Arc<Channel> {
        Arc::clone(&self.channels[self.active.load(Ordering::Acquire) ^ 1])
    }

    /// Flip the active role. Only called at crossfade trigger time.
    pub fn swap(&self) {
        self.active.fetch_xor(1, Ordering::AcqRel);
    }

    pub fn active_label(&self) -> &'static str {
        self.channels[self.active.load(Ordering::Acquire)].label()
    }

    /// Both channels, active first.
    pub fn both(&self) -> [Arc<Channel>; 2] {
        [self.active(), self.inactive()]
    }
}
