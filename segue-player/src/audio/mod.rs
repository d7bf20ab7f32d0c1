//! Audio playback primitive
//!
//! The engine drives channels exclusively through the [`PlaybackUnit`]
//! trait: volume, position, transport, and an async `load`. The production
//! implementation ([`DeviceUnit`]) decodes with symphonia, resamples with
//! rubato, and plays through cpal; tests drive the engine through scripted
//! implementations instead.

pub mod decoder;
pub mod device;
pub mod output;
pub mod resampler;

pub use decoder::{ClipDecoder, DecodedClip};
pub use device::{DeviceUnit, MasterVolume};
pub use output::AudioOutput;
pub use resampler::{Resampler, TARGET_SAMPLE_RATE};

use crate::Result;
use async_trait::async_trait;

/// Per-channel playback capability.
///
/// Exactly two units exist for the lifetime of the engine; they are never
/// created or destroyed, only rebound to new clips via `load`.
///
/// Transport and volume methods are cheap and callable from timer ticks;
/// `load` may decode an entire clip and is async.
#[async_trait]
pub trait PlaybackUnit: Send + Sync {
    /// Bind a clip source to this unit, replacing any previous binding.
    ///
    /// Loading the same source twice is a no-op, so rebinding the second
    /// channel to the clip the first already carries is cheap.
    async fn load(&self, source_uri: &str) -> Result<()>;

    /// Set the channel volume, clamped to [0.0, 1.0].
    fn set_volume(&self, volume: f32);

    /// Current channel volume.
    fn volume(&self) -> f32;

    /// Current position in seconds.
    fn position(&self) -> f64;

    /// Seek to a position in seconds (clamped to the clip length).
    fn seek(&self, seconds: f64);

    /// Start or resume playback.
    fn play(&self);

    /// Pause playback, holding position and volume.
    fn pause(&self);

    /// Whether the unit is currently advancing.
    fn is_playing(&self) -> bool;

    /// Decoded duration in seconds, or None until a clip is loaded.
    ///
    /// While this is None the crossfade trigger condition is simply
    /// unreachable.
    fn duration(&self) -> Option<f64>;
}
