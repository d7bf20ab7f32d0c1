//! Linear volume ramps
//!
//! Drives a channel's volume along a linear ramp on a fixed polling
//! interval. One job slot per direction: starting a new fade-in cancels a
//! running fade-in but never touches a running fade-out, and vice versa,
//! so a crossfade is two independent timelines.

use crate::engine::channel::Channel;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant};
use tracing::debug;

/// Ramp direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    /// 0.0 -> 1.0 over the fade duration
    In,
    /// current volume -> 0.0 over the fade duration
    Out,
}

impl FadeDirection {
    fn index(self) -> usize {
        match self {
            FadeDirection::In => 0,
            FadeDirection::Out => 1,
        }
    }

    /// Exact volume at ramp completion.
    fn terminal(self) -> f32 {
        match self {
            FadeDirection::In => 1.0,
            FadeDirection::Out => 0.0,
        }
    }
}

/// Callback invoked exactly once when a fade reaches its terminal value.
pub type FadeComplete = Box<dyn FnOnce() + Send>;

/// Fade job dispatcher with one generation counter per direction.
///
/// A job polls until it is superseded (its generation is stale), it is
/// cancelled, or it completes. Completion snaps the volume to the exact
/// terminal value so repeated crossfades cannot accumulate float drift.
pub struct Fader {
    tick: Duration,
    generations: [Arc<AtomicU64>; 2],
}

impl Fader {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick,
            generations: [Arc::new(AtomicU64::new(0)), Arc::new(AtomicU64::new(0))],
        }
    }

    /// Start a fade job on `channel`, cancelling any prior job of the same
    /// direction.
    ///
    /// Fade-in forces the start volume to 0.0; fade-out captures the
    /// channel's current volume, so retriggering a fade-out mid-ramp
    /// continues from wherever the previous one had reached.
    pub fn start_fade(
        &self,
        channel: Arc<Channel>,
        direction: FadeDirection,
        duration: Duration,
        on_complete: Option<FadeComplete>,
    ) {
        let slot = Arc::clone(&self.generations[direction.index()]);
        let generation = slot.fetch_add(1, Ordering::AcqRel) + 1;

        let start_volume = match direction {
            FadeDirection::In => {
                channel.set_volume(0.0);
                0.0
            }
            FadeDirection::Out => channel.volume(),
        };

        debug!(
            "Fade {:?} on channel {} from {:.3} over {:?}",
            direction,
            channel.label(),
            start_volume,
            duration
        );

        let tick = self.tick;
        let started = Instant::now();
        let mut on_complete = on_complete;

        tokio::spawn(async move {
            let mut ticker = interval(tick);
            loop {
                ticker.tick().await;

                // Superseded by a newer job of the same direction
                if slot.load(Ordering::Acquire) != generation {
                    return;
                }

                let elapsed = started.elapsed();
                if elapsed >= duration {
                    channel.set_volume(direction.terminal());
                    if let Some(complete) = on_complete.take() {
                        complete();
                    }
                    return;
                }

                let t = elapsed.as_secs_f64() / duration.as_secs_f64();
                let volume = match direction {
                    FadeDirection::In => t,
                    FadeDirection::Out => start_volume as f64 * (1.0 - t),
                };
                channel.set_volume(volume.clamp(0.0, 1.0) as f32);
            }
        });
    }

    /// Cancel any in-flight job of the given direction.
    pub fn cancel(&self, direction: FadeDirection) {
        self.generations[direction.index()].fetch_add(1, Ordering::AcqRel);
    }

    /// Cancel both directions.
    pub fn cancel_all(&self) {
        self.cancel(FadeDirection::In);
        self.cancel(FadeDirection::Out);
    }
}
