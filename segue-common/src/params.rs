//! Engine timing parameters
//!
//! All timing knobs for the loop crossfade engine in one place, with
//! built-in defaults and fail-fast validation at startup. Runtime values
//! may be overridden from the settings table before the engine starts;
//! they do not change while the engine is running.

use crate::{Error, Result};
use std::time::Duration;

/// Default crossfade lead: how far before the clip end the crossfade fires.
pub const DEFAULT_CROSSFADE_LEAD_SECS: f64 = 2.5;

/// Default fade ramp duration.
pub const DEFAULT_FADE_SECS: f64 = 1.5;

/// Default fade poll interval. Coarser than 100ms produces audible
/// stepping; finer than 20ms wastes cycles for no perceptual gain.
pub const DEFAULT_FADE_TICK_MS: u64 = 50;

/// Default progress poll interval for the loop coordinator.
pub const DEFAULT_PROGRESS_TICK_MS: u64 = 250;

/// Default visibility ratio above which an item auto-plays.
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.5;

/// Timing parameters for the loop crossfade engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineParams {
    /// Remaining time on the active channel at which a crossfade triggers
    pub crossfade_lead: Duration,

    /// Duration of each linear volume ramp (same for in and out)
    pub fade_duration: Duration,

    /// Fade volume update interval
    pub fade_tick: Duration,

    /// Active-channel progress poll interval
    pub progress_tick: Duration,

    /// Visibility ratio threshold for auto-play
    pub visibility_threshold: f32,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            crossfade_lead: Duration::from_secs_f64(DEFAULT_CROSSFADE_LEAD_SECS),
            fade_duration: Duration::from_secs_f64(DEFAULT_FADE_SECS),
            fade_tick: Duration::from_millis(DEFAULT_FADE_TICK_MS),
            progress_tick: Duration::from_millis(DEFAULT_PROGRESS_TICK_MS),
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
        }
    }
}

impl EngineParams {
    /// Validate the configuration invariants.
    ///
    /// The lead time must cover the full fade duration, otherwise the
    /// fade-out would be clipped by loop wraparound. This is a
    /// configuration error caught at initialization, never a runtime
    /// check.
    pub fn validate(&self) -> Result<()> {
        if self.crossfade_lead < self.fade_duration {
            return Err(Error::Config(format!(
                "crossfade lead ({:?}) must be >= fade duration ({:?})",
                self.crossfade_lead, self.fade_duration
            )));
        }
        if self.fade_duration.is_zero() {
            return Err(Error::Config("fade duration must be > 0".to_string()));
        }
        if self.fade_tick.is_zero() || self.progress_tick.is_zero() {
            return Err(Error::Config("poll intervals must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(Error::Config(format!(
                "visibility threshold {} outside [0.0, 1.0]",
                self.visibility_threshold
            )));
        }
        Ok(())
    }
}
