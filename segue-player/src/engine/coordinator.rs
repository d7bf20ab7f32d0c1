//! Loop coordinator
//!
//! Polls the active channel's progress and, near the clip end, dispatches
//! the loop crossfade: the inactive channel starts from position 0 and
//! fades in while the active channel fades out. The active/inactive role
//! swap and the guard release both happen synchronously at trigger time;
//! only the ramps themselves run on after dispatch.

use crate::engine::channel::ChannelPair;
use crate::engine::fader::{FadeDirection, Fader};
use crate::state::{CurrentClip, SharedState};
use crate::Result;
use segue_common::events::{EngineState, SegueEvent};
use segue_common::{Clip, EngineParams};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::interval;
use tracing::{debug, info, warn};

/// Emit a PlaybackProgress event every N progress ticks (1s at the
/// default 250ms tick).
const PROGRESS_EVENT_EVERY_TICKS: u32 = 4;

/// Orchestrates loop playback over the two fixed channels.
pub struct LoopCoordinator {
    pair: Arc<ChannelPair>,
    fader: Fader,
    params: EngineParams,
    state: Arc<SharedState>,

    /// Crossfade guard: prevents the trigger condition from firing twice
    /// for one boundary crossing. Released at dispatch, not at fade
    /// completion.
    guard: AtomicBool,

    /// Bumped on every stop/rebind; stale ticks and callbacks from a
    /// superseded clip see the change and discard themselves.
    epoch: AtomicU64,

    current_clip: Mutex<Option<Clip>>,
    running: AtomicBool,

    /// Serializes state transitions against the progress tick. The spec's
    /// cooperative single-thread model becomes a lock on a multi-threaded
    /// runtime; callbacks never take it, so no nesting occurs.
    transition: tokio::sync::Mutex<()>,
}

impl LoopCoordinator {
    /// Create a coordinator.
    ///
    /// Fails fast when the params violate the lead >= fade invariant.
    pub fn new(
        pair: Arc<ChannelPair>,
        params: EngineParams,
        state: Arc<SharedState>,
    ) -> Result<Arc<Self>> {
        params.validate()?;
        Ok(Arc::new(Self {
            pair,
            fader: Fader::new(params.fade_tick),
            params,
            state,
            guard: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            current_clip: Mutex::new(None),
            running: AtomicBool::new(false),
            transition: tokio::sync::Mutex::new(()),
        }))
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn channel_pair(&self) -> &ChannelPair {
        &self.pair
    }

    /// Clip currently bound to the session, if any.
    pub fn current_clip(&self) -> Option<Clip> {
        self.current_clip.lock().unwrap().clone()
    }

    /// Start the progress polling loop. Runs until `shutdown`.
    pub fn spawn_progress_loop(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = interval(coordinator.params.progress_tick);
            let mut progress_counter = 0u32;
            loop {
                tick.tick().await;
                if !coordinator.running.load(Ordering::Acquire) {
                    debug!("Progress loop stopping");
                    break;
                }
                coordinator.on_progress_tick(&mut progress_counter).await;
            }
        });
    }

    /// Stop the progress loop (service shutdown).
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Bind a clip and start loop playback from the beginning.
    ///
    /// Any previous clip is stopped and unbound first. A load failure
    /// leaves the session Idle and is surfaced as a PlaybackFailed event;
    /// there is no automatic retry.
    pub async fn start(&self, clip: Clip) -> Result<()> {
        let _transition = self.transition.lock().await;
        self.reset_channels();

        let active = self.pair.active();
        if let Err(e) = active.bind(&clip).await {
            self.state.set_current_clip(None).await;
            self.state.set_engine_state(EngineState::Idle).await;
            self.state.broadcast_event(SegueEvent::PlaybackFailed {
                clip_id: clip.clip_id,
                message: e.to_string(),
                timestamp: chrono::Utc::now(),
            });
            return Err(e);
        }

        // Preload the inactive channel so the crossfade dispatch later is
        // just transport calls. A failure here is retried at trigger time.
        let inactive = self.pair.inactive();
        if let Err(e) = inactive.bind(&clip).await {
            warn!("Inactive channel preload failed: {}", e);
        }

        active.seek(0.0);
        active.set_volume(0.0);
        active.play();
        self.fader.start_fade(
            Arc::clone(&active),
            FadeDirection::In,
            self.params.fade_duration,
            None,
        );

        let duration_ms = active
            .duration()
            .map(|d| (d * 1000.0) as u64)
            .unwrap_or_else(|| (clip.duration_seconds * 1000.0) as u64);

        *self.current_clip.lock().unwrap() = Some(clip.clone());
        self.state
            .set_current_clip(Some(CurrentClip {
                clip_id: clip.clip_id,
                position_ms: 0,
                duration_ms,
            }))
            .await;
        self.state.set_engine_state(EngineState::Playing).await;
        self.state.broadcast_event(SegueEvent::ClipSelected {
            clip_id: clip.clip_id,
            timestamp: chrono::Utc::now(),
        });

        info!(
            "Loop playback started on channel {}: {}",
            self.pair.active_label(),
            clip.source_uri
        );
        Ok(())
    }

    /// Pause both channels, cancel in-flight fades, clear the guard.
    pub async fn pause(&self) {
        let _transition = self.transition.lock().await;
        let state = self.state.engine_state().await;
        if state != EngineState::Playing && state != EngineState::Crossfading {
            return;
        }

        self.fader.cancel_all();
        self.guard.store(false, Ordering::Release);
        for channel in self.pair.both() {
            channel.pause();
        }
        self.state.set_engine_state(EngineState::Paused).await;
        info!("Playback paused");
    }

    /// Resume from pause at the held volumes and positions. No fade is
    /// replayed.
    pub async fn resume(&self) {
        let _transition = self.transition.lock().await;
        if self.state.engine_state().await != EngineState::Paused {
            return;
        }

        let active = self.pair.active();
        active.play();

        // A channel frozen mid-crossfade keeps participating; an idle one
        // stays parked at position 0
        let inactive = self.pair.inactive();
        if inactive.volume() > 0.0 || inactive.position() > 0.0 {
            inactive.play();
        }

        self.state.set_engine_state(EngineState::Playing).await;
        info!("Playback resumed");
    }

    /// Stop playback entirely and return to Idle.
    pub async fn stop(&self) {
        let _transition = self.transition.lock().await;
        self.reset_channels();
        self.state.set_current_clip(None).await;
        self.state.set_engine_state(EngineState::Idle).await;
        info!("Playback stopped");
    }

    /// Seek the active channel.
    ///
    /// The crossfade guard is cleared unconditionally: a backward seek past
    /// the trigger point mid-fade must never leave the guard latched.
    pub async fn seek(&self, seconds: f64) {
        let _transition = self.transition.lock().await;
        self.guard.store(false, Ordering::Release);

        let active = self.pair.active();
        active.seek(seconds.max(0.0));

        if let Some(mut readout) = self.state.current_clip().await {
            readout.position_ms = (active.position() * 1000.0) as u64;
            self.state.set_current_clip(Some(readout)).await;
        }
    }

    /// Cancel everything and park both channels; does not touch the
    /// observable session state.
    fn reset_channels(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.fader.cancel_all();
        self.guard.store(false, Ordering::Release);
        for channel in self.pair.both() {
            channel.reset();
            channel.set_volume(0.0);
            channel.unbind();
        }
        *self.current_clip.lock().unwrap() = None;
    }

    /// One progress tick: refresh the readout and evaluate the crossfade
    /// trigger.
    async fn on_progress_tick(&self, progress_counter: &mut u32) {
        if self.state.engine_state().await != EngineState::Playing {
            return;
        }

        let epoch = self.epoch.load(Ordering::Acquire);
        let clip = match self.current_clip() {
            Some(clip) => clip,
            None => return,
        };

        let active = self.pair.active();
        if !active.is_bound_to(clip.clip_id) {
            // Stale tick racing a clip switch
            return;
        }

        // Until the unit knows its duration the trigger is unreachable
        let duration = match active.duration() {
            Some(duration) => duration,
            None => return,
        };
        let position = active.position();

        self.state
            .set_current_clip(Some(CurrentClip {
                clip_id: clip.clip_id,
                position_ms: (position * 1000.0) as u64,
                duration_ms: (duration * 1000.0) as u64,
            }))
            .await;

        *progress_counter += 1;
        if *progress_counter >= PROGRESS_EVENT_EVERY_TICKS {
            *progress_counter = 0;
            self.state.broadcast_event(SegueEvent::PlaybackProgress {
                clip_id: clip.clip_id,
                position_ms: (position * 1000.0) as u64,
                duration_ms: (duration * 1000.0) as u64,
                timestamp: chrono::Utc::now(),
            });
        }

        let remaining = duration - position;
        if remaining <= self.params.crossfade_lead.as_secs_f64() && active.is_playing() {
            // The guard arms exactly one dispatch per boundary crossing; a
            // tick losing this exchange is a normal polling race, not an
            // error
            if self
                .guard
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let _transition = self.transition.lock().await;
                if self.epoch.load(Ordering::Acquire) != epoch
                    || !active.is_bound_to(clip.clip_id)
                    || self.state.engine_state().await != EngineState::Playing
                {
                    // A transition superseded this trigger while we waited
                    self.guard.store(false, Ordering::Release);
                    return;
                }
                if let Err(e) = self.begin_crossfade(&clip).await {
                    warn!("Crossfade failed: {}", e);
                    self.guard.store(false, Ordering::Release);
                    self.state.set_engine_state(EngineState::Playing).await;
                }
            }
        }
    }

    /// Dispatch the loop crossfade.
    async fn begin_crossfade(&self, clip: &Clip) -> Result<()> {
        let outgoing = self.pair.active();
        let incoming = self.pair.inactive();
        let position_ms = (outgoing.position() * 1000.0) as u64;

        self.state.set_engine_state(EngineState::Crossfading).await;

        if !incoming.is_bound_to(clip.clip_id) {
            incoming.bind(clip).await?;
        }

        incoming.seek(0.0);
        incoming.set_volume(0.0);
        incoming.play();
        self.fader.start_fade(
            Arc::clone(&incoming),
            FadeDirection::In,
            self.params.fade_duration,
            None,
        );

        let clip_id = clip.clip_id;
        let outgoing_cb = Arc::clone(&outgoing);
        self.fader.start_fade(
            Arc::clone(&outgoing),
            FadeDirection::Out,
            self.params.fade_duration,
            Some(Box::new(move || {
                // Park the faded-out channel at the idle-inactive state,
                // unless the clip changed underneath the ramp
                if outgoing_cb.is_bound_to(clip_id) {
                    outgoing_cb.reset();
                }
            })),
        );

        // Swap and release happen at dispatch, not at fade completion:
        // readouts must track the incoming channel immediately, and the
        // next boundary crossing arms as soon as the jobs are in flight
        self.pair.swap();
        self.guard.store(false, Ordering::Release);
        self.state.set_engine_state(EngineState::Playing).await;

        self.state.broadcast_event(SegueEvent::CrossfadeStarted {
            clip_id,
            position_ms,
            timestamp: chrono::Utc::now(),
        });

        info!(
            "Crossfade dispatched at {}ms; channel {} now active",
            position_ms,
            self.pair.active_label()
        );
        Ok(())
    }
}

impl Drop for LoopCoordinator {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

// The coordinator's behavior is exercised end-to-end (scripted playback
// units, paused clock) in tests/loop_engine.rs.
