//! Test helpers for segue-player integration tests
//!
//! Provides a scripted playback unit whose position advances with the
//! tokio test clock, plus a harness that wires up a complete engine the
//! way main.rs does.

use async_trait::async_trait;
use segue_common::events::SegueEvent;
use segue_common::{Clip, EngineParams};
use segue_player::audio::PlaybackUnit;
use segue_player::engine::{ChannelPair, LoopCoordinator, PlaybackSession};
use segue_player::{Result, SharedState};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Playback unit driven by the (pausable) tokio clock.
///
/// While playing, position advances in lockstep with `tokio::time`, so
/// tests steer playback by sleeping on a paused clock. Mirrors the
/// production unit's transport contract: load parks the clip paused at
/// zero, and reaching the end stops advancement.
pub struct ClockUnit {
    clip_seconds: f64,
    transport: Mutex<Transport>,
    volume: AtomicU32,
    loaded: AtomicBool,
    fail_load: AtomicBool,
    duration_known: AtomicBool,
    loads: AtomicUsize,
    loaded_uri: Mutex<Option<String>>,
}

struct Transport {
    base: f64,
    playing_since: Option<Instant>,
}

impl ClockUnit {
    pub fn new(clip_seconds: f64) -> Arc<Self> {
        Arc::new(Self {
            clip_seconds,
            transport: Mutex::new(Transport {
                base: 0.0,
                playing_since: None,
            }),
            volume: AtomicU32::new(1.0f32.to_bits()),
            loaded: AtomicBool::new(false),
            fail_load: AtomicBool::new(false),
            duration_known: AtomicBool::new(true),
            loads: AtomicUsize::new(0),
            loaded_uri: Mutex::new(None),
        })
    }

    /// Make the next load fail (source unavailable).
    pub fn fail_next_load(&self) {
        self.fail_load.store(true, Ordering::SeqCst);
    }

    /// Report duration as unknown even after loading.
    pub fn hide_duration(&self) {
        self.duration_known.store(false, Ordering::SeqCst);
    }

    /// How many times a source was actually (re)loaded.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Current position, settling the transport at the clip end.
    fn settled_position(&self) -> f64 {
        let mut transport = self.transport.lock().unwrap();
        if let Some(since) = transport.playing_since {
            let position = transport.base + since.elapsed().as_secs_f64();
            if position >= self.clip_seconds {
                transport.base = self.clip_seconds;
                transport.playing_since = None;
                return self.clip_seconds;
            }
            position
        } else {
            transport.base
        }
    }
}

#[async_trait]
impl PlaybackUnit for ClockUnit {
    async fn load(&self, source_uri: &str) -> Result<()> {
        if self.fail_load.swap(false, Ordering::SeqCst) {
            return Err(segue_player::Error::SourceUnavailable(format!(
                "cannot load {}",
                source_uri
            )));
        }

        if self.loaded_uri.lock().unwrap().as_deref() == Some(source_uri) {
            return Ok(());
        }

        let mut transport = self.transport.lock().unwrap();
        transport.base = 0.0;
        transport.playing_since = None;
        drop(transport);

        self.loaded.store(true, Ordering::SeqCst);
        self.loads.fetch_add(1, Ordering::SeqCst);
        *self.loaded_uri.lock().unwrap() = Some(source_uri.to_string());
        Ok(())
    }

    fn set_volume(&self, volume: f32) {
        self.volume
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::SeqCst);
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::SeqCst))
    }

    fn position(&self) -> f64 {
        self.settled_position()
    }

    fn seek(&self, seconds: f64) {
        let mut transport = self.transport.lock().unwrap();
        transport.base = seconds.clamp(0.0, self.clip_seconds);
        if transport.playing_since.is_some() {
            transport.playing_since = Some(Instant::now());
        }
    }

    fn play(&self) {
        if !self.loaded.load(Ordering::SeqCst) {
            return;
        }
        let mut transport = self.transport.lock().unwrap();
        if transport.playing_since.is_none() && transport.base < self.clip_seconds {
            transport.playing_since = Some(Instant::now());
        }
    }

    fn pause(&self) {
        let mut transport = self.transport.lock().unwrap();
        if let Some(since) = transport.playing_since.take() {
            transport.base =
                (transport.base + since.elapsed().as_secs_f64()).min(self.clip_seconds);
        }
    }

    fn is_playing(&self) -> bool {
        self.settled_position();
        self.transport.lock().unwrap().playing_since.is_some()
    }

    fn duration(&self) -> Option<f64> {
        if self.loaded.load(Ordering::SeqCst) && self.duration_known.load(Ordering::SeqCst) {
            Some(self.clip_seconds)
        } else {
            None
        }
    }
}

/// A complete engine wired the way main.rs does it, over scripted units.
pub struct TestEngine {
    pub units: [Arc<ClockUnit>; 2],
    pub pair: Arc<ChannelPair>,
    pub state: Arc<SharedState>,
    pub coordinator: Arc<LoopCoordinator>,
    pub session: Arc<PlaybackSession>,
}

/// Spec-default timing: 2.5s lead, 1.5s fade.
pub fn test_params() -> EngineParams {
    EngineParams {
        crossfade_lead: Duration::from_secs_f64(2.5),
        fade_duration: Duration::from_secs_f64(1.5),
        fade_tick: Duration::from_millis(50),
        progress_tick: Duration::from_millis(250),
        visibility_threshold: 0.5,
    }
}

pub fn build_engine(clip_seconds: f64, params: EngineParams) -> TestEngine {
    let units = [ClockUnit::new(clip_seconds), ClockUnit::new(clip_seconds)];
    let pair = Arc::new(ChannelPair::new(
        units[0].clone() as Arc<dyn PlaybackUnit>,
        units[1].clone() as Arc<dyn PlaybackUnit>,
    ));
    let state = Arc::new(SharedState::new());
    let coordinator = LoopCoordinator::new(Arc::clone(&pair), params, Arc::clone(&state))
        .expect("valid test params");
    coordinator.spawn_progress_loop();
    let session = PlaybackSession::new(Arc::clone(&coordinator), Arc::clone(&state));

    TestEngine {
        units,
        pair,
        state,
        coordinator,
        session,
    }
}

/// A clip with a unique identity and source.
pub fn make_clip(name: &str, duration_seconds: f64) -> Clip {
    let mut clip = Clip::new(format!("file:///clips/{}.mp3", name), duration_seconds);
    clip.title = name.to_string();
    clip
}

/// Drain all currently queued events of a given type.
pub fn drain_events<F>(rx: &mut broadcast::Receiver<SegueEvent>, mut select: F) -> usize
where
    F: FnMut(&SegueEvent) -> bool,
{
    let mut count = 0;
    while let Ok(event) = rx.try_recv() {
        if select(&event) {
            count += 1;
        }
    }
    count
}
