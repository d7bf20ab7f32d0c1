//! Production playback unit
//!
//! One [`DeviceUnit`] per channel. A clip is decoded and resampled in full
//! on `load`; the cpal callback then walks an immutable PCM buffer through
//! an atomic frame cursor, so transport and volume changes from timer
//! ticks never contend with the audio thread.

use crate::audio::output::AudioOutput;
use crate::audio::resampler::{Resampler, TARGET_SAMPLE_RATE};
use crate::audio::{ClipDecoder, PlaybackUnit};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

/// Master volume shared by both channels and the volume API.
///
/// Stored as f32 bits in an atomic so the audio callback reads it without
/// locking.
pub struct MasterVolume(AtomicU32);

impl MasterVolume {
    pub fn new(volume: f32) -> Self {
        Self(AtomicU32::new(volume.clamp(0.0, 1.0).to_bits()))
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, volume: f32) {
        self.0
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }
}

/// State shared between the unit API and the audio callback.
struct Playhead {
    /// Interleaved stereo PCM at the working rate; empty when unloaded
    pcm: RwLock<Arc<Vec<f32>>>,
    /// Frame count of the current PCM (0 when unloaded)
    frames: AtomicUsize,
    /// Current frame cursor
    cursor: AtomicUsize,
    playing: AtomicBool,
    loaded: AtomicBool,
    /// Channel fade volume as f32 bits
    gain: AtomicU32,
    master: Arc<MasterVolume>,
}

impl Playhead {
    fn new(master: Arc<MasterVolume>) -> Self {
        Self {
            pcm: RwLock::new(Arc::new(Vec::new())),
            frames: AtomicUsize::new(0),
            cursor: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            loaded: AtomicBool::new(false),
            gain: AtomicU32::new(1.0f32.to_bits()),
            master,
        }
    }

    /// Produce the next output frame. Runs on the audio thread.
    fn next_frame(&self) -> (f32, f32) {
        if !self.playing.load(Ordering::Relaxed) {
            return (0.0, 0.0);
        }

        let cursor = self.cursor.load(Ordering::Relaxed);
        if cursor >= self.frames.load(Ordering::Relaxed) {
            // Reached clip end: stop advancing, hold position
            self.playing.store(false, Ordering::Relaxed);
            return (0.0, 0.0);
        }

        let pcm = self.pcm.read().unwrap();
        let gain = f32::from_bits(self.gain.load(Ordering::Relaxed)) * self.master.get();
        let left = pcm[cursor * 2] * gain;
        let right = pcm[cursor * 2 + 1] * gain;
        self.cursor.store(cursor + 1, Ordering::Relaxed);
        (left, right)
    }
}

/// [`PlaybackUnit`] backed by symphonia + rubato + cpal.
pub struct DeviceUnit {
    playhead: Arc<Playhead>,
    /// Output stream, opened on first load
    output: Mutex<Option<AudioOutput>>,
    /// Source currently decoded into the playhead
    loaded_uri: Mutex<Option<String>>,
    device_name: Option<String>,
}

impl DeviceUnit {
    pub fn new(device_name: Option<String>, master: Arc<MasterVolume>) -> Self {
        Self {
            playhead: Arc::new(Playhead::new(master)),
            output: Mutex::new(None),
            loaded_uri: Mutex::new(None),
            device_name,
        }
    }

    /// Open the output stream if it is not running yet.
    fn ensure_output(&self) -> Result<()> {
        let mut output = self.output.lock().unwrap();
        if output.is_none() {
            let playhead = Arc::clone(&self.playhead);
            let stream = AudioOutput::start(self.device_name.clone(), move || {
                playhead.next_frame()
            })?;
            info!("Channel output opened at {}Hz", stream.sample_rate());
            *output = Some(stream);
        }
        Ok(())
    }

    /// Resolve a source URI to a local path.
    fn local_path(source_uri: &str) -> Result<PathBuf> {
        if let Some(path) = source_uri.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if source_uri.contains("://") {
            return Err(Error::SourceUnavailable(format!(
                "Unsupported source scheme: {}",
                source_uri
            )));
        }
        Ok(PathBuf::from(source_uri))
    }
}

#[async_trait]
impl PlaybackUnit for DeviceUnit {
    async fn load(&self, source_uri: &str) -> Result<()> {
        if self.loaded_uri.lock().unwrap().as_deref() == Some(source_uri) {
            debug!("Source already loaded, keeping decoded PCM");
            return Ok(());
        }

        let path = Self::local_path(source_uri)?;

        // Decode + resample off the async runtime
        let pcm = tokio::task::spawn_blocking(move || -> Result<Vec<f32>> {
            let decoded = ClipDecoder::decode_file(&path)?;
            Resampler::resample(&decoded.samples, decoded.sample_rate)
        })
        .await
        .map_err(|e| Error::Playback(format!("Decode task failed: {}", e)))??;

        let frames = pcm.len() / 2;

        // Install the new clip paused at position 0
        self.playhead.playing.store(false, Ordering::Relaxed);
        *self.playhead.pcm.write().unwrap() = Arc::new(pcm);
        self.playhead.frames.store(frames, Ordering::Relaxed);
        self.playhead.cursor.store(0, Ordering::Relaxed);
        self.playhead.loaded.store(true, Ordering::Relaxed);
        *self.loaded_uri.lock().unwrap() = Some(source_uri.to_string());

        self.ensure_output()?;

        info!(
            "Loaded clip: {} ({:.1}s)",
            source_uri,
            frames as f64 / TARGET_SAMPLE_RATE as f64
        );
        Ok(())
    }

    fn set_volume(&self, volume: f32) {
        self.playhead
            .gain
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.playhead.gain.load(Ordering::Relaxed))
    }

    fn position(&self) -> f64 {
        self.playhead.cursor.load(Ordering::Relaxed) as f64 / TARGET_SAMPLE_RATE as f64
    }

    fn seek(&self, seconds: f64) {
        let frames = self.playhead.frames.load(Ordering::Relaxed);
        let target = ((seconds.max(0.0) * TARGET_SAMPLE_RATE as f64) as usize).min(frames);
        self.playhead.cursor.store(target, Ordering::Relaxed);
    }

    fn play(&self) {
        if self.playhead.loaded.load(Ordering::Relaxed) {
            self.playhead.playing.store(true, Ordering::Relaxed);
        }
    }

    fn pause(&self) {
        self.playhead.playing.store(false, Ordering::Relaxed);
    }

    fn is_playing(&self) -> bool {
        self.playhead.playing.load(Ordering::Relaxed)
    }

    fn duration(&self) -> Option<f64> {
        if self.playhead.loaded.load(Ordering::Relaxed) {
            Some(self.playhead.frames.load(Ordering::Relaxed) as f64 / TARGET_SAMPLE_RATE as f64)
        } else {
            None
        }
    }
}
