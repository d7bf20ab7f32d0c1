//! Audio output using cpal
//!
//! Opens an output device and pulls stereo f32 frames from a callback.
//! The stream starts immediately and runs for the lifetime of the owning
//! unit; transport state lives in the frame source, not in the stream.

use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use tracing::{debug, error, info, warn};

/// Audio output stream bound to a frame-producing callback.
pub struct AudioOutput {
    sample_rate: u32,
    /// Kept alive for playback, never accessed after creation.
    _stream: Stream,
}

// SAFETY: the cpal Stream is created and started here and never accessed
// again; it is only kept alive so the device keeps pulling frames. All
// other fields are plain data.
unsafe impl Send for AudioOutput {}
unsafe impl Sync for AudioOutput {}

impl AudioOutput {
    /// List available audio output device names.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Open a device and start pulling frames from `callback`.
    ///
    /// `callback` is invoked on the audio thread once per output frame and
    /// must not block. Falls back to the default device when the requested
    /// device is missing.
    pub fn start<F>(device_name: Option<String>, callback: F) -> Result<Self>
    where
        F: FnMut() -> (f32, f32) + Send + 'static,
    {
        let device = Self::open_device(device_name)?;
        let (config, sample_format) = Self::best_config(&device)?;

        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32, F>(&device, &config, callback)?,
            SampleFormat::I16 => Self::build_stream::<i16, F>(&device, &config, callback)?,
            SampleFormat::U16 => Self::build_stream::<u16, F>(&device, &config, callback)?,
            other => {
                return Err(Error::AudioOutput(format!(
                    "Unsupported sample format: {:?}",
                    other
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

        info!("Audio stream started");

        Ok(Self {
            sample_rate: config.sample_rate.0,
            _stream: stream,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Open the requested device, falling back to the default.
    fn open_device(device_name: Option<String>) -> Result<Device> {
        let host = cpal::default_host();

        if let Some(name) = device_name {
            let mut devices = host
                .output_devices()
                .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;

            if let Some(device) = devices.find(|d| d.name().ok().as_deref() == Some(name.as_str()))
            {
                info!("Using requested audio device: {}", name);
                return Ok(device);
            }
            warn!("Device '{}' not found, falling back to default", name);
        }

        host.default_output_device()
            .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))
    }

    /// Prefer 44.1kHz stereo f32 (our internal format); otherwise the
    /// device default.
    fn best_config(device: &Device) -> Result<(StreamConfig, SampleFormat)> {
        let mut supported = device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?;

        let preferred = supported.find(|config| {
            config.channels() == 2
                && config.min_sample_rate().0 <= 44100
                && config.max_sample_rate().0 >= 44100
                && config.sample_format() == SampleFormat::F32
        });

        if let Some(config) = preferred {
            let sample_format = config.sample_format();
            let config = config.with_sample_rate(cpal::SampleRate(44100)).config();
            return Ok((config, sample_format));
        }

        let config = device
            .default_output_config()
            .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;

        let sample_format = config.sample_format();
        Ok((config.config(), sample_format))
    }

    fn build_stream<T, F>(device: &Device, config: &StreamConfig, mut callback: F) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32>,
        F: FnMut() -> (f32, f32) + Send + 'static,
    {
        let channels = config.channels as usize;

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let (left, right) = callback();
                        frame[0] = T::from_sample(left.clamp(-1.0, 1.0));
                        if channels > 1 {
                            frame[1] = T::from_sample(right.clamp(-1.0, 1.0));
                        }
                        for extra in frame.iter_mut().skip(2) {
                            *extra = T::from_sample(0.0f32);
                        }
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
    }
}
