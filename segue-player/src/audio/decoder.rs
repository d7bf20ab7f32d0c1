//! Clip decoding using symphonia
//!
//! Decodes a complete clip (MP3, FLAC, AAC, Vorbis, WAV) to interleaved
//! stereo f32 samples. Clips are short by design, so the whole file is
//! decoded up front rather than streamed; position tracking then reduces
//! to a frame cursor over an immutable buffer.

use crate::error::{Error, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// A fully decoded clip, before resampling.
pub struct DecodedClip {
    /// Interleaved stereo f32 samples [L, R, L, R, ...]
    pub samples: Vec<f32>,
    /// Source sample rate
    pub sample_rate: u32,
}

/// Whole-file audio decoder.
pub struct ClipDecoder;

impl ClipDecoder {
    /// Decode an entire clip file to interleaved stereo f32 samples.
    ///
    /// Mono sources are duplicated to stereo; multi-channel sources keep
    /// their first two channels.
    pub fn decode_file(path: &Path) -> Result<DecodedClip> {
        debug!("Decoding clip: {}", path.display());

        let file = std::fs::File::open(path).map_err(|e| {
            Error::SourceUnavailable(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Hint the probe with the file extension when available
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

        let channels = codec_params
            .channels
            .map(|c| c.count())
            .ok_or_else(|| Error::Decode("Channel count not found".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        // Decode all packets, converting each buffer to interleaved f32
        let mut interleaved: Vec<f32> = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let buf = sample_buf.get_or_insert_with(|| {
                        SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
                    });
                    buf.copy_interleaved_ref(decoded);
                    interleaved.extend_from_slice(buf.samples());
                }
                Err(e) => {
                    warn!("Decode error: {}", e);
                    continue;
                }
            }
        }

        if interleaved.is_empty() {
            return Err(Error::Decode(format!(
                "No decodable audio in {}",
                path.display()
            )));
        }

        let samples = Self::to_stereo(interleaved, channels);

        debug!(
            "Decoded {} stereo frames at {}Hz",
            samples.len() / 2,
            sample_rate
        );

        Ok(DecodedClip {
            samples,
            sample_rate,
        })
    }

    /// Normalize interleaved samples of any channel count to stereo.
    fn to_stereo(samples: Vec<f32>, channels: usize) -> Vec<f32> {
        match channels {
            2 => samples,
            1 => {
                let mut stereo = Vec::with_capacity(samples.len() * 2);
                for s in samples {
                    stereo.push(s);
                    stereo.push(s);
                }
                stereo
            }
            n => {
                // Keep the first two channels of each frame
                let frames = samples.len() / n;
                let mut stereo = Vec::with_capacity(frames * 2);
                for frame in samples.chunks_exact(n) {
                    stereo.push(frame[0]);
                    stereo.push(frame[1]);
                }
                stereo
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_mono_to_stereo() {
        let stereo = ClipDecoder::to_stereo(vec![0.1, 0.2, 0.3], 1);
        assert_eq!(stereo, vec![0.1, 0.1, 0.2, 0.2, 0.3, 0.3]);
    }

    #[test]
    fn test_stereo_passthrough() {
        let input = vec![0.1, -0.1, 0.2, -0.2];
        let stereo = ClipDecoder::to_stereo(input.clone(), 2);
        assert_eq!(stereo, input);
    }

    #[test]
    fn test_surround_downmix_keeps_front_pair() {
        // 2 frames of 4-channel audio
        let input = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let stereo = ClipDecoder::to_stereo(input, 4);
        assert_eq!(stereo, vec![1.0, 2.0, 5.0, 6.0]);
    }

    #[test]
    fn test_decode_wav_fixture() {
        // Generate a 1-second 440Hz sine WAV and decode it back
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..22050 {
            let t = i as f32 / 22050.0;
            let sample = (2.0 * PI * 440.0 * t).sin() * 0.5;
            writer
                .write_sample((sample * i16::MAX as f32) as i16)
                .unwrap();
        }
        writer.finalize().unwrap();

        let decoded = ClipDecoder::decode_file(&path).unwrap();
        assert_eq!(decoded.sample_rate, 22050);
        // Mono duplicated to stereo: one second of frames
        let frames = decoded.samples.len() / 2;
        assert!((frames as i64 - 22050).abs() < 64, "got {} frames", frames);
    }

    #[test]
    fn test_decode_missing_file() {
        let result = ClipDecoder::decode_file(Path::new("/nonexistent/clip.mp3"));
        assert!(matches!(result, Err(Error::SourceUnavailable(_))));
    }
}
