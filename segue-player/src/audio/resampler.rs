//! Audio resampling using rubato
//!
//! Converts decoded clips to the standard 44.1kHz working rate so that
//! position arithmetic and the output stream share one clock.

use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Working sample rate for all playback.
pub const TARGET_SAMPLE_RATE: u32 = 44100;

/// Whole-clip resampler.
pub struct Resampler;

impl Resampler {
    /// Resample interleaved stereo audio to the working rate.
    ///
    /// Returns the input unchanged when it is already at 44.1kHz.
    pub fn resample(input: &[f32], input_rate: u32) -> Result<Vec<f32>> {
        if input_rate == TARGET_SAMPLE_RATE {
            debug!("Sample rate already {}Hz, skipping resample", input_rate);
            return Ok(input.to_vec());
        }

        debug!("Resampling {}Hz -> {}Hz", input_rate, TARGET_SAMPLE_RATE);

        let planar_input = Self::deinterleave(input);
        let input_frames = planar_input[0].len();
        if input_frames == 0 {
            return Ok(Vec::new());
        }

        // FastFixedIn: good quality/performance tradeoff for short clips
        let mut resampler = FastFixedIn::<f32>::new(
            TARGET_SAMPLE_RATE as f64 / input_rate as f64,
            1.0,
            PolynomialDegree::Septic,
            input_frames,
            2,
        )
        .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))?;

        let planar_output = resampler
            .process(&planar_input, None)
            .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;

        Ok(Self::interleave(planar_output))
    }

    /// [L, R, L, R, ...] -> [[L, L, ...], [R, R, ...]]
    fn deinterleave(samples: &[f32]) -> Vec<Vec<f32>> {
        let frames = samples.len() / 2;
        let mut planar = vec![Vec::with_capacity(frames); 2];
        for frame in samples.chunks_exact(2) {
            planar[0].push(frame[0]);
            planar[1].push(frame[1]);
        }
        planar
    }

    /// [[L, L, ...], [R, R, ...]] -> [L, R, L, R, ...]
    fn interleave(planar: Vec<Vec<f32>>) -> Vec<f32> {
        let frames = planar[0].len();
        let mut interleaved = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            interleaved.push(planar[0][i]);
            interleaved.push(planar[1][i]);
        }
        interleaved
    }
}
