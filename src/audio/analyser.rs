//! Offline frequency analysis for spectrogram rendering
//!
//! Renders a decoded buffer through an FFT at a fixed time resolution,
//! independent of playback, emitting `(timestamp, magnitude bins)`
//! snapshots via callback. Deterministic for a given buffer; the analyser
//! keeps no mutable state across calls beyond the precomputed FFT plan,
//! window, and bin mapping.

use crate::audio::buffer::AudioBuffer;
use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Default analysis window length in frames
pub const DEFAULT_FFT_SIZE: usize = 2048;

/// Snapshot spacing when sampling on a time grid
pub const FRAME_INTERVAL_SECONDS: f64 = 0.025;

/// Snapshot spacing for the block-based fallback (frames per hop)
pub const FALLBACK_BLOCK_FRAMES: usize = 1024;

enum HopSpec {
    /// Hop derived from a wall-clock interval at the buffer's sample rate
    Interval(f64),
    /// Fixed number of frames per hop
    Block(usize),
}

/// Precomputed mapping from linear FFT bins to fewer log-spaced bins.
///
/// Output bin `i` pools every linear bin whose log-mapped index equals `i`;
/// pooled values are summed, not averaged. Low output bins pool few linear
/// bins and high output bins pool many (inverse-log compression).
pub struct LogBinMapper {
    map: Vec<usize>,
    out_bins: usize,
}

impl LogBinMapper {
    /// Build the index map from `in_bins` linear bins to `out_bins`
    /// log-spaced bins
    pub fn new(in_bins: usize, out_bins: usize) -> Self {
        let denom = ((in_bins + 1) as f32).ln();
        let map = (0..in_bins)
            .map(|j| {
                let idx = (out_bins as f32 * ((j + 1) as f32).ln() / denom) as usize;
                idx.min(out_bins.saturating_sub(1))
            })
            .collect();
        Self { map, out_bins }
    }

    /// Number of log-spaced output bins
    pub fn out_bins(&self) -> usize {
        self.out_bins
    }

    /// Pool linear magnitudes into `out` by summed contribution.
    /// `out.len()` must be `out_bins`.
    pub fn pool(&self, linear: &[f32], out: &mut [f32]) {
        out.fill(0.0);
        for (j, &value) in linear.iter().enumerate() {
            if let Some(&i) = self.map.get(j) {
                out[i] += value;
            }
        }
    }
}

/// Offline analyser: steps an FFT window over a buffer and reports
/// magnitude snapshots
pub struct OfflineAnalyser {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: Vec<f32>,
    hop: HopSpec,
}

impl OfflineAnalyser {
    /// Analyser sampling on the default ~25ms time grid
    pub fn new(fft_size: usize) -> Self {
        Self::with_hop(fft_size, HopSpec::Interval(FRAME_INTERVAL_SECONDS))
    }

    /// Fallback analyser hopping a fixed 1024-frame block, for when grid
    /// sampling resolution is not wanted
    pub fn with_block_hop(fft_size: usize) -> Self {
        Self::with_hop(fft_size, HopSpec::Block(FALLBACK_BLOCK_FRAMES))
    }

    fn with_hop(fft_size: usize, hop: HopSpec) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        // Blackman window, matching the shape analyser nodes apply before
        // reporting frequency data
        let window = (0..fft_size)
            .map(|i| {
                let x = i as f32 / (fft_size - 1) as f32;
                0.42 - 0.5 * (2.0 * std::f32::consts::PI * x).cos()
                    + 0.08 * (4.0 * std::f32::consts::PI * x).cos()
            })
            .collect();
        Self {
            fft,
            fft_size,
            window,
            hop,
        }
    }

    /// Number of magnitude bins per snapshot
    pub fn bins(&self) -> usize {
        self.fft_size / 2
    }

    /// Build a log-bin mapper sized for this analyser's output
    pub fn log_mapper(&self, out_bins: usize) -> LogBinMapper {
        LogBinMapper::new(self.bins(), out_bins)
    }

    fn hop_frames(&self, sample_rate: u32) -> usize {
        match self.hop {
            HopSpec::Interval(seconds) => ((seconds * sample_rate as f64) as usize).max(1),
            HopSpec::Block(frames) => frames.max(1),
        }
    }

    /// Step over the buffer, calling `on_frame(timestamp_seconds, bins)`
    /// for each snapshot. Returns once the whole buffer has been rendered.
    pub fn analyse(&self, buffer: &AudioBuffer, mut on_frame: impl FnMut(f64, &[f32])) {
        let hop = self.hop_frames(buffer.sample_rate);
        let mut scratch = vec![Complex32::new(0.0, 0.0); self.fft_size];
        let mut magnitudes = vec![0.0f32; self.bins()];

        let mut start = 0usize;
        while start < buffer.frames as usize {
            for (i, slot) in scratch.iter_mut().enumerate() {
                // Mono mixdown, zero-padded past the end of the buffer
                let sample = buffer.mono_sample(start + i);
                *slot = Complex32::new(sample * self.window[i], 0.0);
            }
            self.fft.process(&mut scratch);

            let norm = 1.0 / self.fft_size as f32;
            for (bin, value) in magnitudes.iter_mut().enumerate() {
                *value = scratch[bin].norm() * norm;
            }

            let timestamp = start as f64 / buffer.sample_rate as f64;
            on_frame(timestamp, &magnitudes);
            start += hop;
        }
    }

    /// Like `analyse`, but snapshots are pooled into the mapper's
    /// log-spaced bins
    pub fn analyse_log(
        &self,
        buffer: &AudioBuffer,
        mapper: &LogBinMapper,
        mut on_frame: impl FnMut(f64, &[f32]),
    ) {
        let mut pooled = vec![0.0f32; mapper.out_bins()];
        self.analyse(buffer, |timestamp, linear| {
            mapper.pool(linear, &mut pooled);
            on_frame(timestamp, &pooled);
        });
    }
}
