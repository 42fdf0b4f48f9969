//! Decoded audio data shared between registry, channels, and analyser

/// Decoded audio buffer: interleaved f32 samples plus stream metadata.
///
/// Immutable once created. Shared by `Arc` so the mixer channel and any
/// rendering consumer (waveform, spectrogram) read the same data without
/// re-decoding.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Interleaved samples
    pub data: Vec<f32>,
    /// Channel count of the decoded stream
    pub channels: u32,
    /// Native sample rate of the decoded stream
    pub sample_rate: u32,
    /// Frame count (one sample per channel)
    pub frames: u64,
}

impl AudioBuffer {
    /// Create a buffer from interleaved samples
    pub fn new(data: Vec<f32>, channels: u32, sample_rate: u32) -> Self {
        let frames = (data.len() / channels.max(1) as usize) as u64;
        Self {
            data,
            channels,
            sample_rate,
            frames,
        }
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.sample_rate as f64
    }

    /// Sample for one channel of one frame, 0.0 when out of range
    pub fn sample(&self, frame: usize, channel: usize) -> f32 {
        let idx = frame * self.channels as usize + channel;
        self.data.get(idx).copied().unwrap_or(0.0)
    }

    /// Average of all channels at one frame, 0.0 past the end
    pub fn mono_sample(&self, frame: usize) -> f32 {
        if frame >= self.frames as usize || self.channels == 0 {
            return 0.0;
        }
        let start = frame * self.channels as usize;
        let end = start + self.channels as usize;
        let sum: f32 = self.data[start..end].iter().sum();
        sum / self.channels as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_and_frames() {
        // 1 second of stereo at 8 Hz
        let buf = AudioBuffer::new(vec![0.0; 16], 2, 8);
        assert_eq!(buf.frames, 8);
        assert!((buf.duration_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn mono_sample_averages_channels() {
        let buf = AudioBuffer::new(vec![1.0, 0.0, 0.5, 0.5], 2, 4);
        assert!((buf.mono_sample(0) - 0.5).abs() < 1e-6);
        assert!((buf.mono_sample(1) - 0.5).abs() < 1e-6);
        assert_eq!(buf.mono_sample(99), 0.0);
    }
}
