//! Microphone capture into an in-memory buffer

use crate::audio::buffer::AudioBuffer;
use crate::error::EngineError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};

/// Records the default input device into memory. The result feeds
/// `AudioEngine::add_track_from_buffer`, so a finished recording becomes a
/// track exactly like an uploaded file.
///
/// Opening fails with `MicrophoneUnavailable` when no input device exists;
/// nothing is created in that case.
pub struct InputRecorder {
    stream: cpal::Stream,
    samples: Arc<Mutex<Vec<f32>>>,
    sample_rate: u32,
    channels: u32,
}

impl InputRecorder {
    /// Open the default input device and build a capture stream
    pub fn open() -> Result<Self, EngineError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(EngineError::MicrophoneUnavailable)?;
        let config = device
            .default_input_config()
            .map_err(|e| EngineError::InputStream(e.to_string()))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as u32;
        let samples = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&samples);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device
                .build_input_stream(
                    &config.into(),
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if let Ok(mut buf) = sink.lock() {
                            buf.extend_from_slice(data);
                        }
                    },
                    |e| log::error!("input stream error: {}", e),
                    None,
                )
                .map_err(|e| EngineError::InputStream(e.to_string()))?,
            other => {
                return Err(EngineError::InputStream(format!(
                    "unsupported input sample format {}",
                    other
                )))
            }
        };

        log::info!(
            "opened input device at {} Hz, {} channels",
            sample_rate,
            channels
        );

        Ok(Self {
            stream,
            samples,
            sample_rate,
            channels,
        })
    }

    /// Start (or resume) capturing
    pub fn start(&self) -> Result<(), EngineError> {
        self.stream
            .play()
            .map_err(|e| EngineError::InputStream(e.to_string()))
    }

    /// Pause capturing without discarding what was recorded
    pub fn pause(&self) -> Result<(), EngineError> {
        self.stream
            .pause()
            .map_err(|e| EngineError::InputStream(e.to_string()))
    }

    /// Seconds captured so far
    pub fn duration_seconds(&self) -> f64 {
        let frames = self
            .samples
            .lock()
            .map(|s| s.len() / self.channels.max(1) as usize)
            .unwrap_or(0);
        frames as f64 / self.sample_rate as f64
    }

    /// Stop capturing and hand back the recorded audio
    pub fn finish(self) -> AudioBuffer {
        drop(self.stream);
        let data = self
            .samples
            .lock()
            .map(|mut s| std::mem::take(&mut *s))
            .unwrap_or_default();
        AudioBuffer::new(data, self.channels, self.sample_rate)
    }
}
