//! Real-time playback: cpal output stream pulling from the shared engine
//!
//! The audio callback renders through `AudioEngine::process` and exposes
//! the advancing clock two ways, both polling-friendly: an atomic playhead
//! mirror for cheap per-frame reads, and an rtrb event ring carrying
//! periodic position updates plus end-of-timeline stops. Skipped or
//! throttled reads lose nothing; the next read sees the current state.

use crate::bridge::SharedEngine;
use crate::error::OutputError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Events pushed from the audio thread for the UI to drain per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputEvent {
    /// Periodic playback position in seconds (roughly 10x per second)
    Position(f64),
    /// Playback auto-stopped at the end of the timeline
    Stopped,
}

/// Owns the output stream for one engine instance
pub struct AudioOutput {
    _stream: cpal::Stream,
    events: rtrb::Consumer<OutputEvent>,
    playhead: Arc<AtomicU64>,
    sample_rate: u32,
}

impl AudioOutput {
    /// Open the default output device and start rendering the engine.
    /// The stream runs until the returned handle is dropped.
    pub fn start(engine: SharedEngine) -> Result<Self, OutputError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(OutputError::NoDevice)?;

        let default_config = device
            .default_output_config()
            .map_err(|e| OutputError::Config(e.to_string()))?;
        let sample_format = default_config.sample_format();
        if sample_format != cpal::SampleFormat::F32 {
            return Err(OutputError::UnsupportedFormat(sample_format.to_string()));
        }

        let (sample_rate, channels) = engine
            .lock()
            .map(|e| (e.sample_rate(), e.channels()))
            .map_err(|_| OutputError::Config("engine lock poisoned".to_string()))?;

        let config = cpal::StreamConfig {
            channels: channels as u16,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (mut event_tx, event_rx) = rtrb::RingBuffer::<OutputEvent>::new(256);
        let playhead = Arc::new(AtomicU64::new(0));
        let playhead_mirror = Arc::clone(&playhead);

        // Position updates 10x per second
        let event_interval_frames = (sample_rate / 10).max(1) as usize;
        let mut frames_since_event = 0usize;

        let callback_engine = Arc::clone(&engine);
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let Ok(mut eng) = callback_engine.lock() else {
                        data.fill(0.0);
                        return;
                    };
                    let stopped = eng.process(data);
                    let position = eng.transport().transport_time();
                    drop(eng);

                    playhead_mirror
                        .store((position * sample_rate as f64) as u64, Ordering::Relaxed);

                    frames_since_event += data.len() / channels as usize;
                    if frames_since_event >= event_interval_frames {
                        let _ = event_tx.push(OutputEvent::Position(position));
                        frames_since_event = 0;
                    }
                    if stopped {
                        let _ = event_tx.push(OutputEvent::Stopped);
                    }
                },
                |e| log::error!("output stream error: {}", e),
                None,
            )
            .map_err(|e| OutputError::StreamBuild(e.to_string()))?;

        stream
            .play()
            .map_err(|e| OutputError::StreamPlay(e.to_string()))?;

        log::info!(
            "output stream started at {} Hz, {} channels",
            sample_rate,
            channels
        );

        Ok(Self {
            _stream: stream,
            events: event_rx,
            playhead,
            sample_rate,
        })
    }

    /// Latest playhead position in seconds, from the atomic mirror.
    /// Reading the same position twice is fine; this is a poll, not a push.
    pub fn playhead_seconds(&self) -> f64 {
        self.playhead.load(Ordering::Relaxed) as f64 / self.sample_rate as f64
    }

    /// Drain one pending event, if any
    pub fn try_next_event(&mut self) -> Option<OutputEvent> {
        self.events.pop().ok()
    }
}
