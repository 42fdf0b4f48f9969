//! The audio engine: registry + mixer + transport behind one render loop

use crate::audio::decode::decode_bytes;
use crate::audio::buffer::AudioBuffer;
use crate::audio::mixer::ChannelMixer;
use crate::audio::registry::{TrackId, TrackRegistry};
use crate::audio::transport::TransportController;
use crate::error::EngineError;
use std::sync::Arc;

/// Explicitly constructed engine instance. The application root owns it and
/// passes it to the bridge and the output stream; there is no ambient
/// global audio state anywhere in the crate.
///
/// The registry holds canonical track data, the mixer holds the parallel
/// channel map, and the transport holds the shared clock. `add_track` /
/// `remove_track` keep the three consistent.
pub struct AudioEngine {
    registry: TrackRegistry,
    mixer: ChannelMixer,
    transport: TransportController,
    sample_rate: u32,
    channels: u32,
}

impl AudioEngine {
    /// Create an engine rendering at the given output format
    pub fn new(sample_rate: u32, channels: u32) -> Self {
        Self {
            registry: TrackRegistry::new(),
            mixer: ChannelMixer::new(),
            transport: TransportController::new(),
            sample_rate,
            channels,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TrackRegistry {
        &mut self.registry
    }

    pub fn mixer(&self) -> &ChannelMixer {
        &self.mixer
    }

    pub fn mixer_mut(&mut self) -> &mut ChannelMixer {
        &mut self.mixer
    }

    pub fn transport(&self) -> &TransportController {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut TransportController {
        &mut self.transport
    }

    /// Decode uploaded bytes and register the result as a new track with
    /// its playback channel.
    ///
    /// Decoding happens before any state is touched, so a malformed upload
    /// leaves every existing track and channel exactly as it was.
    pub fn add_track(
        &mut self,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<TrackId, EngineError> {
        let buffer = decode_bytes(bytes)?;
        self.add_track_from_buffer(name, buffer)
    }

    /// Register an already-decoded buffer (recording path) as a new track
    pub fn add_track_from_buffer(
        &mut self,
        name: impl Into<String>,
        buffer: AudioBuffer,
    ) -> Result<TrackId, EngineError> {
        let buffer = Arc::new(buffer);
        let id = self.registry.add_track(name, Arc::clone(&buffer));
        // Ids are never reused, so this cannot collide; propagate anyway
        // rather than assert
        self.mixer.create_channel(id, buffer)?;
        self.transport
            .set_total_duration(self.registry.total_duration());
        log::info!(
            "added track {} ({:.2}s, {} total)",
            id,
            self.registry
                .track(id)
                .map(|t| t.buffer.duration_seconds())
                .unwrap_or(0.0),
            self.registry.len()
        );
        Ok(id)
    }

    /// Remove a track and dispose its channel. No-op for unknown ids.
    pub fn remove_track(&mut self, id: TrackId) {
        if self.registry.remove_track(id).is_some() {
            self.mixer.remove_channel(id);
            self.transport
                .set_total_duration(self.registry.total_duration());
            log::info!("removed track {} ({} left)", id, self.registry.len());
        }
    }

    /// Start playback, applying an optional one-shot seek first
    pub fn start_playback(&mut self, seek: Option<f64>) {
        self.transport.start(seek);
    }

    /// Pause playback, applying an optional one-shot seek first
    pub fn pause_playback(&mut self, seek: Option<f64>) {
        self.transport.pause(seek);
    }

    /// Render one output buffer. Called from the audio callback.
    ///
    /// While playing, mixes all audible channels at the current transport
    /// position and advances the clock by the buffer duration, running the
    /// end-of-timeline auto-stop. While paused, outputs silence. Returns
    /// true when this call auto-stopped at the end of the timeline.
    pub fn process(&mut self, output: &mut [f32]) -> bool {
        if !self.transport.is_playing() {
            output.fill(0.0);
            return false;
        }

        let playhead = self.transport.transport_time();
        self.mixer
            .mix(output, playhead, self.sample_rate, self.channels);

        let dt = output.len() as f64 / (self.sample_rate as f64 * self.channels as f64);
        let stopped = self.transport.advance(dt);
        if stopped {
            // The seek queued by the auto-rewind is for the UI transition;
            // the clock itself is already back at zero
            log::debug!("playback auto-stopped at end of timeline");
        }
        stopped
    }
}
