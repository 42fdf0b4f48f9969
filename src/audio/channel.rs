//! Per-track playback channel: gain staging and buffer rendering

use crate::audio::buffer::AudioBuffer;
use std::sync::Arc;

/// Time for a gain change to settle, regardless of its size, so volume
/// moves ramp instead of stepping (audible clicks otherwise)
pub const GAIN_RAMP_SECONDS: f32 = 0.1;

/// Cubic Hermite interpolation between p1 and p2, x in 0.0..1.0
#[inline]
fn hermite_interpolate(p0: f32, p1: f32, p2: f32, p3: f32, x: f32) -> f32 {
    let c0 = p1;
    let c1 = 0.5 * (p2 - p0);
    let c2 = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
    let c3 = 0.5 * (p3 - p0) + 1.5 * (p1 - p2);

    ((c3 * x + c2) * x + c1) * x + c0
}

/// Convert a 0-100 volume step to decibels.
///
/// `db = 20 * ln((volume + 1) / 101)`: volume 100 is unity (0 dB), volume 0
/// is a large negative value rather than -inf, so a silent fader never hits
/// a log-of-zero.
pub fn volume_to_db(volume: u8) -> f32 {
    20.0 * ((volume.min(100) as f32 + 1.0) / 101.0).ln()
}

/// Linear gain for a 0-100 volume step
pub fn volume_to_gain(volume: u8) -> f32 {
    (volume_to_db(volume) / 20.0).exp()
}

/// Playback channel for one track: the decoded buffer routed through a
/// ramped gain stage with mute/solo flags. Exactly one exists per live
/// track id; the mixer owns the map.
pub struct Channel {
    buffer: Arc<AudioBuffer>,
    volume: u8,
    muted: bool,
    solo: bool,
    /// Smoothed gain, slewing toward `target_gain`
    gain: f32,
    target_gain: f32,
    /// Per-frame slew step for the current ramp. `None` after a target
    /// change, sized on the next render once the output rate is known.
    ramp_step: Option<f32>,
}

impl Channel {
    /// Create a channel over a decoded buffer with default settings
    /// (volume 100, unmuted, not soloed)
    pub fn new(buffer: Arc<AudioBuffer>) -> Self {
        let gain = volume_to_gain(100);
        Self {
            buffer,
            volume: 100,
            muted: false,
            solo: false,
            gain,
            target_gain: gain,
            ramp_step: Some(0.0),
        }
    }

    /// The decoded audio behind this channel
    pub fn buffer(&self) -> &Arc<AudioBuffer> {
        &self.buffer
    }

    /// Current volume step (0-100)
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Set the volume step; the rendered gain ramps toward the new value
    /// over `GAIN_RAMP_SECONDS`
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(100);
        self.target_gain = volume_to_gain(self.volume);
        self.ramp_step = None;
    }

    /// Current gain in decibels
    pub fn volume_db(&self) -> f32 {
        volume_to_db(self.volume)
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_solo(&self) -> bool {
        self.solo
    }

    pub fn set_solo(&mut self, solo: bool) {
        self.solo = solo;
    }

    /// Whether this channel is audible given the mixer-wide solo state.
    /// Explicit mute always wins, even for a soloed channel.
    pub fn is_active(&self, any_solo: bool) -> bool {
        !self.muted && (!any_solo || self.solo)
    }

    /// Duration of the underlying buffer in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.buffer.duration_seconds()
    }

    /// Read one output sample at a fractional source frame position,
    /// converting channel layout between source and destination.
    fn read_sample(&self, src_frame_pos: f64, dst_ch: u32, dst_channels: u32) -> f32 {
        let buf = &self.buffer;
        let src_channels = buf.channels;
        let p1 = src_frame_pos as usize;
        let frac = (src_frame_pos - p1 as f64) as f32;
        let p0 = p1.saturating_sub(1);

        let read_ch = |ch: usize| -> f32 {
            if frac > 0.0 {
                hermite_interpolate(
                    buf.sample(p0, ch),
                    buf.sample(p1, ch),
                    buf.sample(p1 + 1, ch),
                    buf.sample(p1 + 2, ch),
                    frac,
                )
            } else {
                buf.sample(p1, ch)
            }
        };

        if src_channels == dst_channels {
            read_ch(dst_ch as usize)
        } else if src_channels == 1 {
            // Mono source duplicated to every output channel
            read_ch(0)
        } else if dst_channels == 1 {
            // Downmix by averaging all source channels
            let sum: f32 = (0..src_channels as usize).map(read_ch).sum();
            sum / src_channels as f32
        } else {
            read_ch((dst_ch % src_channels) as usize)
        }
    }

    /// Accumulate this channel into `output` starting at a timeline
    /// position, with sample-rate conversion and gain ramping. Returns the
    /// number of frames rendered (short when the buffer runs out).
    pub fn render(
        &mut self,
        output: &mut [f32],
        playhead_seconds: f64,
        engine_sample_rate: u32,
        engine_channels: u32,
    ) -> usize {
        let src_start_frame = playhead_seconds * self.buffer.sample_rate as f64;
        let rate_ratio = self.buffer.sample_rate as f64 / engine_sample_rate as f64;

        // Size the ramp on the first render after a volume change: the step
        // covers the whole move in GAIN_RAMP_SECONDS, so small moves ramp
        // just as long as full-scale ones
        let gain_step = match self.ramp_step {
            Some(step) => step,
            None => {
                let step = (self.target_gain - self.gain).abs()
                    / (GAIN_RAMP_SECONDS * engine_sample_rate as f32);
                self.ramp_step = Some(step);
                step
            }
        };

        let output_frames = output.len() / engine_channels as usize;
        let mut rendered_frames = 0;

        for frame_idx in 0..output_frames {
            // Slew toward the target before each frame so a volume change
            // spreads across the ramp window
            if self.gain < self.target_gain {
                self.gain = (self.gain + gain_step).min(self.target_gain);
            } else if self.gain > self.target_gain {
                self.gain = (self.gain - gain_step).max(self.target_gain);
            }

            let src_frame_pos = src_start_frame + frame_idx as f64 * rate_ratio;
            if src_frame_pos < 0.0 || src_frame_pos >= self.buffer.frames as f64 {
                break;
            }

            for dst_ch in 0..engine_channels {
                let sample = self.read_sample(src_frame_pos, dst_ch, engine_channels);
                let output_idx = frame_idx * engine_channels as usize + dst_ch as usize;
                output[output_idx] += sample * self.gain;
            }

            rendered_frames += 1;
        }

        rendered_frames
    }
}
