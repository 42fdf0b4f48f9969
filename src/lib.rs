// mixdesk - multi-track audio workstation engine
//
// Users upload audio, see tracks on a shared timeline, and control
// playback, per-track volume/mute/solo, and mix ordering. This crate is
// the transport and mixing core plus the reactive state layer that keeps
// declarative UI signals consistent with the imperative audio backend.
// Uses symphonia for decoding, cpal for audio I/O, rustfft for offline
// spectrogram analysis, and lock-free queues for clock readback.

pub mod audio;
pub mod bridge;
pub mod error;
pub mod output;
pub mod signal;

// Re-export commonly used types
pub use audio::{
    decode_bytes, AudioBuffer, AudioEngine, Channel, ChannelMixer, InputRecorder, LogBinMapper,
    OfflineAnalyser, Track, TrackColor, TrackId, TrackRegistry, TransportController,
    TRACK_PALETTE,
};
pub use bridge::{ReactiveStateBridge, SharedEngine, TrackSignals, SCRUB_SETTLE};
pub use error::{DecodeError, EngineError, OutputError};
pub use output::{AudioOutput, OutputEvent};
pub use signal::{Signal, Subscription};
