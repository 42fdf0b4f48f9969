//! Error types for the engine and I/O layers

use crate::audio::TrackId;
use thiserror::Error;

/// Errors that can occur while decoding uploaded audio bytes
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Container format could not be identified
    #[error("Unrecognized or unsupported container format: {0}")]
    UnsupportedFormat(String),

    /// No decodable audio stream inside the container
    #[error("No audio track found in input")]
    NoAudioTrack,

    /// No codec available for the stream
    #[error("Failed to create decoder: {0}")]
    DecoderInit(String),

    /// Malformed packet data mid-stream
    #[error("Failed to decode packet: {0}")]
    MalformedData(String),

    /// Stream decoded to zero frames
    #[error("Input decoded to no audio data")]
    EmptyStream,
}

/// Errors from track/channel/recording operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// A channel already exists for this track id. This is a programmer
    /// error in correct usage: channels are created once per track.
    #[error("Channel already exists for track {0}")]
    DuplicateChannel(TrackId),

    /// Recording was requested without an available input device
    #[error("No audio input device available")]
    MicrophoneUnavailable,

    /// Input stream could not be opened
    #[error("Failed to open input stream: {0}")]
    InputStream(String),

    /// Upload bytes could not be decoded; no track was created
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Errors from the real-time output path
#[derive(Error, Debug)]
pub enum OutputError {
    /// No audio output devices found
    #[error("No audio output device available")]
    NoDevice,

    /// Failed to query the device configuration
    #[error("Failed to get device config: {0}")]
    Config(String),

    /// Failed to build the output stream
    #[error("Failed to build output stream: {0}")]
    StreamBuild(String),

    /// Failed to start the output stream
    #[error("Failed to start output stream: {0}")]
    StreamPlay(String),

    /// Device sample format not supported by the engine
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),
}
