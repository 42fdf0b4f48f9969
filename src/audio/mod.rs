pub mod analyser;
pub mod buffer;
pub mod channel;
pub mod decode;
pub mod engine;
pub mod mixer;
pub mod recorder;
pub mod registry;
pub mod transport;

pub use analyser::{LogBinMapper, OfflineAnalyser};
pub use buffer::AudioBuffer;
pub use channel::Channel;
pub use decode::decode_bytes;
pub use engine::AudioEngine;
pub use mixer::ChannelMixer;
pub use recorder::InputRecorder;
pub use registry::{Track, TrackColor, TrackId, TrackRegistry, TRACK_PALETTE};
pub use transport::TransportController;
