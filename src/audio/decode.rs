//! Decoding of uploaded audio bytes via symphonia

use crate::audio::buffer::AudioBuffer;
use crate::error::DecodeError;
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode raw uploaded bytes into an interleaved f32 buffer.
///
/// The whole stream is decoded up front; the caller owns the result. A
/// failure at any stage returns an error without side effects, so a failed
/// upload can never leave partial track state behind.
pub fn decode_bytes(bytes: Vec<u8>) -> Result<AudioBuffer, DecodeError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    // No filename available for an in-memory upload, so probe without a hint
    let hint = Hint::new();
    let format_opts = FormatOptions::default();
    let metadata_opts = MetadataOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(48000);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::DecoderInit(e.to_string()))?;

    let mut data: Vec<f32> = Vec::new();
    let mut channels: u32 = 0;
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(DecodeError::MalformedData(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| DecodeError::MalformedData(e.to_string()))?;

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            channels = spec.channels.count() as u32;
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            data.extend_from_slice(buf.samples());
        }
    }

    if data.is_empty() || channels == 0 {
        return Err(DecodeError::EmptyStream);
    }

    Ok(AudioBuffer::new(data, channels, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_rejected() {
        let result = decode_bytes(vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x01, 0x02]);
        assert!(matches!(result, Err(DecodeError::UnsupportedFormat(_))));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(decode_bytes(Vec::new()).is_err());
    }
}
