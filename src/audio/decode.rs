//! Decode an encoded clip back into PCM to learn its exact duration.
//!
//! The wall-clock capture timer over-reports by scheduling jitter; the
//! decoded sample count is authoritative whenever decoding succeeds.

use anyhow::{Context, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::warn;

/// Fully decoded clip.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved i16 PCM samples.
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }
}

/// Decode an in-memory clip (wav/ogg/flac) into interleaved PCM.
pub fn decode(bytes: &[u8]) -> Result<DecodedAudio> {
    let mss = MediaSourceStream::new(
        Box::new(Cursor::new(bytes.to_vec())),
        Default::default(),
    );

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Unrecognized audio container")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No decodable audio track")?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Unsupported audio codec")?;

    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    let mut samples: Vec<i16> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<i16>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e).context("Failed to read audio packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // Recoverable per the symphonia contract; skip the packet.
                warn!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(e).context("Audio decode failed"),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            sample_rate = spec.rate;
            channels = spec.channels.count() as u16;
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(buf) = &mut sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encode::{encode, AudioEncoding};

    fn sine_samples(secs: f64, rate: u32) -> Vec<i16> {
        (0..(secs * rate as f64) as usize)
            .map(|i| {
                let t = i as f32 / rate as f32;
                (f32::sin(2.0 * std::f32::consts::PI * 440.0 * t) * 16000.0) as i16
            })
            .collect()
    }

    #[test]
    fn decoded_duration_matches_sample_count() {
        let samples = sine_samples(2.0, 16000);
        let wav = encode(AudioEncoding::Wav, &samples, 16000, 1).unwrap();

        let decoded = decode(&wav).unwrap();
        assert_eq!(decoded.sample_rate, 16000);
        assert_eq!(decoded.channels, 1);
        assert!((decoded.duration_seconds() - 2.0).abs() < 0.01);
    }

    #[test]
    fn decode_rejects_garbage() {
        let result = decode(&[0u8; 64]);
        assert!(result.is_err());
    }

    #[test]
    fn empty_decoded_audio_has_zero_duration() {
        let decoded = DecodedAudio {
            samples: vec![],
            sample_rate: 0,
            channels: 0,
        };
        assert_eq!(decoded.duration_seconds(), 0.0);
    }
}
