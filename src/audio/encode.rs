//! Clip encoding and the ordered encoding-preference probe.
//!
//! The preference list is data, consumed top-down: the first entry the codec
//! oracle reports as supported wins. Tests substitute fake oracles; the
//! built-in oracle reflects what this build can actually produce (WAV via
//! hound, FLAC via flacenc; no opus encoder is linked).

use anyhow::{Context, Result};
use std::io::Cursor;

/// A candidate clip encoding, ordered from most to least preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    /// Opus in an Ogg container.
    OggOpus,
    /// Uncompressed PCM WAV.
    Wav,
    /// Lossless FLAC.
    Flac,
}

impl AudioEncoding {
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioEncoding::OggOpus => "audio/ogg;codecs=opus",
            AudioEncoding::Wav => "audio/wav",
            AudioEncoding::Flac => "audio/flac",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioEncoding::OggOpus => "ogg",
            AudioEncoding::Wav => "wav",
            AudioEncoding::Flac => "flac",
        }
    }
}

/// Default preference order: opus-in-container first, then the container
/// default, then a secondary container.
pub const ENCODING_PREFERENCES: &[AudioEncoding] =
    &[AudioEncoding::OggOpus, AudioEncoding::Wav, AudioEncoding::Flac];

/// Capability oracle consulted by the preference probe.
pub trait CodecSupport {
    fn supports(&self, encoding: AudioEncoding) -> bool;
}

/// What this build can encode.
pub struct BuiltinCodecs;

impl CodecSupport for BuiltinCodecs {
    fn supports(&self, encoding: AudioEncoding) -> bool {
        matches!(encoding, AudioEncoding::Wav | AudioEncoding::Flac)
    }
}

/// Return the first preferred encoding the oracle accepts.
pub fn select_encoding(
    preferences: &[AudioEncoding],
    oracle: &dyn CodecSupport,
) -> Option<AudioEncoding> {
    preferences.iter().copied().find(|e| oracle.supports(*e))
}

/// Encode interleaved i16 PCM into the requested container.
pub fn encode(
    encoding: AudioEncoding,
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> Result<Vec<u8>> {
    match encoding {
        AudioEncoding::Wav => encode_wav(samples, sample_rate, channels),
        AudioEncoding::Flac => encode_flac(samples, sample_rate, channels),
        AudioEncoding::OggOpus => {
            anyhow::bail!("no opus encoder linked in this build")
        }
    }
}

fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .context("Failed to create WAV writer")?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .context("Failed to write sample to WAV")?;
        }
        writer.finalize().context("Failed to finalize WAV")?;
    }

    Ok(cursor.into_inner())
}

fn encode_flac(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    use flacenc::bitsink::ByteSink;
    use flacenc::component::BitRepr;
    use flacenc::error::Verify;

    let samples_i32: Vec<i32> = samples.iter().map(|&s| s as i32).collect();

    let config = flacenc::config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| anyhow::anyhow!("FLAC config error: {:?}", e))?;

    let source = flacenc::source::MemSource::from_samples(
        &samples_i32,
        channels as usize,
        16,
        sample_rate as usize,
    );

    let stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| anyhow::anyhow!("FLAC encoding failed: {:?}", e))?;

    let mut sink = ByteSink::new();
    stream
        .write(&mut sink)
        .map_err(|e| anyhow::anyhow!("FLAC write failed: {}", e))?;

    Ok(sink.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeOracle(Vec<AudioEncoding>);

    impl CodecSupport for FakeOracle {
        fn supports(&self, encoding: AudioEncoding) -> bool {
            self.0.contains(&encoding)
        }
    }

    #[test]
    fn selects_first_supported_preference() {
        let oracle = FakeOracle(vec![AudioEncoding::Flac, AudioEncoding::Wav]);
        assert_eq!(
            select_encoding(ENCODING_PREFERENCES, &oracle),
            Some(AudioEncoding::Wav)
        );
    }

    #[test]
    fn selects_opus_when_host_reports_it() {
        let oracle = FakeOracle(vec![AudioEncoding::OggOpus, AudioEncoding::Wav]);
        assert_eq!(
            select_encoding(ENCODING_PREFERENCES, &oracle),
            Some(AudioEncoding::OggOpus)
        );
    }

    #[test]
    fn no_supported_encoding_yields_none() {
        let oracle = FakeOracle(vec![]);
        assert_eq!(select_encoding(ENCODING_PREFERENCES, &oracle), None);
    }

    #[test]
    fn builtin_oracle_selects_wav() {
        assert_eq!(
            select_encoding(ENCODING_PREFERENCES, &BuiltinCodecs),
            Some(AudioEncoding::Wav)
        );
    }

    #[test]
    fn wav_roundtrip_header() {
        let samples = vec![0i16; 1600];
        let bytes = encode(AudioEncoding::Wav, &samples, 16000, 1).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
    }

    #[test]
    fn flac_magic_number() {
        let samples = vec![0i16; 1600];
        let bytes = encode(AudioEncoding::Flac, &samples, 16000, 1).unwrap();
        assert_eq!(&bytes[0..4], b"fLaC");
    }

    #[test]
    fn opus_encode_fails_without_encoder() {
        let result = encode(AudioEncoding::OggOpus, &[0i16; 16], 16000, 1);
        assert!(result.is_err());
    }
}
