//! Minimal RIFF/AVI muxer for MJPEG video plus 16-bit PCM audio.
//!
//! This is the built-in encoder behind the video-format preference probe:
//! one '00dc' JPEG chunk per frame interleaved with '01wb' PCM chunks, plus
//! the idx1 index most players expect.

use anyhow::{ensure, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

const AVIF_HASINDEX: u32 = 0x0000_0010;
const AVIF_ISINTERLEAVED: u32 = 0x0000_0100;
const AVIIF_KEYFRAME: u32 = 0x0000_0010;

pub struct AviMuxer {
    width: u32,
    height: u32,
    fps: u32,
    sample_rate: u32,
    channels: u16,
    frames: Vec<Vec<u8>>,
    audio: Vec<i16>,
}

impl AviMuxer {
    pub fn new(width: u32, height: u32, fps: u32, sample_rate: u32, channels: u16) -> Self {
        Self {
            width,
            height,
            fps,
            sample_rate,
            channels,
            frames: Vec::new(),
            audio: Vec::new(),
        }
    }

    /// Append one encoded JPEG frame.
    pub fn push_frame(&mut self, jpeg: Vec<u8>) {
        self.frames.push(jpeg);
    }

    /// Set the full interleaved PCM track.
    pub fn set_audio(&mut self, samples: Vec<i16>) {
        self.audio = samples;
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Assemble the container. Consumes the muxer; one call produces one blob.
    pub fn finish(self) -> Result<Vec<u8>> {
        ensure!(!self.frames.is_empty(), "no frames to mux");
        ensure!(self.fps > 0, "frame rate must be positive");

        let block_align = 2 * self.channels as u32;
        let byte_rate = self.sample_rate * block_align;
        // Per-channel sample frames delivered alongside each video frame.
        let samples_per_frame =
            (self.sample_rate as usize / self.fps as usize) * self.channels as usize;

        // Build the movi body first so chunk offsets are known for idx1.
        let mut movi: Vec<u8> = Vec::new();
        let mut index: Vec<([u8; 4], u32, u32)> = Vec::new();
        let mut audio_pos = 0usize;

        for jpeg in &self.frames {
            let offset = movi.len() as u32 + 4; // relative to 'movi' fourcc
            write_chunk(&mut movi, b"00dc", jpeg)?;
            index.push((*b"00dc", offset, jpeg.len() as u32));

            let end = (audio_pos + samples_per_frame).min(self.audio.len());
            if audio_pos < end {
                let mut pcm = Vec::with_capacity((end - audio_pos) * 2);
                for &sample in &self.audio[audio_pos..end] {
                    pcm.write_i16::<LittleEndian>(sample)?;
                }
                let offset = movi.len() as u32 + 4;
                write_chunk(&mut movi, b"01wb", &pcm)?;
                index.push((*b"01wb", offset, pcm.len() as u32));
                audio_pos = end;
            }
        }

        // Trailing audio that didn't align with a frame boundary.
        if audio_pos < self.audio.len() {
            let mut pcm = Vec::with_capacity((self.audio.len() - audio_pos) * 2);
            for &sample in &self.audio[audio_pos..] {
                pcm.write_i16::<LittleEndian>(sample)?;
            }
            let offset = movi.len() as u32 + 4;
            write_chunk(&mut movi, b"01wb", &pcm)?;
            index.push((*b"01wb", offset, pcm.len() as u32));
        }

        let hdrl = self.build_hdrl(block_align, byte_rate)?;

        let mut idx1: Vec<u8> = Vec::new();
        for (fourcc, offset, size) in &index {
            idx1.write_all(fourcc)?;
            idx1.write_u32::<LittleEndian>(AVIIF_KEYFRAME)?;
            idx1.write_u32::<LittleEndian>(*offset)?;
            idx1.write_u32::<LittleEndian>(*size)?;
        }

        let mut out: Vec<u8> = Vec::new();
        out.write_all(b"RIFF")?;
        // Each LIST costs 12 header bytes ("LIST" + size + list fourcc).
        let riff_size = 4 // "AVI "
            + 12 + hdrl.len()
            + 12 + movi.len()
            + 8 + idx1.len();
        out.write_u32::<LittleEndian>(riff_size as u32)?;
        out.write_all(b"AVI ")?;

        write_list(&mut out, b"hdrl", &hdrl)?;

        out.write_all(b"LIST")?;
        out.write_u32::<LittleEndian>(4 + movi.len() as u32)?;
        out.write_all(b"movi")?;
        out.write_all(&movi)?;

        write_chunk(&mut out, b"idx1", &idx1)?;

        Ok(out)
    }

    fn build_hdrl(&self, block_align: u32, byte_rate: u32) -> Result<Vec<u8>> {
        let total_frames = self.frames.len() as u32;
        let sample_frames = self.audio.len() as u32 / self.channels.max(1) as u32;
        let max_frame = self.frames.iter().map(Vec::len).max().unwrap_or(0) as u32;

        // avih
        let mut avih: Vec<u8> = Vec::new();
        avih.write_u32::<LittleEndian>(1_000_000 / self.fps)?; // microseconds per frame
        avih.write_u32::<LittleEndian>(byte_rate + max_frame * self.fps)?;
        avih.write_u32::<LittleEndian>(0)?; // padding granularity
        avih.write_u32::<LittleEndian>(AVIF_HASINDEX | AVIF_ISINTERLEAVED)?;
        avih.write_u32::<LittleEndian>(total_frames)?;
        avih.write_u32::<LittleEndian>(0)?; // initial frames
        avih.write_u32::<LittleEndian>(2)?; // streams
        avih.write_u32::<LittleEndian>(max_frame)?;
        avih.write_u32::<LittleEndian>(self.width)?;
        avih.write_u32::<LittleEndian>(self.height)?;
        for _ in 0..4 {
            avih.write_u32::<LittleEndian>(0)?;
        }

        // Video stream header + format.
        let mut vids_strh: Vec<u8> = Vec::new();
        vids_strh.write_all(b"vids")?;
        vids_strh.write_all(b"MJPG")?;
        vids_strh.write_u32::<LittleEndian>(0)?; // flags
        vids_strh.write_u16::<LittleEndian>(0)?; // priority
        vids_strh.write_u16::<LittleEndian>(0)?; // language
        vids_strh.write_u32::<LittleEndian>(0)?; // initial frames
        vids_strh.write_u32::<LittleEndian>(1)?; // scale
        vids_strh.write_u32::<LittleEndian>(self.fps)?; // rate
        vids_strh.write_u32::<LittleEndian>(0)?; // start
        vids_strh.write_u32::<LittleEndian>(total_frames)?; // length
        vids_strh.write_u32::<LittleEndian>(max_frame)?; // suggested buffer
        vids_strh.write_u32::<LittleEndian>(u32::MAX)?; // quality
        vids_strh.write_u32::<LittleEndian>(0)?; // sample size
        vids_strh.write_u16::<LittleEndian>(0)?; // rcFrame
        vids_strh.write_u16::<LittleEndian>(0)?;
        vids_strh.write_u16::<LittleEndian>(self.width as u16)?;
        vids_strh.write_u16::<LittleEndian>(self.height as u16)?;

        let mut vids_strf: Vec<u8> = Vec::new(); // BITMAPINFOHEADER
        vids_strf.write_u32::<LittleEndian>(40)?;
        vids_strf.write_i32::<LittleEndian>(self.width as i32)?;
        vids_strf.write_i32::<LittleEndian>(self.height as i32)?;
        vids_strf.write_u16::<LittleEndian>(1)?; // planes
        vids_strf.write_u16::<LittleEndian>(24)?; // bit count
        vids_strf.write_all(b"MJPG")?; // compression
        vids_strf.write_u32::<LittleEndian>(self.width * self.height * 3)?;
        for _ in 0..4 {
            vids_strf.write_u32::<LittleEndian>(0)?;
        }

        // Audio stream header + format (PCM WAVEFORMAT).
        let mut auds_strh: Vec<u8> = Vec::new();
        auds_strh.write_all(b"auds")?;
        auds_strh.write_u32::<LittleEndian>(0)?; // handler
        auds_strh.write_u32::<LittleEndian>(0)?; // flags
        auds_strh.write_u16::<LittleEndian>(0)?; // priority
        auds_strh.write_u16::<LittleEndian>(0)?; // language
        auds_strh.write_u32::<LittleEndian>(0)?; // initial frames
        auds_strh.write_u32::<LittleEndian>(1)?; // scale
        auds_strh.write_u32::<LittleEndian>(self.sample_rate)?; // rate
        auds_strh.write_u32::<LittleEndian>(0)?; // start
        auds_strh.write_u32::<LittleEndian>(sample_frames)?; // length
        auds_strh.write_u32::<LittleEndian>(byte_rate)?; // suggested buffer
        auds_strh.write_u32::<LittleEndian>(u32::MAX)?; // quality
        auds_strh.write_u32::<LittleEndian>(block_align)?; // sample size
        for _ in 0..4 {
            auds_strh.write_u16::<LittleEndian>(0)?; // rcFrame
        }

        let mut auds_strf: Vec<u8> = Vec::new();
        auds_strf.write_u16::<LittleEndian>(1)?; // PCM
        auds_strf.write_u16::<LittleEndian>(self.channels)?;
        auds_strf.write_u32::<LittleEndian>(self.sample_rate)?;
        auds_strf.write_u32::<LittleEndian>(byte_rate)?;
        auds_strf.write_u16::<LittleEndian>(block_align as u16)?;
        auds_strf.write_u16::<LittleEndian>(16)?; // bits per sample

        // Assemble stream lists.
        let mut vids_strl: Vec<u8> = Vec::new();
        write_chunk(&mut vids_strl, b"strh", &vids_strh)?;
        write_chunk(&mut vids_strl, b"strf", &vids_strf)?;

        let mut auds_strl: Vec<u8> = Vec::new();
        write_chunk(&mut auds_strl, b"strh", &auds_strh)?;
        write_chunk(&mut auds_strl, b"strf", &auds_strf)?;

        let mut hdrl: Vec<u8> = Vec::new();
        write_chunk(&mut hdrl, b"avih", &avih)?;
        write_list(&mut hdrl, b"strl", &vids_strl)?;
        write_list(&mut hdrl, b"strl", &auds_strl)?;

        Ok(hdrl)
    }
}

fn write_chunk(out: &mut Vec<u8>, fourcc: &[u8; 4], body: &[u8]) -> Result<()> {
    out.write_all(fourcc)?;
    out.write_u32::<LittleEndian>(body.len() as u32)?;
    out.write_all(body)?;
    if body.len() % 2 == 1 {
        out.push(0); // RIFF chunks are word-aligned
    }
    Ok(())
}

fn write_list(out: &mut Vec<u8>, fourcc: &[u8; 4], body: &[u8]) -> Result<()> {
    out.write_all(b"LIST")?;
    out.write_u32::<LittleEndian>(4 + body.len() as u32)?;
    out.write_all(fourcc)?;
    out.write_all(body)?;
    Ok(())
}
