//! Raster painter for the preview card and the video frames.
//!
//! Everything is drawn onto an RGBA buffer: branded gradient, pulsing halo,
//! avatar (or microphone glyph fallback) clipped to a circle, progress bar
//! and a time readout. The preview card is a single static 640x640 bitmap;
//! video frames are 720x720 and vary with elapsed time.

use anyhow::{Context, Result};
use image::{imageops, Rgba, RgbaImage};
use std::io::Cursor;
use tracing::warn;

/// Preview card edge length in pixels.
pub const CARD_SIZE: u32 = 640;

/// Brand gradient stops (top-left to bottom-right).
const GRADIENT: [[u8; 3]; 3] = [[0xa8, 0x55, 0xf7], [0x8b, 0x5c, 0xf6], [0x63, 0x66, 0xf1]];

const WHITE: [u8; 3] = [0xff, 0xff, 0xff];

/// Halo radius as a function of elapsed playback time, in pixels.
///
/// Soft sinusoidal pulse around the avatar circle.
pub fn halo_radius(elapsed_secs: f64) -> f64 {
    80.0 + 15.0 * (elapsed_secs * 10.0).sin()
}

/// "m:ss" clock readout.
pub fn format_time(secs: f64) -> String {
    let total = secs.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

pub struct CardPainter {
    avatar: Option<RgbaImage>,
}

impl CardPainter {
    pub fn new(avatar: Option<RgbaImage>) -> Self {
        Self { avatar }
    }

    /// Static share-preview card: gradient plus the avatar-or-glyph circle.
    pub fn render_preview_card(&self) -> RgbaImage {
        let mut img = RgbaImage::new(CARD_SIZE, CARD_SIZE);
        paint_gradient(&mut img);

        let cx = CARD_SIZE as i32 / 2;
        let cy = CARD_SIZE as i32 / 2;
        fill_circle(&mut img, cx, cy, 130.0, WHITE, 50);
        self.paint_identity(&mut img, cx, cy, 120.0);

        img
    }

    /// One video frame at `elapsed` seconds of a `total`-second clip.
    pub fn render_video_frame(&self, width: u32, height: u32, elapsed: f64, total: f64) -> RgbaImage {
        let mut img = RgbaImage::new(width, height);
        paint_gradient(&mut img);

        let cx = width as i32 / 2;
        let cy = height as i32 / 2;

        // Pulsing halo, then the avatar backdrop circle.
        fill_circle(&mut img, cx, cy, halo_radius(elapsed), WHITE, 26);
        fill_circle(&mut img, cx, cy, 60.0, WHITE, 52);
        self.paint_identity(&mut img, cx, cy, 56.0);

        let progress = if total > 0.0 {
            (elapsed / total).clamp(0.0, 1.0)
        } else {
            0.0
        };
        paint_progress_bar(&mut img, progress);

        let readout = format!("{} / {}", format_time(elapsed.min(total)), format_time(total));
        draw_text(
            &mut img,
            &readout,
            cx,
            height as i32 - 50,
            3,
            WHITE,
        );

        img
    }

    /// Avatar clipped to a circle, or the microphone glyph fallback.
    fn paint_identity(&self, img: &mut RgbaImage, cx: i32, cy: i32, radius: f64) {
        match &self.avatar {
            Some(avatar) => paint_avatar_circle(img, avatar, cx, cy, radius),
            None => paint_mic_glyph(img, cx, cy, radius / 30.0),
        }
    }
}

fn paint_gradient(img: &mut RgbaImage) {
    let (w, h) = img.dimensions();
    let span = (w + h - 2).max(1) as f64;

    for y in 0..h {
        for x in 0..w {
            let t = (x + y) as f64 / span;
            let color = gradient_at(t);
            img.put_pixel(x, y, Rgba([color[0], color[1], color[2], 0xff]));
        }
    }
}

fn gradient_at(t: f64) -> [u8; 3] {
    let (a, b, local) = if t < 0.5 {
        (GRADIENT[0], GRADIENT[1], t * 2.0)
    } else {
        (GRADIENT[1], GRADIENT[2], (t - 0.5) * 2.0)
    };

    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = (a[i] as f64 + (b[i] as f64 - a[i] as f64) * local).round() as u8;
    }
    out
}

/// Alpha-blend `src` over the pixel at (x, y).
fn blend(img: &mut RgbaImage, x: i32, y: i32, color: [u8; 3], alpha: u8) {
    let (w, h) = img.dimensions();
    if x < 0 || y < 0 || x >= w as i32 || y >= h as i32 {
        return;
    }

    let px = img.get_pixel_mut(x as u32, y as u32);
    let a = alpha as u32;
    for i in 0..3 {
        let base = px.0[i] as u32;
        px.0[i] = ((base * (255 - a) + color[i] as u32 * a) / 255) as u8;
    }
}

/// Filled circle with a one-pixel soft edge.
fn fill_circle(img: &mut RgbaImage, cx: i32, cy: i32, radius: f64, color: [u8; 3], alpha: u8) {
    let r = radius.ceil() as i32 + 1;
    for dy in -r..=r {
        for dx in -r..=r {
            let dist = ((dx * dx + dy * dy) as f64).sqrt();
            if dist <= radius {
                blend(img, cx + dx, cy + dy, color, alpha);
            } else if dist < radius + 1.0 {
                let edge = (radius + 1.0 - dist).clamp(0.0, 1.0);
                blend(img, cx + dx, cy + dy, color, (alpha as f64 * edge) as u8);
            }
        }
    }
}

fn fill_rect(img: &mut RgbaImage, x: i32, y: i32, w: i32, h: i32, color: [u8; 3], alpha: u8) {
    for dy in 0..h {
        for dx in 0..w {
            blend(img, x + dx, y + dy, color, alpha);
        }
    }
}

fn paint_avatar_circle(img: &mut RgbaImage, avatar: &RgbaImage, cx: i32, cy: i32, radius: f64) {
    let diameter = (radius * 2.0).round() as u32;
    if diameter == 0 {
        return;
    }

    let scaled = imageops::resize(avatar, diameter, diameter, imageops::FilterType::Triangle);
    let left = cx - radius.round() as i32;
    let top = cy - radius.round() as i32;

    for (px, py, pixel) in scaled.enumerate_pixels() {
        let dx = px as f64 - radius;
        let dy = py as f64 - radius;
        if (dx * dx + dy * dy).sqrt() <= radius {
            let alpha = pixel.0[3];
            blend(
                img,
                left + px as i32,
                top + py as i32,
                [pixel.0[0], pixel.0[1], pixel.0[2]],
                alpha,
            );
        }
    }
}

/// Vector-ish microphone: capsule body, stem and base, scaled by `s`.
fn paint_mic_glyph(img: &mut RgbaImage, cx: i32, cy: i32, s: f64) {
    let s = s.max(0.5);
    let unit = |v: f64| (v * s).round() as i32;

    // Capsule body.
    fill_rect(
        img,
        cx - unit(8.0),
        cy - unit(20.0),
        unit(16.0),
        unit(30.0),
        WHITE,
        255,
    );
    fill_circle(img, cx, cy - unit(20.0), 8.0 * s, WHITE, 255);
    fill_circle(img, cx, cy + unit(10.0), 8.0 * s, WHITE, 255);

    // Stem and base.
    fill_rect(
        img,
        cx - unit(2.0),
        cy + unit(15.0),
        unit(4.0),
        unit(10.0),
        WHITE,
        255,
    );
    fill_rect(
        img,
        cx - unit(15.0),
        cy + unit(23.0),
        unit(30.0),
        unit(4.0),
        WHITE,
        255,
    );
}

fn paint_progress_bar(img: &mut RgbaImage, progress: f64) {
    let (w, h) = img.dimensions();
    let bar_w = 200;
    let bar_h = 6;
    let x = (w as i32 - bar_w) / 2;
    let y = h as i32 - 80;

    fill_rect(img, x, y, bar_w, bar_h, WHITE, 77);
    let filled = (bar_w as f64 * progress).round() as i32;
    fill_rect(img, x, y, filled, bar_h, WHITE, 255);
}

/// 5x7 bitmap glyphs for the clock readout (digits, ':', '/', ' ').
fn glyph(c: char) -> [u8; 7] {
    match c {
        '0' => [0x0e, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0e],
        '1' => [0x04, 0x0c, 0x04, 0x04, 0x04, 0x04, 0x0e],
        '2' => [0x0e, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1f],
        '3' => [0x1f, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0e],
        '4' => [0x02, 0x06, 0x0a, 0x12, 0x1f, 0x02, 0x02],
        '5' => [0x1f, 0x10, 0x1e, 0x01, 0x01, 0x11, 0x0e],
        '6' => [0x06, 0x08, 0x10, 0x1e, 0x11, 0x11, 0x0e],
        '7' => [0x1f, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0e, 0x11, 0x11, 0x0e, 0x11, 0x11, 0x0e],
        '9' => [0x0e, 0x11, 0x11, 0x0f, 0x01, 0x02, 0x0c],
        ':' => [0x00, 0x0c, 0x0c, 0x00, 0x0c, 0x0c, 0x00],
        '/' => [0x01, 0x01, 0x02, 0x04, 0x08, 0x10, 0x10],
        _ => [0x00; 7],
    }
}

/// Centered bitmap text at (cx, baseline_y), each glyph cell 6x7 units.
fn draw_text(img: &mut RgbaImage, text: &str, cx: i32, y: i32, scale: i32, color: [u8; 3]) {
    let cell = 6 * scale;
    let total_w = text.chars().count() as i32 * cell;
    let mut x = cx - total_w / 2;

    for c in text.chars() {
        let rows = glyph(c);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..5 {
                if bits & (1 << (4 - col)) != 0 {
                    fill_rect(
                        img,
                        x + col * scale,
                        y + row as i32 * scale,
                        scale,
                        scale,
                        color,
                        255,
                    );
                }
            }
        }
        x += cell;
    }
}

/// Encode a painted frame to PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .context("PNG encoding failed")?;
    Ok(out.into_inner())
}

/// Encode a painted frame to JPEG bytes (for MJPEG video frames).
pub fn encode_jpeg(img: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    let mut out = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
    rgb.write_with_encoder(encoder)
        .context("JPEG encoding failed")?;
    Ok(out.into_inner())
}

/// Best-effort avatar fetch; any failure falls back to the glyph.
pub async fn fetch_avatar(client: &reqwest::Client, url: &str) -> Option<RgbaImage> {
    let bytes = match client.get(url).send().await {
        Ok(response) if response.status().is_success() => response.bytes().await.ok()?,
        Ok(response) => {
            warn!("Avatar fetch returned HTTP {}", response.status());
            return None;
        }
        Err(e) => {
            warn!("Avatar fetch failed: {}", e);
            return None;
        }
    };

    match image::load_from_memory(&bytes) {
        Ok(img) => Some(img.to_rgba8()),
        Err(e) => {
            warn!("Avatar image undecodable: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halo_radius_stays_in_band() {
        for i in 0..1000 {
            let t = i as f64 * 0.01;
            let r = halo_radius(t);
            assert!((65.0..=95.0).contains(&r), "radius {} out of band at t={}", r, t);
        }
    }

    #[test]
    fn format_time_pads_seconds() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(5.4), "0:05");
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(-1.0), "0:00");
    }

    #[test]
    fn gradient_endpoints_match_brand_stops() {
        assert_eq!(gradient_at(0.0), GRADIENT[0]);
        assert_eq!(gradient_at(1.0), GRADIENT[2]);
    }

    #[test]
    fn preview_card_is_painted() {
        let card = CardPainter::new(None).render_preview_card();
        assert_eq!(card.dimensions(), (CARD_SIZE, CARD_SIZE));

        // Top-left corner carries the first gradient stop.
        let corner = card.get_pixel(0, 0);
        assert_eq!([corner.0[0], corner.0[1], corner.0[2]], GRADIENT[0]);

        // Center is the white mic glyph, not raw gradient.
        let center = card.get_pixel(CARD_SIZE / 2, CARD_SIZE / 2);
        assert_eq!(center.0[0], 0xff);
    }

    #[test]
    fn video_frame_progress_advances() {
        let painter = CardPainter::new(None);
        let early = painter.render_video_frame(720, 720, 0.0, 10.0);
        let late = painter.render_video_frame(720, 720, 10.0, 10.0);

        // Right-hand end of the progress bar only fills near the end.
        let x = (720 / 2 + 95) as u32;
        let y = (720 - 78) as u32;
        assert!(late.get_pixel(x, y).0[0] > early.get_pixel(x, y).0[0]);
    }

    #[test]
    fn video_frame_honors_both_dimensions() {
        let painter = CardPainter::new(None);
        let frame = painter.render_video_frame(64, 32, 0.0, 1.0);
        assert_eq!(frame.dimensions(), (64, 32));
    }

    #[test]
    fn png_and_jpeg_encoders_emit_magic_bytes() {
        let card = CardPainter::new(None).render_preview_card();
        let png = encode_png(&card).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let jpeg = encode_jpeg(&card, 80).unwrap();
        assert_eq!(&jpeg[0..2], &[0xff, 0xd8]);
    }

    #[test]
    fn avatar_is_clipped_to_circle() {
        let avatar = RgbaImage::from_pixel(64, 64, Rgba([0, 255, 0, 255]));
        let painter = CardPainter::new(Some(avatar));
        let card = painter.render_preview_card();

        // Center pixel comes from the avatar.
        let center = card.get_pixel(CARD_SIZE / 2, CARD_SIZE / 2);
        assert_eq!(center.0[1], 255);
        assert_eq!(center.0[0], 0);
    }
}
