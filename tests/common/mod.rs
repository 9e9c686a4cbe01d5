//! Deterministic synthetic media shared by the integration tests.

#![allow(dead_code)]

use image::codecs::gif::GifEncoder;
use image::{Delay, Frame, Rgba, RgbaImage};
use media_engine::PixelBuffer;
use media_engine::codec::{MediaBlob, MediaKind, decode_image, encode_image};
use media_engine::config::{ImageConfig, OutputFormat};
use media_engine::core::Layout;

/// Gray checkerboard with `square`-pixel cells alternating `lo` / `hi`.
pub fn checkerboard(width: u32, height: u32, square: u32, lo: u8, hi: u8) -> PixelBuffer {
    let data = (0..height)
        .flat_map(|y| (0..width).map(move |x| if (x / square + y / square) % 2 == 0 { lo } else { hi }))
        .collect();
    PixelBuffer::new(width, height, Layout::Gray, data).unwrap()
}

/// Soft, grainy frame: luma around `base` with up to ±`amplitude` noise.
pub fn noisy_flat(width: u32, height: u32, base: u8, amplitude: u8, seed: u32) -> PixelBuffer {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let span = u32::from(amplitude) * 2 + 1;
    let data = (0..width * height)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let offset = (state >> 24) % span;
            (u32::from(base) + offset).saturating_sub(u32::from(amplitude)) as u8
        })
        .collect();
    PixelBuffer::new(width, height, Layout::Gray, data).unwrap()
}

pub fn solid_rgb(width: u32, height: u32, rgb: [u8; 3]) -> PixelBuffer {
    let data = rgb.iter().copied().cycle().take((width * height * 3) as usize).collect();
    PixelBuffer::new(width, height, Layout::Rgb, data).unwrap()
}

pub fn png_data_url(buffer: &PixelBuffer) -> String {
    encode_image(buffer, OutputFormat::Png).unwrap().to_data_url()
}

/// Decode a data URL returned by the engine back into pixels.
pub fn decode_data_url(url: &str) -> PixelBuffer {
    let blob = MediaBlob::from_transport(MediaKind::Image, url, u64::MAX).unwrap();
    decode_image(&blob, &ImageConfig::default()).unwrap()
}

/// Animated GIF with `frames` frames of `delay_ms` each, as a data URL.
pub fn gif_data_url(frames: u32, width: u32, height: u32, delay_ms: u32) -> String {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        let frames = (0..frames).map(|i| {
            let shade = (i * 37 % 256) as u8;
            let image = RgbaImage::from_fn(width, height, |x, _| {
                Rgba([shade, (x * 16 % 256) as u8, 255 - shade, 255])
            });
            Frame::from_parts(image, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1))
        });
        encoder.encode_frames(frames).unwrap();
    }
    MediaBlob::new(MediaKind::Video, bytes).with_mime("image/gif").to_data_url()
}

/// Just enough ISO-BMFF to be recognised as MP4.
pub fn mp4_data_url() -> String {
    let mut bytes = vec![0x00, 0x00, 0x00, 0x18];
    bytes.extend_from_slice(b"ftypisom");
    bytes.extend_from_slice(&[0x00, 0x00, 0x02, 0x00]);
    bytes.extend_from_slice(b"isomiso2");
    MediaBlob::new(MediaKind::Video, bytes).with_mime("video/mp4").to_data_url()
}
