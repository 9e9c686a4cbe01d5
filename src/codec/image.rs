//! Still-image decode and encode.

use std::io::Cursor;

use ::image::codecs::jpeg::JpegEncoder;
use ::image::codecs::png::PngEncoder;
use ::image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageReader, Limits};
use tracing::debug;

use super::{Container, MediaBlob, MediaKind};
use crate::config::{ImageConfig, OutputFormat};
use crate::core::{Layout, PixelBuffer};
use crate::error::{EngineError, EngineResult};

/// Decode an image blob into an 8-bit [`PixelBuffer`].
///
/// Fails with `DecodeError` when the blob was declared as video, when its
/// content is a video container, or when the bytes are not a supported image.
/// The pixel cap is checked from the header, before the raster is allocated.
/// EXIF orientation, when present, is applied so the result is upright.
pub fn decode_image(blob: &MediaBlob, limits: &ImageConfig) -> EngineResult<PixelBuffer> {
    if blob.kind() != MediaKind::Image {
        return Err(EngineError::decode("blob is declared as video, expected an image"));
    }
    if blob.len() as u64 > limits.max_input_bytes {
        return Err(EngineError::resource_limit(
            "image.max_input_bytes",
            blob.len() as u64,
            limits.max_input_bytes,
        ));
    }

    let format = match blob.container() {
        Some(Container::Image(format)) => format,
        Some(Container::Video(container)) => {
            return Err(EngineError::decode(format!(
                "content is a {} video container, not an image",
                container.name()
            )));
        }
        None => return Err(EngineError::decode("unrecognised image format")),
    };

    let (w, h) = ImageReader::with_format(Cursor::new(blob.bytes()), format).into_dimensions()?;
    let pixels = u64::from(w) * u64::from(h);
    if pixels > limits.max_pixels {
        return Err(EngineError::resource_limit("image.max_pixels", pixels, limits.max_pixels));
    }

    let mut decoder_limits = Limits::default();
    // Worst case is four 32-bit float channels per pixel.
    decoder_limits.max_alloc = Some(limits.max_pixels.saturating_mul(16));
    let mut reader = ImageReader::with_format(Cursor::new(blob.bytes()), format);
    reader.limits(decoder_limits);
    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut decoded = DynamicImage::from_decoder(decoder)?;
    decoded.apply_orientation(orientation);

    debug!(?format, width = w, height = h, ?orientation, "decoded image");
    from_dynamic(decoded)
}

/// Encode a [`PixelBuffer`] into the configured output container.
pub fn encode_image(buffer: &PixelBuffer, format: OutputFormat) -> EngineResult<MediaBlob> {
    let mut out = Vec::new();
    let (w, h) = (buffer.width(), buffer.height());

    let mime = match format {
        OutputFormat::Png => {
            PngEncoder::new(&mut out).write_image(buffer.data(), w, h, color_type(buffer.layout()))?;
            "image/png"
        }
        OutputFormat::Jpeg { quality } => {
            let (layout, data) = drop_alpha(buffer);
            JpegEncoder::new_with_quality(&mut out, quality).write_image(
                &data,
                w,
                h,
                color_type(layout),
            )?;
            "image/jpeg"
        }
    };

    Ok(MediaBlob::new(MediaKind::Image, out).with_mime(mime))
}

fn color_type(layout: Layout) -> ExtendedColorType {
    match layout {
        Layout::Gray => ExtendedColorType::L8,
        Layout::GrayAlpha => ExtendedColorType::La8,
        Layout::Rgb => ExtendedColorType::Rgb8,
        Layout::Rgba => ExtendedColorType::Rgba8,
    }
}

fn drop_alpha(buffer: &PixelBuffer) -> (Layout, Vec<u8>) {
    match buffer.layout() {
        Layout::GrayAlpha => (Layout::Gray, buffer.data().chunks_exact(2).map(|p| p[0]).collect()),
        Layout::Rgba => (
            Layout::Rgb,
            buffer
                .data()
                .chunks_exact(4)
                .flat_map(|p| [p[0], p[1], p[2]])
                .collect(),
        ),
        layout => (layout, buffer.data().to_vec()),
    }
}

/// Normalise any decoded image to one of the four 8-bit layouts.
pub(crate) fn from_dynamic(image: DynamicImage) -> EngineResult<PixelBuffer> {
    let (w, h) = (image.width(), image.height());
    let color = image.color();
    let (layout, data) = match (color.has_color(), color.has_alpha()) {
        (false, false) => (Layout::Gray, image.into_luma8().into_raw()),
        (false, true) => (Layout::GrayAlpha, image.into_luma_alpha8().into_raw()),
        (true, false) => (Layout::Rgb, image.into_rgb8().into_raw()),
        (true, true) => (Layout::Rgba, image.into_rgba8().into_raw()),
    };
    PixelBuffer::new(w, h, layout, data)
}
