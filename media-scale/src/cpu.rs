// SPDX-License-Identifier: MIT
// CPU resampler built on fast_image_resize (SIMD-accelerated, rayon over rows).
// Tightly packed 8-bit in → tightly packed 8-bit out, same channel layout.

use fast_image_resize as fir;
use fir::images::{Image, ImageRef};
use fir::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use serde::Deserialize;

use crate::plan::ScalePlan;

#[derive(Debug)]
pub enum ScaleError {
    BufferSizeMismatch { expected: usize, actual: usize },
    Fir(fir::ResizeError),
    ImageBuf(fir::ImageBufferError),
}

impl From<fir::ResizeError> for ScaleError { fn from(e: fir::ResizeError) -> Self { Self::Fir(e) } }
impl From<fir::ImageBufferError> for ScaleError { fn from(e: fir::ImageBufferError) -> Self { Self::ImageBuf(e) } }

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::BufferSizeMismatch { expected, actual } => {
                write!(f, "Source buffer holds {} bytes, expected {}", actual, expected)
            }
            ScaleError::Fir(e) => write!(f, "Fast image resize error: {}", e),
            ScaleError::ImageBuf(e) => write!(f, "Image buffer error: {}", e),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScaleError::Fir(e) => Some(e),
            ScaleError::ImageBuf(e) => Some(e),
            _ => None,
        }
    }
}

/// Interleaved 8-bit channel layouts the resampler accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl Layout {
    /// Map a channel count (1..=4) onto a layout.
    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(Layout::Gray),
            2 => Some(Layout::GrayAlpha),
            3 => Some(Layout::Rgb),
            4 => Some(Layout::Rgba),
            _ => None,
        }
    }

    pub fn channels(self) -> u8 {
        match self {
            Layout::Gray => 1,
            Layout::GrayAlpha => 2,
            Layout::Rgb => 3,
            Layout::Rgba => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, Layout::GrayAlpha | Layout::Rgba)
    }

    fn pixel_type(self) -> PixelType {
        match self {
            Layout::Gray => PixelType::U8,
            Layout::GrayAlpha => PixelType::U8x2,
            Layout::Rgb => PixelType::U8x3,
            Layout::Rgba => PixelType::U8x4,
        }
    }
}

/// Reconstruction kernel used for resampling.
///
/// `Lanczos3` is the default for upscaling; `Box` is used when shrinking
/// rasters for analysis, where averaging is exactly what is wanted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    #[default]
    Lanczos3,
    CatmullRom,
    Bilinear,
    Box,
}

impl Filter {
    fn alg(self) -> ResizeAlg {
        let filter = match self {
            Filter::Lanczos3 => FilterType::Lanczos3,
            Filter::CatmullRom => FilterType::CatmullRom,
            Filter::Bilinear => FilterType::Bilinear,
            Filter::Box => FilterType::Box,
        };
        ResizeAlg::Convolution(filter)
    }
}

/// Main scaling entry point.
/// `src` must be exactly `plan.input.w * plan.input.h * layout.channels()` bytes.
/// Returns a freshly allocated buffer of `plan.out.w * plan.out.h * layout.channels()` bytes.
pub fn scale_cpu(
    resizer: &mut Resizer,
    src: &[u8],
    plan: &ScalePlan,
    layout: Layout,
    filter: Filter,
) -> Result<Vec<u8>, ScaleError> {
    let expected = plan.input.pixels() as usize * layout.channels() as usize;
    if src.len() != expected {
        return Err(ScaleError::BufferSizeMismatch { expected, actual: src.len() });
    }
    if plan.is_identity() {
        return Ok(src.to_vec());
    }

    let src_view = ImageRef::new(plan.input.w, plan.input.h, src, layout.pixel_type())?;
    let mut dst = Image::new(plan.out.w, plan.out.h, layout.pixel_type());

    let opts = ResizeOptions::new()
        .resize_alg(filter.alg())
        .use_alpha(layout.has_alpha());
    resizer.resize(&src_view, &mut dst, &opts)?;

    Ok(dst.into_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{fit_long_side, upscale_plan, Size};

    #[test]
    fn upscale_output_has_exact_length() {
        let src: Vec<u8> = (0..5 * 4 * 3).map(|v| (v * 7 % 256) as u8).collect();
        let plan = upscale_plan(Size { w: 5, h: 4 }, 4).unwrap();
        let mut resizer = Resizer::new();
        let out = scale_cpu(&mut resizer, &src, &plan, Layout::Rgb, Filter::Lanczos3).unwrap();
        assert_eq!(out.len(), 20 * 16 * 3);
    }

    #[test]
    fn flat_input_stays_flat() {
        let src = vec![90u8; 8 * 8];
        let plan = upscale_plan(Size { w: 8, h: 8 }, 2).unwrap();
        let mut resizer = Resizer::new();
        let out = scale_cpu(&mut resizer, &src, &plan, Layout::Gray, Filter::Lanczos3).unwrap();
        assert!(out.iter().all(|&v| v == 90));
    }

    #[test]
    fn box_downscale_averages() {
        let mut src = vec![0u8; 4 * 4];
        for (i, v) in src.iter_mut().enumerate() {
            *v = if i % 2 == 0 { 0 } else { 200 };
        }
        let plan = fit_long_side(Size { w: 4, h: 4 }, 2);
        let mut resizer = Resizer::new();
        let out = scale_cpu(&mut resizer, &src, &plan, Layout::Gray, Filter::Box).unwrap();
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|&v| (95..=105).contains(&v)));
    }

    #[test]
    fn rejects_short_buffer() {
        let plan = upscale_plan(Size { w: 4, h: 4 }, 2).unwrap();
        let mut resizer = Resizer::new();
        let err = scale_cpu(&mut resizer, &[0u8; 10], &plan, Layout::Gray, Filter::Bilinear);
        assert!(matches!(err, Err(ScaleError::BufferSizeMismatch { expected: 16, actual: 10 })));
    }

    #[test]
    fn layout_round_trips_channel_count() {
        for channels in 1..=4u8 {
            assert_eq!(Layout::from_channels(channels).unwrap().channels(), channels);
        }
        assert!(Layout::from_channels(0).is_none());
        assert!(Layout::from_channels(5).is_none());
    }
}
