//! Decoded rasters and the positioned values built from them.

use std::time::Duration;

use media_scale::cpu::Layout;
use media_scale::plan::Size;

use crate::error::{EngineError, EngineResult};

/// Decoded raster: row-major, interleaved 8-bit samples, no row padding.
///
/// A `PixelBuffer` is owned by the operation that decoded it and is moved,
/// never shared, between pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    layout: Layout,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw samples, checking that both sides are non-zero and that
    /// `data` holds exactly `width * height * channels` bytes.
    pub fn new(width: u32, height: u32, layout: Layout, data: Vec<u8>) -> EngineResult<Self> {
        if width == 0 || height == 0 {
            return Err(EngineError::decode(format!(
                "raster has an empty dimension ({}x{})",
                width, height
            )));
        }
        let expected = u64::from(width) * u64::from(height) * u64::from(layout.channels());
        if data.len() as u64 != expected {
            return Err(EngineError::internal(format!(
                "{}x{} raster with {} channels needs {} bytes, got {}",
                width,
                height,
                layout.channels(),
                expected,
                data.len()
            )));
        }
        Ok(Self { width, height, layout, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size { w: self.width, h: self.height }
    }

    pub fn pixel_count(&self) -> u64 {
        self.size().pixels()
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn channels(&self) -> u8 {
        self.layout.channels()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// BT.601 luma, one byte per pixel. Alpha is ignored.
    pub fn to_luma(&self) -> Vec<u8> {
        let ch = self.channels() as usize;
        match self.layout {
            Layout::Gray => self.data.clone(),
            Layout::GrayAlpha => self.data.chunks_exact(ch).map(|p| p[0]).collect(),
            Layout::Rgb | Layout::Rgba => self
                .data
                .chunks_exact(ch)
                .map(|p| {
                    // Fixed-point 0.299 / 0.587 / 0.114, rounded.
                    let y = 299 * u32::from(p[0]) + 587 * u32::from(p[1]) + 114 * u32::from(p[2]);
                    ((y + 500) / 1000) as u8
                })
                .collect(),
        }
    }
}

/// A decoded video frame and its position in the source stream.
#[derive(Debug, Clone)]
pub struct Frame {
    pub buffer: PixelBuffer,
    /// Zero-based decode index within the stream.
    pub index: u64,
    /// Presentation timestamp relative to stream start.
    pub timestamp: Duration,
}

/// One cell of a row×column partition.
#[derive(Debug, Clone)]
pub struct Tile {
    pub buffer: PixelBuffer,
    pub row: u32,
    pub col: u32,
}
