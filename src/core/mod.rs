//! # Core Types
//!
//! Request-scoped rasters shared by the codec adapter and the processing
//! stages: [`PixelBuffer`], [`Frame`] and [`Tile`].

pub mod buffer;

pub use buffer::{Frame, PixelBuffer, Tile};
pub use media_scale::cpu::Layout;
