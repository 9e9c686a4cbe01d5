// SPDX-License-Identifier: MIT
//! # media-scale: Raster Resampling and Grid Geometry
//!
//! Low-level building blocks used by the media engine. Everything here works on
//! tightly packed, row-major 8-bit buffers with 1 to 4 interleaved channels and
//! knows nothing about codecs, transport encodings or engine errors.
//!
//! ## Key Components
//!
//! - [`plan`]: Output-size computation (integer upscale plans, analysis fits)
//! - [`cpu`]: SIMD-accelerated resampling built on fast_image_resize
//! - [`grid`]: Row×column partitioning with remainder absorbed by the last band
//!
//! ## Determinism
//!
//! All operations are content-independent and produce identical output for
//! identical input. fast_image_resize parallelises over rows with rayon, which
//! does not change the arithmetic performed per output sample.
//!
//! ## Usage Example
//!
//! ```rust
//! use media_scale::cpu::{scale_cpu, Filter, Layout};
//! use media_scale::plan::{upscale_plan, Size};
//!
//! let src = vec![128u8; 4 * 3];
//! let plan = upscale_plan(Size { w: 4, h: 3 }, 3).unwrap();
//! let mut resizer = fast_image_resize::Resizer::new();
//! let out = scale_cpu(&mut resizer, &src, &plan, Layout::Gray, Filter::Lanczos3).unwrap();
//! assert_eq!(out.len(), 12 * 9);
//! ```

pub mod cpu;
pub mod grid;
pub mod plan;
