//! # Media Evaluation and Transformation Engine
//!
//! Scores, samples, resamples and tiles media submitted as transport-safe
//! (base64 / data URL) payloads.
//!
//! ## Architecture
//!
//! - `codec`: transport decoding, content sniffing, image decode/encode and
//!   video backends behind the [`codec::VideoSource`] trait
//! - `processing`: quality scoring, best-image selection, frame sampling,
//!   upscaling and grid splitting
//! - `core`: pixel buffers, frames and tiles
//! - `config`: engine limits and the sampling policy
//! - `engine`: the façade the hosting shell calls
//! - `protocol`: the JSON request/response envelope
//!
//! Raster resampling and grid geometry live in the `media-scale` crate.
//!
//! ## Example
//!
//! ```rust
//! use media_engine::{Engine, EngineConfig, ErrorKind};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let err = engine.upscale_image("data:image/png;base64,AAAA", 9).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::InvalidArgument);
//! ```
//!
//! ## Features
//!
//! - `gstreamer`: decode MP4, Matroska/WebM, AVI, MPEG-TS/PS, FLV, Ogg and ASF
//!   through GStreamer. Without it, animated GIF is the only video container.

pub mod codec;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod processing;
pub mod protocol;

pub use config::{EngineConfig, SamplingPolicy};
pub use core::{Frame, PixelBuffer, Tile};
pub use engine::{EncodedFrame, Engine};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use processing::{BestImageResult, QualityScore};
