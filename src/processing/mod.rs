//! # Processing Stages
//!
//! The algorithmic core of the engine. Each stage works on decoded
//! [`PixelBuffer`](crate::core::PixelBuffer)s (or a video handle) and knows
//! nothing about transport encodings, except the selector which decodes each
//! batch item itself so failures stay per-item.
//!
//! - [`quality`]: sharpness / exposure / noise scoring
//! - [`selector`]: batch arg-max with a deterministic tie-break
//! - [`sampler`]: bounded frame extraction from a video stream
//! - [`upscale`]: integer-factor resampling under a pixel budget
//! - [`split`]: row×column tiling

pub mod quality;
pub mod sampler;
pub mod selector;
pub mod split;
pub mod upscale;

pub use quality::{QualityScore, QualityScorer};
pub use selector::{BestImageResult, ItemFailure, ScoredImage};
