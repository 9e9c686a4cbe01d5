//! # Configuration Module
//!
//! Engine limits, sampling policy and output encoding.

pub mod config;
pub mod sampling;

pub use config::{
    EngineConfig, ImageConfig, OutputConfig, OutputFormat, ScoringConfig, SplitConfig,
    UpscaleConfig, VideoConfig,
};
pub use sampling::SamplingPolicy;
