//! # Engine Configuration
//!
//! Every resource cap the engine enforces lives here as explicit
//! configuration. Nothing is read from the environment; hosts build an
//! [`EngineConfig`] (usually [`EngineConfig::default`], or JSON through serde)
//! and hand it to [`crate::Engine::new`], which validates it once.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Default | Description |
//! |-----------|---------|-------------|
//! | `image.max_input_bytes` | 64 MiB | Encoded image size cap |
//! | `image.max_pixels` | 64 Mpx | Decoded image pixel cap |
//! | `upscale.max_output_pixels` | 64 Mpx | Upscaled output budget |
//! | `upscale.filter` | `lanczos3` | Reconstruction kernel |
//! | `split.max_tiles` | 1024 | Upper bound on `rows × cols` |
//! | `video.max_input_bytes` | 512 MiB | Encoded video size cap |
//! | `video.max_frames` | 120 | Frames emitted per request |
//! | `video.max_decoded_frames` | 18 000 | Frames pulled from the stream |
//! | `video.max_duration_ms` | 10 min | Stream time processed |
//! | `video.max_frame_pixels` | 8K UHD | Per-frame resolution cap |
//! | `video.frame_timeout_ms` | 10 s | Per-frame pull timeout (native backend) |
//! | `video.sampling` | every 30th | Default [`SamplingPolicy`] |
//! | `scoring.parallel` | `true` | Score batch items on the rayon pool |
//! | `output.format` | `png` | Encoding for returned images |
//!
//! ## Examples
//!
//! ```rust
//! use media_engine::config::EngineConfig;
//!
//! let config: EngineConfig =
//!     serde_json::from_str(r#"{"video": {"max_frames": 10}}"#).unwrap();
//! assert_eq!(config.video.max_frames, 10);
//! assert_eq!(config.split.max_tiles, 1024);
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use media_scale::cpu::Filter;
use serde::Deserialize;

use super::sampling::SamplingPolicy;

const MIB: u64 = 1024 * 1024;

/// Limits applied when decoding still images.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Largest encoded image accepted, in bytes.
    pub max_input_bytes: u64,
    /// Largest decoded image accepted, in pixels.
    pub max_pixels: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: 64 * MIB,
            max_pixels: 8192 * 8192,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpscaleConfig {
    /// Output pixel budget; larger requests fail with `ResourceLimitError`.
    pub max_output_pixels: u64,
    pub filter: Filter,
}

impl Default for UpscaleConfig {
    fn default() -> Self {
        Self {
            max_output_pixels: 8192 * 8192,
            filter: Filter::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Upper bound on `rows * cols`.
    pub max_tiles: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { max_tiles: 1024 }
    }
}

/// Limits bounding the work a single video request may cause.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub max_input_bytes: u64,
    /// Hard cap on frames returned.
    pub max_frames: u32,
    /// Hard cap on frames decoded, sampled or not.
    pub max_decoded_frames: u64,
    /// Frames stamped after this point are never decoded.
    pub max_duration_ms: u64,
    pub max_frame_pixels: u64,
    /// How long the native backend may block waiting for one frame.
    pub frame_timeout_ms: u64,
    pub sampling: SamplingPolicy,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: 512 * MIB,
            max_frames: 120,
            max_decoded_frames: 18_000,
            max_duration_ms: 10 * 60 * 1000,
            max_frame_pixels: 7680 * 4320,
            frame_timeout_ms: 10_000,
            sampling: SamplingPolicy::default(),
        }
    }
}

impl VideoConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Score batch items concurrently. Results are identical either way.
    pub parallel: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Container used for every image the engine returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Png,
    /// Lossy; alpha channels are dropped.
    Jpeg { quality: u8 },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub image: ImageConfig,
    pub upscale: UpscaleConfig,
    pub split: SplitConfig,
    pub video: VideoConfig,
    pub scoring: ScoringConfig,
    pub output: OutputConfig,
}

impl EngineConfig {
    /// Validates the configuration parameters.
    ///
    /// Every cap must be non-zero; a zero cap would make the matching
    /// operation fail for every input.
    pub fn validate(&self) -> Result<(), String> {
        if self.image.max_input_bytes == 0 || self.image.max_pixels == 0 {
            return Err("image limits must be greater than 0".to_string());
        }
        if self.upscale.max_output_pixels == 0 {
            return Err("upscale.max_output_pixels must be greater than 0".to_string());
        }
        if self.split.max_tiles == 0 {
            return Err("split.max_tiles must be greater than 0".to_string());
        }
        let v = &self.video;
        if v.max_input_bytes == 0 || v.max_frame_pixels == 0 {
            return Err("video size limits must be greater than 0".to_string());
        }
        if v.max_frames == 0 || v.max_decoded_frames == 0 {
            return Err("video frame caps must be greater than 0".to_string());
        }
        if v.max_duration_ms == 0 || v.frame_timeout_ms == 0 {
            return Err("video time limits must be greater than 0".to_string());
        }
        v.sampling.validate()?;
        if let OutputFormat::Jpeg { quality } = self.output.format {
            if !(1..=100).contains(&quality) {
                return Err("JPEG quality must be between 1 and 100".to_string());
            }
        }
        Ok(())
    }
}
