//! # Engine Façade
//!
//! The single boundary the hosting shell calls. Every entry point validates
//! its argument shapes before any payload is decoded, tags failures with the
//! operation name, and re-encodes outputs as data URLs.
//!
//! An [`Engine`] holds only immutable configuration. All decode state lives
//! in request-scoped values, so one engine can serve concurrent requests.

use std::time::Duration;

use tracing::{debug, info};

use crate::codec::{MediaBlob, MediaKind, decode_image, encode_image, open_video};
use crate::config::EngineConfig;
use crate::core::PixelBuffer;
use crate::error::{EngineError, EngineResult};
use crate::processing::sampler::sample_frames;
use crate::processing::selector::find_best;
use crate::processing::split::{split, validate_grid};
use crate::processing::upscale::{upscale, validate_scale};
use crate::processing::BestImageResult;

/// One extracted frame, already re-encoded for transport.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Position of the frame in decode order.
    pub index: u64,
    /// Presentation time relative to the first decoded frame.
    pub timestamp: Duration,
    pub data_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config
            .validate()
            .map_err(|msg| EngineError::invalid_argument(msg).with_operation("configure"))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Pick the highest-scoring image of a batch of at least two.
    pub fn find_best_image<S>(&self, images: &[S]) -> EngineResult<BestImageResult>
    where
        S: AsRef<str> + Sync,
    {
        info!(count = images.len(), "find_best_image");
        let result = find_best(images, &self.config).map_err(|e| e.with_operation("find_best_image"))?;
        info!(index = result.index, overall = result.overall_score, failures = result.failures.len(), "best image selected");
        Ok(result)
    }

    /// Extract frames under the configured sampling policy.
    ///
    /// `filename` is informational; the container is always identified from
    /// the payload itself.
    pub fn extract_frames_from_video(&self, video: &str, filename: &str) -> EngineResult<Vec<String>> {
        let frames = self.extract_frames_with_positions(video, filename)?;
        Ok(frames.into_iter().map(|f| f.data_url).collect())
    }

    /// Like [`Engine::extract_frames_from_video`], keeping each frame's position.
    pub fn extract_frames_with_positions(&self, video: &str, filename: &str) -> EngineResult<Vec<EncodedFrame>> {
        const OP: &str = "extract_frames_from_video";
        info!(filename, payload_len = video.len(), "extract_frames_from_video");

        let limits = &self.config.video;
        let blob = MediaBlob::from_transport(MediaKind::Video, video, limits.max_input_bytes)
            .map_err(|e| e.with_operation(OP))?;
        let mut handle = open_video(&blob, limits).map_err(|e| e.with_operation(OP))?;
        drop(blob);
        debug!(
            container = handle.info().container.name(),
            width = handle.info().width,
            height = handle.info().height,
            duration = ?handle.info().duration,
            "video opened"
        );

        let frames = sample_frames(&mut handle, limits.sampling, limits).map_err(|e| e.with_operation(OP))?;
        drop(handle);

        let encoded = frames
            .into_iter()
            .map(|frame| -> EngineResult<EncodedFrame> {
                Ok(EncodedFrame {
                    index: frame.index,
                    timestamp: frame.timestamp,
                    data_url: self.encode(&frame.buffer)?,
                })
            })
            .collect::<EngineResult<Vec<_>>>()
            .map_err(|e| e.with_operation(OP))?;
        info!(frames = encoded.len(), "frames extracted");
        Ok(encoded)
    }

    /// Upscale by an integer factor in `2..=8`.
    pub fn upscale_image(&self, image: &str, scale: i64) -> EngineResult<String> {
        const OP: &str = "upscale_image";
        info!(scale, "upscale_image");
        let factor = validate_scale(scale).map_err(|e| e.with_operation(OP))?;

        let buffer = self.decode(image).map_err(|e| e.with_operation(OP))?;
        let output = upscale(&buffer, factor, &self.config.upscale).map_err(|e| e.with_operation(OP))?;
        debug!(
            from = ?(buffer.width(), buffer.height()),
            to = ?(output.width(), output.height()),
            "upscaled"
        );
        self.encode(&output).map_err(|e| e.with_operation(OP))
    }

    /// Split into `rows × cols` tiles, returned row-major.
    pub fn split_image(&self, image: &str, rows: i64, cols: i64) -> EngineResult<Vec<String>> {
        const OP: &str = "split_image";
        info!(rows, cols, "split_image");
        let (rows, cols) = validate_grid(rows, cols, &self.config.split).map_err(|e| e.with_operation(OP))?;

        let buffer = self.decode(image).map_err(|e| e.with_operation(OP))?;
        let tiles = split(&buffer, rows, cols, &self.config.split).map_err(|e| e.with_operation(OP))?;
        tiles
            .iter()
            .map(|tile| self.encode(&tile.buffer))
            .collect::<EngineResult<Vec<_>>>()
            .map_err(|e| e.with_operation(OP))
    }

    fn decode(&self, payload: &str) -> EngineResult<PixelBuffer> {
        let blob = MediaBlob::from_transport(MediaKind::Image, payload, self.config.image.max_input_bytes)?;
        decode_image(&blob, &self.config.image)
    }

    fn encode(&self, buffer: &PixelBuffer) -> EngineResult<String> {
        Ok(encode_image(buffer, self.config.output.format)?.to_data_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_image;
    use crate::config::OutputFormat;
    use crate::core::Layout;
    use crate::error::ErrorKind;

    fn png_url(width: u32, height: u32) -> String {
        let data = (0..width * height).map(|i| (i * 7 % 256) as u8).collect();
        let buffer = PixelBuffer::new(width, height, Layout::Gray, data).unwrap();
        encode_image(&buffer, OutputFormat::Png).unwrap().to_data_url()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.split.max_tiles = 0;
        let err = Engine::new(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_arguments_checked_before_decoding() {
        let engine = Engine::default();
        // The payload is garbage; the argument error must win.
        let err = engine.upscale_image("not base64 at all!", 9).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = engine.split_image("not base64 at all!", 0, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_operation_is_recorded() {
        let engine = Engine::default();
        let err = engine.upscale_image("data:image/png;base64,AAAA", 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.context().operation.as_deref(), Some("upscale_image"));
    }

    #[test]
    fn test_split_outputs_are_data_urls() {
        let engine = Engine::default();
        let tiles = engine.split_image(&png_url(9, 6), 2, 3).unwrap();
        assert_eq!(tiles.len(), 6);
        assert!(tiles.iter().all(|t| t.starts_with("data:image/png;base64,")));
    }
}
