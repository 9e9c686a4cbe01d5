//! Animated GIF backend.
//!
//! Always compiled. Frames come out of the `image` crate fully composited onto
//! the logical screen, so every frame has the stream's full dimensions.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, Frames, ImageDecoder};

use super::VideoContainer;
use super::video::{VideoInfo, VideoSource, check_frame_size};
use crate::config::VideoConfig;
use crate::core::{Layout, PixelBuffer};
use crate::error::EngineResult;

/// Delay substituted for frames that declare none, matching browser playback.
const ZERO_DELAY_SUBSTITUTE: Duration = Duration::from_millis(100);

pub struct GifSource {
    info: VideoInfo,
    frames: Frames<'static>,
    clock: Duration,
    bytes: Arc<[u8]>,
    max_decoded_frames: u64,
    max_duration: Duration,
    probed: bool,
}

impl GifSource {
    /// Open a GIF. Only the header is read here; the duration is learned on
    /// demand by [`VideoSource::duration`].
    pub fn open(bytes: &[u8], limits: &VideoConfig) -> EngineResult<Self> {
        let bytes: Arc<[u8]> = Arc::from(bytes);

        let decoder = GifDecoder::new(Cursor::new(Arc::clone(&bytes)))?;
        let (width, height) = decoder.dimensions();
        check_frame_size(width, height, limits)?;

        Ok(Self {
            info: VideoInfo {
                container: VideoContainer::Gif,
                width,
                height,
                duration: None,
            },
            frames: decoder.into_frames(),
            clock: Duration::ZERO,
            bytes,
            max_decoded_frames: limits.max_decoded_frames,
            max_duration: limits.max_duration(),
            probed: false,
        })
    }
}

impl VideoSource for GifSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    /// GIF has no duration field; the delays are summed over a second pass.
    fn duration(&mut self) -> Option<Duration> {
        if !self.probed {
            self.probed = true;
            self.info.duration =
                probe_duration(Arc::clone(&self.bytes), self.max_decoded_frames, self.max_duration);
        }
        self.info.duration
    }

    fn next_frame(&mut self) -> EngineResult<Option<(PixelBuffer, Duration)>> {
        let Some(frame) = self.frames.next() else {
            return Ok(None);
        };
        let frame = frame?;
        let timestamp = self.clock;
        self.clock += frame_delay(&frame);

        let rgba = frame.into_buffer();
        let (w, h) = rgba.dimensions();
        let buffer = PixelBuffer::new(w, h, Layout::Rgba, rgba.into_raw())?;
        Ok(Some((buffer, timestamp)))
    }
}

fn frame_delay(frame: &image::Frame) -> Duration {
    let (numer, denom) = frame.delay().numer_denom_ms();
    if numer == 0 || denom == 0 {
        return ZERO_DELAY_SUBSTITUTE;
    }
    Duration::from_nanos(u64::from(numer) * 1_000_000 / u64::from(denom))
}

/// Sum frame delays until the stream ends or a processing cap is reached.
/// A frame that fails to decode ends the walk; reading will surface the error.
fn probe_duration(bytes: Arc<[u8]>, max_frames: u64, max_duration: Duration) -> Option<Duration> {
    let mut total = Duration::ZERO;
    let frames = GifDecoder::new(Cursor::new(bytes)).ok()?.into_frames();
    for frame in frames.take(usize::try_from(max_frames).unwrap_or(usize::MAX)) {
        let Ok(frame) = frame else { break };
        total += frame_delay(&frame);
        if total >= max_duration {
            return Some(max_duration);
        }
    }
    Some(total)
}
