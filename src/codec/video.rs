//! Video handles and backend selection.

use std::time::Duration;

use tracing::debug;

use super::gif::GifSource;
use super::{Container, MediaBlob, MediaKind, VideoContainer};
use crate::config::VideoConfig;
use crate::core::{Frame, PixelBuffer};
use crate::error::{EngineError, EngineResult};

/// Stream properties known once a backend has opened its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoInfo {
    pub container: VideoContainer,
    pub width: u32,
    pub height: u32,
    /// Playable duration, capped at the configured processing window.
    /// `None` when the container does not advertise one, or when the backend
    /// has not computed it yet (see [`VideoSource::duration`]).
    pub duration: Option<Duration>,
}

/// A decoder yielding frames in presentation order.
///
/// Implementations own their native decode state and must release it when
/// dropped, whether or not the stream was read to the end.
pub trait VideoSource {
    fn info(&self) -> &VideoInfo;

    /// Playable duration. Backends that must scan the stream to learn it do
    /// so on the first call only.
    fn duration(&mut self) -> Option<Duration> {
        self.info().duration
    }

    /// Decode the next frame with its presentation timestamp, or `None` at end
    /// of stream.
    fn next_frame(&mut self) -> EngineResult<Option<(PixelBuffer, Duration)>>;
}

/// Request-scoped video decoding context.
///
/// Owns exactly one backend; frames are pulled sequentially through
/// [`VideoHandle::read_next_frame`]. Dropping the handle releases the backend.
pub struct VideoHandle {
    source: Box<dyn VideoSource>,
    decoded: u64,
    origin: Option<Duration>,
}

impl VideoHandle {
    pub fn new(source: Box<dyn VideoSource>) -> Self {
        Self { source, decoded: 0, origin: None }
    }

    pub fn info(&self) -> &VideoInfo {
        self.source.info()
    }

    /// Playable duration, computed on first use if the backend needs to.
    pub fn duration(&mut self) -> Option<Duration> {
        self.source.duration()
    }

    /// Number of frames pulled so far.
    pub fn frames_decoded(&self) -> u64 {
        self.decoded
    }

    /// Pull the next frame, tagging it with its decode index. Timestamps are
    /// rebased so the first frame sits at zero.
    pub fn read_next_frame(&mut self) -> EngineResult<Option<Frame>> {
        let Some((buffer, pts)) = self.source.next_frame()? else {
            return Ok(None);
        };
        let origin = *self.origin.get_or_insert(pts);
        let timestamp = pts.saturating_sub(origin);
        let frame = Frame { buffer, index: self.decoded, timestamp };
        self.decoded += 1;
        Ok(Some(frame))
    }
}

impl Drop for VideoHandle {
    fn drop(&mut self) {
        debug!(
            container = self.info().container.name(),
            frames = self.decoded,
            "releasing video handle"
        );
    }
}

/// Open a video blob with the backend matching its container.
///
/// Rejects blobs declared as images, still-image content, unknown containers
/// and streams whose frame size exceeds `video.max_frame_pixels`.
pub fn open_video(blob: &MediaBlob, limits: &VideoConfig) -> EngineResult<VideoHandle> {
    if blob.kind() != MediaKind::Video {
        return Err(EngineError::decode("blob is declared as an image, expected a video"));
    }
    if blob.len() as u64 > limits.max_input_bytes {
        return Err(EngineError::resource_limit(
            "video.max_input_bytes",
            blob.len() as u64,
            limits.max_input_bytes,
        ));
    }

    let container = match blob.container() {
        Some(Container::Video(container)) => container,
        Some(Container::Image(format)) => {
            return Err(EngineError::decode(format!(
                "content is a {:?} still image, not a video",
                format
            )));
        }
        None => return Err(EngineError::decode("unrecognised video container")),
    };

    let source: Box<dyn VideoSource> = match container {
        VideoContainer::Gif => Box::new(GifSource::open(blob.bytes(), limits)?),
        #[cfg(feature = "gstreamer")]
        other => Box::new(super::gstreamer::GstSource::open(blob.bytes(), other, limits)?),
        #[cfg(not(feature = "gstreamer"))]
        other => {
            return Err(EngineError::decode(format!(
                "{} video is not supported by this build",
                other.name()
            ))
            .with_recovery_suggestion("rebuild with the `gstreamer` feature or submit an animated GIF"));
        }
    };

    let handle = VideoHandle::new(source);
    check_frame_size(handle.info().width, handle.info().height, limits)?;
    debug!(container = container.name(), info = ?handle.info(), "opened video");
    Ok(handle)
}

/// Enforce `video.max_frame_pixels` for a frame or stream size.
pub(crate) fn check_frame_size(width: u32, height: u32, limits: &VideoConfig) -> EngineResult<()> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels > limits.max_frame_pixels {
        return Err(EngineError::resource_limit(
            "video.max_frame_pixels",
            pixels,
            limits.max_frame_pixels,
        ));
    }
    Ok(())
}
