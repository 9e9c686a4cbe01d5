//! # Frame Sampler
//!
//! Pulls frames from a [`VideoHandle`] in presentation order and keeps the
//! ones selected by a [`SamplingPolicy`].
//!
//! Extraction stops at the first of:
//! - end of stream
//! - `video.max_frames` frames emitted (or `count` for evenly spaced sampling)
//! - `video.max_decoded_frames` frames decoded
//! - a frame stamped at or after `video.max_duration_ms`
//!
//! Emitted frames have strictly increasing decode indices. A decode failure
//! after at least one frame was emitted ends the stream early; before that it
//! fails the request.

use std::time::Duration;

use tracing::{debug, warn};

use crate::codec::VideoHandle;
use crate::codec::video::check_frame_size;
use crate::config::sampling::DEFAULT_STEP;
use crate::config::{SamplingPolicy, VideoConfig};
use crate::core::Frame;
use crate::error::{EngineError, EngineResult, ErrorKind};

/// Policy state resolved against the stream being read.
#[derive(Debug)]
enum Selector {
    EveryNth { step: u64 },
    Spaced { interval_ns: u128, next_ns: u128 },
}

impl Selector {
    fn resolve(policy: SamplingPolicy, duration: Option<Duration>) -> Self {
        match policy {
            SamplingPolicy::EveryNth { step } => Selector::EveryNth { step: u64::from(step.max(1)) },
            SamplingPolicy::EvenlySpaced { count } => {
                let interval_ns = duration.map_or(0, |d| d.as_nanos()) / u128::from(count.max(1));
                if interval_ns == 0 {
                    debug!("stream duration unknown, sampling every {}th frame", DEFAULT_STEP);
                    Selector::EveryNth { step: u64::from(DEFAULT_STEP) }
                } else {
                    Selector::Spaced { interval_ns, next_ns: 0 }
                }
            }
        }
    }

    fn accepts(&mut self, frame: &Frame) -> bool {
        match self {
            Selector::EveryNth { step } => frame.index % *step == 0,
            Selector::Spaced { interval_ns, next_ns } => {
                let ts = frame.timestamp.as_nanos();
                if ts < *next_ns {
                    return false;
                }
                *next_ns = (ts / *interval_ns + 1) * *interval_ns;
                true
            }
        }
    }
}

/// Extract the frames selected by `policy`.
pub fn sample_frames(
    handle: &mut VideoHandle,
    policy: SamplingPolicy,
    limits: &VideoConfig,
) -> EngineResult<Vec<Frame>> {
    // Only spaced sampling needs the duration; some backends compute it lazily.
    let duration = match policy {
        SamplingPolicy::EvenlySpaced { .. } => handle.duration(),
        SamplingPolicy::EveryNth { .. } => None,
    };
    let mut selector = Selector::resolve(policy, duration);
    let cap = match policy {
        SamplingPolicy::EvenlySpaced { count } => count.min(limits.max_frames),
        SamplingPolicy::EveryNth { .. } => limits.max_frames,
    } as usize;
    let max_duration = limits.max_duration();

    let mut frames = Vec::new();
    while frames.len() < cap && handle.frames_decoded() < limits.max_decoded_frames {
        let frame = match handle.read_next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(err) if err.kind() == ErrorKind::Decode && !frames.is_empty() => {
                warn!(%err, emitted = frames.len(), "stream ended early on a decode error");
                break;
            }
            Err(err) => return Err(err),
        };
        if frame.timestamp >= max_duration {
            debug!(timestamp = ?frame.timestamp, "reached video.max_duration_ms");
            break;
        }
        check_frame_size(frame.buffer.width(), frame.buffer.height(), limits)?;
        if selector.accepts(&frame) {
            debug!(index = frame.index, timestamp = ?frame.timestamp, "sampled frame");
            frames.push(frame);
        }
    }

    if frames.is_empty() {
        return Err(EngineError::empty_result("video contains no decodable frames"));
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::codec::{VideoContainer, VideoInfo, VideoSource};
    use crate::core::{Layout, PixelBuffer};

    /// Synthetic stream: `count` 4x4 gray frames, `step_ms` apart, optionally
    /// failing at `fail_at`.
    struct Synthetic {
        info: VideoInfo,
        count: u64,
        step_ms: u64,
        next: u64,
        fail_at: Option<u64>,
        duration_queries: Rc<Cell<u32>>,
    }

    impl Synthetic {
        fn handle(count: u64, step_ms: u64, fail_at: Option<u64>, known_duration: bool) -> VideoHandle {
            Self::counted(count, step_ms, fail_at, known_duration).0
        }

        fn counted(
            count: u64,
            step_ms: u64,
            fail_at: Option<u64>,
            known_duration: bool,
        ) -> (VideoHandle, Rc<Cell<u32>>) {
            let duration = known_duration.then(|| Duration::from_millis(count * step_ms));
            let queries = Rc::new(Cell::new(0));
            let handle = VideoHandle::new(Box::new(Synthetic {
                info: VideoInfo { container: VideoContainer::Mp4, width: 4, height: 4, duration },
                count,
                step_ms,
                next: 0,
                fail_at,
                duration_queries: Rc::clone(&queries),
            }));
            (handle, queries)
        }
    }

    impl VideoSource for Synthetic {
        fn info(&self) -> &VideoInfo {
            &self.info
        }

        fn duration(&mut self) -> Option<Duration> {
            self.duration_queries.set(self.duration_queries.get() + 1);
            self.info.duration
        }

        fn next_frame(&mut self) -> EngineResult<Option<(PixelBuffer, Duration)>> {
            if Some(self.next) == self.fail_at {
                return Err(EngineError::decode("corrupt packet"));
            }
            if self.next == self.count {
                return Ok(None);
            }
            let ts = Duration::from_millis(self.next * self.step_ms);
            self.next += 1;
            Ok(Some((PixelBuffer::new(4, 4, Layout::Gray, vec![7; 16])?, ts)))
        }
    }

    fn indices(frames: &[Frame]) -> Vec<u64> {
        frames.iter().map(|f| f.index).collect()
    }

    #[test]
    fn test_every_nth() {
        let mut handle = Synthetic::handle(100, 33, None, true);
        let frames = sample_frames(&mut handle, SamplingPolicy::default(), &VideoConfig::default()).unwrap();
        assert_eq!(indices(&frames), vec![0, 30, 60, 90]);
    }

    #[test]
    fn test_short_video_yields_first_frame() {
        let mut handle = Synthetic::handle(5, 33, None, true);
        let frames = sample_frames(&mut handle, SamplingPolicy::default(), &VideoConfig::default()).unwrap();
        assert_eq!(indices(&frames), vec![0]);
    }

    #[test]
    fn test_frame_cap_is_hard() {
        let limits = VideoConfig { max_frames: 3, ..VideoConfig::default() };
        let mut handle = Synthetic::handle(1000, 10, None, true);
        let frames = sample_frames(&mut handle, SamplingPolicy::EveryNth { step: 1 }, &limits).unwrap();
        assert_eq!(indices(&frames), vec![0, 1, 2]);
        // Decoding stopped as soon as the cap was reached.
        assert_eq!(handle.frames_decoded(), 3);
    }

    #[test]
    fn test_duration_cap() {
        let limits = VideoConfig { max_duration_ms: 1000, ..VideoConfig::default() };
        let mut handle = Synthetic::handle(1000, 100, None, true);
        let frames = sample_frames(&mut handle, SamplingPolicy::EveryNth { step: 2 }, &limits).unwrap();
        assert_eq!(indices(&frames), vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn test_evenly_spaced() {
        // 10 s at 100 ms per frame, 4 samples → targets 0, 2.5 s, 5 s, 7.5 s.
        let mut handle = Synthetic::handle(100, 100, None, true);
        let policy = SamplingPolicy::EvenlySpaced { count: 4 };
        let frames = sample_frames(&mut handle, policy, &VideoConfig::default()).unwrap();
        assert_eq!(indices(&frames), vec![0, 25, 50, 75]);
    }

    #[test]
    fn test_duration_only_queried_for_spaced_sampling() {
        let (mut handle, queries) = Synthetic::counted(100, 10, None, true);
        sample_frames(&mut handle, SamplingPolicy::default(), &VideoConfig::default()).unwrap();
        assert_eq!(queries.get(), 0);

        let (mut handle, queries) = Synthetic::counted(100, 10, None, true);
        let policy = SamplingPolicy::EvenlySpaced { count: 4 };
        sample_frames(&mut handle, policy, &VideoConfig::default()).unwrap();
        assert_eq!(queries.get(), 1);
    }

    #[test]
    fn test_evenly_spaced_without_duration_falls_back() {
        let mut handle = Synthetic::handle(70, 10, None, false);
        let policy = SamplingPolicy::EvenlySpaced { count: 10 };
        let frames = sample_frames(&mut handle, policy, &VideoConfig::default()).unwrap();
        assert_eq!(indices(&frames), vec![0, 30, 60]);
    }

    #[test]
    fn test_mid_stream_error_truncates() {
        let mut handle = Synthetic::handle(100, 10, Some(45), true);
        let frames = sample_frames(&mut handle, SamplingPolicy::default(), &VideoConfig::default()).unwrap();
        assert_eq!(indices(&frames), vec![0, 30]);
    }

    #[test]
    fn test_error_before_first_frame_fails() {
        let mut handle = Synthetic::handle(100, 10, Some(0), true);
        let err = sample_frames(&mut handle, SamplingPolicy::default(), &VideoConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_empty_stream() {
        let mut handle = Synthetic::handle(0, 10, None, true);
        let err = sample_frames(&mut handle, SamplingPolicy::default(), &VideoConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResult);
    }

    #[test]
    fn test_oversized_frames_rejected() {
        let limits = VideoConfig { max_frame_pixels: 8, ..VideoConfig::default() };
        let mut handle = Synthetic::handle(10, 10, None, true);
        let err = sample_frames(&mut handle, SamplingPolicy::default(), &limits).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceLimit);
    }
}
