//! # GStreamer Backend
//!
//! Decodes container video with a GStreamer pipeline:
//!
//! ```text
//! filesrc (spooled blob) ! decodebin ! videoconvert
//!     ! video/x-raw,format=RGBA ! appsink (sync=false)
//! ```
//!
//! The blob is spooled to a temporary file so demuxers can seek;
//! MP4s with the `moov` atom after `mdat` need this. `decodebin` exposes its
//! video pad dynamically, so the link to `videoconvert` is made from a
//! `pad-added` callback. The pipeline is prerolled in `Paused` to learn the
//! frame size and duration, then set to `Playing` and pulled frame by frame.
//! Every wait is bounded by `video.frame_timeout_ms`. Dropping the source sets
//! the pipeline to `Null` and then deletes the spool file, on every exit path.

use std::io::Write;
use std::time::Duration;

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::VideoContainer;
use super::video::{VideoInfo, VideoSource, check_frame_size};
use crate::config::VideoConfig;
use crate::core::{Layout, PixelBuffer};
use crate::error::{EngineError, EngineResult, ErrorKind};

pub struct GstSource {
    pipeline: gst::Pipeline,
    appsink: gst_app::AppSink,
    info: VideoInfo,
    timeout: gst::ClockTime,
    limits: VideoConfig,
    // Deleted only after `Drop` has stopped the pipeline.
    _spool: NamedTempFile,
}

fn element(name: &str) -> EngineResult<gst::Element> {
    gst::ElementFactory::make(name)
        .build()
        .map_err(|_| EngineError::decode(format!("missing GStreamer element: {}", name)))
}

fn gst_error(context: &str, err: impl std::fmt::Display) -> EngineError {
    EngineError::decode(format!("{}: {}", context, err))
}

fn spool(bytes: &[u8]) -> EngineResult<NamedTempFile> {
    let mut file = NamedTempFile::new()
        .map_err(|e| EngineError::internal("failed to create video spool file").with_source(e))?;
    file.write_all(bytes)
        .and_then(|()| file.flush())
        .map_err(|e| EngineError::internal("failed to write video spool file").with_source(e))?;
    Ok(file)
}

fn timeout_error(what: &str, limits: &VideoConfig) -> EngineError {
    EngineError::new(
        ErrorKind::ResourceLimit,
        format!("{} did not complete within {:?}", what, limits.frame_timeout()),
    )
    .with_metadata("limit", "video.frame_timeout_ms")
}

impl GstSource {
    pub fn open(bytes: &[u8], container: VideoContainer, limits: &VideoConfig) -> EngineResult<Self> {
        gst::init().map_err(|e| gst_error("GStreamer init failed", e))?;

        let spool = spool(bytes)?;
        let location = spool
            .path()
            .to_str()
            .ok_or_else(|| EngineError::internal("video spool path is not valid UTF-8"))?
            .to_string();

        let pipeline = gst::Pipeline::new();
        let filesrc = gst::ElementFactory::make("filesrc")
            .property("location", location.as_str())
            .build()
            .map_err(|_| EngineError::decode("missing GStreamer element: filesrc"))?;
        let decodebin = element("decodebin")?;
        let convert = element("videoconvert")?;
        let caps = gst::Caps::builder("video/x-raw").field("format", "RGBA").build();
        let appsink = gst_app::AppSink::builder().caps(&caps).sync(false).build();

        pipeline
            .add_many([&filesrc, &decodebin, &convert, appsink.upcast_ref()])
            .map_err(|e| gst_error("failed to assemble pipeline", e))?;
        filesrc
            .link(&decodebin)
            .map_err(|e| gst_error("failed to link filesrc", e))?;
        convert
            .link(&appsink)
            .map_err(|e| gst_error("failed to link appsink", e))?;

        let convert_weak = convert.downgrade();
        decodebin.connect_pad_added(move |_, src_pad| {
            let Some(convert) = convert_weak.upgrade() else { return };
            let Some(sink_pad) = convert.static_pad("sink") else { return };
            if sink_pad.is_linked() {
                return;
            }
            let is_video = src_pad
                .current_caps()
                .and_then(|caps| caps.structure(0).map(|s| s.name().as_str().starts_with("video/")))
                .unwrap_or(false);
            if is_video {
                if let Err(err) = src_pad.link(&sink_pad) {
                    warn!(?err, "failed to link decoded video pad");
                }
            }
        });

        // From here on the pipeline owns native state; `Drop` tears it down.
        let mut source = Self {
            pipeline,
            appsink,
            info: VideoInfo { container, width: 0, height: 0, duration: None },
            timeout: gst::ClockTime::from_nseconds(
                u64::try_from(limits.frame_timeout().as_nanos()).unwrap_or(u64::MAX),
            ),
            limits: limits.clone(),
            _spool: spool,
        };

        source
            .pipeline
            .set_state(gst::State::Paused)
            .map_err(|e| gst_error("failed to preroll pipeline", e))?;
        match source.pipeline.state(source.timeout) {
            (Ok(gst::StateChangeSuccess::Async), _, _) => {
                return Err(source
                    .bus_error()
                    .unwrap_or_else(|| timeout_error("stream preroll", limits)));
            }
            (Err(_), _, _) => {
                return Err(source.bus_error().unwrap_or_else(|| {
                    EngineError::decode(format!("could not open {} stream", container.name()))
                }));
            }
            _ => {}
        }

        let sample = source
            .appsink
            .try_pull_preroll(source.timeout)
            .ok_or_else(|| timeout_error("first video frame", limits))?;
        let caps = sample
            .caps()
            .ok_or_else(|| EngineError::decode("prerolled sample has no caps"))?;
        let vinfo = gst_video::VideoInfo::from_caps(caps)
            .map_err(|e| gst_error("unreadable frame format", e))?;
        source.info.width = vinfo.width();
        source.info.height = vinfo.height();
        source.info.duration = source
            .pipeline
            .query_duration::<gst::ClockTime>()
            .map(|d| Duration::from_nanos(d.nseconds()).min(limits.max_duration()));

        source
            .pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| gst_error("failed to start pipeline", e))?;
        debug!(container = container.name(), info = ?source.info, "GStreamer pipeline playing");
        Ok(source)
    }

    /// First error posted on the bus, if any.
    fn bus_error(&self) -> Option<EngineError> {
        let bus = self.pipeline.bus()?;
        let msg = bus.pop_filtered(&[gst::MessageType::Error])?;
        match msg.view() {
            gst::MessageView::Error(err) => Some(EngineError::decode(format!(
                "GStreamer error: {} ({})",
                err.error(),
                err.debug().map(|d| d.to_string()).unwrap_or_else(|| "no debug info".into())
            ))),
            _ => None,
        }
    }
}

impl VideoSource for GstSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn next_frame(&mut self) -> EngineResult<Option<(PixelBuffer, Duration)>> {
        let Some(sample) = self.appsink.try_pull_sample(self.timeout) else {
            if self.appsink.is_eos() {
                return Ok(None);
            }
            if let Some(err) = self.bus_error() {
                return Err(err);
            }
            return Err(timeout_error("frame decode", &self.limits));
        };

        let caps = sample
            .caps()
            .ok_or_else(|| EngineError::decode("decoded sample has no caps"))?;
        let vinfo = gst_video::VideoInfo::from_caps(caps)
            .map_err(|e| gst_error("unreadable frame format", e))?;
        let (w, h) = (vinfo.width(), vinfo.height());
        check_frame_size(w, h, &self.limits)?;

        let buffer = sample
            .buffer()
            .ok_or_else(|| EngineError::decode("decoded sample has no buffer"))?;
        let timestamp = buffer
            .pts()
            .map(|t| Duration::from_nanos(t.nseconds()))
            .unwrap_or_default();
        let map = buffer
            .map_readable()
            .map_err(|e| gst_error("cannot map frame buffer", e))?;

        // Compact strided rows into a tight RGBA buffer.
        let stride = vinfo.stride()[0] as usize;
        let row_bytes = w as usize * 4;
        let src = map.as_slice();
        let mut data = Vec::with_capacity(row_bytes * h as usize);
        for row in 0..h as usize {
            let off = row * stride;
            let line = src
                .get(off..off + row_bytes)
                .ok_or_else(|| EngineError::decode("frame buffer shorter than its caps"))?;
            data.extend_from_slice(line);
        }

        Ok(Some((PixelBuffer::new(w, h, Layout::Rgba, data)?, timestamp)))
    }
}

impl Drop for GstSource {
    fn drop(&mut self) {
        if let Err(err) = self.pipeline.set_state(gst::State::Null) {
            warn!(?err, "failed to shut down GStreamer pipeline");
        }
    }
}
