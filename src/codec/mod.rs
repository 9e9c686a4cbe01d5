//! # Codec Adapter
//!
//! Converts between transport payloads, encoded containers and
//! [`PixelBuffer`](crate::core::PixelBuffer)s.
//!
//! ## Architecture
//!
//! ```text
//!  data URL / base64 ──▶ MediaBlob ──sniff──▶ Container::Image ──▶ decode_image ──▶ PixelBuffer
//!                                   │
//!                                   └──────▶ Container::Video ──▶ open_video ──▶ VideoHandle
//!                                                                                  │
//!  data URL ◀── MediaBlob ◀── encode_image ◀── PixelBuffer ◀── read_next_frame ◀──┘
//! ```
//!
//! The container is sniffed from magic bytes once, when a blob is decoded; the
//! declared [`MediaKind`] must agree with it or the blob is rejected with a
//! `DecodeError`.
//!
//! ## Video Backends
//!
//! - **Animated GIF**: always available, decoded with the `image` crate
//! - **GStreamer** (`gstreamer` feature): MP4/MOV, Matroska/WebM, AVI, MPEG-TS/PS,
//!   FLV, Ogg and ASF through `decodebin`

pub mod gif;
#[cfg(feature = "gstreamer")]
pub mod gstreamer;
pub mod image;
pub mod transport;
pub mod video;

pub use self::image::{decode_image, encode_image};
pub use transport::MediaBlob;
pub use video::{VideoHandle, VideoInfo, VideoSource, open_video};

use ::image::ImageFormat;

/// Declared kind of a submitted payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Config section holding this kind's limits.
    pub fn config_section(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Video containers recognised by magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoContainer {
    Gif,
    /// ISO base media (MP4, MOV, 3GP, M4V)
    Mp4,
    /// Matroska and WebM
    Matroska,
    Avi,
    MpegTs,
    MpegPs,
    Flv,
    Ogg,
    Asf,
}

impl VideoContainer {
    pub fn name(self) -> &'static str {
        match self {
            VideoContainer::Gif => "gif",
            VideoContainer::Mp4 => "mp4",
            VideoContainer::Matroska => "matroska",
            VideoContainer::Avi => "avi",
            VideoContainer::MpegTs => "mpeg-ts",
            VideoContainer::MpegPs => "mpeg-ps",
            VideoContainer::Flv => "flv",
            VideoContainer::Ogg => "ogg",
            VideoContainer::Asf => "asf",
        }
    }

    /// Identify a video container from its leading bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        let at = |offset: usize, magic: &[u8]| bytes.get(offset..offset + magic.len()) == Some(magic);

        if at(0, b"GIF87a") || at(0, b"GIF89a") {
            Some(VideoContainer::Gif)
        } else if at(4, b"ftyp") || at(4, b"moov") || at(4, b"mdat") || at(4, b"wide") {
            Some(VideoContainer::Mp4)
        } else if at(0, &[0x1A, 0x45, 0xDF, 0xA3]) {
            Some(VideoContainer::Matroska)
        } else if at(0, b"RIFF") && at(8, b"AVI ") {
            Some(VideoContainer::Avi)
        } else if at(0, &[0x47]) && at(188, &[0x47]) {
            Some(VideoContainer::MpegTs)
        } else if at(0, &[0x00, 0x00, 0x01, 0xBA]) {
            Some(VideoContainer::MpegPs)
        } else if at(0, b"FLV") {
            Some(VideoContainer::Flv)
        } else if at(0, b"OggS") {
            Some(VideoContainer::Ogg)
        } else if at(0, &[0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11]) {
            Some(VideoContainer::Asf)
        } else {
            None
        }
    }
}

/// Container resolved from content, independent of the declared kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Image(ImageFormat),
    Video(VideoContainer),
}

impl Container {
    /// Sniff the container from magic bytes.
    ///
    /// GIF is reported as a still image when `declared` is [`MediaKind::Image`]
    /// and as an animation otherwise; every other format has one reading.
    pub fn sniff(bytes: &[u8], declared: MediaKind) -> Option<Self> {
        match VideoContainer::from_magic(bytes) {
            Some(VideoContainer::Gif) if declared == MediaKind::Image => {
                Some(Container::Image(ImageFormat::Gif))
            }
            Some(video) => Some(Container::Video(video)),
            None => ::image::guess_format(bytes).ok().map(Container::Image),
        }
    }
}
