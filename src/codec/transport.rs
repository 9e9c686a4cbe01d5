//! Transport encoding: data URLs and bare base64.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

use super::{Container, MediaKind};
use crate::error::{EngineError, EngineResult};

/// Encoded media bytes plus the kind the caller declared for them.
///
/// Immutable once built; cloning copies the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBlob {
    kind: MediaKind,
    bytes: Vec<u8>,
    mime: Option<String>,
}

impl MediaBlob {
    pub fn new(kind: MediaKind, bytes: Vec<u8>) -> Self {
        Self { kind, bytes, mime: None }
    }

    /// Attach the MIME type the blob should be advertised with.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Decode a transport payload: either `data:<mime>;base64,<payload>` or a
    /// bare base64 string. Padding is optional and ASCII whitespace is ignored.
    ///
    /// `max_bytes` bounds the decoded size; it is first checked against the
    /// number of base64 symbols, ignoring whitespace and padding, before
    /// anything is allocated.
    pub fn from_transport(kind: MediaKind, payload: &str, max_bytes: u64) -> EngineResult<Self> {
        let (mime, body) = match payload.split_once(',') {
            Some((header, body)) => (parse_data_url_header(header), body),
            None => (None, payload),
        };

        let limit = format!("{}.max_input_bytes", kind.config_section());
        let symbols = body
            .bytes()
            .filter(|b| !b.is_ascii_whitespace() && *b != b'=')
            .count() as u64;
        let estimated = symbols * 3 / 4;
        if estimated > max_bytes {
            return Err(EngineError::resource_limit(&limit, estimated, max_bytes));
        }

        let cleaned: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        if cleaned.is_empty() {
            return Err(EngineError::decode("payload is empty"));
        }
        let bytes = if cleaned.len() % 4 == 0 {
            STANDARD.decode(cleaned.as_bytes())?
        } else {
            STANDARD_NO_PAD.decode(cleaned.trim_end_matches('=').as_bytes())?
        };
        if bytes.len() as u64 > max_bytes {
            return Err(EngineError::resource_limit(
                &limit,
                bytes.len() as u64,
                max_bytes,
            ));
        }

        Ok(Self { kind, bytes, mime })
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MIME type from the data URL header, if there was one.
    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    /// Container sniffed from the content.
    pub fn container(&self) -> Option<Container> {
        Container::sniff(&self.bytes, self.kind)
    }

    /// Self-describing text encoding: `data:<mime>;base64,<payload>`.
    pub fn to_data_url(&self) -> String {
        let mime = self
            .mime
            .clone()
            .or_else(|| match self.container() {
                Some(Container::Image(format)) => Some(format.to_mime_type().to_string()),
                _ => None,
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());
        format!("data:{};base64,{}", mime, STANDARD.encode(&self.bytes))
    }
}

/// Pull the MIME type out of `data:<mime>[;param]*;base64`.
fn parse_data_url_header(header: &str) -> Option<String> {
    let rest = header.strip_prefix("data:")?;
    let mime = rest.split(';').next()?.trim();
    (!mime.is_empty()).then(|| mime.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_prefix_is_stripped() {
        let blob =
            MediaBlob::from_transport(MediaKind::Image, "data:image/png;base64,aGVsbG8=", 1024)
                .unwrap();
        assert_eq!(blob.bytes(), b"hello");
        assert_eq!(blob.mime(), Some("image/png"));
    }

    #[test]
    fn test_bare_base64_without_padding() {
        let blob = MediaBlob::from_transport(MediaKind::Video, "aGVsbG8", 1024).unwrap();
        assert_eq!(blob.bytes(), b"hello");
        assert_eq!(blob.mime(), None);
    }

    #[test]
    fn test_whitespace_is_ignored() {
        let blob = MediaBlob::from_transport(MediaKind::Image, "aGVs\nbG8=\n", 1024).unwrap();
        assert_eq!(blob.bytes(), b"hello");
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        let err = MediaBlob::from_transport(MediaKind::Image, "data:image/png;base64,@@@@", 1024)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Decode);

        let err = MediaBlob::from_transport(MediaKind::Image, "", 1024).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Decode);
    }

    #[test]
    fn test_size_cap() {
        let err = MediaBlob::from_transport(MediaKind::Image, &"A".repeat(4000), 100).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ResourceLimit);
        assert_eq!(err.context().metadata["limit"], "image.max_input_bytes");

        let err = MediaBlob::from_transport(MediaKind::Video, &"A".repeat(4000), 100).unwrap_err();
        assert_eq!(err.context().metadata["limit"], "video.max_input_bytes");
    }

    #[test]
    fn test_wrapped_payload_at_the_cap() {
        let bytes: Vec<u8> = (0..1708u32).map(|i| (i * 7 % 256) as u8).collect();
        let encoded = STANDARD.encode(&bytes);
        let wrapped = encoded
            .as_bytes()
            .chunks(4)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n");

        let blob = MediaBlob::from_transport(MediaKind::Image, &wrapped, 1708).unwrap();
        assert_eq!(blob.bytes(), bytes.as_slice());

        let err = MediaBlob::from_transport(MediaKind::Image, &wrapped, 1707).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ResourceLimit);
    }

    #[test]
    fn test_data_url_round_trip() {
        let blob = MediaBlob::new(MediaKind::Image, b"hello".to_vec()).with_mime("image/png");
        let url = blob.to_data_url();
        assert_eq!(url, "data:image/png;base64,aGVsbG8=");
        let back = MediaBlob::from_transport(MediaKind::Image, &url, 1024).unwrap();
        assert_eq!(back, blob);
    }
}
