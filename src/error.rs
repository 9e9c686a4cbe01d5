//! # Engine Error Handling
//!
//! Every failure the engine can produce is an [`EngineError`]: a closed
//! [`ErrorKind`] plus a human-readable message and an [`ErrorContext`] with the
//! operation, the batch item (if any), a recovery suggestion and free-form
//! metadata.
//!
//! ## Error Kinds
//!
//! | Kind | Wire name | Raised when |
//! |------|-----------|-------------|
//! | `Decode` | `DecodeError` | media is malformed, unsupported or mislabelled |
//! | `InvalidArgument` | `InvalidArgumentError` | scale/rows/cols out of range, batch too small |
//! | `InsufficientInput` | `InsufficientInputError` | too many per-item failures to proceed |
//! | `EmptyResult` | `EmptyResultError` | an operation produced nothing usable |
//! | `ResourceLimit` | `ResourceLimitError` | a configured cap was exceeded |
//! | `Scoring` | `ScoringError` | the quality scorer got a degenerate raster |
//! | `Internal` | `InternalError` | an encoder or worker failed unexpectedly |
//!
//! Library errors (`image`, `base64`, `media-scale`) are converted at the
//! boundary through `From` impls so that none escapes verbatim.
//!
//! ## Usage
//!
//! ```rust
//! use media_engine::error::{EngineError, ErrorKind};
//!
//! let error = EngineError::invalid_argument("scale must be between 2 and 8, got 9")
//!     .with_operation("upscale_image")
//!     .with_recovery_suggestion("pick a factor from 2 to 8");
//!
//! assert_eq!(error.kind(), ErrorKind::InvalidArgument);
//! assert_eq!(error.kind().name(), "InvalidArgumentError");
//! ```

use std::{collections::BTreeMap, error::Error as StdError, fmt};

/// Closed set of failure categories surfaced at the engine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Decode,
    InvalidArgument,
    InsufficientInput,
    EmptyResult,
    ResourceLimit,
    Scoring,
    Internal,
}

impl ErrorKind {
    /// Stable name used in response envelopes.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Decode => "DecodeError",
            ErrorKind::InvalidArgument => "InvalidArgumentError",
            ErrorKind::InsufficientInput => "InsufficientInputError",
            ErrorKind::EmptyResult => "EmptyResultError",
            ErrorKind::ResourceLimit => "ResourceLimitError",
            ErrorKind::Scoring => "ScoringError",
            ErrorKind::Internal => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metadata about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The façade operation being performed
    pub operation: Option<String>,
    /// Position of the offending item inside a batch request
    pub item: Option<usize>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Additional metadata as key-value pairs
    pub metadata: BTreeMap<String, String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_item(mut self, index: usize) -> Self {
        self.item = Some(index);
        self
    }

    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.recovery_suggestion = Some(suggestion.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Error type returned by every engine operation.
#[derive(Debug)]
pub struct EngineError {
    kind: ErrorKind,
    message: String,
    context: ErrorContext,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

/// Result alias used throughout the crate.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn insufficient_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientInput, message)
    }

    pub fn empty_result(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyResult, message)
    }

    /// A configured cap was exceeded; `limit` names the config field.
    pub fn resource_limit(limit: &str, requested: u64, allowed: u64) -> Self {
        Self::new(
            ErrorKind::ResourceLimit,
            format!("{} exceeded: requested {}, allowed {}", limit, requested, allowed),
        )
        .with_metadata("limit", limit)
    }

    pub fn scoring(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Scoring, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attach the underlying library error.
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context = self.context.with_operation(operation);
        self
    }

    pub fn with_item(mut self, index: usize) -> Self {
        self.context = self.context.with_item(index);
        self
    }

    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context = self.context.with_recovery_suggestion(suggestion);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context = self.context.with_metadata(key, value);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    pub fn recovery_suggestion(&self) -> Option<&str> {
        self.context.recovery_suggestion.as_deref()
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(op) = &self.context.operation {
            write!(f, "{} failed: ", op)?;
        }
        if let Some(item) = self.context.item {
            write!(f, "item {}: ", item)?;
        }
        write!(f, "{}", self.message)
    }
}

impl StdError for EngineError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<image::ImageError> for EngineError {
    fn from(err: image::ImageError) -> Self {
        use image::ImageError;
        let kind = match &err {
            ImageError::Limits(_) => ErrorKind::ResourceLimit,
            ImageError::Encoding(_) | ImageError::Parameter(_) => ErrorKind::Internal,
            _ => ErrorKind::Decode,
        };
        EngineError::new(kind, err.to_string()).with_source(err)
    }
}

impl From<base64::DecodeError> for EngineError {
    fn from(err: base64::DecodeError) -> Self {
        EngineError::decode(format!("payload is not valid base64: {}", err)).with_source(err)
    }
}

impl From<media_scale::cpu::ScaleError> for EngineError {
    fn from(err: media_scale::cpu::ScaleError) -> Self {
        EngineError::internal(format!("resampling failed: {}", err)).with_source(err)
    }
}

impl From<media_scale::grid::GridError> for EngineError {
    fn from(err: media_scale::grid::GridError) -> Self {
        use media_scale::grid::GridError;
        let kind = match err {
            GridError::EmptyGrid { .. } | GridError::TooFine { .. } => ErrorKind::InvalidArgument,
            GridError::OutOfBounds { .. } => ErrorKind::Internal,
        };
        EngineError::new(kind, err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = EngineError::decode("not an image");
        assert_eq!(error.kind(), ErrorKind::Decode);
        assert_eq!(error.kind().name(), "DecodeError");
        assert_eq!(error.to_string(), "not an image");
    }

    #[test]
    fn test_error_with_context() {
        let error = EngineError::scoring("too small to filter")
            .with_operation("find_best_image")
            .with_item(3)
            .with_recovery_suggestion("submit images at least 3x3 pixels");

        assert_eq!(error.context().item, Some(3));
        assert_eq!(
            error.to_string(),
            "find_best_image failed: item 3: too small to filter"
        );
        assert_eq!(
            error.recovery_suggestion(),
            Some("submit images at least 3x3 pixels")
        );
    }

    #[test]
    fn test_resource_limit_names_the_cap() {
        let error = EngineError::resource_limit("split.max_tiles", 2048, 1024);
        assert_eq!(error.kind(), ErrorKind::ResourceLimit);
        assert_eq!(
            error.context().metadata.get("limit").map(String::as_str),
            Some("split.max_tiles")
        );
        assert!(error.message().contains("2048"));
    }

    #[test]
    fn test_grid_errors_map_to_invalid_argument() {
        let err: EngineError = media_scale::grid::split_rects(4, 4, 0, 1).unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_base64_errors_map_to_decode() {
        use base64::Engine as _;
        let raw = base64::engine::general_purpose::STANDARD.decode("***").unwrap_err();
        let err: EngineError = raw.into();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
