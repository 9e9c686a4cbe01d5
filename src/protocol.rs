//! JSON envelope for the four engine operations.
//!
//! A request is an object tagged by `op`:
//!
//! ```json
//! {"op": "upscale_image", "image": "data:image/png;base64,...", "scale": 4}
//! ```
//!
//! The response is the operation's payload on success, or
//! `{"error": "<message>", "kind": "<ErrorKind>"}` on failure. No other shape
//! ever reaches the caller.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    FindBestImage {
        images: Vec<String>,
    },
    ExtractFramesFromVideo {
        video: String,
        #[serde(default)]
        filename: String,
    },
    UpscaleImage {
        image: String,
        scale: i64,
    },
    SplitImage {
        image: String,
        rows: i64,
        cols: i64,
    },
}

impl Request {
    pub fn op(&self) -> &'static str {
        match self {
            Request::FindBestImage { .. } => "find_best_image",
            Request::ExtractFramesFromVideo { .. } => "extract_frames_from_video",
            Request::UpscaleImage { .. } => "upscale_image",
            Request::SplitImage { .. } => "split_image",
        }
    }
}

/// Render an error as the wire envelope.
pub fn error_envelope(err: &EngineError) -> Value {
    json!({ "error": err.to_string(), "kind": err.kind().name() })
}

/// Run one decoded request.
pub fn dispatch(engine: &Engine, request: Request) -> Value {
    match run(engine, request) {
        Ok(value) => value,
        Err(err) => error_envelope(&err),
    }
}

fn run(engine: &Engine, request: Request) -> EngineResult<Value> {
    let value = match request {
        Request::FindBestImage { images } => to_value(engine.find_best_image(&images)?)?,
        Request::ExtractFramesFromVideo { video, filename } => {
            to_value(engine.extract_frames_from_video(&video, &filename)?)?
        }
        Request::UpscaleImage { image, scale } => Value::String(engine.upscale_image(&image, scale)?),
        Request::SplitImage { image, rows, cols } => to_value(engine.split_image(&image, rows, cols)?)?,
    };
    Ok(value)
}

fn to_value<T: serde::Serialize>(payload: T) -> EngineResult<Value> {
    serde_json::to_value(payload).map_err(|e| EngineError::internal("failed to serialise response").with_source(e))
}

/// Parse a request from a [`Value`] and run it.
pub fn handle_value(engine: &Engine, request: Value) -> Value {
    match serde_json::from_value::<Request>(request) {
        Ok(request) => dispatch(engine, request),
        Err(e) => error_envelope(&EngineError::invalid_argument(format!("malformed request: {}", e))),
    }
}

/// Parse one JSON request line and run it.
pub fn handle_json(engine: &Engine, line: &str) -> Value {
    match serde_json::from_str::<Value>(line) {
        Ok(value) => handle_value(engine, value),
        Err(e) => error_envelope(&EngineError::invalid_argument(format!("malformed request: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_tags() {
        let request: Request =
            serde_json::from_str(r#"{"op":"split_image","image":"x","rows":2,"cols":3}"#).unwrap();
        assert_eq!(request.op(), "split_image");
        let request: Request = serde_json::from_str(r#"{"op":"extract_frames_from_video","video":"x"}"#).unwrap();
        assert!(matches!(request, Request::ExtractFramesFromVideo { ref filename, .. } if filename.is_empty()));
    }

    #[test]
    fn test_malformed_requests() {
        let engine = Engine::default();
        for line in ["{", r#"{"op":"rotate_image"}"#, r#"{"op":"upscale_image","image":"x"}"#] {
            let response = handle_json(&engine, line);
            assert_eq!(response["kind"], "InvalidArgumentError", "{}", line);
            assert!(response["error"].as_str().unwrap().contains("malformed request"));
        }
    }

    #[test]
    fn test_error_envelope_shape() {
        let engine = Engine::default();
        let response = handle_json(&engine, r#"{"op":"find_best_image","images":["a"]}"#);
        let obj = response.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["kind"], "InvalidArgumentError");
    }
}
