//! Frame sampling policies.

use serde::Deserialize;

/// Step used by the historical extractor: one frame in thirty, i.e. one per
/// second of 30 fps footage.
pub const DEFAULT_STEP: u32 = 30;

/// Rule governing which decoded frames of a video are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SamplingPolicy {
    /// Emit decoded frames `0, step, 2·step, …`.
    EveryNth { step: u32 },
    /// Emit `count` frames whose timestamps are the first at or after
    /// `k · duration / count` for `k = 0..count`. Streams of unknown duration
    /// fall back to `EveryNth { step: DEFAULT_STEP }`.
    EvenlySpaced { count: u32 },
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        SamplingPolicy::EveryNth { step: DEFAULT_STEP }
    }
}

impl SamplingPolicy {
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            SamplingPolicy::EveryNth { step: 0 } => {
                Err("sampling step must be greater than 0".to_string())
            }
            SamplingPolicy::EvenlySpaced { count: 0 } => {
                Err("sampling count must be greater than 0".to_string())
            }
            _ => Ok(()),
        }
    }
}
