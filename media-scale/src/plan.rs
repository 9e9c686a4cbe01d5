// SPDX-License-Identifier: MIT
//! # Scale Plans
//!
//! Output-size computation for the two resampling jobs the engine performs:
//! integer-factor upscaling (exact `w×k`, `h×k`, never clamped or cropped) and
//! shrinking a raster so its longest side fits an analysis window.
//!
//! Plans are computed before any pixel is touched so that callers can check
//! the output against a pixel budget and refuse oversized work up front.

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    /// Total pixel count, computed in 64 bits so it cannot overflow.
    pub fn pixels(&self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }
}

/// Source and destination dimensions for a single resampling pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalePlan {
    /// Original input dimensions
    pub input: Size,
    /// Final computed output dimensions
    pub out: Size,
}

impl ScalePlan {
    /// True when the plan maps the input onto itself.
    pub fn is_identity(&self) -> bool {
        self.input == self.out
    }
}

/// Plan an upscale by an integer `factor`.
///
/// Returns `None` when `factor` is zero or when either output side would not
/// fit in a `u32`.
pub fn upscale_plan(input: Size, factor: u32) -> Option<ScalePlan> {
    if factor == 0 {
        return None;
    }
    let out = Size {
        w: input.w.checked_mul(factor)?,
        h: input.h.checked_mul(factor)?,
    };
    Some(ScalePlan { input, out })
}

/// Plan a shrink so the longest side is at most `max_long`, preserving aspect
/// ratio. Never upscales: an input already within bounds yields an identity plan.
pub fn fit_long_side(input: Size, max_long: u32) -> ScalePlan {
    let (w, h) = (f64::from(input.w), f64::from(input.h));
    let long = w.max(h);
    let s = (f64::from(max_long) / long).min(1.0);
    ScalePlan {
        input,
        out: Size {
            w: ((w * s).round() as u32).max(1),
            h: ((h * s).round() as u32).max(1),
        },
    }
}
