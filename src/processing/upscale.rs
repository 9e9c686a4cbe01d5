//! # Upscaler
//!
//! Integer-factor resampling through `media-scale`. The output is always
//! exactly `width × scale` by `height × scale`; the kernel (Lanczos3 unless
//! configured otherwise) is fixed per engine, so results depend only on the
//! input raster and the factor.

use fast_image_resize::Resizer;
use media_scale::cpu::scale_cpu;
use media_scale::plan::upscale_plan;

use crate::config::UpscaleConfig;
use crate::core::PixelBuffer;
use crate::error::{EngineError, EngineResult};

pub const MIN_SCALE: u32 = 2;
pub const MAX_SCALE: u32 = 8;

/// Check a caller-supplied factor against `[MIN_SCALE, MAX_SCALE]`.
pub fn validate_scale(scale: i64) -> EngineResult<u32> {
    if !(i64::from(MIN_SCALE)..=i64::from(MAX_SCALE)).contains(&scale) {
        return Err(EngineError::invalid_argument(format!(
            "scale must be between {} and {}, got {}",
            MIN_SCALE, MAX_SCALE, scale
        )));
    }
    Ok(scale as u32)
}

/// Upscale `buffer` by `scale`, refusing outputs beyond the pixel budget.
pub fn upscale(buffer: &PixelBuffer, scale: u32, config: &UpscaleConfig) -> EngineResult<PixelBuffer> {
    validate_scale(i64::from(scale))?;

    let plan = upscale_plan(buffer.size(), scale).ok_or_else(|| {
        EngineError::resource_limit("upscale.max_output_pixels", u64::MAX, config.max_output_pixels)
    })?;
    let out_pixels = plan.out.pixels();
    if out_pixels > config.max_output_pixels {
        return Err(EngineError::resource_limit(
            "upscale.max_output_pixels",
            out_pixels,
            config.max_output_pixels,
        )
        .with_recovery_suggestion("use a smaller factor or a smaller source image"));
    }

    let mut resizer = Resizer::new();
    let data = scale_cpu(&mut resizer, buffer.data(), &plan, buffer.layout(), config.filter)?;
    PixelBuffer::new(plan.out.w, plan.out.h, buffer.layout(), data)
}
