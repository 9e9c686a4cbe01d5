//! # Quality Scorer
//!
//! Scores a single raster on three independent axes and folds them into one
//! `overall` value. All arithmetic runs sequentially over the analysis raster
//! with integer accumulators where possible, so the same input always yields
//! bit-identical scores regardless of thread scheduling.
//!
//! ## Analysis Raster
//!
//! The image is reduced to BT.601 luma and, if its longest side exceeds
//! [`ANALYSIS_LONG_SIDE`], box-filtered down to that size. Comparing images of
//! different resolution therefore compares them at (roughly) the same scale.
//!
//! ## Metrics
//!
//! - **Sharpness**: population variance of the 4-neighbour Laplacian over
//!   interior pixels. `≥ 0`, unbounded, higher is sharper.
//! - **Exposure**: `(1 − 2·|mean − 0.5|) · (1 − clipped)` where `mean` is the
//!   normalised mean luma and `clipped` the fraction of pixels at or below
//!   [`CLIP_LOW`] or at or above [`CLIP_HIGH`]. In `[0, 1]`, 1 is ideal; all-black
//!   and all-white rasters score 0.
//! - **Noise**: Immerkær's σ estimate, `√(π/2) / 6 · mean |I ∗ N|` with
//!   `N = [1 −2 1; −2 4 −2; 1 −2 1]`, taken over pixels whose Sobel gradient
//!   magnitude is below [`EDGE_THRESHOLD`] so genuine edges do not count as
//!   noise. When fewer than 1/16 of the pixels are smooth, all are used.
//!
//! ## Combination
//!
//! ```text
//! overall = 0.5 · s / (s + 300) + 0.3 · exposure − 0.2 · n / (n + 5)
//! ```
//!
//! Each term is a saturating, strictly monotonic map, so raising sharpness or
//! exposure strictly raises `overall` and raising noise strictly lowers it.
//! `overall` lies in `(−0.2, 0.8)`.

use fast_image_resize::Resizer;
use media_scale::cpu::{Filter, Layout, scale_cpu};
use media_scale::plan::fit_long_side;
use serde::Serialize;

use crate::core::PixelBuffer;
use crate::error::{EngineError, EngineResult};

/// Smallest side the 3×3 filters can run on.
pub const MIN_SIDE: u32 = 3;
/// Longest side of the raster the metrics are computed on.
pub const ANALYSIS_LONG_SIDE: u32 = 512;
pub const CLIP_LOW: u8 = 5;
pub const CLIP_HIGH: u8 = 250;
/// Sobel magnitude separating edges from smooth regions.
pub const EDGE_THRESHOLD: i64 = 48;

const SHARPNESS_HALF: f64 = 300.0;
const NOISE_HALF: f64 = 5.0;
const W_SHARPNESS: f64 = 0.5;
const W_EXPOSURE: f64 = 0.3;
const W_NOISE: f64 = 0.2;

/// Composite quality metric for one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityScore {
    pub sharpness: f64,
    pub exposure: f64,
    pub noise: f64,
    pub overall: f64,
}

/// Fold the three metrics into `overall`.
pub fn combine(sharpness: f64, exposure: f64, noise: f64) -> f64 {
    W_SHARPNESS * sharpness / (sharpness + SHARPNESS_HALF) + W_EXPOSURE * exposure
        - W_NOISE * noise / (noise + NOISE_HALF)
}

/// Scores rasters, reusing one resizer for the analysis downscale.
pub struct QualityScorer {
    resizer: Resizer,
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityScorer {
    pub fn new() -> Self {
        Self { resizer: Resizer::new() }
    }

    /// Score one raster. Fails with `ScoringError` if either side is below
    /// [`MIN_SIDE`].
    pub fn score(&mut self, buffer: &PixelBuffer) -> EngineResult<QualityScore> {
        let (w, h) = (buffer.width(), buffer.height());
        if w < MIN_SIDE || h < MIN_SIDE {
            return Err(EngineError::scoring(format!(
                "{}x{} image is too small to filter (minimum {}x{})",
                w, h, MIN_SIDE, MIN_SIDE
            )));
        }

        let luma = buffer.to_luma();
        let plan = fit_long_side(buffer.size(), ANALYSIS_LONG_SIDE);
        // Extreme aspect ratios would collapse the short side; analyse those as-is.
        let (luma, w, h) = if plan.is_identity() || plan.out.w < MIN_SIDE || plan.out.h < MIN_SIDE {
            (luma, w, h)
        } else {
            let small = scale_cpu(&mut self.resizer, &luma, &plan, Layout::Gray, Filter::Box)?;
            (small, plan.out.w, plan.out.h)
        };

        let raster = Luma { data: &luma, w: w as usize, h: h as usize };
        let sharpness = raster.laplacian_variance();
        let exposure = raster.exposure();
        let noise = raster.noise_sigma();
        let overall = combine(sharpness, exposure, noise);

        if !overall.is_finite() {
            return Err(EngineError::scoring("score is not a finite number"));
        }
        Ok(QualityScore { sharpness, exposure, noise, overall })
    }
}

struct Luma<'a> {
    data: &'a [u8],
    w: usize,
    h: usize,
}

impl Luma<'_> {
    #[inline]
    fn at(&self, x: usize, y: usize) -> i64 {
        i64::from(self.data[y * self.w + x])
    }

    fn interior(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (1..self.h - 1).flat_map(move |y| (1..self.w - 1).map(move |x| (x, y)))
    }

    fn laplacian_variance(&self) -> f64 {
        let (mut sum, mut sum_sq, mut n) = (0i64, 0i64, 0i64);
        for (x, y) in self.interior() {
            let l = self.at(x, y - 1) + self.at(x, y + 1) + self.at(x - 1, y) + self.at(x + 1, y)
                - 4 * self.at(x, y);
            sum += l;
            sum_sq += l * l;
            n += 1;
        }
        let n = n as f64;
        let mean = sum as f64 / n;
        (sum_sq as f64 / n - mean * mean).max(0.0)
    }

    fn exposure(&self) -> f64 {
        let total: u64 = self.data.iter().map(|&v| u64::from(v)).sum();
        let clipped = self
            .data
            .iter()
            .filter(|&&v| v <= CLIP_LOW || v >= CLIP_HIGH)
            .count();
        let n = self.data.len() as f64;
        let mean = total as f64 / n / 255.0;
        let clipped = clipped as f64 / n;
        ((1.0 - 2.0 * (mean - 0.5).abs()) * (1.0 - clipped)).clamp(0.0, 1.0)
    }

    fn noise_sigma(&self) -> f64 {
        let threshold_sq = EDGE_THRESHOLD * EDGE_THRESHOLD;
        let (mut smooth_sum, mut smooth_n) = (0i64, 0i64);
        let (mut all_sum, mut all_n) = (0i64, 0i64);

        for (x, y) in self.interior() {
            let p = |dx: isize, dy: isize| {
                self.at((x as isize + dx) as usize, (y as isize + dy) as usize)
            };
            let response = (p(-1, -1) + p(1, -1) + p(-1, 1) + p(1, 1))
                - 2 * (p(0, -1) + p(-1, 0) + p(1, 0) + p(0, 1))
                + 4 * p(0, 0);
            let gx = (p(1, -1) + 2 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2 * p(-1, 0) + p(-1, 1));
            let gy = (p(-1, 1) + 2 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2 * p(0, -1) + p(1, -1));

            let magnitude = response.abs();
            all_sum += magnitude;
            all_n += 1;
            if gx * gx + gy * gy < threshold_sq {
                smooth_sum += magnitude;
                smooth_n += 1;
            }
        }

        let (sum, n) = if smooth_n * 16 >= all_n { (smooth_sum, smooth_n) } else { (all_sum, all_n) };
        (std::f64::consts::PI / 2.0).sqrt() * sum as f64 / (6.0 * n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(w: u32, h: u32, f: impl Fn(u32, u32) -> u8) -> PixelBuffer {
        let data = (0..h).flat_map(|y| (0..w).map(move |x| (x, y))).map(|(x, y)| f(x, y)).collect();
        PixelBuffer::new(w, h, Layout::Gray, data).unwrap()
    }

    #[test]
    fn test_flat_mid_gray() {
        let score = QualityScorer::new().score(&gray(16, 16, |_, _| 128)).unwrap();
        assert_eq!(score.sharpness, 0.0);
        assert_eq!(score.noise, 0.0);
        assert!(score.exposure > 0.99);
    }

    #[test]
    fn test_black_and_white_have_zero_exposure() {
        let mut scorer = QualityScorer::new();
        assert_eq!(scorer.score(&gray(8, 8, |_, _| 0)).unwrap().exposure, 0.0);
        assert_eq!(scorer.score(&gray(8, 8, |_, _| 255)).unwrap().exposure, 0.0);
    }

    #[test]
    fn test_edges_are_not_noise() {
        let checker = gray(64, 64, |x, y| if (x / 8 + y / 8) % 2 == 0 { 64 } else { 192 });
        let score = QualityScorer::new().score(&checker).unwrap();
        assert!(score.sharpness > 1000.0);
        assert_eq!(score.noise, 0.0);
    }

    #[test]
    fn test_degenerate_dimensions() {
        let err = QualityScorer::new().score(&gray(2, 50, |_, _| 100)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Scoring);
    }

    #[test]
    fn test_combine_is_monotonic() {
        let base = combine(100.0, 0.5, 2.0);
        assert!(combine(200.0, 0.5, 2.0) > base);
        assert!(combine(100.0, 0.6, 2.0) > base);
        assert!(combine(100.0, 0.5, 3.0) < base);
    }

    #[test]
    fn test_large_images_are_downscaled_for_analysis() {
        let big = gray(2048, 1024, |x, y| ((x ^ y) & 0xFF) as u8);
        let mut scorer = QualityScorer::new();
        let a = scorer.score(&big).unwrap();
        let b = scorer.score(&big).unwrap();
        assert_eq!(a, b);
    }
}
