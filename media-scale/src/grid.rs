// SPDX-License-Identifier: MIT
//! # Grid Partitioning
//!
//! Splits a raster into a `rows × cols` grid of non-overlapping tiles that
//! together cover every source pixel exactly once.
//!
//! ## Band Layout
//!
//! - **Base band size**: `width / cols` and `height / rows` (integer division)
//! - **Remainder**: absorbed entirely by the last column / last row
//! - **Ordering**: row-major, `(0,0), (0,1), …, (rows-1, cols-1)`
//!
//! A 10×7 image split 3×3 therefore has column widths `3, 3, 4` and row
//! heights `2, 2, 3`. A band can never be empty: more columns than pixels
//! (or rows than lines) is rejected.

/// Rectangle definition in source pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn area(&self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// `rows` or `cols` is zero.
    EmptyGrid { rows: u32, cols: u32 },
    /// More bands than pixels along one axis.
    TooFine { axis: &'static str, bands: u32, pixels: u32 },
    /// Crop region falls outside the source raster.
    OutOfBounds { rect: Rect, width: u32, height: u32 },
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::EmptyGrid { rows, cols } => {
                write!(f, "grid must have at least one row and one column (got {}x{})", rows, cols)
            }
            GridError::TooFine { axis, bands, pixels } => {
                write!(f, "cannot split {} {} pixels into {} bands", pixels, axis, bands)
            }
            GridError::OutOfBounds { rect, width, height } => write!(
                f,
                "crop {}x{}+{}+{} exceeds {}x{} source",
                rect.w, rect.h, rect.x, rect.y, width, height
            ),
        }
    }
}

impl std::error::Error for GridError {}

/// Compute `(offset, length)` for each of `bands` bands over `total` pixels.
fn bands(total: u32, bands: u32) -> Vec<(u32, u32)> {
    let base = total / bands;
    (0..bands)
        .map(|i| {
            let start = i * base;
            let len = if i + 1 == bands { total - start } else { base };
            (start, len)
        })
        .collect()
}

/// Generate tile rectangles for a `rows × cols` grid, row-major.
///
/// # Arguments
/// * `width`, `height` - Source dimensions
/// * `rows`, `cols` - Grid dimensions, both at least 1
///
/// # Returns
/// Exactly `rows * cols` rectangles whose union is the full source.
pub fn split_rects(width: u32, height: u32, rows: u32, cols: u32) -> Result<Vec<Rect>, GridError> {
    if rows == 0 || cols == 0 {
        return Err(GridError::EmptyGrid { rows, cols });
    }
    if cols > width {
        return Err(GridError::TooFine { axis: "horizontal", bands: cols, pixels: width });
    }
    if rows > height {
        return Err(GridError::TooFine { axis: "vertical", bands: rows, pixels: height });
    }

    let col_bands = bands(width, cols);
    let row_bands = bands(height, rows);

    let mut rects = Vec::with_capacity(col_bands.len() * row_bands.len());
    for &(y, h) in &row_bands {
        for &(x, w) in &col_bands {
            rects.push(Rect { x, y, w, h });
        }
    }
    Ok(rects)
}

/// Extract a rectangular region from a tightly packed buffer.
///
/// # Arguments
/// * `src` - Source buffer, `width * height * channels` bytes
/// * `width`, `height` - Source dimensions
/// * `channels` - Interleaved samples per pixel
/// * `roi` - Region of interest to extract
pub fn crop(
    src: &[u8],
    width: u32,
    height: u32,
    channels: u8,
    roi: Rect,
) -> Result<Vec<u8>, GridError> {
    let inside = roi.x.checked_add(roi.w).is_some_and(|r| r <= width)
        && roi.y.checked_add(roi.h).is_some_and(|b| b <= height);
    if !inside {
        return Err(GridError::OutOfBounds { rect: roi, width, height });
    }

    let ch = channels as usize;
    let src_pitch = width as usize * ch;
    let row_bytes = roi.w as usize * ch;
    let mut out = Vec::with_capacity(row_bytes * roi.h as usize);
    for r in 0..roi.h as usize {
        let row_off = (roi.y as usize + r) * src_pitch + roi.x as usize * ch;
        out.extend_from_slice(&src[row_off..row_off + row_bytes]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_split_covers_source() {
        let rects = split_rects(100, 100, 2, 2).unwrap();
        assert_eq!(rects.len(), 4);
        assert_eq!(rects.iter().map(Rect::area).sum::<u64>(), 10_000);
        assert_eq!(rects[1], Rect { x: 50, y: 0, w: 50, h: 50 });
    }

    #[test]
    fn remainder_goes_to_last_band() {
        let rects = split_rects(10, 7, 3, 3).unwrap();
        let widths: Vec<u32> = rects[..3].iter().map(|r| r.w).collect();
        let heights: Vec<u32> = rects.iter().step_by(3).map(|r| r.h).collect();
        assert_eq!(widths, vec![3, 3, 4]);
        assert_eq!(heights, vec![2, 2, 3]);
        assert_eq!(rects.iter().map(Rect::area).sum::<u64>(), 70);
    }

    #[test]
    fn every_pixel_is_covered_once() {
        let (w, h) = (13u32, 9u32);
        let mut hits = vec![0u8; (w * h) as usize];
        for r in split_rects(w, h, 4, 5).unwrap() {
            for y in r.y..r.y + r.h {
                for x in r.x..r.x + r.w {
                    hits[(y * w + x) as usize] += 1;
                }
            }
        }
        assert!(hits.iter().all(|&n| n == 1));
    }

    #[test]
    fn rejects_degenerate_grids() {
        assert_eq!(split_rects(10, 10, 0, 2), Err(GridError::EmptyGrid { rows: 0, cols: 2 }));
        assert!(matches!(split_rects(3, 10, 1, 4), Err(GridError::TooFine { .. })));
        assert!(matches!(split_rects(10, 3, 4, 1), Err(GridError::TooFine { .. })));
    }

    #[test]
    fn crop_copies_region_rows() {
        // 4x2 RGB, each pixel's first sample is its linear index.
        let mut src = vec![0u8; 4 * 2 * 3];
        for i in 0..8 {
            src[i * 3] = i as u8;
        }
        let out = crop(&src, 4, 2, 3, Rect { x: 1, y: 0, w: 2, h: 2 }).unwrap();
        let firsts: Vec<u8> = out.chunks(3).map(|p| p[0]).collect();
        assert_eq!(firsts, vec![1, 2, 5, 6]);
    }

    #[test]
    fn crop_rejects_out_of_bounds() {
        let src = vec![0u8; 16];
        assert!(crop(&src, 4, 4, 1, Rect { x: 3, y: 0, w: 2, h: 1 }).is_err());
    }
}
