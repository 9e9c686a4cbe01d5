//! # Splitter
//!
//! Partitions a raster into `rows × cols` tiles, row-major. Band sizes come
//! from [`media_scale::grid::split_rects`]: equal bands with the remainder
//! absorbed by the last row and column.

use media_scale::grid::{crop, split_rects};

use crate::config::SplitConfig;
use crate::core::{PixelBuffer, Tile};
use crate::error::{EngineError, EngineResult};

/// Check caller-supplied grid dimensions before any decoding happens.
pub fn validate_grid(rows: i64, cols: i64, config: &SplitConfig) -> EngineResult<(u32, u32)> {
    if rows < 1 || cols < 1 {
        return Err(EngineError::invalid_argument(format!(
            "rows and cols must be at least 1, got {}x{}",
            rows, cols
        )));
    }
    let tiles = (rows as u128) * (cols as u128);
    if tiles > u128::from(config.max_tiles) {
        return Err(EngineError::resource_limit(
            "split.max_tiles",
            u64::try_from(tiles).unwrap_or(u64::MAX),
            config.max_tiles,
        ));
    }
    let rows = u32::try_from(rows).map_err(|_| EngineError::invalid_argument("rows out of range"))?;
    let cols = u32::try_from(cols).map_err(|_| EngineError::invalid_argument("cols out of range"))?;
    Ok((rows, cols))
}

/// Split `buffer` into exactly `rows * cols` tiles.
pub fn split(buffer: &PixelBuffer, rows: u32, cols: u32, config: &SplitConfig) -> EngineResult<Vec<Tile>> {
    validate_grid(i64::from(rows), i64::from(cols), config)?;

    let rects = split_rects(buffer.width(), buffer.height(), rows, cols)?;
    rects
        .into_iter()
        .enumerate()
        .map(|(i, rect)| -> EngineResult<Tile> {
            let data = crop(buffer.data(), buffer.width(), buffer.height(), buffer.channels(), rect)?;
            Ok(Tile {
                buffer: PixelBuffer::new(rect.w, rect.h, buffer.layout(), data)?,
                row: i as u32 / cols,
                col: i as u32 % cols,
            })
        })
        .collect()
}
