//! Which fixed-size tiles of the canvas have to be drawn.
//!
//! Two flavours exist and callers rely on different guarantees:
//!
//! * [`Tiler::blocks`] is a three-tile window around the scroll position, for viewports no
//!   larger than one block. Its result is memoized so that an unchanged window is handed
//!   back as the very same allocation.
//! * [`tile_range`] covers an arbitrary viewport clamped into the map.

use std::sync::Arc;

/// Tiles kept on each side of the visible block.
const SLACK: i64 = 1;

/// A memoized window of tile offsets along one axis.
///
/// ```
/// use msav::libs::tiler::Tiler;
/// use std::sync::Arc;
///
/// let mut tiler = Tiler::new();
/// let a = tiler.blocks(-250.0, 100, 15.0);
/// assert_eq!(&a[..], &[200, 300, 400]);
///
/// // same bucket, same unit: same allocation
/// let b = tiler.blocks(-280.0, 100, 15.0);
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Default, Clone)]
pub struct Tiler {
    cache: Option<(Arc<[i64]>, f64)>,
}

impl Tiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tile offsets for the canvas translation `scroll`.
    ///
    /// `unit` is the pixel size of one column or row; changing it invalidates the cached
    /// window even when the offsets are the same.
    pub fn blocks(&mut self, scroll: f64, block_size: i64, unit: f64) -> Arc<[i64]> {
        let offsets = window_offsets(scroll, block_size);

        if let Some((cached, cached_unit)) = &self.cache {
            if cached_unit.to_bits() == unit.to_bits() && cached[..] == offsets[..] {
                tracing::trace!(?offsets, "tile window unchanged");
                return Arc::clone(cached);
            }
        }

        tracing::trace!(?offsets, unit, "tile window published");
        let fresh: Arc<[i64]> = offsets.into();
        self.cache = Some((Arc::clone(&fresh), unit));
        fresh
    }

    /// The last published window, if any.
    pub fn current(&self) -> Option<Arc<[i64]>> {
        self.cache.as_ref().map(|(offsets, _)| Arc::clone(offsets))
    }
}

/// The un-memoized window: offsets of the block under `scroll` plus one on each side,
/// dropping tiles that end at or before zero.
///
/// ```
/// # use msav::libs::tiler::window_offsets;
/// assert_eq!(window_offsets(0.0, 100), vec![0, 100]);
/// assert_eq!(window_offsets(-1000.0, 256), vec![768, 1024, 1280]);
/// ```
pub fn window_offsets(scroll: f64, block_size: i64) -> Vec<i64> {
    if block_size <= 0 {
        return vec![];
    }

    // the float to int cast saturates, so does everything after it
    let bucket = (scroll / block_size as f64).floor() as i64;
    let anchor = 0i64
        .saturating_sub(block_size.saturating_mul(bucket))
        .saturating_sub(block_size.saturating_mul(SLACK));

    let mut offsets: Vec<i64> = (0..(2 * SLACK + 1))
        .map(|k| anchor.saturating_add(k.saturating_mul(block_size)))
        .filter(|&offset| offset.saturating_add(block_size) > 0)
        .collect();
    offsets.dedup();
    offsets
}

/// Tile offsets covering `[viewport_offset, viewport_offset + viewport_extent)` once the
/// offset is clamped into `[0, map_extent - viewport_extent]`.
///
/// ```
/// # use msav::libs::tiler::tile_range;
/// assert_eq!(tile_range(1000, 100, 250, 300), vec![200, 300, 400, 500]);
/// // scrolled past the end
/// assert_eq!(tile_range(1000, 100, 5000, 300), vec![700, 800, 900]);
/// assert!(tile_range(1000, 100, 0, 0).is_empty());
/// ```
pub fn tile_range(
    map_extent: i64,
    block_size: i64,
    viewport_offset: i64,
    viewport_extent: i64,
) -> Vec<i64> {
    if block_size <= 0 || viewport_extent <= 0 {
        return vec![];
    }

    let offset = clamp_offset(map_extent, viewport_offset, viewport_extent);
    let min_tile = offset.div_euclid(block_size);
    let max_tile = offset
        .saturating_add(viewport_extent - 1)
        .div_euclid(block_size);

    (min_tile..=max_tile).map(|t| t * block_size).collect()
}

/// Clamp a viewport offset so the viewport stays inside the map where possible.
pub fn clamp_offset(map_extent: i64, viewport_offset: i64, viewport_extent: i64) -> i64 {
    let max_offset = map_extent.saturating_sub(viewport_extent).max(0);
    viewport_offset.clamp(0, max_offset)
}

//----------------------------
// TileGrid
//----------------------------
/// One windowed [`Tiler`] per axis for a 2-D canvas.
#[derive(Debug, Clone)]
pub struct TileGrid {
    block_size: i64,
    x: Tiler,
    y: Tiler,
}

impl TileGrid {
    pub fn new(block_size: i64) -> Self {
        Self {
            block_size,
            x: Tiler::new(),
            y: Tiler::new(),
        }
    }

    pub fn block_size(&self) -> i64 {
        self.block_size
    }

    pub fn blocks_x(&mut self, scroll_x: f64, col_width: f64) -> Arc<[i64]> {
        self.x.blocks(scroll_x, self.block_size, col_width)
    }

    pub fn blocks_y(&mut self, scroll_y: f64, row_height: f64) -> Arc<[i64]> {
        self.y.blocks(scroll_y, self.block_size, row_height)
    }

    /// Every `(x, y)` tile origin to draw, row-major.
    ///
    /// ```
    /// # use msav::libs::tiler::TileGrid;
    /// let mut grid = TileGrid::new(100);
    /// let tiles = grid.tiles(0.0, 0.0, 10.0, 20.0);
    /// assert_eq!(tiles, vec![(0, 0), (100, 0), (0, 100), (100, 100)]);
    /// ```
    pub fn tiles(
        &mut self,
        scroll_x: f64,
        scroll_y: f64,
        col_width: f64,
        row_height: f64,
    ) -> Vec<(i64, i64)> {
        let xs = self.blocks_x(scroll_x, col_width);
        let ys = self.blocks_y(scroll_y, row_height);

        itertools::iproduct!(ys.iter(), xs.iter())
            .map(|(&y, &x)| (x, y))
            .collect()
    }
}
