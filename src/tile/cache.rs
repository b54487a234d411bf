//! Tile cache with a byte budget.
//!
//! Tiles are created on first reference and kept in most-recently-used order.
//! Creating a tile is free; its surface and pixel buffer are only allocated
//! (and charged against the budget) by [`TileCache::ensure_storage`] right
//! before the tile is first rendered.
//!
//! # Eviction
//!
//! Whenever new storage is requested and the budget would be exceeded, tiles
//! are evicted starting at the least-recently-used end. A tile is never
//! evicted while it:
//! - holds a pending render job,
//! - touches the visible rectangle, or
//! - is the tile storage is being allocated for.
//!
//! When nothing else is evictable the budget is exceeded and a warning is
//! logged once; the warning re-arms after the cache fits its budget again.

use image::RgbImage;
use lru::LruCache;
use serde::Serialize;
use tracing::{debug, warn};

use crate::geometry::{round_down, round_up, Rect};
use crate::transform::COLOR_BYTES;

use super::state::{RenderState, Tile, TileCoord};

/// Default cache budget: 8 MiB
pub const DEFAULT_CACHE_SIZE_MB: usize = 8;

const MIB: usize = 1024 * 1024;

/// View geometry the eviction policy depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvictionContext {
    /// Visible rectangle in destination space (scroll position and visible size)
    pub visible: Rect,

    /// Current zoom (destination / source)
    pub scale: f64,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub tiles: usize,
    pub resident_bytes: usize,
    pub budget_bytes: usize,
    pub evicted: u64,
}

// =============================================================================
// Tile Cache
// =============================================================================

/// Owner of every [`Tile`] of one renderer.
pub struct TileCache {
    /// Tiles in recency order
    tiles: LruCache<TileCoord, Tile>,

    /// Logical tile edge
    tile_size: i32,

    /// Device pixels per logical pixel
    hidpi_scale: i32,

    /// Configured budget in bytes
    budget: usize,

    /// Bytes currently charged by tile storage
    resident: usize,

    /// Tiles evicted since creation
    evicted: u64,

    over_budget_warned: bool,
}

impl TileCache {
    /// Create an empty cache.
    ///
    /// # Arguments
    ///
    /// * `tile_size` - Logical tile edge in pixels
    /// * `hidpi_scale` - Integer device-pixel multiplier
    /// * `cache_size_mb` - Budget in MiB
    pub fn new(tile_size: i32, hidpi_scale: i32, cache_size_mb: usize) -> Self {
        Self {
            tiles: LruCache::unbounded(),
            tile_size,
            hidpi_scale,
            budget: cache_size_mb * MIB,
            resident: 0,
            evicted: 0,
            over_budget_warned: false,
        }
    }

    pub fn tile_size(&self) -> i32 {
        self.tile_size
    }

    pub fn hidpi_scale(&self) -> i32 {
        self.hidpi_scale
    }

    /// Edge of a tile buffer in device pixels.
    pub fn device_tile_size(&self) -> u32 {
        (self.tile_size * self.hidpi_scale) as u32
    }

    /// Bytes of one tile buffer (surface or pixel buffer).
    pub fn buffer_bytes(&self) -> usize {
        let side = self.device_tile_size() as usize;
        side * side * COLOR_BYTES
    }

    /// Return the tile at `coord`, creating it if absent, and mark it most
    /// recently used.
    ///
    /// `image_width`/`image_height` are the destination image size, used to
    /// clip the tile's valid area.
    pub fn get_or_create(&mut self, coord: TileCoord, image_width: i32, image_height: i32) -> &mut Tile {
        let tile_size = self.tile_size;
        self.tiles
            .get_or_insert_mut(coord, || Tile::new(coord, tile_size, image_width, image_height))
    }

    /// Return the tile at `coord` if it exists, marking it most recently used.
    pub fn get_existing(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.tiles.get_mut(&coord)
    }

    /// Look up a tile without touching recency.
    pub fn peek(&self, coord: TileCoord) -> Option<&Tile> {
        self.tiles.peek(&coord)
    }

    /// Mutable lookup without touching recency.
    pub fn peek_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.tiles.peek_mut(&coord)
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        self.tiles.contains(&coord)
    }

    /// Iterate tiles from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().map(|(_, tile)| tile)
    }

    /// Mark every tile for a full re-render and re-clip it to the new
    /// destination size. Storage is kept.
    pub fn invalidate_all(&mut self, image_width: i32, image_height: i32) {
        let tile_size = self.tile_size;
        for (_, tile) in self.tiles.iter_mut() {
            tile.done = RenderState::None;
            tile.todo = RenderState::All;
            tile.blank = false;
            tile.width = tile_size.min(image_width - tile.coord.x).max(0);
            tile.height = tile_size.min(image_height - tile.coord.y).max(0);
        }
    }

    /// Mark every tile intersecting `region` (widened to tile boundaries) for
    /// a full re-render.
    pub fn invalidate_region(&mut self, region: Rect) {
        let x1 = round_down(region.x, self.tile_size);
        let x2 = round_up(region.right(), self.tile_size);
        let y1 = round_down(region.y, self.tile_size);
        let y2 = round_up(region.bottom(), self.tile_size);

        for (_, tile) in self.tiles.iter_mut() {
            if tile.coord.x < x2
                && tile.coord.x + tile.width > x1
                && tile.coord.y < y2
                && tile.coord.y + tile.height > y1
            {
                tile.done = RenderState::None;
                tile.todo = RenderState::All;
            }
        }
    }

    /// Budget in bytes for the given view.
    ///
    /// When zoomed out, enough tiles to cover the visible area twice over
    /// (surface plus pixel buffer) are always allowed.
    pub fn effective_budget(&self, ctx: &EvictionContext) -> usize {
        if ctx.scale < 1.0 {
            let across = (ctx.visible.width.max(0) / self.tile_size + 1) as usize;
            let down = (ctx.visible.height.max(0) / self.tile_size + 1) as usize;
            let cover = across * down * self.buffer_bytes() * 2;
            self.budget.max(cover)
        } else {
            self.budget
        }
    }

    /// Allocate the surface and pixel buffer of the tile at `coord` if they
    /// are missing, evicting other tiles as needed.
    ///
    /// Returns `None` when no tile exists at `coord`.
    pub fn ensure_storage(&mut self, coord: TileCoord, ctx: &EvictionContext) -> Option<&mut Tile> {
        let (need_surface, need_pixbuf) = {
            let tile = self.tiles.peek(&coord)?;
            (tile.surface.is_none(), tile.pixbuf.is_none())
        };

        let buffer_bytes = self.buffer_bytes();
        let needed = buffer_bytes * (need_surface as usize + need_pixbuf as usize);
        if needed > 0 {
            self.free_space(needed, coord, ctx);
            self.resident += needed;
        }

        let side = self.device_tile_size();
        let tile = self.tiles.get_mut(&coord)?;
        if need_surface {
            tile.surface = Some(RgbImage::new(side, side));
            tile.size += buffer_bytes;
        }
        if need_pixbuf {
            tile.pixbuf = Some(RgbImage::new(side, side));
            tile.size += buffer_bytes;
        }
        Some(tile)
    }

    /// Evict least-recently-used tiles until `space` more bytes fit.
    fn free_space(&mut self, space: usize, keep: TileCoord, ctx: &EvictionContext) {
        let limit = self.effective_budget(ctx);
        let mut projected = self.resident + space;
        if projected <= limit {
            self.over_budget_warned = false;
            return;
        }

        let mut victims = Vec::new();
        for (coord, tile) in self.tiles.iter().rev() {
            if projected <= limit {
                break;
            }
            if *coord == keep || !tile.jobs.is_empty() || tile.is_visible(ctx.visible) {
                continue;
            }
            projected = projected.saturating_sub(tile.size);
            victims.push(*coord);
        }

        for coord in victims {
            self.remove(coord);
        }

        if projected > limit {
            if !self.over_budget_warned {
                warn!(
                    resident = self.resident,
                    requested = space,
                    budget = limit,
                    "Tile cache over budget: every remaining tile is visible or queued"
                );
                self.over_budget_warned = true;
            }
        } else {
            self.over_budget_warned = false;
        }
    }

    /// Drop one tile and release its storage charge.
    pub fn remove(&mut self, coord: TileCoord) -> Option<Tile> {
        let tile = self.tiles.pop(&coord)?;
        self.resident = self.resident.saturating_sub(tile.size);
        self.evicted += 1;
        debug!(x = coord.x, y = coord.y, bytes = tile.size, "Evicted tile");
        Some(tile)
    }

    /// Clear the job references of every tile (queue was discarded).
    pub fn clear_job_refs(&mut self) {
        for (_, tile) in self.tiles.iter_mut() {
            tile.jobs = Default::default();
        }
    }

    /// Drop every tile.
    pub fn clear(&mut self) {
        self.tiles.clear();
        self.resident = 0;
        self.over_budget_warned = false;
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Bytes currently charged by tile storage.
    pub fn resident_bytes(&self) -> usize {
        self.resident
    }

    /// Configured budget in bytes.
    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            tiles: self.tiles.len(),
            resident_bytes: self.resident,
            budget_bytes: self.budget,
            evicted: self.evicted,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
