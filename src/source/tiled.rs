//! On-demand source tiles for huge images.

use std::fmt;
use std::sync::Arc;

use image::RgbImage;
use lru::LruCache;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::geometry::{round_down, Rect};

use super::{ImageSource, SourceTile};

/// Smallest number of source tiles kept resident.
pub const MIN_SOURCE_TILE_CACHE: usize = 4;

/// Computes the pixels of one source region.
///
/// `Ok(None)` means the region is not available yet; it is shown as a
/// placeholder until [`ImageSource::refresh`] succeeds for it.
pub type RequestFn = Box<dyn FnMut(Rect) -> Result<Option<RgbImage>, SourceError>>;

/// A source made of fixed-size tiles requested on demand.
pub struct TiledImageSource {
    width: i32,
    height: i32,
    tile_width: i32,
    tile_height: i32,
    capacity: usize,
    tiles: LruCache<(i32, i32), SourceTile>,
    request: RequestFn,
}

impl fmt::Debug for TiledImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiledImageSource")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("tile_width", &self.tile_width)
            .field("tile_height", &self.tile_height)
            .field("capacity", &self.capacity)
            .field("resident", &self.tiles.len())
            .finish()
    }
}

impl TiledImageSource {
    /// Create a tiled source.
    ///
    /// # Arguments
    ///
    /// * `width`, `height` - Full image size in source pixels
    /// * `tile_width`, `tile_height` - Source tile size
    /// * `capacity` - Maximum resident tiles (raised to at least 4)
    /// * `request` - Computes one region
    pub fn new(
        width: i32,
        height: i32,
        tile_width: i32,
        tile_height: i32,
        capacity: usize,
        request: RequestFn,
    ) -> Self {
        Self {
            width,
            height,
            tile_width: tile_width.max(1),
            tile_height: tile_height.max(1),
            capacity: capacity.max(MIN_SOURCE_TILE_CACHE),
            tiles: LruCache::unbounded(),
            request,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident source tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    fn tile_rect(&self, x: i32, y: i32) -> Rect {
        Rect::new(x, y, self.tile_width, self.tile_height)
    }

    /// Make room for one more tile, skipping tiles inside `visible`.
    fn evict_for_insert(&mut self, visible: Rect) {
        if self.tiles.len() < self.capacity {
            return;
        }

        let mut excess = self.tiles.len() + 1 - self.capacity;
        let mut victims = Vec::new();
        for (key, _) in self.tiles.iter().rev() {
            if excess == 0 {
                break;
            }
            if self.tile_rect(key.0, key.1).intersect(&visible).is_none() {
                victims.push(*key);
                excess -= 1;
            }
        }

        for key in victims {
            self.tiles.pop(&key);
            debug!(x = key.0, y = key.1, "Dropped source tile");
        }
    }

    /// Run the request function for one tile-aligned region.
    fn request_tile(&mut self, x: i32, y: i32) -> SourceTile {
        let bounds = Rect::new(0, 0, self.width, self.height);
        let region = self.tile_rect(x, y).intersect(&bounds).unwrap_or_default();

        let pixels = match (self.request)(region) {
            Ok(pixels) => pixels,
            Err(e) => {
                warn!(x, y, error = %e, "Source tile request failed");
                None
            }
        };

        SourceTile {
            x,
            y,
            blank: pixels.is_none(),
            pixels: pixels.map(Arc::new),
        }
    }
}

impl ImageSource for TiledImageSource {
    fn dimensions(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn source_pixels(&self) -> Option<&RgbImage> {
        None
    }

    fn source_tile_size(&self) -> Option<(i32, i32)> {
        Some((self.tile_width, self.tile_height))
    }

    fn compute_source_tiles(&mut self, region: Rect, visible: Rect) -> Vec<SourceTile> {
        let bounds = Rect::new(0, 0, self.width, self.height);
        let Some(region) = region.intersect(&bounds) else {
            return Vec::new();
        };

        let sx = round_down(region.x, self.tile_width);
        let sy = round_down(region.y, self.tile_height);

        let mut result = Vec::new();
        let mut x = sx;
        while x < region.right() {
            let mut y = sy;
            while y < region.bottom() {
                if let Some(tile) = self.tiles.get(&(x, y)) {
                    result.push(tile.clone());
                } else {
                    self.evict_for_insert(visible);
                    let tile = self.request_tile(x, y);
                    self.tiles.put((x, y), tile.clone());
                    result.push(tile);
                }
                y += self.tile_height;
            }
            x += self.tile_width;
        }
        result
    }

    fn refresh(&mut self, region: Rect) -> Vec<Rect> {
        if region.is_empty() {
            return Vec::new();
        }

        let keys: Vec<(i32, i32)> = self
            .tiles
            .iter()
            .filter(|(key, _)| self.tile_rect(key.0, key.1).intersect(&region).is_some())
            .map(|(key, _)| *key)
            .collect();

        let mut updated = Vec::new();
        for (x, y) in keys {
            let tile = self.request_tile(x, y);
            if !tile.blank {
                if let Some(r) = self.tile_rect(x, y).intersect(&region) {
                    updated.push(r);
                }
            }
            if let Some(slot) = self.tiles.peek_mut(&(x, y)) {
                *slot = tile;
            }
        }
        updated
    }
}

// =============================================================================
// Tests
// =============================================================================
