//! Source pixel providers.
//!
//! The renderer reads source (pre-zoom, stored-orientation) pixels through the
//! [`ImageSource`] trait. Two providers exist:
//!
//! - [`FullImageSource`]: one fully decoded buffer
//! - [`TiledImageSource`]: coarse source tiles computed on demand and kept in
//!   a small bounded LRU, for images too large to decode at once
//!
//! Source tiles are handed out as [`SourceTile`] values holding an
//! `Arc` snapshot of their pixels, so a resample never observes a buffer that
//! is being rewritten underneath it.

mod tiled;

use std::sync::Arc;

use image::RgbImage;

use crate::geometry::Rect;

pub use tiled::{RequestFn, TiledImageSource, MIN_SOURCE_TILE_CACHE};

/// One coarse region of the source image.
#[derive(Debug, Clone)]
pub struct SourceTile {
    /// Left edge in source pixels (multiple of the source tile width)
    pub x: i32,

    /// Top edge in source pixels (multiple of the source tile height)
    pub y: i32,

    /// Decoded pixels, absent while the region is not available
    pub pixels: Option<Arc<RgbImage>>,

    /// The region has no data yet
    pub blank: bool,
}

/// Provider of source pixels for one renderer.
pub trait ImageSource {
    /// Stored image size in source pixels.
    fn dimensions(&self) -> (i32, i32);

    /// The fully decoded source buffer, when there is one.
    fn source_pixels(&self) -> Option<&RgbImage>;

    /// Source tile dimensions; `None` when this source is not tiled.
    fn source_tile_size(&self) -> Option<(i32, i32)> {
        None
    }

    /// Source tiles overlapping `region`, requesting missing ones.
    ///
    /// `visible` is the currently visible part of the image in source
    /// coordinates; tiles inside it are kept when the source evicts.
    fn compute_source_tiles(&mut self, _region: Rect, _visible: Rect) -> Vec<SourceTile> {
        Vec::new()
    }

    /// Re-request cached data inside `region`, returning the parts that now
    /// hold pixels.
    fn refresh(&mut self, _region: Rect) -> Vec<Rect> {
        Vec::new()
    }

    fn source_tiles_enabled(&self) -> bool {
        self.source_tile_size().is_some()
    }
}

// =============================================================================
// Full Image Source
// =============================================================================

/// A source backed by a single decoded buffer.
///
/// The buffer may be absent (nothing decoded yet), in which case the
/// renderer paints placeholders.
#[derive(Debug, Clone, Default)]
pub struct FullImageSource {
    pixels: Option<Arc<RgbImage>>,
}

impl FullImageSource {
    pub fn new(pixels: RgbImage) -> Self {
        Self {
            pixels: Some(Arc::new(pixels)),
        }
    }

    /// A source with no pixel data yet.
    pub fn empty() -> Self {
        Self { pixels: None }
    }

    /// Replace the pixel data.
    pub fn set_pixels(&mut self, pixels: Option<RgbImage>) {
        self.pixels = pixels.map(Arc::new);
    }

    /// Mutable access to the pixels for progressive decoding.
    ///
    /// Clones the buffer if a snapshot of it is still shared.
    pub fn pixels_mut(&mut self) -> Option<&mut RgbImage> {
        self.pixels.as_mut().map(Arc::make_mut)
    }
}

impl ImageSource for FullImageSource {
    fn dimensions(&self) -> (i32, i32) {
        self.pixels
            .as_ref()
            .map(|p| (p.width() as i32, p.height() as i32))
            .unwrap_or((0, 0))
    }

    fn source_pixels(&self) -> Option<&RgbImage> {
        self.pixels.as_deref()
    }
}

// =============================================================================
// Tests
// =============================================================================
