//! Per-tile render state.

use image::RgbImage;
use serde::Serialize;

use crate::geometry::Rect;

/// Tile-aligned position of a tile in destination (zoomed) pixel space.
///
/// Both components are multiples of the configured tile size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// How much of a tile has been (or must be) rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub enum RenderState {
    #[default]
    None,
    /// Only a sub-rectangle
    Area,
    /// The whole tile
    All,
}

/// Render pass of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Pass {
    /// Nearest-neighbour pass drained first
    Fast,
    /// Quality pass run once the fast queue is empty
    Refined,
}

/// Pending-job membership of a tile, one slot per pass.
///
/// The queue owns the jobs themselves; the tile only records that it is
/// referenced, which keeps it from being evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobRefs {
    pub fast: bool,
    pub refined: bool,
}

impl JobRefs {
    pub fn is_empty(&self) -> bool {
        !self.fast && !self.refined
    }

    pub fn get(&self, pass: Pass) -> bool {
        match pass {
            Pass::Fast => self.fast,
            Pass::Refined => self.refined,
        }
    }

    pub fn set(&mut self, pass: Pass, queued: bool) {
        match pass {
            Pass::Fast => self.fast = queued,
            Pass::Refined => self.refined = queued,
        }
    }
}

/// One cache unit of the destination image.
#[derive(Debug)]
pub struct Tile {
    pub coord: TileCoord,

    /// Valid width in logical pixels (smaller than the tile size at the
    /// right image edge)
    pub width: i32,

    /// Valid height in logical pixels
    pub height: i32,

    /// Rendered tile content in device pixels, allocated on first render
    pub surface: Option<RgbImage>,

    /// Resampling scratch in device pixels, allocated on first render
    pub pixbuf: Option<RgbImage>,

    /// Highest completeness ever reached
    pub done: RenderState,

    /// Work still pending
    pub todo: RenderState,

    /// No source data was available when last rendered
    pub blank: bool,

    /// Bytes charged against the cache budget
    pub size: usize,

    pub jobs: JobRefs,
}

impl Tile {
    /// Create an unrendered tile clipped to the destination image size.
    pub fn new(coord: TileCoord, tile_size: i32, image_width: i32, image_height: i32) -> Self {
        Self {
            coord,
            width: tile_size.min(image_width - coord.x).max(0),
            height: tile_size.min(image_height - coord.y).max(0),
            surface: None,
            pixbuf: None,
            done: RenderState::None,
            todo: RenderState::None,
            blank: false,
            size: 0,
            jobs: JobRefs::default(),
        }
    }

    /// The tile's rectangle in destination space.
    pub fn rect(&self) -> Rect {
        Rect::new(self.coord.x, self.coord.y, self.width, self.height)
    }

    /// Whether the tile touches the visible rectangle `(x_scroll, y_scroll,
    /// vis_w, vis_h)`.
    ///
    /// The left/top comparison is inclusive, so a tile ending exactly at the
    /// scroll position still counts as visible.
    pub fn is_visible(&self, visible: Rect) -> bool {
        self.coord.x + self.width >= visible.x
            && self.coord.x < visible.right()
            && self.coord.y + self.height >= visible.y
            && self.coord.y < visible.bottom()
    }

    pub fn has_storage(&self) -> bool {
        self.surface.is_some() && self.pixbuf.is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================
