//! Image orientation codes and their coordinate mappings.
//!
//! The eight variants correspond to the EXIF orientation tag values 1–8.
//! Stereo rendering composes an extra mirror and/or flip on top of the
//! intrinsic orientation; composition goes through two fixed lookup tables
//! indexed by EXIF code, so it is O(1).

use serde::Serialize;

use crate::geometry::Rect;

/// Result of mirroring orientation `i` horizontally (index 0 = unknown).
const MIRROR_TABLE: [u8; 9] = [1, 2, 1, 4, 3, 6, 5, 8, 7];

/// Result of flipping orientation `i` vertically (index 0 = unknown).
const FLIP_TABLE: [u8; 9] = [1, 4, 3, 2, 1, 8, 7, 6, 5];

// =============================================================================
// Orientation
// =============================================================================

/// How stored pixel data maps to displayed pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Orientation {
    /// EXIF 1: stored as displayed.
    #[default]
    Identity,
    /// EXIF 2: mirrored left/right.
    Mirror,
    /// EXIF 3: mirrored and flipped (upside down).
    Rotate180,
    /// EXIF 4: flipped top/bottom.
    Flip,
    /// EXIF 5: flipped then rotated clockwise (transposed).
    Transpose,
    /// EXIF 6: rotated 90° clockwise.
    Rotate90Cw,
    /// EXIF 7: flipped then rotated counter-clockwise (transverse).
    Transverse,
    /// EXIF 8: rotated 90° counter-clockwise.
    Rotate90Ccw,
}

impl Orientation {
    /// All eight orientations in EXIF order.
    pub const ALL: [Orientation; 8] = [
        Orientation::Identity,
        Orientation::Mirror,
        Orientation::Rotate180,
        Orientation::Flip,
        Orientation::Transpose,
        Orientation::Rotate90Cw,
        Orientation::Transverse,
        Orientation::Rotate90Ccw,
    ];

    /// Build from an EXIF orientation code.
    ///
    /// `0` (unknown) and out-of-range values map to [`Orientation::Identity`].
    pub fn from_exif(code: u8) -> Self {
        match code {
            2 => Orientation::Mirror,
            3 => Orientation::Rotate180,
            4 => Orientation::Flip,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90Cw,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate90Ccw,
            _ => Orientation::Identity,
        }
    }

    /// The EXIF code (1–8) of this orientation.
    pub fn exif_code(self) -> u8 {
        match self {
            Orientation::Identity => 1,
            Orientation::Mirror => 2,
            Orientation::Rotate180 => 3,
            Orientation::Flip => 4,
            Orientation::Transpose => 5,
            Orientation::Rotate90Cw => 6,
            Orientation::Transverse => 7,
            Orientation::Rotate90Ccw => 8,
        }
    }

    /// This orientation with an additional horizontal mirror.
    pub fn mirrored(self) -> Self {
        Self::from_exif(MIRROR_TABLE[self.exif_code() as usize])
    }

    /// This orientation with an additional vertical flip.
    pub fn flipped(self) -> Self {
        Self::from_exif(FLIP_TABLE[self.exif_code() as usize])
    }

    /// Compose with a stereo-derived mirror and/or flip.
    pub fn compose_stereo(self, mirror: bool, flip: bool) -> Self {
        let mut orientation = self;
        if mirror {
            orientation = orientation.mirrored();
        }
        if flip {
            orientation = orientation.flipped();
        }
        orientation
    }

    /// The orientation that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            Orientation::Rotate90Cw => Orientation::Rotate90Ccw,
            Orientation::Rotate90Ccw => Orientation::Rotate90Cw,
            other => other,
        }
    }

    /// Whether the orientation exchanges the x and y axes.
    pub fn swaps_axes(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90Cw
                | Orientation::Transverse
                | Orientation::Rotate90Ccw
        )
    }

    /// Map the origin of a displayed tile to the origin of the stored region
    /// it is sampled from.
    ///
    /// `image_w`/`image_h` are the displayed (zoomed, oriented) image size.
    pub fn map_tile_origin(
        self,
        tile_x: f64,
        tile_y: f64,
        image_w: f64,
        image_h: f64,
        tile_w: f64,
        tile_h: f64,
    ) -> (f64, f64) {
        match self {
            Orientation::Identity => (tile_x, tile_y),
            Orientation::Mirror => (image_w - tile_x - tile_w, tile_y),
            Orientation::Rotate180 => (image_w - tile_x - tile_w, image_h - tile_y - tile_h),
            Orientation::Flip => (tile_x, image_h - tile_y - tile_h),
            Orientation::Transpose => (tile_y, tile_x),
            Orientation::Rotate90Cw => (tile_y, image_w - tile_x - tile_w),
            Orientation::Transverse => (image_h - tile_y - tile_h, image_w - tile_x - tile_w),
            Orientation::Rotate90Ccw => (image_h - tile_y - tile_h, tile_x),
        }
    }

    /// Map a displayed sub-rectangle of a tile to the position it occupies in
    /// the tile buffer before the orientation transform is applied.
    pub fn map_tile_region(self, area: Rect, tile_w: i32, tile_h: i32) -> Rect {
        match self {
            Orientation::Identity => area,
            Orientation::Mirror => Rect::new(tile_w - area.right(), area.y, area.width, area.height),
            Orientation::Rotate180 => Rect::new(
                tile_w - area.right(),
                tile_h - area.bottom(),
                area.width,
                area.height,
            ),
            Orientation::Flip => Rect::new(area.x, tile_h - area.bottom(), area.width, area.height),
            Orientation::Transpose => Rect::new(area.y, area.x, area.height, area.width),
            Orientation::Rotate90Cw => {
                Rect::new(area.y, tile_w - area.right(), area.height, area.width)
            }
            Orientation::Transverse => Rect::new(
                tile_h - area.bottom(),
                tile_w - area.right(),
                area.height,
                area.width,
            ),
            Orientation::Rotate90Ccw => {
                Rect::new(tile_h - area.bottom(), area.x, area.height, area.width)
            }
        }
    }

    /// Map a rectangle in stored (source) coordinates to displayed
    /// coordinates, before zoom.
    ///
    /// `width`/`height` are the displayed image size.
    pub fn map_rect_reverse(self, area: Rect, width: i32, height: i32) -> Rect {
        match self {
            Orientation::Identity => area,
            Orientation::Mirror => Rect::new(width - area.right(), area.y, area.width, area.height),
            Orientation::Rotate180 => Rect::new(
                width - area.right(),
                height - area.bottom(),
                area.width,
                area.height,
            ),
            Orientation::Flip => Rect::new(area.x, height - area.bottom(), area.width, area.height),
            Orientation::Transpose => Rect::new(area.y, area.x, area.height, area.width),
            Orientation::Rotate90Cw => {
                Rect::new(width - area.bottom(), area.x, area.height, area.width)
            }
            Orientation::Transverse => Rect::new(
                width - area.bottom(),
                height - area.right(),
                area.height,
                area.width,
            ),
            Orientation::Rotate90Ccw => {
                Rect::new(area.y, height - area.right(), area.height, area.width)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
