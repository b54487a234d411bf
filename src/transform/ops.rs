//! Pixel-buffer geometric transforms on tile-sized RGB buffers.
//!
//! Every operation reads a sub-rectangle of one buffer and writes the
//! transformed pixels into a second buffer of identical dimensions; source and
//! destination never alias. Only 3-byte RGB data is handled here, alpha must
//! already be composited upstream.
//!
//! [`ScratchTile`] owns the spare buffer used for ping-ponging: after a
//! transform the tile's buffer and the spare are swapped, so the previous tile
//! buffer becomes the next spare. Content of the spare is only meaningful for
//! the duration of one transform call.

use image::RgbImage;

use crate::error::TransformError;
use crate::geometry::Rect;

use super::orientation::Orientation;

/// Bytes per RGB pixel.
pub const COLOR_BYTES: usize = 3;

// =============================================================================
// Scratch Tile
// =============================================================================

/// Spare tile buffer owned by one renderer instance.
#[derive(Debug, Default)]
pub struct ScratchTile {
    spare: Option<RgbImage>,
}

impl ScratchTile {
    /// Create an empty scratch holder; the buffer is allocated on first use.
    pub fn new() -> Self {
        Self { spare: None }
    }

    /// Borrow the spare buffer, (re)allocating it to the given dimensions.
    pub fn buffer(&mut self, width: u32, height: u32) -> &mut RgbImage {
        let reuse = matches!(&self.spare, Some(b) if b.dimensions() == (width, height));
        if !reuse {
            self.spare = Some(RgbImage::new(width, height));
        }
        self.spare.get_or_insert_with(|| RgbImage::new(width, height))
    }

    /// Drop the spare buffer (tile size or HiDPI scale changed).
    pub fn release(&mut self) {
        self.spare = None;
    }

    /// Run `op` from `tile` into the spare buffer, then swap the two.
    fn ping_pong<F>(&mut self, tile: &mut RgbImage, op: F) -> Result<(), TransformError>
    where
        F: FnOnce(&RgbImage, &mut RgbImage) -> Result<(), TransformError>,
    {
        let (width, height) = tile.dimensions();
        let dest = self.buffer(width, height);
        op(&*tile, dest)?;
        std::mem::swap(tile, dest);
        Ok(())
    }

    /// Apply one orientation to `region` of `tile` in place.
    ///
    /// After the call the transformed pixels occupy the region obtained by
    /// mapping `region` through the orientation; pixels outside it are
    /// undefined.
    pub fn apply_orientation(
        &mut self,
        tile: &mut RgbImage,
        orientation: Orientation,
        region: Rect,
    ) -> Result<(), TransformError> {
        let tile_h = tile.height() as i32;
        match orientation {
            Orientation::Identity => Ok(()),
            Orientation::Mirror => {
                self.ping_pong(tile, |s, d| mirror_horizontal(s, d, region))
            }
            Orientation::Rotate180 => self.ping_pong(tile, |s, d| mirror_and_flip(s, d, region)),
            Orientation::Flip => self.ping_pong(tile, |s, d| flip_vertical(s, d, region)),
            Orientation::Transpose => {
                self.ping_pong(tile, |s, d| flip_vertical(s, d, region))?;
                let flipped = Rect::new(region.x, tile_h - region.bottom(), region.width, region.height);
                self.ping_pong(tile, |s, d| rotate_90_cw(s, d, flipped))
            }
            Orientation::Rotate90Cw => self.ping_pong(tile, |s, d| rotate_90_cw(s, d, region)),
            Orientation::Transverse => {
                self.ping_pong(tile, |s, d| flip_vertical(s, d, region))?;
                let flipped = Rect::new(region.x, tile_h - region.bottom(), region.width, region.height);
                self.ping_pong(tile, |s, d| rotate_90_ccw(s, d, flipped))
            }
            Orientation::Rotate90Ccw => self.ping_pong(tile, |s, d| rotate_90_ccw(s, d, region)),
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

fn check_buffers(src: &RgbImage, dest: &RgbImage, region: Rect) -> Result<(), TransformError> {
    if src.dimensions() != dest.dimensions() {
        return Err(TransformError::DimensionMismatch {
            source_width: src.width(),
            source_height: src.height(),
            scratch_width: dest.width(),
            scratch_height: dest.height(),
        });
    }

    let bounds = Rect::new(0, 0, src.width() as i32, src.height() as i32);
    if region.x < 0 || region.y < 0 || !bounds.contains(&region) {
        return Err(TransformError::RegionOutOfBounds {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            buffer_width: src.width(),
            buffer_height: src.height(),
        });
    }

    Ok(())
}

fn check_square(buffer: &RgbImage) -> Result<(), TransformError> {
    if buffer.width() != buffer.height() {
        return Err(TransformError::NotSquare {
            width: buffer.width(),
            height: buffer.height(),
        });
    }
    Ok(())
}

/// Copy every pixel of `region` from `src` to `dest` at the position chosen
/// by `target(x, y)`.
fn remap<F>(src: &RgbImage, dest: &mut RgbImage, region: Rect, target: F)
where
    F: Fn(usize, usize) -> (usize, usize),
{
    if region.is_empty() {
        return;
    }

    let src_stride = src.width() as usize * COLOR_BYTES;
    let dest_stride = dest.width() as usize * COLOR_BYTES;
    let s: &[u8] = src;
    let d: &mut [u8] = dest;

    for y in region.y as usize..region.bottom() as usize {
        let row = y * src_stride;
        for x in region.x as usize..region.right() as usize {
            let (tx, ty) = target(x, y);
            let sp = row + x * COLOR_BYTES;
            let dp = ty * dest_stride + tx * COLOR_BYTES;
            d[dp..dp + COLOR_BYTES].copy_from_slice(&s[sp..sp + COLOR_BYTES]);
        }
    }
}

// =============================================================================
// Transforms
// =============================================================================

/// Rotate `region` by 90° clockwise: `(x, y) → (w - 1 - y, x)`.
pub fn rotate_90_cw(src: &RgbImage, dest: &mut RgbImage, region: Rect) -> Result<(), TransformError> {
    check_buffers(src, dest, region)?;
    check_square(src)?;
    let last = dest.width() as usize - 1;
    remap(src, dest, region, |x, y| (last - y, x));
    Ok(())
}

/// Rotate `region` by 90° counter-clockwise: `(x, y) → (y, h - 1 - x)`.
pub fn rotate_90_ccw(src: &RgbImage, dest: &mut RgbImage, region: Rect) -> Result<(), TransformError> {
    check_buffers(src, dest, region)?;
    check_square(src)?;
    let last = dest.height() as usize - 1;
    remap(src, dest, region, |x, y| (y, last - x));
    Ok(())
}

/// Mirror `region` left/right: `(x, y) → (w - 1 - x, y)`.
pub fn mirror_horizontal(
    src: &RgbImage,
    dest: &mut RgbImage,
    region: Rect,
) -> Result<(), TransformError> {
    check_buffers(src, dest, region)?;
    let last = dest.width() as usize - 1;
    remap(src, dest, region, |x, y| (last - x, y));
    Ok(())
}

/// Flip `region` top/bottom: `(x, y) → (x, h - 1 - y)`.
///
/// Rows are contiguous after a flip, so this copies whole row slices.
pub fn flip_vertical(src: &RgbImage, dest: &mut RgbImage, region: Rect) -> Result<(), TransformError> {
    check_buffers(src, dest, region)?;
    if region.is_empty() {
        return Ok(());
    }

    let stride = src.width() as usize * COLOR_BYTES;
    let last = dest.height() as usize - 1;
    let start = region.x as usize * COLOR_BYTES;
    let len = region.width as usize * COLOR_BYTES;
    let s: &[u8] = src;
    let d: &mut [u8] = dest;

    for y in region.y as usize..region.bottom() as usize {
        let sp = y * stride + start;
        let dp = (last - y) * stride + start;
        d[dp..dp + len].copy_from_slice(&s[sp..sp + len]);
    }
    Ok(())
}

/// Mirror and flip `region` (180° rotation).
pub fn mirror_and_flip(
    src: &RgbImage,
    dest: &mut RgbImage,
    region: Rect,
) -> Result<(), TransformError> {
    check_buffers(src, dest, region)?;
    let last_x = dest.width() as usize - 1;
    let last_y = dest.height() as usize - 1;
    remap(src, dest, region, |x, y| (last_x - x, last_y - y));
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
