//! Region resampling and pixel copy helpers.
//!
//! [`get_region`] writes `region` of the destination buffer from the source,
//! where destination pixel `d` samples source position `(d - offset) / scale`
//! (pixel centres). At 1:1 scale it degenerates to a straight copy.

use image::imageops::{self, interpolate_bilinear};
use image::{GenericImageView, Rgb, RgbImage};

use crate::geometry::Rect;
use crate::transform::COLOR_BYTES;

use super::view::Interpolation;

/// Bounds of a buffer as a [`Rect`].
pub fn bounds(image: &RgbImage) -> Rect {
    Rect::new(0, 0, image.width() as i32, image.height() as i32)
}

/// Fill `rect` (clipped to the buffer) with a flat colour.
pub fn fill_rect(image: &mut RgbImage, rect: Rect, color: Rgb<u8>) {
    let Some(r) = rect.intersect(&bounds(image)) else {
        return;
    };
    for y in r.y..r.bottom() {
        for x in r.x..r.right() {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Copy `src_rect` of `src` into `dest` at `(dx, dy)`, clipping both sides.
pub fn copy_rect(src: &RgbImage, src_rect: Rect, dest: &mut RgbImage, dx: i32, dy: i32) {
    let Some(clipped) = src_rect.intersect(&bounds(src)) else {
        return;
    };
    let dx = dx + (clipped.x - src_rect.x);
    let dy = dy + (clipped.y - src_rect.y);

    let target = Rect::new(dx, dy, clipped.width, clipped.height);
    let Some(visible) = target.intersect(&bounds(dest)) else {
        return;
    };
    let sx = clipped.x + (visible.x - dx);
    let sy = clipped.y + (visible.y - dy);

    let view = src.view(sx as u32, sy as u32, visible.width as u32, visible.height as u32);
    imageops::replace(dest, &*view, visible.x as i64, visible.y as i64);
}

/// Byte-wise copy for 1:1 rendering of very wide sources.
fn copy_bytes(src: &RgbImage, dest: &mut RgbImage, region: Rect, ox: i32, oy: i32) {
    let source_rect = region.translate(ox, oy);
    let Some(clipped) = source_rect.intersect(&bounds(src)) else {
        return;
    };

    let src_stride = src.width() as usize * COLOR_BYTES;
    let dest_stride = dest.width() as usize * COLOR_BYTES;
    let len = clipped.width as usize * COLOR_BYTES;
    let s: &[u8] = src;
    let d: &mut [u8] = dest;

    for sy in clipped.y..clipped.bottom() {
        let dy = (sy - oy) as usize;
        let dx = (clipped.x - ox) as usize;
        let sp = sy as usize * src_stride + clipped.x as usize * COLOR_BYTES;
        let dp = dy * dest_stride + dx * COLOR_BYTES;
        d[dp..dp + len].copy_from_slice(&s[sp..sp + len]);
    }
}

/// Resample into `region` of `dest`.
///
/// # Arguments
///
/// * `offset_x`, `offset_y` - Destination position of the source origin
/// * `scale_x`, `scale_y` - Destination / source scale
/// * `wide` - Source exceeds the safe width of the standard copy path
#[allow(clippy::too_many_arguments)]
pub fn get_region(
    src: &RgbImage,
    dest: &mut RgbImage,
    region: Rect,
    offset_x: f64,
    offset_y: f64,
    scale_x: f64,
    scale_y: f64,
    interpolation: Interpolation,
    wide: bool,
) {
    let Some(region) = region.intersect(&bounds(dest)) else {
        return;
    };
    if src.width() == 0 || src.height() == 0 || scale_x <= 0.0 || scale_y <= 0.0 {
        return;
    }

    if scale_x == 1.0 && scale_y == 1.0 {
        let ox = (-offset_x).round() as i32;
        let oy = (-offset_y).round() as i32;
        if wide {
            copy_bytes(src, dest, region, ox, oy);
        } else {
            let source_rect = region.translate(ox, oy);
            copy_rect(src, source_rect, dest, region.x, region.y);
        }
        return;
    }

    let interpolation = if wide && interpolation == Interpolation::Nearest {
        Interpolation::Bilinear
    } else {
        interpolation
    };

    let max_x = (src.width() - 1) as f64;
    let max_y = (src.height() - 1) as f64;

    for dy in region.y..region.bottom() {
        let fy = ((dy as f64 + 0.5 - offset_y) / scale_y - 0.5).clamp(0.0, max_y);
        for dx in region.x..region.right() {
            let fx = ((dx as f64 + 0.5 - offset_x) / scale_x - 0.5).clamp(0.0, max_x);

            let nearest = || *src.get_pixel((fx + 0.5) as u32, (fy + 0.5) as u32);
            let pixel = match interpolation {
                Interpolation::Nearest => nearest(),
                Interpolation::Bilinear => {
                    interpolate_bilinear(src, fx as f32, fy as f32).unwrap_or_else(nearest)
                }
            };
            dest.put_pixel(dx as u32, dy as u32, pixel);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
