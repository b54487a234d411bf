//! Rendering one tile.
//!
//! Rendering is split in two steps so the engine can allocate storage
//! through the cache in between:
//!
//! 1. [`plan_render`] updates the tile's render state and decides which part
//!    of the tile (if any) must be produced.
//! 2. [`paint`] produces that part into the tile's pixel buffer, applies the
//!    orientation transform and the post-process hook, and copies the result
//!    onto the tile surface.
//!
//! ```text
//!   source ──resample──► pixbuf ──(anaglyph)──► orientation ──► post-process
//!                                                                    │
//!                                              tile surface ◄──copy──┘
//! ```

use image::{Rgb, RgbImage};
use tracing::{trace, warn};

use crate::geometry::Rect;
use crate::source::ImageSource;
use crate::stereo::StereoMode;
use crate::tile::{RenderState, Tile};
use crate::transform::ScratchTile;

use super::bridge::{BridgeRequest, SourceTileBridge};
use super::resample::{bounds, copy_rect, fill_rect, get_region};
use super::view::{Interpolation, ViewState};

/// Hook run on freshly resampled pixels before they reach the tile surface.
///
/// Receives the tile pixel buffer and the device-pixel rectangle that was
/// produced.
pub type PostProcessFn = Box<dyn FnMut(&mut RgbImage, Rect)>;

/// Everything [`paint`] reads besides the tile itself.
pub struct PaintContext<'a, P: ImageSource + ?Sized> {
    pub source: &'a mut P,
    pub view: &'a ViewState,
    pub stereo: StereoMode,
    pub tile_size: i32,
    pub hidpi_scale: i32,
    pub min_scale_size: i32,
    pub wide_image_threshold: i32,
    pub placeholder: Rgb<u8>,
    pub scratch: &'a mut ScratchTile,
    pub post_process: Option<&'a mut PostProcessFn>,
}

/// Update render state for a request to render `region` of `tile`.
///
/// Returns the tile-local rectangle to paint, or `None` when the tile is
/// already up to date. A tile that was never completely rendered is always
/// painted whole. Fast renders leave the state untouched so the refined pass
/// still runs.
pub fn plan_render(tile: &mut Tile, region: Rect, new_data: bool, fast: bool) -> Option<Rect> {
    if tile.todo == RenderState::None && tile.has_storage() && !new_data {
        return None;
    }

    let region = if tile.done != RenderState::All {
        if !fast {
            tile.done = RenderState::All;
        }
        Rect::new(0, 0, tile.width, tile.height)
    } else if tile.todo != RenderState::Area {
        if !fast {
            tile.todo = RenderState::None;
        }
        return None;
    } else {
        region
    };

    if !fast {
        tile.todo = RenderState::None;
    }
    if new_data {
        tile.blank = false;
    }

    (!region.is_empty()).then_some(region)
}

/// Produce `region` of `tile` onto its surface.
///
/// The tile must have storage; a tile without it is left untouched.
pub fn paint<P: ImageSource + ?Sized>(
    ctx: &mut PaintContext<'_, P>,
    tile: &mut Tile,
    region: Rect,
    fast: bool,
) {
    let hidpi = ctx.hidpi_scale;
    let coord = tile.coord;
    let device_region = region.scale(hidpi);
    let fill = ctx.placeholder;

    let (Some(surface), Some(pixbuf)) = (tile.surface.as_mut(), tile.pixbuf.as_mut()) else {
        return;
    };

    if tile.blank {
        fill_rect(surface, device_region, fill);
        return;
    }

    let view = ctx.view;
    let degenerate = view.width < ctx.min_scale_size || view.height < ctx.min_scale_size;
    let interpolation = if fast || degenerate {
        Interpolation::Nearest
    } else {
        view.zoom_quality
    };

    if ctx.source.source_tiles_enabled() {
        let request = BridgeRequest {
            tile_x: coord.x,
            tile_y: coord.y,
            region,
            hidpi_scale: hidpi,
            interpolation,
            placeholder: fill,
        };
        if !SourceTileBridge.render(&mut *ctx.source, view, pixbuf, &request) {
            fill_rect(surface, device_region, fill);
            return;
        }
    } else {
        if view.image_width == 0 || view.image_height == 0 {
            return;
        }
        let Some(pixels) = ctx.source.source_pixels() else {
            tile.blank = true;
            fill_rect(surface, device_region, fill);
            return;
        };

        let orientation = view
            .orientation
            .compose_stereo(ctx.stereo.contains(StereoMode::MIRROR), ctx.stereo.contains(StereoMode::FLIP));

        let mut scale_x = hidpi as f64 * view.width as f64 / view.image_width as f64;
        let mut scale_y = hidpi as f64 * view.height as f64 / view.image_height as f64;

        let ts = ctx.tile_size as f64;
        let (src_x, src_y) = orientation.map_tile_origin(
            coord.x as f64,
            coord.y as f64,
            view.width as f64,
            view.height as f64,
            ts,
            ts,
        );
        let src_x = src_x * hidpi as f64;
        let src_y = src_y * hidpi as f64;
        let pb_rect = orientation
            .map_tile_region(region, ctx.tile_size, ctx.tile_size)
            .scale(hidpi);

        if orientation.swaps_axes() {
            std::mem::swap(&mut scale_x, &mut scale_y);
        }

        let wide = pixels.width() as i64 > ctx.wide_image_threshold as i64;
        let primary = ctx.stereo.primary_offset(&view.stereo_offsets) as f64;

        get_region(
            pixels,
            pixbuf,
            pb_rect,
            -src_x - primary * scale_x,
            -src_y,
            scale_x,
            scale_y,
            interpolation,
            wide,
        );

        if let Some(anaglyph) = ctx.stereo.anaglyph() {
            if view.stereo_offsets.is_stereo() {
                let secondary = ctx.stereo.secondary_offset(&view.stereo_offsets) as f64;
                let other = ctx.scratch.buffer(pixbuf.width(), pixbuf.height());
                get_region(
                    pixels,
                    other,
                    pb_rect,
                    -src_x - secondary * scale_x,
                    -src_y,
                    scale_x,
                    scale_y,
                    interpolation,
                    wide,
                );
                if let Some(r) = pb_rect.intersect(&bounds(pixbuf)) {
                    anaglyph.compose(
                        pixbuf,
                        other,
                        r.x as u32,
                        r.y as u32,
                        r.width as u32,
                        r.height as u32,
                    );
                }
            }
        }

        if let Err(e) = ctx.scratch.apply_orientation(pixbuf, orientation, pb_rect) {
            warn!(x = coord.x, y = coord.y, error = %e, "Orientation transform failed");
            return;
        }
    }

    if !(view.post_process_slow && fast) {
        if let Some(hook) = ctx.post_process.as_deref_mut() {
            hook(&mut *pixbuf, device_region);
        }
    }

    copy_rect(pixbuf, device_region, surface, device_region.x, device_region.y);
    trace!(x = coord.x, y = coord.y, ?region, fast, "Rendered tile");
}

// =============================================================================
// Tests
// =============================================================================
