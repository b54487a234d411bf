//! Rendering destination tiles from coarse source tiles.
//!
//! A destination tile region is projected back into source space, the
//! overlapping source tiles are fetched (or requested) from the
//! [`ImageSource`], and each one is resampled into the part of the tile it
//! covers:
//!
//! ```text
//!   source tiles (unscaled)          destination tile (zoomed)
//!   ┌──────┬──────┐                  ┌────────────┐
//!   │ st0  │ st1  │   × scale  ──►   │ st0 │ st1  │
//!   ├──────┼──────┤                  │─────┼──────│
//!   │ st2  │ st3  │                  │ st2 │ st3  │
//!   └──────┴──────┘                  └────────────┘
//! ```
//!
//! Projected source rectangles are widened to whole destination pixels
//! (floor of the left edge, ceil of the right edge) so adjoining source
//! tiles never leave a seam.

use image::{Rgb, RgbImage};

use crate::geometry::Rect;
use crate::source::ImageSource;

use super::resample::{fill_rect, get_region};
use super::view::{Interpolation, ViewState};

/// Inputs for one bridged render.
#[derive(Debug, Clone, Copy)]
pub struct BridgeRequest {
    /// Tile origin in destination space
    pub tile_x: i32,
    pub tile_y: i32,

    /// Sub-rectangle of the tile, tile-local logical pixels
    pub region: Rect,

    pub hidpi_scale: i32,
    pub interpolation: Interpolation,
    pub placeholder: Rgb<u8>,
}

/// Resamples source tiles into tile buffers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceTileBridge;

impl SourceTileBridge {
    /// Render `request.region` of a tile into `pixbuf`.
    ///
    /// Returns whether any real pixel data was drawn. Blank source tiles are
    /// filled with the placeholder colour; parts with no overlapping source
    /// tile are left untouched.
    pub fn render<P: ImageSource + ?Sized>(
        &self,
        source: &mut P,
        view: &ViewState,
        pixbuf: &mut RgbImage,
        request: &BridgeRequest,
    ) -> bool {
        if view.image_width == 0 || view.image_height == 0 {
            return false;
        }
        let Some((st_width, st_height)) = source.source_tile_size() else {
            return false;
        };

        let scale_x = view.width as f64 / view.image_width as f64;
        let scale_y = view.height as f64 / view.image_height as f64;
        let hidpi = request.hidpi_scale;
        let region = request.region;

        let src_x1 = ((request.tile_x + region.x) as f64 / scale_x).floor() as i32;
        let src_y1 = ((request.tile_y + region.y) as f64 / scale_y).floor() as i32;
        let src_x2 = ((request.tile_x + region.right()) as f64 / scale_x).ceil() as i32;
        let src_y2 = ((request.tile_y + region.bottom()) as f64 / scale_y).ceil() as i32;
        let src_rect = Rect::new(
            src_x1,
            src_y1,
            (src_x2 - src_x1).max(1),
            (src_y2 - src_y1).max(1),
        );
        let visible_src = Rect::new(
            (view.x_scroll as f64 / scale_x) as i32,
            (view.y_scroll as f64 / scale_y) as i32,
            (view.vis_width as f64 / scale_x).ceil() as i32,
            (view.vis_height as f64 / scale_y).ceil() as i32,
        );

        let tile_rect = Rect::new(
            request.tile_x + region.x,
            request.tile_y + region.y,
            region.width,
            region.height,
        );

        let mut drawn = false;
        for st in source.compute_source_tiles(src_rect, visible_src) {
            let st_x = (st.x as f64 * scale_x).floor() as i32;
            let st_y = (st.y as f64 * scale_y).floor() as i32;
            let st_rect = Rect::new(
                st_x,
                st_y,
                ((st.x + st_width) as f64 * scale_x).ceil() as i32 - st_x,
                ((st.y + st_height) as f64 * scale_y).ceil() as i32 - st_y,
            );

            let Some(r) = st_rect.intersect(&tile_rect) else {
                continue;
            };
            let local = r.translate(-request.tile_x, -request.tile_y).scale(hidpi);

            match (&st.pixels, st.blank) {
                (Some(pixels), false) => {
                    let offset_x = hidpi as f64 * (st_x - request.tile_x) as f64;
                    let offset_y = hidpi as f64 * (st_y - request.tile_y) as f64;
                    get_region(
                        pixels,
                        pixbuf,
                        local,
                        offset_x,
                        offset_y,
                        hidpi as f64 * scale_x,
                        hidpi as f64 * scale_y,
                        request.interpolation,
                        false,
                    );
                    drawn = true;
                }
                _ => fill_rect(pixbuf, local, request.placeholder),
            }
        }

        drawn
    }
}

// =============================================================================
// Tests
// =============================================================================
