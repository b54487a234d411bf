//! View geometry supplied by the viewer that owns zoom and pan state.

use image::Rgb;
use serde::Serialize;

use crate::geometry::Rect;
use crate::stereo::{FixedOffsets, StereoOffsets};
use crate::transform::Orientation;

/// Resampling quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

/// Everything the renderer reads from its viewer.
///
/// All sizes are logical pixels. The destination image is the source after
/// orientation and zoom; `x_scroll`/`y_scroll` are positions inside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    /// Source size in displayed orientation (before zoom)
    pub image_width: i32,
    pub image_height: i32,

    /// Destination (zoomed) image size
    pub width: i32,
    pub height: i32,

    /// Top-left of the visible part of the destination image
    pub x_scroll: i32,
    pub y_scroll: i32,

    /// Size of the visible part of the destination image
    pub vis_width: i32,
    pub vis_height: i32,

    /// Position of the visible image inside the viewport
    pub x_offset: i32,
    pub y_offset: i32,

    pub viewport_width: i32,
    pub viewport_height: i32,

    /// Intrinsic image orientation
    pub orientation: Orientation,

    pub zoom_quality: Interpolation,

    /// Render a nearest-neighbour pass before the quality pass
    pub two_pass: bool,

    /// The post-process hook is expensive; skip it on fast passes
    pub post_process_slow: bool,

    /// The viewer is still receiving source data
    pub loading: bool,

    #[serde(skip)]
    pub border_color: Rgb<u8>,

    /// Source offsets of the two eyes of a stereo pair
    pub stereo_offsets: StereoOffsets,

    /// Output positions for fixed stereo layouts
    pub stereo_fixed: FixedOffsets,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            image_width: 0,
            image_height: 0,
            width: 0,
            height: 0,
            x_scroll: 0,
            y_scroll: 0,
            vis_width: 0,
            vis_height: 0,
            x_offset: 0,
            y_offset: 0,
            viewport_width: 0,
            viewport_height: 0,
            orientation: Orientation::Identity,
            zoom_quality: Interpolation::Bilinear,
            two_pass: false,
            post_process_slow: false,
            loading: false,
            border_color: Rgb([0, 0, 0]),
            stereo_offsets: StereoOffsets::default(),
            stereo_fixed: FixedOffsets::default(),
        }
    }
}

impl ViewState {
    /// Lay out an image of `source_width`×`source_height` stored pixels at
    /// `zoom` in a viewport, centring it when it is smaller than the viewport.
    pub fn fit(
        source_width: i32,
        source_height: i32,
        orientation: Orientation,
        zoom: f64,
        viewport_width: i32,
        viewport_height: i32,
    ) -> Self {
        let (image_width, image_height) = if orientation.swaps_axes() {
            (source_height, source_width)
        } else {
            (source_width, source_height)
        };

        let mut view = Self {
            image_width,
            image_height,
            viewport_width,
            viewport_height,
            orientation,
            ..Self::default()
        };
        view.set_zoom(zoom);
        view
    }

    /// Change zoom, keeping the scroll position inside the new image.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.width = ((self.image_width as f64 * zoom).round() as i32).max(1);
        self.height = ((self.image_height as f64 * zoom).round() as i32).max(1);
        self.relayout();
    }

    /// Recompute visible size and offsets after a size change.
    pub fn relayout(&mut self) {
        self.vis_width = self.width.min(self.viewport_width);
        self.vis_height = self.height.min(self.viewport_height);
        self.x_offset = ((self.viewport_width - self.vis_width) / 2).max(0);
        self.y_offset = ((self.viewport_height - self.vis_height) / 2).max(0);
        self.scroll_to(self.x_scroll, self.y_scroll);
    }

    /// Move the scroll position, clamped to the image. Returns the applied
    /// delta.
    pub fn scroll_to(&mut self, x: i32, y: i32) -> (i32, i32) {
        let x = x.clamp(0, (self.width - self.vis_width).max(0));
        let y = y.clamp(0, (self.height - self.vis_height).max(0));
        let delta = (x - self.x_scroll, y - self.y_scroll);
        self.x_scroll = x;
        self.y_scroll = y;
        delta
    }

    /// Destination / source scale.
    pub fn scale(&self) -> f64 {
        if self.image_width > 0 {
            self.width as f64 / self.image_width as f64
        } else {
            1.0
        }
    }

    /// Vertical destination / source scale.
    pub fn scale_y(&self) -> f64 {
        if self.image_height > 0 {
            self.height as f64 / self.image_height as f64
        } else {
            1.0
        }
    }

    pub fn visible_area(&self) -> i64 {
        self.vis_width as i64 * self.vis_height as i64
    }

    /// The destination image bounds.
    pub fn image_rect(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Whether the two-pass model applies for the current zoom.
    pub fn wants_fast_pass(&self) -> bool {
        self.two_pass
            && ((self.zoom_quality != Interpolation::Nearest && self.scale() != 1.0)
                || self.post_process_slow)
    }
}

// =============================================================================
// Tests
// =============================================================================
