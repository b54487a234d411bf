//! Test utilities for integration tests.
//!
//! Synthetic sources and engine builders shared by the test modules.

use std::cell::Cell;
use std::rc::Rc;

use image::{imageops, Rgb, RgbImage};

use tile_renderer::geometry::Rect;
use tile_renderer::{
    run_until_idle, EngineConfig, FullImageSource, ImageSource, ManualScheduler, Orientation,
    Scheduler, SourceError, TileRenderer, TiledImageSource, ViewState,
};

/// Upper bound on callbacks when draining an engine synchronously.
pub const MAX_TICKS: usize = 100_000;

// =============================================================================
// Synthetic Images
// =============================================================================

/// Colour of the gradient at `(x, y)`.
pub fn gradient_pixel(x: u32, y: u32) -> Rgb<u8> {
    Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
}

/// An image where every pixel encodes its own position.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, gradient_pixel)
}

/// A side-by-side stereo pair: left eye `left`, right eye `right`.
pub fn stereo_pair(eye_width: u32, height: u32, left: Rgb<u8>, right: Rgb<u8>) -> RgbImage {
    RgbImage::from_fn(eye_width * 2, height, |x, _| if x < eye_width { left } else { right })
}

// =============================================================================
// Engine Builders
// =============================================================================

pub fn config(tile_size: i32) -> EngineConfig {
    EngineConfig {
        tile_size,
        ..EngineConfig::default()
    }
}

/// An engine over a fully decoded image at identity orientation.
pub fn engine_for(
    pixels: RgbImage,
    zoom: f64,
    viewport: (i32, i32),
    config: EngineConfig,
) -> TileRenderer<FullImageSource, ManualScheduler> {
    let view = ViewState::fit(
        pixels.width() as i32,
        pixels.height() as i32,
        Orientation::Identity,
        zoom,
        viewport.0,
        viewport.1,
    );
    TileRenderer::new(config, FullImageSource::new(pixels), ManualScheduler::new(), view)
        .expect("valid engine configuration")
}

/// Queue the whole image and drain every job.
pub fn render_all<P: ImageSource, S: Scheduler>(engine: &mut TileRenderer<P, S>) {
    engine.zoom_changed(false);
    run_until_idle(engine, MAX_TICKS);
    assert!(engine.registration().is_none(), "engine did not go idle");
}

/// Assert the viewport area of the surface shows the destination image
/// starting at the view's scroll position (1:1 zoom, identity orientation).
pub fn assert_shows_gradient<P: ImageSource, S: Scheduler>(engine: &TileRenderer<P, S>) {
    let view = engine.view();
    let surface = engine.surface();
    for vy in 0..view.vis_height {
        for vx in 0..view.vis_width {
            let expected = gradient_pixel((vx + view.x_scroll) as u32, (vy + view.y_scroll) as u32);
            let actual = surface.get_pixel((vx + view.x_offset) as u32, (vy + view.y_offset) as u32);
            assert_eq!(actual, &expected, "viewport pixel {},{}", vx, vy);
        }
    }
}

// =============================================================================
// Tiled Sources
// =============================================================================

/// Request counter and availability switch shared with a tiled source.
#[derive(Clone, Default)]
pub struct SourceProbe {
    pub requests: Rc<Cell<usize>>,

    /// Regions starting at or right of this x report no data
    pub unavailable_from: Rc<Cell<Option<i32>>>,
}

/// Serve `pixels` as on-demand source tiles of `tile_size`.
pub fn tiled_source(pixels: RgbImage, tile_size: i32, capacity: usize, probe: SourceProbe) -> TiledImageSource {
    let (width, height) = (pixels.width() as i32, pixels.height() as i32);

    TiledImageSource::new(
        width,
        height,
        tile_size,
        tile_size,
        capacity,
        Box::new(move |r: Rect| -> Result<Option<RgbImage>, SourceError> {
            probe.requests.set(probe.requests.get() + 1);
            if let Some(limit) = probe.unavailable_from.get() {
                if r.x >= limit {
                    return Ok(None);
                }
            }
            Ok(Some(
                imageops::crop_imm(&pixels, r.x as u32, r.y as u32, r.width as u32, r.height as u32)
                    .to_image(),
            ))
        }),
    )
}
