//! Source tile tests.
//!
//! Tests verify:
//! - Destination tiles assembled from misaligned source tiles
//! - Zoomed rendering from source tiles
//! - Placeholders for unavailable regions and their refresh

use image::Rgb;

use tile_renderer::geometry::Rect;
use tile_renderer::{
    run_until_idle, EngineConfig, Interpolation, ManualScheduler, Orientation, TileRenderer,
    TiledImageSource, ViewState,
};

use super::test_utils::{
    assert_shows_gradient, gradient, gradient_pixel, tiled_source, SourceProbe, MAX_TICKS,
};

const PLACEHOLDER: [u8; 3] = [7, 7, 7];

fn engine(
    width: u32,
    height: u32,
    zoom: f64,
    source_tile: i32,
    probe: SourceProbe,
) -> TileRenderer<TiledImageSource, ManualScheduler> {
    let source = tiled_source(gradient(width, height), source_tile, 64, probe);
    let view = ViewState::fit(
        width as i32,
        height as i32,
        Orientation::Identity,
        zoom,
        (width as f64 * zoom) as i32,
        (height as f64 * zoom) as i32,
    );
    let config = EngineConfig {
        tile_size: 64,
        placeholder_color: PLACEHOLDER,
        ..EngineConfig::default()
    };
    TileRenderer::new(config, source, ManualScheduler::new(), view).unwrap()
}

#[test]
fn test_misaligned_source_tiles_render_exactly() {
    let probe = SourceProbe::default();
    let mut engine = engine(300, 200, 1.0, 50, probe.clone());
    engine.zoom_changed(false);
    run_until_idle(&mut engine, MAX_TICKS);

    assert_shows_gradient(&engine);
    // 6 × 4 source tiles, each requested once
    assert_eq!(probe.requests.get(), 24);
    assert_eq!(engine.source().len(), 24);
}

#[test]
fn test_zoomed_source_tiles_nearest() {
    let mut engine = engine(100, 100, 2.0, 40, SourceProbe::default());
    engine.view_mut().zoom_quality = Interpolation::Nearest;
    engine.zoom_changed(false);
    run_until_idle(&mut engine, MAX_TICKS);

    let surface = engine.surface();
    for (x, y) in [(0, 0), (1, 1), (79, 80), (81, 3), (199, 199)] {
        assert_eq!(
            surface.get_pixel(x, y),
            &gradient_pixel(x / 2, y / 2),
            "pixel {},{}",
            x,
            y
        );
    }
}

#[test]
fn test_unavailable_region_shows_placeholder_until_refreshed() {
    let probe = SourceProbe::default();
    probe.unavailable_from.set(Some(100));

    let mut engine = engine(200, 100, 1.0, 50, probe.clone());
    engine.zoom_changed(false);
    run_until_idle(&mut engine, MAX_TICKS);

    assert_eq!(engine.surface().get_pixel(20, 20), &gradient_pixel(20, 20));
    assert_eq!(engine.surface().get_pixel(150, 50), &Rgb(PLACEHOLDER));
    assert_eq!(engine.surface().get_pixel(100, 0), &Rgb(PLACEHOLDER));

    probe.unavailable_from.set(None);
    engine.source_changed(Rect::new(0, 0, 200, 100));
    run_until_idle(&mut engine, MAX_TICKS);

    assert_shows_gradient(&engine);
}

#[test]
fn test_refresh_without_new_data_queues_nothing() {
    let probe = SourceProbe::default();
    probe.unavailable_from.set(Some(0));

    let mut engine = engine(128, 128, 1.0, 64, probe.clone());
    engine.zoom_changed(false);
    run_until_idle(&mut engine, MAX_TICKS);

    engine.source_changed(Rect::new(0, 0, 128, 128));
    assert!(engine.fast_queue().is_empty());
    assert_eq!(engine.registration(), None);
}
