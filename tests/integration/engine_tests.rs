//! End-to-end rendering tests.
//!
//! Tests verify:
//! - Rendered output matches the source pixel for pixel
//! - Borders around images smaller than the viewport
//! - HiDPI surfaces and zoomed output
//! - Overlays, post-processing and job coalescing through the engine

use image::{Rgb, Rgba, RgbaImage};

use tile_renderer::geometry::Rect;
use tile_renderer::{
    run_until_idle, EngineConfig, FullImageSource, Interpolation, ManualScheduler, Orientation,
    OverlayFlags, RenderState, TileCoord, TileRenderer, ViewState,
};

use super::test_utils::{
    assert_shows_gradient, config, engine_for, gradient, gradient_pixel, render_all, MAX_TICKS,
};

// =============================================================================
// Full Renders
// =============================================================================

#[test]
fn test_full_render_matches_source() {
    let mut engine = engine_for(gradient(300, 200), 1.0, (300, 200), config(64));
    render_all(&mut engine);

    assert_shows_gradient(&engine);
    let stats = engine.stats();
    // 5 × 4 tiles, each rendered once
    assert_eq!(stats.renders(), 20);
    assert_eq!(stats.cache.tiles, 20);
}

#[test]
fn test_render_at_scroll_position() {
    let mut engine = engine_for(gradient(1000, 800), 1.0, (320, 240), config(64));
    engine.view_mut().scroll_to(100, 70);
    render_all(&mut engine);

    assert_shows_gradient(&engine);
    // Only tiles touching the visible rectangle were created.
    assert!(engine
        .cache()
        .iter()
        .all(|tile| tile.is_visible(Rect::new(100, 70, 320, 240))));
}

#[test]
fn test_border_around_centered_image() {
    let mut engine = engine_for(gradient(100, 50), 1.0, (200, 150), config(32));
    engine.view_mut().border_color = Rgb([1, 2, 3]);
    render_all(&mut engine);

    let surface = engine.surface();
    // Image at (50, 50) - (150, 100)
    assert_eq!(surface.get_pixel(0, 0), &Rgb([1, 2, 3]));
    assert_eq!(surface.get_pixel(49, 75), &Rgb([1, 2, 3]));
    assert_eq!(surface.get_pixel(150, 75), &Rgb([1, 2, 3]));
    assert_eq!(surface.get_pixel(100, 49), &Rgb([1, 2, 3]));
    assert_eq!(surface.get_pixel(100, 100), &Rgb([1, 2, 3]));
    assert_shows_gradient(&engine);
}

#[test]
fn test_missing_source_paints_border_only() {
    let view = ViewState::fit(64, 64, Orientation::Identity, 1.0, 64, 64);
    let mut engine = TileRenderer::new(
        config(32),
        FullImageSource::empty(),
        ManualScheduler::new(),
        view,
    )
    .unwrap();
    engine.view_mut().border_color = Rgb([9, 9, 9]);

    render_all(&mut engine);

    assert!(engine.surface().pixels().all(|p| *p == Rgb([9, 9, 9])));
    assert_eq!(engine.stats().renders(), 0);
}

#[test]
fn test_hidpi_surface_doubles_pixels() {
    let config = EngineConfig {
        tile_size: 32,
        hidpi_scale: 2,
        ..EngineConfig::default()
    };
    let mut engine = engine_for(gradient(64, 64), 1.0, (64, 64), config);
    engine.view_mut().zoom_quality = Interpolation::Nearest;
    render_all(&mut engine);

    let surface = engine.surface();
    assert_eq!(surface.dimensions(), (128, 128));
    for (x, y) in [(0, 0), (10, 3), (31, 32), (63, 63)] {
        let expected = gradient_pixel(x, y);
        assert_eq!(surface.get_pixel(2 * x, 2 * y), &expected);
        assert_eq!(surface.get_pixel(2 * x + 1, 2 * y + 1), &expected);
    }
}

#[test]
fn test_zoomed_out_nearest() {
    let mut engine = engine_for(gradient(200, 200), 0.5, (100, 100), config(32));
    engine.view_mut().zoom_quality = Interpolation::Nearest;
    render_all(&mut engine);

    let surface = engine.surface();
    for (x, y) in [(0, 0), (17, 40), (33, 64), (99, 99)] {
        assert_eq!(
            surface.get_pixel(x, y),
            &gradient_pixel(2 * x + 1, 2 * y + 1),
            "pixel {},{}",
            x,
            y
        );
    }
}

// =============================================================================
// Jobs
// =============================================================================

#[test]
fn test_overlapping_damage_coalesces_into_one_job() {
    let mut engine = engine_for(gradient(256, 256), 1.0, (256, 256), config(64));
    render_all(&mut engine);

    engine.enqueue(Rect::new(70, 70, 10, 10), true, RenderState::Area, true, false);
    engine.enqueue(Rect::new(75, 72, 20, 4), true, RenderState::Area, false, false);

    let queue = engine.fast_queue();
    assert_eq!(queue.len(), 1);
    let job = queue.get(TileCoord::new(64, 64)).unwrap();
    assert_eq!(job.rect, Rect::new(6, 6, 25, 10));
    assert!(job.new_data);

    run_until_idle(&mut engine, MAX_TICKS);
    assert!(engine.fast_queue().is_empty());
}

#[test]
fn test_damage_spanning_tiles_splits_per_tile() {
    let mut engine = engine_for(gradient(256, 256), 1.0, (256, 256), config(64));
    render_all(&mut engine);

    engine.enqueue(Rect::new(60, 10, 10, 10), true, RenderState::Area, true, false);

    let rects: Vec<_> = engine.fast_queue().iter().map(|j| (j.coord, j.rect)).collect();
    assert_eq!(
        rects,
        vec![
            (TileCoord::new(0, 0), Rect::new(60, 10, 4, 10)),
            (TileCoord::new(64, 0), Rect::new(0, 10, 6, 10)),
        ]
    );
}

#[test]
fn test_post_process_applies_to_rendered_tiles() {
    let mut engine = engine_for(gradient(64, 64), 1.0, (64, 64), config(32));
    engine.set_post_process(Some(Box::new(|pixbuf: &mut image::RgbImage, r: Rect| {
        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                let p = pixbuf.get_pixel_mut(x as u32, y as u32);
                p.0 = [255 - p.0[0], 255 - p.0[1], 255 - p.0[2]];
            }
        }
    })));
    render_all(&mut engine);

    let expected = gradient_pixel(20, 40).0.map(|c| 255 - c);
    assert_eq!(engine.surface().get_pixel(20, 40), &Rgb(expected));
}

#[test]
fn test_clear_drops_everything() {
    let mut engine = engine_for(gradient(256, 256), 1.0, (128, 128), config(64));
    render_all(&mut engine);
    engine.enqueue(Rect::new(0, 0, 64, 64), true, RenderState::All, false, false);

    engine.clear();

    assert!(engine.cache().is_empty());
    assert_eq!(engine.cache().resident_bytes(), 0);
    assert!(engine.fast_queue().is_empty());
    assert_eq!(engine.registration(), None);
}

#[test]
fn test_stats_serialize() {
    let mut engine = engine_for(gradient(64, 64), 1.0, (64, 64), config(32));
    render_all(&mut engine);

    let value = serde_json::to_value(engine.stats()).unwrap();
    assert_eq!(value["jobs_processed"], 4);
    assert_eq!(value["completions"], 1);
    assert_eq!(value["cache"]["tiles"], 4);
}

// =============================================================================
// Overlays
// =============================================================================

#[test]
fn test_overlay_moves_and_restores_image() {
    let mut engine = engine_for(gradient(128, 128), 1.0, (128, 128), config(32));
    render_all(&mut engine);

    let red = RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255]));
    let id = engine
        .overlay_add(red.clone(), 10, 10, OverlayFlags::empty())
        .unwrap();
    run_until_idle(&mut engine, MAX_TICKS);
    assert_eq!(engine.surface().get_pixel(12, 12), &Rgb([255, 0, 0]));

    engine.overlay_set(id, Some(red), Some((60, 60))).unwrap();
    run_until_idle(&mut engine, MAX_TICKS);

    assert_eq!(engine.surface().get_pixel(12, 12), &gradient_pixel(12, 12));
    assert_eq!(engine.surface().get_pixel(62, 62), &Rgb([255, 0, 0]));
    assert_eq!(engine.overlay_get(id).map(|(_, x, y)| (x, y)), Some((60, 60)));
}

#[test]
fn test_overlay_half_alpha_blends() {
    let mut engine = engine_for(gradient(64, 64), 1.0, (64, 64), config(32));
    render_all(&mut engine);

    engine
        .overlay_add(
            RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 128])),
            0,
            0,
            OverlayFlags::empty(),
        )
        .unwrap();
    run_until_idle(&mut engine, MAX_TICKS);

    // Half-transparent white over the black pixel at the origin
    assert_eq!(engine.surface().get_pixel(0, 0), &Rgb([128, 128, 128]));
}
