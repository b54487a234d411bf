//! Scroll tests.
//!
//! Tests verify:
//! - Scrolling only queues the newly exposed strips
//! - Surface content is shifted instead of re-rendered
//! - Large jumps fall back to a full redraw
//! - Scrolled-off tiles are refreshed on new data without being painted

use image::Rgb;

use tile_renderer::geometry::Rect;
use tile_renderer::{run_until_idle, TileCoord};

use super::test_utils::{assert_shows_gradient, config, engine_for, gradient, render_all, MAX_TICKS};

#[test]
fn test_small_scroll_reuses_rendered_tiles() {
    let mut engine = engine_for(gradient(2000, 1500), 1.0, (800, 600), config(128));
    render_all(&mut engine);
    let renders = engine.stats().renders();

    let (dx, dy) = engine.view_mut().scroll_to(50, 0);
    assert_eq!((dx, dy), (50, 0));
    engine.scrolled(dx, dy);

    // The exposed strip (800..850) lies in the tile column at 768, which was
    // rendered in full before the scroll.
    let queued: Vec<TileCoord> = engine.fast_queue().iter().map(|job| job.coord).collect();
    assert_eq!(queued.len(), 5);
    assert!(queued.iter().all(|coord| coord.x == 768));
    for job in engine.fast_queue().iter() {
        assert_eq!(job.rect.x, 32);
        assert_eq!(job.rect.width, 50);
    }

    run_until_idle(&mut engine, MAX_TICKS);

    assert_eq!(engine.stats().renders(), renders);
    assert_shows_gradient(&engine);
}

#[test]
fn test_scroll_into_new_tiles_renders_only_strip() {
    let mut engine = engine_for(gradient(2000, 1500), 1.0, (800, 600), config(128));
    render_all(&mut engine);
    let before = engine.stats().renders();

    let (dx, dy) = engine.view_mut().scroll_to(0, 100);
    engine.scrolled(dx, dy);
    run_until_idle(&mut engine, MAX_TICKS);

    // Rows 600..700 hit the tile row at 640: 7 new tiles across 800 pixels.
    assert_eq!(engine.stats().renders() - before, 7);
    assert_shows_gradient(&engine);
}

#[test]
fn test_diagonal_scroll_back() {
    let mut engine = engine_for(gradient(2000, 1500), 1.0, (400, 300), config(64));
    engine.view_mut().scroll_to(500, 500);
    render_all(&mut engine);

    let (dx, dy) = engine.view_mut().scroll_to(430, 460);
    assert_eq!((dx, dy), (-70, -40));
    engine.scrolled(dx, dy);
    run_until_idle(&mut engine, MAX_TICKS);

    assert_shows_gradient(&engine);
}

#[test]
fn test_jump_larger_than_viewport_redraws() {
    let mut engine = engine_for(gradient(2000, 1500), 1.0, (400, 300), config(64));
    render_all(&mut engine);

    let (dx, dy) = engine.view_mut().scroll_to(1000, 900);
    engine.scrolled(dx, dy);

    // Whole visible rectangle queued: 7 × 5 tiles (1000..1400 × 900..1200)
    assert_eq!(engine.fast_queue().len(), 7 * 5);
    run_until_idle(&mut engine, MAX_TICKS);
    assert_shows_gradient(&engine);
}

#[test]
fn test_offscreen_tile_refreshed_without_paint() {
    let mut engine = engine_for(gradient(400, 200), 1.0, (200, 200), config(64));
    render_all(&mut engine);

    let (dx, dy) = engine.view_mut().scroll_to(200, 0);
    engine.scrolled(dx, dy);
    run_until_idle(&mut engine, MAX_TICKS);

    let surface = engine.surface().clone();
    let stats = engine.stats();

    // The tile at the origin is now off-screen but fully rendered.
    if let Some(pixels) = engine.source_mut().pixels_mut() {
        pixels.put_pixel(10, 10, Rgb([1, 2, 3]));
    }
    engine.area_changed(Rect::new(10, 10, 1, 1));
    assert_eq!(engine.fast_queue().len(), 1);
    run_until_idle(&mut engine, MAX_TICKS);

    let after = engine.stats();
    assert_eq!(after.renders(), stats.renders() + 1);
    assert_eq!(after.exposes, stats.exposes);
    assert_eq!(engine.surface(), &surface);

    let tile = engine.cache().peek(TileCoord::new(0, 0)).unwrap();
    assert_eq!(tile.surface.as_ref().unwrap().get_pixel(10, 10), &Rgb([1, 2, 3]));
}
