//! Tile cache integration tests.
//!
//! Tests verify:
//! - The byte budget holds across long pan sequences
//! - Eviction never drops visible tiles
//! - Zoom changes invalidate every tile without dropping storage

use tile_renderer::{run_until_idle, EngineConfig, RenderState};

use super::test_utils::{assert_shows_gradient, engine_for, gradient, render_all, MAX_TICKS};

/// Budget-constrained configuration: 1 MiB holds ten 128px tiles.
fn small_cache() -> EngineConfig {
    EngineConfig {
        tile_size: 128,
        cache_size_mb: 1,
        ..EngineConfig::default()
    }
}

// =============================================================================
// Budget
// =============================================================================

#[test]
fn test_budget_holds_while_panning() {
    let mut engine = engine_for(gradient(2048, 2048), 1.0, (256, 256), small_cache());
    render_all(&mut engine);

    let budget = engine.cache().budget();
    let positions = [
        (100, 0),
        (300, 40),
        (700, 300),
        (1200, 900),
        (1790, 1790),
        (0, 1500),
        (64, 64),
        (900, 100),
    ];

    for (x, y) in positions {
        let (dx, dy) = engine.view_mut().scroll_to(x, y);
        engine.scrolled(dx, dy);
        run_until_idle(&mut engine, MAX_TICKS);

        assert!(
            engine.cache().resident_bytes() <= budget,
            "over budget at {},{}: {} > {}",
            x,
            y,
            engine.cache().resident_bytes(),
            budget
        );
        assert_shows_gradient(&engine);
    }

    assert!(engine.stats().cache.evicted > 0);
}

#[test]
fn test_visible_tiles_survive_eviction() {
    let mut engine = engine_for(gradient(2048, 2048), 1.0, (256, 256), small_cache());
    render_all(&mut engine);

    for step in 1..=10 {
        let (dx, dy) = engine.view_mut().scroll_to(step * 150, step * 90);
        engine.scrolled(dx, dy);
        run_until_idle(&mut engine, MAX_TICKS);
    }

    let view = engine.view().clone();
    let visible = tile_renderer::geometry::Rect::new(
        view.x_scroll,
        view.y_scroll,
        view.vis_width,
        view.vis_height,
    );
    let visible_tiles = engine
        .cache()
        .iter()
        .filter(|tile| tile.is_visible(visible))
        .count();
    // 1500..1756 × 900..1156 touches 3 × 3 tiles
    assert_eq!(visible_tiles, 9);
    assert!(engine
        .cache()
        .iter()
        .filter(|tile| tile.is_visible(visible))
        .all(|tile| tile.done == RenderState::All && tile.has_storage()));
}

// =============================================================================
// Zoom Invalidation
// =============================================================================

#[test]
fn test_lazy_zoom_invalidates_all_tiles() {
    let mut engine = engine_for(gradient(512, 512), 1.0, (512, 512), EngineConfig {
        tile_size: 128,
        ..EngineConfig::default()
    });
    render_all(&mut engine);

    let tiles = engine.cache().len();
    let resident = engine.cache().resident_bytes();
    assert_eq!(tiles, 16);

    engine.view_mut().set_zoom(0.5);
    engine.zoom_changed(true);

    assert_eq!(engine.cache().len(), tiles);
    assert_eq!(engine.cache().resident_bytes(), resident);
    for tile in engine.cache().iter() {
        assert_eq!(tile.done, RenderState::None);
        assert_eq!(tile.todo, RenderState::All);
    }
    // Lazy: nothing queued yet
    assert!(engine.fast_queue().is_empty());
}

#[test]
fn test_zoom_rerenders_reused_tiles() {
    let mut engine = engine_for(gradient(512, 512), 1.0, (512, 512), EngineConfig {
        tile_size: 128,
        ..EngineConfig::default()
    });
    render_all(&mut engine);
    let before = engine.stats().renders();

    engine.view_mut().set_zoom(0.5);
    engine.zoom_changed(false);
    run_until_idle(&mut engine, MAX_TICKS);

    // 256 × 256 destination: the four tiles at the origin are rendered again.
    assert_eq!(engine.stats().renders() - before, 4);
    let tile = engine
        .cache()
        .peek(tile_renderer::TileCoord::new(128, 128))
        .unwrap();
    assert_eq!((tile.width, tile.height), (128, 128));
    let edge = engine
        .cache()
        .peek(tile_renderer::TileCoord::new(384, 0))
        .unwrap();
    assert_eq!(edge.width, 0);
}
