//! Scheduling tests.
//!
//! Tests verify:
//! - Registration follows the queued share of the visible area, with hysteresis
//! - Loading views are always served at background priority
//! - The async host driver drains the engine on a tokio runtime

use std::time::Duration;

use tile_renderer::geometry::Rect;
use tile_renderer::{drive, Priority, Registration, RenderState};

use super::test_utils::{assert_shows_gradient, config, engine_for, gradient, render_all};

const REDRAW: Registration = Registration::Now(Priority::Redraw);
const WAIT: Registration = Registration::After(Duration::from_millis(50));

#[test]
fn test_priority_hysteresis_while_draining() {
    let mut engine = engine_for(gradient(800, 600), 1.0, (800, 600), config(128));
    render_all(&mut engine);

    // 800 × 100 of 800 × 600 queued: 16.7 %, seven jobs (six 128 wide, one 32)
    engine.enqueue(Rect::new(0, 0, 800, 100), true, RenderState::All, false, false);
    assert_eq!(engine.fast_queue().len(), 7);
    assert_eq!(engine.registration(), Some(REDRAW));

    let mut seen = Vec::new();
    while engine.process_next() {
        seen.push((engine.fast_queue().queued_area(), engine.registration()));
    }

    assert_eq!(
        seen,
        vec![
            // 14.0 %, 11.3 %: above high
            (67_200, Some(REDRAW)),
            (54_400, Some(REDRAW)),
            // 8.7 %, 6.0 %, 3.3 %: inside the band, kept
            (41_600, Some(REDRAW)),
            (28_800, Some(REDRAW)),
            (16_000, Some(REDRAW)),
            // 0.7 %: below low
            (3_200, Some(WAIT)),
        ]
    );
    assert_eq!(engine.registration(), None);
}

#[test]
fn test_first_job_after_idle_forces_registration() {
    let mut engine = engine_for(gradient(800, 600), 1.0, (800, 600), config(128));
    render_all(&mut engine);

    // 5 % is inside the band, but nothing is registered yet.
    engine.enqueue(Rect::new(0, 0, 240, 100), true, RenderState::All, false, false);
    assert_eq!(engine.registration(), Some(WAIT));
    assert_eq!(engine.scheduler().current(), Some(WAIT));
}

#[test]
fn test_loading_uses_background_priority() {
    let mut engine = engine_for(gradient(256, 256), 1.0, (256, 256), config(64));
    engine.view_mut().loading = true;
    engine.zoom_changed(false);

    assert_eq!(engine.registration(), Some(Registration::Now(Priority::Background)));
    engine.process_next();
    assert_eq!(engine.registration(), Some(Registration::Now(Priority::Background)));
}

#[test]
fn test_custom_thresholds_from_config() {
    let config = tile_renderer::EngineConfig {
        tile_size: 128,
        high_priority_percent: 50.0,
        low_priority_percent: 20.0,
        redraw_delay_ms: 5,
        ..tile_renderer::EngineConfig::default()
    };
    let mut engine = engine_for(gradient(800, 600), 1.0, (800, 600), config);
    render_all(&mut engine);

    engine.enqueue(Rect::new(0, 0, 800, 100), true, RenderState::All, false, false);
    assert_eq!(
        engine.registration(),
        Some(Registration::After(Duration::from_millis(5)))
    );
}

// =============================================================================
// Async Driver
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_drive_renders_to_completion() {
    let mut engine = engine_for(gradient(300, 200), 1.0, (300, 200), config(64));
    engine.zoom_changed(false);

    let ticks = drive(&mut engine).await;

    assert_eq!(ticks, 20);
    assert_eq!(engine.registration(), None);
    assert_shows_gradient(&engine);
}

#[tokio::test(start_paused = true)]
async fn test_drive_waits_for_small_updates() {
    let mut engine = engine_for(gradient(800, 600), 1.0, (800, 600), config(128));
    render_all(&mut engine);

    engine.enqueue(Rect::new(10, 10, 4, 4), true, RenderState::Area, true, false);
    assert_eq!(engine.registration(), Some(WAIT));

    let started = tokio::time::Instant::now();
    drive(&mut engine).await;

    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!(engine.stats().completions, 2);
}
