//! Orientation tests.
//!
//! Every EXIF orientation rendered through the engine must match the stored
//! image transformed with `image::imageops`.

use image::{imageops, RgbImage};

use tile_renderer::{
    run_until_idle, FullImageSource, Interpolation, ManualScheduler, Orientation, TileRenderer,
    ViewState,
};

use super::test_utils::{config, gradient, MAX_TICKS};

/// The displayed image for a stored image and orientation.
fn displayed(stored: &RgbImage, orientation: Orientation) -> RgbImage {
    match orientation {
        Orientation::Identity => stored.clone(),
        Orientation::Mirror => imageops::flip_horizontal(stored),
        Orientation::Rotate180 => imageops::rotate180(stored),
        Orientation::Flip => imageops::flip_vertical(stored),
        Orientation::Transpose => imageops::flip_horizontal(&imageops::rotate90(stored)),
        Orientation::Rotate90Cw => imageops::rotate90(stored),
        Orientation::Transverse => imageops::flip_horizontal(&imageops::rotate270(stored)),
        Orientation::Rotate90Ccw => imageops::rotate270(stored),
    }
}

fn render(stored: &RgbImage, orientation: Orientation) -> TileRenderer<FullImageSource, ManualScheduler> {
    let mut view = ViewState::fit(
        stored.width() as i32,
        stored.height() as i32,
        orientation,
        1.0,
        256,
        256,
    );
    view.zoom_quality = Interpolation::Nearest;

    let mut engine = TileRenderer::new(
        config(32),
        FullImageSource::new(stored.clone()),
        ManualScheduler::new(),
        view,
    )
    .unwrap();
    engine.zoom_changed(false);
    run_until_idle(&mut engine, MAX_TICKS);
    engine
}

#[test]
fn test_all_orientations_match_reference() {
    let stored = gradient(128, 64);

    for orientation in Orientation::ALL {
        let engine = render(&stored, orientation);
        let expected = displayed(&stored, orientation);
        let view = engine.view();
        assert_eq!(
            (view.width as u32, view.height as u32),
            expected.dimensions(),
            "{:?}",
            orientation
        );

        for y in 0..expected.height() {
            for x in 0..expected.width() {
                let actual = engine
                    .surface()
                    .get_pixel(x + view.x_offset as u32, y + view.y_offset as u32);
                assert_eq!(
                    actual,
                    expected.get_pixel(x, y),
                    "{:?} at {},{}",
                    orientation,
                    x,
                    y
                );
            }
        }
    }
}

#[test]
fn test_source_damage_maps_through_orientation() {
    let stored = gradient(128, 64);
    let mut engine = render(&stored, Orientation::Rotate90Cw);

    // Change one stored pixel and report it.
    if let Some(pixels) = engine.source_mut().pixels_mut() {
        pixels.put_pixel(5, 10, image::Rgb([1, 2, 3]));
    }
    engine.area_changed(tile_renderer::geometry::Rect::new(5, 10, 1, 1));
    run_until_idle(&mut engine, MAX_TICKS);

    // Displayed (x, y) shows stored (y, H - 1 - x): stored (5, 10) is
    // displayed at (53, 5).
    let view = engine.view();
    let pixel = engine
        .surface()
        .get_pixel(53 + view.x_offset as u32, 5 + view.y_offset as u32);
    assert_eq!(pixel, &image::Rgb([1, 2, 3]));
}
