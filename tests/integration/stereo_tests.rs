//! Stereo tests.
//!
//! Tests verify:
//! - Eye selection from a side-by-side pair
//! - Anaglyph merging of both eyes
//! - Mirrored eyes and split output layouts

use image::{Rgb, RgbImage};

use tile_renderer::{
    run_until_idle, FullImageSource, ManualScheduler, Orientation, StereoMode, StereoOffsets,
    TileRenderer, ViewState,
};

use super::test_utils::{config, gradient, gradient_pixel, stereo_pair, MAX_TICKS};

const LEFT: Rgb<u8> = Rgb([200, 10, 10]);
const RIGHT: Rgb<u8> = Rgb([20, 100, 150]);

/// Render one eye of `pixels`, which holds two `eye_width` wide halves when
/// `pair` is set.
fn render_eye(
    pixels: RgbImage,
    eye_width: i32,
    pair: bool,
    viewport: (i32, i32),
    mode: StereoMode,
) -> TileRenderer<FullImageSource, ManualScheduler> {
    let height = pixels.height() as i32;
    let mut view = ViewState::fit(eye_width, height, Orientation::Identity, 1.0, viewport.0, viewport.1);
    if pair {
        view.stereo_offsets = StereoOffsets {
            left: 0,
            right: eye_width,
        };
    }

    let mut engine = TileRenderer::new(
        config(32),
        FullImageSource::new(pixels),
        ManualScheduler::new(),
        view,
    )
    .unwrap();
    engine.stereo_mode_set(mode);
    engine.viewport_resized();
    engine.zoom_changed(false);
    run_until_idle(&mut engine, MAX_TICKS);
    engine
}

#[test]
fn test_left_and_right_eye() {
    let left = render_eye(stereo_pair(64, 64, LEFT, RIGHT), 64, true, (64, 64), StereoMode::empty());
    assert!(left.surface().pixels().all(|p| *p == LEFT));

    let right = render_eye(stereo_pair(64, 64, LEFT, RIGHT), 64, true, (64, 64), StereoMode::RIGHT);
    assert!(right.surface().pixels().all(|p| *p == RIGHT));
}

#[test]
fn test_swap_exchanges_eyes() {
    let engine = render_eye(
        stereo_pair(64, 64, LEFT, RIGHT),
        64,
        true,
        (64, 64),
        StereoMode::RIGHT | StereoMode::SWAP,
    );
    assert!(engine.surface().pixels().all(|p| *p == LEFT));
}

#[test]
fn test_color_anaglyph_takes_red_from_other_eye() {
    let engine = render_eye(
        stereo_pair(64, 64, LEFT, RIGHT),
        64,
        true,
        (64, 64),
        StereoMode::ANAGLYPH_RC,
    );
    assert_eq!(engine.surface().get_pixel(10, 10), &Rgb([20, 10, 10]));
}

#[test]
fn test_gray_anaglyph() {
    let engine = render_eye(
        stereo_pair(64, 64, LEFT, RIGHT),
        64,
        true,
        (64, 64),
        StereoMode::ANAGLYPH_GRAY_RC,
    );
    // luma(LEFT) = 66, luma(RIGHT) = 81
    assert_eq!(engine.surface().get_pixel(40, 40), &Rgb([81, 66, 66]));
}

#[test]
fn test_mirrored_eye_inverts_scroll() {
    let engine = render_eye(gradient(200, 64), 200, false, (100, 64), StereoMode::MIRROR);

    // The viewer shows stored columns 0..100; the mirrored eye shows them
    // right to left.
    let surface = engine.surface();
    assert_eq!(surface.get_pixel(0, 0), &gradient_pixel(99, 0));
    assert_eq!(surface.get_pixel(99, 7), &gradient_pixel(0, 7));
}

#[test]
fn test_side_by_side_right_eye_offset() {
    let engine = render_eye(
        stereo_pair(64, 64, LEFT, RIGHT),
        64,
        true,
        (64, 64),
        StereoMode::RIGHT | StereoMode::HORIZ,
    );

    assert_eq!(engine.output_offset(), (64, 0));
    let surface = engine.surface();
    assert_eq!(surface.dimensions(), (128, 64));
    assert_eq!(surface.get_pixel(64, 0), &RIGHT);
    assert_eq!(surface.get_pixel(127, 63), &RIGHT);
}
