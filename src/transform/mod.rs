//! Orientation handling.
//!
//! - [`orientation`]: EXIF orientation codes, stereo composition and the
//!   coordinate mappings between displayed and stored space
//! - [`ops`]: in-place pixel transforms on tile buffers

pub mod ops;
pub mod orientation;

pub use ops::{
    flip_vertical, mirror_and_flip, mirror_horizontal, rotate_90_ccw, rotate_90_cw, ScratchTile,
    COLOR_BYTES,
};
pub use orientation::Orientation;
