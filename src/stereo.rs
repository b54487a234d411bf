//! Stereo (3D image pair) modes.
//!
//! A stereo image carries both eyes side by side in one source buffer; the
//! view supplies the horizontal pixel offset of each eye's half
//! ([`StereoOffsets`]). A renderer instance draws one eye, selected by
//! [`StereoMode::RIGHT`] (optionally swapped with [`StereoMode::SWAP`]), and
//! may place its output next to the other eye's output (`HORIZ`/`VERT`
//! split) or at a fixed position (`FIXED`).
//!
//! In anaglyph modes the two eyes are merged into one RGB buffer:
//!
//! ```text
//!   primary eye  ──┐
//!                  ├── channel merge ──► tile pixbuf
//!   secondary eye ─┘   (colour / grey / Dubois)
//! ```

use bitflags::bitflags;
use serde::Serialize;

use crate::transform::COLOR_BYTES;

bitflags! {
    /// Which eye to render and how to lay it out.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StereoMode: u32 {
        /// Render the right eye instead of the left
        const RIGHT = 1 << 0;
        /// Swap which half of the source is treated as the right eye
        const SWAP = 1 << 1;
        /// Mirror the rendered eye horizontally
        const MIRROR = 1 << 2;
        /// Flip the rendered eye vertically
        const FLIP = 1 << 3;
        /// Side-by-side output layout
        const HORIZ = 1 << 4;
        /// Top-bottom output layout
        const VERT = 1 << 5;
        /// Output at a fixed, configured position per eye
        const FIXED = 1 << 6;

        const ANAGLYPH_RC = 1 << 8;
        const ANAGLYPH_GM = 1 << 9;
        const ANAGLYPH_YB = 1 << 10;
        const ANAGLYPH_GRAY_RC = 1 << 11;
        const ANAGLYPH_GRAY_GM = 1 << 12;
        const ANAGLYPH_GRAY_YB = 1 << 13;
        const ANAGLYPH_DB_RC = 1 << 14;
        const ANAGLYPH_DB_GM = 1 << 15;
        const ANAGLYPH_DB_YB = 1 << 16;

        /// Any anaglyph variant
        const ANAGLYPH = Self::ANAGLYPH_RC.bits()
            | Self::ANAGLYPH_GM.bits()
            | Self::ANAGLYPH_YB.bits()
            | Self::ANAGLYPH_GRAY_RC.bits()
            | Self::ANAGLYPH_GRAY_GM.bits()
            | Self::ANAGLYPH_GRAY_YB.bits()
            | Self::ANAGLYPH_DB_RC.bits()
            | Self::ANAGLYPH_DB_GM.bits()
            | Self::ANAGLYPH_DB_YB.bits();
    }
}

impl StereoMode {
    /// Whether the primary eye is read from the right half of the source.
    fn primary_is_right(self) -> bool {
        self.contains(StereoMode::RIGHT) != self.contains(StereoMode::SWAP)
    }

    /// Source x offset of the eye this renderer draws.
    pub fn primary_offset(self, offsets: &StereoOffsets) -> i32 {
        if self.primary_is_right() {
            offsets.right
        } else {
            offsets.left
        }
    }

    /// Source x offset of the other eye (used for anaglyph merging).
    pub fn secondary_offset(self, offsets: &StereoOffsets) -> i32 {
        if self.primary_is_right() {
            offsets.left
        } else {
            offsets.right
        }
    }

    /// Output position of this renderer's surface within the viewport.
    ///
    /// The right eye of a split layout sits one viewport width (or height)
    /// away from the left eye; fixed layouts use the configured positions.
    pub fn output_offset(self, viewport_w: i32, viewport_h: i32, fixed: &FixedOffsets) -> (i32, i32) {
        if self.contains(StereoMode::RIGHT) {
            if self.contains(StereoMode::HORIZ) {
                (viewport_w, 0)
            } else if self.contains(StereoMode::VERT) {
                (0, viewport_h)
            } else if self.contains(StereoMode::FIXED) {
                fixed.right
            } else {
                (0, 0)
            }
        } else if self.contains(StereoMode::FIXED) {
            fixed.left
        } else {
            (0, 0)
        }
    }

    /// The anaglyph variant selected by this mode, if any.
    ///
    /// When several anaglyph bits are set the first in declaration order wins.
    pub fn anaglyph(self) -> Option<Anaglyph> {
        use AnaglyphChannels::*;
        use AnaglyphKind::*;

        let table = [
            (StereoMode::ANAGLYPH_RC, Color, RedCyan),
            (StereoMode::ANAGLYPH_GM, Color, GreenMagenta),
            (StereoMode::ANAGLYPH_YB, Color, YellowBlue),
            (StereoMode::ANAGLYPH_GRAY_RC, Gray, RedCyan),
            (StereoMode::ANAGLYPH_GRAY_GM, Gray, GreenMagenta),
            (StereoMode::ANAGLYPH_GRAY_YB, Gray, YellowBlue),
            (StereoMode::ANAGLYPH_DB_RC, Dubois, RedCyan),
            (StereoMode::ANAGLYPH_DB_GM, Dubois, GreenMagenta),
            (StereoMode::ANAGLYPH_DB_YB, Dubois, YellowBlue),
        ];

        table
            .into_iter()
            .find(|(flag, _, _)| self.contains(*flag))
            .map(|(_, kind, channels)| Anaglyph { kind, channels })
    }
}

/// Horizontal source offsets of the left and right eye halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StereoOffsets {
    pub left: i32,
    pub right: i32,
}

impl StereoOffsets {
    /// Whether the source actually holds a stereo pair.
    pub fn is_stereo(&self) -> bool {
        self.left > 0 || self.right > 0
    }
}

/// Configured output positions for [`StereoMode::FIXED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FixedOffsets {
    pub left: (i32, i32),
    pub right: (i32, i32),
}

// =============================================================================
// Anaglyph
// =============================================================================

/// How the two eyes are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnaglyphKind {
    /// Straight channel copy
    Color,
    /// Luma of each eye into its channels
    Gray,
    /// Dubois least-squares projection
    Dubois,
}

/// Colour filters of the glasses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnaglyphChannels {
    RedCyan,
    GreenMagenta,
    YellowBlue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anaglyph {
    pub kind: AnaglyphKind,
    pub channels: AnaglyphChannels,
}

const LUMA: [f64; 3] = [0.299, 0.587, 0.114];

// Rows produce output R, G, B; columns weight secondary RGB then primary RGB.
const DUBOIS_RC: [[f64; 6]; 3] = [
    [0.456, 0.500, 0.176, -0.043, -0.088, -0.002],
    [-0.040, -0.038, -0.016, 0.378, 0.734, -0.018],
    [-0.015, -0.021, -0.005, -0.072, -0.113, 1.226],
];
const DUBOIS_GM: [[f64; 6]; 3] = [
    [-0.062, -0.158, -0.039, 0.529, 0.705, 0.024],
    [0.284, 0.668, 0.143, -0.016, -0.015, -0.065],
    [-0.015, -0.027, 0.021, 0.009, 0.075, 0.937],
];
const DUBOIS_YB: [[f64; 6]; 3] = [
    [1.000, -0.193, 0.282, -0.015, -0.116, -0.016],
    [-0.024, 0.855, 0.064, 0.006, 0.058, -0.016],
    [-0.036, -0.163, 0.021, 0.089, 0.174, 0.858],
];

fn luma(p: &[u8]) -> u8 {
    (p[0] as f64 * LUMA[0] + p[1] as f64 * LUMA[1] + p[2] as f64 * LUMA[2]) as u8
}

impl Anaglyph {
    /// Merge one pixel of the secondary eye into one pixel of the primary eye.
    fn merge(self, primary: &mut [u8], secondary: &[u8]) {
        match self.kind {
            AnaglyphKind::Color => match self.channels {
                AnaglyphChannels::RedCyan => primary[0] = secondary[0],
                AnaglyphChannels::GreenMagenta => primary[1] = secondary[1],
                AnaglyphChannels::YellowBlue => {
                    primary[0] = secondary[0];
                    primary[1] = secondary[1];
                }
            },
            AnaglyphKind::Gray => {
                let g1 = luma(primary);
                let g2 = luma(secondary);
                let merged = match self.channels {
                    AnaglyphChannels::RedCyan => [g2, g1, g1],
                    AnaglyphChannels::GreenMagenta => [g1, g2, g1],
                    AnaglyphChannels::YellowBlue => [g2, g2, g1],
                };
                primary[..COLOR_BYTES].copy_from_slice(&merged);
            }
            AnaglyphKind::Dubois => {
                let matrix = match self.channels {
                    AnaglyphChannels::RedCyan => &DUBOIS_RC,
                    AnaglyphChannels::GreenMagenta => &DUBOIS_GM,
                    AnaglyphChannels::YellowBlue => &DUBOIS_YB,
                };
                let input = [
                    secondary[0] as f64,
                    secondary[1] as f64,
                    secondary[2] as f64,
                    primary[0] as f64,
                    primary[1] as f64,
                    primary[2] as f64,
                ];
                let mut out = [0u8; 3];
                for (value, row) in out.iter_mut().zip(matrix.iter()) {
                    let sum: f64 = row.iter().zip(input.iter()).map(|(m, v)| m * v).sum();
                    *value = sum.clamp(0.0, 255.0) as u8;
                }
                primary[..COLOR_BYTES].copy_from_slice(&out);
            }
        }
    }

    /// Merge `secondary` into `primary` over the region `(x, y, w, h)`.
    ///
    /// Both buffers must have the same dimensions and contain the region.
    pub fn compose(
        self,
        primary: &mut image::RgbImage,
        secondary: &image::RgbImage,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
    ) {
        let stride = primary.width() as usize * COLOR_BYTES;
        let s: &[u8] = secondary;
        let d: &mut [u8] = primary;

        for row in y as usize..(y + h) as usize {
            let start = row * stride + x as usize * COLOR_BYTES;
            let end = start + w as usize * COLOR_BYTES;
            for (dp, sp) in d[start..end]
                .chunks_exact_mut(COLOR_BYTES)
                .zip(s[start..end].chunks_exact(COLOR_BYTES))
            {
                self.merge(dp, sp);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
