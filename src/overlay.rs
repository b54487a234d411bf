//! Floating images composited above the tiles.
//!
//! Overlays are positioned in viewport coordinates and are not part of the
//! tile cache: they have no budget and are never evicted. After tile content
//! is copied to the output surface, every overlay intersecting the damaged
//! rectangle is alpha-blended over it, one tile-sized chunk at a time through
//! a shared scratch buffer.
//!
//! With [`OverlayFlags::RELATIVE`], a negative coordinate is measured from the
//! far viewport edge: `x = -10` places the overlay's right edge 10 pixels
//! before the viewport's right edge.

use bitflags::bitflags;
use image::{imageops, GenericImage, Pixel, RgbImage, RgbaImage};

use crate::error::OverlayError;
use crate::geometry::Rect;
use crate::render::resample::bounds;

bitflags! {
    /// Overlay positioning flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OverlayFlags: u32 {
        /// Negative coordinates are relative to the far viewport edge
        const RELATIVE = 1 << 0;
    }
}

/// One overlay.
#[derive(Debug, Clone)]
pub struct OverlayEntry {
    pub id: u32,

    /// Overlay pixels in device pixels
    pub image: RgbaImage,

    /// Requested position in logical viewport pixels
    pub x: i32,
    pub y: i32,

    pub flags: OverlayFlags,
}

impl OverlayEntry {
    /// Resolved rectangle in logical viewport pixels.
    pub fn position(&self, viewport_width: i32, viewport_height: i32, hidpi_scale: i32) -> Rect {
        let width = self.image.width() as i32 / hidpi_scale;
        let height = self.image.height() as i32 / hidpi_scale;
        let mut x = self.x;
        let mut y = self.y;

        if self.flags.contains(OverlayFlags::RELATIVE) {
            if x < 0 {
                x += viewport_width - width;
            }
            if y < 0 {
                y += viewport_height - height;
            }
        }

        Rect::new(x, y, width, height)
    }
}

/// The overlays of one renderer.
#[derive(Debug)]
pub struct OverlayLayer {
    entries: Vec<OverlayEntry>,
    scratch: Option<RgbaImage>,
    tile_size: i32,
    hidpi_scale: i32,
}

impl OverlayLayer {
    pub fn new(tile_size: i32, hidpi_scale: i32) -> Self {
        Self {
            entries: Vec::new(),
            scratch: None,
            tile_size,
            hidpi_scale,
        }
    }

    /// Add an overlay, returning its id (the smallest unused id from 1).
    pub fn add(
        &mut self,
        image: RgbaImage,
        x: i32,
        y: i32,
        flags: OverlayFlags,
    ) -> Result<u32, OverlayError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OverlayError::EmptyImage);
        }

        let mut id = 1;
        while self.find(id).is_some() {
            id += 1;
        }

        self.entries.push(OverlayEntry {
            id,
            image,
            x,
            y,
            flags,
        });
        Ok(id)
    }

    /// Replace the image (and optionally the position) of an overlay, or
    /// remove it when `image` is `None`.
    pub fn set(
        &mut self,
        id: u32,
        image: Option<RgbaImage>,
        position: Option<(i32, i32)>,
    ) -> Result<(), OverlayError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(OverlayError::UnknownId(id))?;

        match image {
            Some(image) if image.width() == 0 || image.height() == 0 => {
                return Err(OverlayError::EmptyImage)
            }
            Some(image) => {
                let entry = &mut self.entries[index];
                entry.image = image;
                if let Some((x, y)) = position {
                    entry.x = x;
                    entry.y = y;
                }
            }
            None => {
                self.entries.remove(index);
                if self.entries.is_empty() {
                    self.scratch = None;
                }
            }
        }
        Ok(())
    }

    /// Image and requested position of an overlay.
    pub fn get(&self, id: u32) -> Option<(&RgbaImage, i32, i32)> {
        self.find(id).map(|e| (&e.image, e.x, e.y))
    }

    fn find(&self, id: u32) -> Option<&OverlayEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Resolved rectangle of an overlay.
    pub fn rect(&self, id: u32, viewport_width: i32, viewport_height: i32) -> Option<Rect> {
        self.find(id)
            .map(|e| e.position(viewport_width, viewport_height, self.hidpi_scale))
    }

    /// Resolved rectangles of every overlay, in drawing order.
    pub fn rects(&self, viewport_width: i32, viewport_height: i32) -> Vec<Rect> {
        self.entries
            .iter()
            .map(|e| e.position(viewport_width, viewport_height, self.hidpi_scale))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.scratch = None;
    }

    /// Composite every overlay intersecting `request` onto `surface`.
    ///
    /// `request` is in logical viewport pixels; `origin` is where the
    /// viewport starts on the surface (stereo output offset).
    pub fn draw(
        &mut self,
        surface: &mut RgbImage,
        request: Rect,
        viewport_width: i32,
        viewport_height: i32,
        origin: (i32, i32),
    ) {
        let hidpi = self.hidpi_scale;
        let step = self.tile_size;
        let side = (step * hidpi) as u32;

        for entry in &self.entries {
            let od_rect = entry.position(viewport_width, viewport_height, hidpi);
            let Some(r) = request.intersect(&od_rect) else {
                continue;
            };

            let scratch = self
                .scratch
                .get_or_insert_with(|| RgbaImage::new(side, side));

            for sy in (r.y..r.bottom()).step_by(step as usize) {
                for sx in (r.x..r.right()).step_by(step as usize) {
                    let chunk = Rect::new(
                        sx,
                        sy,
                        (r.right() - sx).min(step),
                        (r.bottom() - sy).min(step),
                    );
                    let Some(on_surface) = chunk
                        .translate(origin.0, origin.1)
                        .scale(hidpi)
                        .intersect(&bounds(surface))
                    else {
                        continue;
                    };
                    let (w, h) = (on_surface.width as u32, on_surface.height as u32);
                    let (x0, y0) = (on_surface.x as u32, on_surface.y as u32);

                    for y in 0..h {
                        for x in 0..w {
                            scratch.put_pixel(x, y, surface.get_pixel(x0 + x, y0 + y).to_rgba());
                        }
                    }

                    let ox = on_surface.x - (od_rect.x + origin.0) * hidpi;
                    let oy = on_surface.y - (od_rect.y + origin.1) * hidpi;
                    let mut under = scratch.sub_image(0, 0, w, h);
                    imageops::overlay(&mut *under, &entry.image, -(ox as i64), -(oy as i64));

                    for y in 0..h {
                        for x in 0..w {
                            surface.put_pixel(x0 + x, y0 + y, scratch.get_pixel(x, y).to_rgb());
                        }
                    }
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
