//! The tile renderer.
//!
//! [`TileRenderer`] ties the tile cache, the two render queues, the overlay
//! layer and a host [`Scheduler`] together. Viewer events (`area_changed`,
//! `zoom_changed`, `scrolled`, ...) are turned into tile jobs; each call to
//! [`TileRenderer::process_next`] drains one job and paints it onto the
//! output surface.
//!
//! # Job flow
//!
//! ```text
//!   viewer event ──► enqueue ──► fast queue ──process_next──► expose ──► surface
//!                                    │                          ▲
//!                                    └── (two-pass) ──► refined queue
//! ```
//!
//! The fast queue is drained completely before the refined queue; refined
//! jobs wait while the view is still loading.

use image::{imageops, Rgb, RgbImage, RgbaImage};
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::error::{EngineError, OverlayError};
use crate::geometry::{round_down, round_up, Rect};
use crate::overlay::{OverlayFlags, OverlayLayer};
use crate::schedule::{Registration, SchedulePolicy, Scheduler};
use crate::source::ImageSource;
use crate::stereo::StereoMode;
use crate::tile::{CacheStats, EvictionContext, Pass, RenderState, TileCache, TileCoord};
use crate::transform::ScratchTile;

use super::queue::{RenderJob, RenderQueue};
use super::resample::{bounds, copy_rect, fill_rect};
use super::tile_render::{paint, plan_render, PaintContext, PostProcessFn};
use super::view::{Interpolation, ViewState};

/// Sink notified whenever the queues drain.
pub type RenderCompleteFn = Box<dyn FnMut()>;

/// Renderer counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EngineStats {
    pub jobs_processed: u64,
    pub fast_renders: u64,
    pub refined_renders: u64,
    pub exposes: u64,
    pub completions: u64,
    pub queued_fast: usize,
    pub queued_refined: usize,
    pub cache: CacheStats,
}

impl EngineStats {
    /// Tiles actually painted, either pass.
    pub fn renders(&self) -> u64 {
        self.fast_renders + self.refined_renders
    }
}

// =============================================================================
// Tile Renderer
// =============================================================================

/// Incremental tiled renderer for one view.
pub struct TileRenderer<P: ImageSource, S: Scheduler> {
    config: EngineConfig,
    source: P,
    scheduler: S,
    view: ViewState,
    policy: SchedulePolicy,

    cache: TileCache,
    fast: RenderQueue,
    refined: RenderQueue,

    /// Registration currently held with the scheduler
    registration: Option<Registration>,

    overlays: OverlayLayer,
    scratch: ScratchTile,
    stereo: StereoMode,

    /// Scroll position in tile space (inverted for mirrored/flipped eyes)
    x_scroll: i32,
    y_scroll: i32,

    /// Position of this eye's output on the surface
    stereo_off: (i32, i32),

    /// Output in device pixels
    surface: RgbImage,

    post_process: Option<PostProcessFn>,
    render_complete: Option<RenderCompleteFn>,
    stats: EngineStats,
}

impl<P: ImageSource, S: Scheduler> TileRenderer<P, S> {
    /// Create a renderer. Nothing is queued until the first viewer event.
    pub fn new(config: EngineConfig, source: P, scheduler: S, view: ViewState) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::InvalidConfig)?;

        let hidpi = config.hidpi_scale;
        let surface = RgbImage::from_pixel(
            (view.viewport_width.max(0) * hidpi) as u32,
            (view.viewport_height.max(0) * hidpi) as u32,
            view.border_color,
        );

        let mut engine = Self {
            cache: TileCache::new(config.tile_size, hidpi, config.cache_size_mb),
            overlays: OverlayLayer::new(config.tile_size, hidpi),
            policy: config.schedule_policy(),
            fast: RenderQueue::new(Pass::Fast),
            refined: RenderQueue::new(Pass::Refined),
            registration: None,
            scratch: ScratchTile::new(),
            stereo: StereoMode::empty(),
            x_scroll: 0,
            y_scroll: 0,
            stereo_off: (0, 0),
            surface,
            post_process: None,
            render_complete: None,
            stats: EngineStats::default(),
            config,
            source,
            scheduler,
            view,
        };
        engine.sync_scroll();
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Mutable view geometry. Follow changes with the matching event
    /// (`zoom_changed`, `scrolled`, `viewport_resized`).
    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut P {
        &mut self.source
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn fast_queue(&self) -> &RenderQueue {
        &self.fast
    }

    pub fn refined_queue(&self) -> &RenderQueue {
        &self.refined
    }

    /// The composed output in device pixels.
    pub fn surface(&self) -> &RgbImage {
        &self.surface
    }

    /// The registration the host should honour, `None` when idle.
    pub fn registration(&self) -> Option<Registration> {
        self.registration
    }

    pub fn stereo_mode(&self) -> StereoMode {
        self.stereo
    }

    /// Where this eye's output starts on the surface, in logical pixels.
    pub fn output_offset(&self) -> (i32, i32) {
        self.stereo_off
    }

    pub fn set_post_process(&mut self, hook: Option<PostProcessFn>) {
        self.post_process = hook;
    }

    pub fn set_render_complete(&mut self, sink: Option<RenderCompleteFn>) {
        self.render_complete = sink;
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            queued_fast: self.fast.len(),
            queued_refined: self.refined.len(),
            cache: self.cache.stats(),
            ..self.stats
        }
    }

    // =========================================================================
    // Geometry helpers
    // =========================================================================

    fn has_source(&self) -> bool {
        self.source.source_pixels().is_some() || self.source.source_tiles_enabled()
    }

    fn sync_scroll(&mut self) {
        let view = &self.view;
        self.x_scroll = if self.stereo.contains(StereoMode::MIRROR) {
            view.width - view.vis_width - view.x_scroll
        } else {
            view.x_scroll
        };
        self.y_scroll = if self.stereo.contains(StereoMode::FLIP) {
            view.height - view.vis_height - view.y_scroll
        } else {
            view.y_scroll
        };
    }

    /// Visible rectangle in tile space.
    fn visible_rect(&self) -> Rect {
        Rect::new(self.x_scroll, self.y_scroll, self.view.vis_width, self.view.vis_height)
    }

    fn eviction_context(&self) -> EvictionContext {
        EvictionContext {
            visible: self.visible_rect(),
            scale: self.view.scale(),
        }
    }

    // =========================================================================
    // Queueing
    // =========================================================================

    /// Queue `rect` (destination pixels) for rendering.
    ///
    /// # Arguments
    ///
    /// * `clamp` - Drop the parts outside the visible rectangle
    /// * `render` - [`RenderState::All`] re-renders tiles that were never
    ///   completed; [`RenderState::Area`] requests a partial update
    /// * `new_data` - Source pixels changed
    /// * `only_existing` - Off-screen tiles are only touched if cached
    pub fn enqueue(&mut self, rect: Rect, clamp: bool, render: RenderState, new_data: bool, only_existing: bool) {
        self.sync_scroll();

        let (width, height) = (self.view.width, self.view.height);
        if width < 1 || height < 1 {
            return;
        }
        let nx = rect.x.clamp(0, width - 1);
        let ny = rect.y.clamp(0, height - 1);
        let w = (rect.width - (nx - rect.x)).clamp(0, width - nx);
        let h = (rect.height - (ny - rect.y)).clamp(0, height - ny);
        if w < 1 || h < 1 {
            return;
        }

        let queued = self.queue_to_tiles(Rect::new(nx, ny, w, h), clamp, render, new_data, only_existing);
        if queued && ((self.fast.is_empty() && self.refined.is_empty()) || self.registration.is_none()) {
            self.cancel_registration();
            self.schedule_next(true);
        }
    }

    fn queue_to_tiles(
        &mut self,
        rect: Rect,
        clamp: bool,
        render: RenderState,
        new_data: bool,
        only_existing: bool,
    ) -> bool {
        let visible = self.visible_rect();
        let rect = if clamp {
            match rect.intersect(&visible) {
                Some(r) => r,
                None => return false,
            }
        } else {
            rect
        };

        let ts = self.config.tile_size;
        let x1 = round_down(rect.x, ts);
        let x2 = round_up(rect.right(), ts);
        let y1 = round_down(rect.y, ts);
        let y2 = round_up(rect.bottom(), ts);
        let (width, height) = (self.view.width, self.view.height);

        for j in (y1..y2).step_by(ts as usize) {
            for i in (x1..x2).step_by(ts as usize) {
                let coord = TileCoord::new(i, j);
                let offscreen = only_existing
                    && (i + ts < visible.x
                        || i > visible.right()
                        || j + ts < visible.y
                        || j > visible.bottom());

                let tile = if offscreen {
                    match self.cache.get_existing(coord) {
                        Some(tile) => tile,
                        None => continue,
                    }
                } else {
                    self.cache.get_or_create(coord, width, height)
                };

                match render {
                    RenderState::All if tile.done != RenderState::All => {
                        tile.todo = RenderState::All;
                    }
                    RenderState::Area if tile.todo != RenderState::All => {
                        tile.todo = if tile.done == RenderState::All {
                            RenderState::Area
                        } else {
                            RenderState::All
                        };
                    }
                    _ => {}
                }

                let jx = (rect.x - i).max(0);
                let jy = (rect.y - j).max(0);
                let jw = (rect.right() - i - jx).min(ts - jx);
                let jh = (rect.bottom() - j - jy).min(ts - jy);
                if jw < 1 || jh < 1 {
                    continue;
                }

                tile.jobs.fast = true;
                self.fast
                    .push(RenderJob::new(coord, Rect::new(jx, jy, jw, jh), new_data));
            }
        }

        true
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    fn cancel_registration(&mut self) {
        if self.registration.take().is_some() {
            self.scheduler.cancel();
        }
    }

    fn schedule_next(&mut self, force: bool) {
        let decision = self.policy.decide(
            self.fast.queued_area(),
            self.view.visible_area(),
            self.view.loading,
            force,
        );
        if let Some(registration) = decision {
            self.scheduler.register(registration);
            self.registration = Some(registration);
        }
    }

    fn complete(&mut self) {
        self.cancel_registration();
        self.stats.completions += 1;
        debug!(
            tiles = self.cache.len(),
            resident = self.cache.resident_bytes(),
            "Render complete"
        );
        if let Some(sink) = self.render_complete.as_mut() {
            sink();
        }
    }

    /// Drain one job. Call when the scheduler fires.
    ///
    /// Returns `false` once the engine has gone idle.
    pub fn process_next(&mut self) -> bool {
        if self.registration.is_none()
            || !self.has_source()
            || (self.fast.is_empty() && self.refined.is_empty())
        {
            self.complete();
            return false;
        }

        let (job, pass, fast) = if let Some(job) = self.fast.pop_front() {
            (job, Pass::Fast, self.view.wants_fast_pass())
        } else if self.view.loading {
            self.schedule_next(false);
            return true;
        } else if let Some(job) = self.refined.pop_front() {
            (job, Pass::Refined, false)
        } else {
            self.complete();
            return false;
        };

        self.stats.jobs_processed += 1;
        let coord = job.coord;
        let visible = self.visible_rect();
        trace!(x = coord.x, y = coord.y, ?pass, fast, "Processing job");

        let is_visible = match self.cache.peek_mut(coord) {
            Some(tile) => {
                tile.jobs.set(pass, false);
                tile.is_visible(visible)
            }
            None => false,
        };

        if is_visible {
            self.expose(&job, fast);
        } else if job.new_data {
            let refresh = match self.cache.peek_mut(coord) {
                Some(tile) => {
                    tile.blank = false;
                    tile.surface.is_some() && tile.done == RenderState::All
                }
                None => false,
            };
            if refresh {
                self.render_tile(coord, job.rect, true, fast);
            }
        }

        if pass == Pass::Fast && fast {
            if let Some(tile) = self.cache.peek_mut(coord) {
                tile.jobs.refined = true;
                self.refined.push(job);
            }
        }

        if self.fast.is_empty() && self.refined.is_empty() {
            self.complete();
            return false;
        }

        self.schedule_next(false);
        true
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    fn render_tile(&mut self, coord: TileCoord, region: Rect, new_data: bool, fast: bool) {
        let Some(tile) = self.cache.peek_mut(coord) else {
            return;
        };
        let Some(region) = plan_render(tile, region, new_data, fast) else {
            return;
        };

        let ctx = self.eviction_context();
        let Some(tile) = self.cache.ensure_storage(coord, &ctx) else {
            return;
        };

        let mut paint_ctx = PaintContext {
            source: &mut self.source,
            view: &self.view,
            stereo: self.stereo,
            tile_size: self.config.tile_size,
            hidpi_scale: self.config.hidpi_scale,
            min_scale_size: self.config.min_scale_size,
            wide_image_threshold: self.config.wide_image_threshold,
            placeholder: Rgb(self.config.placeholder_color),
            scratch: &mut self.scratch,
            post_process: self.post_process.as_mut(),
        };
        paint(&mut paint_ctx, tile, region, fast);

        if fast {
            self.stats.fast_renders += 1;
        } else {
            self.stats.refined_renders += 1;
        }
    }

    /// Render the visible part of a job and copy it to the surface.
    fn expose(&mut self, job: &RenderJob, fast: bool) {
        let coord = job.coord;
        let Some(r) = job
            .rect
            .translate(coord.x, coord.y)
            .intersect(&self.visible_rect())
        else {
            return;
        };
        let local = r.translate(-coord.x, -coord.y);

        self.render_tile(coord, local, job.new_data, fast);

        let hidpi = self.config.hidpi_scale;
        let vx = self.view.x_offset + coord.x - self.x_scroll + local.x;
        let vy = self.view.y_offset + coord.y - self.y_scroll + local.y;

        if let Some(tile_surface) = self.cache.peek(coord).and_then(|t| t.surface.as_ref()) {
            copy_rect(
                tile_surface,
                local.scale(hidpi),
                &mut self.surface,
                (vx + self.stereo_off.0) * hidpi,
                (vy + self.stereo_off.1) * hidpi,
            );
        }

        self.overlays.draw(
            &mut self.surface,
            Rect::new(vx, vy, local.width, local.height),
            self.view.viewport_width,
            self.view.viewport_height,
            self.stereo_off,
        );
        self.stats.exposes += 1;
    }

    // =========================================================================
    // Borders
    // =========================================================================

    /// Paint the parts of `rect` (viewport pixels) not covered by the image.
    fn border_draw(&mut self, rect: Rect) {
        let view = &self.view;
        let (vp_w, vp_h) = (view.viewport_width, view.viewport_height);
        let mut parts = Vec::new();

        if !self.has_source() {
            parts.push(Rect::new(0, 0, vp_w, vp_h));
        } else {
            if view.vis_width < vp_w {
                if view.x_offset > 0 {
                    parts.push(Rect::new(0, 0, view.x_offset, vp_h));
                }
                let right_edge = view.x_offset + view.vis_width;
                if vp_w > right_edge {
                    parts.push(Rect::new(right_edge, 0, vp_w - right_edge, vp_h));
                }
            }
            if view.vis_height < vp_h {
                if view.y_offset > 0 {
                    parts.push(Rect::new(view.x_offset, 0, view.vis_width, view.y_offset));
                }
                let bottom_edge = view.y_offset + view.vis_height;
                if vp_h > bottom_edge {
                    parts.push(Rect::new(
                        view.x_offset,
                        bottom_edge,
                        view.vis_width,
                        vp_h - bottom_edge,
                    ));
                }
            }
        }

        let color = view.border_color;
        let hidpi = self.config.hidpi_scale;
        for part in parts {
            let Some(r) = rect.intersect(&part) else {
                continue;
            };
            fill_rect(
                &mut self.surface,
                r.translate(self.stereo_off.0, self.stereo_off.1).scale(hidpi),
                color,
            );
            self.overlays
                .draw(&mut self.surface, r, vp_w, vp_h, self.stereo_off);
        }
    }

    fn border_clear(&mut self) {
        self.border_draw(Rect::new(
            0,
            0,
            self.view.viewport_width,
            self.view.viewport_height,
        ));
    }

    // =========================================================================
    // Viewer events
    // =========================================================================

    /// Re-render viewport rectangle `(x, y, w, h)`: the border part is painted
    /// immediately, the image part is queued.
    #[allow(clippy::too_many_arguments)]
    pub fn redraw(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        clamp: bool,
        render: RenderState,
        new_data: bool,
        only_existing: bool,
    ) {
        let x = x - self.stereo_off.0;
        let y = y - self.stereo_off.1;

        self.border_draw(Rect::new(x, y, w, h));

        let x = (x - self.view.x_offset + self.view.x_scroll).max(0);
        let y = (y - self.view.y_offset + self.view.y_scroll).max(0);
        let rect = Rect::new(
            x,
            y,
            w.min(self.view.width - x),
            h.min(self.view.height - y),
        );
        self.enqueue(rect, clamp, render, new_data, only_existing);
    }

    /// Source pixels inside `src` (stored-orientation source pixels) changed.
    pub fn area_changed(&mut self, src: Rect) {
        let orientation = self.view.orientation.compose_stereo(
            self.stereo.contains(StereoMode::MIRROR),
            self.stereo.contains(StereoMode::FLIP),
        );
        let primary = self.stereo.primary_offset(&self.view.stereo_offsets);
        let mut rect = orientation.map_rect_reverse(
            src.translate(-primary, 0),
            self.view.image_width,
            self.view.image_height,
        );

        let scale_x = self.view.scale();
        let scale_y = self.view.scale_y();
        if (scale_x != 1.0 || scale_y != 1.0) && self.view.zoom_quality != Interpolation::Nearest {
            rect.y -= 1;
            rect.height += 2;
        }

        let x1 = (rect.x as f64 * scale_x).floor() as i32;
        let y1 = (rect.y as f64 * scale_y).floor() as i32;
        let x2 = (rect.right() as f64 * scale_x).ceil() as i32;
        let y2 = (rect.bottom() as f64 * scale_y).ceil() as i32;

        self.enqueue(
            Rect::new(x1, y1, x2 - x1, y2 - y1),
            false,
            RenderState::Area,
            true,
            true,
        );
    }

    /// Re-request `region` (source pixels) from the source and queue every
    /// part that now holds data.
    pub fn source_changed(&mut self, region: Rect) {
        for rect in self.source.refresh(region) {
            self.area_changed(rect);
        }
    }

    /// The zoom (destination size) changed.
    ///
    /// Every tile is invalidated; unless `lazy`, the whole image is queued.
    pub fn zoom_changed(&mut self, lazy: bool) {
        debug!(
            width = self.view.width,
            height = self.view.height,
            lazy,
            "Zoom changed"
        );
        self.cache.invalidate_all(self.view.width, self.view.height);
        if !lazy {
            self.redraw(
                0,
                0,
                self.view.width,
                self.view.height,
                true,
                RenderState::All,
                true,
                false,
            );
        }
        self.border_clear();
    }

    /// Mark tiles intersecting `rect` (destination pixels) for re-render.
    pub fn invalidate_region(&mut self, rect: Rect) {
        self.cache.invalidate_region(rect);
    }

    /// The viewport was resized or the stereo layout changed.
    pub fn viewport_resized(&mut self) {
        let (vp_w, vp_h) = (self.view.viewport_width, self.view.viewport_height);
        self.stereo_off = self
            .stereo
            .output_offset(vp_w, vp_h, &self.view.stereo_fixed);
        debug!(
            off_x = self.stereo_off.0,
            off_y = self.stereo_off.1,
            vp_w,
            vp_h,
            "Viewport resized"
        );

        let hidpi = self.config.hidpi_scale;
        let width = ((vp_w + self.stereo_off.0).max(0) * hidpi) as u32;
        let height = ((vp_h + self.stereo_off.1).max(0) * hidpi) as u32;
        let resized = self.surface.dimensions() != (width, height);
        if resized {
            let mut surface = RgbImage::from_pixel(width, height, self.view.border_color);
            let old = bounds(&self.surface);
            copy_rect(&self.surface, old, &mut surface, 0, 0);
            self.surface = surface;
        }

        self.sync_scroll();
        self.border_clear();
        if resized {
            let (off_x, off_y) = self.stereo_off;
            self.redraw(off_x, off_y, vp_w, vp_h, true, RenderState::All, false, false);
        }
    }

    /// The view scrolled by `(dx, dy)` destination pixels. The view's scroll
    /// position must already be updated.
    pub fn scrolled(&mut self, dx: i32, dy: i32) {
        self.sync_scroll();
        let dx = if self.stereo.contains(StereoMode::MIRROR) { -dx } else { dx };
        let dy = if self.stereo.contains(StereoMode::FLIP) { -dy } else { dy };

        let (vis_w, vis_h) = (self.view.vis_width, self.view.vis_height);
        let w = vis_w - dx.abs();
        let h = vis_h - dy.abs();

        if w < 1 || h < 1 {
            self.enqueue(
                Rect::new(0, 0, self.view.width, self.view.height),
                true,
                RenderState::All,
                false,
                false,
            );
            return;
        }

        let (x1, x2) = if dx < 0 { (-dx, 0) } else { (0, dx) };
        let (y1, y2) = if dy < 0 { (-dy, 0) } else { (0, dy) };

        let kept = Rect::new(
            x1 + self.view.x_offset + self.stereo_off.0,
            y1 + self.view.y_offset + self.stereo_off.1,
            w,
            h,
        );
        self.shift_surface(kept, (x2 - x1, y2 - y1));
        self.overlay_queue_all(x2, y2, x1, y1);

        let strip_w = vis_w - w;
        let strip_h = vis_h - h;
        if strip_w > 0 {
            let x = if dx > 0 { self.x_scroll + vis_w - strip_w } else { self.x_scroll };
            self.enqueue(
                Rect::new(x, self.y_scroll, strip_w, vis_h),
                true,
                RenderState::All,
                false,
                false,
            );
        }
        if strip_h > 0 {
            let y = if dy > 0 { self.y_scroll + vis_h - strip_h } else { self.y_scroll };
            self.enqueue(
                Rect::new(self.x_scroll, y, vis_w, strip_h),
                true,
                RenderState::All,
                false,
                false,
            );
        }
    }

    /// Move surface content so `dest` (logical surface pixels) shows what was
    /// `delta` further along.
    fn shift_surface(&mut self, dest: Rect, delta: (i32, i32)) {
        let hidpi = self.config.hidpi_scale;
        let dest = dest.scale(hidpi);
        let src = dest.translate(delta.0 * hidpi, delta.1 * hidpi);
        let Some(clipped) = src.intersect(&bounds(&self.surface)) else {
            return;
        };

        let moved = imageops::crop_imm(
            &self.surface,
            clipped.x as u32,
            clipped.y as u32,
            clipped.width as u32,
            clipped.height as u32,
        )
        .to_image();
        copy_rect(
            &moved,
            bounds(&moved),
            &mut self.surface,
            dest.x + (clipped.x - src.x),
            dest.y + (clipped.y - src.y),
        );
    }

    /// Forget all queued work (the source image was replaced).
    pub fn update_source(&mut self) {
        debug!("Source updated, clearing render queue");
        self.fast.clear();
        self.refined.clear();
        self.cache.clear_job_refs();
        self.cancel_registration();
        self.sync_scroll();
    }

    /// Forget queued work and every tile.
    pub fn clear(&mut self) {
        self.update_source();
        self.cache.clear();
        self.scratch.release();
    }

    /// Switch stereo mode. Follow with `viewport_resized` and
    /// `zoom_changed` to re-render.
    pub fn stereo_mode_set(&mut self, mode: StereoMode) {
        self.stereo = mode;
        self.sync_scroll();
    }

    // =========================================================================
    // Overlays
    // =========================================================================

    /// Queue the rectangle under an overlay (viewport pixels) grown by the
    /// given borders.
    fn overlay_queue_rect(&mut self, od: Rect, x1: i32, y1: i32, x2: i32, y2: i32) {
        let r = Rect::new(od.x - x1, od.y - y1, od.width + x1 + x2, od.height + y1 + y2);
        self.enqueue(
            Rect::new(
                self.x_scroll - self.view.x_offset + r.x,
                self.y_scroll - self.view.y_offset + r.y,
                r.width,
                r.height,
            ),
            false,
            RenderState::All,
            false,
            false,
        );
        self.border_draw(r);
    }

    fn overlay_queue_all(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let rects = self
            .overlays
            .rects(self.view.viewport_width, self.view.viewport_height);
        for od in rects {
            self.overlay_queue_rect(od, x1, y1, x2, y2);
        }
    }

    /// Add an overlay at viewport position `(x, y)`.
    pub fn overlay_add(
        &mut self,
        image: RgbaImage,
        x: i32,
        y: i32,
        flags: OverlayFlags,
    ) -> Result<u32, OverlayError> {
        let id = self.overlays.add(image, x, y, flags)?;
        let (vp_w, vp_h) = (self.view.viewport_width, self.view.viewport_height);
        if let Some(od) = self.overlays.rect(id, vp_w, vp_h) {
            self.overlay_queue_rect(od, 0, 0, 0, 0);
        }
        Ok(id)
    }

    /// Replace an overlay's image (and optionally position); `None` removes
    /// it.
    pub fn overlay_set(
        &mut self,
        id: u32,
        image: Option<RgbaImage>,
        position: Option<(i32, i32)>,
    ) -> Result<(), OverlayError> {
        let (vp_w, vp_h) = (self.view.viewport_width, self.view.viewport_height);
        let old = self.overlays.rect(id, vp_w, vp_h);
        self.overlays.set(id, image, position)?;

        if let Some(od) = old {
            self.overlay_queue_rect(od, 0, 0, 0, 0);
        }
        if let Some(od) = self.overlays.rect(id, vp_w, vp_h) {
            if Some(od) != old {
                self.overlay_queue_rect(od, 0, 0, 0, 0);
            }
        }
        Ok(())
    }

    /// Image and requested position of an overlay.
    pub fn overlay_get(&self, id: u32) -> Option<(&RgbaImage, i32, i32)> {
        self.overlays.get(id)
    }
}

// =============================================================================
// Tests
// =============================================================================
