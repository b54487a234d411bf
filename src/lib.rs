//! # Tile Renderer
//!
//! An incremental, tiled rendering engine for image viewers.
//!
//! The engine paints a bounded viewport of a (possibly huge) source image
//! after zoom, EXIF orientation and stereo processing. The destination image
//! is cut into fixed-size tiles that are rendered lazily, cached under a
//! memory budget and blitted to the output surface. Rendering is cooperative:
//! the engine processes one tile job per callback and tells a host
//! [`Scheduler`] how urgently it wants to be called back.
//!
//! ## Features
//!
//! - **Budgeted tile cache**: LRU eviction that never drops visible or queued tiles
//! - **Two-pass rendering**: fast nearest-neighbour pass, then the quality pass
//! - **Orientation**: all eight EXIF orientations applied per tile
//! - **Stereo**: left/right eye selection, side-by-side layouts, anaglyph merge
//! - **Source tiles**: build destination tiles from coarse on-demand source tiles
//! - **Overlays**: alpha-blended images composited over the viewport
//!
//! ## Architecture
//!
//! - [`render`] - The [`TileRenderer`] engine, render queues and per-tile painting
//! - [`tile`] - Tiles and the budgeted [`TileCache`]
//! - [`source`] - [`ImageSource`] providers
//! - [`transform`] - Orientation mappings and pixel transforms
//! - [`stereo`] - Stereo modes and anaglyph composition
//! - [`schedule`] - Scheduling policy and host drivers
//! - [`overlay`] - Viewport overlays
//! - [`config`] - Engine configuration and CLI types
//!
//! ## Example
//!
//! ```rust,no_run
//! use image::RgbImage;
//! use tile_renderer::{
//!     run_until_idle, EngineConfig, FullImageSource, ManualScheduler, Orientation, TileRenderer,
//!     ViewState,
//! };
//!
//! let pixels = RgbImage::new(4000, 3000);
//! let view = ViewState::fit(4000, 3000, Orientation::Identity, 0.25, 800, 600);
//! let mut engine = TileRenderer::new(
//!     EngineConfig::default(),
//!     FullImageSource::new(pixels),
//!     ManualScheduler::new(),
//!     view,
//! )
//! .expect("valid configuration");
//!
//! engine.zoom_changed(false);
//! run_until_idle(&mut engine, 10_000);
//! let surface = engine.surface();
//! # let _ = surface;
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod overlay;
pub mod render;
pub mod schedule;
pub mod source;
pub mod stereo;
pub mod tile;
pub mod transform;

// Re-export commonly used types
pub use config::{Cli, Command, EngineConfig, InspectConfig, RenderConfig};
pub use error::{EngineError, OverlayError, SourceError, TransformError};
pub use geometry::Rect;
pub use overlay::{OverlayFlags, OverlayLayer};
pub use render::{
    EngineStats, Interpolation, PostProcessFn, RenderJob, RenderQueue, SourceTileBridge,
    TileRenderer, ViewState,
};
pub use schedule::{
    drive, run_until_idle, ManualScheduler, Priority, Registration, SchedulePolicy, Scheduler,
};
pub use source::{FullImageSource, ImageSource, SourceTile, TiledImageSource};
pub use stereo::{FixedOffsets, StereoMode, StereoOffsets};
pub use tile::{CacheStats, Pass, RenderState, Tile, TileCache, TileCoord};
pub use transform::{Orientation, ScratchTile};
