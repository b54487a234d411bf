//! Rendering tiles and composing them into the viewport.
//!
//! ```text
//!   ImageSource ──► bridge / resample ──► tile pixbuf ──► orientation
//!                                                            │
//!   surface ◄── overlays ◄── expose ◄── tile surface ◄───────┘
//! ```
//!
//! - [`TileRenderer`]: the engine; owns queues, cache and output surface
//! - [`RenderQueue`]: per-pass job queues with coalescing
//! - [`paint`]: render one region of one tile
//! - [`SourceTileBridge`]: build tiles out of coarse source tiles

mod bridge;
mod engine;
mod queue;
pub(crate) mod resample;
mod tile_render;
mod view;

pub use bridge::{BridgeRequest, SourceTileBridge};
pub use engine::{EngineStats, RenderCompleteFn, TileRenderer};
pub use queue::{RenderJob, RenderQueue};
pub use resample::get_region;
pub use tile_render::{paint, plan_render, PaintContext, PostProcessFn};
pub use view::{Interpolation, ViewState};
