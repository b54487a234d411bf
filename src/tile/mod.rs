//! Destination tiles and the budgeted cache that owns them.
//!
//! The destination (zoomed, oriented) image is cut into square tiles aligned
//! to multiples of the tile size:
//!
//! ```text
//!   (0,0)    (128,0)   (256,0)
//!     ┌─────────┬─────────┬────┐
//!     │         │         │    │  ← right column clipped to image width
//!     ├─────────┼─────────┼────┤
//!     │         │ visible │    │
//!     │      ┌──┼──────┐  │    │
//!     └──────┼──┴──────┼──┴────┘
//!            └─────────┘
//! ```
//!
//! - [`Tile`]: render state, lazily allocated buffers and job membership
//! - [`TileCache`]: recency-ordered owner enforcing the byte budget

mod cache;
mod state;

pub use cache::{CacheStats, EvictionContext, TileCache, DEFAULT_CACHE_SIZE_MB};
pub use state::{JobRefs, Pass, RenderState, Tile, TileCoord};
