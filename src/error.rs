use thiserror::Error;

/// Errors raised by the pixel-buffer orientation transforms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The requested sub-rectangle does not fit inside the tile buffer
    #[error(
        "Region {x},{y} {width}x{height} exceeds tile buffer {buffer_width}x{buffer_height}"
    )]
    RegionOutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        buffer_width: u32,
        buffer_height: u32,
    },

    /// Source and scratch buffers must share the same tile dimensions
    #[error("Buffer dimension mismatch: source is {source_width}x{source_height}, scratch is {scratch_width}x{scratch_height}")]
    DimensionMismatch {
        source_width: u32,
        source_height: u32,
        scratch_width: u32,
        scratch_height: u32,
    },

    /// Rotations need square tile buffers
    #[error("Rotation requires a square tile buffer, got {width}x{height}")]
    NotSquare { width: u32, height: u32 },
}

/// Errors reported by image sources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The collaborator failed to produce a source tile
    #[error("Source tile request at {x},{y} failed: {message}")]
    RequestFailed { x: i32, y: i32, message: String },
}

/// Errors returned by the overlay API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlayError {
    /// Overlays must have a non-zero size
    #[error("Overlay image is empty")]
    EmptyImage,

    /// No overlay is registered under this id
    #[error("Unknown overlay id: {0}")]
    UnknownId(u32),
}

/// Errors returned when constructing a renderer.
///
/// Render-path failures never surface here: they are logged and degrade to a
/// placeholder fill.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The engine configuration is not usable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
