//! Configuration for the tile renderer.
//!
//! [`EngineConfig`] holds the engine tunables. It is a plain struct with
//! sensible defaults that can also be flattened into the command line, where
//! every option falls back to a `TILE_RENDERER_` environment variable:
//!
//! - `TILE_RENDERER_TILE_SIZE` - Logical tile edge (default: 128)
//! - `TILE_RENDERER_HIDPI_SCALE` - Device pixels per logical pixel (default: 1)
//! - `TILE_RENDERER_CACHE_MB` - Tile cache budget in MiB (default: 8)
//! - `TILE_RENDERER_REDRAW_DELAY_MS` - Wait used for small queues (default: 50)
//! - `TILE_RENDERER_HIGH_PRIORITY_PERCENT` - Redraw priority threshold (default: 10)
//! - `TILE_RENDERER_LOW_PRIORITY_PERCENT` - Delayed wait threshold (default: 1)
//! - `TILE_RENDERER_MIN_SCALE_SIZE` - Nearest-neighbour cutoff (default: 8)
//! - `TILE_RENDERER_WIDE_IMAGE_THRESHOLD` - Manual copy cutoff (default: 32767)
//! - `TILE_RENDERER_PLACEHOLDER_COLOR` - Fill for missing data (default: 000000)
//!
//! # Example
//!
//! ```ignore
//! use tile_renderer::config::{Cli, Command};
//!
//! let cli = Cli::parse();
//! match cli.into_command() {
//!     Command::Render(config) => println!("tile size {}", config.engine.tile_size),
//!     Command::Inspect(config) => println!("{:?}", config.input),
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::schedule::SchedulePolicy;
use crate::stereo::StereoMode;
use crate::tile::DEFAULT_CACHE_SIZE_MB;

// =============================================================================
// Default Values
// =============================================================================

/// Default logical tile edge.
pub const DEFAULT_TILE_SIZE: i32 = 128;

/// Default device-pixel multiplier.
pub const DEFAULT_HIDPI_SCALE: i32 = 1;

/// Default wait for a nearly empty queue (milliseconds).
pub const DEFAULT_REDRAW_DELAY_MS: u64 = 50;

/// Queued share of the visible area above which redraw priority is used.
pub const DEFAULT_HIGH_PRIORITY_PERCENT: f64 = 10.0;

/// Queued share of the visible area below which the engine waits.
pub const DEFAULT_LOW_PRIORITY_PERCENT: f64 = 1.0;

/// Destination dimension below which nearest-neighbour is forced.
pub const DEFAULT_MIN_SCALE_SIZE: i32 = 8;

/// Source width above which unscaled tiles are copied manually.
pub const DEFAULT_WIDE_IMAGE_THRESHOLD: i32 = 32767;

/// Accepted tile edges.
pub const MIN_TILE_SIZE: i32 = 16;
pub const MAX_TILE_SIZE: i32 = 4096;

/// Largest accepted device-pixel multiplier.
pub const MAX_HIDPI_SCALE: i32 = 8;

// =============================================================================
// Engine Configuration
// =============================================================================

/// Engine tunables.
#[derive(Args, Debug, Clone, PartialEq, Serialize)]
pub struct EngineConfig {
    // =========================================================================
    // Tiles
    // =========================================================================
    /// Logical tile edge in pixels (tiles are square).
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "TILE_RENDERER_TILE_SIZE")]
    pub tile_size: i32,

    /// Device pixels per logical pixel.
    #[arg(long, default_value_t = DEFAULT_HIDPI_SCALE, env = "TILE_RENDERER_HIDPI_SCALE")]
    pub hidpi_scale: i32,

    /// Tile cache budget in MiB.
    #[arg(long = "cache-mb", default_value_t = DEFAULT_CACHE_SIZE_MB, env = "TILE_RENDERER_CACHE_MB")]
    pub cache_size_mb: usize,

    // =========================================================================
    // Scheduling
    // =========================================================================
    /// Wait used when little work is queued, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_REDRAW_DELAY_MS, env = "TILE_RENDERER_REDRAW_DELAY_MS")]
    pub redraw_delay_ms: u64,

    /// Queued percentage of the visible area above which rendering runs at
    /// redraw priority.
    #[arg(
        long,
        default_value_t = DEFAULT_HIGH_PRIORITY_PERCENT,
        env = "TILE_RENDERER_HIGH_PRIORITY_PERCENT"
    )]
    pub high_priority_percent: f64,

    /// Queued percentage below which rendering waits.
    #[arg(
        long,
        default_value_t = DEFAULT_LOW_PRIORITY_PERCENT,
        env = "TILE_RENDERER_LOW_PRIORITY_PERCENT"
    )]
    pub low_priority_percent: f64,

    // =========================================================================
    // Resampling
    // =========================================================================
    /// Destination width or height below which nearest-neighbour is used.
    #[arg(long, default_value_t = DEFAULT_MIN_SCALE_SIZE, env = "TILE_RENDERER_MIN_SCALE_SIZE")]
    pub min_scale_size: i32,

    /// Source width above which unscaled tiles are copied byte by byte.
    #[arg(
        long,
        default_value_t = DEFAULT_WIDE_IMAGE_THRESHOLD,
        env = "TILE_RENDERER_WIDE_IMAGE_THRESHOLD"
    )]
    pub wide_image_threshold: i32,

    /// Fill colour for blank or unavailable data (hex RRGGBB).
    #[arg(
        long,
        value_parser = parse_color,
        default_value = "000000",
        env = "TILE_RENDERER_PLACEHOLDER_COLOR"
    )]
    pub placeholder_color: [u8; 3],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            hidpi_scale: DEFAULT_HIDPI_SCALE,
            cache_size_mb: DEFAULT_CACHE_SIZE_MB,
            redraw_delay_ms: DEFAULT_REDRAW_DELAY_MS,
            high_priority_percent: DEFAULT_HIGH_PRIORITY_PERCENT,
            low_priority_percent: DEFAULT_LOW_PRIORITY_PERCENT,
            min_scale_size: DEFAULT_MIN_SCALE_SIZE,
            wide_image_threshold: DEFAULT_WIDE_IMAGE_THRESHOLD,
            placeholder_color: [0, 0, 0],
        }
    }
}

impl EngineConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.tile_size < MIN_TILE_SIZE || self.tile_size > MAX_TILE_SIZE {
            return Err(format!(
                "tile_size must be between {} and {}",
                MIN_TILE_SIZE, MAX_TILE_SIZE
            ));
        }

        if self.hidpi_scale < 1 || self.hidpi_scale > MAX_HIDPI_SCALE {
            return Err(format!("hidpi_scale must be between 1 and {}", MAX_HIDPI_SCALE));
        }

        if self.cache_size_mb == 0 {
            return Err("cache_size_mb must be greater than 0".to_string());
        }

        if !(self.low_priority_percent < self.high_priority_percent) {
            return Err(
                "low_priority_percent must be lower than high_priority_percent".to_string(),
            );
        }

        if self.min_scale_size < 1 {
            return Err("min_scale_size must be greater than 0".to_string());
        }

        Ok(())
    }

    pub fn redraw_delay(&self) -> Duration {
        Duration::from_millis(self.redraw_delay_ms)
    }

    /// Scheduling thresholds as a policy.
    pub fn schedule_policy(&self) -> SchedulePolicy {
        SchedulePolicy {
            high_percent: self.high_priority_percent,
            low_percent: self.low_priority_percent,
            delay: self.redraw_delay(),
        }
    }
}

/// Parse `RRGGBB` (optionally prefixed with `#`) into a colour.
pub fn parse_color(value: &str) -> Result<[u8; 3], String> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(format!("Invalid colour '{}': expected RRGGBB", value));
    }

    let mut color = [0u8; 3];
    for (i, channel) in color.iter_mut().enumerate() {
        *channel = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|_| format!("Invalid colour '{}': expected RRGGBB", value))?;
    }
    Ok(color)
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Tile Renderer - incremental tiled rendering of large images.
///
/// Renders a viewport of a zoomed, rotated or stereo image through the tile
/// cache and writes the composed result.
#[derive(Parser, Debug, Clone)]
#[command(name = "tile-renderer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        let verbose = self.verbose;
        match self.command {
            Command::Render(mut config) => {
                config.verbose |= verbose;
                Command::Render(config)
            }
            Command::Inspect(mut config) => {
                config.verbose |= verbose;
                Command::Inspect(config)
            }
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render an image viewport to a PNG file.
    Render(RenderConfig),

    /// Print the effective configuration and tile grid as JSON.
    Inspect(InspectConfig),
}

/// Which eye of a side-by-side pair to render.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

/// Anaglyph merge of the two eyes.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnaglyphArg {
    RedCyan,
    GreenMagenta,
    YellowBlue,
    GrayRedCyan,
    GrayGreenMagenta,
    GrayYellowBlue,
    DuboisRedCyan,
    DuboisGreenMagenta,
    DuboisYellowBlue,
}

impl AnaglyphArg {
    pub fn mode(self) -> StereoMode {
        match self {
            AnaglyphArg::RedCyan => StereoMode::ANAGLYPH_RC,
            AnaglyphArg::GreenMagenta => StereoMode::ANAGLYPH_GM,
            AnaglyphArg::YellowBlue => StereoMode::ANAGLYPH_YB,
            AnaglyphArg::GrayRedCyan => StereoMode::ANAGLYPH_GRAY_RC,
            AnaglyphArg::GrayGreenMagenta => StereoMode::ANAGLYPH_GRAY_GM,
            AnaglyphArg::GrayYellowBlue => StereoMode::ANAGLYPH_GRAY_YB,
            AnaglyphArg::DuboisRedCyan => StereoMode::ANAGLYPH_DB_RC,
            AnaglyphArg::DuboisGreenMagenta => StereoMode::ANAGLYPH_DB_GM,
            AnaglyphArg::DuboisYellowBlue => StereoMode::ANAGLYPH_DB_YB,
        }
    }
}

/// View geometry shared by the subcommands.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ViewArgs {
    /// Input image (any format the `image` crate decodes).
    pub input: PathBuf,

    /// Zoom factor (destination / source).
    #[arg(long, default_value_t = 1.0)]
    pub zoom: f64,

    /// EXIF orientation code (1-8).
    #[arg(long, default_value_t = 1)]
    pub orientation: u8,

    /// Viewport width in logical pixels.
    #[arg(long, default_value_t = 800)]
    pub viewport_width: i32,

    /// Viewport height in logical pixels.
    #[arg(long, default_value_t = 600)]
    pub viewport_height: i32,

    /// Horizontal scroll position in destination pixels.
    #[arg(long, default_value_t = 0)]
    pub scroll_x: i32,

    /// Vertical scroll position in destination pixels.
    #[arg(long, default_value_t = 0)]
    pub scroll_y: i32,

    /// Treat the input as a side-by-side stereo pair.
    #[arg(long, default_value_t = false)]
    pub side_by_side: bool,
}

impl ViewArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.zoom > 0.0) || !self.zoom.is_finite() {
            return Err("zoom must be a positive number".to_string());
        }
        if !(1..=8).contains(&self.orientation) {
            return Err("orientation must be an EXIF code between 1 and 8".to_string());
        }
        if self.viewport_width < 1 || self.viewport_height < 1 {
            return Err("viewport size must be at least 1x1".to_string());
        }
        Ok(())
    }
}

/// Options for the `render` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RenderConfig {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Output PNG path.
    #[arg(short, long, default_value = "render.png")]
    pub output: PathBuf,

    /// Use nearest-neighbour instead of bilinear resampling.
    #[arg(long, default_value_t = false)]
    pub nearest: bool,

    /// Render a fast nearest-neighbour pass before the quality pass.
    #[arg(long, default_value_t = false)]
    pub two_pass: bool,

    /// Colour of the viewport outside the image (hex RRGGBB).
    #[arg(long, value_parser = parse_color, default_value = "000000")]
    pub border_color: [u8; 3],

    /// Serve the image as on-demand source tiles of this size.
    #[arg(long)]
    pub source_tile_size: Option<i32>,

    /// Eye to render from a side-by-side pair.
    #[arg(long, value_enum, default_value_t = Eye::Left)]
    pub eye: Eye,

    /// Merge both eyes of a side-by-side pair.
    #[arg(long, value_enum)]
    pub anaglyph: Option<AnaglyphArg>,

    /// Mirror the rendered eye horizontally.
    #[arg(long, default_value_t = false)]
    pub mirror: bool,

    /// Flip the rendered eye vertically.
    #[arg(long, default_value_t = false)]
    pub flip: bool,

    /// PNG overlay composited over the viewport.
    #[arg(long)]
    pub overlay: Option<PathBuf>,

    /// Overlay position; negative values count from the right/bottom edge.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub overlay_x: i32,

    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub overlay_y: i32,

    /// Print render statistics as JSON.
    #[arg(long, default_value_t = false)]
    pub stats: bool,

    #[arg(skip)]
    pub verbose: bool,

    #[command(flatten)]
    pub engine: EngineConfig,
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.view.validate()?;
        self.engine.validate()?;

        if let Some(size) = self.source_tile_size {
            if size < 1 {
                return Err("source_tile_size must be greater than 0".to_string());
            }
        }
        if (self.anaglyph.is_some() || self.eye == Eye::Right) && !self.view.side_by_side {
            return Err("--eye right and --anaglyph need a --side-by-side input".to_string());
        }
        Ok(())
    }

    /// Stereo mode selected by the flags.
    pub fn stereo_mode(&self) -> StereoMode {
        let mut mode = StereoMode::empty();
        if self.eye == Eye::Right {
            mode |= StereoMode::RIGHT;
        }
        if let Some(anaglyph) = self.anaglyph {
            mode |= anaglyph.mode();
        }
        if self.mirror {
            mode |= StereoMode::MIRROR;
        }
        if self.flip {
            mode |= StereoMode::FLIP;
        }
        mode
    }
}

/// Options for the `inspect` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InspectConfig {
    #[command(flatten)]
    pub view: ViewArgs,

    #[arg(skip)]
    pub verbose: bool,

    #[command(flatten)]
    pub engine: EngineConfig,
}

impl InspectConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.view.validate()?;
        self.engine.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
