//! Tile Renderer - render a viewport of a large image through the tile engine.
//!
//! This binary loads an image, configures the view and runs the engine to
//! completion on a tokio runtime.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image::{imageops, Rgb, RgbImage};
use serde_json::json;

use tile_renderer::{
    config::{Cli, Command, InspectConfig, RenderConfig, ViewArgs},
    drive,
    geometry::Rect,
    EngineConfig, FullImageSource, ImageSource, Interpolation, ManualScheduler, Orientation,
    OverlayFlags, SourceError, StereoOffsets, TileRenderer, TiledImageSource, ViewState,
};

/// Source tiles kept resident in source-tile mode.
const SOURCE_TILE_CAPACITY: usize = 64;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Render(config) => run_render(config).await,
        Command::Inspect(config) => run_inspect(config),
    }
}

// =============================================================================
// Render Command
// =============================================================================

async fn run_render(config: RenderConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let pixels = match image::open(&config.view.input) {
        Ok(image) => image.to_rgb8(),
        Err(e) => {
            error!("Failed to open {}: {}", config.view.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    info!("Configuration:");
    info!("  Input: {} ({}x{})", config.view.input.display(), pixels.width(), pixels.height());
    info!("  Zoom: {}, orientation {}", config.view.zoom, config.view.orientation);
    info!(
        "  Viewport: {}x{} scrolled to {},{}",
        config.view.viewport_width, config.view.viewport_height, config.view.scroll_x, config.view.scroll_y
    );
    info!(
        "  Tiles: {}px, hidpi x{}, cache {}MB",
        config.engine.tile_size, config.engine.hidpi_scale, config.engine.cache_size_mb
    );

    let view = build_view(&config, pixels.width() as i32, pixels.height() as i32);

    match config.source_tile_size {
        Some(size) => {
            info!("  Source tiles: {}px", size);
            let source = tiled_source(pixels, size);
            render_with(&config, source, view).await
        }
        None => render_with(&config, FullImageSource::new(pixels), view).await,
    }
}

/// View geometry for the render options.
fn build_view(config: &RenderConfig, width: i32, height: i32) -> ViewState {
    let (mut view, _) = view_for(&config.view, width, height);

    view.zoom_quality = if config.nearest {
        Interpolation::Nearest
    } else {
        Interpolation::Bilinear
    };
    view.two_pass = config.two_pass;
    view.border_color = Rgb(config.border_color);
    view
}

/// Lay out the view, splitting a side-by-side pair into two eyes.
fn view_for(args: &ViewArgs, width: i32, height: i32) -> (ViewState, i32) {
    let eye_width = if args.side_by_side { width / 2 } else { width };
    let orientation = Orientation::from_exif(args.orientation);

    let mut view = ViewState::fit(
        eye_width,
        height,
        orientation,
        args.zoom,
        args.viewport_width,
        args.viewport_height,
    );
    if args.side_by_side {
        view.stereo_offsets = StereoOffsets {
            left: 0,
            right: eye_width,
        };
    }
    view.scroll_to(args.scroll_x, args.scroll_y);
    (view, eye_width)
}

/// Serve `pixels` as on-demand source tiles.
fn tiled_source(pixels: RgbImage, tile_size: i32) -> TiledImageSource {
    let (width, height) = (pixels.width() as i32, pixels.height() as i32);
    let pixels = Arc::new(pixels);

    TiledImageSource::new(
        width,
        height,
        tile_size,
        tile_size,
        SOURCE_TILE_CAPACITY,
        Box::new(move |region: Rect| -> Result<Option<RgbImage>, SourceError> {
            let bounds = Rect::new(0, 0, pixels.width() as i32, pixels.height() as i32);
            let Some(r) = region.intersect(&bounds) else {
                return Ok(None);
            };
            let tile = imageops::crop_imm(
                &*pixels,
                r.x as u32,
                r.y as u32,
                r.width as u32,
                r.height as u32,
            )
            .to_image();
            Ok(Some(tile))
        }),
    )
}

async fn render_with<P: ImageSource>(config: &RenderConfig, source: P, view: ViewState) -> ExitCode {
    let mut engine = match TileRenderer::new(config.engine.clone(), source, ManualScheduler::new(), view) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to create renderer: {}", e);
            return ExitCode::FAILURE;
        }
    };

    engine.stereo_mode_set(config.stereo_mode());
    engine.viewport_resized();
    engine.zoom_changed(false);

    if let Some(ref path) = config.overlay {
        match image::open(path) {
            Ok(overlay) => {
                if let Err(e) = engine.overlay_add(
                    overlay.to_rgba8(),
                    config.overlay_x,
                    config.overlay_y,
                    OverlayFlags::RELATIVE,
                ) {
                    warn!("Ignoring overlay {}: {}", path.display(), e);
                }
            }
            Err(e) => warn!("Ignoring overlay {}: {}", path.display(), e),
        }
    }

    let started = Instant::now();
    let ticks = drive(&mut engine).await;
    info!(
        "Rendered in {} callbacks, {:.1} ms",
        ticks,
        started.elapsed().as_secs_f64() * 1000.0
    );

    if let Err(e) = engine.surface().save(&config.output) {
        error!("Failed to write {}: {}", config.output.display(), e);
        return ExitCode::FAILURE;
    }
    info!("Wrote {}", config.output.display());

    if config.stats {
        match serde_json::to_string_pretty(&engine.stats()) {
            Ok(stats) => println!("{}", stats),
            Err(e) => {
                error!("Failed to serialize statistics: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Inspect Command
// =============================================================================

fn run_inspect(config: InspectConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let (width, height) = match image::image_dimensions(&config.view.input) {
        Ok((w, h)) => (w as i32, h as i32),
        Err(e) => {
            eprintln!("Failed to read {}: {}", config.view.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let (view, eye_width) = view_for(&config.view, width, height);
    let report = inspect_report(&config.engine, &view, (width, height), eye_width);

    match serde_json::to_string_pretty(&report) {
        Ok(report) => {
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to serialize report: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Tile grid and budget derived from a configuration and view.
fn inspect_report(
    engine: &EngineConfig,
    view: &ViewState,
    source_size: (i32, i32),
    eye_width: i32,
) -> serde_json::Value {
    let ts = engine.tile_size;
    let columns = (view.width + ts - 1) / ts;
    let rows = (view.height + ts - 1) / ts;

    let first_column = view.x_scroll / ts;
    let last_column = (view.x_scroll + view.vis_width - 1) / ts;
    let first_row = view.y_scroll / ts;
    let last_row = (view.y_scroll + view.vis_height - 1) / ts;

    let device_tile = (ts * engine.hidpi_scale) as usize;
    let tile_bytes = device_tile * device_tile * 3;
    let budget = engine.cache_size_mb * 1024 * 1024;

    json!({
        "engine": engine,
        "source": { "width": source_size.0, "height": source_size.1, "eye_width": eye_width },
        "view": view,
        "grid": {
            "columns": columns,
            "rows": rows,
            "tiles": columns as i64 * rows as i64,
            "visible_columns": [first_column, last_column],
            "visible_rows": [first_row, last_row],
        },
        "cache": {
            "tile_bytes": tile_bytes * 2,
            "budget_bytes": budget,
            "tiles_in_budget": budget / (tile_bytes * 2),
        },
    })
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tile_renderer=debug"
    } else {
        "tile_renderer=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
