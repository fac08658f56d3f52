//! `tripmap prefetch`: download map tiles for offline use.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tripmap::config::ConfigFile;
use tripmap::prefetch::{
    plan_tiles, DiskTileStore, HttpTileFetcher, TileBounds, TileOutcome, TilePrefetcher,
};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct PrefetchArgs {
    /// Northern edge in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub north: f64,

    /// Southern edge in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub south: f64,

    /// Eastern edge in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub east: f64,

    /// Western edge in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub west: f64,

    /// Lowest zoom level to download
    #[arg(long, default_value_t = 13)]
    pub min_zoom: u8,

    /// Highest zoom level to download
    #[arg(long, default_value_t = 16)]
    pub max_zoom: u8,

    /// Tile directory (default from config)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Pause between requests in milliseconds (default from config)
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Refuse areas needing more tiles than this (default from config)
    #[arg(long)]
    pub max_tiles: Option<u64>,
}

pub fn run(args: PrefetchArgs, config: &ConfigFile) -> Result<(), CliError> {
    let bounds = TileBounds::new(args.north, args.south, args.east, args.west)?;

    let mut settings = config.prefetch.clone();
    if let Some(dir) = args.cache_dir {
        settings = settings.with_cache_dir(dir);
    }
    if let Some(ms) = args.delay_ms {
        settings = settings.with_delay(Duration::from_millis(ms));
    }
    if let Some(limit) = args.max_tiles {
        settings = settings.with_max_tiles(limit);
    }

    let tiles = plan_tiles(&bounds, args.min_zoom, args.max_zoom, settings.max_tiles)?;

    let worst_case = settings.delay * tiles.len() as u32;
    println!("Tile prefetch");
    println!("=============");
    println!();
    println!(
        "Area:    N {:.4}  S {:.4}  E {:.4}  W {:.4}",
        bounds.north, bounds.south, bounds.east, bounds.west
    );
    println!("Zoom:    {}-{}", args.min_zoom, args.max_zoom);
    println!("Tiles:   {}", tiles.len());
    println!("Cache:   {}", settings.cache_dir.display());
    println!("Source:  {}", settings.tile_url);
    println!("Time:    up to {}s", worst_case.as_secs());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let fetcher = Arc::new(HttpTileFetcher::new(&settings)?);
    let store = Arc::new(DiskTileStore::new(&settings.cache_dir));
    let prefetcher = TilePrefetcher::new(fetcher, store).with_delay(settings.delay);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || signal.cancel())
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let bar = ProgressBar::new(tiles.len() as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tiles {msg}",
        )
        .map_err(|e| CliError::Runtime(e.to_string()))?
        .progress_chars("=>-"),
    );

    let mut failed = 0usize;
    let summary = super::runtime()?.block_on(prefetcher.run(&tiles, &shutdown, |progress| {
        bar.set_position(progress.completed as u64);
        if progress.outcome == TileOutcome::Failed {
            failed += 1;
            bar.set_message(format!("({} failed)", failed));
        }
    }));
    bar.finish_and_clear();

    if summary.cancelled {
        println!("{}", style("Stopped early").yellow());
    } else {
        println!("{}", style("Download complete").green().bold());
    }
    println!("  Downloaded: {}", summary.downloaded);
    println!("  Cached:     {}", summary.skipped);
    println!("  Failed:     {}", summary.failed);
    println!("  Remaining:  {}", summary.total - summary.completed());

    Ok(())
}
