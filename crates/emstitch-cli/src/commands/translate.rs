use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use emstitch_core::arrange::{
    apply_layout_to_tiles, find_tile_offsets_with_progress, iterate_overlapping_tiles,
};
use emstitch_core::layout::{relax_layout, scale_offset_weights_by_population_rank};
use emstitch_core::mosaic::MosaicFile;
use emstitch_core::pool::WorkerPools;
use emstitch_core::tile::create_tiles;

use crate::config::StitchConfig;

#[derive(Args)]
pub struct TranslateArgs {
    /// Input .mosaic file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output .mosaic file with refined positions
    #[arg(short, long)]
    pub output: PathBuf,

    /// Directory containing the tile images (defaults to the input's
    /// directory)
    #[arg(short, long)]
    pub tile_path: Option<PathBuf>,

    /// Working pixel scale of the tile images relative to the transforms
    #[arg(long, default_value = "1.0")]
    pub scale: f64,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &TranslateArgs) -> Result<()> {
    if !args.input.exists() {
        bail!("input mosaic not found: {}", args.input.display());
    }

    let config = StitchConfig::load_or_default(args.config.as_deref())?;

    let mosaic = MosaicFile::load(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    let tile_dir = match &args.tile_path {
        Some(dir) => dir.clone(),
        None => args
            .input
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    if !tile_dir.exists() {
        bail!("tile path not found: {}", tile_dir.display());
    }

    let (transforms, paths) = mosaic.to_tile_set(&tile_dir)?;
    let tiles = create_tiles(transforms, paths);
    if tiles.is_empty() {
        bail!("no readable tiles in {}", args.input.display());
    }

    let pair_count =
        iterate_overlapping_tiles(&tiles, config.translate.min_overlap_fraction).len();
    println!("Aligning {} tile pairs across {} tiles", pair_count, tiles.len());

    let pb = ProgressBar::new(pair_count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("Aligning [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    let pools = WorkerPools::new();
    let mut layout = find_tile_offsets_with_progress(
        &tiles,
        args.scale,
        config.translate.min_overlap_fraction,
        &pools,
        |done| pb.set_position(done as u64),
    )?;
    pb.finish();

    scale_offset_weights_by_population_rank(&mut layout, 0.0, 1.0)?;
    let iterations = relax_layout(
        &mut layout,
        config.translate.max_tension_cutoff,
        config.translate.max_iterations,
        config.translate.relax_step,
    );
    println!("Relaxed layout in {iterations} iterations");

    let mut tiles = tiles;
    apply_layout_to_tiles(&layout, &mut tiles);

    let refined_transforms: Vec<_> = tiles.iter().map(|t| t.transform().clone()).collect();
    let names: Vec<String> = tiles
        .iter()
        .map(|t| mosaic.tiles[t.id()].image.clone())
        .collect();
    let refined = MosaicFile::from_tile_set(&refined_transforms, &names, mosaic.pixel_spacing);
    refined
        .save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "{} {}",
        style("Wrote:").green().bold(),
        args.output.display()
    );
    Ok(())
}
