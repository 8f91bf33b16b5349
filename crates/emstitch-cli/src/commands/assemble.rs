use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use console::style;

use emstitch_core::assemble::{tiles_to_image, AssembleOptions};
use emstitch_core::io::image_io::{save_image, save_mask_png};
use emstitch_core::mosaic::MosaicFile;
use emstitch_core::pool::WorkerPools;
use emstitch_core::spatial::Rectangle;

#[derive(Args)]
pub struct AssembleArgs {
    /// Input .mosaic file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output image path (.png or .tiff)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Directory containing the tile images (defaults to the input's
    /// directory)
    #[arg(short, long)]
    pub tile_path: Option<PathBuf>,

    /// Render only this fixed-space rectangle: min_y min_x max_y max_x
    #[arg(long, num_args = 4, value_names = ["MIN_Y", "MIN_X", "MAX_Y", "MAX_X"])]
    pub region: Option<Vec<f64>>,

    /// Working pixel scale of the tile images relative to the transforms
    #[arg(long, default_value = "1.0")]
    pub scale: f64,
}

pub fn run(args: &AssembleArgs) -> Result<()> {
    if !args.input.exists() {
        bail!("input mosaic not found: {}", args.input.display());
    }

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

    let fixed_region = args.region.as_ref().map(|bounds| {
        Rectangle::from_bounds(bounds[0], bounds[1], bounds[2], bounds[3])
    });

    let options = AssembleOptions {
        fixed_region,
        image_scale: Some(args.scale),
        cache_dir: None,
    };

    println!("Assembling {} tiles", transforms.len());
    let pools = WorkerPools::new();
    let (image, mask) = tiles_to_image(&transforms, &paths, &options, &pools)?;

    save_image(&image, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let mask_path = args.output.with_extension("mask.png");
    save_mask_png(&mask, &mask_path)
        .with_context(|| format!("writing {}", mask_path.display()))?;

    println!(
        "{} {}x{} composite to {} (mask {})",
        style("Wrote:").green().bold(),
        image.width(),
        image.height(),
        args.output.display(),
        mask_path.display()
    );
    Ok(())
}
