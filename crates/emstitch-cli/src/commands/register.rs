use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use emstitch_core::brute::slice_to_slice_brute_force;
use emstitch_core::io::image_io::load_image;
use emstitch_core::pool::WorkerPools;

use crate::config::StitchConfig;

#[derive(Args)]
pub struct RegisterArgs {
    /// Fixed (control) section image
    pub fixed: PathBuf,

    /// Moving section image
    pub moving: PathBuf,

    /// Output .stos path
    #[arg(short, long, default_value = "aligned.stos")]
    pub output: PathBuf,

    /// Candidate angles as start:stop:step in degrees
    /// (default: coarse -180:180:2 plus a fine pass)
    #[arg(long)]
    pub angle_range: Option<String>,

    /// Minimum-overlap ratio for phase-correlation padding
    #[arg(long)]
    pub min_overlap: Option<f64>,

    /// Downscale so the largest image dimension does not exceed this
    #[arg(long)]
    pub largest_dimension: Option<usize>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_angle_range(text: &str) -> Result<Vec<f64>> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 3 {
        bail!("angle range must be start:stop:step, got '{text}'");
    }
    let start: f64 = parts[0].parse().context("bad angle range start")?;
    let stop: f64 = parts[1].parse().context("bad angle range stop")?;
    let step: f64 = parts[2].parse().context("bad angle range step")?;
    if step <= 0.0 || stop < start {
        bail!("angle range must satisfy start <= stop and step > 0");
    }

    let mut angles = Vec::new();
    let mut angle = start;
    while angle <= stop {
        angles.push(angle);
        angle += step;
    }
    Ok(angles)
}

pub fn run(args: &RegisterArgs) -> Result<()> {
    if !args.fixed.exists() {
        bail!("fixed image not found: {}", args.fixed.display());
    }
    if !args.moving.exists() {
        bail!("moving image not found: {}", args.moving.display());
    }

    let config = StitchConfig::load_or_default(args.config.as_deref())?;

    let fixed = load_image(&args.fixed)
        .with_context(|| format!("loading {}", args.fixed.display()))?;
    let moving = load_image(&args.moving)
        .with_context(|| format!("loading {}", args.moving.display()))?;

    let mut options = config.register.options.clone();
    if let Some(range) = args.angle_range.as_deref() {
        options.angle_list = Some(parse_angle_range(range)?);
    }
    if let Some(min_overlap) = args.min_overlap {
        options.min_overlap = min_overlap;
    }
    if let Some(largest) = args.largest_dimension {
        options.largest_dimension = Some(largest);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    spinner.set_message(format!(
        "Searching rotations: {} vs {}",
        args.fixed.display(),
        args.moving.display()
    ));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let pools = WorkerPools::new();
    let record = slice_to_slice_brute_force(&fixed, &moving, &options, &pools)?;
    spinner.finish_and_clear();

    let stos = record.to_stos(
        &args.fixed,
        &args.moving,
        fixed.dim(),
        moving.dim(),
        config.register.pixel_spacing,
    );
    stos.save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "{} angle {:.2} deg, offset ({:.1}, {:.1}), weight {:.3}",
        style("Registered:").green().bold(),
        record.angle,
        record.peak.0,
        record.peak.1,
        record.weight
    );
    println!("Wrote {}", args.output.display());
    Ok(())
}
