//! Mosaic arrangement: compute pairwise offsets between overlapping tiles and
//! feed them into the spring layout.
//!
//! Pair jobs receive only image paths and precomputed crop windows so that
//! nothing heavier than a record crosses the worker boundary; each worker
//! reloads its two images from disk.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::consts::{
    DEFAULT_TILE_MIN_OVERLAP, OVERLAP_EXCESS_SCALAR,
};
use crate::correlate::find_offset;
use crate::error::{Result, StitchError};
use crate::image::Image;
use crate::io::image_io::load_image;
use crate::layout::{
    relax_layout_default, scale_offset_weights_by_population_rank, Layout,
};
use crate::ops::{crop, pad_for_phase_correlation, CropFill};
use crate::pool::WorkerPools;
use crate::record::AlignmentRecord;
use crate::spatial::Rectangle;
use crate::tile::{create_tiles, Tile};
use crate::transform::RigidTransform;

/// Index pairs of tiles whose fixed bounding boxes overlap by more than
/// `min_overlap` of the smaller box.
pub fn iterate_overlapping_tiles(tiles: &[Tile], min_overlap: f64) -> Vec<(usize, usize)> {
    let boxes: Vec<Rectangle> = tiles.iter().map(Tile::fixed_bounding_box).collect();
    let mut pairs = Vec::new();
    for i in 0..tiles.len() {
        for j in (i + 1)..tiles.len() {
            if Rectangle::overlap_fraction(&boxes[i], &boxes[j]) >= min_overlap {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// The precomputed geometry of one pair job: congruent crop windows in each
/// tile's image space (at working scale) and the predicted centre-to-centre
/// offset to add back to the raw correlation peak.
#[derive(Clone, Debug)]
pub struct OverlapRegions {
    pub rect_a: Rectangle,
    pub rect_b: Rectangle,
    pub offset_adjustment: (f64, f64),
}

/// Map the fixed-space overlap of two tiles back into each tile's image
/// space, scale to the working pixel scale and force congruent window sizes.
/// Returns `None` when the tiles do not overlap.
pub fn compute_overlap_regions(a: &Tile, b: &Tile, image_scale: f64) -> Option<OverlapRegions> {
    let a_box = a.fixed_bounding_box();
    let b_box = b.fixed_bounding_box();
    let overlap = a_box.intersect(&b_box)?;

    let corners = [
        (overlap.min_y, overlap.min_x),
        (overlap.min_y, overlap.max_x),
        (overlap.max_y, overlap.min_x),
        (overlap.max_y, overlap.max_x),
    ];
    let rect_for = |tile: &Tile| {
        Rectangle::from_points(&tile.transform().inverse_transform(&corners))
            .scaled(image_scale)
            .round_outward()
    };

    let rect_a = rect_for(a);
    // Trim B's window to A's size so the cropped regions are congruent.
    let rect_b = rect_for(b).with_size((rect_a.height(), rect_a.width()));

    let (acy, acx) = a_box.center();
    let (bcy, bcx) = b_box.center();
    let offset_adjustment = ((bcy - acy) * image_scale, (bcx - acx) * image_scale);

    Some(OverlapRegions {
        rect_a,
        rect_b,
        offset_adjustment,
    })
}

/// Crop the window out of the image, grown about its centre so the
/// correlation peak is not pinned to the window edge. Missing pixels take
/// gaussian noise.
fn overlapping_image(image: &Image, rect: &Rectangle, size: (usize, usize)) -> Image {
    let grown = rect
        .scale_about_center(OVERLAP_EXCESS_SCALAR)
        .round_outward()
        .with_size((size.0 as f64, size.1 as f64));
    crop(
        image,
        (grown.min_y as i64, grown.min_x as i64),
        size,
        CropFill::Noise,
    )
}

/// Compute the relative offset (B minus A, in fixed space at working scale)
/// between two tile images restricted to their overlap windows.
///
/// A perfect position prediction yields a raw peak of (0, 0), so the
/// predicted centre-to-centre offset is added back to the result.
pub fn tile_offset(
    a_path: &Path,
    b_path: &Path,
    regions: &OverlapRegions,
) -> Result<AlignmentRecord> {
    if regions.rect_a.area() <= 0.0 || regions.rect_b.area() <= 0.0 {
        return Ok(AlignmentRecord::zero_weight(0.0));
    }

    let a = load_image(a_path)?;
    let b = load_image(b_path)?;

    let grown_size = {
        let grown = regions
            .rect_a
            .scale_about_center(OVERLAP_EXCESS_SCALAR)
            .round_outward();
        (grown.height() as usize, grown.width() as usize)
    };

    let region_a = overlapping_image(&a, &regions.rect_a, grown_size);
    let region_b = overlapping_image(&b, &regions.rect_b, grown_size);

    // The windows are already restricted to the mutual overlap.
    let padded_a = pad_for_phase_correlation(&region_a, 1.0)?;
    let padded_b = pad_for_phase_correlation(&region_b, 1.0)?;

    let record = match find_offset(&padded_a, &padded_b) {
        Ok(record) => record,
        Err(StitchError::ShapeMismatch { .. }) => return Ok(AlignmentRecord::zero_weight(0.0)),
        Err(e) => return Err(e),
    };

    Ok(AlignmentRecord::new(
        (
            record.peak.0 + regions.offset_adjustment.0,
            record.peak.1 + regions.offset_adjustment.1,
        ),
        record.weight,
        0.0,
    ))
}

/// Populate a layout with every pairwise offset between overlapping tiles.
///
/// Nodes start at the tiles' fixed bounding box centres. Pair jobs run on the
/// compute pool; a failed or zero-weight pair is logged and contributes no
/// edge, the remaining pairs are unaffected. No overlapping pairs at all
/// yields a layout with only isolated nodes.
pub fn find_tile_offsets(
    tiles: &[Tile],
    image_scale: f64,
    min_overlap: f64,
    pools: &WorkerPools,
) -> Result<Layout> {
    find_tile_offsets_with_progress(tiles, image_scale, min_overlap, pools, |_| {})
}

/// As [`find_tile_offsets`], invoking `on_pair_done` with the number of
/// completed pairs as results come in.
pub fn find_tile_offsets_with_progress<F>(
    tiles: &[Tile],
    image_scale: f64,
    min_overlap: f64,
    pools: &WorkerPools,
    on_pair_done: F,
) -> Result<Layout>
where
    F: Fn(usize) + Send + Sync,
{
    use std::sync::atomic::{AtomicUsize, Ordering};

    let mut layout = Layout::new();
    for tile in tiles {
        layout.create_node(tile.id(), tile.fixed_bounding_box().center())?;
    }

    struct PairJob {
        a_id: usize,
        b_id: usize,
        a_path: PathBuf,
        b_path: PathBuf,
        regions: OverlapRegions,
    }

    let jobs: Vec<PairJob> = iterate_overlapping_tiles(tiles, min_overlap)
        .into_iter()
        .filter_map(|(i, j)| {
            compute_overlap_regions(&tiles[i], &tiles[j], image_scale).map(|regions| PairJob {
                a_id: tiles[i].id(),
                b_id: tiles[j].id(),
                a_path: tiles[i].image_path().to_path_buf(),
                b_path: tiles[j].image_path().to_path_buf(),
                regions,
            })
        })
        .collect();

    info!(tiles = tiles.len(), pairs = jobs.len(), "aligning tile pairs");

    let counter = AtomicUsize::new(0);
    let results: Vec<(usize, usize, Result<AlignmentRecord>)> = pools.compute.install(|| {
        jobs.par_iter()
            .map(|job| {
                let record = tile_offset(&job.a_path, &job.b_path, &job.regions);
                let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
                on_pair_done(done);
                (job.a_id, job.b_id, record)
            })
            .collect()
    });

    // The driver thread is the sole mutator of the layout.
    let downsample = 1.0 / image_scale;
    for (a_id, b_id, result) in results {
        match result {
            Ok(record) if record.weight > 0.0 => {
                let offset = (record.peak.0 * downsample, record.peak.1 * downsample);
                layout.set_offset(a_id, b_id, offset, record.weight)?;
            }
            Ok(record) => {
                debug!(a = a_id, b = b_id, weight = record.weight, "pair excluded");
            }
            Err(e) => {
                warn!(a = a_id, b = b_id, error = %e, "pair alignment failed");
            }
        }
    }

    Ok(layout)
}

/// Prefetch tile images and their FFT products on the I/O pool.
pub fn precalculate_images(tiles: &[Tile], pools: &WorkerPools) {
    pools.io.install(|| {
        tiles.par_iter().for_each(|tile| {
            if let Err(e) = tile.precalculate() {
                warn!(tile = tile.id(), error = %e, "precalculate failed");
            }
        });
    });
}

/// Find the optimal translation of a set of tiles to construct a seamless
/// mosaic: pairwise offsets, weight rescaling, then spring relaxation.
pub fn translate_tiles(
    transforms: Vec<RigidTransform>,
    image_paths: Vec<PathBuf>,
    image_scale: f64,
    pools: &WorkerPools,
) -> Result<(Layout, Vec<Tile>)> {
    let tiles = create_tiles(transforms, image_paths);
    if tiles.is_empty() {
        return Err(StitchError::EmptyTileSet);
    }

    let mut layout = find_tile_offsets(&tiles, image_scale, DEFAULT_TILE_MIN_OVERLAP, pools)?;
    scale_offset_weights_by_population_rank(&mut layout, 0.0, 1.0)?;
    let iterations = relax_layout_default(&mut layout);
    info!(iterations, "layout relaxed");

    Ok((layout, tiles))
}

/// Move each tile so its fixed bounding box centre lands on its relaxed
/// layout position. Tiles without a node keep their current placement.
pub fn apply_layout_to_tiles(layout: &Layout, tiles: &mut [Tile]) {
    for tile in tiles {
        if let Some(position) = layout.position(tile.id()) {
            tile.transform_mut().set_fixed_center(position);
        }
    }
}
