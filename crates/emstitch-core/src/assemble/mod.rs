//! Mosaic assembly: warp tiles into a fixed-space canvas and composite them
//! with a minimum-centre-distance z-buffer, so every output pixel comes from
//! the tile whose centre is nearest (least aberrated optics).

pub mod distance;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use rayon::prelude::*;
use tracing::info;

use crate::consts::{MAX_Z, RENDER_TILE_SIZE, SERIAL_RESAMPLE_LIMIT};
use crate::error::{Result, StitchError};
use crate::image::Image;
use crate::io::image_io::load_image;
use crate::ops::{cubic_sample, nearest_sample};
use crate::pool::WorkerPools;
use crate::spatial::Rectangle;
use crate::transform::RigidTransform;

use distance::cached_distance_image;

/// One tile warped into a fixed-space region: samples plus their per-pixel
/// distance to the source tile's centre.
pub struct TransformedTile {
    pub image: Array2<f32>,
    pub depth: Array2<f32>,
}

/// Warp a tile into the given fixed-space region (integer pixel bounds).
///
/// Fixed-space coordinates are inverse-transformed into the source; samples
/// use bicubic interpolation with 0 outside, the depth channel samples the
/// distance image nearest-neighbour. Coordinates falling outside the source
/// bounding box get depth `MAX_Z`.
pub fn transform_tile(
    transform: &RigidTransform,
    image: &Image,
    distance_image: &Array2<f32>,
    region: &Rectangle,
) -> TransformedTile {
    let height = region.height().max(0.0) as usize;
    let width = region.width().max(0.0) as usize;
    let (src_h, src_w) = image.dim();

    let sample_row = |r: usize| -> (Vec<f32>, Vec<f32>) {
        let mut img_row = Vec::with_capacity(width);
        let mut depth_row = Vec::with_capacity(width);
        let fy = region.min_y + r as f64;
        for c in 0..width {
            let fx = region.min_x + c as f64;
            let (sy, sx) = transform.inverse_transform_point((fy, fx));
            let inside =
                sy >= 0.0 && sy <= (src_h - 1) as f64 && sx >= 0.0 && sx <= (src_w - 1) as f64;
            if inside {
                img_row.push(cubic_sample(&image.data, sy, sx, 0.0));
                depth_row.push(nearest_sample(distance_image, sy, sx, MAX_Z));
            } else {
                img_row.push(0.0);
                depth_row.push(MAX_Z);
            }
        }
        (img_row, depth_row)
    };

    let rows: Vec<(Vec<f32>, Vec<f32>)> = if height * width < SERIAL_RESAMPLE_LIMIT {
        (0..height).map(sample_row).collect()
    } else {
        (0..height).into_par_iter().map(sample_row).collect()
    };

    let mut out_image = Array2::<f32>::zeros((height, width));
    let mut out_depth = Array2::<f32>::from_elem((height, width), MAX_Z);
    for (r, (img_row, depth_row)) in rows.into_iter().enumerate() {
        for (c, v) in img_row.into_iter().enumerate() {
            out_image[[r, c]] = v;
        }
        for (c, v) in depth_row.into_iter().enumerate() {
            out_depth[[r, c]] = v;
        }
    }

    TransformedTile {
        image: out_image,
        depth: out_depth,
    }
}

/// Composite a warped tile into the canvas at `origin` = (row, col), keeping
/// whichever sample lies closer to its source tile's centre.
pub fn composite_with_zbuffer(
    canvas: &mut Array2<f32>,
    zbuffer: &mut Array2<f32>,
    tile: &TransformedTile,
    origin: (usize, usize),
) -> Result<()> {
    let (th, tw) = tile.image.dim();
    let (ch, cw) = canvas.dim();
    if origin.0 + th > ch || origin.1 + tw > cw {
        return Err(StitchError::InvalidInput(format!(
            "composite region {}x{} at ({}, {}) exceeds canvas {}x{}",
            th, tw, origin.0, origin.1, ch, cw
        )));
    }

    for r in 0..th {
        for c in 0..tw {
            let depth = tile.depth[[r, c]];
            let cell = [origin.0 + r, origin.1 + c];
            if depth < zbuffer[cell] {
                zbuffer[cell] = depth;
                canvas[cell] = tile.image[[r, c]];
            }
        }
    }
    Ok(())
}

#[derive(Clone, Debug, Default)]
pub struct AssembleOptions {
    /// Target rectangle in full-resolution fixed space. Defaults to the union
    /// of the tiles' fixed bounding boxes.
    pub fixed_region: Option<Rectangle>,
    /// Working pixel scale; transforms are rescaled to match.
    pub image_scale: Option<f64>,
    /// Directory for the distance-image cache. Defaults to the system temp
    /// directory.
    pub cache_dir: Option<PathBuf>,
}

/// Assemble tiles into a single fixed-space image.
///
/// Returns the composited canvas clamped to [0, 1] plus a boolean mask that
/// is true wherever at least one tile contributed a sample.
pub fn tiles_to_image(
    transforms: &[RigidTransform],
    image_paths: &[PathBuf],
    options: &AssembleOptions,
    pools: &WorkerPools,
) -> Result<(Image, Array2<bool>)> {
    if transforms.len() != image_paths.len() {
        return Err(StitchError::InvalidInput(format!(
            "{} transforms for {} images",
            transforms.len(),
            image_paths.len()
        )));
    }
    if transforms.is_empty() {
        return Err(StitchError::EmptyTileSet);
    }

    let scale = options.image_scale.unwrap_or(1.0);
    let transforms: Vec<RigidTransform> = if scale != 1.0 {
        transforms.iter().map(|t| t.scaled(scale)).collect()
    } else {
        transforms.to_vec()
    };

    // Images load on the I/O pool; render workers share them read-only.
    let images: Result<Vec<Image>> = pools.io.install(|| {
        image_paths
            .par_iter()
            .map(|path| load_image(path))
            .collect()
    });
    let images = images?;

    let region = match options.fixed_region {
        Some(r) => r.scaled(scale),
        None => {
            let mut boxes = transforms.iter().map(RigidTransform::fixed_bounding_box);
            let first = boxes.next().expect("non-empty tile set");
            boxes.fold(first, |acc, b| {
                Rectangle::from_bounds(
                    acc.min_y.min(b.min_y),
                    acc.min_x.min(b.min_x),
                    acc.max_y.max(b.max_y),
                    acc.max_x.max(b.max_x),
                )
            })
        }
    }
    .round_outward();

    let height = region.height() as usize;
    let width = region.width() as usize;
    if height == 0 || width == 0 {
        return Err(StitchError::InvalidInput(
            "assembly region has zero area".into(),
        ));
    }

    // One distance image per distinct tile shape, disk-cached.
    let cache_dir = options
        .cache_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    let mut distance_images: HashMap<(usize, usize), Array2<f32>> = HashMap::new();
    for image in &images {
        distance_images
            .entry(image.dim())
            .or_insert_with(|| cached_distance_image(&cache_dir, image.dim().0, image.dim().1));
    }

    info!(
        width,
        height,
        tiles = transforms.len(),
        "assembling mosaic"
    );

    let blocks = split_into_blocks(&region, RENDER_TILE_SIZE);
    let rendered: Vec<(Rectangle, Array2<f32>, Array2<f32>)> = pools.compute.install(|| {
        blocks
            .par_iter()
            .map(|block| {
                let (canvas, zbuffer) =
                    render_block(block, &transforms, &images, &distance_images);
                (*block, canvas, zbuffer)
            })
            .collect()
    });

    let mut canvas = Array2::<f32>::zeros((height, width));
    let mut zbuffer = Array2::<f32>::from_elem((height, width), MAX_Z);
    for (block, block_canvas, block_z) in rendered {
        let r0 = (block.min_y - region.min_y) as usize;
        let c0 = (block.min_x - region.min_x) as usize;
        let (bh, bw) = block_canvas.dim();
        for r in 0..bh {
            for c in 0..bw {
                canvas[[r0 + r, c0 + c]] = block_canvas[[r, c]];
                zbuffer[[r0 + r, c0 + c]] = block_z[[r, c]];
            }
        }
    }

    let mask = zbuffer.mapv(|z| z < MAX_Z);
    canvas.mapv_inplace(|v| v.clamp(0.0, 1.0));

    Ok((Image::new(canvas), mask))
}

/// Split a region into at most `block_size`-square sub-rectangles.
fn split_into_blocks(region: &Rectangle, block_size: usize) -> Vec<Rectangle> {
    let height = region.height() as usize;
    let width = region.width() as usize;
    let mut blocks = Vec::new();
    let mut r = 0;
    while r < height {
        let bh = block_size.min(height - r);
        let mut c = 0;
        while c < width {
            let bw = block_size.min(width - c);
            blocks.push(Rectangle::from_point_and_size(
                (region.min_y + r as f64, region.min_x + c as f64),
                (bh as f64, bw as f64),
            ));
            c += bw;
        }
        r += bh;
    }
    blocks
}

fn render_block(
    block: &Rectangle,
    transforms: &[RigidTransform],
    images: &[Image],
    distance_images: &HashMap<(usize, usize), Array2<f32>>,
) -> (Array2<f32>, Array2<f32>) {
    let height = block.height() as usize;
    let width = block.width() as usize;
    let mut canvas = Array2::<f32>::zeros((height, width));
    let mut zbuffer = Array2::<f32>::from_elem((height, width), MAX_Z);

    for (transform, image) in transforms.iter().zip(images) {
        let Some(covered) = transform.fixed_bounding_box().intersect(block) else {
            continue;
        };
        let covered = covered.round_outward().intersect(block).unwrap_or(covered);

        let distance_image = &distance_images[&image.dim()];
        let warped = transform_tile(transform, image, distance_image, &covered);
        let origin = (
            (covered.min_y - block.min_y) as usize,
            (covered.min_x - block.min_x) as usize,
        );
        // The covered region is clipped to the block, so this cannot exceed
        // the canvas.
        let _ = composite_with_zbuffer(&mut canvas, &mut zbuffer, &warped, origin);
    }

    (canvas, zbuffer)
}
