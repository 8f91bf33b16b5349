/// Resample outputs below this pixel count on a single thread.
pub const SERIAL_RESAMPLE_LIMIT: usize = 32_768;

/// Default minimum-overlap ratio used when padding for phase correlation.
pub const DEFAULT_MIN_OVERLAP: f64 = 0.75;

/// Default overlap fraction of the smaller bounding box required before two
/// tiles are considered neighbours.
pub const DEFAULT_TILE_MIN_OVERLAP: f64 = 0.05;

/// Defaults for replacing saturated extrema with gaussian noise.
pub const DEFAULT_EXTREMA_MEAN: f32 = 0.5;
pub const DEFAULT_EXTREMA_STDDEV: f32 = 0.25;

/// Overlap crop regions are grown by this factor about their centre so the
/// correlation peak is not forced against the window edge.
pub const OVERLAP_EXCESS_SCALAR: f64 = 1.5;

/// Step scalar applied to weighted net tension vectors during relaxation.
pub const RELAX_STEP: f64 = 0.5;

/// Relaxation stops once the largest weighted tension falls below this.
pub const DEFAULT_MAX_TENSION_CUTOFF: f64 = 1.0;

pub const DEFAULT_MAX_RELAX_ITERATIONS: usize = 100;

/// Coarse rotation search covers -180..180 degrees at this spacing.
pub const COARSE_ANGLE_STEP: f64 = 2.0;

/// Fine rotation search: FINE_ANGLE_COUNT angles at FINE_ANGLE_STEP spacing
/// centred on the coarse winner.
pub const FINE_ANGLE_STEP: f64 = 0.1;
pub const FINE_ANGLE_COUNT: usize = 20;

/// Radius excluded around the primary correlation peak when searching for the
/// runner-up maximum.
pub const PEAK_EXCLUSION_RADIUS: usize = 3;

/// Z-buffer value for pixels not covered by any tile.
pub const MAX_Z: f32 = f32::MAX;

/// Output canvases larger than this are rendered in square sub-tiles.
pub const RENDER_TILE_SIZE: usize = 2048;

/// Thread count of the I/O worker pool.
pub const IO_POOL_THREADS: usize = 4;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f64 = 1e-10;
