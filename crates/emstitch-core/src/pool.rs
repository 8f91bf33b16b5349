//! Worker pools for the registration and assembly drivers.
//!
//! Two pools are distinguished by role: a compute pool sized to the available
//! cores for FFT-bound work, and a small I/O pool for image loading. Entry
//! points take an explicit `&WorkerPools` so callers can share or size pools;
//! `WorkerPools::new()` is the convenience default.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::consts::IO_POOL_THREADS;

pub struct WorkerPools {
    pub compute: ThreadPool,
    pub io: ThreadPool,
}

impl WorkerPools {
    /// Compute pool sized to the available parallelism, I/O pool with a small
    /// fixed thread count.
    pub fn new() -> Self {
        Self::with_threads(0, IO_POOL_THREADS)
    }

    /// `compute_threads` of 0 lets rayon pick the core count.
    pub fn with_threads(compute_threads: usize, io_threads: usize) -> Self {
        let compute = ThreadPoolBuilder::new()
            .num_threads(compute_threads)
            .build()
            .expect("spawn compute pool");
        let io = ThreadPoolBuilder::new()
            .num_threads(io_threads.max(1))
            .build()
            .expect("spawn io pool");
        Self { compute, io }
    }
}

impl Default for WorkerPools {
    fn default() -> Self {
        Self::new()
    }
}
