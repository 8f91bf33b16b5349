pub mod fft2d;
pub mod peak;
pub mod phase;

pub use phase::{find_offset, find_offset_prepared};
