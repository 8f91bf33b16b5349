pub mod crop;
pub mod noise;
pub mod pad;
pub mod reduce;
pub mod rotate;
pub mod sample;

pub use crop::{crop, CropFill};
pub use noise::replace_extrema_with_noise;
pub use pad::{pad_for_phase_correlation, pad_to_shape};
pub use reduce::{reduce, scalar_for_max_dimension};
pub use rotate::rotate;
pub use sample::{bilinear_sample, cubic_sample, nearest_sample};
