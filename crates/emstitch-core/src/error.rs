use thiserror::Error;

#[derive(Error, Debug)]
pub enum StitchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    Image(#[from] ::image::ImageError),

    #[error("Shape mismatch: {a_height}x{a_width} vs {b_height}x{b_width}")]
    ShapeMismatch {
        a_height: usize,
        a_width: usize,
        b_height: usize,
        b_width: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid stos file: {0}")]
    InvalidStos(String),

    #[error("Invalid mosaic file: {0}")]
    InvalidMosaic(String),

    #[error("Empty tile set")]
    EmptyTileSet,
}

pub type Result<T> = std::result::Result<T, StitchError>;
