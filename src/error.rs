use thiserror::Error;

#[derive(Error, Debug)]
pub enum GaborError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Field dimensions must be non-zero, got {height}x{width}")]
    EmptyField { height: u32, width: u32 },

    #[error(
        "Dimension mismatch in {context}: expected {}x{}, found {}x{}",
        .expected.0, .expected.1, .found.0, .found.1
    )]
    DimensionMismatch {
        context: &'static str,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to allocate {samples} complex samples")]
    AllocationFailed { samples: usize },

    #[error("FFT plans have been released")]
    PlansReleased,

    #[error("Malformed channel dump: {0}")]
    DumpFormat(String),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, GaborError>;
