pub mod contours;
pub mod convolve;
pub mod histogram;
pub mod morph;
pub mod rasterize;

pub use contours::*;
pub use convolve::*;
pub use histogram::*;
pub use morph::*;
pub use rasterize::*;

pub type Result<T> = std::result::Result<T, ImgprocError>;

#[derive(Debug, thiserror::Error)]
pub enum ImgprocError {
    #[error("Algorithm error: {0}")]
    AlgorithmError(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),
}

impl From<ImgprocError> for mpase_core::Error {
    fn from(err: ImgprocError) -> Self {
        mpase_core::Error::invalid_input(err.to_string())
    }
}

pub fn validate_image_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ImgprocError::DimensionMismatch(
            "Image dimensions must be non-zero".into(),
        ));
    }
    Ok(())
}
