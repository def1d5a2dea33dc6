use thiserror::Error;

/// Everything that can go wrong while locating keypoints.
///
/// Degenerate windows (zero variance) are not errors, they are skipped.
#[derive(Debug, Error)]
pub enum Error {
    #[error("sigma must be positive, finite and fit a filter kernel, got {0}")]
    InvalidSigma(f64),
    #[error("at least one octave is required")]
    NoOctaves,
    #[error("a {width}x{height} image has no interior pixels, at least 3x3 is required")]
    ImageTooSmall { width: usize, height: usize },
    #[error("expected a {}x{} image, found {}x{}", .expected.0, .expected.1, .found.0, .found.1)]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("{len} pixels cannot fill a {width}x{height} image")]
    BufferSize {
        width: usize,
        height: usize,
        len: usize,
    },
    #[error("failed to load image: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Sigmas are applied in `f32`, so the narrowed value must still give a kernel.
pub(crate) fn ensure_sigma(sigma: f64) -> Result<()> {
    if sigma.is_finite() && sigma > 0.0 && crate::image::kernel_size(sigma as f32).is_some() {
        Ok(())
    } else {
        Err(Error::InvalidSigma(sigma))
    }
}
