use crate::image::{
    gaussian_blur, gaussian_derivative_kernel, horizontal_filter, kernel_size,
    vertical_filter, GrayFloatImage,
};

/// The image axis a derivative is taken along.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DerivativeAxis {
    /// Along axis 0, i.e. down the rows (vertical change).
    Rows,
    /// Along axis 1, i.e. across the columns (horizontal change).
    Columns,
}

/// Shape preserving Gaussian smoothing used to build scale spaces and
/// gradient fields.
///
/// Implementations must be pure: the same input and sigma always produce the
/// same output. Callers validate that `sigma` is positive before calling.
pub trait ScaleSpaceFilter: Sync {
    /// Isotropic Gaussian blur.
    fn blur(&self, image: &GrayFloatImage, sigma: f64) -> GrayFloatImage;

    /// First order Gaussian derivative along a single axis.
    fn derivative(&self, image: &GrayFloatImage, sigma: f64, axis: DerivativeAxis)
        -> GrayFloatImage;
}

/// Separable Gaussian filtering with kernels truncated at
/// [`crate::image::KERNEL_TRUNCATE`] standard deviations.
///
/// Borders are extended by replicating the edge pixel. This differs from a
/// mirrored (`reflect`) extension, as used by `scipy.ndimage`, so pixels
/// within `4 * sigma` of a border can blur to slightly different values.
#[derive(Debug, Copy, Clone, Default)]
pub struct GaussianFilter;

impl ScaleSpaceFilter for GaussianFilter {
    fn blur(&self, image: &GrayFloatImage, sigma: f64) -> GrayFloatImage {
        gaussian_blur(image, sigma as f32)
    }

    fn derivative(
        &self,
        image: &GrayFloatImage,
        sigma: f64,
        axis: DerivativeAxis,
    ) -> GrayFloatImage {
        let sigma = sigma as f32;
        let size = kernel_size(sigma).expect("sigma must be positive, finite and representable");
        let kernel = gaussian_derivative_kernel(sigma, size);
        GrayFloatImage(match axis {
            DerivativeAxis::Rows => vertical_filter(image, &kernel),
            DerivativeAxis::Columns => horizontal_filter(image, &kernel),
        })
    }
}
