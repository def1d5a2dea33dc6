use crate::candidates::{collect_interior, ensure_interior, CandidateSet};
use crate::error::{ensure_sigma, Result};
use crate::{DerivativeAxis, Detector, GrayFloatImage, ScaleSpaceFilter};
use log::*;
use ndarray::azip;

#[cfg(feature = "rayon")]
use rayon::join;

/// Which Harris responses survive the threshold.
///
/// `Below` is the reference behaviour. Because the response used here,
/// `det(M) - trace(M)^2`, is never positive, `Below` with a positive
/// threshold keeps every interior pixel. `Above` is the usual corner sense.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HarrisSense {
    /// Keep responses strictly below the threshold.
    #[default]
    Below,
    /// Keep responses strictly above the threshold.
    Above,
}

impl HarrisSense {
    fn keeps(self, response: f32, threshold: f32) -> bool {
        match self {
            HarrisSense::Below => response < threshold,
            HarrisSense::Above => response > threshold,
        }
    }
}

fn product(lhs: &GrayFloatImage, rhs: &GrayFloatImage) -> GrayFloatImage {
    let mut result = lhs.zero_array();
    azip!((
        out in &mut result,
        &a in lhs.ref_array2(),
        &b in rhs.ref_array2(),
    ) {
        *out = a * b;
    });
    GrayFloatImage::from_array2(result)
}

/// Compute the Harris response of every pixel.
///
/// The second moment matrix `M = [Ixx Ixy; Ixy Iyy]` is built from Gaussian
/// derivatives smoothed again at `sigma`, and the response is
/// `det(M) - trace(M)^2`.
///
/// # Arguments
/// * `image` - The input image.
/// * `filter` - The Gaussian smoothing primitive.
/// * `sigma` - Scale of the derivatives and of the smoothing.
/// # Return value
/// A response field with the same shape as `image`.
#[allow(non_snake_case)]
pub fn compute_harris_score<F: ScaleSpaceFilter + ?Sized>(
    image: &GrayFloatImage,
    filter: &F,
    sigma: f64,
) -> Result<GrayFloatImage> {
    ensure_sigma(sigma)?;
    #[cfg(not(feature = "rayon"))]
    let (Ix, Iy) = (
        filter.derivative(image, sigma, DerivativeAxis::Rows),
        filter.derivative(image, sigma, DerivativeAxis::Columns),
    );
    #[cfg(feature = "rayon")]
    let (Ix, Iy) = join(
        || filter.derivative(image, sigma, DerivativeAxis::Rows),
        || filter.derivative(image, sigma, DerivativeAxis::Columns),
    );
    trace!("Computing derivatives done.");
    let smooth = |a: &GrayFloatImage, b: &GrayFloatImage| filter.blur(&product(a, b), sigma);
    #[cfg(not(feature = "rayon"))]
    let (Ixx, (Iyy, Ixy)) = (smooth(&Ix, &Ix), (smooth(&Iy, &Iy), smooth(&Ix, &Iy)));
    #[cfg(feature = "rayon")]
    let (Ixx, (Iyy, Ixy)) = join(
        || smooth(&Ix, &Ix),
        || join(|| smooth(&Iy, &Iy), || smooth(&Ix, &Iy)),
    );
    trace!("Second moment matrix done.");
    let mut response = image.zero_array();
    azip!((
        r in &mut response,
        &xx in Ixx.ref_array2(),
        &yy in Iyy.ref_array2(),
        &xy in Ixy.ref_array2(),
    ) {
        let det = xx * yy - xy * xy;
        let trace = xx + yy;
        *r = det - trace * trace;
    });
    Ok(GrayFloatImage::from_array2(response))
}

/// Threshold a Harris response field.
///
/// # Arguments
/// * `response` - Output of [`compute_harris_score`].
/// * `threshold` - The response threshold.
/// * `sense` - Which side of the threshold to keep.
pub fn filter_harris_points(
    response: &GrayFloatImage,
    threshold: f64,
    sense: HarrisSense,
) -> Result<CandidateSet> {
    let (width, height) = response.dimensions();
    ensure_interior(width, height)?;
    let threshold = threshold as f32;
    let field = response.ref_array2();
    let candidates = collect_interior(width, height, |x, y| {
        sense.keeps(field[[y, x]], threshold)
    });
    debug!(
        "{} pixels have a Harris response {:?} {}.",
        candidates.len(),
        sense,
        threshold
    );
    Ok(candidates)
}

impl Detector {
    /// Harris response at the configured `harris_sigma`.
    pub fn compute_harris_score<F: ScaleSpaceFilter + ?Sized>(
        &self,
        image: &GrayFloatImage,
        filter: &F,
    ) -> Result<GrayFloatImage> {
        compute_harris_score(image, filter, self.harris_sigma)
    }

    /// Threshold a response field with the configured threshold and sense.
    pub fn filter_harris_points(&self, response: &GrayFloatImage) -> Result<CandidateSet> {
        filter_harris_points(response, self.harris_threshold, self.harris_sense)
    }

    /// Score `image` and threshold the response in one go.
    pub fn harris_candidates<F: ScaleSpaceFilter + ?Sized>(
        &self,
        image: &GrayFloatImage,
        filter: &F,
    ) -> Result<CandidateSet> {
        ensure_interior(image.width(), image.height())?;
        let response = self.compute_harris_score(image, filter)?;
        self.filter_harris_points(&response)
    }
}
