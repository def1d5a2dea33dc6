use crate::candidates::{collect_interior, ensure_interior, CandidateSet};
use crate::error::Result;
use crate::{Detector, GrayFloatImage};
use log::*;
use ndarray::s;

/// Keep interior pixels that stand out from their 3x3 neighborhood.
///
/// For every interior pixel the mean and population standard deviation of
/// the 3x3 window around it are computed in `f64`. Flat windows
/// (`std == 0`) are skipped. The pixel is kept when
/// `|(value - mean) / std| > threshold`.
///
/// # Arguments
/// * `image` - The input image.
/// * `threshold` - Minimum absolute z-score.
pub fn filter_low_contrast(image: &GrayFloatImage, threshold: f64) -> Result<CandidateSet> {
    let (width, height) = image.dimensions();
    ensure_interior(width, height)?;
    let pixels = image.ref_array2();
    let candidates = collect_interior(width, height, |x, y| {
        let window = pixels
            .slice(s![y - 1..=y + 1, x - 1..=x + 1])
            .mapv(f64::from);
        let std = window.std(0.0);
        if std == 0.0 {
            return false;
        }
        let mean = window.mean().unwrap_or_default();
        ((f64::from(pixels[[y, x]]) - mean) / std).abs() > threshold
    });
    debug!(
        "{} pixels deviate from their neighborhood by more than {} std.",
        candidates.len(),
        threshold
    );
    Ok(candidates)
}

impl Detector {
    /// Contrast filter with the configured `contrast_threshold`.
    pub fn filter_low_contrast(&self, image: &GrayFloatImage) -> Result<CandidateSet> {
        filter_low_contrast(image, self.contrast_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coordinate, Error};

    #[test]
    fn flat_windows_are_never_candidates() {
        let image = GrayFloatImage::from_fn(8, 8, |_, _| 0.7);
        assert!(filter_low_contrast(&image, 0.03).unwrap().is_empty());
        // a negative threshold would accept any z-score, the guard still applies
        assert!(filter_low_contrast(&image, -1.0).unwrap().is_empty());
    }

    #[test]
    fn deviating_centre_is_a_candidate() {
        let image =
            GrayFloatImage::from_fn(9, 9, |x, y| if (x, y) == (4, 4) { 1.0 } else { 0.2 });
        let candidates = filter_low_contrast(&image, 0.03).unwrap();
        assert!(candidates.contains(&Coordinate::new(4, 4)));
        // windows that do not reach the bright pixel are flat
        assert!(!candidates.contains(&Coordinate::new(1, 1)));
        assert!(!candidates.contains(&Coordinate::new(7, 4)));
    }

    #[test]
    fn threshold_is_strict() {
        // one bright pixel in an otherwise flat window has z = sqrt(8) ~ 2.83
        let image =
            GrayFloatImage::from_fn(3, 3, |x, y| if (x, y) == (1, 1) { 1.0 } else { 0.0 });
        assert_eq!(filter_low_contrast(&image, 2.8).unwrap().len(), 1);
        assert!(filter_low_contrast(&image, 2.9).unwrap().is_empty());
    }

    #[test]
    fn tiny_images_are_rejected() {
        let image = GrayFloatImage::new(3, 2);
        assert!(matches!(
            filter_low_contrast(&image, 0.03),
            Err(Error::ImageTooSmall { width: 3, height: 2 })
        ));
    }
}
