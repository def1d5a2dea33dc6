//! Keypoint localization in the spirit of SIFT.
//!
//! Three independent per-pixel tests are run on the same grayscale image:
//!
//! * extrema of a stack of increasingly blurred copies of the image,
//! * the Harris corner response,
//! * the z-score of a pixel inside its 3x3 neighborhood.
//!
//! A pixel is a keypoint when all three agree. Only interior pixels (one
//! pixel away from every border) are ever reported.
//!
//! ```
//! use sift_keypoints::{Detector, GrayFloatImage};
//!
//! let image = GrayFloatImage::from_fn(32, 32, |x, y| ((x * y) % 7) as f32 / 7.0);
//! let keypoints = Detector::default().create_sift_features(&image).unwrap();
//! assert!(keypoints.iter().all(|c| c.x >= 1 && c.x <= 30 && c.y >= 1 && c.y <= 30));
//! ```

mod candidates;
mod contrast;
mod dog;
mod error;
mod features;
mod filter;
mod harris;
pub mod image;
mod octaves;

pub use crate::candidates::{CandidateSet, Coordinate, KeypointSet};
pub use crate::contrast::filter_low_contrast;
pub use crate::dog::detect_dog_keypoints;
pub use crate::error::{Error, Result};
pub use crate::features::{create_sift_features, intersect};
pub use crate::filter::{DerivativeAxis, GaussianFilter, ScaleSpaceFilter};
pub use crate::harris::{compute_harris_score, filter_harris_points, HarrisSense};
pub use crate::image::GrayFloatImage;
pub use crate::octaves::{build_octaves, Octave, ScaleSpaceMode};

/// Contains the configuration parameters of the detector.
///
/// The defaults reproduce the reference behaviour. [`Detector::new`] can be
/// used to change the Harris threshold and keep everything else.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Detector {
    /// Sigma of the least blurred octave
    pub base_sigma: f64,

    /// Number of octaves in the scale space, each `sqrt(2)` blurrier than the last
    pub octave_count: usize,

    /// How octaves are derived from the image
    pub scale_space: ScaleSpaceMode,

    /// Sigma used for both the derivatives and the second moment smoothing
    pub harris_sigma: f64,

    /// Harris response threshold
    pub harris_threshold: f64,

    /// Which side of `harris_threshold` is kept
    pub harris_sense: HarrisSense,

    /// Minimum absolute z-score of a pixel inside its 3x3 window
    pub contrast_threshold: f64,
}

impl Detector {
    /// This convenience constructor is provided for the common case
    /// that only the Harris threshold needs to be modified.
    pub fn new(harris_threshold: f64) -> Self {
        Self {
            harris_threshold,
            ..Default::default()
        }
    }

    /// Check every parameter that does not depend on the image.
    pub fn validate(&self) -> Result<()> {
        error::ensure_sigma(self.base_sigma)?;
        error::ensure_sigma(self.harris_sigma)?;
        if self.octave_count == 0 {
            return Err(Error::NoOctaves);
        }
        error::ensure_sigma(octaves::largest_sigma(self.base_sigma, self.octave_count))
    }
}

impl Default for Detector {
    fn default() -> Detector {
        Detector {
            base_sigma: 1.6f64,
            octave_count: 5,
            scale_space: ScaleSpaceMode::FixedOrigin,
            harris_sigma: 1.6f64,
            harris_threshold: 10.0f64,
            harris_sense: HarrisSense::Below,
            contrast_threshold: 0.03f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let detector = Detector::default();
        assert_eq!(detector.base_sigma, 1.6);
        assert_eq!(detector.octave_count, 5);
        assert_eq!(detector.harris_sigma, 1.6);
        assert_eq!(detector.harris_threshold, 10.0);
        assert_eq!(detector.contrast_threshold, 0.03);
        assert_eq!(detector.harris_sense, HarrisSense::Below);
        assert_eq!(detector.scale_space, ScaleSpaceMode::FixedOrigin);
        assert!(detector.validate().is_ok());
    }

    #[test]
    fn new_only_changes_the_threshold() {
        let detector = Detector::new(-1.0);
        assert_eq!(detector.harris_threshold, -1.0);
        assert_eq!(detector.octave_count, 5);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let zero_sigma = Detector {
            base_sigma: 0.0,
            ..Default::default()
        };
        assert!(matches!(zero_sigma.validate(), Err(Error::InvalidSigma(_))));
        let nan_sigma = Detector {
            harris_sigma: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(nan_sigma.validate(), Err(Error::InvalidSigma(_))));
        let no_octaves = Detector {
            octave_count: 0,
            ..Default::default()
        };
        assert!(matches!(no_octaves.validate(), Err(Error::NoOctaves)));
    }

    #[test]
    fn sigmas_must_survive_f32() {
        let tiny = Detector {
            base_sigma: 1e-50,
            ..Default::default()
        };
        assert!(matches!(tiny.validate(), Err(Error::InvalidSigma(_))));
        let huge = Detector {
            harris_sigma: 1e39,
            ..Default::default()
        };
        assert!(matches!(huge.validate(), Err(Error::InvalidSigma(_))));
    }

    #[test]
    fn octave_count_is_bounded_by_the_last_sigma() {
        let deep = Detector {
            octave_count: 20,
            ..Default::default()
        };
        assert!(deep.validate().is_ok());
        for octave_count in [200, 10_000, usize::MAX] {
            let detector = Detector {
                octave_count,
                ..Default::default()
            };
            assert!(matches!(detector.validate(), Err(Error::InvalidSigma(_))));
        }
    }
}
