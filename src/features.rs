use crate::candidates::{ensure_interior, KeypointSet};
use crate::error::Result;
use crate::{Detector, GaussianFilter, GrayFloatImage, ScaleSpaceFilter};
use ::image::DynamicImage;
use log::*;
use std::collections::HashSet;
use std::hash::Hash;
use std::path::Path;

#[cfg(feature = "rayon")]
use rayon::join;

/// Elements present in all three sets.
///
/// The smallest set is walked and probed against the other two.
pub fn intersect<T: Eq + Hash + Clone>(
    a: &HashSet<T>,
    b: &HashSet<T>,
    c: &HashSet<T>,
) -> HashSet<T> {
    let mut sets = [a, b, c];
    sets.sort_by_key(|set| set.len());
    let [smallest, rest @ ..] = sets;
    smallest
        .iter()
        .filter(|item| rest.iter().all(|set| set.contains(*item)))
        .cloned()
        .collect()
}

/// Locate keypoints with the default configuration and Gaussian filter.
pub fn create_sift_features(image: &GrayFloatImage) -> Result<KeypointSet> {
    Detector::default().create_sift_features(image)
}

impl Detector {
    /// Locate keypoints using the built-in Gaussian filter.
    pub fn create_sift_features(&self, image: &GrayFloatImage) -> Result<KeypointSet> {
        self.create_sift_features_with(image, &GaussianFilter)
    }

    /// Locate keypoints using the given smoothing primitive.
    ///
    /// The Harris, scale space and contrast tests are independent of each
    /// other and run concurrently when the `rayon` feature is enabled. The
    /// result is the intersection of their candidate sets.
    ///
    /// # Arguments
    /// * `image` - The input image, at least 3x3.
    /// * `filter` - The Gaussian smoothing primitive.
    pub fn create_sift_features_with<F: ScaleSpaceFilter + ?Sized>(
        &self,
        image: &GrayFloatImage,
        filter: &F,
    ) -> Result<KeypointSet> {
        self.validate()?;
        ensure_interior(image.width(), image.height())?;
        trace!("Running Harris, scale space and contrast tests.");
        #[cfg(not(feature = "rayon"))]
        let (harris, (dog, contrast)) = (
            self.harris_candidates(image, filter),
            (
                self.detect_dog_keypoints(image, filter),
                self.filter_low_contrast(image),
            ),
        );
        #[cfg(feature = "rayon")]
        let (harris, (dog, contrast)) = join(
            || self.harris_candidates(image, filter),
            || {
                join(
                    || self.detect_dog_keypoints(image, filter),
                    || self.filter_low_contrast(image),
                )
            },
        );
        let (harris, dog, contrast) = (harris?, dog?, contrast?);
        debug!(
            "Candidates on a {}x{} image: harris={}, dog={}, contrast={}",
            image.width(),
            image.height(),
            harris.len(),
            dog.len(),
            contrast.len()
        );
        let keypoints = intersect(&harris, &dog, &contrast);
        info!("Extracted {} keypoints", keypoints.len());
        Ok(keypoints)
    }

    /// Convert an image to grayscale and locate its keypoints.
    ///
    /// # Example
    /// ```
    /// let image = image::DynamicImage::new_luma8(16, 16);
    /// let keypoints = sift_keypoints::Detector::default().extract(&image).unwrap();
    /// // a constant image has no contrast anywhere
    /// assert!(keypoints.is_empty());
    /// ```
    pub fn extract(&self, image: &DynamicImage) -> Result<KeypointSet> {
        self.create_sift_features(&GrayFloatImage::from_dynamic(image))
    }

    /// Load an image from disk and locate its keypoints.
    pub fn extract_path(&self, path: impl AsRef<Path>) -> Result<KeypointSet> {
        self.extract(&::image::open(path)?)
    }
}
