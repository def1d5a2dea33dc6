use crate::candidates::{collect_interior, ensure_interior, CandidateSet};
use crate::error::{Error, Result};
use crate::octaves::Octave;
use crate::{Detector, GrayFloatImage, ScaleSpaceFilter};
use log::*;
use ndarray::{s, ArrayView2};

/// Find scale space extrema in a stack of octaves.
///
/// A pixel is kept when its value in the middle octave is at least the
/// maximum, or at most the minimum, of its 3x3 neighborhood taken across
/// every octave. Ties count as extrema.
///
/// # Arguments
/// * `octaves` - Octaves of equal size, ordered by increasing sigma.
/// # Return value
/// The interior coordinates passing the test.
pub fn detect_dog_keypoints(octaves: &[Octave]) -> Result<CandidateSet> {
    let first = octaves.first().ok_or(Error::NoOctaves)?;
    let (width, height) = first.image.dimensions();
    ensure_interior(width, height)?;
    if let Some(mismatch) = octaves
        .iter()
        .find(|octave| octave.image.dimensions() != (width, height))
    {
        return Err(Error::ShapeMismatch {
            expected: (width, height),
            found: mismatch.image.dimensions(),
        });
    }
    let stack: Vec<ArrayView2<f32>> = octaves.iter().map(|o| o.image.ref_array2()).collect();
    let middle = &stack[stack.len() / 2];
    let candidates = collect_interior(width, height, |x, y| {
        let value = middle[[y, x]];
        let (min, max) = stack
            .iter()
            .flat_map(|level| level.slice(s![y - 1..=y + 1, x - 1..=x + 1]).into_iter())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &v| {
                (min.min(v), max.max(v))
            });
        value >= max || value <= min
    });
    debug!(
        "Found {} scale space extrema across {} octaves.",
        candidates.len(),
        octaves.len()
    );
    Ok(candidates)
}

impl Detector {
    /// Build the configured scale space for `image` and search it for extrema.
    pub fn detect_dog_keypoints<F: ScaleSpaceFilter + ?Sized>(
        &self,
        image: &GrayFloatImage,
        filter: &F,
    ) -> Result<CandidateSet> {
        ensure_interior(image.width(), image.height())?;
        let octaves = self.build_octaves(image, filter)?;
        trace!("Scale space finished.");
        detect_dog_keypoints(&octaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coordinate, GaussianFilter};

    /// Leaves the image untouched at every scale.
    struct Identity;

    impl ScaleSpaceFilter for Identity {
        fn blur(&self, image: &GrayFloatImage, _sigma: f64) -> GrayFloatImage {
            image.clone()
        }

        fn derivative(
            &self,
            image: &GrayFloatImage,
            _sigma: f64,
            _axis: crate::DerivativeAxis,
        ) -> GrayFloatImage {
            GrayFloatImage::new(image.width(), image.height())
        }
    }

    fn octave(sigma: f64, image: GrayFloatImage) -> Octave {
        Octave { sigma, image }
    }

    #[test]
    fn lone_bright_point_is_an_extremum() {
        let image = GrayFloatImage::from_fn(9, 9, |x, y| if (x, y) == (4, 5) { 1.0 } else { 0.0 });
        let candidates = Detector::default()
            .detect_dog_keypoints(&image, &Identity)
            .unwrap();
        assert!(candidates.contains(&Coordinate::new(4, 5)));
    }

    #[test]
    fn middle_octave_must_be_the_extreme_value() {
        // centre is brightest in the middle octave but the first octave is brighter
        // around it, and the last octave is darker, so the centre is neither.
        let level = |around: f32, centre: f32| {
            GrayFloatImage::from_fn(3, 3, move |x, y| if (x, y) == (1, 1) { centre } else { around })
        };
        let octaves = vec![
            octave(1.0, level(0.9, 0.9)),
            octave(2.0, level(0.5, 0.6)),
            octave(3.0, level(0.1, 0.1)),
        ];
        assert!(detect_dog_keypoints(&octaves).unwrap().is_empty());

        let octaves = vec![
            octave(1.0, level(0.4, 0.4)),
            octave(2.0, level(0.5, 0.6)),
            octave(3.0, level(0.1, 0.1)),
        ];
        let candidates = detect_dog_keypoints(&octaves).unwrap();
        assert_eq!(candidates.into_iter().collect::<Vec<_>>(), vec![Coordinate::new(1, 1)]);
    }

    #[test]
    fn flat_image_is_all_ties() {
        let image = GrayFloatImage::new(6, 5);
        let candidates = Detector::default()
            .detect_dog_keypoints(&image, &GaussianFilter)
            .unwrap();
        assert_eq!(candidates.len(), 4 * 3);
    }

    #[test]
    fn mismatched_octaves_are_rejected() {
        let octaves = vec![
            octave(1.0, GrayFloatImage::new(5, 5)),
            octave(2.0, GrayFloatImage::new(5, 4)),
        ];
        assert!(matches!(
            detect_dog_keypoints(&octaves),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(detect_dog_keypoints(&[]), Err(Error::NoOctaves)));
    }

    #[test]
    fn tiny_images_are_rejected() {
        let image = GrayFloatImage::new(2, 8);
        assert!(matches!(
            Detector::default().detect_dog_keypoints(&image, &GaussianFilter),
            Err(Error::ImageTooSmall { width: 2, height: 8 })
        ));
    }
}
