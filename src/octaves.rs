use crate::error::{ensure_sigma, Error, Result};
use crate::{Detector, GrayFloatImage, ScaleSpaceFilter};
use log::*;
use std::f64::consts::SQRT_2;

/// How each octave of the scale space is produced.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScaleSpaceMode {
    /// Every octave blurs the input image directly with its own sigma.
    #[default]
    FixedOrigin,
    /// Every octave blurs the previous one with the incremental sigma
    /// `sqrt(sigma_i^2 - sigma_{i-1}^2)`.
    Cascading,
}

/// One level of the scale space.
#[derive(Debug, Clone)]
pub struct Octave {
    /// Total blur of this level relative to the input image
    pub sigma: f64,
    /// The blurred image
    pub image: GrayFloatImage,
}

/// Sigma of the last of `count` octaves starting at `base_sigma`.
pub(crate) fn largest_sigma(base_sigma: f64, count: usize) -> f64 {
    base_sigma * SQRT_2.powf(count.saturating_sub(1) as f64)
}

/// Blur `image` at `count` scales starting at `base_sigma`, each scale
/// `sqrt(2)` larger than the previous one.
///
/// # Arguments
/// * `image` - The input image.
/// * `filter` - The Gaussian smoothing primitive.
/// * `base_sigma` - Sigma of the first octave.
/// * `count` - Number of octaves.
/// * `mode` - Whether octaves blur the input or the previous octave.
/// # Return value
/// The octaves ordered by increasing sigma.
pub fn build_octaves<F: ScaleSpaceFilter + ?Sized>(
    image: &GrayFloatImage,
    filter: &F,
    base_sigma: f64,
    count: usize,
    mode: ScaleSpaceMode,
) -> Result<Vec<Octave>> {
    ensure_sigma(base_sigma)?;
    if count == 0 {
        return Err(Error::NoOctaves);
    }
    ensure_sigma(largest_sigma(base_sigma, count))?;
    let mut octaves: Vec<Octave> = Vec::with_capacity(count);
    let mut sigma = base_sigma;
    for i in 0..count {
        trace!("Creating octave {} with sigma={}.", i, sigma);
        let blurred = match (mode, octaves.last()) {
            (ScaleSpaceMode::Cascading, Some(previous)) => {
                let increment = (sigma * sigma - previous.sigma * previous.sigma).sqrt();
                filter.blur(&previous.image, increment)
            }
            _ => filter.blur(image, sigma),
        };
        octaves.push(Octave {
            sigma,
            image: blurred,
        });
        sigma *= SQRT_2;
    }
    debug!("Built {} octaves up to sigma={}.", count, sigma / SQRT_2);
    Ok(octaves)
}

impl Detector {
    /// Build the scale space with the configured sigma, count and mode.
    pub fn build_octaves<F: ScaleSpaceFilter + ?Sized>(
        &self,
        image: &GrayFloatImage,
        filter: &F,
    ) -> Result<Vec<Octave>> {
        build_octaves(
            image,
            filter,
            self.base_sigma,
            self.octave_count,
            self.scale_space,
        )
    }
}
