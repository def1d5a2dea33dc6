use crate::error::{Error, Result};
use derive_more::Deref;
use image::{DynamicImage, GenericImageView, ImageBuffer, Luma, Pixel};
use log::*;
use ndarray::{Array2, ArrayView2};
use wide::f32x4;

type GrayImageBuffer = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Kernels are truncated at this many standard deviations.
pub const KERNEL_TRUNCATE: f32 = 4.0;

/// Single channel float image every stage of the pipeline reads from.
///
/// Pixels are stored row-major in an `image` buffer so loading and saving
/// stay with the `image` crate, while the numeric stages borrow the same
/// memory as an `ndarray` view indexed `[[row, column]]`.
#[derive(Debug, Clone, PartialEq, Deref)]
pub struct GrayFloatImage(pub GrayImageBuffer);

impl GrayFloatImage {
    /// Create a unit float image from the image crate's DynamicImage type.
    ///
    /// # Arguments
    /// * `input_image` - the input image.
    /// # Return value
    /// An image with pixel values between 0 and 1.
    pub fn from_dynamic(input_image: &DynamicImage) -> Self {
        let (width, height) = (input_image.width(), input_image.height());
        Self(match input_image {
            DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_) => {
                info!("Loaded a {} x {} 16-bit image", width, height);
                let gray = input_image.to_luma16();
                ImageBuffer::from_fn(width, height, |x, y| {
                    Luma([f32::from(gray[(x, y)][0]) / 65535f32])
                })
            }
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                info!("Loaded a {} x {} 32-bit float image", width, height);
                let rgba = input_image.to_rgba32f();
                ImageBuffer::from_fn(width, height, |x, y| Luma([rgba[(x, y)].to_luma()[0]]))
            }
            _ => {
                info!("Loaded a {} x {} 8-bit image", width, height);
                let gray = input_image.to_luma8();
                ImageBuffer::from_fn(width, height, |x, y| {
                    Luma([f32::from(gray[(x, y)][0]) / 255f32])
                })
            }
        })
    }

    /// Wrap a row-major buffer of `width * height` intensities.
    pub fn from_vec(width: usize, height: usize, pixels: Vec<f32>) -> Result<Self> {
        let len = pixels.len();
        if width.checked_mul(height) != Some(len) {
            return Err(Error::BufferSize { width, height, len });
        }
        ImageBuffer::from_raw(width as u32, height as u32, pixels)
            .map(Self)
            .ok_or(Error::BufferSize { width, height, len })
    }

    /// Build an image by evaluating `f(x, y)` at every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        Self(ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
            Luma([f(x as usize, y as usize)])
        }))
    }

    pub fn from_array2(arr: Array2<f32>) -> Self {
        let (height, width) = arr.dim();
        let pixels = if arr.is_standard_layout() {
            arr.into_raw_vec()
        } else {
            arr.iter().copied().collect()
        };
        Self(
            ImageBuffer::from_raw(width as u32, height as u32, pixels)
                .expect("array dimensions always match its element count"),
        )
    }

    /// Borrow the pixels as a `(height, width)` array.
    pub fn ref_array2(&self) -> ArrayView2<f32> {
        ArrayView2::from_shape((self.height(), self.width()), self.0.as_raw().as_slice())
            .expect("image buffer always holds width * height pixels")
    }

    pub fn zero_array(&self) -> Array2<f32> {
        Array2::zeros((self.height(), self.width()))
    }

    pub fn width(&self) -> usize {
        self.0.width() as usize
    }

    pub fn height(&self) -> usize {
        self.0.height() as usize
    }

    /// `(width, height)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    pub fn new(width: usize, height: usize) -> Self {
        Self(ImageBuffer::from_pixel(
            width as u32,
            height as u32,
            Luma([0.0]),
        ))
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.get_pixel(x as u32, y as u32)[0]
    }
}

/// A correlation kernel split into `f32x4` lanes, zero padded at the end.
struct SimdKernel {
    lanes: Vec<f32x4>,
    half_size: usize,
    padding: usize,
}

impl SimdKernel {
    fn new(kernel: &[f32]) -> Self {
        debug_assert!(kernel.len() % 2 == 1);
        let lanes = kernel
            .chunks(4)
            .map(|chunk| {
                let mut data = [0.0; 4];
                data[..chunk.len()].copy_from_slice(chunk);
                f32x4::new(data)
            })
            .collect::<Vec<_>>();
        let padding = lanes.len() * 4 - kernel.len();
        Self {
            lanes,
            half_size: kernel.len() / 2,
            padding,
        }
    }

    /// Length of the scratch line needed to filter `len` samples.
    fn scratch_len(&self, len: usize) -> usize {
        len + 2 * self.half_size + self.padding
    }

    /// Copy `line` into `scratch` with replicated borders.
    fn pad_into(&self, scratch: &mut [f32], line: impl ExactSizeIterator<Item = f32> + Clone) {
        let len = line.len();
        let first = line.clone().next().unwrap_or(0.0);
        let last = line.clone().last().unwrap_or(0.0);
        let (head, rest) = scratch.split_at_mut(self.half_size);
        head.fill(first);
        for (dst, src) in rest.iter_mut().zip(line) {
            *dst = src;
        }
        rest[len..len + self.half_size].fill(last);
        rest[len + self.half_size..].fill(0.0);
    }

    /// Correlate a padded scratch line, calling `out(i, value)` per sample.
    fn apply(&self, scratch: &[f32], mut out: impl FnMut(usize, f32)) {
        scratch
            .windows(self.lanes.len() * 4)
            .take(scratch.len() - self.padding - 2 * self.half_size)
            .enumerate()
            .for_each(|(i, window)| {
                let value = window
                    .chunks_exact(4)
                    .map(|c| f32x4::new([c[0], c[1], c[2], c[3]]))
                    .zip(self.lanes.iter())
                    .fold(f32x4::splat(0.), |acc, (a, b)| a.mul_add(*b, acc))
                    .reduce_add();
                out(i, value);
            });
    }
}

/// Correlate every row with `kernel`, replicating edge pixels.
pub fn horizontal_filter(image: &GrayImageBuffer, kernel: &[f32]) -> GrayImageBuffer {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let mut output = vec![0.0; width * height];
    if width == 0 {
        return GrayImageBuffer::from_raw(image.width(), image.height(), output).unwrap();
    }
    let kernel = SimdKernel::new(kernel);
    let mut scratch = vec![0f32; kernel.scratch_len(width)];
    for (row_in, row_out) in image
        .as_raw()
        .chunks_exact(width)
        .zip(output.chunks_exact_mut(width))
    {
        kernel.pad_into(&mut scratch, row_in.iter().copied());
        kernel.apply(&scratch, |x, value| row_out[x] = value);
    }
    GrayImageBuffer::from_raw(image.width(), image.height(), output).unwrap()
}

/// Correlate every column with `kernel`, replicating edge pixels.
pub fn vertical_filter(image: &GrayImageBuffer, kernel: &[f32]) -> GrayImageBuffer {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let mut output = vec![0.0; width * height];
    if height == 0 {
        return GrayImageBuffer::from_raw(image.width(), image.height(), output).unwrap();
    }
    let kernel = SimdKernel::new(kernel);
    let mut scratch = vec![0f32; kernel.scratch_len(height)];
    let input = image.as_raw();
    for x in 0..width {
        kernel.pad_into(&mut scratch, input[x..].iter().step_by(width).copied());
        kernel.apply(&scratch, |y, value| output[y * width + x] = value);
    }
    GrayImageBuffer::from_raw(image.width(), image.height(), output).unwrap()
}

pub fn separable_filter(
    image: &GrayImageBuffer,
    h_kernel: &[f32],
    v_kernel: &[f32],
) -> GrayImageBuffer {
    let h = horizontal_filter(image, h_kernel);
    vertical_filter(&h, v_kernel)
}

/// Number of taps of a Gaussian kernel with standard deviation `sigma`.
///
/// `None` unless `sigma` is positive and finite and the kernel radius fits
/// in an `i32`.
pub fn kernel_size(sigma: f32) -> Option<usize> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return None;
    }
    let radius = (KERNEL_TRUNCATE * sigma + 0.5) as usize;
    if radius > i32::MAX as usize {
        return None;
    }
    radius.checked_mul(2)?.checked_add(1)
}

/// Unnormalized Gaussian samples for offsets `-radius..=radius`.
fn gaussian_samples(sigma: f32, radius: usize) -> impl Iterator<Item = (f32, f32)> {
    let radius = radius as i32;
    (-radius..=radius).map(move |i| {
        let x = i as f32;
        (x, (-x * x / (2.0 * sigma * sigma)).exp())
    })
}

/// Generate a normalized Gaussian kernel.
///
/// # Arguments
/// * `sigma` - standard deviation.
/// * `kernel_size` - The size of the kernel, must be odd.
/// # Return value
/// The kernel (a vector).
pub fn gaussian_kernel(sigma: f32, kernel_size: usize) -> Vec<f32> {
    assert!(kernel_size % 2 == 1, "kernel_size must be odd");
    let mut kernel: Vec<f32> = gaussian_samples(sigma, kernel_size / 2)
        .map(|(_, g)| g)
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|val| *val /= sum);
    kernel
}

/// Generate a first-order Gaussian derivative kernel for correlation.
///
/// The taps are `x / sigma^2 * g(x)` with `g` the normalized Gaussian, so an
/// increasing signal produces a positive response.
pub fn gaussian_derivative_kernel(sigma: f32, kernel_size: usize) -> Vec<f32> {
    assert!(kernel_size % 2 == 1, "kernel_size must be odd");
    let samples: Vec<(f32, f32)> = gaussian_samples(sigma, kernel_size / 2).collect();
    let sum: f32 = samples.iter().map(|&(_, g)| g).sum();
    samples
        .into_iter()
        .map(|(x, g)| x / (sigma * sigma) * g / sum)
        .collect()
}

/// Perform an isotropic Gaussian blur on an image.
///
/// # Arguments
/// * `sigma` - standard deviation, see [`kernel_size`] for the accepted range.
/// # Return value
/// The resulting image after the filter was applied.
pub fn gaussian_blur(image: &GrayFloatImage, sigma: f32) -> GrayFloatImage {
    let size = kernel_size(sigma).expect("sigma must be positive, finite and representable");
    let kernel = gaussian_kernel(sigma, size);
    GrayFloatImage(separable_filter(image, &kernel, &kernel))
}
