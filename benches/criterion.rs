use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use sift_keypoints::{
    compute_harris_score, DerivativeAxis, Detector, GaussianFilter, GrayFloatImage,
    ScaleSpaceFilter,
};

fn load_image() -> GrayFloatImage {
    let mut rng = Pcg64::seed_from_u64(0);
    GrayFloatImage::from_fn(320, 240, |_, _| rng.gen())
}

fn extract(c: &mut Criterion) {
    let image = load_image();
    let detector = Detector::default();
    c.bench_function("create_sift_features", |b| {
        b.iter(|| detector.create_sift_features(&image).unwrap())
    });
    c.bench_function("detect_dog_keypoints", |b| {
        b.iter(|| detector.detect_dog_keypoints(&image, &GaussianFilter).unwrap())
    });
    c.bench_function("filter_low_contrast", |b| {
        b.iter(|| detector.filter_low_contrast(&image).unwrap())
    });
}

criterion_group!(
    name = pipeline;
    config = Criterion::default().sample_size(10);
    targets = extract
);

/// The sigmas of the default five octaves.
const OCTAVE_SIGMAS: [f64; 5] = [1.6, 2.262_741_7, 3.2, 4.525_483_4, 6.4];

fn bench_blur(c: &mut Criterion) {
    let image = load_image();
    let mut group = c.benchmark_group("gaussian_blur");
    for sigma in OCTAVE_SIGMAS {
        group.bench_with_input(BenchmarkId::from_parameter(sigma), &sigma, |b, &sigma| {
            b.iter(|| GaussianFilter.blur(&image, sigma))
        });
    }
    group.finish();
}

fn bench_derivative(c: &mut Criterion) {
    let image = load_image();
    let mut group = c.benchmark_group("gaussian_derivative");
    for axis in [DerivativeAxis::Rows, DerivativeAxis::Columns] {
        group.bench_with_input(BenchmarkId::new(format!("{:?}", axis), 1.6), &axis, |b, &axis| {
            b.iter(|| GaussianFilter.derivative(&image, 1.6, axis))
        });
    }
    group.finish();
    c.bench_function("compute_harris_score", |b| {
        b.iter(|| compute_harris_score(&image, &GaussianFilter, 1.6).unwrap())
    });
}

criterion_group!(
    name = filters;
    config = Criterion::default().sample_size(10);
    targets = bench_blur, bench_derivative
);

criterion_main!(pipeline, filters);
