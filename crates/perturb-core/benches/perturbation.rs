//! Benchmarks for corruption operators

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Luma, Rgb, RgbImage};
use perturb_core::field::plasma_fractal;
use perturb_core::{Corruption, DepthMap, Frame, PerturbConfig, Perturber, Severity};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn create_test_image(size: u32) -> RgbImage {
    let mut img = RgbImage::new(size, size);

    // Checkerboard with a colour ramp so blurs and edges have work to do
    for y in 0..size {
        for x in 0..size {
            let value = if ((x / 10) + (y / 10)) % 2 == 0 { 30 } else { 220 };
            img.put_pixel(x, y, Rgb([value, (x % 256) as u8, (y % 256) as u8]));
        }
    }

    img
}

fn create_test_depth(size: u32) -> DepthMap {
    DepthMap::from_fn(size, size, |x, y| Luma([4000 + ((x * 7 + y * 3) % 20000) as u16]))
}

fn benchmark_fractal(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);

    c.bench_function("plasma_fractal_256", |b| {
        b.iter(|| plasma_fractal(black_box(256), 2.0, &mut rng))
    });
}

fn benchmark_rgb(c: &mut Criterion) {
    let perturber = Perturber::new();
    let frame = Frame::Rgb(create_test_image(128));
    let severity = Severity::new(3).unwrap();
    let mut rng = StdRng::seed_from_u64(0);

    for corruption in [
        Corruption::GaussianNoise,
        Corruption::GaussianBlur,
        Corruption::GlassBlur,
        Corruption::DefocusBlur,
        Corruption::MotionBlur,
        Corruption::ZoomBlur,
        Corruption::Snow,
        Corruption::Spatter,
        Corruption::JpegCompression,
    ] {
        c.bench_function(&format!("{}_128x128", corruption), |b| {
            b.iter(|| perturber.apply_corruption(corruption, black_box(&frame), severity, &mut rng))
        });
    }
}

fn benchmark_depth(c: &mut Criterion) {
    let perturber = Perturber::new();
    let frame = Frame::Depth(create_test_depth(320));
    let severity = Severity::new(3).unwrap();
    let mut rng = StdRng::seed_from_u64(0);

    c.bench_function("depth_add_edge_erosion_320x320", |b| {
        b.iter(|| perturber.apply_corruption(Corruption::DepthAddEdgeErosion, black_box(&frame), severity, &mut rng))
    });

    c.bench_function("depth_add_random_mask_320x320", |b| {
        b.iter(|| perturber.apply_corruption(Corruption::DepthAddRandomMask, black_box(&frame), severity, &mut rng))
    });
}

fn benchmark_batch(c: &mut Criterion) {
    let frames: Vec<Frame> = (0..16).map(|_| Frame::Rgb(create_test_image(96))).collect();

    for parallel in [false, true] {
        let perturber = Perturber::with_config(PerturbConfig { parallel, ..PerturbConfig::default() }).unwrap();
        c.bench_function(&format!("batch16_gaussian_blur_parallel_{}", parallel), |b| {
            b.iter(|| perturber.apply_batch(black_box(&frames), "gaussian_blur", 3))
        });
    }
}

criterion_group!(benches, benchmark_fractal, benchmark_rgb, benchmark_depth, benchmark_batch);
criterion_main!(benches);
