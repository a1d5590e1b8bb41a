//! Integration tests for the corruption engine

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{Luma, Rgb, Rgb32FImage, RgbImage};
use perturb_core::field::plasma_fractal;
use perturb_core::resample::clipped_zoom;
use perturb_core::{
    color, Corruption, DepthMap, DirectionalBlur, Frame, FrameKind, FrostTextures, PerturbError, Perturber,
    Severity,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Helper to create a textured RGB scene
fn create_scene(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let checker = if (x / 6 + y / 6) % 2 == 0 { 40 } else { 200 };
        Rgb([checker, (x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8])
    })
}

/// Helper to create a depth map with a raised box in the middle
fn create_depth(width: u32, height: u32) -> DepthMap {
    DepthMap::from_fn(width, height, |x, y| {
        let inside = x > width / 4 && x < 3 * width / 4 && y > height / 4 && y < 3 * height / 4;
        Luma([if inside { 9000 } else { 16000 + (x as u16) * 10 }])
    })
}

fn frost_perturber() -> Perturber {
    let textures = (0..6u8)
        .map(|i| RgbImage::from_pixel(64, 48, Rgb([180 + i * 10, 200, 230])))
        .collect();
    Perturber::new().with_frost_textures(FrostTextures::from_images(textures))
}

fn frame_for(corruption: Corruption) -> Frame {
    match corruption.input() {
        FrameKind::Rgb => Frame::Rgb(create_scene(36, 28)),
        FrameKind::Depth => Frame::Depth(create_depth(60, 40)),
    }
}

fn mean_abs_deviation(a: &RgbImage, b: &RgbImage) -> f64 {
    let total: f64 = a.iter().zip(b.iter()).map(|(x, y)| (f64::from(*x) - f64::from(*y)).abs()).sum();
    total / a.len() as f64
}

#[test]
fn test_every_corruption_preserves_shape() {
    init_logger();
    let perturber = frost_perturber();
    let mut rng = StdRng::seed_from_u64(2024);

    for corruption in Corruption::ALL {
        let frame = frame_for(corruption);
        for severity in Severity::all() {
            let out = perturber
                .apply_corruption(corruption, &frame, severity, &mut rng)
                .unwrap_or_else(|e| panic!("{} at {} failed: {}", corruption, severity, e));
            assert_eq!(out.kind(), frame.kind(), "{} changed the frame kind", corruption);
            assert_eq!(out.dimensions(), frame.dimensions(), "{} changed the shape", corruption);
        }
    }
}

#[test]
fn test_identity_for_every_severity() {
    let perturber = Perturber::new();
    let mut rng = StdRng::seed_from_u64(0);
    for frame in [Frame::Rgb(create_scene(20, 20)), Frame::Depth(create_depth(20, 20))] {
        for level in 1..=5 {
            assert_eq!(perturber.apply("none", &frame, level, &mut rng).unwrap(), frame);
        }
    }
}

#[test]
fn test_invalid_severity_rejected() {
    let perturber = Perturber::new();
    let frame = Frame::Rgb(create_scene(8, 8));
    let mut rng = StdRng::seed_from_u64(0);
    for level in [0, 6, -1] {
        let err = perturber.apply("gaussian_noise", &frame, level, &mut rng).unwrap_err();
        assert!(matches!(err, PerturbError::SeverityOutOfRange(v) if v == level));
    }
}

#[test]
fn test_unknown_corruption_rejected() {
    let perturber = Perturber::new();
    let frame = Frame::Rgb(create_scene(8, 8));
    let mut rng = StdRng::seed_from_u64(0);
    let err = perturber.apply("lens_flare", &frame, 1, &mut rng).unwrap_err();
    assert!(matches!(err, PerturbError::UnknownCorruption(_)));
}

#[test]
fn test_frame_mismatch_rejected() {
    let perturber = Perturber::new();
    let mut rng = StdRng::seed_from_u64(0);

    let depth = Frame::Depth(create_depth(16, 16));
    let err = perturber.apply("fog", &depth, 1, &mut rng).unwrap_err();
    assert!(matches!(
        err,
        PerturbError::FrameMismatch { expected: FrameKind::Rgb, actual: FrameKind::Depth, .. }
    ));

    let rgb = Frame::Rgb(create_scene(16, 16));
    let err = perturber.apply("depth_add_fixed_mask", &rgb, 1, &mut rng).unwrap_err();
    assert!(matches!(
        err,
        PerturbError::FrameMismatch { expected: FrameKind::Depth, actual: FrameKind::Rgb, .. }
    ));
}

#[test]
fn test_frost_without_textures_fails() {
    let perturber = Perturber::new();
    let frame = Frame::Rgb(create_scene(16, 16));
    let mut rng = StdRng::seed_from_u64(0);
    let err = perturber.apply("frost", &frame, 2, &mut rng).unwrap_err();
    assert!(matches!(err, PerturbError::MissingFrostTexture));
}

#[test]
fn test_noise_grows_with_severity() {
    let perturber = Perturber::new();
    let img = RgbImage::from_pixel(48, 48, Rgb([128, 128, 128]));
    let frame = Frame::Rgb(img.clone());
    let mut rng = StdRng::seed_from_u64(77);

    for name in ["gaussian_noise", "shot_noise", "impulse_noise", "speckle_noise"] {
        let mut mild = 0.0;
        let mut severe = 0.0;
        for _ in 0..5 {
            for (level, acc) in [(1, &mut mild), (5, &mut severe)] {
                match perturber.apply(name, &frame, level, &mut rng).unwrap() {
                    Frame::Rgb(out) => *acc += mean_abs_deviation(&img, &out),
                    Frame::Depth(_) => unreachable!(),
                }
            }
        }
        assert!(mild < severe, "{}: {} >= {}", name, mild, severe);
    }
}

#[test]
fn test_fractal_normalized() {
    for seed in 0..8 {
        let mut rng = StdRng::seed_from_u64(seed);
        let field = plasma_fractal(32, 3.0, &mut rng).unwrap();
        assert_eq!(field.dimensions(), (32, 32));
        let min = field.iter().copied().fold(f32::INFINITY, f32::min);
        let max = field.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
    }
}

#[test]
fn test_clipped_zoom_unit_factor() {
    let img = color::to_unit(&create_scene(30, 30));
    let zoomed = clipped_zoom(&img, 1.0);
    assert_eq!(zoomed.dimensions(), img.dimensions());
    for (a, b) in img.iter().zip(zoomed.iter()) {
        assert!((a - b).abs() < 1e-4);
    }
}

#[test]
fn test_depth_range_window() {
    let perturber = Perturber::new();
    let depth = DepthMap::from_fn(64, 8, |x, y| Luma([(x * 500 + y) as u16]));
    let mut rng = StdRng::seed_from_u64(0);

    let windows = [(0.2, 3.0), (0.3, 3.2), (0.4, 3.4), (0.5, 3.6), (0.6, 3.8)];
    for (level, (min, max)) in (1..=5).zip(windows) {
        let out = match perturber.apply("depth_range", &Frame::Depth(depth.clone()), level, &mut rng).unwrap() {
            Frame::Depth(d) => d,
            Frame::Rgb(_) => unreachable!(),
        };
        for (o, d) in out.iter().zip(depth.iter()) {
            if *d == 0 {
                assert_eq!(*o, 0);
            }
            if *o != 0 {
                let metres = f64::from(*o) / 6553.5;
                assert!(metres >= min && metres <= max);
            }
        }
    }
}

#[test]
fn test_fixed_mask_deterministic_random_mask_not() {
    let perturber = Perturber::new();
    let frame = Frame::Depth(create_depth(120, 90));
    let mut rng = StdRng::seed_from_u64(3);

    let a = perturber.apply("depth_add_fixed_mask", &frame, 4, &mut rng).unwrap();
    let b = perturber.apply("depth_add_fixed_mask", &frame, 4, &mut rng).unwrap();
    assert_eq!(a, b);

    let c = perturber.apply("depth_add_random_mask", &frame, 4, &mut rng).unwrap();
    let d = perturber.apply("depth_add_random_mask", &frame, 4, &mut rng).unwrap();
    assert_ne!(c, d);
}

#[test]
fn test_contrast_flat_image_unchanged() {
    let perturber = Perturber::new();
    let frame = Frame::Rgb(RgbImage::from_pixel(512, 512, Rgb([128, 128, 128])));
    let mut rng = StdRng::seed_from_u64(0);
    for level in [1, 5] {
        assert_eq!(perturber.apply("contrast", &frame, level, &mut rng).unwrap(), frame);
    }
}

#[test]
fn test_seeded_runs_reproducible() {
    let perturber = frost_perturber();
    for corruption in Corruption::ALL {
        let frame = frame_for(corruption);
        let severity = Severity::new(2).unwrap();
        let a = perturber
            .apply_corruption(corruption, &frame, severity, &mut StdRng::seed_from_u64(5))
            .unwrap();
        let b = perturber
            .apply_corruption(corruption, &frame, severity, &mut StdRng::seed_from_u64(5))
            .unwrap();
        assert_eq!(a, b, "{} is not reproducible", corruption);
    }
}

#[test]
fn test_catalogue_serializes() {
    let catalogue = Perturber::new().catalogue();
    assert_eq!(catalogue.len(), 26);
    let json = serde_json::to_string(&catalogue).unwrap();
    assert!(json.contains(r#""name":"depth_add_edge_erosion","family":"depth","input":"depth""#));
}

/// Counts calls and returns the input unchanged
struct CountingBlur(Arc<AtomicUsize>);

impl DirectionalBlur for CountingBlur {
    fn blur(&self, img: &Rgb32FImage, _radius: f32, _sigma: f32, _angle: f32) -> Rgb32FImage {
        self.0.fetch_add(1, Ordering::SeqCst);
        img.clone()
    }
}

#[test]
fn test_custom_directional_blur_is_used() {
    let calls = Arc::new(AtomicUsize::new(0));
    let perturber = Perturber::new().with_blur(CountingBlur(calls.clone()));
    let frame = Frame::Rgb(create_scene(24, 24));
    let mut rng = StdRng::seed_from_u64(9);

    let out = perturber.apply("motion_blur", &frame, 3, &mut rng).unwrap();
    assert_eq!(out, frame);
    perturber.apply("snow", &frame, 3, &mut rng).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
