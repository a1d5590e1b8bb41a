//! Размытия: гауссово, «стекло», расфокус, движение, зум

use image::imageops::{self, FilterType};
use image::{Rgb32FImage, RgbImage};
use rand::Rng;

use crate::color;
use crate::filter::{self, Border};
use crate::motion::DirectionalBlur;
use crate::resample;
use crate::Severity;

const GAUSSIAN_BLUR: [f32; 5] = [1.0, 2.0, 3.0, 4.0, 6.0];
/// (sigma, max_delta, iterations)
const GLASS_BLUR: [(f32, i64, u32); 5] = [(0.7, 1, 2), (0.9, 2, 1), (1.0, 2, 3), (1.1, 3, 2), (1.5, 4, 2)];
/// (radius, alias_blur)
const DEFOCUS_BLUR: [(f32, f32); 5] = [(3.0, 0.1), (4.0, 0.5), (6.0, 0.5), (8.0, 0.5), (10.0, 0.5)];
/// (radius, sigma)
const MOTION_BLUR: [(f32, f32); 5] = [(10.0, 3.0), (15.0, 5.0), (15.0, 8.0), (15.0, 12.0), (20.0, 15.0)];
const ZOOM_BLUR: [&[f32]; 5] = [
    &[1.0, 1.01, 1.02, 1.03, 1.04, 1.05, 1.06, 1.07, 1.08, 1.09, 1.1, 1.11],
    &[
        1.0, 1.01, 1.02, 1.03, 1.04, 1.05, 1.06, 1.07, 1.08, 1.09, 1.1, 1.11, 1.12, 1.13, 1.14, 1.15,
    ],
    &[1.0, 1.02, 1.04, 1.06, 1.08, 1.1, 1.12, 1.14, 1.16, 1.18, 1.2],
    &[1.0, 1.02, 1.04, 1.06, 1.08, 1.1, 1.12, 1.14, 1.16, 1.18, 1.2, 1.22, 1.24],
    &[1.0, 1.03, 1.06, 1.09, 1.12, 1.15, 1.18, 1.21, 1.24, 1.27, 1.3],
];

const MOTION_ANGLE_DEG: f32 = 45.0;

/// Изотропное гауссово размытие
pub fn gaussian_blur(img: &RgbImage, severity: Severity) -> RgbImage {
    let sigma = severity.pick(&GAUSSIAN_BLUR);
    color::from_unit(&filter::gaussian_blur(&color::to_unit(img), sigma, Border::Nearest))
}

/// Размытие, локальное перемешивание пикселей и повторное размытие
pub fn glass_blur<R: Rng + ?Sized>(img: &RgbImage, severity: Severity, rng: &mut R) -> RgbImage {
    let (sigma, delta, iterations) = severity.pick(&GLASS_BLUR);
    let blurred = filter::gaussian_blur(&color::to_unit(img), sigma, Border::Nearest);

    // Quantized by truncation before shuffling
    let (width, height) = img.dimensions();
    let mut x = RgbImage::from_fn(width, height, |col, row| {
        image::Rgb(blurred.get_pixel(col, row).0.map(|v| (v.clamp(0.0, 1.0) * 255.0) as u8))
    });

    let (w, h) = (i64::from(width), i64::from(height));
    for _ in 0..iterations {
        for row in (delta + 1..=h - delta).rev() {
            for col in (delta + 1..=w - delta).rev() {
                let dx = rng.gen_range(-delta..delta);
                let dy = rng.gen_range(-delta..delta);
                let (a, b) = ((col as u32, row as u32), ((col + dx) as u32, (row + dy) as u32));
                let pa = *x.get_pixel(a.0, a.1);
                let pb = *x.get_pixel(b.0, b.1);
                x.put_pixel(a.0, a.1, pb);
                x.put_pixel(b.0, b.1, pa);
            }
        }
    }

    color::from_unit(&filter::gaussian_blur(&color::to_unit(&x), sigma, Border::Nearest))
}

/// Свёртка с антиалиасинговым диском
pub fn defocus_blur(img: &RgbImage, severity: Severity) -> RgbImage {
    let (radius, alias_blur) = severity.pick(&DEFOCUS_BLUR);
    let kernel = resample::disk_kernel(radius, alias_blur);
    color::from_unit(&filter::filter2d(&color::to_unit(img), &kernel, Border::Reflect101))
}

/// Направленное размытие под случайным углом из `[-45°, 45°)`
pub fn motion_blur<R: Rng + ?Sized>(
    img: &RgbImage,
    severity: Severity,
    blur: &dyn DirectionalBlur,
    rng: &mut R,
) -> RgbImage {
    let (radius, sigma) = severity.pick(&MOTION_BLUR);
    let angle = rng.gen_range(-MOTION_ANGLE_DEG..MOTION_ANGLE_DEG);
    log::debug!("motion_blur: radius {}, sigma {}, angle {:.1}", radius, sigma, angle);
    color::from_unit(&blur.blur(&color::to_unit(img), radius, sigma, angle))
}

/// Среднее кадра и его приближений к центру
pub fn zoom_blur(img: &RgbImage, severity: Severity) -> RgbImage {
    let factors = severity.pick(&ZOOM_BLUR);
    let x = color::to_unit(img);
    let (width, height) = x.dimensions();

    let mut acc = x.clone();
    for &factor in factors {
        let mut zoomed = resample::clipped_zoom(&x, factor);
        if zoomed.dimensions() != (width, height) {
            zoomed = imageops::resize(&zoomed, width, height, FilterType::Triangle);
        }
        acc.iter_mut().zip(zoomed.iter()).for_each(|(a, z)| *a += z);
    }

    let count = (factors.len() + 1) as f32;
    let out: Rgb32FImage = Rgb32FImage::from_fn(width, height, |col, row| {
        image::Rgb(acc.get_pixel(col, row).0.map(|v| v / count))
    });
    color::from_unit(&out)
}
