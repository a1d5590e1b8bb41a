//! Шумовые искажения: гауссов, дробовой, импульсный, спекл

use image::RgbImage;
use rand::Rng;
use rand_distr::{Distribution, Poisson, StandardNormal};

use super::map_subpixels;
use crate::color;
use crate::Severity;

const GAUSSIAN_NOISE: [f32; 5] = [0.08, 0.12, 0.18, 0.26, 0.38];
const GAUSSIAN_NOISE_STRONG: [f32; 5] = [0.4, 0.6, 0.8, 0.9, 1.0];
const SHOT_NOISE: [f64; 5] = [60.0, 25.0, 12.0, 5.0, 3.0];
const IMPULSE_NOISE: [f32; 5] = [0.03, 0.06, 0.09, 0.17, 0.27];
const SPECKLE_NOISE: [f32; 5] = [0.15, 0.2, 0.35, 0.45, 0.6];

/// Аддитивный гауссов шум
pub fn gaussian_noise<R: Rng + ?Sized>(img: &RgbImage, severity: Severity, rng: &mut R) -> RgbImage {
    additive_gaussian(img, severity.pick(&GAUSSIAN_NOISE), rng)
}

/// Аддитивный гауссов шум с большой дисперсией
pub fn gaussian_noise_strong<R: Rng + ?Sized>(img: &RgbImage, severity: Severity, rng: &mut R) -> RgbImage {
    additive_gaussian(img, severity.pick(&GAUSSIAN_NOISE_STRONG), rng)
}

fn additive_gaussian<R: Rng + ?Sized>(img: &RgbImage, std: f32, rng: &mut R) -> RgbImage {
    let mut x = color::to_unit(img);
    map_subpixels(&mut x, |v| {
        let z: f32 = rng.sample(StandardNormal);
        v + std * z
    });
    color::from_unit(&x)
}

/// Дробовой шум: `Poisson(x * c) / c`
pub fn shot_noise<R: Rng + ?Sized>(img: &RgbImage, severity: Severity, rng: &mut R) -> RgbImage {
    let photons = severity.pick(&SHOT_NOISE);
    let mut x = color::to_unit(img);
    map_subpixels(&mut x, |v| {
        let lambda = f64::from(v) * photons;
        // Poisson is undefined at zero intensity; a black pixel emits nothing
        let count = Poisson::new(lambda).map(|p| p.sample(rng)).unwrap_or(0.0);
        (count / photons) as f32
    });
    color::from_unit(&x)
}

/// Импульсный шум «соль и перец», независимо по каналам
pub fn impulse_noise<R: Rng + ?Sized>(img: &RgbImage, severity: Severity, rng: &mut R) -> RgbImage {
    let amount = severity.pick(&IMPULSE_NOISE);
    let mut x = color::to_unit(img);
    map_subpixels(&mut x, |v| {
        if rng.gen::<f32>() < amount {
            if rng.gen_bool(0.5) {
                1.0
            } else {
                0.0
            }
        } else {
            v
        }
    });
    color::from_unit(&x)
}

/// Мультипликативный шум: `x + x * N(0, c)`
pub fn speckle_noise<R: Rng + ?Sized>(img: &RgbImage, severity: Severity, rng: &mut R) -> RgbImage {
    let std = severity.pick(&SPECKLE_NOISE);
    let mut x = color::to_unit(img);
    map_subpixels(&mut x, |v| {
        let z: f32 = rng.sample(StandardNormal);
        v + v * std * z
    });
    color::from_unit(&x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gray(value: u8) -> RgbImage {
        RgbImage::from_pixel(64, 64, Rgb([value, value, value]))
    }

    fn mean_abs_diff(a: &RgbImage, b: &RgbImage) -> f64 {
        let total: f64 = a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| (f64::from(*x) - f64::from(*y)).abs())
            .sum();
        total / a.len() as f64
    }

    #[test]
    fn test_noise_tables() {
        let level = |v| Severity::new(v).unwrap();
        assert_eq!(level(1).pick(&GAUSSIAN_NOISE), 0.08);
        assert_eq!(level(5).pick(&GAUSSIAN_NOISE), 0.38);
        assert_eq!(level(3).pick(&GAUSSIAN_NOISE_STRONG), 0.8);
        assert_eq!(level(1).pick(&SHOT_NOISE), 60.0);
        assert_eq!(level(4).pick(&IMPULSE_NOISE), 0.17);
        assert_eq!(level(2).pick(&SPECKLE_NOISE), 0.2);
    }

    #[test]
    fn test_gaussian_noise_grows_with_severity() {
        let img = gray(128);
        let mut rng = StdRng::seed_from_u64(3);
        let mild = gaussian_noise(&img, Severity::new(1).unwrap(), &mut rng);
        let severe = gaussian_noise(&img, Severity::new(5).unwrap(), &mut rng);
        assert!(mean_abs_diff(&img, &mild) < mean_abs_diff(&img, &severe));
    }

    #[test]
    fn test_shot_noise_keeps_black() {
        let img = gray(0);
        let mut rng = StdRng::seed_from_u64(3);
        let out = shot_noise(&img, Severity::new(5).unwrap(), &mut rng);
        assert!(out.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_impulse_noise_only_saturates() {
        let img = gray(100);
        let mut rng = StdRng::seed_from_u64(11);
        let out = impulse_noise(&img, Severity::new(5).unwrap(), &mut rng);
        assert!(out.iter().all(|&v| v == 0 || v == 100 || v == 255));
        let flipped = out.iter().filter(|&&v| v != 100).count() as f64 / out.len() as f64;
        assert!((flipped - 0.27).abs() < 0.03);
    }

    #[test]
    fn test_speckle_noise_keeps_black() {
        let img = gray(0);
        let mut rng = StdRng::seed_from_u64(5);
        let out = speckle_noise(&img, Severity::new(4).unwrap(), &mut rng);
        assert!(out.iter().all(|&v| v == 0));
    }
}
