//! Направленное размытие (motion blur)
//!
//! Операторы `motion_blur` и `snow` обращаются к размытию через трейт
//! [`DirectionalBlur`], поэтому реализацию можно подменить.

use image::{Rgb, Rgb32FImage};

/// Примитив направленного размытия
pub trait DirectionalBlur: Send + Sync {
    /// `angle` в градусах, `radius` и `sigma` в пикселях
    fn blur(&self, img: &Rgb32FImage, radius: f32, sigma: f32, angle: f32) -> Rgb32FImage;
}

/// Одностороннее гауссово размытие вдоль направления
///
/// Ядро шириной `2 * ceil(radius) + 1` с весами `exp(-i^2 / 2 sigma^2)`;
/// отсчёты берутся вдоль луча под углом `angle` (0° - вправо по горизонтали),
/// за краем кадра повторяется крайний пиксель.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionBlur;

impl MotionBlur {
    /// Веса и смещения `(dx, dy)` отсчётов
    pub fn taps(radius: f32, sigma: f32, angle: f32) -> Vec<(f32, i64, i64)> {
        let width = (2.0 * radius.ceil() + 1.0) as i64;
        let two_sigma_sq = 2.0 * f64::from(sigma) * f64::from(sigma);

        let theta = f64::from(angle).to_radians();
        let x = width as f64 * theta.sin();
        let y = width as f64 * theta.cos();
        let hyp = x.hypot(y);

        let weights: Vec<f64> = (0..width).map(|i| (-((i * i) as f64) / two_sigma_sq).exp()).collect();
        let total: f64 = weights.iter().sum();

        weights
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let i = i as f64;
                let (dx, dy) = if hyp > 0.0 {
                    (
                        (i * y / hyp - 0.5).ceil() as i64,
                        (i * x / hyp - 0.5).ceil() as i64,
                    )
                } else {
                    (0, 0)
                };
                ((w / total) as f32, dx, dy)
            })
            .collect()
    }
}

impl DirectionalBlur for MotionBlur {
    fn blur(&self, img: &Rgb32FImage, radius: f32, sigma: f32, angle: f32) -> Rgb32FImage {
        if radius <= 0.0 || sigma <= 0.0 {
            return img.clone();
        }
        let taps = Self::taps(radius, sigma, angle);
        let (width, height) = img.dimensions();
        let (max_x, max_y) = (i64::from(width) - 1, i64::from(height) - 1);

        Rgb32FImage::from_fn(width, height, |x, y| {
            let mut acc = [0.0f32; 3];
            for &(weight, dx, dy) in &taps {
                let sx = (i64::from(x) + dx).clamp(0, max_x) as u32;
                let sy = (i64::from(y) + dy).clamp(0, max_y) as u32;
                let Rgb(px) = img.get_pixel(sx, sy);
                for c in 0..3 {
                    acc[c] += weight * px[c];
                }
            }
            Rgb(acc)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taps_normalized() {
        let taps = MotionBlur::taps(10.0, 3.0, 0.0);
        assert_eq!(taps.len(), 21);
        let total: f32 = taps.iter().map(|t| t.0).sum();
        assert!((total - 1.0).abs() < 1e-5);
        // First tap sits on the pixel itself
        assert_eq!((taps[0].1, taps[0].2), (0, 0));
    }

    #[test]
    fn test_horizontal_trail() {
        // angle 0 -> offsets along the x axis only
        let taps = MotionBlur::taps(4.0, 2.0, 0.0);
        assert!(taps.iter().all(|t| t.2 == 0));
        assert!(taps.iter().any(|t| t.1 != 0));
    }

    #[test]
    fn test_flat_image_unchanged() {
        let img = Rgb32FImage::from_pixel(16, 16, Rgb([0.3, 0.6, 0.9]));
        let out = MotionBlur.blur(&img, 15.0, 5.0, 30.0);
        for p in out.pixels() {
            assert!((p.0[0] - 0.3).abs() < 1e-5);
            assert!((p.0[2] - 0.9).abs() < 1e-5);
        }
    }
}
