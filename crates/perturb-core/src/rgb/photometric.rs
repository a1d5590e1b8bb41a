//! Фотометрия: контраст, яркость, насыщенность

use image::{Rgb, RgbImage};

use crate::color;
use crate::Severity;

const CONTRAST: [f32; 5] = [0.4, 0.3, 0.2, 0.1, 0.05];
const BRIGHTNESS: [f32; 5] = [0.1, 0.2, 0.3, 0.4, 0.5];
/// (scale, shift)
const SATURATE: [(f32, f32); 5] = [(0.3, 0.0), (0.1, 0.0), (2.0, 0.0), (5.0, 0.1), (20.0, 0.2)];

/// Сжатие отклонений от поканального среднего
pub fn contrast(img: &RgbImage, severity: Severity) -> RgbImage {
    let c = severity.pick(&CONTRAST);
    let mut x = color::to_unit(img);

    let mut sums = [0.0f64; 3];
    for px in x.pixels() {
        for (sum, v) in sums.iter_mut().zip(px.0) {
            *sum += f64::from(v);
        }
    }
    let count = f64::from(img.width()) * f64::from(img.height());
    let means = sums.map(|s| if count > 0.0 { (s / count) as f32 } else { 0.0 });

    for px in x.pixels_mut() {
        for (v, mean) in px.0.iter_mut().zip(means) {
            *v = (*v - mean) * c + mean;
        }
    }
    color::from_unit(&x)
}

/// Сдвиг канала V в HSV
pub fn brightness(img: &RgbImage, severity: Severity) -> RgbImage {
    let shift = severity.pick(&BRIGHTNESS);
    map_hsv(img, |[h, s, v]| [h, s, (v + shift).clamp(0.0, 1.0)])
}

/// Масштаб и сдвиг канала S в HSV
pub fn saturate(img: &RgbImage, severity: Severity) -> RgbImage {
    let (scale, shift) = severity.pick(&SATURATE);
    map_hsv(img, |[h, s, v]| [h, (s * scale + shift).clamp(0.0, 1.0), v])
}

fn map_hsv(img: &RgbImage, f: impl Fn([f32; 3]) -> [f32; 3]) -> RgbImage {
    let x = color::to_unit(img);
    let (width, height) = x.dimensions();
    let out = image::Rgb32FImage::from_fn(width, height, |col, row| {
        Rgb(color::hsv_to_rgb(f(color::rgb_to_hsv(x.get_pixel(col, row).0))))
    });
    color::from_unit(&out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contrast_flat_image_unchanged() {
        let img = RgbImage::from_pixel(512, 512, Rgb([128, 128, 128]));
        for s in Severity::all() {
            assert_eq!(contrast(&img, s), img);
        }
    }

    #[test]
    fn test_contrast_pulls_toward_mean() {
        let img = RgbImage::from_fn(8, 8, |x, _| if x < 4 { Rgb([0, 0, 0]) } else { Rgb([200, 200, 200]) });
        let mild = contrast(&img, Severity::new(1).unwrap());
        let severe = contrast(&img, Severity::new(5).unwrap());
        let spread = |im: &RgbImage| i32::from(im.get_pixel(7, 0).0[0]) - i32::from(im.get_pixel(0, 0).0[0]);
        assert!(spread(&severe) < spread(&mild));
        assert!(spread(&mild) < spread(&img));
    }

    #[test]
    fn test_brightness_raises_value() {
        let img = RgbImage::from_pixel(4, 4, Rgb([100, 50, 25]));
        let out = brightness(&img, Severity::new(2).unwrap());
        let px = out.get_pixel(0, 0).0;
        assert_eq!(px[0], 151); // (100/255 + 0.2) * 255
        assert!(px[1] > 50 && px[2] > 25);
    }

    #[test]
    fn test_saturate_gray_stays_gray() {
        let img = RgbImage::from_pixel(4, 4, Rgb([90, 90, 90]));
        let out = saturate(&img, Severity::new(3).unwrap());
        assert_eq!(out, img);
    }
}
