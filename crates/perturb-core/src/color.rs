//! Color-space helpers shared by the RGB operators.
//!
//! Operators work on `Rgb32FImage` in `[0, 1]`; the 8-bit contract is restored
//! by [`from_unit`], which clips before quantizing.

use image::{Rgb, Rgb32FImage, RgbImage};

/// `u8` image to float image in `[0, 1]`.
pub fn to_unit(img: &RgbImage) -> Rgb32FImage {
    let (width, height) = img.dimensions();
    Rgb32FImage::from_fn(width, height, |x, y| {
        let Rgb([r, g, b]) = *img.get_pixel(x, y);
        Rgb([f32::from(r) / 255.0, f32::from(g) / 255.0, f32::from(b) / 255.0])
    })
}

/// Float image to `u8`, clipping to `[0, 1]` and rounding to nearest.
pub fn from_unit(img: &Rgb32FImage) -> RgbImage {
    let (width, height) = img.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let Rgb(px) = *img.get_pixel(x, y);
        Rgb(px.map(quantize))
    })
}

pub fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// ITU-R BT.601 luma
pub fn luma([r, g, b]: [f32; 3]) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// RGB to HSV, all components in `[0, 1]`.
///
/// Ties on the maximum resolve to blue, then green, then red.
pub fn rgb_to_hsv([r, g, b]: [f32; 3]) -> [f32; 3] {
    let v = r.max(g).max(b);
    let delta = v - r.min(g).min(b);
    if delta == 0.0 {
        return [0.0, 0.0, v];
    }
    let s = delta / v;
    let sector = if b == v {
        4.0 + (r - g) / delta
    } else if g == v {
        2.0 + (b - r) / delta
    } else {
        (g - b) / delta
    };
    let h = (sector / 6.0).rem_euclid(1.0);
    [h, s, v]
}

pub fn hsv_to_rgb([h, s, v]: [f32; 3]) -> [f32; 3] {
    let scaled = h * 6.0;
    let sector = scaled.floor();
    let f = scaled - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    match (sector as i32).rem_euclid(6) {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_unit_roundtrip_is_lossless() {
        let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 255]));
        assert_eq!(from_unit(&to_unit(&img)), img);
    }

    #[test]
    fn test_hsv_primaries() {
        assert!(close(rgb_to_hsv([1.0, 0.0, 0.0]), [0.0, 1.0, 1.0]));
        assert!(close(rgb_to_hsv([0.0, 1.0, 0.0]), [1.0 / 3.0, 1.0, 1.0]));
        assert!(close(rgb_to_hsv([0.0, 0.0, 0.5]), [2.0 / 3.0, 1.0, 0.5]));
        assert!(close(rgb_to_hsv([0.4, 0.4, 0.4]), [0.0, 0.0, 0.4]));
    }

    #[test]
    fn test_hsv_inverse() {
        for px in [[0.2, 0.5, 0.9], [0.9, 0.1, 0.3], [0.6, 0.6, 0.1], [0.0, 0.0, 0.0]] {
            assert!(close(hsv_to_rgb(rgb_to_hsv(px)), px));
        }
    }
}
