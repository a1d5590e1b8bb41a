//! Resampling utilities: defocus disk kernel and clipped centre zoom.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, Pixel};

use crate::filter::{self, Border, Kernel};
use crate::GrayF32Image;

/// Disk radius up to which the kernel keeps the fixed 17x17 lattice.
const SMALL_DISK_RADIUS: f32 = 8.0;

/// Antialiased disk kernel used by defocus blur.
///
/// Radii up to 8 share a 17x17 lattice smoothed with a 3x3 Gaussian; larger
/// radii use a `(2r + 1)` lattice and a 5x5 Gaussian.
pub fn disk_kernel(radius: f32, alias_blur: f32) -> Kernel {
    let (half, ksize) = if radius <= SMALL_DISK_RADIUS {
        (SMALL_DISK_RADIUS as i32, 3)
    } else {
        (radius as i32, 5)
    };
    let side = (2 * half + 1) as u32;

    let mut disk = GrayF32Image::from_fn(side, side, |x, y| {
        let (dx, dy) = (x as i32 - half, y as i32 - half);
        let inside = (dx * dx + dy * dy) as f32 <= radius * radius;
        Luma([if inside { 1.0 } else { 0.0 }])
    });
    let area: f32 = disk.pixels().map(|p| p.0[0]).sum();
    if area > 0.0 {
        disk.pixels_mut().for_each(|p| p.0[0] /= area);
    }

    let smooth = filter::gaussian_kernel_sized(ksize, alias_blur);
    let disk = filter::separable_filter(&disk, &smooth, Border::Reflect101);

    Kernel {
        size: side as usize,
        weights: disk.into_raw(),
    }
}

/// Zooms toward the image centre without changing its dimensions.
///
/// Crops the central `ceil(H / f) x ceil(W / f)` window, resizes it bilinearly to
/// `round(crop * f)` and trims the overshoot symmetrically. The window keeps the
/// frame's aspect ratio, so `f = 1` returns the frame itself for any shape.
pub fn clipped_zoom<P>(img: &ImageBuffer<P, Vec<f32>>, factor: f32) -> ImageBuffer<P, Vec<f32>>
where
    P: Pixel<Subpixel = f32> + 'static,
{
    let (width, height) = img.dimensions();
    let crop_w = ((width as f32 / factor).ceil() as u32).clamp(1, width);
    let crop_h = ((height as f32 / factor).ceil() as u32).clamp(1, height);
    let left = (width - crop_w) / 2;
    let top = (height - crop_h) / 2;
    let crop = imageops::crop_imm(img, left, top, crop_w, crop_h).to_image();

    let zoom_w = (crop_w as f32 * factor).round() as u32;
    let zoom_h = (crop_h as f32 * factor).round() as u32;
    if zoom_w < width || zoom_h < height {
        return imageops::resize(&crop, width, height, FilterType::Triangle);
    }

    let zoomed = imageops::resize(&crop, zoom_w, zoom_h, FilterType::Triangle);
    let trim_left = (zoom_w - width) / 2;
    let trim_top = (zoom_h - height) / 2;
    imageops::crop_imm(&zoomed, trim_left, trim_top, width, height).to_image()
}
