use image::{Rgb, Rgb32FImage};
use nalgebra::{Matrix3, Point2, Vector3};

use crate::filter::Border;

/// Apply an affine warp to an image.
///
/// `matrix` maps source coordinates to destination coordinates; every output
/// pixel is pulled from the inverse-mapped source position.
pub fn warp_affine(img: &Rgb32FImage, matrix: &Matrix3<f32>, border: Border) -> Option<Rgb32FImage> {
    let inv_matrix = matrix.try_inverse()?;
    let (width, height) = img.dimensions();

    Some(Rgb32FImage::from_fn(width, height, |x, y| {
        // Map output pixel (x, y) back to source image
        let src = inv_matrix * Vector3::new(x as f32, y as f32, 1.0);
        Rgb([
            bilinear_sample(img, src.x, src.y, 0, border),
            bilinear_sample(img, src.x, src.y, 1, border),
            bilinear_sample(img, src.x, src.y, 2, border),
        ])
    }))
}

/// Compute the affine matrix mapping three src points onto three dst points.
///
/// Returns `None` when the source points are collinear.
pub fn affine_from_points(src: &[Point2<f32>; 3], dst: &[Point2<f32>; 3]) -> Option<Matrix3<f32>> {
    // [x y 1] * [a b c]^T = x' for each pair, same system for y'
    let basis = Matrix3::new(
        src[0].x, src[0].y, 1.0,
        src[1].x, src[1].y, 1.0,
        src[2].x, src[2].y, 1.0,
    );
    let inv_basis = basis.try_inverse()?;

    let row_x = inv_basis * Vector3::new(dst[0].x, dst[1].x, dst[2].x);
    let row_y = inv_basis * Vector3::new(dst[0].y, dst[1].y, dst[2].y);

    Some(Matrix3::new(
        row_x[0], row_x[1], row_x[2],
        row_y[0], row_y[1], row_y[2],
        0.0, 0.0, 1.0,
    ))
}

/// Bilinear sample of one channel at a fractional position.
///
/// Both neighbours of the sample are resolved through `border`, so positions
/// outside the frame never fall back to padding.
pub fn bilinear_sample(img: &Rgb32FImage, x: f32, y: f32, channel: usize, border: Border) -> f32 {
    let (width, height) = img.dimensions();

    let x0 = x.floor();
    let y0 = y.floor();
    let dx = x - x0;
    let dy = y - y0;

    let col0 = border.index(x0 as isize, width as usize) as u32;
    let col1 = border.index(x0 as isize + 1, width as usize) as u32;
    let row0 = border.index(y0 as isize, height as usize) as u32;
    let row1 = border.index(y0 as isize + 1, height as usize) as u32;

    let p00 = img.get_pixel(col0, row0).0[channel];
    let p10 = img.get_pixel(col1, row0).0[channel];
    let p01 = img.get_pixel(col0, row1).0[channel];
    let p11 = img.get_pixel(col1, row1).0[channel];

    let top = p00 * (1.0 - dx) + p10 * dx;
    let bottom = p01 * (1.0 - dx) + p11 * dx;

    top * (1.0 - dy) + bottom * dy
}
