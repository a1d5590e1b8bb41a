//! Цифровые артефакты: JPEG, пикселизация, эластичная деформация

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageFormat, Luma, Rgb, Rgb32FImage, RgbImage};
use nalgebra::Point2;
use rand::Rng;

use crate::color;
use crate::filter::{self, Border};
use crate::geometry;
use crate::{GrayF32Image, PerturbError, Severity};

const JPEG_QUALITY: [u8; 5] = [25, 18, 15, 10, 7];
const PIXELATE: [f32; 5] = [0.6, 0.5, 0.4, 0.3, 0.25];

/// (alpha, sigma, jitter) в долях от `ELASTIC_SCALE`
const ELASTIC: [(f32, f32, f32); 5] = [
    (2.0, 0.7, 0.1),
    (2.0, 0.08, 0.2),
    (0.05, 0.01, 0.02),
    (0.07, 0.01, 0.02),
    (0.12, 0.01, 0.02),
];
/// Таблица подобрана под кадр 512x512 и не масштабируется
const ELASTIC_SCALE: f32 = 512.0;
const ELASTIC_TRUNCATE: f32 = 3.0;

/// Перекодирование в JPEG с низким качеством
pub fn jpeg_compression(img: &RgbImage, severity: Severity) -> Result<RgbImage, PerturbError> {
    let quality = severity.pick(&JPEG_QUALITY);
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality).encode_image(img)?;
    log::debug!("jpeg_compression: quality {}, {} bytes", quality, buffer.len());

    let decoded = image::load_from_memory_with_format(&buffer, ImageFormat::Jpeg)?;
    Ok(decoded.to_rgb8())
}

/// Усредняющее уменьшение и увеличение ближайшим соседом
pub fn pixelate(img: &RgbImage, severity: Severity) -> RgbImage {
    let ratio = severity.pick(&PIXELATE);
    let (width, height) = img.dimensions();
    let small_width = ((width as f32 * ratio) as u32).max(1);
    let small_height = ((height as f32 * ratio) as u32).max(1);

    let small = imageops::thumbnail(img, small_width, small_height);
    imageops::resize(&small, width, height, FilterType::Nearest)
}

/// Случайное аффинное преобразование и гладкое поле смещений
///
/// Три опорные точки вокруг центра сдвигаются на `U(-jitter, jitter)`,
/// затем каждый пиксель выбирается билинейно со смещением из двух
/// сглаженных равномерных шумов, умноженных на `alpha`.
pub fn elastic_transform<R: Rng + ?Sized>(
    img: &RgbImage,
    severity: Severity,
    rng: &mut R,
) -> Result<RgbImage, PerturbError> {
    let (alpha, sigma, jitter) = severity.pick(&ELASTIC);
    let (alpha, sigma, jitter) = (alpha * ELASTIC_SCALE, sigma * ELASTIC_SCALE, jitter * ELASTIC_SCALE);
    let x = color::to_unit(img);
    let (width, height) = x.dimensions();

    // Control points are laid out as (row, col) pairs and read as (x, y)
    let center = ((height / 2) as f32, (width / 2) as f32);
    let square = (width.min(height) / 3) as f32;
    let src = [
        Point2::new(center.0 + square, center.1 + square),
        Point2::new(center.0 + square, center.1 - square),
        Point2::new(center.0 - square, center.1 - square),
    ];
    let dst = src.map(|p| {
        let jx = rng.gen_range(-jitter..jitter);
        let jy = rng.gen_range(-jitter..jitter);
        Point2::new(p.x + jx, p.y + jy)
    });

    let matrix = geometry::affine_from_points(&src, &dst).ok_or(PerturbError::DegenerateAffine)?;
    let warped = geometry::warp_affine(&x, &matrix, Border::Reflect101).ok_or(PerturbError::DegenerateAffine)?;

    let kernel = filter::gaussian_kernel(sigma, ELASTIC_TRUNCATE);
    let dx = displacement(width, height, &kernel, alpha, rng);
    let dy = displacement(width, height, &kernel, alpha, rng);

    let out = Rgb32FImage::from_fn(width, height, |col, row| {
        let sx = col as f32 + dx.get_pixel(col, row).0[0];
        let sy = row as f32 + dy.get_pixel(col, row).0[0];
        Rgb([0, 1, 2].map(|c| geometry::bilinear_sample(&warped, sx, sy, c, Border::Reflect)))
    });
    Ok(color::from_unit(&out))
}

fn displacement<R: Rng + ?Sized>(width: u32, height: u32, kernel: &[f32], alpha: f32, rng: &mut R) -> GrayF32Image {
    let noise = GrayF32Image::from_fn(width, height, |_, _| Luma([rng.gen_range(-1.0f32..1.0)]));
    let mut field = filter::separable_filter(&noise, kernel, Border::Reflect);
    field.iter_mut().for_each(|v| *v *= alpha);
    field
}
