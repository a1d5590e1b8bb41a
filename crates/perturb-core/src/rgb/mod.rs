//! Каталог искажений RGB-кадров
//!
//! Каждый оператор принимает `RgbImage`, уровень [`Severity`](crate::Severity)
//! и возвращает кадр тех же размеров в диапазоне `[0, 255]`. Таблицы
//! параметров - константы рядом с оператором, по одной строке на уровень.

pub mod blur;
pub mod digital;
pub mod noise;
pub mod photometric;
pub mod weather;

use image::{Luma, Rgb32FImage};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::GrayF32Image;

/// Поле `N(mean, std)` размером с кадр
pub(crate) fn normal_layer<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    mean: f32,
    std: f32,
    rng: &mut R,
) -> GrayF32Image {
    GrayF32Image::from_fn(width, height, |_, _| {
        let z: f32 = rng.sample(StandardNormal);
        Luma([mean + std * z])
    })
}

/// Поэлементное преобразование float-кадра
pub(crate) fn map_subpixels(img: &mut Rgb32FImage, mut f: impl FnMut(f32) -> f32) {
    img.iter_mut().for_each(|v| *v = f(*v));
}
