//! Погода и композитинг: туман, иней, снег, брызги
//!
//! Операторы смешивают исходный кадр со сгенерированным слоем:
//! фрактальным полем (туман), эталонной текстурой (иней),
//! размытым шумом (снег) или маской жидкости (брызги).

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, Rgb32FImage, RgbImage};
use imageproc::contrast::equalize_histogram;
use imageproc::distance_transform::euclidean_squared_distance_transform;
use imageproc::edges::canny;
use rand::Rng;

use super::normal_layer;
use crate::assets::FrostTextures;
use crate::color;
use crate::field;
use crate::filter::{self, Border, Kernel};
use crate::motion::DirectionalBlur;
use crate::resample;
use crate::{GrayF32Image, PerturbError, Severity};

/// (amount, decay)
const FOG: [(f32, f64); 5] = [(1.5, 2.0), (2.0, 2.0), (2.5, 1.7), (2.5, 1.5), (3.0, 1.4)];
const FOG_FIELD_SIZE: usize = 1024;

/// (image weight, texture weight)
const FROST: [(f32, f32); 5] = [(1.0, 0.4), (0.8, 0.6), (0.7, 0.7), (0.65, 0.7), (0.6, 0.75)];

#[derive(Debug, Clone, Copy)]
struct SnowParams {
    mean: f32,
    std: f32,
    zoom: f32,
    threshold: f32,
    radius: f32,
    sigma: f32,
    mix: f32,
}

const fn snow_params(mean: f32, std: f32, zoom: f32, threshold: f32, radius: f32, sigma: f32, mix: f32) -> SnowParams {
    SnowParams { mean, std, zoom, threshold, radius, sigma, mix }
}

const SNOW: [SnowParams; 5] = [
    snow_params(0.1, 0.3, 3.0, 0.5, 10.0, 4.0, 0.8),
    snow_params(0.2, 0.3, 2.0, 0.5, 12.0, 4.0, 0.7),
    snow_params(0.55, 0.3, 4.0, 0.9, 12.0, 8.0, 0.7),
    snow_params(0.55, 0.3, 4.5, 0.85, 12.0, 8.0, 0.65),
    snow_params(0.55, 0.3, 2.5, 0.85, 12.0, 12.0, 0.55),
];

/// Угол падения снега, градусы
const SNOW_ANGLE: (f32, f32) = (-135.0, -45.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpatterMode {
    Water,
    Mud,
}

#[derive(Debug, Clone, Copy)]
struct SpatterParams {
    mean: f32,
    std: f32,
    sigma: f32,
    threshold: f32,
    /// Яркость блика для воды, σ сглаживания маски для грязи
    gain: f32,
    mode: SpatterMode,
}

const SPATTER: [SpatterParams; 5] = [
    SpatterParams { mean: 0.65, std: 0.3, sigma: 4.0, threshold: 0.69, gain: 0.6, mode: SpatterMode::Water },
    SpatterParams { mean: 0.65, std: 0.3, sigma: 3.0, threshold: 0.68, gain: 0.6, mode: SpatterMode::Water },
    SpatterParams { mean: 0.65, std: 0.3, sigma: 2.0, threshold: 0.68, gain: 0.5, mode: SpatterMode::Water },
    SpatterParams { mean: 0.65, std: 0.3, sigma: 1.0, threshold: 0.65, gain: 1.5, mode: SpatterMode::Mud },
    SpatterParams { mean: 0.67, std: 0.4, sigma: 1.0, threshold: 0.65, gain: 1.5, mode: SpatterMode::Mud },
];

const WATER_COLOR: [f32; 3] = [175.0 / 255.0, 238.0 / 255.0, 238.0 / 255.0];
const MUD_COLOR: [f32; 3] = [63.0 / 255.0, 42.0 / 255.0, 20.0 / 255.0];

/// Ядро «блика» капель
const SHEEN_KERNEL: [f32; 9] = [-2.0, -1.0, 0.0, -1.0, 1.0, 1.0, 0.0, 1.0, 2.0];
const MAX_EDGE_DISTANCE: f64 = 20.0;
const MUD_CUTOFF: f32 = 0.8;

/// Туман: аддитивное фрактальное поле с сохранением отношения к максимуму
pub fn fog<R: Rng + ?Sized>(img: &RgbImage, severity: Severity, rng: &mut R) -> Result<RgbImage, PerturbError> {
    let (amount, decay) = severity.pick(&FOG);
    let mut x = color::to_unit(img);
    let (width, height) = x.dimensions();
    let max = x.iter().copied().fold(0.0f32, f32::max);

    let plasma = field::plasma_fractal(FOG_FIELD_SIZE, decay, rng)?;
    let haze = imageops::resize(&plasma, width, height, FilterType::Triangle);

    let scale = max / (max + amount);
    for (px, h) in x.pixels_mut().zip(haze.pixels()) {
        for v in px.0.iter_mut() {
            *v = (*v + amount * h.0[0]) * scale;
        }
    }
    Ok(color::from_unit(&x))
}

/// Иней: линейное смешение с эталонной текстурой
pub fn frost<R: Rng + ?Sized>(
    img: &RgbImage,
    severity: Severity,
    textures: &FrostTextures,
    rng: &mut R,
) -> Result<RgbImage, PerturbError> {
    let (a, b) = severity.pick(&FROST);
    let texture = textures.choose(rng).ok_or(PerturbError::MissingFrostTexture)?;
    let (width, height) = img.dimensions();

    let texture = color::to_unit(texture);
    let texture = imageops::resize(&texture, width, height, FilterType::Triangle);
    let mut x = color::to_unit(img);
    for (px, t) in x.pixels_mut().zip(texture.pixels()) {
        for (v, tv) in px.0.iter_mut().zip(t.0) {
            *v = a * *v + b * tv;
        }
    }
    Ok(color::from_unit(&x))
}

/// Снег: пороговый шум, размытый по направлению падения,
/// поверх осветлённого кадра
pub fn snow<R: Rng + ?Sized>(
    img: &RgbImage,
    severity: Severity,
    blur: &dyn DirectionalBlur,
    rng: &mut R,
) -> RgbImage {
    let p = severity.pick(&SNOW);
    let x = color::to_unit(img);
    let (width, height) = x.dimensions();

    let layer = normal_layer(width, height, p.mean, p.std, rng);
    let mut layer = resample::clipped_zoom(&layer, p.zoom);
    if layer.dimensions() != (width, height) {
        layer = imageops::resize(&layer, width, height, FilterType::Triangle);
    }

    // Equal channels, 8-bit, as the blur primitive expects an image
    let flakes = Rgb32FImage::from_fn(width, height, |col, row| {
        let v = layer.get_pixel(col, row).0[0];
        let v = if v < p.threshold { 0.0 } else { v.clamp(0.0, 1.0) };
        let q = f32::from((v * 255.0) as u8) / 255.0;
        Rgb([q, q, q])
    });

    let angle = rng.gen_range(SNOW_ANGLE.0..SNOW_ANGLE.1);
    log::debug!("snow: angle {:.1}", angle);
    let flakes = blur.blur(&flakes, p.radius, p.sigma, angle);
    let flakes = GrayF32Image::from_fn(width, height, |col, row| {
        Luma([f32::from(color::quantize(flakes.get_pixel(col, row).0[0])) / 255.0])
    });

    let out = Rgb32FImage::from_fn(width, height, |col, row| {
        let px = x.get_pixel(col, row).0;
        let bright = 1.5 * color::luma(px) + 0.5;
        let snowfall = flakes.get_pixel(col, row).0[0] + flakes.get_pixel(width - 1 - col, height - 1 - row).0[0];
        Rgb(px.map(|v| p.mix * v + (1.0 - p.mix) * v.max(bright) + snowfall))
    });
    color::from_unit(&out)
}

/// Брызги: водяные капли на слабых уровнях, грязь на сильных
pub fn spatter<R: Rng + ?Sized>(img: &RgbImage, severity: Severity, rng: &mut R) -> RgbImage {
    let p = severity.pick(&SPATTER);
    let mut x = color::to_unit(img);
    let (width, height) = x.dimensions();

    let mut liquid = normal_layer(width, height, p.mean, p.std, rng);
    liquid = filter::gaussian_blur(&liquid, p.sigma, Border::Nearest);
    liquid.iter_mut().filter(|v| **v < p.threshold).for_each(|v| *v = 0.0);

    match p.mode {
        SpatterMode::Water => water(&mut x, &liquid, p.gain),
        SpatterMode::Mud => mud(&mut x, &liquid, p.threshold, p.gain),
    }
    color::from_unit(&x)
}

fn water(x: &mut Rgb32FImage, liquid: &GrayF32Image, gain: f32) {
    let (width, height) = liquid.dimensions();
    let liquid = GrayImage::from_fn(width, height, |col, row| {
        Luma([(liquid.get_pixel(col, row).0[0].clamp(0.0, 1.0) * 255.0) as u8])
    });

    // Distance to the nearest droplet edge, capped
    let edges = canny(&liquid, 50.0, 150.0);
    let distances = euclidean_squared_distance_transform(&edges);
    let dist = GrayF32Image::from_fn(width, height, |col, row| {
        Luma([distances.get_pixel(col, row).0[0].sqrt().min(MAX_EDGE_DISTANCE) as f32])
    });
    let dist = filter::box_blur3(&dist, Border::Reflect101);
    let dist = GrayImage::from_fn(width, height, |col, row| Luma([dist.get_pixel(col, row).0[0] as u8]));
    let dist = equalize_histogram(&dist);

    let sheen = Kernel { size: 3, weights: SHEEN_KERNEL.to_vec() };
    let dist = GrayF32Image::from_fn(width, height, |col, row| Luma([f32::from(dist.get_pixel(col, row).0[0])]));
    let mut dist = filter::filter2d(&dist, &sheen, Border::Reflect101);
    dist.iter_mut().for_each(|v| *v = v.round().clamp(0.0, 255.0));
    let mut dist = filter::box_blur3(&dist, Border::Reflect101);
    dist.iter_mut().for_each(|v| *v = v.round());

    let mut mask = GrayF32Image::from_fn(width, height, |col, row| {
        Luma([f32::from(liquid.get_pixel(col, row).0[0]) * dist.get_pixel(col, row).0[0]])
    });
    let max = mask.iter().copied().fold(0.0f32, f32::max);
    if max <= 0.0 {
        log::debug!("spatter: no droplets above threshold");
        return;
    }
    mask.iter_mut().for_each(|v| *v = *v / max * gain);

    for (px, m) in x.pixels_mut().zip(mask.pixels()) {
        for (v, c) in px.0.iter_mut().zip(WATER_COLOR) {
            *v += m.0[0] * c;
        }
    }
}

fn mud(x: &mut Rgb32FImage, liquid: &GrayF32Image, threshold: f32, sigma: f32) {
    let mut mask = liquid.clone();
    mask.iter_mut().for_each(|v| *v = if *v > threshold { 1.0 } else { 0.0 });
    let mut mask = filter::gaussian_blur(&mask, sigma, Border::Nearest);
    mask.iter_mut().filter(|v| **v < MUD_CUTOFF).for_each(|v| *v = 0.0);

    for (px, m) in x.pixels_mut().zip(mask.pixels()) {
        let m = m.0[0];
        for (v, c) in px.0.iter_mut().zip(MUD_COLOR) {
            *v = *v * (1.0 - m) + m * c;
        }
    }
}
