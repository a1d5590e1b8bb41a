//! Linear filtering over float images with an explicit border policy.
//!
//! Kernels are applied as correlations over the raw subpixel buffer, so the same
//! code serves `Rgb32FImage` and single-channel float fields. The edge-replicating
//! Gaussian goes through `imageproc`; the reflecting borders have no counterpart
//! there and use the loops below.

use image::{ImageBuffer, Pixel};

/// How samples outside the frame are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Border {
    /// `aaa|abcd|ddd`
    Nearest,
    /// `cba|abcd|dcb`, half-sample symmetric
    Reflect,
    /// `dcb|abcd|cba`, whole-sample symmetric
    Reflect101,
}

impl Border {
    /// Maps a possibly out-of-range index into `0..len`.
    pub fn index(self, i: isize, len: usize) -> usize {
        let n = len as isize;
        if n <= 1 {
            return 0;
        }
        match self {
            Border::Nearest => i.clamp(0, n - 1) as usize,
            Border::Reflect => {
                let period = 2 * n;
                let m = i.rem_euclid(period);
                (if m < n { m } else { period - 1 - m }) as usize
            }
            Border::Reflect101 => {
                let period = 2 * n - 2;
                let m = i.rem_euclid(period);
                (if m < n { m } else { period - m }) as usize
            }
        }
    }
}

/// Square 2-D kernel in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    pub size: usize,
    pub weights: Vec<f32>,
}

impl Kernel {
    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }
}

/// Normalized 1-D Gaussian with radius `int(truncate * sigma + 0.5)`.
pub fn gaussian_kernel(sigma: f32, truncate: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (truncate * sigma + 0.5) as isize;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / two_sigma_sq).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// Fixed-size Gaussian centred on `(ksize - 1) / 2`, the layout used for
/// small anti-aliasing kernels.
pub fn gaussian_kernel_sized(ksize: usize, sigma: f32) -> Vec<f32> {
    let center = (ksize as f32 - 1.0) / 2.0;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..ksize)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / two_sigma_sq).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// Applies the same 1-D kernel along rows, then along columns.
pub fn separable_filter<P>(
    img: &ImageBuffer<P, Vec<f32>>,
    kernel: &[f32],
    border: Border,
) -> ImageBuffer<P, Vec<f32>>
where
    P: Pixel<Subpixel = f32>,
{
    let (width, height) = img.dimensions();
    let (w, h) = (width as usize, height as usize);
    let channels = usize::from(P::CHANNEL_COUNT);
    let radius = (kernel.len() / 2) as isize;
    let src: &[f32] = img;

    let mut rows = vec![0.0f32; src.len()];
    for y in 0..h {
        let line = y * w * channels;
        for x in 0..w {
            for c in 0..channels {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = border.index(x as isize + k as isize - radius, w);
                    acc += weight * src[line + sx * channels + c];
                }
                rows[line + x * channels + c] = acc;
            }
        }
    }

    let mut out: ImageBuffer<P, Vec<f32>> = ImageBuffer::new(width, height);
    let dst: &mut [f32] = &mut out;
    for y in 0..h {
        for x in 0..w {
            for c in 0..channels {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let sy = border.index(y as isize + k as isize - radius, h);
                    acc += weight * rows[(sy * w + x) * channels + c];
                }
                dst[(y * w + x) * channels + c] = acc;
            }
        }
    }
    out
}

/// Gaussian smoothing with the default truncation of four sigmas.
pub fn gaussian_blur<P>(img: &ImageBuffer<P, Vec<f32>>, sigma: f32, border: Border) -> ImageBuffer<P, Vec<f32>>
where
    P: Pixel<Subpixel = f32>,
{
    let kernel = gaussian_kernel(sigma, 4.0);
    match border {
        Border::Nearest => imageproc::filter::separable_filter_equal(img, &kernel),
        Border::Reflect | Border::Reflect101 => separable_filter(img, &kernel, border),
    }
}

/// 3x3 mean filter.
pub fn box_blur3<P>(img: &ImageBuffer<P, Vec<f32>>, border: Border) -> ImageBuffer<P, Vec<f32>>
where
    P: Pixel<Subpixel = f32>,
{
    separable_filter(img, &[1.0 / 3.0; 3], border)
}

/// Dense 2-D correlation with a square kernel anchored at its centre.
pub fn filter2d<P>(img: &ImageBuffer<P, Vec<f32>>, kernel: &Kernel, border: Border) -> ImageBuffer<P, Vec<f32>>
where
    P: Pixel<Subpixel = f32>,
{
    let (width, height) = img.dimensions();
    let (w, h) = (width as usize, height as usize);
    let channels = usize::from(P::CHANNEL_COUNT);
    let radius = (kernel.size / 2) as isize;
    let src: &[f32] = img;

    let mut out: ImageBuffer<P, Vec<f32>> = ImageBuffer::new(width, height);
    let dst: &mut [f32] = &mut out;
    for y in 0..h {
        for x in 0..w {
            for c in 0..channels {
                let mut acc = 0.0;
                for ky in 0..kernel.size {
                    let sy = border.index(y as isize + ky as isize - radius, h);
                    let row = &kernel.weights[ky * kernel.size..(ky + 1) * kernel.size];
                    for (kx, weight) in row.iter().enumerate() {
                        let sx = border.index(x as isize + kx as isize - radius, w);
                        acc += weight * src[(sy * w + sx) * channels + c];
                    }
                }
                dst[(y * w + x) * channels + c] = acc;
            }
        }
    }
    out
}
