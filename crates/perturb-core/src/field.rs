//! Plasma fractal (diamond-square) height fields.
//!
//! Neighbour lookups wrap around the grid edges in both phases, so the field
//! tiles seamlessly. The displacement at each step is `wibble * U(-wibble, wibble)`
//! and `wibble` is divided by `decay` after every full step. A `decay` that would
//! push the accumulated displacement past the `f64` range is rejected.

use image::Luma;
use rand::Rng;

use crate::{GrayF32Image, PerturbError};

const INITIAL_WIBBLE: f64 = 100.0;
/// Bound on the accumulated displacement; four such values still sum finitely.
const DISPLACEMENT_LIMIT: f64 = f64::MAX / 16.0;

/// Generates a `size x size` field normalized to `[0, 1]`.
///
/// `size` must be a power of two and at least 2.
pub fn plasma_fractal<R: Rng + ?Sized>(
    size: usize,
    decay: f64,
    rng: &mut R,
) -> Result<GrayF32Image, PerturbError> {
    if size < 2 || !size.is_power_of_two() {
        return Err(PerturbError::InvalidFieldSize(size));
    }
    if !(decay > 0.0 && decay.is_finite()) {
        return Err(PerturbError::InvalidDecay(decay));
    }

    let mut map = vec![0.0f64; size * size];
    let at = |row: usize, col: usize| row * size + col;
    let mut step = size;
    let mut wibble = INITIAL_WIBBLE;
    let mut bound = 0.0f64;

    while step >= 2 {
        bound += wibble * wibble;
        if bound >= DISPLACEMENT_LIMIT {
            return Err(PerturbError::InvalidDecay(decay));
        }
        let half = step / 2;
        let cells = size / step;

        // Squares: centre of each cell from its four corners
        for i in 0..cells {
            for j in 0..cells {
                let (i1, j1) = ((i + 1) % cells, (j + 1) % cells);
                let sum = map[at(i * step, j * step)]
                    + map[at(i1 * step, j * step)]
                    + map[at(i * step, j1 * step)]
                    + map[at(i1 * step, j1 * step)];
                map[at(i * step + half, j * step + half)] = wibbled_mean(sum, wibble, rng);
            }
        }

        // Diamonds on horizontal edges: left/right corners, centres above/below
        for i in 0..cells {
            for j in 0..cells {
                let above = (i + cells - 1) % cells;
                let right = (j + 1) % cells;
                let sum = map[at(i * step + half, j * step + half)]
                    + map[at(above * step + half, j * step + half)]
                    + map[at(i * step, j * step)]
                    + map[at(i * step, right * step)];
                map[at(i * step, j * step + half)] = wibbled_mean(sum, wibble, rng);
            }
        }

        // Diamonds on vertical edges: top/bottom corners, centres left/right
        for i in 0..cells {
            for j in 0..cells {
                let left = (j + cells - 1) % cells;
                let below = (i + 1) % cells;
                let sum = map[at(i * step + half, j * step + half)]
                    + map[at(i * step + half, left * step + half)]
                    + map[at(i * step, j * step)]
                    + map[at(below * step, j * step)];
                map[at(i * step + half, j * step)] = wibbled_mean(sum, wibble, rng);
            }
        }

        step /= 2;
        wibble /= decay;
    }

    let min = map.iter().copied().fold(f64::INFINITY, f64::min);
    let max = map.iter().copied().fold(f64::NEG_INFINITY, f64::max) - min;
    let side = size as u32;
    Ok(GrayF32Image::from_fn(side, side, |x, y| {
        let v = map[at(y as usize, x as usize)] - min;
        Luma([if max > 0.0 { (v / max) as f32 } else { 0.0 }])
    }))
}

fn wibbled_mean<R: Rng + ?Sized>(sum: f64, wibble: f64, rng: &mut R) -> f64 {
    // Underflowed wibble leaves an empty range
    if wibble == 0.0 {
        return sum / 4.0;
    }
    sum / 4.0 + wibble * rng.gen_range(-wibble..wibble)
}
