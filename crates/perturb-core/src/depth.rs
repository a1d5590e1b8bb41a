//! Искажения карт глубины
//!
//! Карта глубины - одноканальное 16-битное изображение, ноль означает
//! отсутствие измерения. Все операторы возвращают карту тех же размеров.

use image::{GrayImage, Luma};
use imageproc::edges::canny;
use rand::seq::index;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::{DepthMap, Severity};

const GAUSSIAN_NOISE: [f64; 5] = [0.1, 0.2, 0.3, 0.4, 0.5];
/// (доля краевых пикселей, полуширина пятна)
const EDGE_EROSION: [(f64, u32); 5] = [(0.015, 3), (0.02, 3), (0.025, 3), (0.03, 3), (0.035, 3)];
const MASK_COUNT: [usize; 5] = [5, 7, 9, 11, 13];
/// Допустимый диапазон, метры
const DEPTH_RANGE: [(f64, f64); 5] = [(0.2, 3.0), (0.3, 3.2), (0.4, 3.4), (0.5, 3.6), (0.6, 3.8)];

/// Единиц датчика на метр
pub const DEPTH_SCALE: f64 = 6553.5;

/// Размер маски относительно кадра по каждой оси
const MASK_SCALE: f64 = 0.1;
const MAX_PLACEMENT_ATTEMPTS: usize = 32;

/// Ячейки сетки 10x10 (строка, столбец), нумерация с единицы
const FIXED_MASK_CELLS: [(u32, u32); 13] = [
    (1, 1),
    (3, 1),
    (5, 1),
    (7, 1),
    (1, 3),
    (1, 5),
    (1, 7),
    (3, 3),
    (5, 5),
    (9, 9),
    (9, 1),
    (1, 9),
    (7, 7),
];

const EROSION_CANNY: (f32, f32) = (20.0, 50.0);

/// Прямоугольник маски: верхний левый угол и размер в пикселях
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Patch {
    row: u32,
    col: u32,
    rows: u32,
    cols: u32,
}

impl Patch {
    fn overlaps(&self, other: &Patch) -> bool {
        self.row < other.row + other.rows
            && other.row < self.row + self.rows
            && self.col < other.col + other.cols
            && other.col < self.col + self.cols
    }
}

/// Аддитивный шум `N(c * mean, c * std)` по статистикам самой карты
pub fn depth_add_gaussian_noise<R: Rng + ?Sized>(depth: &DepthMap, severity: Severity, rng: &mut R) -> DepthMap {
    let c = severity.pick(&GAUSSIAN_NOISE);
    let (mean, std) = statistics(depth);
    let (mean, std) = (mean * c, std * c);
    log::debug!("depth_add_gaussian_noise: mean {:.1}, std {:.1}", mean, std);

    let mut out = depth.clone();
    for v in out.iter_mut() {
        let z: f64 = rng.sample(StandardNormal);
        // Negative noise does not fit the unsigned domain
        let noise = (mean + std * z).max(0.0) as u16;
        *v = v.saturating_add(noise);
    }
    out
}

/// Стирание глубины на краях и вокруг случайной доли краевых пикселей
pub fn depth_add_edge_erosion<R: Rng + ?Sized>(depth: &DepthMap, severity: Severity, rng: &mut R) -> DepthMap {
    let (rate, patch) = severity.pick(&EDGE_EROSION);

    let edges = canny(&normalize_u8(depth), EROSION_CANNY.0, EROSION_CANNY.1);
    let edge_pixels: Vec<(u32, u32)> = edges
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > 0)
        .map(|(col, row, _)| (row, col))
        .collect();

    let mut mask = edges.clone();
    let amount = (edge_pixels.len() as f64 * rate) as usize;
    let mut eroded = 0;
    for i in index::sample(rng, edge_pixels.len(), amount) {
        let (row, col) = edge_pixels[i];
        if erode_patch(&mut mask, row, col, patch) {
            eroded += 1;
        }
    }
    log::debug!(
        "depth_add_edge_erosion: {} edge pixels, {} of {} patches applied",
        edge_pixels.len(),
        eroded,
        amount
    );

    let mut out = depth.clone();
    for (v, m) in out.iter_mut().zip(mask.iter()) {
        if *m > 0 {
            *v = 0;
        }
    }
    out
}

/// Закрашивает окно `[row - p, row + p) x [col - p, col + p)`
///
/// Окно, выходящее за верхний или левый край, пропускается целиком;
/// за нижним и правым краем оно обрезается.
fn erode_patch(mask: &mut GrayImage, row: u32, col: u32, patch: u32) -> bool {
    if row < patch || col < patch {
        return false;
    }
    let (width, height) = mask.dimensions();
    for r in row - patch..(row + patch).min(height) {
        for c in col - patch..(col + patch).min(width) {
            mask.put_pixel(c, r, Luma([1]));
        }
    }
    true
}

/// Прямоугольные окклюзии в случайных местах
///
/// Позиции подбираются без пересечений за ограниченное число попыток;
/// если свободного места не нашлось, патч кладётся с пересечением.
pub fn depth_add_random_mask<R: Rng + ?Sized>(depth: &DepthMap, severity: Severity, rng: &mut R) -> DepthMap {
    let count = severity.pick(&MASK_COUNT);
    let (rows, cols) = patch_size(depth);
    let (width, height) = depth.dimensions();

    let mut placed: Vec<Patch> = Vec::with_capacity(count);
    for _ in 0..count {
        let mut candidate = random_patch(height, width, rows, cols, rng);
        let mut attempts = 1;
        while placed.iter().any(|p| p.overlaps(&candidate)) && attempts < MAX_PLACEMENT_ATTEMPTS {
            candidate = random_patch(height, width, rows, cols, rng);
            attempts += 1;
        }
        if placed.iter().any(|p| p.overlaps(&candidate)) {
            log::warn!(
                "depth_add_random_mask: no free position after {} attempts, accepting overlap",
                attempts
            );
        }
        placed.push(candidate);
    }

    apply_patches(depth, &placed)
}

/// Прямоугольные окклюзии по фиксированной сетке, без случайности
pub fn depth_add_fixed_mask(depth: &DepthMap, severity: Severity) -> DepthMap {
    let count = severity.pick(&MASK_COUNT);
    let (rows, cols) = patch_size(depth);

    let patches: Vec<Patch> = FIXED_MASK_CELLS[..count]
        .iter()
        .map(|&(r, c)| Patch { row: (r - 1) * rows, col: (c - 1) * cols, rows, cols })
        .collect();
    apply_patches(depth, &patches)
}

/// Обнуление значений вне диапазона `[min, max]` метров
pub fn depth_range(depth: &DepthMap, severity: Severity) -> DepthMap {
    let (min, max) = severity.pick(&DEPTH_RANGE);
    let mut out = depth.clone();
    for v in out.iter_mut() {
        let metres = f64::from(*v) / DEPTH_SCALE;
        if metres < min || metres > max {
            *v = 0;
        }
    }
    out
}

/// Среднее и стандартное отклонение генеральной совокупности
fn statistics(depth: &DepthMap) -> (f64, f64) {
    let n = depth.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let n = n as f64;
    let mean = depth.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
    let variance = depth.iter().map(|&v| (f64::from(v) - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Линейное растяжение `[min, max]` в `[0, 255]` с округлением
fn normalize_u8(depth: &DepthMap) -> GrayImage {
    let min = depth.iter().copied().min().unwrap_or(0);
    let max = depth.iter().copied().max().unwrap_or(0);
    let range = f64::from(max - min);

    let (width, height) = depth.dimensions();
    GrayImage::from_fn(width, height, |col, row| {
        if range == 0.0 {
            return Luma([0]);
        }
        let v = f64::from(depth.get_pixel(col, row).0[0] - min) * 255.0 / range;
        Luma([v.round() as u8])
    })
}

/// Размер патча (строки, столбцы): десятая часть кадра
fn patch_size(depth: &DepthMap) -> (u32, u32) {
    let (width, height) = depth.dimensions();
    (
        (f64::from(height) * MASK_SCALE) as u32,
        (f64::from(width) * MASK_SCALE) as u32,
    )
}

fn random_patch<R: Rng + ?Sized>(height: u32, width: u32, rows: u32, cols: u32, rng: &mut R) -> Patch {
    let row_span = height - rows;
    let col_span = width - cols;
    let row = if row_span > 0 { rng.gen_range(0..row_span) } else { 0 };
    let col = if col_span > 0 { rng.gen_range(0..col_span) } else { 0 };
    Patch { row, col, rows, cols }
}

fn apply_patches(depth: &DepthMap, patches: &[Patch]) -> DepthMap {
    let (width, height) = depth.dimensions();
    let mut out = depth.clone();
    for p in patches {
        for row in p.row..(p.row + p.rows).min(height) {
            for col in p.col..(p.col + p.cols).min(width) {
                out.put_pixel(col, row, Luma([0]));
            }
        }
    }
    out
}
