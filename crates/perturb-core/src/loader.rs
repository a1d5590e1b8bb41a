//! Загрузка кадров и временных меток из каталога датасета
//!
//! Файлы перебираются в порядке имён, без рекурсии. Нечитаемые файлы
//! пропускаются; ошибка возвращается только при недоступном каталоге.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::RgbImage;
use walkdir::WalkDir;

use crate::{DepthMap, PerturbError};

const PROGRESS_EVERY: usize = 200;
const RGB_PREFIX: &str = "frame";
const DEPTH_PREFIX: &str = "depth";

/// Файлы каталога (без подкаталогов), отсортированные по имени
pub fn list_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, PerturbError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir.as_ref())
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Все читаемые изображения каталога как RGB
pub fn load_images_from_folder(dir: impl AsRef<Path>) -> Result<Vec<RgbImage>, PerturbError> {
    let mut images = Vec::new();
    for (i, path) in list_files(dir)?.iter().enumerate() {
        report_progress(i);
        if is_npy(path) {
            log::warn!("Skipping {:?}: raw .npy arrays are not supported", path);
            continue;
        }
        if let Some(img) = decode(path) {
            images.push(img.to_rgb8());
        }
    }
    log::info!("Loaded {} images", images.len());
    Ok(images)
}

/// RGB-кадры (`frame*`) и карты глубины (`depth*`) из одного каталога
pub fn load_rgbd_from_folder(dir: impl AsRef<Path>) -> Result<(Vec<RgbImage>, Vec<DepthMap>), PerturbError> {
    let mut frames = Vec::new();
    let mut depths = Vec::new();

    for (i, path) in list_files(dir)?.iter().enumerate() {
        report_progress(i);
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let is_rgb = name.starts_with(RGB_PREFIX);
        let is_depth = name.starts_with(DEPTH_PREFIX);
        if !is_rgb && !is_depth {
            continue;
        }
        if let Some(img) = decode(path) {
            if is_rgb {
                frames.push(img.to_rgb8());
            } else {
                depths.push(img.into_luma16());
            }
        }
    }
    log::info!("Loaded {} RGB frames and {} depth maps", frames.len(), depths.len());
    Ok((frames, depths))
}

/// Карты глубины каталога в исходной 16-битной точности
pub fn load_depth_from_folder(dir: impl AsRef<Path>) -> Result<Vec<DepthMap>, PerturbError> {
    let mut depths = Vec::new();
    for (i, path) in list_files(dir)?.iter().enumerate() {
        report_progress(i);
        if is_npy(path) {
            log::warn!("Skipping {:?}: raw .npy arrays are not supported", path);
            continue;
        }
        if let Some(img) = decode(path) {
            depths.push(img.into_luma16());
        }
    }
    log::info!("Loaded {} depth maps", depths.len());
    Ok(depths)
}

/// Временные метки, по одной на строку; пустые строки игнорируются
pub fn load_timestamps_from_file(path: impl AsRef<Path>) -> Result<Vec<f64>, PerturbError> {
    let text = fs::read_to_string(path)?;
    let mut stamps = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let value = line.trim();
        if value.is_empty() {
            continue;
        }
        let stamp = value.parse::<f64>().map_err(|_| PerturbError::Timestamp {
            line: i + 1,
            value: value.to_string(),
        })?;
        stamps.push(stamp);
    }
    Ok(stamps)
}

fn decode(path: &Path) -> Option<image::DynamicImage> {
    match image::open(path) {
        Ok(img) => Some(img),
        Err(e) => {
            log::debug!("Skipping {:?}: {}", path, e);
            None
        }
    }
}

fn is_npy(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("npy")
}

fn report_progress(index: usize) {
    if index % PROGRESS_EVERY == 0 {
        log::info!("Loading entry {}", index);
    }
}
