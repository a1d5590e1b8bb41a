//! Perturb Core - движок искажений изображений для стресс-тестов SLAM
//!
//! Библиотека синтезирует контролируемые искажения RGB-кадров и карт глубины
//! на пяти уровнях интенсивности:
//! - Шумы (гауссов, дробовой, импульсный, спекл)
//! - Размытия (гауссово, стекло, расфокус, движение, зум)
//! - Погода и композитинг (туман, иней, снег, брызги)
//! - Фотометрия и цифровые артефакты (контраст, яркость, JPEG, пиксели, эластика)
//! - Искажения сенсора глубины (шум, эрозия краёв, маски, диапазон)

pub mod assets;
pub mod color;
pub mod depth;
pub mod field;
pub mod filter;
pub mod geometry;
pub mod loader;
pub mod motion;
pub mod registry;
pub mod resample;
pub mod rgb;
pub mod severity;

mod batch;

pub use assets::FrostTextures;
pub use motion::{DirectionalBlur, MotionBlur};
pub use registry::{Context, Corruption, CorruptionInfo, Family, FrameKind, Operator};
pub use severity::Severity;

use std::path::PathBuf;

use image::{DynamicImage, ImageBuffer, Luma, RgbImage};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Карта глубины: 16-битные дальности, ноль означает «нет данных»
pub type DepthMap = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Одноканальное float-поле (шумовые слои, маски, фрактал)
pub type GrayF32Image = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Основные ошибки модуля
#[derive(Error, Debug)]
pub enum PerturbError {
    #[error("Severity {0} is out of range 1..=5")]
    SeverityOutOfRange(i64),

    #[error("Unknown corruption: {0}")]
    UnknownCorruption(String),

    #[error("{corruption} expects a {expected} frame, got {actual}")]
    FrameMismatch {
        corruption: Corruption,
        expected: FrameKind,
        actual: FrameKind,
    },

    #[error("Fractal size {0} is not a power of two >= 2")]
    InvalidFieldSize(usize),

    #[error("Fractal decay {0} is out of range")]
    InvalidDecay(f64),

    #[error("No frost textures loaded")]
    MissingFrostTexture,

    #[error("Affine control points are degenerate")]
    DegenerateAffine,

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid timestamp at line {line}: {value:?}")]
    Timestamp { line: usize, value: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Кадр на входе и выходе диспетчера
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Rgb(RgbImage),
    Depth(DepthMap),
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Rgb(_) => FrameKind::Rgb,
            Frame::Depth(_) => FrameKind::Depth,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Frame::Rgb(img) => img.dimensions(),
            Frame::Depth(depth) => depth.dimensions(),
        }
    }

    /// 16-битные одноканальные изображения считаются глубиной, всё остальное - RGB
    pub fn from_dynamic(img: DynamicImage) -> Self {
        match img {
            DynamicImage::ImageLuma16(depth) => Frame::Depth(depth),
            other => Frame::Rgb(other.to_rgb8()),
        }
    }

    pub fn into_dynamic(self) -> DynamicImage {
        match self {
            Frame::Rgb(img) => DynamicImage::ImageRgb8(img),
            Frame::Depth(depth) => DynamicImage::ImageLuma16(depth),
        }
    }

    /// Декодирование кадра из байтов (PNG, JPEG)
    pub fn decode(bytes: &[u8]) -> Result<Self, PerturbError> {
        Ok(Self::from_dynamic(image::load_from_memory(bytes)?))
    }
}

/// Конфигурация движка
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerturbConfig {
    /// Каталог с эталонными текстурами инея
    pub frost_dir: Option<PathBuf>,
    /// Базовое зерно для пакетной обработки (элемент i получает seed + i)
    pub seed: u64,
    /// Обрабатывать пакеты параллельно
    pub parallel: bool,
}

impl Default for PerturbConfig {
    fn default() -> Self {
        Self {
            frost_dir: None,
            seed: 0,
            parallel: true,
        }
    }
}

impl PerturbConfig {
    pub fn from_json(json: &str) -> Result<Self, PerturbError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Главный диспетчер искажений
pub struct Perturber {
    config: PerturbConfig,
    frost: FrostTextures,
    blur: Box<dyn DirectionalBlur>,
}

impl Default for Perturber {
    fn default() -> Self {
        Self::new()
    }
}

impl Perturber {
    /// Создание диспетчера с настройками по умолчанию (без текстур инея)
    pub fn new() -> Self {
        Self {
            config: PerturbConfig::default(),
            frost: FrostTextures::default(),
            blur: Box::new(MotionBlur),
        }
    }

    /// Создание диспетчера с пользовательскими настройками
    pub fn with_config(config: PerturbConfig) -> Result<Self, PerturbError> {
        let frost = match &config.frost_dir {
            Some(dir) => FrostTextures::load_dir(dir)?,
            None => FrostTextures::default(),
        };

        Ok(Self {
            config,
            frost,
            blur: Box::new(MotionBlur),
        })
    }

    /// Подмена примитива направленного размытия
    pub fn with_blur(mut self, blur: impl DirectionalBlur + 'static) -> Self {
        self.blur = Box::new(blur);
        self
    }

    pub fn with_frost_textures(mut self, frost: FrostTextures) -> Self {
        self.frost = frost;
        self
    }

    pub fn add_frost_texture(&mut self, texture: RgbImage) {
        self.frost.push(texture);
    }

    pub fn config(&self) -> &PerturbConfig {
        &self.config
    }

    /// Список всех зарегистрированных искажений
    pub fn catalogue(&self) -> Vec<CorruptionInfo> {
        Corruption::ALL.iter().map(|c| c.info()).collect()
    }

    /// Применение искажения по имени
    pub fn apply<R: RngCore>(
        &self,
        name: &str,
        frame: &Frame,
        severity: i64,
        rng: &mut R,
    ) -> Result<Frame, PerturbError> {
        let severity = Severity::new(severity)?;
        let corruption: Corruption = name.parse()?;
        self.apply_corruption(corruption, frame, severity, rng)
    }

    /// Применение уже разрешённого искажения
    pub fn apply_corruption(
        &self,
        corruption: Corruption,
        frame: &Frame,
        severity: Severity,
        rng: &mut dyn RngCore,
    ) -> Result<Frame, PerturbError> {
        log::debug!(
            "Applying {} at severity {} to {:?} frame {:?}",
            corruption,
            severity,
            frame.kind(),
            frame.dimensions()
        );

        let mismatch = || PerturbError::FrameMismatch {
            corruption,
            expected: corruption.input(),
            actual: frame.kind(),
        };

        match (corruption.operator(), frame) {
            (Operator::Identity, _) => Ok(frame.clone()),
            (Operator::Rgb(op), Frame::Rgb(img)) => {
                let mut ctx = Context {
                    rng,
                    frost: &self.frost,
                    blur: self.blur.as_ref(),
                };
                op(img, severity, &mut ctx).map(Frame::Rgb)
            }
            (Operator::Depth(op), Frame::Depth(depth)) => Ok(Frame::Depth(op(depth, severity, rng))),
            _ => Err(mismatch()),
        }
    }
}

/// Удобная функция для разового вызова с диспетчером по умолчанию
pub fn apply<R: RngCore>(
    name: &str,
    frame: &Frame,
    severity: i64,
    rng: &mut R,
) -> Result<Frame, PerturbError> {
    Perturber::new().apply(name, frame, severity, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_frame_kind_detection() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let depth = DynamicImage::ImageLuma16(DepthMap::new(4, 4));
        assert_eq!(Frame::from_dynamic(rgb).kind(), FrameKind::Rgb);
        assert_eq!(Frame::from_dynamic(depth).kind(), FrameKind::Depth);
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config = PerturbConfig::from_json(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert!(config.parallel);
        assert!(config.frost_dir.is_none());
    }

    #[test]
    fn test_identity_keeps_frame() {
        let perturber = Perturber::new();
        let frame = Frame::Rgb(RgbImage::from_pixel(8, 8, Rgb([10, 20, 30])));
        let mut rng = StdRng::seed_from_u64(1);
        let out = perturber.apply("none", &frame, 3, &mut rng).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn test_depth_operator_rejects_rgb() {
        let perturber = Perturber::new();
        let frame = Frame::Rgb(RgbImage::new(8, 8));
        let mut rng = StdRng::seed_from_u64(1);
        let err = perturber.apply("depth_range", &frame, 1, &mut rng).unwrap_err();
        assert!(matches!(err, PerturbError::FrameMismatch { .. }));
    }
}
