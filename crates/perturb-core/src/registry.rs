//! Реестр искажений
//!
//! Каждое искажение - вариант [`Corruption`] с фиксированным именем,
//! семейством, типом входного кадра и указателем на оператор.

use std::fmt;
use std::str::FromStr;

use image::RgbImage;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::assets::FrostTextures;
use crate::depth;
use crate::motion::DirectionalBlur;
use crate::rgb::{blur, digital, noise, photometric, weather};
use crate::{DepthMap, PerturbError, Severity};

/// Тип кадра, который принимает оператор
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    Rgb,
    Depth,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::Rgb => write!(f, "RGB"),
            FrameKind::Depth => write!(f, "depth"),
        }
    }
}

/// Семейство искажений
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Identity,
    Noise,
    Blur,
    Weather,
    Photometric,
    Digital,
    Depth,
}

/// Все поддерживаемые искажения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corruption {
    None,
    GaussianNoise,
    GaussianNoiseStrong,
    ShotNoise,
    ImpulseNoise,
    SpeckleNoise,
    GaussianBlur,
    GlassBlur,
    DefocusBlur,
    MotionBlur,
    ZoomBlur,
    Fog,
    Frost,
    Snow,
    Spatter,
    Contrast,
    Brightness,
    Saturate,
    JpegCompression,
    Pixelate,
    ElasticTransform,
    DepthAddGaussianNoise,
    DepthAddEdgeErosion,
    DepthAddRandomMask,
    DepthAddFixedMask,
    DepthRange,
}

/// Описание искажения для каталога
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorruptionInfo {
    pub name: &'static str,
    pub family: Family,
    pub input: FrameKind,
}

/// Общие ресурсы, доступные RGB-операторам
pub struct Context<'a> {
    pub rng: &'a mut dyn RngCore,
    pub frost: &'a FrostTextures,
    pub blur: &'a dyn DirectionalBlur,
}

pub type RgbOperator = fn(&RgbImage, Severity, &mut Context<'_>) -> Result<RgbImage, PerturbError>;
pub type DepthOperator = fn(&DepthMap, Severity, &mut dyn RngCore) -> DepthMap;

/// Оператор, разрешённый по варианту реестра
#[derive(Clone, Copy)]
pub enum Operator {
    Identity,
    Rgb(RgbOperator),
    Depth(DepthOperator),
}

impl Corruption {
    pub const ALL: [Corruption; 26] = [
        Corruption::None,
        Corruption::GaussianNoise,
        Corruption::GaussianNoiseStrong,
        Corruption::ShotNoise,
        Corruption::ImpulseNoise,
        Corruption::SpeckleNoise,
        Corruption::GaussianBlur,
        Corruption::GlassBlur,
        Corruption::DefocusBlur,
        Corruption::MotionBlur,
        Corruption::ZoomBlur,
        Corruption::Fog,
        Corruption::Frost,
        Corruption::Snow,
        Corruption::Spatter,
        Corruption::Contrast,
        Corruption::Brightness,
        Corruption::Saturate,
        Corruption::JpegCompression,
        Corruption::Pixelate,
        Corruption::ElasticTransform,
        Corruption::DepthAddGaussianNoise,
        Corruption::DepthAddEdgeErosion,
        Corruption::DepthAddRandomMask,
        Corruption::DepthAddFixedMask,
        Corruption::DepthRange,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Corruption::None => "none",
            Corruption::GaussianNoise => "gaussian_noise",
            Corruption::GaussianNoiseStrong => "gaussian_noise_strong",
            Corruption::ShotNoise => "shot_noise",
            Corruption::ImpulseNoise => "impulse_noise",
            Corruption::SpeckleNoise => "speckle_noise",
            Corruption::GaussianBlur => "gaussian_blur",
            Corruption::GlassBlur => "glass_blur",
            Corruption::DefocusBlur => "defocus_blur",
            Corruption::MotionBlur => "motion_blur",
            Corruption::ZoomBlur => "zoom_blur",
            Corruption::Fog => "fog",
            Corruption::Frost => "frost",
            Corruption::Snow => "snow",
            Corruption::Spatter => "spatter",
            Corruption::Contrast => "contrast",
            Corruption::Brightness => "brightness",
            Corruption::Saturate => "saturate",
            Corruption::JpegCompression => "jpeg_compression",
            Corruption::Pixelate => "pixelate",
            Corruption::ElasticTransform => "elastic_transform",
            Corruption::DepthAddGaussianNoise => "depth_add_gaussian_noise",
            Corruption::DepthAddEdgeErosion => "depth_add_edge_erosion",
            Corruption::DepthAddRandomMask => "depth_add_random_mask",
            Corruption::DepthAddFixedMask => "depth_add_fixed_mask",
            Corruption::DepthRange => "depth_range",
        }
    }

    pub fn family(self) -> Family {
        use Corruption::*;
        match self {
            None => Family::Identity,
            GaussianNoise | GaussianNoiseStrong | ShotNoise | ImpulseNoise | SpeckleNoise => Family::Noise,
            GaussianBlur | GlassBlur | DefocusBlur | MotionBlur | ZoomBlur => Family::Blur,
            Fog | Frost | Snow | Spatter => Family::Weather,
            Contrast | Brightness | Saturate => Family::Photometric,
            JpegCompression | Pixelate | ElasticTransform => Family::Digital,
            DepthAddGaussianNoise | DepthAddEdgeErosion | DepthAddRandomMask | DepthAddFixedMask | DepthRange => {
                Family::Depth
            }
        }
    }

    /// Тип кадра на входе; тождественное искажение принимает любой
    pub fn input(self) -> FrameKind {
        match self.family() {
            Family::Depth => FrameKind::Depth,
            _ => FrameKind::Rgb,
        }
    }

    pub fn info(self) -> CorruptionInfo {
        CorruptionInfo {
            name: self.name(),
            family: self.family(),
            input: self.input(),
        }
    }

    pub fn operator(self) -> Operator {
        match self {
            Corruption::None => Operator::Identity,

            Corruption::GaussianNoise => {
                Operator::Rgb(|img, s, ctx| Ok(noise::gaussian_noise(img, s, &mut *ctx.rng)))
            }
            Corruption::GaussianNoiseStrong => {
                Operator::Rgb(|img, s, ctx| Ok(noise::gaussian_noise_strong(img, s, &mut *ctx.rng)))
            }
            Corruption::ShotNoise => Operator::Rgb(|img, s, ctx| Ok(noise::shot_noise(img, s, &mut *ctx.rng))),
            Corruption::ImpulseNoise => Operator::Rgb(|img, s, ctx| Ok(noise::impulse_noise(img, s, &mut *ctx.rng))),
            Corruption::SpeckleNoise => Operator::Rgb(|img, s, ctx| Ok(noise::speckle_noise(img, s, &mut *ctx.rng))),

            Corruption::GaussianBlur => Operator::Rgb(|img, s, _| Ok(blur::gaussian_blur(img, s))),
            Corruption::GlassBlur => Operator::Rgb(|img, s, ctx| Ok(blur::glass_blur(img, s, &mut *ctx.rng))),
            Corruption::DefocusBlur => Operator::Rgb(|img, s, _| Ok(blur::defocus_blur(img, s))),
            Corruption::MotionBlur => {
                Operator::Rgb(|img, s, ctx| Ok(blur::motion_blur(img, s, ctx.blur, &mut *ctx.rng)))
            }
            Corruption::ZoomBlur => Operator::Rgb(|img, s, _| Ok(blur::zoom_blur(img, s))),

            Corruption::Fog => Operator::Rgb(|img, s, ctx| weather::fog(img, s, &mut *ctx.rng)),
            Corruption::Frost => Operator::Rgb(|img, s, ctx| weather::frost(img, s, ctx.frost, &mut *ctx.rng)),
            Corruption::Snow => Operator::Rgb(|img, s, ctx| Ok(weather::snow(img, s, ctx.blur, &mut *ctx.rng))),
            Corruption::Spatter => Operator::Rgb(|img, s, ctx| Ok(weather::spatter(img, s, &mut *ctx.rng))),

            Corruption::Contrast => Operator::Rgb(|img, s, _| Ok(photometric::contrast(img, s))),
            Corruption::Brightness => Operator::Rgb(|img, s, _| Ok(photometric::brightness(img, s))),
            Corruption::Saturate => Operator::Rgb(|img, s, _| Ok(photometric::saturate(img, s))),

            Corruption::JpegCompression => Operator::Rgb(|img, s, _| digital::jpeg_compression(img, s)),
            Corruption::Pixelate => Operator::Rgb(|img, s, _| Ok(digital::pixelate(img, s))),
            Corruption::ElasticTransform => {
                Operator::Rgb(|img, s, ctx| digital::elastic_transform(img, s, &mut *ctx.rng))
            }

            Corruption::DepthAddGaussianNoise => Operator::Depth(|d, s, rng| depth::depth_add_gaussian_noise(d, s, rng)),
            Corruption::DepthAddEdgeErosion => Operator::Depth(|d, s, rng| depth::depth_add_edge_erosion(d, s, rng)),
            Corruption::DepthAddRandomMask => Operator::Depth(|d, s, rng| depth::depth_add_random_mask(d, s, rng)),
            Corruption::DepthAddFixedMask => Operator::Depth(|d, s, _| depth::depth_add_fixed_mask(d, s)),
            Corruption::DepthRange => Operator::Depth(|d, s, _| depth::depth_range(d, s)),
        }
    }
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Corruption {
    type Err = PerturbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Corruption::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| PerturbError::UnknownCorruption(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_roundtrip() {
        for c in Corruption::ALL {
            assert_eq!(c.name().parse::<Corruption>().unwrap(), c);
        }
    }

    #[test]
    fn test_names_unique() {
        let names: HashSet<&str> = Corruption::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), Corruption::ALL.len());
    }

    #[test]
    fn test_unknown_name() {
        let err = "haze".parse::<Corruption>().unwrap_err();
        assert!(matches!(err, PerturbError::UnknownCorruption(ref name) if name == "haze"));
    }

    #[test]
    fn test_serde_matches_name() {
        for c in Corruption::ALL {
            let json = serde_json::to_string(&c).unwrap();
            assert_eq!(json, format!("\"{}\"", c.name()));
        }
    }

    #[test]
    fn test_operator_kind_matches_input() {
        for c in Corruption::ALL {
            match (c.operator(), c.input()) {
                (Operator::Identity, _) => assert_eq!(c, Corruption::None),
                (Operator::Rgb(_), kind) => assert_eq!(kind, FrameKind::Rgb),
                (Operator::Depth(_), kind) => assert_eq!(kind, FrameKind::Depth),
            }
        }
    }

    #[test]
    fn test_family_counts() {
        let count = |family| Corruption::ALL.iter().filter(|c| c.family() == family).count();
        assert_eq!(count(Family::Noise), 5);
        assert_eq!(count(Family::Blur), 5);
        assert_eq!(count(Family::Weather), 4);
        assert_eq!(count(Family::Depth), 5);
    }
}
