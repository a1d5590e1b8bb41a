//! Эталонные текстуры инея для оператора `frost`
//!
//! Текстуры не генерируются: их поставляют файлами рядом с данными.

use std::path::Path;

use image::RgbImage;
use rand::Rng;

use crate::PerturbError;

/// Канонические имена файлов текстур
pub const FROST_FILES: [&str; 6] = [
    "frost1.png",
    "frost2.png",
    "frost3.png",
    "frost4.jpg",
    "frost5.jpg",
    "frost6.jpg",
];

/// Выбор идёт только среди первых пяти текстур набора
const FROST_CHOICES: usize = 5;

/// Набор текстур инея, адресуемых по индексу
#[derive(Debug, Clone, Default)]
pub struct FrostTextures {
    textures: Vec<RgbImage>,
}

impl FrostTextures {
    pub fn from_images(textures: Vec<RgbImage>) -> Self {
        Self { textures }
    }

    /// Загрузка канонического набора из каталога
    ///
    /// Отсутствующие файлы пропускаются с предупреждением; ошибки
    /// декодирования существующих файлов возвращаются.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, PerturbError> {
        let dir = dir.as_ref();
        let mut textures = Vec::with_capacity(FROST_FILES.len());

        for name in FROST_FILES {
            let path = dir.join(name);
            if !path.is_file() {
                log::warn!("Frost texture {:?} not found, skipping", path);
                continue;
            }
            textures.push(image::open(&path)?.to_rgb8());
        }

        log::info!("Loaded {} frost textures from {:?}", textures.len(), dir);
        Ok(Self { textures })
    }

    pub fn push(&mut self, texture: RgbImage) {
        self.textures.push(texture);
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RgbImage> {
        self.textures.get(index)
    }

    /// Случайная текстура; `None`, если набор пуст
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&RgbImage> {
        let choices = self.textures.len().min(FROST_CHOICES);
        if choices == 0 {
            return None;
        }
        let index = rng.gen_range(0..choices);
        log::debug!("Frost texture #{} selected", index);
        self.textures.get(index)
    }
}
