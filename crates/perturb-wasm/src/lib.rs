//! WASM bindings для движка искажений
//!
//! Предоставляет JavaScript API для искажения кадров в браузере

use std::fmt::Display;
use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use perturb_core::{Corruption, Frame, PerturbConfig, Perturber};
use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;
use wasm_bindgen::Clamped;
use web_sys::ImageData;

/// Инициализация panic hook и логгера
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
    log::info!("Perturbation WASM module initialized");
}

fn js_error(e: impl Display) -> JsError {
    JsError::new(&e.to_string())
}

/// JavaScript-доступный диспетчер искажений
#[wasm_bindgen]
pub struct WasmPerturber {
    perturber: Perturber,
    rng: StdRng,
}

#[wasm_bindgen]
impl WasmPerturber {
    /// Создание диспетчера с заданным зерном генератора
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u32) -> Self {
        Self {
            perturber: Perturber::new(),
            rng: StdRng::seed_from_u64(u64::from(seed)),
        }
    }

    /// Создание диспетчера из JSON-конфигурации (`{"seed": 7}`)
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(json: &str) -> Result<WasmPerturber, JsError> {
        let config = PerturbConfig::from_json(json).map_err(js_error)?;
        let seed = config.seed;
        let perturber = Perturber::with_config(config).map_err(js_error)?;
        Ok(Self {
            perturber,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Добавление эталонной текстуры инея
    ///
    /// @param image_data - Uint8Array с PNG/JPEG текстурой
    #[wasm_bindgen(js_name = addFrostTexture)]
    pub fn add_frost_texture(&mut self, image_data: &[u8]) -> Result<(), JsError> {
        let texture = image::load_from_memory(image_data).map_err(js_error)?;
        self.perturber.add_frost_texture(texture.to_rgb8());
        Ok(())
    }

    /// Искажение закодированного кадра
    ///
    /// 16-битные одноканальные PNG обрабатываются как карты глубины.
    ///
    /// @param image_data - Uint8Array с данными изображения
    /// @param name - имя искажения, например "fog"
    /// @param severity - уровень от 1 до 5
    /// @returns Uint8Array с PNG
    #[wasm_bindgen(js_name = perturbImage)]
    pub fn perturb_image(&mut self, image_data: &[u8], name: &str, severity: i32) -> Result<Vec<u8>, JsError> {
        let frame = Frame::decode(image_data).map_err(js_error)?;
        let out = self
            .perturber
            .apply(name, &frame, i64::from(severity), &mut self.rng)
            .map_err(js_error)?;

        let mut png = Vec::new();
        out.into_dynamic()
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(js_error)?;
        Ok(png)
    }

    /// Искажение ImageData из Canvas; альфа-канал сохраняется
    #[wasm_bindgen(js_name = perturbImageData)]
    pub fn perturb_image_data(&mut self, data: &ImageData, name: &str, severity: i32) -> Result<ImageData, JsError> {
        let (width, height) = (data.width(), data.height());
        let rgba = data.data().0;
        if rgba.len() != (width * height * 4) as usize {
            return Err(JsError::new("ImageData buffer does not match its dimensions"));
        }

        let rgb = RgbImage::from_fn(width, height, |x, y| {
            let offset = ((y * width + x) * 4) as usize;
            Rgb([rgba[offset], rgba[offset + 1], rgba[offset + 2]])
        });
        let out = match self
            .perturber
            .apply(name, &Frame::Rgb(rgb), i64::from(severity), &mut self.rng)
            .map_err(js_error)?
        {
            Frame::Rgb(img) => img,
            Frame::Depth(_) => return Err(JsError::new("Depth corruptions need a 16-bit depth image")),
        };

        let mut pixels = Vec::with_capacity(rgba.len());
        for (i, px) in out.pixels().enumerate() {
            pixels.extend_from_slice(&[px.0[0], px.0[1], px.0[2], rgba[i * 4 + 3]]);
        }
        ImageData::new_with_u8_clamped_array_and_sh(Clamped(&pixels), width, height)
            .map_err(|e| JsError::new(&format!("{:?}", e)))
    }

    /// Каталог искажений: [{ name, family, input }]
    #[wasm_bindgen(js_name = listCorruptions)]
    pub fn list_corruptions(&self) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(&self.perturber.catalogue()).map_err(js_error)
    }
}

/// Имена всех искажений
#[wasm_bindgen(js_name = corruptionNames)]
pub fn corruption_names() -> js_sys::Array {
    Corruption::ALL.iter().map(|c| JsValue::from_str(c.name())).collect()
}

/// Информация о версии
#[wasm_bindgen(js_name = version)]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
