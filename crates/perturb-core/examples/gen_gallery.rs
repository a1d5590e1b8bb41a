//! Renders every corruption at every severity for a synthetic scene
//!
//! Usage: cargo run -p perturb-core --example gen_gallery [output_dir] [frost_dir]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{Luma, Rgb, RgbImage};
use perturb_core::{Corruption, DepthMap, Frame, FrameKind, PerturbConfig, Perturber, Severity};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let output_dir = PathBuf::from(args.next().unwrap_or_else(|| "gallery".to_string()));
    let frost_dir = args.next().map(PathBuf::from);

    fs::create_dir_all(&output_dir).with_context(|| format!("creating {:?}", output_dir))?;
    println!("Rendering gallery into {:?}", output_dir);

    let config = PerturbConfig { frost_dir, seed: 42, ..PerturbConfig::default() };
    let perturber = Perturber::with_config(config)?;
    let mut rng = StdRng::seed_from_u64(perturber.config().seed);

    let scene = Frame::Rgb(synthetic_scene(256, 192));
    let depth = Frame::Depth(synthetic_depth(256, 192));
    save(&scene, &output_dir, "clean_rgb.png")?;
    save(&depth, &output_dir, "clean_depth.png")?;

    let mut count = 0;
    for corruption in Corruption::ALL {
        let frame = match corruption.input() {
            FrameKind::Rgb => &scene,
            FrameKind::Depth => &depth,
        };
        for severity in Severity::all() {
            match perturber.apply_corruption(corruption, frame, severity, &mut rng) {
                Ok(out) => {
                    save(&out, &output_dir, &format!("{}_{}.png", corruption, severity))?;
                    count += 1;
                }
                Err(e) => eprintln!("Skipping {} at {}: {}", corruption, severity, e),
            }
        }
    }

    println!("Generated {} images.", count);
    Ok(())
}

fn synthetic_scene(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let tile = if (x / 32 + y / 32) % 2 == 0 { 60 } else { 190 };
        let sky = (255 * (height - y) / height) as u8;
        Rgb([tile, sky / 2 + 60, (x * 255 / width) as u8])
    })
}

fn synthetic_depth(width: u32, height: u32) -> DepthMap {
    DepthMap::from_fn(width, height, |x, y| {
        let near = x > width / 3 && x < 2 * width / 3 && y > height / 3;
        // 0.5 m box in front of a 2.5 m wall
        Luma([if near { 3277 } else { 16384 + (y * 20) as u16 }])
    })
}

fn save(frame: &Frame, dir: &Path, name: &str) -> Result<()> {
    let path = dir.join(name);
    frame.clone().into_dynamic().save(&path).with_context(|| format!("writing {:?}", path))
}
