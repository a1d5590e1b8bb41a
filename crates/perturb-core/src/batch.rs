//! Пакетное применение искажения
//!
//! Каждый кадр получает собственный генератор `StdRng` с зерном
//! `seed + index`, поэтому результат не зависит от порядка обработки.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::{Corruption, Frame, PerturbError, Perturber, Severity};

impl Perturber {
    /// Применение искажения ко всем кадрам пакета
    pub fn apply_batch(&self, frames: &[Frame], name: &str, severity: i64) -> Result<Vec<Frame>, PerturbError> {
        let severity = Severity::new(severity)?;
        let corruption: Corruption = name.parse()?;
        let seed = self.config().seed;

        log::info!(
            "Applying {} at severity {} to {} frames (seed {})",
            corruption,
            severity,
            frames.len(),
            seed
        );

        let apply_one = |index: usize, frame: &Frame| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
            self.apply_corruption(corruption, frame, severity, &mut rng)
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            if self.config().parallel {
                return frames
                    .par_iter()
                    .enumerate()
                    .map(|(index, frame)| apply_one(index, frame))
                    .collect();
            }
        }

        frames
            .iter()
            .enumerate()
            .map(|(index, frame)| apply_one(index, frame))
            .collect()
    }
}
