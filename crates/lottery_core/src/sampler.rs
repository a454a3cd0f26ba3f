use std::time::Duration;

use rand::Rng;
use scene::{Palette, Scene, SkinMode};
use shared::domain::Person;

pub const REFRESH_INTERVAL: Duration = Duration::from_millis(200);
pub const SAMPLES_PER_TICK: usize = 4;

/// Re-skins a handful of random cards each tick so the wall looks alive.
/// Only faces change; transforms are never touched.
#[derive(Debug, Clone)]
pub struct RefreshSampler {
    samples_per_tick: usize,
}

impl Default for RefreshSampler {
    fn default() -> Self {
        Self::new(SAMPLES_PER_TICK)
    }
}

impl RefreshSampler {
    pub fn new(samples_per_tick: usize) -> Self {
        Self { samples_per_tick }
    }

    /// Returns the indices of the cards that were re-skinned. Cards listed in
    /// `protected` are skipped, costing that sample. People who already won
    /// are only shown when nobody else is left.
    pub fn refresh(
        &self,
        scene: &mut Scene,
        people: &[Person],
        protected: &[usize],
        palette: &Palette,
        mode: SkinMode,
        rng: &mut impl Rng,
    ) -> Vec<usize> {
        if scene.is_empty() || people.is_empty() {
            return Vec::new();
        }
        let mut candidates: Vec<&Person> = people.iter().filter(|p| !p.is_win).collect();
        if candidates.is_empty() {
            candidates = people.iter().collect();
        }

        let mut touched = Vec::with_capacity(self.samples_per_tick);
        for _ in 0..self.samples_per_tick {
            let card_index = rng.gen_range(0..scene.len());
            let person = candidates[rng.gen_range(0..candidates.len())];
            if protected.contains(&card_index) {
                continue;
            }
            if let Some(card) = scene.card_mut(card_index) {
                card.assign(Some(person), palette, mode, 1.0, 1.0);
                touched.push(card_index);
            }
        }
        touched
    }
}

#[cfg(test)]
#[path = "tests/sampler_tests.rs"]
mod tests;
