/// Random theme generation.
///
/// Every channel of both colours is drawn independently and uniformly from
/// [0, 255]. There is no dedup between draws.
use crate::models::{Rgb, Theme};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct ThemeSampler {
    rng: StdRng,
}

impl Default for ThemeSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeSampler {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sampler for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sample(&mut self) -> Theme {
        Theme::new(self.sample_rgb(), self.sample_rgb())
    }

    pub fn sample_many(&mut self, n: usize) -> Vec<Theme> {
        (0..n).map(|_| self.sample()).collect()
    }

    fn sample_rgb(&mut self) -> Rgb {
        Rgb::new(self.rng.gen(), self.rng.gen(), self.rng.gen())
    }
}
