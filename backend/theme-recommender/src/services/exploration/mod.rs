// ============================================
// Exploration Module
// ============================================
//
// Picks the next theme to put in front of the user.
//
// With probability `exploration_rate` a brand-new random theme is shown
// (it need not appear in the recommended list). Otherwise one of the
// recommended themes is drawn uniformly at random.
//
// An empty recommended list always explores.

use crate::models::{ScoredTheme, SelectionKind, Theme};
use crate::services::sampler::ThemeSampler;
use rand::Rng;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ExplorationPolicy {
    exploration_rate: f64,
}

impl Default for ExplorationPolicy {
    fn default() -> Self {
        Self {
            exploration_rate: 0.5,
        }
    }
}

impl ExplorationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamped to [0, 1]; NaN disables exploration.
    pub fn with_exploration_rate(mut self, rate: f64) -> Self {
        self.exploration_rate = if rate.is_nan() {
            0.0
        } else {
            rate.clamp(0.0, 1.0)
        };
        self
    }

    pub fn exploration_rate(&self) -> f64 {
        self.exploration_rate
    }

    pub fn select_next<R: Rng>(
        &self,
        rng: &mut R,
        sampler: &mut ThemeSampler,
        recommended: &[ScoredTheme],
    ) -> (Theme, SelectionKind) {
        if recommended.is_empty() || rng.gen_bool(self.exploration_rate) {
            debug!("Exploring with a fresh random theme");
            return (sampler.sample(), SelectionKind::Explore);
        }

        let rank = rng.gen_range(0..recommended.len());
        debug!(rank = rank, score = recommended[rank].score, "Exploiting a recommended theme");
        (recommended[rank].theme, SelectionKind::Exploit { rank })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn fixed_pool(sampler: &mut ThemeSampler) -> Vec<ScoredTheme> {
        sampler
            .sample_many(50)
            .into_iter()
            .enumerate()
            .map(|(i, theme)| ScoredTheme {
                theme,
                score: 1.0 - i as f32 / 100.0,
            })
            .collect()
    }

    #[test]
    fn test_half_of_selections_explore() {
        let policy = ExplorationPolicy::default();
        let mut rng = StdRng::seed_from_u64(17);
        let mut sampler = ThemeSampler::seeded(18);
        let pool = fixed_pool(&mut sampler);
        let pool_themes: HashSet<Theme> = pool.iter().map(|s| s.theme).collect();

        let trials = 10_000;
        let mut outside_pool = 0;
        let mut explored = 0;
        for _ in 0..trials {
            let (theme, kind) = policy.select_next(&mut rng, &mut sampler, &pool);
            if !pool_themes.contains(&theme) {
                outside_pool += 1;
            }
            match kind {
                SelectionKind::Explore => explored += 1,
                SelectionKind::Exploit { rank } => assert_eq!(pool[rank].theme, theme),
            }
        }

        // ±4 standard deviations of a fair coin over 10k trials
        let fraction = outside_pool as f64 / trials as f64;
        assert!((fraction - 0.5).abs() < 0.02, "explore fraction {}", fraction);
        assert_eq!(outside_pool, explored);
    }

    #[test]
    fn test_exploit_draws_cover_pool() {
        let policy = ExplorationPolicy::new().with_exploration_rate(0.0);
        let mut rng = StdRng::seed_from_u64(5);
        let mut sampler = ThemeSampler::seeded(6);
        let pool = fixed_pool(&mut sampler);

        let mut seen = HashSet::new();
        for _ in 0..2_000 {
            match policy.select_next(&mut rng, &mut sampler, &pool) {
                (_, SelectionKind::Exploit { rank }) => {
                    seen.insert(rank);
                }
                (_, SelectionKind::Explore) => panic!("exploration rate is zero"),
            }
        }

        assert_eq!(seen.len(), 50);
    }

    #[test]
    fn test_empty_pool_always_explores() {
        let policy = ExplorationPolicy::new().with_exploration_rate(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut sampler = ThemeSampler::seeded(2);

        let (_, kind) = policy.select_next(&mut rng, &mut sampler, &[]);

        assert_eq!(kind, SelectionKind::Explore);
    }

    #[test]
    fn test_rate_is_clamped() {
        assert_eq!(
            ExplorationPolicy::new().with_exploration_rate(3.0).exploration_rate(),
            1.0
        );
        assert_eq!(
            ExplorationPolicy::new().with_exploration_rate(-1.0).exploration_rate(),
            0.0
        );
    }
}
