use serde::Deserialize;

/// Environment prefix for every engine setting, e.g. `THEME_ENGINE_TOP_K=20`.
pub const ENV_PREFIX: &str = "THEME_ENGINE_";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Rated samples kept before the newly submitted one is appended.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_candidate_pool_size")]
    pub candidate_pool_size: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Probability of showing a brand-new random theme instead of a recommended one.
    #[serde(default = "default_exploration_rate")]
    pub exploration_rate: f64,
    #[serde(default = "default_reward_min")]
    pub reward_min: f32,
    #[serde(default = "default_reward_max")]
    pub reward_max: f32,
    #[serde(default = "default_hidden_units")]
    pub hidden_units: usize,
    #[serde(default = "default_hidden_layers")]
    pub hidden_layers: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    /// Push a drained batch back into the buffer when `fit` fails.
    #[serde(default)]
    pub requeue_on_failure: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_window_size() -> usize {
    10
}

fn default_epochs() -> usize {
    50
}

fn default_shuffle() -> bool {
    true
}

fn default_batch_size() -> usize {
    32
}

fn default_candidate_pool_size() -> usize {
    12_000
}

fn default_top_k() -> usize {
    50
}

fn default_exploration_rate() -> f64 {
    0.5
}

fn default_reward_min() -> f32 {
    0.0
}

fn default_reward_max() -> f32 {
    1.0
}

fn default_hidden_units() -> usize {
    24
}

fn default_hidden_layers() -> usize {
    2
}

fn default_learning_rate() -> f32 {
    0.001
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            epochs: default_epochs(),
            shuffle: default_shuffle(),
            batch_size: default_batch_size(),
            candidate_pool_size: default_candidate_pool_size(),
            top_k: default_top_k(),
            exploration_rate: default_exploration_rate(),
            reward_min: default_reward_min(),
            reward_max: default_reward_max(),
            hidden_units: default_hidden_units(),
            hidden_layers: default_hidden_layers(),
            learning_rate: default_learning_rate(),
            requeue_on_failure: false,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Load from `THEME_ENGINE_*` variables (and `.env` when present).
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        envy::prefixed(ENV_PREFIX).from_env::<EngineConfig>()
    }

    /// Check the values make sense together.
    pub fn validate(&self) -> Result<(), String> {
        if self.epochs == 0 {
            return Err("epochs must be at least 1".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }
        if self.candidate_pool_size == 0 {
            return Err("candidate_pool_size must be at least 1".to_string());
        }
        if self.top_k == 0 {
            return Err("top_k must be at least 1".to_string());
        }
        if self.hidden_units == 0 || self.hidden_layers == 0 {
            return Err("hidden_units and hidden_layers must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.exploration_rate) {
            return Err(format!(
                "exploration_rate must be within [0, 1], got {}",
                self.exploration_rate
            ));
        }
        if !self.reward_min.is_finite() || !self.reward_max.is_finite() {
            return Err("reward bounds must be finite".to_string());
        }
        if self.reward_min > self.reward_max {
            return Err(format!(
                "reward_min ({}) exceeds reward_max ({})",
                self.reward_min, self.reward_max
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_constants() {
        let config = EngineConfig::default();

        assert_eq!(config.window_size, 10);
        assert_eq!(config.epochs, 50);
        assert!(config.shuffle);
        assert_eq!(config.candidate_pool_size, 12_000);
        assert_eq!(config.top_k, 50);
        assert_eq!(config.exploration_rate, 0.5);
        assert_eq!(config.hidden_units, 24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_and_fallbacks() {
        let vars = vec![
            ("THEME_ENGINE_TOP_K".to_string(), "20".to_string()),
            ("THEME_ENGINE_EXPLORATION_RATE".to_string(), "0.25".to_string()),
            ("THEME_ENGINE_SEED".to_string(), "7".to_string()),
            ("UNRELATED".to_string(), "x".to_string()),
        ];

        let config = envy::prefixed(ENV_PREFIX)
            .from_iter::<_, EngineConfig>(vars)
            .unwrap();

        assert_eq!(config.top_k, 20);
        assert_eq!(config.exploration_rate, 0.25);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.candidate_pool_size, 12_000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = EngineConfig {
            exploration_rate: 1.5,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            reward_min: 1.0,
            reward_max: 0.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            top_k: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
