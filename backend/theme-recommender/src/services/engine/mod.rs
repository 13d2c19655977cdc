// ============================================
// Recommendation Engine
// ============================================
//
// Owns the online preference-learning loop:
//
//   Idle --submit_rating--> Training --fit ok--> Scoring --predict ok--> Idle
//
// 1. Encode the displayed theme, push (features, reward) into the buffer
// 2. Drain the buffer and retrain the model on it
// 3. Sample a large candidate pool and encode it
// 4. Score the pool, rank it, keep the top K as recommendations
// 5. Pick the next displayed theme (explore or exploit) and publish
//
// Only one rating is processed at a time. A rating submitted while the
// engine is not Idle fails with `EngineBusy` and touches no state. Any
// failure inside the cycle still returns the engine to Idle.
//
// Cancellation is not supported: once fit/predict is dispatched it runs to
// completion or failure.

use crate::config::EngineConfig;
use crate::models::{
    FitOptions, Rating, RatedSample, RecommendationSnapshot, ScoredTheme, SelectionKind, Theme,
    TrainingResult,
};
use crate::services::buffer::TrainingBuffer;
use crate::services::exploration::ExplorationPolicy;
use crate::services::features::FeatureCodec;
use crate::services::model::{MlpRegressor, ModelError, PreferenceModel};
use crate::services::ranking::RankingLayer;
use crate::services::sampler::ThemeSampler;
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;


#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine busy: a rating is already being processed")]
    EngineBusy,

    #[error("Reward {reward} outside accepted range [{min}, {max}]")]
    InvalidReward { reward: f32, min: f32, max: f32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Preference model failed: {0}")]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Waiting for a rating
    Idle,
    /// `fit` in flight
    Training,
    /// `predict` in flight
    Scoring,
}

/// Summary of one completed rating cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    /// Samples the model was retrained on.
    pub batch_size: usize,
    pub training: TrainingResult,
    pub pool_size: usize,
    pub top_score: Option<f32>,
    pub selection: SelectionKind,
}

/// Resources only the active cycle may touch.
struct EngineCore<M> {
    buffer: TrainingBuffer,
    model: M,
    sampler: ThemeSampler,
    /// Drives explore/exploit decisions.
    rng: StdRng,
}

pub struct RecommendationEngine<M: PreferenceModel> {
    config: EngineConfig,
    ranking: RankingLayer,
    policy: ExplorationPolicy,
    state: Mutex<EngineState>,
    core: tokio::sync::Mutex<EngineCore<M>>,
    published: watch::Sender<RecommendationSnapshot>,
}

/// Marks the engine busy for the lifetime of one cycle and puts it back to
/// Idle on drop, whichever way the cycle ends.
struct CycleGuard<'a> {
    state: &'a Mutex<EngineState>,
    published: &'a watch::Sender<RecommendationSnapshot>,
}

impl CycleGuard<'_> {
    fn transition(&self, next: EngineState) {
        *self.state.lock() = next;
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = EngineState::Idle;
        self.published.send_modify(|snapshot| snapshot.busy = false);
    }
}

impl RecommendationEngine<MlpRegressor> {
    /// Engine backed by the default feed-forward regressor.
    pub fn with_default_model(config: EngineConfig) -> Result<Self> {
        let model = MlpRegressor::from_config(&config);
        Self::new(config, model)
    }
}

impl<M: PreferenceModel> RecommendationEngine<M> {
    /// Starts Idle, showing a random theme with no recommendations.
    pub fn new(config: EngineConfig, model: M) -> Result<Self> {
        let mut sampler = Self::build_sampler(&config);
        let initial = sampler.sample();
        Self::assemble(config, model, sampler, initial)
    }

    /// Starts Idle, showing `initial`.
    pub fn with_initial_theme(config: EngineConfig, model: M, initial: Theme) -> Result<Self> {
        let sampler = Self::build_sampler(&config);
        Self::assemble(config, model, sampler, initial)
    }

    fn build_sampler(config: &EngineConfig) -> ThemeSampler {
        match config.seed {
            Some(seed) => ThemeSampler::seeded(seed),
            None => ThemeSampler::new(),
        }
    }

    fn assemble(
        config: EngineConfig,
        model: M,
        sampler: ThemeSampler,
        initial: Theme,
    ) -> Result<Self> {
        config.validate().map_err(EngineError::InvalidConfig)?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(2)),
            None => StdRng::from_entropy(),
        };
        let (published, _) = watch::channel(RecommendationSnapshot::initial(initial));

        info!(
            window_size = config.window_size,
            candidate_pool_size = config.candidate_pool_size,
            top_k = config.top_k,
            exploration_rate = config.exploration_rate,
            "Recommendation engine ready"
        );

        Ok(Self {
            ranking: RankingLayer::new(config.top_k),
            policy: ExplorationPolicy::new().with_exploration_rate(config.exploration_rate),
            state: Mutex::new(EngineState::Idle),
            core: tokio::sync::Mutex::new(EngineCore {
                buffer: TrainingBuffer::new(config.window_size),
                model,
                sampler,
                rng,
            }),
            published,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    pub fn is_busy(&self) -> bool {
        self.state() != EngineState::Idle
    }

    pub fn snapshot(&self) -> RecommendationSnapshot {
        self.published.borrow().clone()
    }

    /// Receiver that wakes whenever published state changes.
    pub fn subscribe(&self) -> watch::Receiver<RecommendationSnapshot> {
        self.published.subscribe()
    }

    pub fn current_theme(&self) -> Theme {
        self.published.borrow().current_theme
    }

    pub fn recommended(&self) -> Vec<ScoredTheme> {
        self.published.borrow().recommended.clone()
    }

    /// Samples waiting for the next retrain. Waits for any in-flight cycle.
    pub async fn buffered_samples(&self) -> usize {
        self.core.lock().await.buffer.size()
    }

    pub async fn submit(&self, rating: Rating) -> Result<CycleReport> {
        self.submit_rating(rating.reward()).await
    }

    /// Rate the currently displayed theme and run one full learning cycle.
    pub async fn submit_rating(&self, reward: f32) -> Result<CycleReport> {
        self.validate_reward(reward)?;
        let guard = self.begin_cycle()?;
        let mut core_guard = self
            .core
            .try_lock()
            .map_err(|_| EngineError::EngineBusy)?;
        let core = &mut *core_guard;

        let cycle_id = Uuid::new_v4();
        let rated_theme = self.current_theme();
        core.buffer
            .push(RatedSample::new(FeatureCodec::encode(&rated_theme), reward));
        let batch = core.buffer.drain_all();
        let batch_size = batch.len();

        info!(
            cycle_id = %cycle_id,
            reward = reward,
            theme = %rated_theme,
            batch_size = batch_size,
            "Rating received, retraining"
        );

        let options = FitOptions {
            epochs: self.config.epochs,
            shuffle: self.config.shuffle,
        };
        let training = match core.model.fit(&batch, options).await {
            Ok(training) => training,
            Err(e) => {
                error!(cycle_id = %cycle_id, error = %e, "Preference model fit failed");
                if self.config.requeue_on_failure {
                    warn!(
                        cycle_id = %cycle_id,
                        samples = batch.len(),
                        "Requeueing training batch"
                    );
                    core.buffer.requeue(batch);
                }
                return Err(e.into());
            }
        };

        info!(
            cycle_id = %cycle_id,
            epochs = training.epochs,
            final_loss = training.final_loss(),
            "Preference model retrained"
        );

        guard.transition(EngineState::Scoring);

        let candidates = core.sampler.sample_many(self.config.candidate_pool_size);
        let features = FeatureCodec::encode_batch(&candidates);
        let scores = core.model.predict(&features).await.map_err(|e| {
            error!(cycle_id = %cycle_id, error = %e, "Preference model predict failed");
            e
        })?;

        let pool_size = candidates.len();
        let recommended = self.ranking.recommend(candidates, &scores)?;
        let top_score = recommended.first().map(|s| s.score);

        let (next_theme, selection) =
            self.policy
                .select_next(&mut core.rng, &mut core.sampler, &recommended);

        let recommended_count = recommended.len();
        self.published.send_modify(|snapshot| {
            snapshot.current_theme = next_theme;
            snapshot.recommended = recommended;
            snapshot.cycle += 1;
            snapshot.last_training = Some(training.clone());
            snapshot.updated_at = Utc::now();
        });

        info!(
            cycle_id = %cycle_id,
            pool_size = pool_size,
            recommended = recommended_count,
            top_score = top_score,
            selection = selection.as_str(),
            next_theme = %next_theme,
            "Recommendations published"
        );

        Ok(CycleReport {
            cycle_id,
            batch_size,
            training,
            pool_size,
            top_score,
            selection,
        })
    }

    fn validate_reward(&self, reward: f32) -> Result<()> {
        let (min, max) = (self.config.reward_min, self.config.reward_max);
        if !reward.is_finite() || reward < min || reward > max {
            warn!(reward = reward, min = min, max = max, "Rating rejected: reward out of range");
            return Err(EngineError::InvalidReward { reward, min, max });
        }
        Ok(())
    }

    fn begin_cycle(&self) -> Result<CycleGuard<'_>> {
        {
            let mut state = self.state.lock();
            if *state != EngineState::Idle {
                warn!(state = ?*state, "Rating rejected: engine busy");
                return Err(EngineError::EngineBusy);
            }
            *state = EngineState::Training;
        }

        self.published.send_modify(|snapshot| snapshot.busy = true);

        Ok(CycleGuard {
            state: &self.state,
            published: &self.published,
        })
    }
}
