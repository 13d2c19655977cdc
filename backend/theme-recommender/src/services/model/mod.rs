/// Preference Model Module
///
/// The engine only sees a regressor through `fit` / `predict`.
///
/// # Contract
/// - `fit` trains in place on a non-empty batch of rated samples.
/// - `predict` returns exactly one score per input row, index-aligned.
/// - Neither may run concurrently with another call on the same model; the
///   engine owns its model exclusively and serialises calls.
pub mod mlp;

pub use mlp::MlpRegressor;

use crate::models::{FitOptions, RatedSample, TrainingResult};
use async_trait::async_trait;
use ndarray::Array2;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Cannot fit on an empty batch")]
    EmptyBatch,

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Non-finite value: {0}")]
    NonFinite(String),

    #[error("Training failed: {0}")]
    Training(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferenceModel: Send + Sync {
    /// Train on `batch` (rows of `FeatureCodec::shape()` features plus a reward).
    async fn fit(&mut self, batch: &[RatedSample], options: FitOptions) -> Result<TrainingResult>;

    /// Score a (rows × features) matrix.
    async fn predict(&self, features: &Array2<f32>) -> Result<Vec<f32>>;
}
