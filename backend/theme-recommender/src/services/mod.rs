pub mod buffer;
pub mod engine;
pub mod exploration;
pub mod features;
pub mod model;
pub mod ranking;
pub mod sampler;

pub use buffer::TrainingBuffer;
pub use engine::{CycleReport, EngineError, EngineState, RecommendationEngine};
pub use exploration::ExplorationPolicy;
pub use features::FeatureCodec;
pub use model::{MlpRegressor, ModelError, PreferenceModel};
pub use ranking::RankingLayer;
pub use sampler::ThemeSampler;
