pub mod config;
pub mod models;
pub mod services;

pub use config::EngineConfig;
pub use models::{Rating, RecommendationSnapshot, Rgb, ScoredTheme, Theme};
pub use services::{
    EngineError, EngineState, FeatureCodec, MlpRegressor, PreferenceModel, RecommendationEngine,
    ThemeSampler, TrainingBuffer,
};
