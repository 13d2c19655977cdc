use theme_recommender::{
    EngineConfig, EngineError, EngineState, FeatureCodec, Rating, RecommendationEngine, Rgb, Theme,
};

fn seeded(seed: u64) -> EngineConfig {
    EngineConfig {
        seed: Some(seed),
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn test_default_engine_full_cycle() {
    let engine = RecommendationEngine::with_default_model(seeded(1)).unwrap();

    let report = engine.submit(Rating::Clean).await.unwrap();

    assert_eq!(report.batch_size, 1);
    assert_eq!(report.pool_size, 12_000);
    assert_eq!(report.training.epochs, 50);
    assert_eq!(report.training.loss_history.len(), 50);

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.recommended.len(), 50);
    assert!(snapshot
        .recommended
        .windows(2)
        .all(|w| w[0].score >= w[1].score));
    assert!(!snapshot.busy);
    assert_eq!(snapshot.cycle, 1);
    assert_eq!(engine.state(), EngineState::Idle);
    assert_eq!(engine.buffered_samples().await, 0);
    assert!(snapshot.updated_at >= chrono::Utc::now() - chrono::Duration::minutes(1));
}

#[tokio::test]
async fn test_repeated_ratings_keep_invariants() {
    let config = EngineConfig {
        candidate_pool_size: 400,
        top_k: 25,
        ..seeded(7)
    };
    let engine = RecommendationEngine::with_default_model(config).unwrap();

    for round in 0..15 {
        // Prefer dark backgrounds
        let theme = engine.current_theme();
        let features = FeatureCodec::encode(&theme);
        let brightness = (features[3] + features[4] + features[5]) / 3.0;
        let rating = if brightness < 0.33 {
            Rating::Clean
        } else if brightness < 0.66 {
            Rating::Meh
        } else {
            Rating::Trash
        };

        let report = engine.submit(rating).await.unwrap();
        assert_eq!(report.batch_size, 1, "round {}", round);

        let recommended = engine.recommended();
        assert_eq!(recommended.len(), 25);
        assert!(recommended.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(recommended.iter().all(|s| s.score.is_finite()));
    }

    assert_eq!(engine.snapshot().cycle, 15);
}

#[tokio::test]
async fn test_invalid_reward_leaves_engine_idle() {
    let initial = Theme::new(Rgb::new(10, 20, 30), Rgb::new(200, 210, 220));
    let model = theme_recommender::MlpRegressor::new(&[24, 24], Some(3));
    let engine = RecommendationEngine::with_initial_theme(seeded(3), model, initial).unwrap();

    let err = engine.submit_rating(2.0).await.unwrap_err();

    assert!(matches!(err, EngineError::InvalidReward { .. }));
    assert_eq!(engine.state(), EngineState::Idle);
    assert_eq!(engine.current_theme(), initial);
    assert!(engine.recommended().is_empty());
}

#[tokio::test]
async fn test_custom_reward_range() {
    let config = EngineConfig {
        reward_min: -1.0,
        reward_max: 1.0,
        candidate_pool_size: 100,
        ..seeded(11)
    };
    let engine = RecommendationEngine::with_default_model(config).unwrap();

    assert!(engine.submit_rating(-0.5).await.is_ok());
    assert!(matches!(
        engine.submit_rating(-1.5).await,
        Err(EngineError::InvalidReward { .. })
    ));
}
