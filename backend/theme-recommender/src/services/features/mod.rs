/// Theme → model input encoding.
///
/// Layout: [text.r, text.g, text.b, bg.r, bg.g, bg.b], each channel / 255.
/// Themes are never reconstructed from features; callers keep the theme
/// alongside its encoding.
use crate::models::{FeatureVector, RatedSample, Theme, FEATURE_WIDTH};
use ndarray::{Array1, Array2, ArrayView1};

const CHANNEL_MAX: f32 = 255.0;

pub struct FeatureCodec;

impl FeatureCodec {
    pub const fn shape() -> usize {
        FEATURE_WIDTH
    }

    pub fn encode(theme: &Theme) -> FeatureVector {
        let [tr, tg, tb] = theme.text_colour.channels();
        let [br, bg, bb] = theme.background_colour.channels();

        [tr, tg, tb, br, bg, bb].map(|c| c as f32 / CHANNEL_MAX)
    }

    /// Encode a batch into a (themes × 6) matrix.
    pub fn encode_batch(themes: &[Theme]) -> Array2<f32> {
        let mut matrix = Array2::zeros((themes.len(), FEATURE_WIDTH));
        for (mut row, theme) in matrix.rows_mut().into_iter().zip(themes) {
            row.assign(&ArrayView1::from(&Self::encode(theme)));
        }
        matrix
    }

    /// Split rated samples into an input matrix and a reward column.
    pub fn samples_to_arrays(samples: &[RatedSample]) -> (Array2<f32>, Array1<f32>) {
        let x = Array2::from_shape_fn((samples.len(), FEATURE_WIDTH), |(i, j)| {
            samples[i].features[j]
        });
        let y = samples.iter().map(|s| s.reward).collect();

        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rgb;
    use crate::services::sampler::ThemeSampler;

    #[test]
    fn test_encode_boundaries() {
        let black = Theme::new(Rgb::new(0, 0, 0), Rgb::new(0, 0, 0));
        let white = Theme::new(Rgb::new(255, 255, 255), Rgb::new(255, 255, 255));

        assert_eq!(FeatureCodec::encode(&black), [0.0; 6]);
        assert_eq!(FeatureCodec::encode(&white), [1.0; 6]);
    }

    #[test]
    fn test_encode_order() {
        let theme = Theme::new(Rgb::new(255, 0, 0), Rgb::new(0, 0, 255));

        assert_eq!(
            FeatureCodec::encode(&theme),
            [1.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_encode_within_unit_interval() {
        let mut sampler = ThemeSampler::seeded(9);

        for theme in sampler.sample_many(5_000) {
            let features = FeatureCodec::encode(&theme);
            assert_eq!(features.len(), FeatureCodec::shape());
            assert!(features.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_encode_batch_rows_match() {
        let mut sampler = ThemeSampler::seeded(11);
        let themes = sampler.sample_many(4);

        let matrix = FeatureCodec::encode_batch(&themes);

        assert_eq!(matrix.shape(), &[4, 6]);
        for (row, theme) in matrix.rows().into_iter().zip(&themes) {
            assert_eq!(row.to_vec(), FeatureCodec::encode(theme).to_vec());
        }
    }

    #[test]
    fn test_samples_to_arrays() {
        let samples = vec![
            RatedSample::new([0.1; 6], 1.0),
            RatedSample::new([0.2; 6], 0.5),
        ];

        let (x, y) = FeatureCodec::samples_to_arrays(&samples);

        assert_eq!(x.shape(), &[2, 6]);
        assert_eq!(x[[1, 3]], 0.2);
        assert_eq!(y.to_vec(), vec![1.0, 0.5]);
    }
}
