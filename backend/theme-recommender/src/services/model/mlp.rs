/// Feed-forward regressor
///
/// 6 → hidden → … → 1, sigmoid on every layer, mean-squared-error loss,
/// Adam updates over shuffled mini-batches. Weights persist across `fit`
/// calls, so each retrain continues from the previous state.
use super::{ModelError, PreferenceModel, Result};
use crate::config::EngineConfig;
use crate::models::{FitOptions, RatedSample, TrainingResult, FEATURE_WIDTH};
use crate::services::features::FeatureCodec;
use async_trait::async_trait;
use ndarray::{Array, Array1, Array2, Axis, Dimension, Zip};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

const BETA1: f32 = 0.9;
const BETA2: f32 = 0.999;
const EPSILON: f32 = 1e-7;

struct DenseLayer {
    /// (inputs × outputs)
    weights: Array2<f32>,
    bias: Array1<f32>,
    m_weights: Array2<f32>,
    v_weights: Array2<f32>,
    m_bias: Array1<f32>,
    v_bias: Array1<f32>,
}

impl DenseLayer {
    /// Glorot-uniform weights, zero bias.
    fn new(inputs: usize, outputs: usize, rng: &mut StdRng) -> Self {
        let limit = (6.0 / (inputs + outputs) as f32).sqrt();
        Self {
            weights: Array2::from_shape_fn((inputs, outputs), |_| rng.gen_range(-limit..limit)),
            bias: Array1::zeros(outputs),
            m_weights: Array2::zeros((inputs, outputs)),
            v_weights: Array2::zeros((inputs, outputs)),
            m_bias: Array1::zeros(outputs),
            v_bias: Array1::zeros(outputs),
        }
    }

    fn forward(&self, input: &Array2<f32>) -> Array2<f32> {
        (input.dot(&self.weights) + &self.bias).mapv_into(sigmoid)
    }
}

/// Bias-corrected Adam step for one timestep.
struct AdamStep {
    learning_rate: f32,
    correction1: f32,
    correction2: f32,
}

impl AdamStep {
    fn new(learning_rate: f32, t: i32) -> Self {
        Self {
            learning_rate,
            correction1: 1.0 - BETA1.powi(t),
            correction2: 1.0 - BETA2.powi(t),
        }
    }

    fn apply<D: Dimension>(
        &self,
        param: &mut Array<f32, D>,
        m: &mut Array<f32, D>,
        v: &mut Array<f32, D>,
        grad: &Array<f32, D>,
    ) {
        Zip::from(param)
            .and(m)
            .and(v)
            .and(grad)
            .for_each(|p, m, v, &g| {
                *m = BETA1 * *m + (1.0 - BETA1) * g;
                *v = BETA2 * *v + (1.0 - BETA2) * g * g;
                let m_hat = *m / self.correction1;
                let v_hat = *v / self.correction2;
                *p -= self.learning_rate * m_hat / (v_hat.sqrt() + EPSILON);
            });
    }
}

pub struct MlpRegressor {
    layers: Vec<DenseLayer>,
    learning_rate: f32,
    batch_size: usize,
    /// Adam timestep, shared by every parameter.
    step: i32,
    rng: StdRng,
}

impl MlpRegressor {
    /// # Arguments
    /// * `hidden` - width of each hidden layer, input side first
    /// * `seed` - fixes weight init and shuffling when set
    pub fn new(hidden: &[usize], seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut widths = Vec::with_capacity(hidden.len() + 2);
        widths.push(FEATURE_WIDTH);
        widths.extend_from_slice(hidden);
        widths.push(1);

        let layers = widths
            .windows(2)
            .map(|pair| DenseLayer::new(pair[0], pair[1], &mut rng))
            .collect();

        Self {
            layers,
            learning_rate: 0.001,
            batch_size: 32,
            step: 0,
            rng,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let hidden = vec![config.hidden_units; config.hidden_layers];
        // Offset so model init does not replay the sampler's stream
        Self::new(&hidden, config.seed.map(|s| s.wrapping_add(1)))
            .with_learning_rate(config.learning_rate)
            .with_batch_size(config.batch_size)
    }

    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn infer(&self, input: &Array2<f32>) -> Array2<f32> {
        self.layers
            .iter()
            .fold(input.to_owned(), |activation, layer| layer.forward(&activation))
    }

    /// One forward/backward pass and Adam update. Returns the batch loss
    /// measured before the update.
    fn train_batch(&mut self, x: &Array2<f32>, y: &Array1<f32>) -> f32 {
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(x.to_owned());
        for layer in &self.layers {
            let next = layer.forward(&activations[activations.len() - 1]);
            activations.push(next);
        }

        let n = x.nrows() as f32;
        let output = activations[activations.len() - 1].column(0).to_owned();
        let diff = output - y;
        let loss = diff.mapv(|d| d * d).mean().unwrap_or(0.0);

        self.step += 1;
        let adam = AdamStep::new(self.learning_rate, self.step);

        // dL/da for the output layer
        let mut delta = (diff * (2.0 / n)).insert_axis(Axis(1));
        for (idx, layer) in self.layers.iter_mut().enumerate().rev() {
            let activated = &activations[idx + 1];
            let dz = delta * &activated.mapv(|a| a * (1.0 - a));
            let grad_weights = activations[idx].t().dot(&dz);
            let grad_bias = dz.sum_axis(Axis(0));
            delta = dz.dot(&layer.weights.t());

            adam.apply(
                &mut layer.weights,
                &mut layer.m_weights,
                &mut layer.v_weights,
                &grad_weights,
            );
            adam.apply(
                &mut layer.bias,
                &mut layer.m_bias,
                &mut layer.v_bias,
                &grad_bias,
            );
        }

        loss
    }
}

#[async_trait]
impl PreferenceModel for MlpRegressor {
    async fn fit(&mut self, batch: &[RatedSample], options: FitOptions) -> Result<TrainingResult> {
        if batch.is_empty() {
            return Err(ModelError::EmptyBatch);
        }
        if let Some(bad) = batch.iter().find(|s| !s.reward.is_finite()) {
            return Err(ModelError::NonFinite(format!("reward {}", bad.reward)));
        }

        let (x, y) = FeatureCodec::samples_to_arrays(batch);
        let mut indices: Vec<usize> = (0..batch.len()).collect();
        let mut loss_history = Vec::with_capacity(options.epochs);

        for epoch in 0..options.epochs {
            if options.shuffle {
                indices.shuffle(&mut self.rng);
            }

            let mut weighted_loss = 0.0;
            for chunk in indices.chunks(self.batch_size) {
                let xb = x.select(Axis(0), chunk);
                let yb = y.select(Axis(0), chunk);
                weighted_loss += self.train_batch(&xb, &yb) * chunk.len() as f32;
            }

            let epoch_loss = weighted_loss / batch.len() as f32;
            if !epoch_loss.is_finite() {
                return Err(ModelError::NonFinite(format!(
                    "loss diverged at epoch {}",
                    epoch
                )));
            }
            loss_history.push(epoch_loss);

            tokio::task::yield_now().await;
        }

        debug!(
            samples = batch.len(),
            epochs = options.epochs,
            final_loss = loss_history.last().copied(),
            "Preference model fitted"
        );

        Ok(TrainingResult {
            epochs: options.epochs,
            samples: batch.len(),
            loss_history,
        })
    }

    async fn predict(&self, features: &Array2<f32>) -> Result<Vec<f32>> {
        if features.ncols() != FEATURE_WIDTH {
            return Err(ModelError::ShapeMismatch {
                expected: FEATURE_WIDTH,
                actual: features.ncols(),
            });
        }

        Ok(self.infer(features).column(0).to_vec())
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
