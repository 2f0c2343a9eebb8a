// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mini-batch Adam on categorical cross-entropy.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::network::{DEFAULT_DROPOUT, DEFAULT_HIDDEN, Network, NetworkTopology, softmax};
use crate::synth::{DEFAULT_EXAMPLES_PER_CLASS, Dataset, argmax};
use crate::{DEFAULT_RESAMPLE_COUNT, Result, TrainError};

/// Default number of passes over the training set.
pub const DEFAULT_EPOCHS: usize = 30;
/// Default examples per gradient step.
pub const DEFAULT_BATCH_SIZE: usize = 32;
/// Default Adam step size.
pub const DEFAULT_LEARNING_RATE: f64 = 1e-3;
/// Default share of the dataset held out for validation.
pub const DEFAULT_VALIDATION_FRACTION: f64 = 0.2;
/// Default number of epochs for a single-example fine-tune.
pub const DEFAULT_FINE_TUNE_EPOCHS: usize = 5;
/// Default seed for dataset synthesis, initialization, and shuffling.
pub const DEFAULT_SEED: u64 = 0x6e57_0c1a;

const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;
/// Added to probabilities before taking the log.
const PROBABILITY_FLOOR: f64 = 1e-12;

/// Everything that controls how a gesture network is built and trained.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingConfig {
    /// Points each gesture is resampled to.
    pub resample_count: usize,
    /// Hidden layer widths.
    pub hidden: Vec<usize>,
    /// Dropout probability for hidden units.
    pub dropout: f64,
    /// Passes over the training set.
    pub epochs: usize,
    /// Examples per gradient step.
    pub batch_size: usize,
    /// Adam step size.
    pub learning_rate: f64,
    /// Share of the synthetic dataset held out for validation.
    pub validation_fraction: f64,
    /// Synthetic examples per class.
    pub examples_per_class: usize,
    /// Epochs for [`learn_from_example`](crate::TrainableRecognizer::learn_from_example).
    pub fine_tune_epochs: usize,
    /// Seed for every random choice during initialization.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            resample_count: DEFAULT_RESAMPLE_COUNT,
            hidden: DEFAULT_HIDDEN.to_vec(),
            dropout: DEFAULT_DROPOUT,
            epochs: DEFAULT_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
            validation_fraction: DEFAULT_VALIDATION_FRACTION,
            examples_per_class: DEFAULT_EXAMPLES_PER_CLASS,
            fine_tune_epochs: DEFAULT_FINE_TUNE_EPOCHS,
            seed: DEFAULT_SEED,
        }
    }
}

impl TrainingConfig {
    /// Network shape implied by this configuration.
    pub fn topology(&self) -> NetworkTopology {
        NetworkTopology::for_catalogue(self.resample_count, &self.hidden, self.dropout)
    }

    /// Check the fitting parameters.
    pub fn validate(&self) -> Result<()> {
        if self.resample_count < 2 {
            return Err(TrainError::InvalidConfig("resample count must be at least 2"));
        }
        if self.epochs == 0 {
            return Err(TrainError::InvalidConfig("epochs must be non-zero"));
        }
        if self.batch_size == 0 {
            return Err(TrainError::InvalidConfig("batch size must be non-zero"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TrainError::InvalidConfig("learning rate must be positive"));
        }
        if !(0.0..1.0).contains(&self.validation_fraction) {
            return Err(TrainError::InvalidConfig(
                "validation fraction must be in [0, 1)",
            ));
        }
        Ok(())
    }
}

/// Metrics for one epoch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Mean cross-entropy over the training set, with dropout active.
    pub train_loss: f64,
    /// Mean cross-entropy over the validation set, if there was one.
    pub validation_loss: Option<f64>,
    /// Share of validation examples classified correctly, if there were any.
    pub validation_accuracy: Option<f64>,
}

/// Per-epoch history of a [`fit`] run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingReport {
    /// One entry per epoch, in order.
    pub epochs: Vec<EpochStats>,
}

impl TrainingReport {
    /// Metrics of the last epoch.
    pub fn last(&self) -> Option<&EpochStats> {
        self.epochs.last()
    }

    /// Training loss of the first and last epochs.
    pub fn loss_trend(&self) -> Option<(f64, f64)> {
        Some((self.epochs.first()?.train_loss, self.last()?.train_loss))
    }
}

/// Train `network` on `train`, reporting on `validation` after each epoch.
///
/// `validation` may be empty. The network is updated in place; on error it
/// may have been partially updated.
pub fn fit<R: Rng + ?Sized>(
    network: &mut Network,
    train: &Dataset,
    validation: &Dataset,
    config: &TrainingConfig,
    rng: &mut R,
) -> Result<TrainingReport> {
    config.validate()?;
    if train.is_empty() {
        return Err(TrainError::EmptyDataset);
    }
    check_shapes(network, train, ("training input", "training target"))?;
    if !validation.is_empty() {
        check_shapes(network, validation, ("validation input", "validation target"))?;
    }

    let mut adam = Adam::new(network, config.learning_rate);
    let mut grads = Gradients::zeros(network);
    let mut order: Vec<usize> = (0..train.len()).collect();
    let mut report = TrainingReport::default();

    for epoch in 1..=config.epochs {
        order.shuffle(rng);
        let mut total = 0.0;
        for batch in order.chunks(config.batch_size) {
            grads.clear();
            for &i in batch {
                let pass = forward_train(network, &train.inputs()[i], rng);
                total += cross_entropy(pass.output(), &train.targets()[i]);
                backward(network, &pass, &train.targets()[i], &mut grads);
            }
            adam.step(network, &grads, batch.len() as f64);
        }
        let train_loss = total / train.len() as f64;
        if !train_loss.is_finite() {
            return Err(TrainError::NonFiniteLoss { epoch });
        }

        let (validation_loss, validation_accuracy) = match evaluate(network, validation)? {
            Some((loss, accuracy)) => (Some(loss), Some(accuracy)),
            None => (None, None),
        };
        debug!(
            epoch,
            train_loss,
            validation_loss,
            validation_accuracy,
            "epoch complete"
        );
        report.epochs.push(EpochStats {
            epoch,
            train_loss,
            validation_loss,
            validation_accuracy,
        });
    }
    Ok(report)
}

/// Mean loss and accuracy of `network` on `data`, or `None` when empty.
pub(crate) fn evaluate(network: &Network, data: &Dataset) -> Result<Option<(f64, f64)>> {
    if data.is_empty() {
        return Ok(None);
    }
    let mut loss = 0.0;
    let mut correct = 0_usize;
    for (input, target) in data.inputs().iter().zip(data.targets()) {
        let probs = network.predict(input)?;
        loss += cross_entropy(&probs, target);
        let predicted = argmax(&probs).map(|(i, _)| i);
        if predicted.is_some() && predicted == argmax(target).map(|(i, _)| i) {
            correct += 1;
        }
    }
    let n = data.len() as f64;
    Ok(Some((loss / n, correct as f64 / n)))
}

fn check_shapes(
    network: &Network,
    data: &Dataset,
    (input, target): (&'static str, &'static str),
) -> Result<()> {
    if data.input_width() != network.input_width() {
        return Err(TrainError::ShapeMismatch {
            what: input,
            expected: network.input_width(),
            actual: data.input_width(),
        });
    }
    if data.classes() != network.output_width() {
        return Err(TrainError::ShapeMismatch {
            what: target,
            expected: network.output_width(),
            actual: data.classes(),
        });
    }
    Ok(())
}

fn cross_entropy(probs: &[f64], target: &[f64]) -> f64 {
    probs
        .iter()
        .zip(target)
        .filter(|&(_, &t)| t > 0.0)
        .map(|(p, t)| -t * (p + PROBABILITY_FLOOR).ln())
        .sum()
}

/// Activations recorded during a training forward pass.
struct Pass {
    /// Input of every layer, followed by the output probabilities.
    activations: Vec<Vec<f64>>,
    /// Per hidden layer, the derivative of its activation with respect to its
    /// pre-activation: zero for inactive or dropped units, `1 / keep` otherwise.
    gates: Vec<Vec<f64>>,
}

impl Pass {
    fn output(&self) -> &[f64] {
        self.activations.last().map(Vec::as_slice).unwrap_or_default()
    }
}

fn forward_train<R: Rng + ?Sized>(network: &Network, input: &[f64], rng: &mut R) -> Pass {
    let keep = 1.0 - network.dropout;
    let last = network.layers.len().saturating_sub(1);
    let mut activations = Vec::with_capacity(network.layers.len() + 1);
    let mut gates = Vec::with_capacity(last);
    activations.push(input.to_vec());
    for (l, layer) in network.layers.iter().enumerate() {
        let z = layer.affine(&activations[l]);
        if l == last {
            activations.push(softmax(&z));
        } else {
            let gate: Vec<f64> = z
                .iter()
                .map(|&v| {
                    let dropped = network.dropout > 0.0 && rng.random::<f64>() < network.dropout;
                    if v > 0.0 && !dropped { 1.0 / keep } else { 0.0 }
                })
                .collect();
            activations.push(z.iter().zip(&gate).map(|(v, g)| v * g).collect());
            gates.push(gate);
        }
    }
    Pass { activations, gates }
}

/// Accumulated gradients, laid out like the network.
struct Gradients {
    weights: Vec<Vec<f64>>,
    biases: Vec<Vec<f64>>,
}

impl Gradients {
    fn zeros(network: &Network) -> Self {
        Self {
            weights: network.layers.iter().map(|l| vec![0.0; l.weights.len()]).collect(),
            biases: network.layers.iter().map(|l| vec![0.0; l.biases.len()]).collect(),
        }
    }

    fn clear(&mut self) {
        for g in self.weights.iter_mut().chain(self.biases.iter_mut()) {
            g.fill(0.0);
        }
    }
}

fn backward(network: &Network, pass: &Pass, target: &[f64], grads: &mut Gradients) {
    // Softmax with cross-entropy: the output delta is `p - t`.
    let mut delta: Vec<f64> = pass
        .output()
        .iter()
        .zip(target)
        .map(|(p, t)| p - t)
        .collect();
    for (l, layer) in network.layers.iter().enumerate().rev() {
        let input = &pass.activations[l];
        for (o, d) in delta.iter().enumerate() {
            grads.biases[l][o] += d;
            let row = &mut grads.weights[l][o * layer.inputs..(o + 1) * layer.inputs];
            for (g, x) in row.iter_mut().zip(input) {
                *g += d * x;
            }
        }
        if l == 0 {
            break;
        }
        let mut prev = vec![0.0; layer.inputs];
        for (row, d) in layer.weights.chunks_exact(layer.inputs).zip(&delta) {
            for (p, w) in prev.iter_mut().zip(row) {
                *p += w * d;
            }
        }
        for (p, g) in prev.iter_mut().zip(&pass.gates[l - 1]) {
            *p *= g;
        }
        delta = prev;
    }
}

/// Adam optimizer state.
struct Adam {
    learning_rate: f64,
    /// `beta1^t` and `beta2^t` for bias correction.
    beta1_t: f64,
    beta2_t: f64,
    m: Gradients,
    v: Gradients,
}

impl Adam {
    fn new(network: &Network, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1_t: 1.0,
            beta2_t: 1.0,
            m: Gradients::zeros(network),
            v: Gradients::zeros(network),
        }
    }

    /// Apply one update from gradients summed over `batch` examples.
    fn step(&mut self, network: &mut Network, grads: &Gradients, batch: f64) {
        self.beta1_t *= ADAM_BETA1;
        self.beta2_t *= ADAM_BETA2;
        let lr = self.learning_rate;
        let (c1, c2) = (1.0 - self.beta1_t, 1.0 - self.beta2_t);
        let update = |params: &mut [f64], g: &[f64], m: &mut [f64], v: &mut [f64]| {
            let moments = m.iter_mut().zip(v.iter_mut());
            for ((p, g), (m, v)) in params.iter_mut().zip(g).zip(moments) {
                let g = g / batch;
                *m = ADAM_BETA1 * *m + (1.0 - ADAM_BETA1) * g;
                *v = ADAM_BETA2 * *v + (1.0 - ADAM_BETA2) * g * g;
                *p -= lr * (*m / c1) / ((*v / c2).sqrt() + ADAM_EPSILON);
            }
        };
        for (l, layer) in network.layers.iter_mut().enumerate() {
            update(
                &mut layer.weights,
                &grads.weights[l],
                &mut self.m.weights[l],
                &mut self.v.weights[l],
            );
            update(
                &mut layer.biases,
                &grads.biases[l],
                &mut self.m.biases[l],
                &mut self.v.biases[l],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{SyntheticGenerator, generate_dataset, one_hot};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn small_config() -> TrainingConfig {
        TrainingConfig {
            resample_count: 8,
            hidden: vec![24],
            dropout: 0.0,
            epochs: 25,
            batch_size: 16,
            learning_rate: 0.01,
            examples_per_class: 6,
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn loss_decreases_on_synthetic_gestures() {
        let config = small_config();
        let mut rng = StdRng::seed_from_u64(21);
        let mut net = config.topology().build(&mut rng).unwrap();
        let data = generate_dataset(
            &SyntheticGenerator::default(),
            config.examples_per_class,
            config.resample_count,
            &mut rng,
        );
        let (train, validation) = data.split(config.validation_fraction);
        let report = fit(&mut net, &train, &validation, &config, &mut rng).unwrap();
        assert_eq!(report.epochs.len(), 25);
        let (first, last) = report.loss_trend().unwrap();
        assert!(last < first, "loss went from {first} to {last}");
        let stats = report.last().unwrap();
        assert!(stats.validation_loss.is_some());
        assert!(stats.validation_accuracy.is_some_and(|a| (0.0..=1.0).contains(&a)));
    }

    #[test]
    fn separable_toy_problem_is_learned() {
        let topology = NetworkTopology {
            input: 2,
            hidden: vec![8],
            output: 2,
            dropout: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(4);
        let mut net = topology.build(&mut rng).unwrap();
        let data = Dataset::from_parts(
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.9, 0.1], vec![0.1, 0.9]],
            vec![one_hot(0, 2), one_hot(1, 2), one_hot(0, 2), one_hot(1, 2)],
        )
        .unwrap();
        let config = TrainingConfig {
            epochs: 200,
            batch_size: 2,
            learning_rate: 0.05,
            ..TrainingConfig::default()
        };
        fit(&mut net, &data, &data, &config, &mut rng).unwrap();
        assert!(net.predict(&[1.0, 0.0]).unwrap()[0] > 0.9);
        assert!(net.predict(&[0.0, 1.0]).unwrap()[1] > 0.9);
        let (_, accuracy) = evaluate(&net, &data).unwrap().unwrap();
        assert_eq!(accuracy, 1.0);
    }

    #[test]
    fn dropout_masks_and_rescales_hidden_units() {
        let topology = NetworkTopology {
            input: 4,
            hidden: vec![64],
            output: 2,
            dropout: 0.5,
        };
        let mut rng = StdRng::seed_from_u64(9);
        let net = topology.build(&mut rng).unwrap();
        let pass = forward_train(&net, &[1.0, 1.0, 1.0, 1.0], &mut rng);
        assert!(pass.gates[0].iter().all(|&g| g == 0.0 || g == 2.0));
        assert!(pass.gates[0].iter().any(|&g| g == 0.0));
        assert!((pass.output().iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fit_rejects_bad_inputs() {
        let config = small_config();
        let mut rng = StdRng::seed_from_u64(0);
        let mut net = config.topology().build(&mut rng).unwrap();

        let empty = Dataset::default();
        assert_eq!(
            fit(&mut net, &empty, &empty, &config, &mut rng),
            Err(TrainError::EmptyDataset)
        );

        let narrow = Dataset::single(vec![0.0; 4], 0, 22).unwrap();
        assert!(matches!(
            fit(&mut net, &narrow, &empty, &config, &mut rng),
            Err(TrainError::ShapeMismatch { what: "training input", expected: 16, actual: 4 })
        ));

        let ok = Dataset::single(vec![0.0; 16], 0, 22).unwrap();
        let wrong_classes = Dataset::single(vec![0.0; 16], 0, 3).unwrap();
        assert!(matches!(
            fit(&mut net, &ok, &wrong_classes, &config, &mut rng),
            Err(TrainError::ShapeMismatch { what: "validation target", .. })
        ));

        let no_epochs = TrainingConfig {
            epochs: 0,
            ..config.clone()
        };
        assert!(matches!(
            fit(&mut net, &ok, &empty, &no_epochs, &mut rng),
            Err(TrainError::InvalidConfig(_))
        ));
    }

    #[test]
    fn diverging_loss_is_reported() {
        let topology = NetworkTopology {
            input: 2,
            hidden: vec![],
            output: 2,
            dropout: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(5);
        let mut net = topology.build(&mut rng).unwrap();
        let data = Dataset::single(vec![f64::NAN, 0.0], 1, 2).unwrap();
        assert_eq!(
            fit(&mut net, &data, &Dataset::default(), &TrainingConfig::default(), &mut rng),
            Err(TrainError::NonFiniteLoss { epoch: 1 })
        );
    }
}
