// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small dense feed-forward network.
//!
//! Hidden layers use ReLU with inverted dropout during training; the output
//! layer is a softmax over the gesture catalogue. Weights are stored
//! row-major, one row per output unit.

use rand::Rng;
use understory_gesture::GestureKind;

use crate::{DEFAULT_RESAMPLE_COUNT, Result, TrainError};

/// Default hidden layer widths.
pub const DEFAULT_HIDDEN: [usize; 2] = [128, 64];
/// Default dropout probability for hidden units during training.
pub const DEFAULT_DROPOUT: f64 = 0.2;

/// Layer widths and regularization of a [`Network`].
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkTopology {
    /// Input width, twice the resample count.
    pub input: usize,
    /// Hidden layer widths, in order.
    pub hidden: Vec<usize>,
    /// Output width, one unit per class.
    pub output: usize,
    /// Probability of dropping a hidden unit during training.
    pub dropout: f64,
}

impl Default for NetworkTopology {
    fn default() -> Self {
        Self::for_catalogue(DEFAULT_RESAMPLE_COUNT, &DEFAULT_HIDDEN, DEFAULT_DROPOUT)
    }
}

impl NetworkTopology {
    /// Topology for gestures resampled to `resample_count` points, with one
    /// output per catalogue class.
    pub fn for_catalogue(resample_count: usize, hidden: &[usize], dropout: f64) -> Self {
        Self {
            input: 2 * resample_count,
            hidden: hidden.to_vec(),
            output: GestureKind::ALL.len(),
            dropout,
        }
    }

    /// `(inputs, outputs)` of every layer, input side first.
    pub fn layer_shapes(&self) -> Vec<(usize, usize)> {
        let mut widths = Vec::with_capacity(self.hidden.len() + 2);
        widths.push(self.input);
        widths.extend_from_slice(&self.hidden);
        widths.push(self.output);
        widths.windows(2).map(|w| (w[0], w[1])).collect()
    }

    /// Check that every width is non-zero and dropout is in `[0, 1)`.
    pub fn validate(&self) -> Result<()> {
        if self.input == 0 || self.output == 0 || self.hidden.contains(&0) {
            return Err(TrainError::InvalidConfig("layer widths must be non-zero"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(TrainError::InvalidConfig("dropout must be in [0, 1)"));
        }
        Ok(())
    }

    /// Create a network with Glorot-uniform weights and zero biases.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Network> {
        self.validate()?;
        let layers = self
            .layer_shapes()
            .into_iter()
            .map(|(inputs, outputs)| Dense::glorot(inputs, outputs, rng))
            .collect();
        Ok(Network {
            layers,
            dropout: self.dropout,
        })
    }
}

/// One fully connected layer.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Dense {
    pub(crate) inputs: usize,
    pub(crate) outputs: usize,
    /// `outputs` rows of `inputs` weights.
    pub(crate) weights: Vec<f64>,
    pub(crate) biases: Vec<f64>,
}

impl Dense {
    fn glorot<R: Rng + ?Sized>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + outputs) as f64).sqrt();
        let weights = (0..inputs * outputs)
            .map(|_| rng.random_range(-limit..=limit))
            .collect();
        Self {
            inputs,
            outputs,
            weights,
            biases: vec![0.0; outputs],
        }
    }

    /// `W x + b`.
    pub(crate) fn affine(&self, x: &[f64]) -> Vec<f64> {
        self.weights
            .chunks_exact(self.inputs)
            .zip(&self.biases)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect()
    }
}

/// A trained or freshly initialized classifier network.
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    pub(crate) layers: Vec<Dense>,
    pub(crate) dropout: f64,
}

impl Network {
    /// Expected input width.
    pub fn input_width(&self) -> usize {
        self.layers.first().map_or(0, |l| l.inputs)
    }

    /// Number of output classes.
    pub fn output_width(&self) -> usize {
        self.layers.last().map_or(0, |l| l.outputs)
    }

    /// The topology this network was built from.
    pub fn topology(&self) -> NetworkTopology {
        let hidden = self.layers[..self.layers.len().saturating_sub(1)]
            .iter()
            .map(|l| l.outputs)
            .collect();
        NetworkTopology {
            input: self.input_width(),
            hidden,
            output: self.output_width(),
            dropout: self.dropout,
        }
    }

    /// Total number of weights and biases.
    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.biases.len())
            .sum()
    }

    /// Class probabilities for one input, without dropout.
    pub fn predict(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_width() {
            return Err(TrainError::ShapeMismatch {
                what: "network input",
                expected: self.input_width(),
                actual: input.len(),
            });
        }
        let last = self.layers.len().saturating_sub(1);
        let mut x = input.to_vec();
        for (i, layer) in self.layers.iter().enumerate() {
            let z = layer.affine(&x);
            x = if i == last { softmax(&z) } else { relu(z) };
        }
        Ok(x)
    }
}

pub(crate) fn relu(mut z: Vec<f64>) -> Vec<f64> {
    for v in &mut z {
        *v = v.max(0.0);
    }
    z
}

/// Numerically stable softmax.
pub(crate) fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = z.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn default_topology_matches_catalogue() {
        let t = NetworkTopology::default();
        assert_eq!(t.input, 64);
        assert_eq!(t.hidden, vec![128, 64]);
        assert_eq!(t.output, 22);
        assert_eq!(t.layer_shapes(), vec![(64, 128), (128, 64), (64, 22)]);
    }

    #[test]
    fn build_shapes_layers_without_training() {
        let t = NetworkTopology::default();
        let net = t.build(&mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(net.input_width(), 64);
        assert_eq!(net.output_width(), 22);
        assert_eq!(net.topology(), t);
        assert_eq!(net.parameter_count(), 64 * 128 + 128 + 128 * 64 + 64 + 64 * 22 + 22);
    }

    #[test]
    fn glorot_weights_stay_in_limit() {
        let net = NetworkTopology::for_catalogue(8, &[10], 0.0)
            .build(&mut StdRng::seed_from_u64(1))
            .unwrap();
        let limit = (6.0_f64 / 26.0).sqrt();
        assert!(net.layers[0].weights.iter().all(|w| w.abs() <= limit));
        assert!(net.layers[0].biases.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn invalid_topologies_are_rejected() {
        let mut rng = StdRng::seed_from_u64(2);
        let zero = NetworkTopology::for_catalogue(8, &[0], 0.0);
        assert!(matches!(zero.build(&mut rng), Err(TrainError::InvalidConfig(_))));
        let dropout = NetworkTopology::for_catalogue(8, &[4], 1.0);
        assert!(matches!(dropout.build(&mut rng), Err(TrainError::InvalidConfig(_))));
    }

    #[test]
    fn predict_is_a_distribution() {
        let net = NetworkTopology::for_catalogue(4, &[6, 5], 0.5)
            .build(&mut StdRng::seed_from_u64(3))
            .unwrap();
        let p = net.predict(&[0.1, 0.9, 0.4, 0.2, 0.0, 1.0, 0.3, 0.3]).unwrap();
        assert_eq!(p.len(), 22);
        assert!(p.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        // Inference is deterministic; dropout only applies while fitting.
        assert_eq!(net.predict(&[0.1, 0.9, 0.4, 0.2, 0.0, 1.0, 0.3, 0.3]).unwrap(), p);
    }

    #[test]
    fn predict_checks_width() {
        let net = NetworkTopology::for_catalogue(4, &[6], 0.0)
            .build(&mut StdRng::seed_from_u64(4))
            .unwrap();
        assert_eq!(
            net.predict(&[0.0; 3]),
            Err(TrainError::ShapeMismatch {
                what: "network input",
                expected: 8,
                actual: 3
            })
        );
    }

    #[test]
    fn softmax_survives_large_logits() {
        let p = softmax(&[1000.0, 1000.0]);
        assert_eq!(p, vec![0.5, 0.5]);
    }
}
