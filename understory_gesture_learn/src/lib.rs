// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small trainable gesture classifier.
//!
//! This crate complements the rule cascade in [`understory_gesture`] with a
//! statistical recognizer that learns the whole gesture catalogue, including
//! the shapes that have no rules (triangle, caret, chevron, spiral, loop).
//!
//! There is no recorded training data. Instead, [`synth`] draws labeled
//! example strokes procedurally, and [`TrainableRecognizer`] fits a small
//! dense network to them at startup. Initialization is split into stages
//! that can be run and tested on their own:
//!
//! 1. topology: [`NetworkTopology::build`] creates an initialized [`Network`];
//! 2. synthesize: [`synth::generate_dataset`] produces a shuffled [`Dataset`];
//! 3. fit: [`fit`] trains the network and returns a [`TrainingReport`];
//! 4. promote: the recognizer swaps the trained network in and becomes ready.
//!
//! [`TrainableRecognizer`] implements
//! [`Recognizer`](understory_gesture::Recognizer) and answers `None` until
//! training has finished, so it can sit in front of the rule cascade in a
//! [`Fallback`](understory_gesture::Fallback):
//!
//! ```no_run
//! use understory_gesture::{Fallback, RuleRecognizer};
//! use understory_gesture_learn::TrainableRecognizer;
//!
//! let learned = TrainableRecognizer::new();
//! let _training = learned.spawn_init();
//! let recognizer = Fallback::new(learned.clone(), RuleRecognizer::new());
//! # let _ = recognizer;
//! ```

mod classifier;
mod error;
pub mod network;
pub mod synth;
mod train;

use kurbo::Point;
use understory_gesture::geometry::{normalize, resample};

pub use classifier::{CONFIDENCE_FLOOR, TrainableRecognizer, TrainingState};
pub use error::TrainError;
pub use network::{Network, NetworkTopology};
pub use synth::{Dataset, SyntheticGenerator};
pub use train::{EpochStats, TrainingConfig, TrainingReport, fit};

/// Result type for training operations.
pub type Result<T, E = TrainError> = core::result::Result<T, E>;

/// Default number of points a gesture is resampled to before classification.
pub const DEFAULT_RESAMPLE_COUNT: usize = 32;

/// Turn a gesture into network input.
///
/// Resamples to `resample_count` points and normalizes into the unit frame,
/// giving `2 * resample_count` values. Training data and live gestures both
/// go through this function.
pub fn preprocess(points: &[Point], resample_count: usize) -> Vec<f64> {
    normalize(&resample(points, resample_count))
}
