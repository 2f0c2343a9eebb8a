// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Why building or fitting a gesture network failed.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TrainError {
    /// There were no training examples.
    #[error("training dataset is empty")]
    EmptyDataset,

    /// A vector had the wrong length for the network or dataset.
    #[error("shape mismatch in {what}: expected {expected} values, got {actual}")]
    ShapeMismatch {
        /// Which vector was wrong.
        what: &'static str,
        /// Length the network expects.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// A training parameter is out of range.
    #[error("invalid training configuration: {0}")]
    InvalidConfig(&'static str),

    /// The loss diverged.
    #[error("loss became non-finite in epoch {epoch}")]
    NonFiniteLoss {
        /// Epoch (1-based) in which the loss diverged.
        epoch: usize,
    },
}
