// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Symbolic gesture recognition over drawn strokes.
//!
//! A user draws one or more strokes on a surface; this crate decides which of
//! a fixed vocabulary of symbolic gestures (circle, check, X, arrows, arcs,
//! ...) the drawing represents and reports it together with the action the
//! gesture maps to and a confidence score.
//!
//! # Key types
//!
//! - [`GestureKind`] – the ordered catalogue of gesture classes, each with a
//!   name, an action identifier, and a description.
//! - [`Recognition`] – one classification result `{ kind, confidence }`.
//! - [`Recognizer`] – the contract every classifier implements. This crate
//!   provides the deterministic [`RuleRecognizer`]; trainable classifiers live
//!   in other crates and plug in through the same trait. [`Fallback`] chains
//!   two recognizers.
//! - [`GestureSession`] – turns raw pointer down/move/up events into strokes,
//!   groups strokes into gestures by timing, and classifies them.
//!
//! The [`geometry`] and [`features`] modules expose the building blocks
//! (resampling, normalization, direction changes, shape predicates) so that
//! hosts and other recognizers can share them.
//!
//! # Example
//!
//! ```
//! use kurbo::Point;
//! use understory_gesture::{GestureKind, Recognizer, RuleRecognizer};
//!
//! let stroke: Vec<Point> = (0..10)
//!     .map(|i| Point::new(f64::from(i) * 150.0 / 9.0, f64::from(i) * 5.0 / 9.0))
//!     .collect();
//!
//! let hit = RuleRecognizer::new().recognize(&stroke).unwrap();
//! assert_eq!(hit.kind, GestureKind::LineHorizontal);
//! assert_eq!(hit.action(), "strikethrough");
//! ```
//!
//! ## Features
//!
//! - `std` (default): use the standard library float functions.
//! - `libm`: use `libm` for float math in `no_std` builds.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod catalogue;
pub mod features;
pub mod geometry;
mod recognizer;
pub mod rules;
pub mod session;

pub use catalogue::{GestureClassDefinition, GestureKind, Recognition};
pub use geometry::GestureBounds;
pub use recognizer::{Fallback, Recognizer};
pub use rules::{RuleConfig, RuleRecognizer};
pub use session::{GestureOutcome, GestureSession, SessionConfig, Stroke, StrokeId};
