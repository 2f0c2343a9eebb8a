// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic, feature-based gesture classification.
//!
//! [`RuleRecognizer`] runs a fixed decision cascade over the shape predicates
//! in [`features`](crate::features). The first predicate that matches wins,
//! and each class reports a fixed confidence.
//!
//! Precedence, first match wins:
//!
//! 1. X, unless the drawing also reads as a plus
//! 2. plus
//! 3. check
//! 4. circle
//! 5. rectangle, unless the drawing also reads as a circle
//! 6. arc
//! 7. zigzag
//! 8. arrow
//! 9. line
//!
//! Only the first seventeen catalogue classes have rules. The remaining ones
//! (triangle, caret, chevron, spiral, loop) are left to trainable recognizers.

use kurbo::Point;
use tracing::{debug, trace};

use crate::features::{ArcBow, ArrowDirection, LineOrientation, ShapeAnalysis, ShapeParams};
use crate::{GestureKind, Recognition, Recognizer};

/// Fewest points the cascade will look at.
pub const MIN_POINTS: usize = 5;
/// Drawings smaller than this on both axes are ignored.
pub const MIN_SIZE: f64 = 20.0;

/// Confidence reported for circles.
pub const CIRCLE_CONFIDENCE: f64 = 0.85;
/// Confidence reported for checks.
pub const CHECK_CONFIDENCE: f64 = 0.85;
/// Confidence reported for X.
pub const X_CONFIDENCE: f64 = 0.8;
/// Confidence reported for plus.
pub const PLUS_CONFIDENCE: f64 = 0.8;
/// Confidence reported for rectangles.
pub const RECTANGLE_CONFIDENCE: f64 = 0.75;
/// Confidence reported for zigzags.
pub const ZIGZAG_CONFIDENCE: f64 = 0.75;
/// Confidence reported for horizontal lines.
pub const LINE_HORIZONTAL_CONFIDENCE: f64 = 0.8;
/// Confidence reported for vertical lines.
pub const LINE_VERTICAL_CONFIDENCE: f64 = 0.75;
/// Confidence reported for diagonal lines.
pub const LINE_DIAGONAL_CONFIDENCE: f64 = 0.7;
/// Confidence reported for arrows.
pub const ARROW_CONFIDENCE: f64 = 0.75;
/// Confidence reported for arcs.
pub const ARC_CONFIDENCE: f64 = 0.7;

/// Thresholds for [`RuleRecognizer`].
#[derive(Clone, Debug, PartialEq)]
pub struct RuleConfig {
    /// Shape predicate thresholds.
    pub shapes: ShapeParams,
    /// Fewest points to classify.
    pub min_points: usize,
    /// Minimum extent; drawings below it on both axes are ignored.
    pub min_size: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            shapes: ShapeParams::default(),
            min_points: MIN_POINTS,
            min_size: MIN_SIZE,
        }
    }
}

/// Stateless rule-based recognizer.
///
/// Always ready. Classification is a pure function of the points and the
/// configuration.
#[derive(Clone, Debug, Default)]
pub struct RuleRecognizer {
    config: RuleConfig,
}

impl RuleRecognizer {
    /// A recognizer with the default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A recognizer with custom thresholds.
    pub fn with_config(config: RuleConfig) -> Self {
        Self { config }
    }

    /// The thresholds in use.
    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    fn classify(&self, points: &[Point]) -> Option<(GestureKind, f64)> {
        if points.len() < self.config.min_points {
            trace!(points = points.len(), "too few points");
            return None;
        }
        let shape = ShapeAnalysis::new(points, &self.config.shapes);
        let b = shape.bounds();
        if b.width < self.config.min_size && b.height < self.config.min_size {
            trace!(width = b.width, height = b.height, "drawing too small");
            return None;
        }

        let x = shape.is_x();
        let plus = shape.is_plus();
        trace!(x, plus, corners = shape.corners(), "crossing tests");
        if x && !plus {
            return Some((GestureKind::X, X_CONFIDENCE));
        }
        if plus {
            return Some((GestureKind::Plus, PLUS_CONFIDENCE));
        }

        if shape.is_checkmark() {
            return Some((GestureKind::Check, CHECK_CONFIDENCE));
        }

        let circle = shape.is_roughly_circular();
        trace!(circle, "circle test");
        if circle {
            return Some((GestureKind::Circle, CIRCLE_CONFIDENCE));
        }
        // Circles returned above, so this never also reads as one.
        if shape.is_rectangle() {
            return Some((GestureKind::Rectangle, RECTANGLE_CONFIDENCE));
        }

        if let Some(bow) = shape.arc() {
            let kind = match bow {
                ArcBow::Left => GestureKind::ArcLeft,
                ArcBow::Right => GestureKind::ArcRight,
                ArcBow::Up => GestureKind::ArcUp,
                ArcBow::Down => GestureKind::ArcDown,
            };
            return Some((kind, ARC_CONFIDENCE));
        }

        if shape.is_zigzag() {
            return Some((GestureKind::Zigzag, ZIGZAG_CONFIDENCE));
        }

        if let Some(dir) = shape.arrow() {
            let kind = match dir {
                ArrowDirection::Up => GestureKind::ArrowUp,
                ArrowDirection::Down => GestureKind::ArrowDown,
                ArrowDirection::Left => GestureKind::ArrowLeft,
                ArrowDirection::Right => GestureKind::ArrowRight,
            };
            return Some((kind, ARROW_CONFIDENCE));
        }

        shape.line().map(|orientation| match orientation {
            LineOrientation::Horizontal => (GestureKind::LineHorizontal, LINE_HORIZONTAL_CONFIDENCE),
            LineOrientation::Vertical => (GestureKind::LineVertical, LINE_VERTICAL_CONFIDENCE),
            LineOrientation::Diagonal => (GestureKind::LineDiagonal, LINE_DIAGONAL_CONFIDENCE),
        })
    }
}

impl Recognizer for RuleRecognizer {
    fn recognize(&self, points: &[Point]) -> Option<Recognition> {
        let result = self.classify(points);
        match result {
            Some((kind, confidence)) => {
                debug!(gesture = kind.name(), confidence, "rule match");
                Some(Recognition::new(kind, confidence))
            }
            None => {
                debug!(points = points.len(), "no rule matched");
                None
            }
        }
    }
}
