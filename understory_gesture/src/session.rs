// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer-driven gesture capture.
//!
//! [`GestureSession`] turns a stream of pointer down/move/up events into
//! strokes, groups consecutive strokes into one gesture, and hands the
//! flattened points to a [`Recognizer`] once the gesture is complete.
//!
//! A gesture is complete when any of these happens:
//!
//! - the pointer stays up for [`SessionConfig::stroke_gap`] milliseconds,
//!   noticed either by [`GestureSession::poll`] or by the next
//!   [`GestureSession::on_down`];
//! - [`SessionConfig::max_strokes`] strokes have been drawn;
//! - the host calls [`GestureSession::finish`].
//!
//! ## Usage
//!
//! ```
//! use kurbo::Point;
//! use understory_gesture::{GestureKind, GestureOutcome, GestureSession, RuleRecognizer};
//!
//! let mut session = GestureSession::new(RuleRecognizer::new());
//!
//! session.on_down(Point::new(0.0, 0.0), 1000);
//! for i in 1..10_u32 {
//!     session.on_move(Point::new(f64::from(i) * 15.0, 0.0), 1000 + u64::from(i) * 10);
//! }
//! assert!(session.on_up(Point::new(150.0, 0.0), 1100).is_none());
//!
//! // Still within the stroke gap: another stroke could follow.
//! assert!(session.poll(1300).is_none());
//!
//! match session.poll(1600) {
//!     Some(GestureOutcome::Recognized(hit)) => assert_eq!(hit.kind, GestureKind::LineHorizontal),
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! ```
//!
//! The session never runs timers itself; hosts call [`GestureSession::poll`]
//! from their own frame or timer callback.

use alloc::vec::Vec;

use kurbo::Point;
use smallvec::SmallVec;
use tracing::debug;

use crate::{Recognition, Recognizer};

/// Identifier of a stroke within a session.
pub type StrokeId = u32;

/// Default pause, in milliseconds, after which pending strokes form a gesture.
pub const DEFAULT_STROKE_GAP: u64 = 500;
/// Default number of strokes that completes a gesture immediately.
pub const DEFAULT_MAX_STROKES: usize = 4;
/// Default minimum distance between kept samples.
pub const DEFAULT_MIN_SAMPLE_DISTANCE: f64 = 1.0;

/// Timing and sampling parameters for a [`GestureSession`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionConfig {
    /// Milliseconds the pointer must stay up before the gesture completes.
    pub stroke_gap: u64,
    /// Strokes after which the gesture completes without waiting.
    pub max_strokes: usize,
    /// Move samples closer than this to the previous sample are dropped.
    pub min_sample_distance: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stroke_gap: DEFAULT_STROKE_GAP,
            max_strokes: DEFAULT_MAX_STROKES,
            min_sample_distance: DEFAULT_MIN_SAMPLE_DISTANCE,
        }
    }
}

/// One continuous pointer trace from press to release.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    /// Identifier, unique within the session.
    pub id: StrokeId,
    /// Captured samples, never empty.
    pub points: Vec<Point>,
    /// Press timestamp in milliseconds.
    pub start_time: u64,
    /// Timestamp of the latest sample or the release.
    pub end_time: u64,
}

/// What a completed gesture turned out to be.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureOutcome {
    /// The recognizer named the gesture.
    Recognized(Recognition),
    /// The recognizer declined.
    Unrecognized {
        /// Number of points the recognizer was given.
        point_count: usize,
    },
}

impl GestureOutcome {
    /// The recognition, if there was one.
    pub fn recognition(&self) -> Option<&Recognition> {
        match self {
            Self::Recognized(r) => Some(r),
            Self::Unrecognized { .. } => None,
        }
    }
}

/// Stroke accumulator and gesture completion state machine.
///
/// Single-pointer: a second `on_down` while a stroke is active closes the
/// active stroke first.
#[derive(Clone, Debug)]
pub struct GestureSession<R> {
    recognizer: R,
    config: SessionConfig,
    /// Stroke currently being drawn.
    active: Option<Stroke>,
    /// Finished strokes of the current gesture, in drawing order.
    pending: SmallVec<[Stroke; 4]>,
    /// Release time of the latest pending stroke.
    last_up: Option<u64>,
    next_id: StrokeId,
}

impl<R: Recognizer> GestureSession<R> {
    /// Create a session with default timing.
    pub fn new(recognizer: R) -> Self {
        Self::with_config(recognizer, SessionConfig::default())
    }

    /// Create a session with custom timing.
    pub fn with_config(recognizer: R, config: SessionConfig) -> Self {
        Self {
            recognizer,
            config,
            active: None,
            pending: SmallVec::new(),
            last_up: None,
            next_id: 0,
        }
    }

    /// The recognizer gestures are handed to.
    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// The timing parameters.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether a stroke is being drawn.
    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Strokes finished so far for the current gesture.
    pub fn pending_strokes(&self) -> &[Stroke] {
        &self.pending
    }

    /// The stroke being drawn, if any.
    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.active.as_ref()
    }

    /// Record a pointer press.
    ///
    /// Starts a new stroke. If earlier strokes are pending and the pointer has
    /// been up for at least the stroke gap, they are classified first and that
    /// outcome is returned.
    pub fn on_down(&mut self, position: Point, timestamp: u64) -> Option<GestureOutcome> {
        // A missing release: keep what was drawn.
        let full = match self.active.take() {
            Some(stroke) => self.close(stroke, timestamp),
            None => false,
        };
        let flushed = if full || self.gap_elapsed(timestamp) {
            self.complete()
        } else {
            None
        };

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.active = Some(Stroke {
            id,
            points: alloc::vec![position],
            start_time: timestamp,
            end_time: timestamp,
        });
        flushed
    }

    /// Record pointer movement.
    ///
    /// Returns `true` if the sample was appended to the active stroke. Samples
    /// are dropped when no stroke is active or when they sit closer than
    /// [`SessionConfig::min_sample_distance`] to the previous sample.
    pub fn on_move(&mut self, position: Point, timestamp: u64) -> bool {
        let min = self.config.min_sample_distance;
        let Some(stroke) = self.active.as_mut() else {
            return false;
        };
        stroke.end_time = timestamp;
        push_sample(&mut stroke.points, position, min)
    }

    /// Record a pointer release.
    ///
    /// Closes the active stroke. If that brings the gesture to
    /// [`SessionConfig::max_strokes`] strokes, it is classified immediately.
    pub fn on_up(&mut self, position: Point, timestamp: u64) -> Option<GestureOutcome> {
        let mut stroke = self.active.take()?;
        push_sample(&mut stroke.points, position, self.config.min_sample_distance);
        stroke.end_time = timestamp;
        if self.close(stroke, timestamp) {
            self.complete()
        } else {
            None
        }
    }

    /// Check whether the pending gesture has timed out.
    ///
    /// Classifies and returns the outcome when no stroke is being drawn and
    /// the pointer has been up for at least the stroke gap.
    pub fn poll(&mut self, timestamp: u64) -> Option<GestureOutcome> {
        if self.active.is_none() && self.gap_elapsed(timestamp) {
            self.complete()
        } else {
            None
        }
    }

    /// Classify whatever has been drawn, without waiting.
    ///
    /// An active stroke is closed at its latest sample. Returns `None` when
    /// nothing has been drawn.
    pub fn finish(&mut self) -> Option<GestureOutcome> {
        if let Some(stroke) = self.active.take() {
            let end = stroke.end_time;
            self.close(stroke, end);
        }
        self.complete()
    }

    /// Discard all strokes without classifying.
    ///
    /// Returns `true` if anything was discarded.
    pub fn cancel(&mut self) -> bool {
        let had_any = self.active.is_some() || !self.pending.is_empty();
        self.active = None;
        self.pending.clear();
        self.last_up = None;
        had_any
    }

    /// Move a finished stroke to the pending gesture.
    ///
    /// Returns `true` once the gesture holds `max_strokes` strokes.
    fn close(&mut self, stroke: Stroke, released_at: u64) -> bool {
        self.pending.push(stroke);
        self.last_up = Some(released_at);
        self.pending.len() >= self.config.max_strokes
    }

    fn gap_elapsed(&self, now: u64) -> bool {
        !self.pending.is_empty()
            && self
                .last_up
                .is_some_and(|up| now.saturating_sub(up) >= self.config.stroke_gap)
    }

    fn complete(&mut self) -> Option<GestureOutcome> {
        if self.pending.is_empty() {
            return None;
        }
        let strokes = self.pending.len();
        let points: Vec<Point> = self
            .pending
            .drain(..)
            .flat_map(|s| s.points)
            .collect();
        self.last_up = None;

        let outcome = match self.recognizer.recognize(&points) {
            Some(hit) => GestureOutcome::Recognized(hit),
            None => GestureOutcome::Unrecognized {
                point_count: points.len(),
            },
        };
        debug!(strokes, points = points.len(), ?outcome, "gesture complete");
        Some(outcome)
    }
}

fn push_sample(points: &mut Vec<Point>, position: Point, min_distance: f64) -> bool {
    if points
        .last()
        .is_some_and(|last| last.distance(position) < min_distance)
    {
        return false;
    }
    points.push(position);
    true
}
