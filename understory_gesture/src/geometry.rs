// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pure geometry over point sequences.
//!
//! Everything here is shared by the rule-based recognizer and by the
//! preprocessing of the trainable recognizer. Coordinates are screen-style:
//! `x` grows to the right and `y` grows downward.

use alloc::vec::Vec;

use kurbo::{Point, Rect};

/// Axis-aligned bounds of a point set.
///
/// This is a derived value: it is recomputed from a point set with [`bounds`]
/// and never updated in place.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GestureBounds {
    /// Minimum x (left).
    pub min_x: f64,
    /// Maximum x (right).
    pub max_x: f64,
    /// Minimum y (top).
    pub min_y: f64,
    /// Maximum y (bottom).
    pub max_y: f64,
    /// `max_x - min_x`.
    pub width: f64,
    /// `max_y - min_y`.
    pub height: f64,
    /// Horizontal center.
    pub center_x: f64,
    /// Vertical center.
    pub center_y: f64,
}

impl GestureBounds {
    /// Bounds spanning the given corners.
    pub fn from_extents(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        let width = max_x - min_x;
        let height = max_y - min_y;
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            width,
            height,
            center_x: min_x + width / 2.0,
            center_y: min_y + height / 2.0,
        }
    }

    /// The center as a point.
    pub fn center(&self) -> Point {
        Point::new(self.center_x, self.center_y)
    }

    /// The bounds as a [`kurbo::Rect`].
    pub fn rect(&self) -> Rect {
        Rect::new(self.min_x, self.min_y, self.max_x, self.max_y)
    }

    /// Width over height, with the height floored at one unit.
    ///
    /// A perfectly flat horizontal stroke therefore reports its width rather
    /// than infinity.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height.max(1.0)
    }

    /// The longer of the two sides.
    pub fn max_extent(&self) -> f64 {
        self.width.max(self.height)
    }

    /// Area of the bounding box.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(p1: Point, p2: Point) -> f64 {
    p1.distance(p2)
}

/// Sum of the distances between consecutive points.
///
/// Returns `0.0` for fewer than two points.
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Bounds of a point set.
///
/// An empty slice yields all-zero bounds.
pub fn bounds(points: &[Point]) -> GestureBounds {
    let Some((first, rest)) = points.split_first() else {
        return GestureBounds::default();
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in rest {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    GestureBounds::from_extents(min_x, min_y, max_x, max_y)
}

/// Arithmetic mean of the points, or the origin for an empty slice.
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::ZERO;
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let n = points.len() as f64;
    Point::new(sx / n, sy / n)
}

/// Resample a polyline into exactly `n` points spaced at equal arc length.
///
/// The walk places a point every `path_length / (n - 1)` units along the
/// polyline, so the result depends on the drawn shape and not on how densely
/// the input was sampled.
///
/// Degenerate inputs:
/// - an empty slice (or `n == 0`) yields an empty vector;
/// - a single point, or a polyline of zero length, yields `n` copies of the
///   first point.
pub fn resample(points: &[Point], n: usize) -> Vec<Point> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    if n == 0 {
        return Vec::new();
    }
    let total = path_length(points);
    if n == 1 || points.len() == 1 || total <= 0.0 {
        return alloc::vec![first; n];
    }

    let interval = total / (n - 1) as f64;
    let mut out = Vec::with_capacity(n);
    out.push(first);

    let mut carried = 0.0;
    let mut prev = first;
    let mut i = 1;
    while i < points.len() && out.len() < n {
        let next = points[i];
        let seg = distance(prev, next);
        if seg > 0.0 && carried + seg >= interval {
            let t = ((interval - carried) / seg).clamp(0.0, 1.0);
            let q = prev.lerp(next, t);
            out.push(q);
            // Continue from the inserted point along the same segment.
            prev = q;
            carried = 0.0;
        } else {
            carried += seg;
            prev = next;
            i += 1;
        }
    }

    // Rounding can leave us one short of the final point.
    let last = points[points.len() - 1];
    while out.len() < n {
        out.push(last);
    }
    out
}

/// Translate and scale a point set into a unit frame and flatten it.
///
/// Points are translated by the bounding-box minimum and divided by
/// `max(width, height, 1)`, so the longer axis spans `[0, 1]` and the aspect
/// ratio is preserved. The output interleaves `x, y` pairs and has length
/// `2 * points.len()`.
pub fn normalize(points: &[Point]) -> Vec<f64> {
    let b = bounds(points);
    let scale = b.max_extent().max(1.0);
    let mut out = Vec::with_capacity(points.len() * 2);
    for p in points {
        out.push((p.x - b.min_x) / scale);
        out.push((p.y - b.min_y) / scale);
    }
    out
}
