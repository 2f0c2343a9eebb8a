// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometric features and shape predicates.
//!
//! The free functions compute raw features of a point set (closedness,
//! direction changes, enclosed area, ...). The shape predicates combine those
//! features into tests such as "is this a checkmark". All of them operate on a
//! whole gesture, which may be several strokes flattened into one sequence.
//!
//! Predicates are evaluated through [`ShapeAnalysis`], which caches the shared
//! inputs (bounds, direction-change counts) so that a recognizer asking several
//! questions about the same gesture only walks the points once per feature.

use core::cell::Cell;
use core::f64::consts::{FRAC_PI_3, FRAC_PI_4, FRAC_PI_6, PI};
use core::ops::RangeInclusive;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Point;

use crate::geometry::{GestureBounds, bounds, distance, path_length};

/// Closedness ratio used when no shape-specific ratio applies.
pub const DEFAULT_CLOSED_RATIO: f64 = 0.15;
/// Closedness ratio for circles (loose; freehand circles rarely close well).
pub const CIRCLE_CLOSED_RATIO: f64 = 0.25;
/// Closedness ratio for rectangles.
pub const RECTANGLE_CLOSED_RATIO: f64 = 0.2;

/// Turn angle that counts as a corner for crossings, checks, rectangles,
/// zigzags and arrows (45°).
pub const CORNER_ANGLE: f64 = FRAC_PI_4;
/// Coarser turn angle used when testing for lines (60°).
pub const LINE_ANGLE: f64 = FRAC_PI_3;
/// Finer turn angle used when testing for arcs (30°).
pub const ARC_ANGLE: f64 = FRAC_PI_6;

/// Accepted width/height band for circles.
pub const CIRCLE_ASPECT: RangeInclusive<f64> = 0.6..=1.6;
/// Accepted enclosed-area / bounding-box-area band for circles.
///
/// A true circle fills π/4 ≈ 0.785 of its box.
pub const CIRCLE_FILL: RangeInclusive<f64> = 0.4..=1.2;
/// Accepted width/height band for crossing shapes (X and plus).
pub const CROSS_ASPECT: RangeInclusive<f64> = 0.5..=2.0;
/// Direction-change range for an X.
pub const X_CHANGES: RangeInclusive<usize> = 1..=8;
/// Direction-change range for a plus.
pub const PLUS_CHANGES: RangeInclusive<usize> = 1..=6;
/// Half-width of the center bands used by the plus test, as a fraction of the
/// bounding-box side.
pub const PLUS_BAND_RATIO: f64 = 0.15;
/// Points required on each bar of a plus.
pub const PLUS_MIN_BAR_POINTS: usize = 3;
/// How far the final point of a check must rise above its lowest point, as a
/// fraction of the bounding-box height.
pub const CHECK_RISE_RATIO: f64 = 0.2;
/// Where the lowest point of a check may sit, as a fraction of the stroke.
pub const CHECK_VERTEX_RANGE: RangeInclusive<f64> = 0.2..=0.7;
/// Direction-change range for a rectangle.
pub const RECTANGLE_CHANGES: RangeInclusive<usize> = 3..=6;
/// Minimum direction changes for a zigzag.
pub const ZIGZAG_MIN_CHANGES: usize = 4;
/// A zigzag must be wider than this fraction of its height.
pub const ZIGZAG_MIN_WIDTH_RATIO: f64 = 0.8;
/// Minimum straight-distance / path-length ratio for a line.
pub const LINE_MIN_STRAIGHTNESS: f64 = 0.8;
/// Maximum direction changes (at [`LINE_ANGLE`]) for a line.
pub const LINE_MAX_CHANGES: usize = 3;
/// Lines wider than this aspect ratio are horizontal.
pub const LINE_HORIZONTAL_ASPECT: f64 = 3.0;
/// Lines narrower than this aspect ratio are vertical.
pub const LINE_VERTICAL_ASPECT: f64 = 0.33;
/// Minimum points for an arrow.
pub const ARROW_MIN_POINTS: usize = 5;
/// Direction-change range for an arrow.
pub const ARROW_CHANGES: RangeInclusive<usize> = 1..=6;
/// How much the dominant axis of an arrow must exceed the other.
pub const ARROW_AXIS_DOMINANCE: f64 = 1.5;
/// Minimum points for an arc.
pub const ARC_MIN_POINTS: usize = 10;
/// Maximum direction changes (at [`ARC_ANGLE`]) for an arc.
pub const ARC_MAX_CHANGES: usize = 2;
/// Aspect band that counts as square; arcs must fall outside it.
pub const ARC_SQUARE_ASPECT: RangeInclusive<f64> = 0.5..=2.0;
/// The long side of an arc must exceed this multiple of the short side.
pub const ARC_ELONGATION: f64 = 2.0;
/// How far the midpoint of an arc must bow, as a fraction of the short side.
pub const ARC_MIN_BOW: f64 = 0.3;

/// Tunable thresholds for the shape predicates.
///
/// The default uses the named constants of this module. Tests and hosts can
/// override individual values to probe boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeParams {
    /// Turn angle for corner counting.
    pub corner_angle: f64,
    /// Turn angle for line detection.
    pub line_angle: f64,
    /// Turn angle for arc detection.
    pub arc_angle: f64,
    /// Closedness ratio for circles.
    pub circle_closed_ratio: f64,
    /// Closedness ratio for rectangles.
    pub rectangle_closed_ratio: f64,
    /// Aspect band for circles.
    pub circle_aspect: RangeInclusive<f64>,
    /// Fill band for circles.
    pub circle_fill: RangeInclusive<f64>,
    /// Aspect band for X and plus.
    pub cross_aspect: RangeInclusive<f64>,
    /// Band half-width ratio for plus bars.
    pub plus_band_ratio: f64,
    /// Minimum straightness for lines.
    pub line_min_straightness: f64,
    /// Minimum bow for arcs.
    pub arc_min_bow: f64,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            corner_angle: CORNER_ANGLE,
            line_angle: LINE_ANGLE,
            arc_angle: ARC_ANGLE,
            circle_closed_ratio: CIRCLE_CLOSED_RATIO,
            rectangle_closed_ratio: RECTANGLE_CLOSED_RATIO,
            circle_aspect: CIRCLE_ASPECT,
            circle_fill: CIRCLE_FILL,
            cross_aspect: CROSS_ASPECT,
            plus_band_ratio: PLUS_BAND_RATIO,
            line_min_straightness: LINE_MIN_STRAIGHTNESS,
            arc_min_bow: ARC_MIN_BOW,
        }
    }
}

/// Overall start-to-end movement of a point set.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Direction {
    /// Horizontal displacement.
    pub dx: f64,
    /// Vertical displacement (positive is down).
    pub dy: f64,
    /// `atan2(dy, dx)` in radians.
    pub angle: f64,
}

bitflags::bitflags! {
    /// Quadrants around a center point that contain at least one point.
    ///
    /// Points on a center line count toward the right / bottom side.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Quadrants: u8 {
        /// Left of and above the center.
        const TOP_LEFT = 1 << 0;
        /// Right of and above the center.
        const TOP_RIGHT = 1 << 1;
        /// Left of and below the center.
        const BOTTOM_LEFT = 1 << 2;
        /// Right of and below the center.
        const BOTTOM_RIGHT = 1 << 3;
    }
}

/// Orientation of a line gesture.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LineOrientation {
    /// Much wider than tall.
    Horizontal,
    /// Much taller than wide.
    Vertical,
    /// Anything in between.
    Diagonal,
}

/// Direction an arrow points, from its start to its end.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArrowDirection {
    /// Toward smaller `y`.
    Up,
    /// Toward larger `y`.
    Down,
    /// Toward smaller `x`.
    Left,
    /// Toward larger `x`.
    Right,
}

/// Which way an arc bows away from the chord between its endpoints.
///
/// `Left` and `Right` are vertical arcs; `Up` and `Down` are horizontal arcs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArcBow {
    /// A tall arc whose middle sits left of its endpoints.
    Left,
    /// A tall arc whose middle sits right of its endpoints.
    Right,
    /// A wide arc whose middle sits above its endpoints.
    Up,
    /// A wide arc whose middle sits below its endpoints.
    Down,
}

impl ArcBow {
    /// Whether the arc is taller than it is wide.
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Whether the gesture ends near where it started.
///
/// True when the start-to-end distance is below `threshold_ratio` times the
/// longer bounding-box side. Always false for fewer than three points or a
/// zero-size gesture.
pub fn is_closed(points: &[Point], threshold_ratio: f64) -> bool {
    closed_within(points, &bounds(points), threshold_ratio)
}

fn closed_within(points: &[Point], b: &GestureBounds, threshold_ratio: f64) -> bool {
    if points.len() < 3 {
        return false;
    }
    let size = b.max_extent();
    if size <= 0.0 {
        return false;
    }
    distance(points[0], points[points.len() - 1]) < threshold_ratio * size
}

/// Turns within rounding of the threshold do not count.
const ANGLE_EPSILON: f64 = 1e-9;

/// Count turns sharper than `angle_threshold` radians along the polyline.
///
/// Tangents use a 2-point stride: at sample `i` the tangent arriving from
/// sample `i - 2` is compared with the one leaving toward sample `i + 2`, and
/// the absolute difference of their angles, wrapped into `[0, π]`, is the
/// turn there. Spanning two samples keeps pixel-sized jitter on an otherwise
/// straight drag from reading as corners.
///
/// Adjacent samples over the threshold form one direction change, so a sharp
/// corner counts once even when its neighbors also see it. Zero-length
/// tangents (repeated samples) are skipped. Fewer than five points have no
/// turns.
pub fn count_direction_changes(points: &[Point], angle_threshold: f64) -> usize {
    let mut changes = 0;
    let mut turning = false;
    for w in points.windows(5) {
        let incoming = w[2] - w[0];
        let outgoing = w[4] - w[2];
        if incoming.hypot2() == 0.0 || outgoing.hypot2() == 0.0 {
            continue;
        }
        let mut diff = (outgoing.atan2() - incoming.atan2()).abs();
        if diff > PI {
            diff = 2.0 * PI - diff;
        }
        let sharp = diff > angle_threshold + ANGLE_EPSILON;
        if sharp && !turning {
            changes += 1;
        }
        turning = sharp;
    }
    changes
}

/// Vector from the first to the last point.
///
/// Zero for fewer than two points.
pub fn overall_direction(points: &[Point]) -> Direction {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 2 => {
            let v = *last - *first;
            Direction {
                dx: v.x,
                dy: v.y,
                angle: v.atan2(),
            }
        }
        _ => Direction::default(),
    }
}

/// Absolute shoelace area of the sequence, treated as implicitly closed.
pub fn enclosed_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice.abs() / 2.0
}

/// Quadrants around `center` that contain at least one point.
pub fn quadrants(points: &[Point], center: Point) -> Quadrants {
    let mut found = Quadrants::empty();
    for p in points {
        found |= match (p.x < center.x, p.y < center.y) {
            (true, true) => Quadrants::TOP_LEFT,
            (false, true) => Quadrants::TOP_RIGHT,
            (true, false) => Quadrants::BOTTOM_LEFT,
            (false, false) => Quadrants::BOTTOM_RIGHT,
        };
        if found.is_all() {
            break;
        }
    }
    found
}

/// Cached view of one gesture for evaluating shape predicates.
///
/// Bounds are computed up front; direction-change counts are computed on
/// first use per threshold and reused afterwards.
#[derive(Debug)]
pub struct ShapeAnalysis<'a> {
    points: &'a [Point],
    bounds: GestureBounds,
    params: &'a ShapeParams,
    corners: Cell<Option<usize>>,
    line_turns: Cell<Option<usize>>,
    arc_turns: Cell<Option<usize>>,
}

impl<'a> ShapeAnalysis<'a> {
    /// Analyze `points` using the given thresholds.
    pub fn new(points: &'a [Point], params: &'a ShapeParams) -> Self {
        Self {
            points,
            bounds: bounds(points),
            params,
            corners: Cell::new(None),
            line_turns: Cell::new(None),
            arc_turns: Cell::new(None),
        }
    }

    /// The analyzed points.
    pub fn points(&self) -> &'a [Point] {
        self.points
    }

    /// Bounds of the analyzed points.
    pub fn bounds(&self) -> GestureBounds {
        self.bounds
    }

    fn cached(&self, slot: &Cell<Option<usize>>, angle: f64) -> usize {
        if let Some(n) = slot.get() {
            return n;
        }
        let n = count_direction_changes(self.points, angle);
        slot.set(Some(n));
        n
    }

    /// Direction changes at the corner threshold.
    pub fn corners(&self) -> usize {
        self.cached(&self.corners, self.params.corner_angle)
    }

    /// Direction changes at the coarse line threshold.
    pub fn line_turns(&self) -> usize {
        self.cached(&self.line_turns, self.params.line_angle)
    }

    /// Direction changes at the fine arc threshold.
    pub fn arc_turns(&self) -> usize {
        self.cached(&self.arc_turns, self.params.arc_angle)
    }

    fn aspect_within(&self, band: &RangeInclusive<f64>) -> bool {
        band.contains(&self.bounds.aspect_ratio())
    }

    /// Closed, roughly square, and filling its box like an ellipse does.
    pub fn is_roughly_circular(&self) -> bool {
        let b = &self.bounds;
        if !closed_within(self.points, b, self.params.circle_closed_ratio) {
            return false;
        }
        if !self.aspect_within(&self.params.circle_aspect) {
            return false;
        }
        let box_area = b.area();
        if box_area <= 0.0 {
            return false;
        }
        let fill = enclosed_area(self.points) / box_area;
        self.params.circle_fill.contains(&fill)
    }

    /// One corner, a low vertex in the middle of the stroke, and a rising
    /// final segment.
    pub fn is_checkmark(&self) -> bool {
        let n = self.points.len();
        if n < 3 || self.corners() != 1 {
            return false;
        }
        // Lowest on screen means largest y.
        let (low_idx, low) = self
            .points
            .iter()
            .enumerate()
            .fold((0, self.points[0]), |(bi, bp), (i, p)| {
                if p.y > bp.y { (i, *p) } else { (bi, bp) }
            });
        let last = self.points[n - 1];
        if low.y - last.y < CHECK_RISE_RATIO * self.bounds.height {
            return false;
        }
        let at = low_idx as f64 / (n - 1) as f64;
        CHECK_VERTEX_RANGE.contains(&at)
    }

    /// Two crossing strokes reaching into all four quadrants.
    pub fn is_x(&self) -> bool {
        if !self.aspect_within(&self.params.cross_aspect) {
            return false;
        }
        if !X_CHANGES.contains(&self.corners()) {
            return false;
        }
        quadrants(self.points, self.bounds.center()).is_all()
    }

    /// A vertical bar through the horizontal center and a horizontal bar
    /// through the vertical center.
    pub fn is_plus(&self) -> bool {
        if !self.aspect_within(&self.params.cross_aspect) {
            return false;
        }
        if !PLUS_CHANGES.contains(&self.corners()) {
            return false;
        }
        let b = &self.bounds;
        let tol_x = self.params.plus_band_ratio * b.width;
        let tol_y = self.params.plus_band_ratio * b.height;
        let mut vertical_bar = 0;
        let mut horizontal_bar = 0;
        for p in self.points {
            let off_x = (p.x - b.center_x).abs();
            let off_y = (p.y - b.center_y).abs();
            if off_x <= tol_x && off_y > tol_y {
                vertical_bar += 1;
            }
            if off_y <= tol_y && off_x > tol_x {
                horizontal_bar += 1;
            }
        }
        vertical_bar >= PLUS_MIN_BAR_POINTS && horizontal_bar >= PLUS_MIN_BAR_POINTS
    }

    /// Closed with a handful of corners.
    pub fn is_rectangle(&self) -> bool {
        if !closed_within(self.points, &self.bounds, self.params.rectangle_closed_ratio) {
            return false;
        }
        RECTANGLE_CHANGES.contains(&self.corners())
    }

    /// Many corners on a shape that is not much taller than wide.
    pub fn is_zigzag(&self) -> bool {
        self.corners() >= ZIGZAG_MIN_CHANGES
            && self.bounds.width > ZIGZAG_MIN_WIDTH_RATIO * self.bounds.height
    }

    /// A mostly straight stroke, classified by its aspect ratio.
    pub fn line(&self) -> Option<LineOrientation> {
        let (first, last) = (self.points.first()?, self.points.last()?);
        let length = path_length(self.points);
        if length <= 0.0 {
            return None;
        }
        let straightness = distance(*first, *last) / length;
        if straightness < self.params.line_min_straightness
            || self.line_turns() > LINE_MAX_CHANGES
        {
            return None;
        }
        let aspect = self.bounds.aspect_ratio();
        Some(if aspect > LINE_HORIZONTAL_ASPECT {
            LineOrientation::Horizontal
        } else if aspect < LINE_VERTICAL_ASPECT {
            LineOrientation::Vertical
        } else {
            LineOrientation::Diagonal
        })
    }

    /// A shaft with a head, pointing along the dominant start-to-end axis.
    pub fn arrow(&self) -> Option<ArrowDirection> {
        if self.points.len() < ARROW_MIN_POINTS {
            return None;
        }
        if !ARROW_CHANGES.contains(&self.corners()) {
            return None;
        }
        let dir = overall_direction(self.points);
        let (ax, ay) = (dir.dx.abs(), dir.dy.abs());
        if ax > 0.0 && ax >= ARROW_AXIS_DOMINANCE * ay {
            Some(if dir.dx > 0.0 {
                ArrowDirection::Right
            } else {
                ArrowDirection::Left
            })
        } else if ay > 0.0 && ay >= ARROW_AXIS_DOMINANCE * ax {
            Some(if dir.dy > 0.0 {
                ArrowDirection::Down
            } else {
                ArrowDirection::Up
            })
        } else {
            None
        }
    }

    /// A smooth, elongated curve whose middle bows away from its chord.
    ///
    /// Square shapes are rejected outright, which keeps X and plus (also low
    /// corner counts at this threshold) from reading as arcs.
    pub fn arc(&self) -> Option<ArcBow> {
        let n = self.points.len();
        if n < ARC_MIN_POINTS || self.arc_turns() > ARC_MAX_CHANGES {
            return None;
        }
        if ARC_SQUARE_ASPECT.contains(&self.bounds.aspect_ratio()) {
            return None;
        }
        let b = &self.bounds;
        let first = self.points[0];
        let last = self.points[n - 1];
        let mid = self.points[n / 2];
        if b.height > ARC_ELONGATION * b.width {
            let bow = mid.x - (first.x + last.x) / 2.0;
            if bow.abs() > self.params.arc_min_bow * b.width {
                return Some(if bow < 0.0 { ArcBow::Left } else { ArcBow::Right });
            }
        } else if b.width > ARC_ELONGATION * b.height {
            let bow = mid.y - (first.y + last.y) / 2.0;
            if bow.abs() > self.params.arc_min_bow * b.height {
                return Some(if bow < 0.0 { ArcBow::Up } else { ArcBow::Down });
            }
        }
        None
    }
}

/// Whether the points form a rough circle, using default thresholds.
pub fn is_roughly_circular(points: &[Point]) -> bool {
    ShapeAnalysis::new(points, &ShapeParams::default()).is_roughly_circular()
}

/// Whether the points form a checkmark, using default thresholds.
pub fn is_checkmark(points: &[Point]) -> bool {
    ShapeAnalysis::new(points, &ShapeParams::default()).is_checkmark()
}

/// Whether the points form an X, using default thresholds.
pub fn is_x(points: &[Point]) -> bool {
    ShapeAnalysis::new(points, &ShapeParams::default()).is_x()
}

/// Whether the points form a plus, using default thresholds.
pub fn is_plus(points: &[Point]) -> bool {
    ShapeAnalysis::new(points, &ShapeParams::default()).is_plus()
}

/// Whether the points form a rectangle, using default thresholds.
pub fn is_rectangle(points: &[Point]) -> bool {
    ShapeAnalysis::new(points, &ShapeParams::default()).is_rectangle()
}

/// Whether the points form a zigzag, using default thresholds.
pub fn is_zigzag(points: &[Point]) -> bool {
    ShapeAnalysis::new(points, &ShapeParams::default()).is_zigzag()
}

/// Line orientation of the points, using default thresholds.
pub fn is_line(points: &[Point]) -> Option<LineOrientation> {
    ShapeAnalysis::new(points, &ShapeParams::default()).line()
}

/// Arrow direction of the points, using default thresholds.
pub fn is_arrow(points: &[Point]) -> Option<ArrowDirection> {
    ShapeAnalysis::new(points, &ShapeParams::default()).arrow()
}

/// Arc bow of the points, using default thresholds.
pub fn is_arc(points: &[Point]) -> Option<ArcBow> {
    ShapeAnalysis::new(points, &ShapeParams::default()).arc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{polyline, ring, staircase};
    use alloc::vec::Vec;

    #[test]
    fn closedness_needs_three_points_and_size() {
        assert!(!is_closed(&[Point::ZERO, Point::ZERO], 0.5));
        assert!(!is_closed(&[Point::ZERO; 4], 0.5));
        let tri = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(50.0, 80.0),
            Point::new(5.0, 5.0),
        ];
        assert!(is_closed(&tri, DEFAULT_CLOSED_RATIO));
        assert!(!is_closed(&tri, 0.05));
    }

    #[test]
    fn direction_changes_count_corners() {
        let square = polyline(
            &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0), (0.0, 0.0)],
            5,
        );
        assert_eq!(count_direction_changes(&square, CORNER_ANGLE), 3);
        assert_eq!(count_direction_changes(&ring(40, 50.0), CORNER_ANGLE), 0);
    }

    #[test]
    fn direction_changes_skip_repeated_samples() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(30.0, 0.0),
            Point::new(30.0, 0.0),
            Point::new(40.0, 0.0),
        ];
        assert_eq!(count_direction_changes(&pts, CORNER_ANGLE), 0);
        // Back and forth gives a zero-length tangent.
        let jiggle = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
        ];
        assert_eq!(count_direction_changes(&jiggle, CORNER_ANGLE), 0);
    }

    #[test]
    fn direction_wraps_around_pi() {
        // Heading just above -π then just below π is a tiny turn.
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(-10.0, -0.1),
            Point::new(-20.0, -0.2),
            Point::new(-30.0, -0.1),
            Point::new(-40.0, 0.0),
        ];
        assert_eq!(count_direction_changes(&pts, ARC_ANGLE), 0);
    }

    #[test]
    fn sharp_corner_counts_once() {
        // The samples either side of the vertex also see most of the turn.
        let check = polyline(&[(0.0, 57.0), (25.0, 100.0), (100.0, 0.0)], 8);
        assert_eq!(count_direction_changes(&check, CORNER_ANGLE), 1);
        let zig = polyline(
            &[(0.0, 0.0), (20.0, 40.0), (40.0, 0.0), (60.0, 40.0), (80.0, 0.0), (100.0, 40.0)],
            4,
        );
        assert_eq!(count_direction_changes(&zig, CORNER_ANGLE), 4);
    }

    #[test]
    fn pixel_staircase_has_no_corners() {
        // A straight drag sampled on the pixel grid, one axis step at a time.
        let diagonal = staircase(150, 100);
        assert_eq!(count_direction_changes(&diagonal, CORNER_ANGLE), 0);
        assert_eq!(count_direction_changes(&diagonal, LINE_ANGLE), 0);
        assert!(!is_zigzag(&diagonal));
        let flat = staircase(150, 40);
        assert_eq!(is_line(&flat), Some(LineOrientation::Horizontal));
        // Same drag in the opposite direction.
        let back: Vec<Point> = flat.iter().rev().map(|p| Point::new(p.x, -p.y)).collect();
        assert_eq!(count_direction_changes(&back, CORNER_ANGLE), 0);
        assert_eq!(is_line(&back), Some(LineOrientation::Horizontal));
    }

    #[test]
    fn overall_direction_of_short_input_is_zero() {
        assert_eq!(overall_direction(&[Point::new(4.0, 4.0)]), Direction::default());
        let d = overall_direction(&[Point::new(0.0, 0.0), Point::new(0.0, -10.0)]);
        assert_eq!((d.dx, d.dy), (0.0, -10.0));
        assert!((d.angle + PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn shoelace_area_of_square() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert_eq!(enclosed_area(&square), 100.0);
        // Orientation does not matter.
        let rev: Vec<Point> = square.iter().rev().copied().collect();
        assert_eq!(enclosed_area(&rev), 100.0);
    }

    #[test]
    fn quadrant_scan() {
        let c = Point::new(50.0, 50.0);
        let q = quadrants(&[Point::new(0.0, 0.0), Point::new(100.0, 100.0)], c);
        assert_eq!(q, Quadrants::TOP_LEFT | Quadrants::BOTTOM_RIGHT);
        // Center lines count toward right and bottom.
        assert_eq!(quadrants(&[c], c), Quadrants::BOTTOM_RIGHT);
    }

    #[test]
    fn ring_is_circular() {
        assert!(is_roughly_circular(&ring(40, 50.0)));
    }

    #[test]
    fn open_arc_of_a_ring_is_not_circular() {
        let half: Vec<Point> = ring(40, 50.0).into_iter().take(20).collect();
        assert!(!is_roughly_circular(&half));
    }

    #[test]
    fn checkmark_shape() {
        let check = polyline(&[(0.0, 57.0), (25.0, 100.0), (100.0, 0.0)], 8);
        assert!(is_checkmark(&check));
        // The tail barely rises.
        let flat = polyline(&[(0.0, 0.0), (50.0, 100.0), (100.0, 95.0)], 8);
        assert!(!is_checkmark(&flat));
        // The low vertex sits at the very end.
        let mut late = polyline(&[(0.0, 0.0), (90.0, 100.0)], 16);
        late.extend([Point::new(95.0, 80.0), Point::new(100.0, 60.0)]);
        assert!(!is_checkmark(&late));
    }

    #[test]
    fn line_orientations() {
        let h = polyline(&[(0.0, 0.0), (150.0, 5.0)], 9);
        let v = polyline(&[(0.0, 0.0), (4.0, 150.0)], 9);
        let d = polyline(&[(0.0, 0.0), (100.0, 90.0)], 9);
        assert_eq!(is_line(&h), Some(LineOrientation::Horizontal));
        assert_eq!(is_line(&v), Some(LineOrientation::Vertical));
        assert_eq!(is_line(&d), Some(LineOrientation::Diagonal));
        // A closed shape is not straight.
        assert_eq!(is_line(&ring(40, 50.0)), None);
    }

    #[test]
    fn arrow_direction_follows_dominant_axis() {
        let right = polyline(
            &[(0.0, 50.0), (100.0, 50.0), (80.0, 30.0), (100.0, 50.0), (80.0, 70.0)],
            4,
        );
        assert_eq!(is_arrow(&right), Some(ArrowDirection::Right));
        let up = polyline(
            &[(50.0, 100.0), (50.0, 0.0), (30.0, 20.0), (50.0, 0.0), (70.0, 20.0)],
            4,
        );
        assert_eq!(is_arrow(&up), Some(ArrowDirection::Up));
        // A straight stroke has no head.
        assert_eq!(is_arrow(&polyline(&[(0.0, 0.0), (100.0, 0.0)], 9)), None);
    }

    #[test]
    fn arc_bows() {
        let left: Vec<Point> = (0..=20)
            .map(|i| {
                let t = f64::from(i) / 20.0;
                Point::new(50.0 - 30.0 * (PI * t).sin(), 100.0 * t)
            })
            .collect();
        assert_eq!(is_arc(&left), Some(ArcBow::Left));
        let down: Vec<Point> = (0..=20)
            .map(|i| {
                let t = f64::from(i) / 20.0;
                Point::new(100.0 * t, 30.0 * (PI * t).sin())
            })
            .collect();
        assert_eq!(is_arc(&down), Some(ArcBow::Down));
        assert!(ArcBow::Left.is_vertical());
        assert!(!ArcBow::Down.is_vertical());
    }

    #[test]
    fn arc_rejects_square_shapes() {
        // Smooth and few turns, but square.
        let quarter: Vec<Point> = (0..=20)
            .map(|i| {
                let a = PI / 2.0 * f64::from(i) / 20.0;
                Point::new(100.0 * a.cos(), 100.0 * a.sin())
            })
            .collect();
        assert_eq!(is_arc(&quarter), None);
    }

    #[test]
    fn zigzag_needs_corners_and_width() {
        let zig = polyline(
            &[(0.0, 0.0), (20.0, 40.0), (40.0, 0.0), (60.0, 40.0), (80.0, 0.0), (100.0, 40.0)],
            4,
        );
        assert!(is_zigzag(&zig));
        let tall: Vec<Point> = zig.iter().map(|p| Point::new(p.y, p.x)).collect();
        assert!(!is_zigzag(&tall));
    }

    #[test]
    fn analysis_caches_corner_counts() {
        let params = ShapeParams::default();
        let square = polyline(
            &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0), (0.0, 0.0)],
            5,
        );
        let analysis = ShapeAnalysis::new(&square, &params);
        assert_eq!(analysis.corners(), 3);
        assert_eq!(analysis.corners.get(), Some(3));
        assert_eq!(analysis.line_turns.get(), None);
        assert!(analysis.is_rectangle());
    }
}
