// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Procedural training data.
//!
//! Every catalogue class has a parametric template in a unit frame (`x` right,
//! `y` down). [`SyntheticGenerator`] traces the template, scales it to a
//! random size, moves it to a random offset, and jitters each point
//! independently. All randomness comes from the caller's [`Rng`], so a seeded
//! generator always draws the same strokes.

use core::f64::consts::{PI, TAU};
use core::ops::RangeInclusive;

use kurbo::{Point, Vec2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use understory_gesture::GestureKind;
use understory_gesture::geometry::resample;

use crate::{Result, TrainError, preprocess};

/// Maximum per-coordinate jitter, in pixels.
pub const JITTER: f64 = 10.0;
/// Range of the overall gesture size, in pixels.
pub const SCALE_RANGE: RangeInclusive<f64> = 80.0..=120.0;
/// Range of the random offset applied to each example, in pixels.
pub const OFFSET_RANGE: RangeInclusive<f64> = 0.0..=200.0;
/// Examples generated per class for initial training.
pub const DEFAULT_EXAMPLES_PER_CLASS: usize = 100;

/// Samples traced along a single-stroke template.
const STROKE_SAMPLES: usize = 32;
/// Samples traced along each part of a two-stroke template.
const PART_SAMPLES: usize = 16;
/// Samples for the arrow head.
const HEAD_SAMPLES: usize = 9;

/// Draws labeled example strokes.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticGenerator {
    /// Maximum per-coordinate jitter.
    pub jitter: f64,
    /// Range the overall size is drawn from.
    pub scale: RangeInclusive<f64>,
    /// Range the translation is drawn from, per axis.
    pub offset: RangeInclusive<f64>,
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self {
            jitter: JITTER,
            scale: SCALE_RANGE,
            offset: OFFSET_RANGE,
        }
    }
}

impl SyntheticGenerator {
    /// Draw one example of `kind`.
    pub fn generate<R: Rng + ?Sized>(&self, kind: GestureKind, rng: &mut R) -> Vec<Point> {
        let template = template(kind, rng);
        let size = rng.random_range(self.scale.clone());
        let origin = Vec2::new(
            rng.random_range(self.offset.clone()),
            rng.random_range(self.offset.clone()),
        );
        template
            .into_iter()
            .map(|p| {
                let jitter = if self.jitter > 0.0 {
                    Vec2::new(
                        rng.random_range(-self.jitter..=self.jitter),
                        rng.random_range(-self.jitter..=self.jitter),
                    )
                } else {
                    Vec2::ZERO
                };
                (p.to_vec2() * size + origin + jitter).to_point()
            })
            .collect()
    }

    /// Draw one example of `kind` from a fresh RNG seeded with `seed`.
    pub fn generate_seeded(&self, kind: GestureKind, seed: u64) -> Vec<Point> {
        self.generate(kind, &mut StdRng::seed_from_u64(seed))
    }
}

/// Trace the polyline through `vertices` with `samples` evenly spaced points.
fn trace(vertices: &[(f64, f64)], samples: usize) -> Vec<Point> {
    let vertices: Vec<Point> = vertices.iter().map(|&(x, y)| Point::new(x, y)).collect();
    resample(&vertices, samples)
}

fn stroke(vertices: &[(f64, f64)]) -> Vec<Point> {
    trace(vertices, STROKE_SAMPLES)
}

/// Two strokes drawn one after the other.
fn two_strokes(first: Vec<Point>, second: Vec<Point>) -> Vec<Point> {
    let mut out = first;
    out.extend(second);
    out
}

/// Sample `f` at `samples` evenly spaced parameters in `[0, 1]`.
fn curve(samples: usize, f: impl Fn(f64) -> (f64, f64)) -> Vec<Point> {
    let last = samples.saturating_sub(1).max(1) as f64;
    (0..samples)
        .map(|i| {
            let (x, y) = f(i as f64 / last);
            Point::new(x, y)
        })
        .collect()
}

/// An arrow pointing right; other directions are rotations of it.
fn arrow_right() -> Vec<Point> {
    two_strokes(
        trace(&[(0.0, 0.5), (1.0, 0.5)], PART_SAMPLES),
        trace(&[(0.75, 0.25), (1.0, 0.5), (0.75, 0.75)], HEAD_SAMPLES),
    )
}

fn template<R: Rng + ?Sized>(kind: GestureKind, rng: &mut R) -> Vec<Point> {
    match kind {
        GestureKind::Circle => {
            let start = rng.random_range(0.0..TAU);
            let winding = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            let squash = rng.random_range(0.85..=1.0);
            curve(STROKE_SAMPLES + 1, |t| {
                let a = start + winding * TAU * t;
                (0.5 + 0.5 * a.cos(), 0.5 + 0.5 * squash * a.sin())
            })
        }
        GestureKind::Check => stroke(&[(0.0, 0.6), (0.3, 1.0), (1.0, 0.0)]),
        GestureKind::X => two_strokes(
            trace(&[(0.0, 0.0), (1.0, 1.0)], PART_SAMPLES),
            trace(&[(1.0, 0.0), (0.0, 1.0)], PART_SAMPLES),
        ),
        GestureKind::Plus => two_strokes(
            trace(&[(0.5, 0.0), (0.5, 1.0)], PART_SAMPLES),
            trace(&[(0.0, 0.5), (1.0, 0.5)], PART_SAMPLES),
        ),
        GestureKind::Rectangle => stroke(&[
            (0.0, 0.2),
            (1.0, 0.2),
            (1.0, 0.8),
            (0.0, 0.8),
            (0.0, 0.2),
        ]),
        GestureKind::Zigzag => stroke(&[
            (0.0, 0.25),
            (0.2, 0.75),
            (0.4, 0.25),
            (0.6, 0.75),
            (0.8, 0.25),
            (1.0, 0.75),
        ]),
        GestureKind::LineHorizontal => stroke(&[(0.0, 0.5), (1.0, 0.5)]),
        GestureKind::LineVertical => stroke(&[(0.5, 0.0), (0.5, 1.0)]),
        GestureKind::LineDiagonal => stroke(&[(0.0, 0.0), (1.0, 1.0)]),
        GestureKind::ArrowRight => arrow_right(),
        GestureKind::ArrowLeft => map(arrow_right(), |p| Point::new(1.0 - p.x, p.y)),
        GestureKind::ArrowUp => map(arrow_right(), |p| Point::new(p.y, 1.0 - p.x)),
        GestureKind::ArrowDown => map(arrow_right(), |p| Point::new(1.0 - p.y, p.x)),
        GestureKind::ArcLeft => curve(STROKE_SAMPLES, |t| (0.5 - 0.3 * (PI * t).sin(), t)),
        GestureKind::ArcRight => curve(STROKE_SAMPLES, |t| (0.5 + 0.3 * (PI * t).sin(), t)),
        GestureKind::ArcUp => curve(STROKE_SAMPLES, |t| (t, 0.5 - 0.3 * (PI * t).sin())),
        GestureKind::ArcDown => curve(STROKE_SAMPLES, |t| (t, 0.5 + 0.3 * (PI * t).sin())),
        GestureKind::Triangle => stroke(&[(0.5, 0.0), (1.0, 1.0), (0.0, 1.0), (0.5, 0.0)]),
        GestureKind::Caret => stroke(&[(0.0, 1.0), (0.5, 0.0), (1.0, 1.0)]),
        GestureKind::ChevronDown => stroke(&[(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)]),
        GestureKind::Spiral => {
            let winding = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            curve(STROKE_SAMPLES + 16, |t| {
                let a = winding * 2.5 * TAU * t;
                let r = 0.5 * (1.0 - 0.9 * t);
                (0.5 + r * a.cos(), 0.5 + r * a.sin())
            })
        }
        GestureKind::Loop => curve(STROKE_SAMPLES, |t| {
            let a = TAU * t;
            (t + 0.18 * a.sin(), 0.6 - 0.25 * (1.0 - a.cos()))
        }),
    }
}

fn map(points: Vec<Point>, f: impl Fn(Point) -> Point) -> Vec<Point> {
    points.into_iter().map(f).collect()
}

/// Network-ready examples with one-hot targets.
///
/// `inputs[i]` and `targets[i]` always belong together.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    inputs: Vec<Vec<f64>>,
    targets: Vec<Vec<f64>>,
}

impl Dataset {
    /// Build a dataset from matching inputs and targets.
    ///
    /// Fails if the two lists differ in length or if any row differs in width
    /// from the first row of its list.
    pub fn from_parts(inputs: Vec<Vec<f64>>, targets: Vec<Vec<f64>>) -> Result<Self> {
        if inputs.len() != targets.len() {
            return Err(TrainError::ShapeMismatch {
                what: "target count",
                expected: inputs.len(),
                actual: targets.len(),
            });
        }
        check_rows("input", &inputs)?;
        check_rows("target", &targets)?;
        Ok(Self { inputs, targets })
    }

    /// One labeled example.
    pub fn single(input: Vec<f64>, label: usize, classes: usize) -> Result<Self> {
        if label >= classes {
            return Err(TrainError::ShapeMismatch {
                what: "label",
                expected: classes,
                actual: label,
            });
        }
        Self::from_parts(vec![input], vec![one_hot(label, classes)])
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Whether there are no examples.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Input rows.
    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.inputs
    }

    /// One-hot target rows.
    pub fn targets(&self) -> &[Vec<f64>] {
        &self.targets
    }

    /// Width of each input row, or zero when empty.
    pub fn input_width(&self) -> usize {
        self.inputs.first().map_or(0, Vec::len)
    }

    /// Width of each target row, or zero when empty.
    pub fn classes(&self) -> usize {
        self.targets.first().map_or(0, Vec::len)
    }

    /// Class index of example `i`.
    pub fn label(&self, i: usize) -> Option<usize> {
        self.targets.get(i).and_then(|t| argmax(t)).map(|(idx, _)| idx)
    }

    /// Shuffle examples with a Fisher–Yates permutation shared by inputs and
    /// targets.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(rng);
        self.inputs = permute(&self.inputs, &order);
        self.targets = permute(&self.targets, &order);
    }

    /// Split off the last `validation_fraction` of the examples.
    ///
    /// Returns `(train, validation)`. The fraction is clamped to `[0, 1]`;
    /// the validation part is rounded down.
    pub fn split(mut self, validation_fraction: f64) -> (Self, Self) {
        let fraction = validation_fraction.clamp(0.0, 1.0);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "fraction is clamped to [0, 1], so the product fits the length"
        )]
        let held_out = (self.len() as f64 * fraction).floor() as usize;
        let at = self.len() - held_out;
        let validation = Self {
            inputs: self.inputs.split_off(at),
            targets: self.targets.split_off(at),
        };
        (self, validation)
    }
}

fn check_rows(what: &'static str, rows: &[Vec<f64>]) -> Result<()> {
    let Some(width) = rows.first().map(Vec::len) else {
        return Ok(());
    };
    match rows.iter().find(|r| r.len() != width) {
        Some(bad) => Err(TrainError::ShapeMismatch {
            what,
            expected: width,
            actual: bad.len(),
        }),
        None => Ok(()),
    }
}

fn permute(rows: &[Vec<f64>], order: &[usize]) -> Vec<Vec<f64>> {
    order.iter().map(|&i| rows[i].clone()).collect()
}

/// `classes` zeros with a one at `label`.
pub fn one_hot(label: usize, classes: usize) -> Vec<f64> {
    let mut v = vec![0.0; classes];
    if let Some(slot) = v.get_mut(label) {
        *slot = 1.0;
    }
    v
}

/// Index and value of the largest element; the first one wins ties.
pub fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}

/// Draw `per_class` examples of every catalogue class.
///
/// Each example is preprocessed exactly like a live gesture, labeled with a
/// one-hot target over [`GestureKind::ALL`], and the result is shuffled.
pub fn generate_dataset<R: Rng + ?Sized>(
    generator: &SyntheticGenerator,
    per_class: usize,
    resample_count: usize,
    rng: &mut R,
) -> Dataset {
    let classes = GestureKind::ALL.len();
    let mut inputs = Vec::with_capacity(per_class * classes);
    let mut targets = Vec::with_capacity(per_class * classes);
    for kind in GestureKind::ALL {
        for _ in 0..per_class {
            let points = generator.generate(kind, rng);
            inputs.push(preprocess(&points, resample_count));
            targets.push(one_hot(kind.index(), classes));
        }
    }
    let mut dataset = Dataset { inputs, targets };
    dataset.shuffle(rng);
    dataset
}
