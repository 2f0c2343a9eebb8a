// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::boxed::Box;

use kurbo::Point;

use crate::Recognition;

/// A gesture classifier.
///
/// Implementations take the flattened points of a whole gesture (all strokes
/// in drawing order) and either name the gesture or decline with `None`.
/// Declining covers every non-error outcome: too few points, a drawing that is
/// too small, no matching shape, or a result below the implementation's
/// confidence floor.
///
/// Recognizers that need preparation before they can answer (for example a
/// classifier that trains in the background) report it through
/// [`is_ready`](Self::is_ready) and return `None` until then.
pub trait Recognizer {
    /// Classify a gesture.
    fn recognize(&self, points: &[Point]) -> Option<Recognition>;

    /// Whether [`recognize`](Self::recognize) can currently produce results.
    fn is_ready(&self) -> bool {
        true
    }
}

impl<T: Recognizer + ?Sized> Recognizer for &T {
    fn recognize(&self, points: &[Point]) -> Option<Recognition> {
        (**self).recognize(points)
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

impl<T: Recognizer + ?Sized> Recognizer for Box<T> {
    fn recognize(&self, points: &[Point]) -> Option<Recognition> {
        (**self).recognize(points)
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Try one recognizer, then another.
///
/// The primary recognizer is consulted only when it reports ready. If it is
/// not ready, or it declines, the secondary recognizer answers instead.
///
/// A typical pairing is a trainable classifier in front of the deterministic
/// rule cascade, so that gestures are recognized while training is still
/// running and for shapes the trained model is unsure about.
#[derive(Clone, Debug, Default)]
pub struct Fallback<A, B> {
    /// Consulted first.
    pub primary: A,
    /// Consulted when the primary is not ready or declines.
    pub secondary: B,
}

impl<A, B> Fallback<A, B> {
    /// Chain `primary` in front of `secondary`.
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: Recognizer, B: Recognizer> Recognizer for Fallback<A, B> {
    fn recognize(&self, points: &[Point]) -> Option<Recognition> {
        let ask = |r: &dyn Recognizer| r.is_ready().then(|| r.recognize(points)).flatten();
        ask(&self.primary).or_else(|| ask(&self.secondary))
    }

    fn is_ready(&self) -> bool {
        self.primary.is_ready() || self.secondary.is_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GestureKind;
    use core::cell::Cell;

    #[derive(Debug)]
    struct Fixed {
        answer: Option<GestureKind>,
        ready: bool,
        calls: Cell<usize>,
    }

    impl Fixed {
        fn new(answer: Option<GestureKind>, ready: bool) -> Self {
            Self {
                answer,
                ready,
                calls: Cell::new(0),
            }
        }
    }

    impl Recognizer for Fixed {
        fn recognize(&self, _points: &[Point]) -> Option<Recognition> {
            self.calls.set(self.calls.get() + 1);
            self.answer.map(|k| Recognition::new(k, 0.9))
        }

        fn is_ready(&self) -> bool {
            self.ready
        }
    }

    #[test]
    fn primary_answer_wins() {
        let chain = Fallback::new(
            Fixed::new(Some(GestureKind::Spiral), true),
            Fixed::new(Some(GestureKind::Circle), true),
        );
        assert_eq!(chain.recognize(&[]).map(|r| r.kind), Some(GestureKind::Spiral));
        assert_eq!(chain.secondary.calls.get(), 0);
    }

    #[test]
    fn declined_primary_falls_through() {
        let chain = Fallback::new(
            Fixed::new(None, true),
            Fixed::new(Some(GestureKind::Circle), true),
        );
        assert_eq!(chain.recognize(&[]).map(|r| r.kind), Some(GestureKind::Circle));
    }

    #[test]
    fn unready_primary_is_skipped() {
        let chain = Fallback::new(
            Fixed::new(Some(GestureKind::Spiral), false),
            Fixed::new(Some(GestureKind::Circle), true),
        );
        assert_eq!(chain.recognize(&[]).map(|r| r.kind), Some(GestureKind::Circle));
        assert_eq!(chain.primary.calls.get(), 0);
        assert!(chain.is_ready());
    }

    #[test]
    fn nothing_ready_yields_none() {
        let chain = Fallback::new(
            Fixed::new(Some(GestureKind::Spiral), false),
            Fixed::new(Some(GestureKind::Circle), false),
        );
        assert!(!chain.is_ready());
        assert_eq!(chain.recognize(&[]), None);
    }

    #[test]
    fn references_and_boxes_delegate() {
        let inner = Fixed::new(Some(GestureKind::X), false);
        let by_ref: &dyn Recognizer = &inner;
        assert!(!by_ref.is_ready());
        let boxed: Box<dyn Recognizer> = Box::new(Fixed::new(Some(GestureKind::X), true));
        assert_eq!(boxed.recognize(&[]).map(|r| r.kind), Some(GestureKind::X));
    }
}
