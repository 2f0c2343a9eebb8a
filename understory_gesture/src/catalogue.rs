// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The fixed vocabulary of recognizable gestures.
//!
//! Order matters: [`GestureKind::ALL`] is the catalogue a trainable classifier
//! uses for its output layer, so output index `i` is always `GestureKind::ALL[i]`.

use core::fmt;

/// Static description of one gesture class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GestureClassDefinition {
    /// Stable gesture name, e.g. `"circle"`.
    pub name: &'static str,
    /// Opaque action identifier for the host, e.g. `"select"`.
    pub action: &'static str,
    /// Human-readable description of what the gesture does.
    pub description: &'static str,
}

/// A recognizable gesture class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GestureKind {
    /// Closed round loop.
    Circle,
    /// Checkmark.
    Check,
    /// Two crossing diagonals.
    X,
    /// Two crossing axis-aligned bars.
    Plus,
    /// Closed four-cornered loop.
    Rectangle,
    /// Back-and-forth scribble.
    Zigzag,
    /// Straight horizontal stroke.
    LineHorizontal,
    /// Straight vertical stroke.
    LineVertical,
    /// Straight diagonal stroke.
    LineDiagonal,
    /// Arrow pointing up.
    ArrowUp,
    /// Arrow pointing down.
    ArrowDown,
    /// Arrow pointing left.
    ArrowLeft,
    /// Arrow pointing right.
    ArrowRight,
    /// Tall arc bowing left.
    ArcLeft,
    /// Tall arc bowing right.
    ArcRight,
    /// Wide arc bowing up.
    ArcUp,
    /// Wide arc bowing down.
    ArcDown,
    /// Closed three-cornered loop.
    Triangle,
    /// Upward chevron.
    Caret,
    /// Downward chevron.
    ChevronDown,
    /// Inward spiral.
    Spiral,
    /// Stroke with a small loop in the middle.
    Loop,
}

impl GestureKind {
    /// Every gesture kind, in catalogue order.
    pub const ALL: [Self; 22] = [
        Self::Circle,
        Self::Check,
        Self::X,
        Self::Plus,
        Self::Rectangle,
        Self::Zigzag,
        Self::LineHorizontal,
        Self::LineVertical,
        Self::LineDiagonal,
        Self::ArrowUp,
        Self::ArrowDown,
        Self::ArrowLeft,
        Self::ArrowRight,
        Self::ArcLeft,
        Self::ArcRight,
        Self::ArcUp,
        Self::ArcDown,
        Self::Triangle,
        Self::Caret,
        Self::ChevronDown,
        Self::Spiral,
        Self::Loop,
    ];

    /// Name, action, and description of this kind.
    pub const fn definition(self) -> GestureClassDefinition {
        let (name, action, description) = match self {
            Self::Circle => ("circle", "select", "Select the enclosed items"),
            Self::Check => ("check", "complete", "Mark the item as complete"),
            Self::X => ("x", "delete", "Delete the item under the gesture"),
            Self::Plus => ("plus", "add", "Add a new item here"),
            Self::Rectangle => ("rectangle", "group", "Group the enclosed items"),
            Self::Zigzag => ("zigzag", "clear", "Clear the scribbled-over content"),
            Self::LineHorizontal => (
                "line-horizontal",
                "strikethrough",
                "Strike through the crossed text",
            ),
            Self::LineVertical => ("line-vertical", "split", "Split the content at this point"),
            Self::LineDiagonal => ("line-diagonal", "dismiss", "Dismiss the crossed item"),
            Self::ArrowUp => ("arrow-up", "move-up", "Move the item up"),
            Self::ArrowDown => ("arrow-down", "move-down", "Move the item down"),
            Self::ArrowLeft => ("arrow-left", "move-left", "Move the item left"),
            Self::ArrowRight => ("arrow-right", "move-right", "Move the item right"),
            Self::ArcLeft => ("arc-left", "swap-vertical", "Swap the items above and below"),
            Self::ArcRight => ("arc-right", "swap-vertical", "Swap the items above and below"),
            Self::ArcUp => ("arc-up", "swap-horizontal", "Swap the items left and right"),
            Self::ArcDown => ("arc-down", "swap-horizontal", "Swap the items left and right"),
            Self::Triangle => ("triangle", "duplicate", "Duplicate the item"),
            Self::Caret => ("caret", "insert", "Insert content at the caret"),
            Self::ChevronDown => ("chevron-down", "expand", "Expand the collapsed section"),
            Self::Spiral => ("spiral", "refresh", "Refresh the content"),
            Self::Loop => ("loop", "cut", "Cut the item to the clipboard"),
        };
        GestureClassDefinition {
            name,
            action,
            description,
        }
    }

    /// Stable gesture name.
    pub const fn name(self) -> &'static str {
        self.definition().name
    }

    /// Opaque action identifier.
    pub const fn action(self) -> &'static str {
        self.definition().action
    }

    /// Human-readable description.
    pub const fn description(self) -> &'static str {
        self.definition().description
    }

    /// Position of this kind in [`GestureKind::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Kind at `index` in [`GestureKind::ALL`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Kind with the given [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classification: which gesture was drawn and how much to trust it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Recognition {
    /// The recognized gesture.
    pub kind: GestureKind,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

impl Recognition {
    /// A recognition of `kind`, with the confidence clamped into `[0, 1]`.
    pub fn new(kind: GestureKind, confidence: f64) -> Self {
        Self {
            kind,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Gesture name.
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Action identifier for the host.
    pub fn action(&self) -> &'static str {
        self.kind.action()
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        self.kind.description()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_order_matches_indices() {
        for (i, kind) in GestureKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(GestureKind::from_index(i), Some(kind));
        }
        assert_eq!(GestureKind::from_index(GestureKind::ALL.len()), None);
    }

    #[test]
    fn names_are_unique_and_resolvable() {
        for kind in GestureKind::ALL {
            assert_eq!(GestureKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(GestureKind::from_name("lasso"), None);
    }

    #[test]
    fn recognition_clamps_confidence() {
        let r = Recognition::new(GestureKind::Circle, 1.5);
        assert_eq!(r.confidence, 1.0);
        assert_eq!(r.name(), "circle");
        assert_eq!(r.action(), "select");
        assert!(!r.description().is_empty());
    }
}
