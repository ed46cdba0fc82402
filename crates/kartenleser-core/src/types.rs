// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Kartenleser card reader.

use serde::{Deserialize, Serialize};

/// A sub-pixel image position. `x` grows to the right, `y` downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<(f32, f32)> for Point2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<Point2> for (f32, f32) {
    fn from(p: Point2) -> Self {
        (p.x, p.y)
    }
}

/// The four card corners in canonical order.
///
/// Rectification is only defined when the corners form a convex,
/// non-degenerate quadrilateral; the vision crate checks that before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerSet {
    pub top_left: Point2,
    pub bottom_left: Point2,
    pub top_right: Point2,
    pub bottom_right: Point2,
}

impl CornerSet {
    /// Order four arbitrary points: sort by x into a left and a right pair,
    /// then sort each pair by y.
    pub fn from_unordered(points: [Point2; 4]) -> Self {
        let mut sorted = points;
        sorted.sort_by(|a, b| a.x.total_cmp(&b.x));
        let (left, right) = sorted.split_at_mut(2);
        left.sort_by(|a, b| a.y.total_cmp(&b.y));
        right.sort_by(|a, b| a.y.total_cmp(&b.y));
        Self {
            top_left: left[0],
            bottom_left: left[1],
            top_right: right[0],
            bottom_right: right[1],
        }
    }

    /// Corners as `[TL, BL, TR, BR]`.
    pub fn to_array(&self) -> [Point2; 4] {
        [
            self.top_left,
            self.bottom_left,
            self.top_right,
            self.bottom_right,
        ]
    }

    /// Corners walked around the outline: `[TL, TR, BR, BL]`.
    pub fn outline(&self) -> [Point2; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }
}

/// Axis-aligned bounding box of one group of four digits on the rectified card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitGroupRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DigitGroupRect {
    /// Width over height; zero for a zero-height box.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Grow by `margin` on every side, clamped to a `bound_w` x `bound_h` image.
    pub fn expanded(&self, margin: u32, bound_w: u32, bound_h: u32) -> Self {
        let x0 = self.x.saturating_sub(margin);
        let y0 = self.y.saturating_sub(margin);
        let x1 = (self.x + self.width + margin).min(bound_w);
        let y1 = (self.y + self.height + margin).min(bound_h);
        Self {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }
}

/// Result of matching one candidate glyph against the ten references.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DigitClassification {
    /// Best-matching digit, or `None` when a confidence floor rejected it.
    pub digit: Option<u8>,
    /// Normalised correlation of the best match.
    pub score: f32,
}

/// Digits read off a card, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountNumber(pub Vec<u8>);

impl AccountNumber {
    /// Number of digits on a standard card front.
    pub const LENGTH: usize = 16;
    /// Digits per printed group.
    pub const GROUP: usize = 4;

    pub fn digits(&self) -> &[u8] {
        &self.0
    }

    pub fn is_complete(&self) -> bool {
        self.0.len() == Self::LENGTH
    }
}

impl std::fmt::Display for AccountNumber {
    /// Groups of four joined by hyphens, e.g. `4111-2222-3333-4444`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, digit) in self.0.iter().enumerate() {
            if i > 0 && i % Self::GROUP == 0 {
                write!(f, "-")?;
            }
            write!(f, "{digit}")?;
        }
        Ok(())
    }
}
