// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Digit reading on the rectified card: group segmentation, reference glyphs
// and template matching.

pub mod classify;
pub mod reference;
pub mod segment;

pub use classify::GlyphClassifier;
pub use reference::{GlyphBitmap, ReferenceGlyphs};
pub use segment::{DigitGroupFilter, DigitRegionSegmenter};
