// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// kartenleser-vision — The card reading pipeline.
//
// Provides input preparation and pixel-level helpers (thresholding, rectangular
// morphology), card detection (outline, corners, rectification) and digit
// reading (group segmentation, reference glyphs, template matching), tied
// together by `CardReader`.

pub mod detect;
pub mod imaging;
pub mod pipeline;
pub mod read;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the primary structs so callers can use `kartenleser_vision::CardReader` etc.
pub use detect::boundary::{
    BoundaryDetector, CardBoundary, ContourSelector, LargestSolidArea, LongestContour,
};
pub use detect::corners::CornerExtractor;
pub use detect::rectify::{Homography, Rectified, Rectifier};
pub use imaging::input::InputImage;
pub use pipeline::{CardReader, CardScan, ScanSummary};
pub use read::classify::GlyphClassifier;
pub use read::reference::{GlyphBitmap, ReferenceGlyphs};
pub use read::segment::{DigitGroupFilter, DigitRegionSegmenter};
