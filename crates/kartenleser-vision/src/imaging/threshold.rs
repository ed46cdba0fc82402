// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Global (Otsu) binarization and foreground polarity.

use image::GrayImage;
use image::imageops;
use imageproc::contrast::{ThresholdType, otsu_level, threshold};

/// Binarize with an automatically chosen Otsu level: pixels strictly above it
/// become 255, the rest 0. Returns the binary image together with the level.
pub fn binarize_otsu(gray: &GrayImage) -> (GrayImage, u8) {
    let level = otsu_level(gray);
    (threshold(gray, level, ThresholdType::Binary), level)
}

/// Invert a binary image if white covers more than half of it, so that the
/// foreground (glyphs, blobs) is always the bright minority.
pub fn bright_minority(mut binary: GrayImage) -> GrayImage {
    let total = binary.width() as u64 * binary.height() as u64;
    let bright = binary.pixels().filter(|p| p.0[0] > 0).count() as u64;
    if bright * 2 > total {
        imageops::invert(&mut binary);
    }
    binary
}
