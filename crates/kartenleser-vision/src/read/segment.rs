// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Digit-group segmentation on the rectified card.
//
// A top-hat flattens the card background, the Sobel gradient magnitude
// outlines the bright digits, and two closings around an Otsu threshold merge
// the four digits of a group into one blob. Blobs whose bounding boxes pass
// `DigitGroupFilter` are the digit groups.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use kartenleser_core::DigitGroupRect;
use kartenleser_core::config::SegmentConfig;
use tracing::{debug, info, instrument, warn};

use crate::detect::geometry::bounding_rect;
use crate::imaging::morphology::{RectKernel, close, top_hat};
use crate::imaging::threshold::binarize_otsu;

// -- Filter -------------------------------------------------------------------

/// Size and aspect bounds a digit-group box must satisfy. All bounds are
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DigitGroupFilter {
    pub min_aspect: f32,
    pub max_aspect: f32,
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
}

impl DigitGroupFilter {
    pub fn from_config(config: &SegmentConfig) -> Self {
        Self {
            min_aspect: config.min_aspect,
            max_aspect: config.max_aspect,
            min_width: config.min_width,
            max_width: config.max_width,
            min_height: config.min_height,
            max_height: config.max_height,
        }
    }

    /// True when a `width` x `height` box can be a group of four digits.
    pub fn accepts(&self, width: u32, height: u32) -> bool {
        let ratio = DigitGroupRect {
            x: 0,
            y: 0,
            width,
            height,
        }
        .aspect_ratio();

        ratio > self.min_aspect
            && ratio < self.max_aspect
            && width > self.min_width
            && width < self.max_width
            && height > self.min_height
            && height < self.max_height
    }
}

impl Default for DigitGroupFilter {
    fn default() -> Self {
        Self::from_config(&SegmentConfig::default())
    }
}

// -- Segmenter ----------------------------------------------------------------

/// Finds the digit-group boxes on a rectified card.
#[derive(Debug, Clone)]
pub struct DigitRegionSegmenter {
    config: SegmentConfig,
    filter: DigitGroupFilter,
}

impl DigitRegionSegmenter {
    pub fn new(config: SegmentConfig) -> Self {
        let filter = DigitGroupFilter::from_config(&config);
        Self { config, filter }
    }

    pub fn filter(&self) -> &DigitGroupFilter {
        &self.filter
    }

    fn kernel(&self) -> RectKernel {
        RectKernel::new(self.config.kernel_width, self.config.kernel_height)
    }

    /// Top-hat followed by the equally weighted Sobel magnitude
    /// `0.5 * |gx| + 0.5 * |gy|`, each term saturated at 255.
    pub fn gradient_map(&self, card: &GrayImage) -> GrayImage {
        let hat = top_hat(card, self.kernel());
        let gx = horizontal_sobel(&hat);
        let gy = vertical_sobel(&hat);

        let mut out = GrayImage::new(card.width(), card.height());
        for ((dst, x), y) in out.pixels_mut().zip(gx.pixels()).zip(gy.pixels()) {
            let sum = x.0[0].unsigned_abs().min(255) + y.0[0].unsigned_abs().min(255);
            dst.0[0] = sum.div_ceil(2) as u8;
        }
        out
    }

    /// Digit-group boxes in left-to-right order, at most `max_groups` of
    /// them. Fewer (including none) is not an error here.
    #[instrument(skip_all, fields(width = card.width(), height = card.height()))]
    pub fn segment(&self, card: &GrayImage) -> Vec<DigitGroupRect> {
        let kernel = self.kernel();
        let gradient = self.gradient_map(card);
        let (binary, threshold) = binarize_otsu(&close(&gradient, kernel));
        let blobs = close(&binary, kernel);
        debug!(threshold, "Gradient map binarised");

        let mut candidates = 0usize;
        let mut groups: Vec<DigitGroupRect> = find_contours::<i32>(&blobs)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .filter_map(|c| bounding_rect(&c.points))
            .inspect(|_| candidates += 1)
            .filter(|r| self.filter.accepts(r.width(), r.height()))
            .map(|r| DigitGroupRect {
                x: r.left() as u32,
                y: r.top() as u32,
                width: r.width(),
                height: r.height(),
            })
            .collect();
        groups.sort_by_key(|g| g.x);

        let max = self.config.max_groups;
        if groups.len() > max {
            warn!(
                found = groups.len(),
                kept = max,
                "More digit groups than expected; dropping the rightmost"
            );
            groups.truncate(max);
        } else if groups.len() < max {
            warn!(found = groups.len(), expected = max, "Digit groups missing");
        }

        info!(candidates, groups = groups.len(), "Digit groups segmented");
        groups
    }
}
