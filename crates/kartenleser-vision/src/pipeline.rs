// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The five-stage card reading pipeline.
//
// `CardReader` owns one instance of every stage, configured from a single
// validated `PipelineConfig`, and runs them in order on a working-resolution
// grayscale image. It holds no per-image state, so one reader can serve many
// images and threads.

use std::sync::Arc;

use image::GrayImage;
use kartenleser_core::error::{KartenleserError, Result};
use kartenleser_core::{
    AccountNumber, CornerSet, DigitClassification, DigitGroupRect, PipelineConfig,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::detect::boundary::{BoundaryDetector, ContourSelector};
use crate::detect::corners::CornerExtractor;
use crate::detect::rectify::{Rectified, Rectifier};
use crate::read::classify::GlyphClassifier;
use crate::read::reference::ReferenceGlyphs;
use crate::read::segment::DigitRegionSegmenter;

// -- Result -------------------------------------------------------------------

/// Everything one pipeline run produced.
#[derive(Debug, Clone)]
pub struct CardScan {
    pub corners: CornerSet,
    pub rectified: Rectified,
    pub groups: Vec<DigitGroupRect>,
    pub digits: Vec<DigitClassification>,
}

impl CardScan {
    /// Sixteen digits, none rejected.
    pub fn is_complete(&self) -> bool {
        self.digits.len() == AccountNumber::LENGTH && self.digits.iter().all(|d| d.digit.is_some())
    }

    /// The digits that were read, skipping rejected glyphs.
    pub fn account_number(&self) -> AccountNumber {
        AccountNumber(self.digits.iter().filter_map(|d| d.digit).collect())
    }

    pub fn digits_read(&self) -> usize {
        self.digits.iter().filter(|d| d.digit.is_some()).count()
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            account_number: self.account_number().to_string(),
            complete: self.is_complete(),
            corners: self.corners,
            groups: self.groups.clone(),
            digits: self.digits.clone(),
        }
    }
}

/// Serialisable view of a `CardScan`, without the rectified image.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub account_number: String,
    pub complete: bool,
    pub corners: CornerSet,
    pub groups: Vec<DigitGroupRect>,
    pub digits: Vec<DigitClassification>,
}

// -- Reader -------------------------------------------------------------------

/// Reads the account number off a card photo.
#[derive(Debug)]
pub struct CardReader {
    config: PipelineConfig,
    boundary: BoundaryDetector,
    corners: CornerExtractor,
    rectifier: Rectifier,
    segmenter: DigitRegionSegmenter,
    classifier: GlyphClassifier,
}

impl CardReader {
    /// Validate `config` and set up every stage. The reference glyphs are
    /// shared, not copied.
    pub fn new(config: PipelineConfig, references: Arc<ReferenceGlyphs>) -> Result<Self> {
        config.validate()?;
        let classifier = GlyphClassifier::new(config.classify.clone(), references)?;
        Ok(Self {
            boundary: BoundaryDetector::new(config.boundary.clone()),
            corners: CornerExtractor::new(config.corners.clone()),
            rectifier: Rectifier::new(config.rectify.clone(), config.corners.min_quad_area),
            segmenter: DigitRegionSegmenter::new(config.segment.clone()),
            classifier,
            config,
        })
    }

    /// Replace the dominant-contour strategy of the boundary detector.
    pub fn with_selector(mut self, selector: Box<dyn ContourSelector>) -> Self {
        self.boundary = BoundaryDetector::with_selector(self.config.boundary.clone(), selector);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the detection stages only: boundary and corners.
    pub fn locate(&self, gray: &GrayImage) -> Result<CornerSet> {
        check_dimensions(gray)?;
        let boundary = self.boundary.detect(gray)?;
        self.corners.extract(&boundary.mask)
    }

    /// Run the whole pipeline. Detection failures are errors; a short read
    /// is reported through `CardScan::is_complete`.
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn read(&self, gray: &GrayImage) -> Result<CardScan> {
        let corners = self.locate(gray)?;
        let rectified = self.rectifier.rectify(gray, &corners)?;
        let groups = self.segmenter.segment(&rectified.image);
        let digits = self.classifier.classify_groups(&rectified.image, &groups);

        let scan = CardScan {
            corners,
            rectified,
            groups,
            digits,
        };
        if scan.is_complete() {
            info!(digits = scan.digits.len(), "Card read");
        } else {
            warn!(
                digits = scan.digits.len(),
                read = scan.digits_read(),
                "Card read is incomplete"
            );
        }
        Ok(scan)
    }
}

fn check_dimensions(gray: &GrayImage) -> Result<()> {
    if gray.width() == 0 || gray.height() == 0 {
        return Err(KartenleserError::InvalidImage(format!(
            "empty {}x{} image",
            gray.width(),
            gray.height()
        )));
    }
    Ok(())
}
