// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-glyph classification by template correlation against the reference
// glyphs.

use std::sync::Arc;

use image::GrayImage;
use image::imageops;
use imageproc::filter::box_filter;
use kartenleser_core::config::ClassifyConfig;
use kartenleser_core::error::{KartenleserError, Result};
use kartenleser_core::{AccountNumber, DigitClassification, DigitGroupRect};
use tracing::{debug, info, instrument, warn};

use super::reference::{GlyphBitmap, ReferenceGlyphs, glyph_boxes};
use crate::imaging::threshold::binarize_otsu;

/// Splits digit groups into glyphs and names each glyph's digit.
#[derive(Debug, Clone)]
pub struct GlyphClassifier {
    config: ClassifyConfig,
    references: Arc<ReferenceGlyphs>,
}

impl GlyphClassifier {
    /// Fails if the reference glyphs were built for a different canvas size
    /// than `config` asks for.
    pub fn new(config: ClassifyConfig, references: Arc<ReferenceGlyphs>) -> Result<Self> {
        let expected = (config.glyph_width, config.glyph_height);
        if references.glyph_size() != expected {
            return Err(KartenleserError::ReferenceGlyphs(format!(
                "reference glyphs are {:?}, classifier expects {expected:?}",
                references.glyph_size()
            )));
        }
        Ok(Self { config, references })
    }

    pub fn references(&self) -> &ReferenceGlyphs {
        &self.references
    }

    /// Score `glyph` against all ten references and keep the best.
    pub fn classify_glyph(&self, glyph: &GlyphBitmap) -> DigitClassification {
        let (digit, score) = self
            .references
            .iter()
            .map(|(digit, reference)| (digit, glyph.correlate(reference)))
            .fold((0u8, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        match self.config.min_score {
            Some(floor) if score < floor => {
                debug!(best = digit, score, floor, "Glyph below confidence floor");
                DigitClassification { digit: None, score }
            }
            _ => DigitClassification {
                digit: Some(digit),
                score,
            },
        }
    }

    /// Cut the glyphs of one digit group out of the rectified card, left to
    /// right, normalised onto the glyph canvas.
    pub fn segment_glyphs(&self, card: &GrayImage, group: &DigitGroupRect) -> Vec<GlyphBitmap> {
        let roi = group.expanded(self.config.margin, card.width(), card.height());
        if roi.width == 0 || roi.height == 0 {
            return Vec::new();
        }

        let crop = imageops::crop_imm(card, roi.x, roi.y, roi.width, roi.height).to_image();
        let radius = self.config.blur_radius;
        let smoothed = if radius > 0 {
            box_filter(&crop, radius, radius)
        } else {
            crop
        };
        // Threshold per group; contrast varies across the card.
        let (binary, threshold) = binarize_otsu(&smoothed);

        let (w, h) = (self.config.glyph_width, self.config.glyph_height);
        let glyphs: Vec<GlyphBitmap> = glyph_boxes(&binary)
            .into_iter()
            .filter(|r| r.height() >= self.config.min_glyph_height)
            .map(|r| GlyphBitmap::from_region(&binary, r, w, h))
            .collect();
        debug!(?group, threshold, glyphs = glyphs.len(), "Group split into glyphs");
        glyphs
    }

    /// Classify every glyph of every group, in group order and left to right
    /// inside a group.
    #[instrument(skip_all, fields(groups = groups.len()))]
    pub fn classify_groups(
        &self,
        card: &GrayImage,
        groups: &[DigitGroupRect],
    ) -> Vec<DigitClassification> {
        let mut digits = Vec::with_capacity(groups.len() * AccountNumber::GROUP);
        for (index, group) in groups.iter().enumerate() {
            let glyphs = self.segment_glyphs(card, group);
            if glyphs.len() != AccountNumber::GROUP {
                warn!(
                    group = index,
                    glyphs = glyphs.len(),
                    "Unexpected glyph count in digit group"
                );
            }
            digits.extend(glyphs.iter().map(|g| self.classify_glyph(g)));
        }

        let rejected = digits.iter().filter(|d| d.digit.is_none()).count();
        info!(digits = digits.len(), rejected, "Glyphs classified");
        digits
    }
}
