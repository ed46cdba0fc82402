// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reference glyphs: the ten digit templates every candidate glyph is scored
// against, built once from a font sheet and shared read-only.

use std::path::Path;

use image::GrayImage;
use image::imageops::{self, FilterType};
use imageproc::contours::{BorderType, find_contours};
use imageproc::rect::Rect;
use imageproc::template_matching::{MatchTemplateMethod, match_template};
use kartenleser_core::config::ClassifyConfig;
use kartenleser_core::error::{KartenleserError, Result};
use tracing::{debug, info, instrument};

use crate::detect::geometry::bounding_rect;
use crate::imaging::input::InputImage;
use crate::imaging::threshold::{binarize_otsu, bright_minority};

/// Number of reference glyphs, one per decimal digit.
pub const DIGITS: usize = 10;

// -- Glyph bitmap -------------------------------------------------------------

/// A digit normalised onto the fixed glyph canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    image: GrayImage,
}

impl GlyphBitmap {
    /// Resize `image` onto a `width` x `height` canvas (triangle filter).
    /// An image that already has that size is kept as is.
    pub fn from_image(image: GrayImage, width: u32, height: u32) -> Self {
        if image.dimensions() == (width, height) {
            return Self { image };
        }
        Self {
            image: imageops::resize(&image, width, height, FilterType::Triangle),
        }
    }

    /// Crop `rect` out of `binary` and normalise it.
    pub fn from_region(binary: &GrayImage, rect: Rect, width: u32, height: u32) -> Self {
        let crop = imageops::crop_imm(
            binary,
            rect.left() as u32,
            rect.top() as u32,
            rect.width(),
            rect.height(),
        )
        .to_image();
        Self::from_image(crop, width, height)
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Normalised cross correlation with another glyph of the same size, in
    /// [0, 1] for non-negative images. An all-black glyph scores 0.
    pub fn correlate(&self, other: &GlyphBitmap) -> f32 {
        if self.dimensions() != other.dimensions() {
            return 0.0;
        }
        let scores = match_template(
            &self.image,
            &other.image,
            MatchTemplateMethod::CrossCorrelationNormalized,
        );
        let score = scores.get_pixel(0, 0).0[0];
        if score.is_finite() { score } else { 0.0 }
    }
}

/// Bounding boxes of the external blobs of a binary image, left to right.
pub(crate) fn glyph_boxes(binary: &GrayImage) -> Vec<Rect> {
    let mut boxes: Vec<Rect> = find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| bounding_rect(&c.points))
        .collect();
    boxes.sort_by_key(|r| (r.left(), r.top()));
    boxes
}

// -- Reference set ------------------------------------------------------------

/// Exactly ten reference glyphs; the index is the digit value.
#[derive(Debug, Clone)]
pub struct ReferenceGlyphs {
    glyphs: Vec<GlyphBitmap>,
}

impl ReferenceGlyphs {
    /// Segment a font sheet holding the digits 0-9 left to right.
    ///
    /// The sheet is binarised with Otsu and its polarity normalised, so both
    /// dark-on-light and light-on-dark sheets work. Blobs shorter than half
    /// the tallest one (dots, dust) are ignored.
    #[instrument(skip_all, fields(width = sheet.width(), height = sheet.height()))]
    pub fn from_font_sheet(sheet: &GrayImage, config: &ClassifyConfig) -> Result<Self> {
        let (binary, threshold) = binarize_otsu(sheet);
        let binary = bright_minority(binary);

        let boxes = glyph_boxes(&binary);
        let tallest = boxes.iter().map(|r| r.height()).max().unwrap_or(0);
        let kept: Vec<Rect> = boxes
            .into_iter()
            .filter(|r| r.height() * 2 >= tallest)
            .collect();
        debug!(threshold, tallest, glyphs = kept.len(), "Font sheet segmented");

        if kept.len() != DIGITS {
            return Err(KartenleserError::ReferenceGlyphs(format!(
                "font sheet holds {} glyphs, expected {DIGITS}",
                kept.len()
            )));
        }

        let glyphs = kept
            .into_iter()
            .map(|r| GlyphBitmap::from_region(&binary, r, config.glyph_width, config.glyph_height))
            .collect();
        info!("Reference glyphs built from font sheet");
        Ok(Self { glyphs })
    }

    /// Load and segment a font sheet image file.
    pub fn open(path: impl AsRef<Path>, config: &ClassifyConfig) -> Result<Self> {
        let sheet = InputImage::open(path)?.to_gray();
        Self::from_font_sheet(&sheet, config)
    }

    /// Wrap ten pre-built glyphs, e.g. an injected test set. All glyphs must
    /// share one size.
    pub fn from_glyphs(glyphs: Vec<GlyphBitmap>) -> Result<Self> {
        if glyphs.len() != DIGITS {
            return Err(KartenleserError::ReferenceGlyphs(format!(
                "{} glyphs supplied, expected {DIGITS}",
                glyphs.len()
            )));
        }
        let size = glyphs[0].dimensions();
        if let Some(odd) = glyphs.iter().position(|g| g.dimensions() != size) {
            return Err(KartenleserError::ReferenceGlyphs(format!(
                "glyph {odd} is {:?}, expected {size:?}",
                glyphs[odd].dimensions()
            )));
        }
        Ok(Self { glyphs })
    }

    pub fn get(&self, digit: u8) -> Option<&GlyphBitmap> {
        self.glyphs.get(digit as usize)
    }

    /// `(digit, glyph)` pairs in ascending digit order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &GlyphBitmap)> {
        self.glyphs.iter().enumerate().map(|(d, g)| (d as u8, g))
    }

    /// Canvas size shared by all glyphs.
    pub fn glyph_size(&self) -> (u32, u32) {
        self.glyphs[0].dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use image::Luma;

    #[test]
    fn font_sheet_yields_ten_glyphs_in_digit_order() {
        let refs = ReferenceGlyphs::from_font_sheet(&testing::font_sheet(), &ClassifyConfig::default())
            .expect("ten glyphs");
        assert_eq!(refs.glyph_size(), (54, 84));
        assert_eq!(refs.iter().count(), DIGITS);

        // Every glyph matches itself best.
        for (digit, glyph) in refs.iter() {
            let best = refs
                .iter()
                .max_by(|a, b| glyph.correlate(a.1).total_cmp(&glyph.correlate(b.1)))
                .map(|(d, _)| d);
            assert_eq!(best, Some(digit));
        }
        // A "1" and an "8" share little ink.
        let one = refs.get(1).expect("digit 1");
        let eight = refs.get(8).expect("digit 8");
        assert!(one.correlate(eight) < 0.8);
        assert!(refs.get(10).is_none());
    }

    /// Light glyphs on a dark sheet segment the same way.
    #[test]
    fn inverted_sheet_gives_same_glyphs() {
        let sheet = testing::font_sheet();
        let mut inverted = sheet.clone();
        imageops::invert(&mut inverted);

        let config = ClassifyConfig::default();
        let a = ReferenceGlyphs::from_font_sheet(&sheet, &config).expect("dark on light");
        let b = ReferenceGlyphs::from_font_sheet(&inverted, &config).expect("light on dark");
        for ((_, x), (_, y)) in a.iter().zip(b.iter()) {
            assert_eq!(x, y);
        }
    }

    #[test]
    fn specks_are_ignored() {
        let mut sheet = testing::font_sheet();
        for y in 2..4 {
            for x in 2..4 {
                sheet.put_pixel(x, y, Luma([0]));
            }
        }
        ReferenceGlyphs::from_font_sheet(&sheet, &ClassifyConfig::default()).expect("speck ignored");
    }

    #[test]
    fn wrong_glyph_count_is_rejected() {
        let sheet = GrayImage::from_pixel(200, 60, Luma([255]));
        let err = ReferenceGlyphs::from_font_sheet(&sheet, &ClassifyConfig::default()).unwrap_err();
        assert!(matches!(err, KartenleserError::ReferenceGlyphs(_)));

        let nine = vec![GlyphBitmap::from_image(GrayImage::new(54, 84), 54, 84); 9];
        assert!(ReferenceGlyphs::from_glyphs(nine).is_err());
    }

    #[test]
    fn mixed_glyph_sizes_are_rejected() {
        let mut glyphs = vec![GlyphBitmap::from_image(GrayImage::new(54, 84), 54, 84); 9];
        glyphs.push(GlyphBitmap::from_image(GrayImage::new(20, 30), 20, 30));
        let err = ReferenceGlyphs::from_glyphs(glyphs).unwrap_err();
        assert!(matches!(err, KartenleserError::ReferenceGlyphs(_)));
    }

    #[test]
    fn black_glyph_scores_zero() {
        let black = GlyphBitmap::from_image(GrayImage::new(54, 84), 54, 84);
        let white = GlyphBitmap::from_image(GrayImage::from_pixel(54, 84, Luma([255])), 54, 84);
        assert_eq!(black.correlate(&white), 0.0);
        assert_eq!(black.correlate(&GlyphBitmap::from_image(GrayImage::new(10, 10), 10, 10)), 0.0);
    }
}
