// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration. Every pixel-valued constant is calibrated against
// the working resolution (540 px wide input, 540x340 rectified card); retune
// them together when changing either.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{KartenleserError, Result};

/// Tuned parameters of the whole detection and reading policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Width the caller resizes input photos to before the pipeline runs.
    /// Valid range: 64..=8192.
    pub working_width: u32,
    /// Card outline detection.
    pub boundary: BoundaryConfig,
    /// Edge line detection and corner extraction.
    pub corners: CornerConfig,
    /// Canonical card rectangle.
    pub rectify: RectifyConfig,
    /// Digit-group segmentation on the rectified card.
    pub segment: SegmentConfig,
    /// Per-glyph classification.
    pub classify: ClassifyConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            working_width: 540,
            boundary: BoundaryConfig::default(),
            corners: CornerConfig::default(),
            rectify: RectifyConfig::default(),
            segment: SegmentConfig::default(),
            classify: ClassifyConfig::default(),
        }
    }
}

/// Parameters of the card outline detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Box blur radius before edge detection (1 = 3x3). Valid range: 0..=10.
    pub blur_radius: u32,
    /// Canny hysteresis low threshold. Must be > 0 and below `canny_high`.
    pub canny_low: f32,
    /// Canny hysteresis high threshold.
    pub canny_high: f32,
    /// Polygon simplification tolerance in pixels. Too tight keeps contour
    /// noise, too loose collapses corners. Valid range: (0, 200].
    pub polygon_tolerance: f64,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            blur_radius: 1,
            canny_low: 50.0,
            canny_high: 100.0,
            polygon_tolerance: 20.0,
        }
    }
}

/// Parameters of the corner extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CornerConfig {
    /// Minimum Hough votes for a line. Valid range: >= 1.
    pub vote_threshold: u32,
    /// Non-maximum suppression radius in Hough space.
    pub suppression_radius: u32,
    /// k-means iteration cap. Valid range: >= 1.
    pub max_iterations: usize,
    /// k-means convergence threshold on centre movement, in pixels. Must be > 0.
    pub epsilon: f32,
    /// Number of k-means initialisations; the most compact result wins.
    /// Valid range: >= 1.
    pub attempts: usize,
    /// Two cluster centres closer than this (pixels) count as duplicates.
    pub min_centroid_separation: f32,
    /// Intersected edges whose normals are closer than this are treated as
    /// parallel. Valid range: (0, 90).
    pub min_intersection_angle_deg: f32,
    /// Below this gap between the vertical and horizontal edge families the
    /// |y/x| split is considered ambiguous. Valid range: [0, 90).
    pub ambiguity_gap_deg: f32,
    /// Smallest corner quadrilateral area accepted, in square pixels.
    pub min_quad_area: f32,
    /// Half-width in pixels of the band around each clustered edge whose
    /// outline pixels are refitted into the final edge line. Valid range:
    /// (0, 50].
    pub refine_band: f32,
}

impl Default for CornerConfig {
    fn default() -> Self {
        Self {
            vote_threshold: 50,
            suppression_radius: 8,
            max_iterations: 10,
            epsilon: 1.0,
            attempts: 5,
            min_centroid_separation: 5.0,
            min_intersection_angle_deg: 20.0,
            ambiguity_gap_deg: 10.0,
            min_quad_area: 1000.0,
            refine_band: 5.0,
        }
    }
}

/// Size of the canonical rectified card. 540x340 matches the physical
/// ID-1 aspect ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    /// Valid range: 16..=8192.
    pub width: u32,
    /// Valid range: 16..=8192.
    pub height: u32,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            width: 540,
            height: 340,
        }
    }
}

/// Parameters of the digit-group segmenter. The box bounds are exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Width of the rectangular structuring element. Valid range: 1..=101.
    pub kernel_width: u32,
    /// Height of the rectangular structuring element. Valid range: 1..=101.
    pub kernel_height: u32,
    pub min_aspect: f32,
    pub max_aspect: f32,
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
    /// Number of digit groups on a card.
    pub max_groups: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            kernel_width: 15,
            kernel_height: 5,
            min_aspect: 2.0,
            max_aspect: 4.0,
            min_width: 80,
            max_width: 100,
            min_height: 25,
            max_height: 45,
            max_groups: 4,
        }
    }
}

/// Parameters of the glyph classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Pixels added on each side of a digit-group box before cropping.
    pub margin: u32,
    /// Box blur radius applied to each cropped group (1 = 3x3).
    pub blur_radius: u32,
    /// Canonical glyph canvas width. Valid range: 4..=512.
    pub glyph_width: u32,
    /// Canonical glyph canvas height. Valid range: 4..=512.
    pub glyph_height: u32,
    /// Contours shorter than this inside a group are specks, not digits.
    pub min_glyph_height: u32,
    /// Optional confidence floor in [-1, 1]. `None` accepts the best match
    /// however weak it is.
    pub min_score: Option<f32>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            margin: 5,
            blur_radius: 1,
            glyph_width: 54,
            glyph_height: 84,
            min_glyph_height: 10,
            min_score: None,
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Check every parameter against its documented range.
    pub fn validate(&self) -> Result<()> {
        check(
            (64..=8192).contains(&self.working_width),
            "working_width must be in 64..=8192",
        )?;

        let b = &self.boundary;
        check(b.blur_radius <= 10, "boundary.blur_radius must be <= 10")?;
        check(
            b.canny_low > 0.0 && b.canny_low < b.canny_high,
            "boundary.canny_low must be > 0 and below canny_high",
        )?;
        check(
            b.polygon_tolerance > 0.0 && b.polygon_tolerance <= 200.0,
            "boundary.polygon_tolerance must be in (0, 200]",
        )?;

        let c = &self.corners;
        check(c.vote_threshold >= 1, "corners.vote_threshold must be >= 1")?;
        check(c.max_iterations >= 1, "corners.max_iterations must be >= 1")?;
        check(c.epsilon > 0.0, "corners.epsilon must be > 0")?;
        check(c.attempts >= 1, "corners.attempts must be >= 1")?;
        check(
            c.min_centroid_separation >= 0.0,
            "corners.min_centroid_separation must be >= 0",
        )?;
        check(
            c.min_intersection_angle_deg > 0.0 && c.min_intersection_angle_deg < 90.0,
            "corners.min_intersection_angle_deg must be in (0, 90)",
        )?;
        check(
            (0.0..90.0).contains(&c.ambiguity_gap_deg),
            "corners.ambiguity_gap_deg must be in [0, 90)",
        )?;
        check(c.min_quad_area >= 0.0, "corners.min_quad_area must be >= 0")?;
        check(
            c.refine_band > 0.0 && c.refine_band <= 50.0,
            "corners.refine_band must be in (0, 50]",
        )?;

        let r = &self.rectify;
        check(
            (16..=8192).contains(&r.width) && (16..=8192).contains(&r.height),
            "rectify.width and rectify.height must be in 16..=8192",
        )?;

        let s = &self.segment;
        check(
            (1..=101).contains(&s.kernel_width) && (1..=101).contains(&s.kernel_height),
            "segment kernel dimensions must be in 1..=101",
        )?;
        check(
            s.min_aspect >= 0.0 && s.min_aspect < s.max_aspect,
            "segment.min_aspect must be >= 0 and below max_aspect",
        )?;
        check(s.min_width < s.max_width, "segment.min_width must be below max_width")?;
        check(
            s.min_height < s.max_height,
            "segment.min_height must be below max_height",
        )?;
        check(s.max_groups >= 1, "segment.max_groups must be >= 1")?;

        let k = &self.classify;
        check(k.blur_radius <= 10, "classify.blur_radius must be <= 10")?;
        check(
            (4..=512).contains(&k.glyph_width) && (4..=512).contains(&k.glyph_height),
            "classify glyph dimensions must be in 4..=512",
        )?;
        if let Some(floor) = k.min_score {
            check(
                (-1.0..=1.0).contains(&floor),
                "classify.min_score must be in [-1, 1]",
            )?;
        }

        Ok(())
    }
}

fn check(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(KartenleserError::InvalidConfig(message.to_string()))
    }
}
