// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Card outline detection.
//
// Blur, Canny, external contours, pick the dominant one, take its convex hull
// and simplify it to a polygon. The polygon is also rasterised into a 1-px
// outline mask, which is what the corner extractor runs its Hough transform
// on.

use std::fmt::Debug;

use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, Contour, find_contours};
use imageproc::drawing::draw_line_segment_mut;
use imageproc::edges::canny;
use imageproc::filter::box_filter;
use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use kartenleser_core::config::BoundaryConfig;
use kartenleser_core::error::{KartenleserError, Result};
use tracing::{debug, info, instrument};

use super::geometry::{contour_area, simplify_closed};

// -- Contour selection --------------------------------------------------------

/// Strategy for picking the card body among the external contours of the
/// edge map.
pub trait ContourSelector: Send + Sync + Debug {
    /// Return the contour that most likely traces the card, or `None` if
    /// `contours` is empty.
    fn select<'a>(&self, contours: &'a [Contour<i32>]) -> Option<&'a Contour<i32>>;
}

/// Picks the contour with the most points. Cheap and reliable when the card
/// is the largest object in frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongestContour;

impl ContourSelector for LongestContour {
    fn select<'a>(&self, contours: &'a [Contour<i32>]) -> Option<&'a Contour<i32>> {
        contours.iter().max_by_key(|c| c.points.len())
    }
}

/// Picks the contour with the largest `area * solidity`, where solidity is
/// the enclosed area over the area of its convex hull. Favours big compact
/// shapes over long ragged edges such as a cluttered background.
#[derive(Debug, Clone, Copy, Default)]
pub struct LargestSolidArea;

impl LargestSolidArea {
    fn score(contour: &Contour<i32>) -> f64 {
        let area = contour_area(&contour.points);
        let hull_area = contour_area(&convex_hull(contour.points.as_slice()));
        if hull_area <= 0.0 {
            return 0.0;
        }
        area * (area / hull_area)
    }
}

impl ContourSelector for LargestSolidArea {
    fn select<'a>(&self, contours: &'a [Contour<i32>]) -> Option<&'a Contour<i32>> {
        contours
            .iter()
            .map(|c| (c, Self::score(c)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c)
    }
}

// -- Detector -----------------------------------------------------------------

/// Outline of the card in working-image coordinates.
#[derive(Debug, Clone)]
pub struct CardBoundary {
    /// Simplified convex polygon, at least three vertices.
    pub polygon: Vec<Point<i32>>,
    /// Same size as the input; the polygon outline drawn at 255 on black.
    pub mask: GrayImage,
}

/// Finds the card outline in a grayscale image.
#[derive(Debug)]
pub struct BoundaryDetector {
    config: BoundaryConfig,
    selector: Box<dyn ContourSelector>,
}

impl BoundaryDetector {
    /// Detector using the default `LongestContour` selector.
    pub fn new(config: BoundaryConfig) -> Self {
        Self::with_selector(config, Box::new(LongestContour))
    }

    pub fn with_selector(config: BoundaryConfig, selector: Box<dyn ContourSelector>) -> Self {
        Self { config, selector }
    }

    pub fn config(&self) -> &BoundaryConfig {
        &self.config
    }

    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn detect(&self, gray: &GrayImage) -> Result<CardBoundary> {
        let radius = self.config.blur_radius;
        let smoothed = if radius > 0 {
            box_filter(gray, radius, radius)
        } else {
            gray.clone()
        };
        let edges = canny(&smoothed, self.config.canny_low, self.config.canny_high);

        let contours: Vec<Contour<i32>> = find_contours::<i32>(&edges)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .collect();
        debug!(contours = contours.len(), "External contours found");

        let dominant = self
            .selector
            .select(&contours)
            .ok_or(KartenleserError::NoContours)?;

        let hull = convex_hull(dominant.points.as_slice());
        let polygon = simplify_closed(&hull, self.config.polygon_tolerance);
        debug!(
            contour_points = dominant.points.len(),
            hull_points = hull.len(),
            vertices = polygon.len(),
            "Dominant contour simplified"
        );
        if polygon.len() < 3 {
            return Err(KartenleserError::DegeneratePolygon {
                vertices: polygon.len(),
            });
        }

        let mask = outline_mask(gray.width(), gray.height(), &polygon);
        info!(vertices = polygon.len(), "Card boundary detected");
        Ok(CardBoundary { polygon, mask })
    }
}

/// Rasterise a closed polygon as a 1-px outline.
fn outline_mask(width: u32, height: u32, polygon: &[Point<i32>]) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    for (i, p) in polygon.iter().enumerate() {
        let q = polygon[(i + 1) % polygon.len()];
        draw_line_segment_mut(
            &mut mask,
            (p.x as f32, p.y as f32),
            (q.x as f32, q.y as f32),
            Luma([255u8]),
        );
    }
    mask
}
