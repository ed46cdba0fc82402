// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner extraction from the card outline mask.
//
// Hough lines are converted to foot points and clustered into the four card
// edges. Each cluster centre is then refitted to the outline pixels around
// it, because Hough neighbours on both sides of the 0/180 degree wrap average
// into a slightly tilted centre. The edges are split into a near-vertical and a near-horizontal
// family and every vertical edge is intersected with every horizontal one.

use image::GrayImage;
use imageproc::hough::{LineDetectionOptions, detect_lines};
use kartenleser_core::config::CornerConfig;
use kartenleser_core::error::{KartenleserError, Result};
use kartenleser_core::{CornerSet, Point2};
use tracing::{debug, info, instrument, warn};

use super::cluster::{KMeansParams, kmeans};
use super::geometry::{
    angle_between_deg, check_quad, fit_foot_line, foot_point, intersect_foot_lines,
    normal_tilt_deg,
};

/// Number of card edges.
const EDGES: usize = 4;

/// Refit passes per edge. The second pass recentres the band on the first fit.
const REFINE_PASSES: usize = 2;

/// Turns an outline mask into four ordered card corners.
#[derive(Debug, Clone)]
pub struct CornerExtractor {
    config: CornerConfig,
}

/// The four card edges split into two families of two, in foot-point form.
#[derive(Debug, Clone, Copy)]
struct EdgeFamilies {
    vertical: [Point2; 2],
    horizontal: [Point2; 2],
}

impl CornerExtractor {
    pub fn new(config: CornerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CornerConfig {
        &self.config
    }

    /// Find the corners of the quadrilateral outlined in `mask`.
    #[instrument(skip_all, fields(width = mask.width(), height = mask.height()))]
    pub fn extract(&self, mask: &GrayImage) -> Result<CornerSet> {
        let options = LineDetectionOptions {
            vote_threshold: self.config.vote_threshold,
            suppression_radius: self.config.suppression_radius,
        };
        let lines = detect_lines(mask, options);
        debug!(line_count = lines.len(), "Hough lines detected");
        if lines.len() < EDGES {
            return Err(KartenleserError::InsufficientLines {
                found: lines.len(),
                required: EDGES,
            });
        }

        let feet: Vec<Point2> = lines.iter().map(foot_point).collect();
        let edges = self.cluster_edges(&feet)?;
        let edges = self.refine_edges(&outline_pixels(mask), edges);
        let families = self.split_families(edges)?;
        let corners = self.intersect(&families)?;

        check_quad(&corners, self.config.min_quad_area)?;
        info!(
            top_left = ?corners.top_left,
            bottom_left = ?corners.bottom_left,
            top_right = ?corners.top_right,
            bottom_right = ?corners.bottom_right,
            "Card corners extracted"
        );
        Ok(corners)
    }

    // -- Stages -------------------------------------------------------------

    /// Cluster foot points into four edge centroids.
    fn cluster_edges(&self, feet: &[Point2]) -> Result<[Point2; EDGES]> {
        let params = KMeansParams {
            k: EDGES,
            max_iterations: self.config.max_iterations,
            epsilon: self.config.epsilon,
            attempts: self.config.attempts,
        };
        let clustering = kmeans(feet, &params).ok_or_else(|| {
            KartenleserError::DegenerateClusters(format!(
                "{} lines cannot form {EDGES} clusters",
                feet.len()
            ))
        })?;

        if let Some(empty) = clustering.sizes().iter().position(|&n| n == 0) {
            return Err(KartenleserError::DegenerateClusters(format!(
                "cluster {empty} is empty"
            )));
        }

        let centers = &clustering.centers;
        let origin = Point2::default();
        if let Some(c) = centers.iter().find(|c| c.distance(&origin) < 0.5) {
            return Err(KartenleserError::DegenerateClusters(format!(
                "centroid {c:?} sits on the origin, edge direction undefined"
            )));
        }
        for i in 0..EDGES {
            for j in i + 1..EDGES {
                let gap = centers[i].distance(&centers[j]);
                if gap < self.config.min_centroid_separation {
                    return Err(KartenleserError::DegenerateClusters(format!(
                        "centroids {i} and {j} are only {gap:.1} px apart"
                    )));
                }
            }
        }
        debug!(?centers, compactness = clustering.compactness, "Edges clustered");

        Ok([centers[0], centers[1], centers[2], centers[3]])
    }

    /// Refit each clustered edge to the outline pixels within `refine_band`
    /// of it. An edge without enough support keeps its cluster centre.
    fn refine_edges(&self, outline: &[Point2], edges: [Point2; EDGES]) -> [Point2; EDGES] {
        let band = self.config.refine_band;
        let min_support = self.config.vote_threshold as usize;
        edges.map(|edge| {
            let mut line = edge;
            for _ in 0..REFINE_PASSES {
                let support = band_pixels(outline, line, band);
                if support.len() < min_support {
                    break;
                }
                match fit_foot_line(&support) {
                    Some(fitted) => line = fitted,
                    None => break,
                }
            }
            debug!(?edge, refined = ?line, "Edge refitted");
            line
        })
    }

    /// Split edges by the tilt of their normals: the two smallest tilts are
    /// the near-vertical edges. Falls back to pairing by parallelism when the
    /// split is ambiguous.
    fn split_families(&self, mut edges: [Point2; EDGES]) -> Result<EdgeFamilies> {
        edges.sort_by(|a, b| normal_tilt_deg(*a).total_cmp(&normal_tilt_deg(*b)));
        let gap = normal_tilt_deg(edges[2]) - normal_tilt_deg(edges[1]);
        if gap >= self.config.ambiguity_gap_deg {
            return Ok(EdgeFamilies {
                vertical: [edges[0], edges[1]],
                horizontal: [edges[2], edges[3]],
            });
        }

        warn!(
            gap_deg = gap,
            "Edge orientation split is ambiguous; pairing by parallelism"
        );
        self.pair_parallel(edges)
    }

    /// Choose the pairing of four edges into two families that minimises the
    /// angle inside each family. The families must still cross at a usable
    /// angle.
    fn pair_parallel(&self, edges: [Point2; EDGES]) -> Result<EdgeFamilies> {
        const PAIRINGS: [[usize; 4]; 3] = [[0, 1, 2, 3], [0, 2, 1, 3], [0, 3, 1, 2]];

        let spread = |p: &[usize; 4]| {
            angle_between_deg(edges[p[0]], edges[p[1]]) + angle_between_deg(edges[p[2]], edges[p[3]])
        };
        let best = PAIRINGS
            .iter()
            .min_by(|a, b| spread(*a).total_cmp(&spread(*b)))
            .copied()
            .unwrap_or(PAIRINGS[0]);

        let first = [edges[best[0]], edges[best[1]]];
        let second = [edges[best[2]], edges[best[3]]];
        let crossing = first
            .iter()
            .flat_map(|a| second.iter().map(move |b| angle_between_deg(*a, *b)))
            .fold(f32::MAX, f32::min);
        if crossing < self.config.min_intersection_angle_deg {
            return Err(KartenleserError::AmbiguousOrientation(format!(
                "edge families cross at only {crossing:.1} degrees"
            )));
        }

        // Either family can play the vertical role; intersect() only pairs
        // across families and the result is re-ordered by position.
        Ok(EdgeFamilies {
            vertical: first,
            horizontal: second,
        })
    }

    /// Intersect each vertical edge with each horizontal edge.
    fn intersect(&self, families: &EdgeFamilies) -> Result<CornerSet> {
        let mut points = [Point2::default(); EDGES];
        let mut n = 0;
        for v in families.vertical {
            for h in families.horizontal {
                let angle = angle_between_deg(v, h);
                if angle < self.config.min_intersection_angle_deg {
                    return Err(KartenleserError::ParallelLines { angle_deg: angle });
                }
                points[n] = intersect_foot_lines(v, h)
                    .ok_or(KartenleserError::ParallelLines { angle_deg: angle })?;
                n += 1;
            }
        }
        Ok(CornerSet::from_unordered(points))
    }
}

/// Coordinates of every lit mask pixel.
fn outline_pixels(mask: &GrayImage) -> Vec<Point2> {
    mask.enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > 0)
        .map(|(x, y, _)| Point2::new(x as f32, y as f32))
        .collect()
}

/// Points within `band` pixels of the foot-point line `foot`.
fn band_pixels(outline: &[Point2], foot: Point2, band: f32) -> Vec<Point2> {
    let r = foot.x.hypot(foot.y);
    if r == 0.0 {
        return Vec::new();
    }
    let (nx, ny) = (foot.x / r, foot.y / r);
    outline
        .iter()
        .copied()
        .filter(|p| (p.x * nx + p.y * ny - r).abs() <= band)
        .collect()
}
