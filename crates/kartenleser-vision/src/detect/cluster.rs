// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// k-means clustering of 2-D points.
//
// Each attempt is seeded deterministically with farthest-point seeding from a
// different starting point, so repeated runs on the same input give the same
// clusters. The most compact attempt wins.

use kartenleser_core::Point2;
use tracing::debug;

/// Parameters of one clustering run.
#[derive(Debug, Clone, Copy)]
pub struct KMeansParams {
    /// Number of clusters.
    pub k: usize,
    /// Iteration cap per attempt.
    pub max_iterations: usize,
    /// Stop when no centre moves further than this.
    pub epsilon: f32,
    /// Number of seeded attempts.
    pub attempts: usize,
}

/// Result of clustering.
#[derive(Debug, Clone)]
pub struct Clustering {
    pub centers: Vec<Point2>,
    /// Cluster index for each input point.
    pub labels: Vec<usize>,
    /// Sum of squared distances of points to their centre.
    pub compactness: f32,
}

impl Clustering {
    /// Number of points assigned to each cluster.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centers.len()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

/// Cluster `points` into `params.k` groups. `None` when there are fewer
/// points than clusters or `k` is zero.
pub fn kmeans(points: &[Point2], params: &KMeansParams) -> Option<Clustering> {
    let n = points.len();
    if params.k == 0 || n < params.k {
        return None;
    }

    let attempts = params.attempts.max(1);
    let mut best: Option<Clustering> = None;
    for attempt in 0..attempts {
        let start = attempt * n / attempts;
        let seeds = farthest_point_seeds(points, params.k, start);
        let result = refine(points, seeds, params);
        debug!(attempt, compactness = result.compactness, "k-means attempt");
        if best
            .as_ref()
            .is_none_or(|b| result.compactness < b.compactness)
        {
            best = Some(result);
        }
    }
    best
}

fn dist2(a: Point2, b: Point2) -> f32 {
    (a.x - b.x).powi(2) + (a.y - b.y).powi(2)
}

/// Start at `points[start]`, then repeatedly add the point farthest from all
/// centres chosen so far.
fn farthest_point_seeds(points: &[Point2], k: usize, start: usize) -> Vec<Point2> {
    let mut centers = vec![points[start]];
    let mut nearest: Vec<f32> = points.iter().map(|&p| dist2(p, points[start])).collect();
    while centers.len() < k {
        let (idx, _) = nearest
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |acc, (i, &d)| if d > acc.1 { (i, d) } else { acc });
        let chosen = points[idx];
        centers.push(chosen);
        for (slot, &p) in nearest.iter_mut().zip(points) {
            *slot = slot.min(dist2(p, chosen));
        }
    }
    centers
}

fn nearest_center(p: Point2, centers: &[Point2]) -> (usize, f32) {
    centers
        .iter()
        .enumerate()
        .map(|(i, &c)| (i, dist2(p, c)))
        .fold((0, f32::MAX), |acc, cur| if cur.1 < acc.1 { cur } else { acc })
}

/// Lloyd iterations. A cluster that loses all its points keeps its previous
/// centre.
fn refine(points: &[Point2], mut centers: Vec<Point2>, params: &KMeansParams) -> Clustering {
    let k = centers.len();
    let mut labels = vec![0usize; points.len()];

    for _ in 0..params.max_iterations.max(1) {
        for (label, &p) in labels.iter_mut().zip(points) {
            *label = nearest_center(p, &centers).0;
        }

        let mut sums = vec![(0.0f32, 0.0f32, 0usize); k];
        for (&label, p) in labels.iter().zip(points) {
            sums[label].0 += p.x;
            sums[label].1 += p.y;
            sums[label].2 += 1;
        }

        let mut max_shift = 0.0f32;
        for (center, &(sx, sy, count)) in centers.iter_mut().zip(&sums) {
            if count == 0 {
                continue;
            }
            let moved = Point2::new(sx / count as f32, sy / count as f32);
            max_shift = max_shift.max(moved.distance(center));
            *center = moved;
        }
        if max_shift < params.epsilon {
            break;
        }
    }

    let mut compactness = 0.0f32;
    for (label, &p) in labels.iter_mut().zip(points) {
        let (nearest, d) = nearest_center(p, &centers);
        *label = nearest;
        compactness += d;
    }

    Clustering {
        centers,
        labels,
        compactness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: KMeansParams = KMeansParams {
        k: 4,
        max_iterations: 10,
        epsilon: 1.0,
        attempts: 5,
    };

    #[test]
    fn separates_four_blobs() {
        let blobs = [(50.0, 0.0), (590.0, 0.0), (0.0, 50.0), (0.0, 390.0)];
        let mut points = Vec::new();
        for &(x, y) in &blobs {
            for (dx, dy) in [(0.0, 0.0), (1.5, -1.0), (-1.0, 2.0)] {
                points.push(Point2::new(x + dx, y + dy));
            }
        }

        let clustering = kmeans(&points, &PARAMS).expect("enough points");
        assert_eq!(clustering.sizes(), vec![3, 3, 3, 3]);
        for &(x, y) in &blobs {
            let target = Point2::new(x, y);
            assert!(
                clustering.centers.iter().any(|c| c.distance(&target) < 2.0),
                "no centre near {target:?}: {:?}",
                clustering.centers
            );
        }
    }

    #[test]
    fn exactly_k_points_become_their_own_centres() {
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 10.0),
            Point2::new(10.0, 10.0),
        ];
        let clustering = kmeans(&points, &PARAMS).expect("enough points");
        assert_eq!(clustering.compactness, 0.0);
        assert_eq!(clustering.sizes(), vec![1, 1, 1, 1]);
    }

    #[test]
    fn too_few_points_is_none() {
        let points = [Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)];
        assert!(kmeans(&points, &PARAMS).is_none());
    }

    #[test]
    fn repeated_runs_agree() {
        let points: Vec<Point2> = (0..40)
            .map(|i| Point2::new((i * 37 % 101) as f32, (i * 53 % 97) as f32))
            .collect();
        let a = kmeans(&points, &PARAMS).expect("enough points");
        let b = kmeans(&points, &PARAMS).expect("enough points");
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.centers, b.centers);
    }
}
