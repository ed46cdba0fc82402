// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Card detection: outline, corners and rectification of the card body.

pub mod boundary;
pub mod cluster;
pub mod corners;
pub mod geometry;
pub mod rectify;

pub use boundary::{BoundaryDetector, CardBoundary, ContourSelector};
pub use corners::CornerExtractor;
pub use rectify::{Homography, Rectified, Rectifier};
