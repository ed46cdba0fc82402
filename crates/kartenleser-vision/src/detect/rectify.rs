// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification of the card onto the canonical rectangle.

use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use kartenleser_core::config::RectifyConfig;
use kartenleser_core::error::{KartenleserError, Result};
use kartenleser_core::{CornerSet, Point2};
use tracing::{debug, info, instrument};

use super::geometry::check_quad;

/// A mapped corner may land at most this far from its target.
const CORNER_TOLERANCE_PX: f32 = 1.0;

/// Planar homography from photo coordinates to rectified-card coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Homography(Projection);

impl Homography {
    /// Solve for the homography taking the card corners to `(0, 0)`,
    /// `(0, height)`, `(width, 0)` and `(width, height)`.
    pub fn from_corners(corners: &CornerSet, width: u32, height: u32) -> Result<Self> {
        let (w, h) = (width as f32, height as f32);
        let src: [(f32, f32); 4] = corners.to_array().map(Into::into);
        let dst: [(f32, f32); 4] = [(0.0, 0.0), (0.0, h), (w, 0.0), (w, h)];

        let projection =
            Projection::from_control_points(src, dst).ok_or(KartenleserError::Homography)?;
        let homography = Self(projection);

        // from_control_points can succeed on nearly singular input and
        // produce a transform that misses its own control points.
        for (s, d) in src.iter().zip(&dst) {
            let mapped = homography.map(Point2::from(*s));
            if !mapped.x.is_finite()
                || !mapped.y.is_finite()
                || mapped.distance(&Point2::from(*d)) > CORNER_TOLERANCE_PX
            {
                debug!(?s, ?d, ?mapped, "Control point not reproduced");
                return Err(KartenleserError::Homography);
            }
        }
        Ok(homography)
    }

    /// Map a photo point onto the rectified card.
    pub fn map(&self, p: Point2) -> Point2 {
        Point2::from(self.0 * (p.x, p.y))
    }

    /// Map a rectified-card point back into the photo.
    pub fn map_back(&self, p: Point2) -> Point2 {
        Point2::from(self.0.invert() * (p.x, p.y))
    }

    pub fn projection(&self) -> &Projection {
        &self.0
    }
}

/// The flattened card together with the transform that produced it.
#[derive(Debug, Clone)]
pub struct Rectified {
    pub image: GrayImage,
    pub homography: Homography,
}

/// Warps the card quadrilateral onto a fixed-size rectangle.
#[derive(Debug, Clone)]
pub struct Rectifier {
    config: RectifyConfig,
    min_quad_area: f32,
}

impl Rectifier {
    /// `min_quad_area` is the smallest corner quadrilateral accepted, in
    /// square pixels.
    pub fn new(config: RectifyConfig, min_quad_area: f32) -> Self {
        Self {
            config,
            min_quad_area,
        }
    }

    pub fn config(&self) -> &RectifyConfig {
        &self.config
    }

    #[instrument(skip_all, fields(out_w = self.config.width, out_h = self.config.height))]
    pub fn rectify(&self, gray: &GrayImage, corners: &CornerSet) -> Result<Rectified> {
        check_quad(corners, self.min_quad_area)?;

        let homography = Homography::from_corners(corners, self.config.width, self.config.height)?;
        let mut out = GrayImage::new(self.config.width, self.config.height);
        warp_into(
            gray,
            homography.projection(),
            Interpolation::Bilinear,
            Luma([0u8]),
            &mut out,
        );

        info!("Card rectified");
        Ok(Rectified {
            image: out,
            homography,
        })
    }
}
