// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Kartenleser.

use thiserror::Error;

/// Top-level error type for all Kartenleser operations.
#[derive(Debug, Error)]
pub enum KartenleserError {
    // -- Input errors --
    #[error("invalid input image: {0}")]
    InvalidImage(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Card detection --
    #[error("no contours found in the edge map")]
    NoContours,

    #[error("card outline collapsed to {vertices} vertices")]
    DegeneratePolygon { vertices: usize },

    #[error("found {found} straight edges, need at least {required}")]
    InsufficientLines { found: usize, required: usize },

    #[error("edge clustering is degenerate: {0}")]
    DegenerateClusters(String),

    #[error("card orientation is ambiguous: {0}")]
    AmbiguousOrientation(String),

    #[error("edge pairing is near-parallel ({angle_deg:.1} degrees apart)")]
    ParallelLines { angle_deg: f32 },

    #[error("corner quadrilateral is degenerate: {0}")]
    DegenerateQuad(String),

    #[error("homography could not be computed from the card corners")]
    Homography,

    // -- Digit reading --
    #[error("reference glyph set is invalid: {0}")]
    ReferenceGlyphs(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse failure category, so a caller can report "could not locate card"
/// separately from "could not read digits".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The image itself is unusable (decode failure, zero dimensions, I/O).
    Input,
    /// The card body or its corners could not be located.
    CardNotFound,
    /// The card was found but the digits could not be read.
    DigitsUnreadable,
    /// Tuned parameters or supplied assets are invalid.
    Configuration,
}

impl KartenleserError {
    /// Which stage of the run this error belongs to.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidImage(_) | Self::ImageError(_) | Self::Io(_) => FailureKind::Input,
            Self::NoContours
            | Self::DegeneratePolygon { .. }
            | Self::InsufficientLines { .. }
            | Self::DegenerateClusters(_)
            | Self::AmbiguousOrientation(_)
            | Self::ParallelLines { .. }
            | Self::DegenerateQuad(_)
            | Self::Homography => FailureKind::CardNotFound,
            Self::ReferenceGlyphs(_) => FailureKind::DigitsUnreadable,
            Self::InvalidConfig(_) | Self::Serialization(_) => FailureKind::Configuration,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, KartenleserError>;
