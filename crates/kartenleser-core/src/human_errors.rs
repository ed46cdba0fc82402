// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people holding a phone over a card.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The taxonomy uses three severity levels that drive how the caller reacts.

use crate::error::KartenleserError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A clearer photo will probably fix it.
    Retake,
    /// The user has to change something other than the photo (file, path).
    ActionRequired,
    /// Cannot be fixed by retaking the photo: broken asset or configuration.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether taking another photo is worth it.
    pub retriable: bool,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `KartenleserError` into a `HumanError`.
pub fn humanize_error(err: &KartenleserError) -> HumanError {
    match err {
        // -- Input errors --
        KartenleserError::InvalidImage(_) | KartenleserError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged, empty or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Card detection --
        KartenleserError::NoContours => HumanError {
            message: "We couldn't see a card in this photo.".into(),
            suggestion: "Put the card on a plain, darker surface so its edges stand out, then take the photo again.".into(),
            retriable: true,
            severity: Severity::Retake,
        },

        KartenleserError::DegeneratePolygon { .. }
        | KartenleserError::InsufficientLines { .. }
        | KartenleserError::DegenerateClusters(_) => HumanError {
            message: "We couldn't find all four edges of the card.".into(),
            suggestion: "Make sure the whole card is in the picture and nothing covers its corners.".into(),
            retriable: true,
            severity: Severity::Retake,
        },

        KartenleserError::AmbiguousOrientation(_) => HumanError {
            message: "The card is turned at an awkward angle.".into(),
            suggestion: "Hold the phone so the card's long edge runs roughly left to right, then try again.".into(),
            retriable: true,
            severity: Severity::Retake,
        },

        KartenleserError::ParallelLines { .. }
        | KartenleserError::DegenerateQuad(_)
        | KartenleserError::Homography => HumanError {
            message: "The card's corners don't line up.".into(),
            suggestion: "Take the photo from straight above the card rather than at a steep angle.".into(),
            retriable: true,
            severity: Severity::Retake,
        },

        // -- Digit reading --
        KartenleserError::ReferenceGlyphs(detail) => HumanError {
            message: "The digit font sheet can't be used.".into(),
            suggestion: format!("Supply a font sheet with the ten digits 0 to 9 laid out left to right. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Configuration --
        KartenleserError::InvalidConfig(detail) => HumanError {
            message: "The reader settings are not valid.".into(),
            suggestion: format!("Fix the configuration file or remove it to use the defaults. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        KartenleserError::Serialization(_) => HumanError {
            message: "The configuration file couldn't be read.".into(),
            suggestion: "Check that the configuration file is valid JSON.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Storage --
        KartenleserError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to read that file.".into(),
                    suggestion: "Check the file permissions, or copy the file to a different location first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading a file.".into(),
                    suggestion: "Try again. If this keeps happening, the disk may be full or failing.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            }
        }
    }
}
