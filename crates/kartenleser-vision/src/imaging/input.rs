// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input preparation — decode a photo, scale it to the working width and
// convert it to grayscale. This is the only place the pipeline touches colour
// or arbitrary resolutions.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageError};
use kartenleser_core::error::{KartenleserError, Result};
use tracing::{debug, info, instrument};

/// A decoded photo waiting to enter the pipeline.
///
/// ```ignore
/// let gray = InputImage::open("card.jpg")?.to_working_gray(540)?;
/// let scan = reader.read(&gray)?;
/// ```
pub struct InputImage {
    /// The decoded image, still in its original colour space and size.
    image: DynamicImage,
}

impl InputImage {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| match err {
            ImageError::IoError(io) => KartenleserError::Io(io),
            other => KartenleserError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                other
            )),
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Decode raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            KartenleserError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    // -- Output ---------------------------------------------------------------

    /// Grayscale copy at the original resolution.
    pub fn to_gray(&self) -> GrayImage {
        self.image.to_luma8()
    }

    /// Resize to exactly `working_width` columns, keeping the aspect ratio,
    /// and convert to 8-bit grayscale.
    ///
    /// Every pixel-valued threshold in the pipeline is tuned for one working
    /// width, so callers should pass `PipelineConfig::working_width` here.
    #[instrument(skip(self))]
    pub fn to_working_gray(&self, working_width: u32) -> Result<GrayImage> {
        let (w, h) = (self.image.width(), self.image.height());
        if w == 0 || h == 0 || working_width == 0 {
            return Err(KartenleserError::InvalidImage(format!(
                "cannot scale a {w}x{h} image to width {working_width}"
            )));
        }

        let scaled_h = ((working_width as f64 * h as f64 / w as f64).round() as u32).max(1);
        let gray = if w == working_width && h == scaled_h {
            self.image.to_luma8()
        } else {
            self.image
                .resize_exact(working_width, scaled_h, FilterType::Triangle)
                .to_luma8()
        };
        debug!(from_w = w, from_h = h, to_w = working_width, to_h = scaled_h, "Working image ready");
        Ok(gray)
    }
}
