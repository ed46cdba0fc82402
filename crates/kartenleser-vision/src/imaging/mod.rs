// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Imaging module — input preparation, Otsu thresholding and rectangular
// morphology on grayscale buffers.

pub mod input;
pub mod morphology;
pub mod threshold;

pub use input::InputImage;
