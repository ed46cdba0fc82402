// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grayscale morphology with a rectangular structuring element, built on
// `imageproc::morphology` masks. The element is anchored at its centre
// (`width / 2`, `height / 2`) and pixels outside the image are ignored.

use image::{GrayImage, Luma};
use imageproc::morphology::{Mask, grayscale_close, grayscale_open};

/// Largest side length `Mask::from_image` accepts.
const MAX_SIDE: u32 = 511;

/// Rectangular structuring element, `width` x `height` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectKernel {
    pub width: u32,
    pub height: u32,
}

impl RectKernel {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.clamp(1, MAX_SIDE),
            height: height.clamp(1, MAX_SIDE),
        }
    }

    /// The kernel as an imageproc mask.
    pub fn mask(&self) -> Mask {
        let block = GrayImage::from_pixel(self.width, self.height, Luma([255u8]));
        // Both halves are at most 255 after the clamp in `new`.
        Mask::from_image(&block, (self.width / 2) as u8, (self.height / 2) as u8)
    }
}

/// Dilation followed by erosion: fills dark gaps smaller than the kernel.
pub fn close(image: &GrayImage, kernel: RectKernel) -> GrayImage {
    grayscale_close(image, &kernel.mask())
}

/// White top-hat: `image - open(image)`. Keeps bright structures smaller than
/// the kernel and flattens the slowly varying background.
pub fn top_hat(image: &GrayImage, kernel: RectKernel) -> GrayImage {
    let opened = grayscale_open(image, &kernel.mask());
    let mut out = image.clone();
    for (dst, background) in out.pixels_mut().zip(opened.pixels()) {
        dst.0[0] = dst.0[0].saturating_sub(background.0[0]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_block(w: u32, h: u32, x0: u32, y0: u32, bw: u32, bh: u32) -> GrayImage {
        let mut img = GrayImage::from_pixel(w, h, Luma([50]));
        for y in y0..y0 + bh {
            for x in x0..x0 + bw {
                img.put_pixel(x, y, Luma([200]));
            }
        }
        img
    }

    #[test]
    fn top_hat_keeps_thin_strokes_and_drops_background() {
        // A 3px wide bar is narrower than the 15px kernel, so it survives.
        let img = with_block(60, 30, 20, 5, 3, 20);
        let hat = top_hat(&img, RectKernel::new(15, 5));
        assert_eq!(hat.get_pixel(21, 10).0[0], 150);
        assert_eq!(hat.get_pixel(5, 5).0[0], 0);
    }

    #[test]
    fn top_hat_drops_structures_larger_than_kernel() {
        // 20x10 block is larger than the kernel in both directions.
        let img = with_block(60, 30, 20, 10, 20, 10);
        let hat = top_hat(&img, RectKernel::new(15, 5));
        assert!(hat.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn closing_bridges_narrow_gaps() {
        let mut img = GrayImage::new(40, 9);
        for y in 2..7 {
            for x in (5..15).chain(20..30) {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let closed = close(&img, RectKernel::new(15, 5));
        // The 5px gap between the two blocks is filled.
        assert_eq!(closed.get_pixel(17, 4).0[0], 255);
        // Outside the blocks stays dark.
        assert_eq!(closed.get_pixel(36, 4).0[0], 0);
    }

    #[test]
    fn mask_covers_the_whole_rectangle() {
        let kernel = RectKernel::new(15, 5);
        let mut dot = GrayImage::new(31, 11);
        dot.put_pixel(15, 5, Luma([255]));
        let spread = imageproc::morphology::grayscale_dilate(&dot, &kernel.mask());
        let lit = spread.pixels().filter(|p| p.0[0] == 255).count();
        assert_eq!(lit, 15 * 5);
        assert_eq!(spread.get_pixel(8, 3).0[0], 255);
        assert_eq!(spread.get_pixel(22, 7).0[0], 255);
        assert_eq!(spread.get_pixel(7, 5).0[0], 0);
    }

    #[test]
    fn unit_kernel_is_identity() {
        let img = with_block(10, 10, 2, 2, 3, 3);
        assert_eq!(close(&img, RectKernel::new(1, 1)), img);
        assert!(top_hat(&img, RectKernel::new(0, 0)).pixels().all(|p| p.0[0] == 0));
    }
}
