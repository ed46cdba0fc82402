// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic fixtures shared by the unit tests: a seven-segment style digit
// font, a font sheet rendered in it, and cards printed with it.

use std::sync::Arc;

use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::geometric_transformations::{Interpolation, Projection, rotate_about_center, warp};
use imageproc::rect::Rect;
use kartenleser_core::DigitGroupRect;
use kartenleser_core::config::ClassifyConfig;

use crate::read::reference::ReferenceGlyphs;

pub const CELL_W: u32 = 18;
pub const CELL_H: u32 = 30;
const STROKE: u32 = 4;

/// Horizontal distance between digits inside a group.
pub const DIGIT_PITCH: u32 = 24;
/// Width of four digits printed at `DIGIT_PITCH`.
pub const GROUP_WIDTH: u32 = 3 * DIGIT_PITCH + CELL_W;
const GROUP_PITCH: u32 = 120;
const GROUP_LEFT: u32 = 40;
const GROUP_TOP: u32 = 180;

pub const CARD_W: u32 = 540;
pub const CARD_H: u32 = 340;
const CARD_BG: u8 = 90;
const INK: u8 = 230;

/// Where the card sits inside `card_photo`.
pub const PHOTO_OFFSET: u32 = 50;
const PHOTO_BG: u8 = 20;

/// Filled rectangles `(x, y, w, h)` making up one digit inside its cell.
fn strokes(digit: u8) -> Vec<(u32, u32, u32, u32)> {
    let half = (CELL_H - STROKE) / 2 + STROKE;
    let a = (0, 0, CELL_W, STROKE);
    let b = (CELL_W - STROKE, 0, STROKE, half);
    let c = (CELL_W - STROKE, CELL_H - half, STROKE, half);
    let d = (0, CELL_H - STROKE, CELL_W, STROKE);
    let e = (0, CELL_H - half, STROKE, half);
    let f = (0, 0, STROKE, half);
    let g = (0, (CELL_H - STROKE) / 2, CELL_W, STROKE);

    match digit {
        0 => vec![a, b, c, d, e, f],
        // Full-width foot so a run of ones still spans a whole group.
        1 => vec![(7, 0, STROKE, CELL_H), d, (3, 0, 6, STROKE)],
        2 => vec![a, b, g, e, d],
        3 => vec![a, b, g, c, d],
        4 => vec![f, g, b, c],
        5 => vec![a, f, g, c, d],
        6 => vec![a, f, g, e, c, d],
        7 => vec![a, b, c],
        8 => vec![a, b, c, d, e, f, g],
        _ => vec![a, b, c, d, f, g],
    }
}

pub fn draw_digit(image: &mut GrayImage, x: u32, y: u32, digit: u8, ink: u8) {
    for (sx, sy, w, h) in strokes(digit) {
        let rect = Rect::at((x + sx) as i32, (y + sy) as i32).of_size(w, h);
        draw_filled_rect_mut(image, rect, Luma([ink]));
    }
}

/// Black digits 0-9 left to right on white, 10 px margin, 12 px apart.
pub fn font_sheet() -> GrayImage {
    let gap = 12;
    let width = 2 * 10 + 10 * CELL_W + 9 * gap;
    let mut sheet = GrayImage::from_pixel(width, CELL_H + 20, Luma([255]));
    for digit in 0..10u8 {
        draw_digit(&mut sheet, 10 + digit as u32 * (CELL_W + gap), 10, digit, 0);
    }
    sheet
}

pub fn reference_glyphs() -> Arc<ReferenceGlyphs> {
    Arc::new(
        ReferenceGlyphs::from_font_sheet(&font_sheet(), &ClassifyConfig::default())
            .expect("font sheet has ten glyphs"),
    )
}

/// Top-left corner of digit group `g` on the rectified card.
pub fn group_origin(g: usize) -> (u32, u32) {
    (GROUP_LEFT + g as u32 * GROUP_PITCH, GROUP_TOP)
}

/// Box the segmenter draws around group `g`: the printed digits plus the
/// one-pixel gradient fringe.
pub fn group_rect(g: usize) -> DigitGroupRect {
    let (x, y) = group_origin(g);
    DigitGroupRect {
        x: x - 1,
        y: y - 1,
        width: GROUP_WIDTH + 2,
        height: CELL_H + 2,
    }
}

/// A flat, rectified card face with `digits` printed four per group.
pub fn card_face(digits: &str) -> GrayImage {
    let mut face = GrayImage::from_pixel(CARD_W, CARD_H, Luma([CARD_BG]));
    for (i, ch) in digits.bytes().enumerate() {
        let (gx, gy) = group_origin(i / 4);
        let x = gx + (i % 4) as u32 * DIGIT_PITCH;
        draw_digit(&mut face, x, gy, ch - b'0', INK);
    }
    face
}

/// `card_face` lying on a dark table, as a 640x440 working image.
pub fn card_photo(digits: &str) -> GrayImage {
    let face = card_face(digits);
    let mut photo = GrayImage::from_pixel(
        CARD_W + 2 * PHOTO_OFFSET,
        CARD_H + 2 * PHOTO_OFFSET,
        Luma([PHOTO_BG]),
    );
    image::imageops::replace(&mut photo, &face, PHOTO_OFFSET as i64, PHOTO_OFFSET as i64);
    photo
}

/// Side of the square canvas tilted photos are rendered on. A card rotated by
/// any angle about the centre stays inside it.
pub const TILT_CANVAS: u32 = 720;

/// `card_face` centred on a dark `TILT_CANVAS` square, with the card's
/// corners in TL, TR, BR, BL order.
fn card_on_canvas(digits: &str) -> (GrayImage, [(f32, f32); 4]) {
    let face = card_face(digits);
    let mut canvas = GrayImage::from_pixel(TILT_CANVAS, TILT_CANVAS, Luma([PHOTO_BG]));
    let (x0, y0) = ((TILT_CANVAS - CARD_W) / 2, (TILT_CANVAS - CARD_H) / 2);
    image::imageops::replace(&mut canvas, &face, x0 as i64, y0 as i64);

    let (x0, y0) = (x0 as f32, y0 as f32);
    let (x1, y1) = (x0 + CARD_W as f32, y0 + CARD_H as f32);
    (canvas, [(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
}

/// The card rotated by `degrees` about the canvas centre.
pub fn rotated_card_photo(digits: &str, degrees: f32) -> GrayImage {
    let (canvas, _) = card_on_canvas(digits);
    rotate_about_center(
        &canvas,
        degrees.to_radians(),
        Interpolation::Bilinear,
        Luma([PHOTO_BG]),
    )
}

/// The card photographed at a slant: its corners (TL, TR, BR, BL) land on
/// `quad`.
pub fn slanted_card_photo(digits: &str, quad: [(f32, f32); 4]) -> GrayImage {
    let (canvas, corners) = card_on_canvas(digits);
    let projection = Projection::from_control_points(corners, quad).expect("non-degenerate quad");
    warp(&canvas, &projection, Interpolation::Bilinear, Luma([PHOTO_BG]))
}

/// A `fg` rectangle `(x, y, w, h)` on a `bg` image.
pub fn rectangle_image(
    width: u32,
    height: u32,
    (x, y, w, h): (u32, u32, u32, u32),
    bg: u8,
    fg: u8,
) -> GrayImage {
    let mut img = GrayImage::from_pixel(width, height, Luma([bg]));
    draw_filled_rect_mut(&mut img, Rect::at(x as i32, y as i32).of_size(w, h), Luma([fg]));
    img
}

/// Closed polyline through `points` drawn at 255 on black.
pub fn outline_mask(width: u32, height: u32, points: &[(f32, f32)]) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    for (i, &p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        if p != q {
            draw_line_segment_mut(&mut mask, p, q, Luma([255u8]));
        }
    }
    mask
}
