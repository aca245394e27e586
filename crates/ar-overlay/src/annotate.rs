//! Detection overlays for debugging displays.
//!
//! Every detected marker gets a green bounding quadrilateral, a red dot at
//! its center and its numeric id above the top-left corner. Ids are
//! integers, so the label renderer only carries a small digit stencil.

use ar_overlay_aruco::Detection;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_antialiased_line_segment_mut, draw_filled_circle_mut};
use imageproc::pixelops::interpolate;

const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);

const CENTER_DOT_RADIUS: i32 = 4;
const LABEL_OFFSET_Y: i32 = 15;

/// Draw all detections onto a copy of the frame.
pub fn draw_detections(frame: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut out = frame.clone();
    for det in detections {
        draw_detection(&mut out, det);
    }
    out
}

fn draw_detection(img: &mut RgbImage, det: &Detection) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    let corner = |i: usize| {
        (
            det.corners[i].x.round() as i32,
            det.corners[i].y.round() as i32,
        )
    };

    for i in 0..4 {
        let a = corner(i);
        let b = corner((i + 1) % 4);
        let inside = |p: (i32, i32)| p.0 >= 0 && p.1 >= 0 && p.0 < w && p.1 < h;
        if inside(a) && inside(b) {
            draw_antialiased_line_segment_mut(img, a, b, GREEN, interpolate);
        }
    }

    // center of the TL/BR diagonal
    let (tlx, tly) = corner(0);
    let (brx, bry) = corner(2);
    draw_filled_circle_mut(img, ((tlx + brx) / 2, (tly + bry) / 2), CENTER_DOT_RADIUS, RED);

    draw_label(img, det.id, tlx, tly - LABEL_OFFSET_Y, GREEN);
}

// 3x5 digit stencil, one row per byte, low 3 bits used.
#[rustfmt::skip]
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111], // 0
    [0b010, 0b110, 0b010, 0b010, 0b111], // 1
    [0b111, 0b001, 0b111, 0b100, 0b111], // 2
    [0b111, 0b001, 0b111, 0b001, 0b111], // 3
    [0b101, 0b101, 0b111, 0b001, 0b001], // 4
    [0b111, 0b100, 0b111, 0b001, 0b111], // 5
    [0b111, 0b100, 0b111, 0b101, 0b111], // 6
    [0b111, 0b001, 0b001, 0b001, 0b001], // 7
    [0b111, 0b101, 0b111, 0b101, 0b111], // 8
    [0b111, 0b101, 0b111, 0b001, 0b111], // 9
];

const GLYPH_SCALE: i32 = 2;
const GLYPH_ADVANCE: i32 = 4 * GLYPH_SCALE;

/// Render a decimal number with the embedded stencil, clipped to the image.
fn draw_label(img: &mut RgbImage, value: u32, x: i32, y: i32, color: Rgb<u8>) {
    let digits: Vec<usize> = value
        .to_string()
        .bytes()
        .map(|b| (b - b'0') as usize)
        .collect();

    for (k, &d) in digits.iter().enumerate() {
        let gx = x + k as i32 * GLYPH_ADVANCE;
        for (row, bits) in DIGITS[d].iter().enumerate() {
            for col in 0..3 {
                if bits >> (2 - col) & 1 == 0 {
                    continue;
                }
                for sy in 0..GLYPH_SCALE {
                    for sx in 0..GLYPH_SCALE {
                        let px = gx + col * GLYPH_SCALE + sx;
                        let py = y + row as i32 * GLYPH_SCALE + sy;
                        if px >= 0 && py >= 0 && px < img.width() as i32 && py < img.height() as i32
                        {
                            img.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
    }
}
