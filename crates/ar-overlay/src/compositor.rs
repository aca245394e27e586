//! Warp the overlay onto the reference markers and blend it into the frame.

use crate::locator::ReferencePoints;
use ar_overlay_core::{homography_from_4pt, warp_perspective_rgb, RgbFrameView};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::drawing::{draw_antialiased_line_segment_mut, draw_polygon_mut};
use imageproc::morphology::dilate;
use imageproc::pixelops::interpolate;
use imageproc::point::Point;
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

// L-inf radius of the mask dilation; equivalent to two passes of a 3x3
// structuring element. Softens the seam and covers rounding slivers at
// the quad boundary.
const MASK_DILATE_RADIUS: u8 = 2;

/// Composite `overlay` onto `frame` at the reference markers.
///
/// The overlay's corners, in natural order (0,0), (w,0), (w,h), (0,h), are
/// mapped onto the destination quadrilateral selected from the reference
/// points. The blend runs in floating point and quantizes back to 8-bit on
/// the way out.
///
/// Degenerate reference geometry (markers collapsing the destination quad)
/// makes the homography unsolvable; the frame is then returned unchanged.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(frame, overlay, refs), fields(width = frame.width(), height = frame.height()))
)]
pub fn compose(frame: &RgbImage, overlay: &RgbImage, refs: &ReferencePoints) -> RgbImage {
    let (fw, fh) = frame.dimensions();
    let (ow, oh) = overlay.dimensions();

    let dst = refs.destination_quad();
    let src = [
        Point2::new(0.0, 0.0),
        Point2::new(ow as f32, 0.0),
        Point2::new(ow as f32, oh as f32),
        Point2::new(0.0, oh as f32),
    ];

    let h_inv = homography_from_4pt(&src, &dst).and_then(|h| h.inverse());
    let Some(h_inv) = h_inv else {
        log::warn!("degenerate destination quadrilateral, skipping composite");
        return frame.clone();
    };

    let overlay_view = RgbFrameView {
        width: ow as usize,
        height: oh as usize,
        data: overlay.as_raw(),
    };
    let warped = warp_perspective_rgb(&overlay_view, h_inv, fw as usize, fh as usize);

    let mask = blend_mask(fw, fh, &dst);

    let mut out = RgbImage::new(fw, fh);
    for y in 0..fh {
        for x in 0..fw {
            let m = mask.get_pixel(x, y)[0] as f32 / 255.0;
            let f = frame.get_pixel(x, y);
            let i = 3 * (y as usize * fw as usize + x as usize);

            let mut px = [0u8; 3];
            for c in 0..3 {
                let v = warped.data[i + c] as f32 * m + f[c] as f32 * (1.0 - m);
                px[c] = v.round().clamp(0.0, 255.0) as u8;
            }
            out.put_pixel(x, y, Rgb(px));
        }
    }
    out
}

/// Filled destination polygon with anti-aliased edges, dilated outward by
/// a small fixed margin.
fn blend_mask(width: u32, height: u32, dst: &[Point2<f32>; 4]) -> GrayImage {
    let mut mask = GrayImage::new(width, height);

    let mut poly: Vec<Point<i32>> = dst
        .iter()
        .map(|p| Point::new(p.x.round() as i32, p.y.round() as i32))
        .collect();
    // draw_polygon_mut requires an open polygon
    if poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    draw_polygon_mut(&mut mask, &poly, Luma([255u8]));

    let in_bounds = |p: &Point<i32>| {
        p.x >= 0 && p.y >= 0 && p.x < width as i32 && p.y < height as i32
    };
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[(i + 1) % poly.len()];
        // the anti-aliased rim is cosmetic; skip edges leaving the canvas
        if !in_bounds(&a) || !in_bounds(&b) {
            continue;
        }
        draw_antialiased_line_segment_mut(
            &mut mask,
            (a.x, a.y),
            (b.x, b.y),
            Luma([255u8]),
            interpolate,
        );
    }

    dilate(&mask, Norm::LInf, MASK_DILATE_RADIUS)
}
