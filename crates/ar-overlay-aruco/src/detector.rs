//! Whole-frame marker detection.
//!
//! The pipeline follows the classic contour-based ArUco scheme: adaptive
//! threshold, trace contours, keep convex quadrilateral hole borders (a
//! dark marker sits as a hole in the light background), then read the bit
//! grid through a canonical-cell homography and match it against the
//! dictionary.

use std::collections::HashMap;

use crate::threshold::otsu_threshold_from_samples;
use crate::{Dictionary, Matcher};
use ar_overlay_core::{homography_from_4pt, Homography};
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::contrast::adaptive_threshold;
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Detector tunables, passed through from the session configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectorParams {
    /// Half-window of the adaptive threshold ((2r+1)^2 neighbourhood).
    ///
    /// Must exceed half the largest expected marker side, otherwise the
    /// interior of big markers binarizes unevenly.
    pub block_radius: u32,
    /// Douglas-Peucker tolerance as a fraction of the contour perimeter.
    pub poly_epsilon_rate: f64,
    /// Minimum marker perimeter as a fraction of `max(width, height)`.
    pub min_perimeter_rate: f32,
    /// Maximum Hamming distance accepted when matching codes.
    pub max_hamming: u8,
    /// Required fraction of black cells in the marker border.
    pub min_border_score: f32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            block_radius: 32,
            poly_epsilon_rate: 0.03,
            min_perimeter_rate: 0.03,
            max_hamming: 1,
            min_border_score: 0.85,
        }
    }
}

/// One detected marker.
#[derive(Clone, Debug)]
pub struct Detection {
    /// Marker id in the dictionary.
    pub id: u32,
    /// Corner positions in frame pixels, ordered top-left, top-right,
    /// bottom-right, bottom-left of the marker's *canonical* orientation.
    pub corners: [Point2<f32>; 4],
    /// Rotation `0..=3` the observed quad had relative to canonical.
    pub rotation: u8,
    /// Hamming distance of the dictionary match.
    pub hamming: u8,
    /// Fraction of border cells read as black.
    pub border_score: f32,
    /// Combined quality in `[0, 1]` used for per-id deduplication.
    pub score: f32,
}

/// Frame-level marker detector for a fixed dictionary.
pub struct Detector {
    matcher: Matcher,
    params: DetectorParams,
}

// Marker border width in cells; OpenCV-style dictionaries use 1.
const BORDER_BITS: usize = 1;
// Side of one cell in the canonical sampling plane, in pixels.
const CANON_CELL_PX: f32 = 12.0;
// Threshold sample subdivisions per cell.
const THRESH_SUBDIV: usize = 3;

impl Detector {
    pub fn new(dictionary: Dictionary, params: DetectorParams) -> Self {
        let matcher = Matcher::new(dictionary, params.max_hamming);
        Self { matcher, params }
    }

    #[inline]
    pub fn dictionary(&self) -> Dictionary {
        self.matcher.dictionary()
    }

    #[inline]
    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Detect all markers in a grayscale frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, gray), fields(width = gray.width(), height = gray.height()))
    )]
    pub fn detect(&self, gray: &GrayImage) -> Vec<Detection> {
        let bin = adaptive_threshold(gray, self.params.block_radius);
        let contours = find_contours::<i32>(&bin);

        let min_perimeter =
            self.params.min_perimeter_rate * gray.width().max(gray.height()) as f32;

        let mut out = Vec::new();
        for contour in &contours {
            if contour.border_type != BorderType::Hole {
                continue;
            }
            let Some(quad) = quad_candidate(
                &contour.points,
                self.params.poly_epsilon_rate,
                min_perimeter,
            ) else {
                continue;
            };
            if let Some(det) = self.decode_quad(gray, quad) {
                out.push(det);
            }
        }

        log::debug!(
            "{} contours, {} markers decoded",
            contours.len(),
            out.len()
        );
        dedup_by_id_keep_best(out)
    }

    /// Read the bit grid inside an observed quad and match it.
    fn decode_quad(&self, gray: &GrayImage, corners: [Point2<f32>; 4]) -> Option<Detection> {
        let dict = self.matcher.dictionary();
        let bits = dict.marker_size;
        let cells = bits + 2 * BORDER_BITS;
        let side = cells as f32 * CANON_CELL_PX;

        let canon = [
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ];
        let h = homography_from_4pt(&canon, &corners)?;

        // cell centers, 3x3 mean; any sample off-frame rejects the quad
        let mut samples = Vec::with_capacity(cells * cells);
        for cy in 0..cells {
            for cx in 0..cells {
                let p = Point2::new(
                    (cx as f32 + 0.5) * CANON_CELL_PX,
                    (cy as f32 + 0.5) * CANON_CELL_PX,
                );
                let q = h.apply(p);
                samples.push(sample_mean_3x3(gray, q.x, q.y)?);
            }
        }

        let thr = otsu_threshold_from_samples(&threshold_samples(gray, &h, cells));

        let mut border_ok = 0u32;
        let mut border_total = 0u32;
        let mut code = 0u64;
        for cy in 0..cells {
            for cx in 0..cells {
                // the Otsu threshold lands in the dark class, so ties read black
                let is_black = samples[cy * cells + cx] <= thr;
                let is_border = cx == 0 || cy == 0 || cx + 1 == cells || cy + 1 == cells;
                if is_border {
                    border_total += 1;
                    if is_black {
                        border_ok += 1;
                    }
                } else if is_black {
                    let bx = cx - BORDER_BITS;
                    let by = cy - BORDER_BITS;
                    code |= 1u64 << (by * bits + bx); // row-major, black = 1
                }
            }
        }

        let border_score = border_ok as f32 / border_total.max(1) as f32;
        if border_score < self.params.min_border_score {
            return None;
        }

        let m = self.matcher.match_code(code)?;

        // rotate so corner 0 is the marker's canonical top-left
        let mut ordered = corners;
        ordered.rotate_left(m.rotation as usize);

        let ham_pen = 1.0 - m.hamming as f32 / dict.bit_count().max(1) as f32;
        Some(Detection {
            id: m.id,
            corners: ordered,
            rotation: m.rotation,
            hamming: m.hamming,
            border_score,
            score: (border_score * ham_pen).clamp(0.0, 1.0),
        })
    }
}

/// Dense single-pixel reads across the marker for Otsu thresholding.
fn threshold_samples(gray: &GrayImage, h: &Homography, cells: usize) -> Vec<u8> {
    let grid = cells * THRESH_SUBDIV;
    let step = cells as f32 * CANON_CELL_PX / grid as f32;
    let mut out = Vec::with_capacity(grid * grid);
    for ty in 0..grid {
        for tx in 0..grid {
            let p = Point2::new((tx as f32 + 0.5) * step, (ty as f32 + 0.5) * step);
            let q = h.apply(p);
            let x = q.x.floor() as i32;
            let y = q.y.floor() as i32;
            if x < 0 || y < 0 || x >= gray.width() as i32 || y >= gray.height() as i32 {
                continue;
            }
            out.push(gray.get_pixel(x as u32, y as u32)[0]);
        }
    }
    out
}

/// Reduce a traced contour to an oriented quadrilateral candidate.
fn quad_candidate(
    points: &[Point<i32>],
    poly_epsilon_rate: f64,
    min_perimeter: f32,
) -> Option<[Point2<f32>; 4]> {
    if points.len() < 4 {
        return None;
    }

    let perimeter = closed_perimeter(points);
    if perimeter < min_perimeter {
        return None;
    }

    let poly = approximate_polygon_dp(points, poly_epsilon_rate * perimeter as f64, true);
    if poly.len() != 4 {
        return None;
    }

    let mut quad = [
        Point2::new(poly[0].x as f32, poly[0].y as f32),
        Point2::new(poly[1].x as f32, poly[1].y as f32),
        Point2::new(poly[2].x as f32, poly[2].y as f32),
        Point2::new(poly[3].x as f32, poly[3].y as f32),
    ];
    if !is_convex_quad(&quad) {
        return None;
    }

    // clockwise in image coordinates (y down), starting nearest the
    // image origin; the dictionary match fixes the true orientation later
    if shoelace(&quad) < 0.0 {
        quad.reverse();
    }
    let first = (0..4)
        .min_by(|&a, &b| {
            let sa = quad[a].x + quad[a].y;
            let sb = quad[b].x + quad[b].y;
            sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(0);
    quad.rotate_left(first);

    Some(quad)
}

fn closed_perimeter(points: &[Point<i32>]) -> f32 {
    let mut sum = 0.0f32;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let dx = (a.x - b.x) as f32;
        let dy = (a.y - b.y) as f32;
        sum += (dx * dx + dy * dy).sqrt();
    }
    sum
}

fn shoelace(quad: &[Point2<f32>; 4]) -> f32 {
    let mut sum = 0.0f32;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        sum += a.x * b.y - b.x * a.y;
    }
    sum
}

fn is_convex_quad(quad: &[Point2<f32>; 4]) -> bool {
    let mut sign = 0.0f32;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        let c = quad[(i + 2) % 4];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross == 0.0 {
            return false;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

fn sample_mean_3x3(gray: &GrayImage, x: f32, y: f32) -> Option<u8> {
    let ix = x.floor() as i32;
    let iy = y.floor() as i32;
    if ix - 1 < 0 || iy - 1 < 0 || ix + 1 >= gray.width() as i32 || iy + 1 >= gray.height() as i32 {
        return None;
    }

    let mut sum = 0u32;
    for dy in -1..=1i32 {
        for dx in -1..=1i32 {
            sum += gray.get_pixel((ix + dx) as u32, (iy + dy) as u32)[0] as u32;
        }
    }
    Some((sum / 9) as u8)
}

fn dedup_by_id_keep_best(mut dets: Vec<Detection>) -> Vec<Detection> {
    dets.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut seen: HashMap<u32, ()> = HashMap::new();
    let mut out = Vec::with_capacity(dets.len());
    for d in dets {
        if seen.contains_key(&d.id) {
            continue;
        }
        seen.insert(d.id, ());
        out.push(d);
    }
    out
}
