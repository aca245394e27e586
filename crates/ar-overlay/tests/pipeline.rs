//! End-to-end pipeline tests on synthetic frames: rendered markers in,
//! composited overlay out, including the cached-reference fallback.

use ar_overlay::aruco::builtins::DICT_4X4_100;
use ar_overlay::{OverlaySession, SessionConfig};
use image::{Rgb, RgbImage};

const IDS: [u32; 4] = [24, 42, 70, 66];
const CELL_PX: u32 = 10;

/// Paint one marker (1-cell black border, black = 1 bits) onto the frame.
fn render_marker(frame: &mut RgbImage, id: u32, x0: u32, y0: u32) {
    let dict = DICT_4X4_100;
    let bits = dict.marker_size;
    let cells = bits + 2;
    let code = dict.codes[id as usize];
    for cy in 0..cells {
        for cx in 0..cells {
            let is_border = cx == 0 || cy == 0 || cx + 1 == cells || cy + 1 == cells;
            let is_black = if is_border {
                true
            } else {
                (code >> ((cy - 1) * bits + (cx - 1))) & 1 == 1
            };
            let value = if is_black { 0u8 } else { 255u8 };
            for yy in 0..CELL_PX {
                for xx in 0..CELL_PX {
                    let x = x0 + cx as u32 * CELL_PX + xx;
                    let y = y0 + cy as u32 * CELL_PX + yy;
                    frame.put_pixel(x, y, Rgb([value, value, value]));
                }
            }
        }
    }
}

/// 400x300 white frame with the four expected markers in role positions.
/// The destination quad spans (40,40)..(360,260).
fn reference_frame() -> RgbImage {
    let mut frame = RgbImage::from_pixel(400, 300, Rgb([255, 255, 255]));
    render_marker(&mut frame, IDS[0], 40, 40);
    render_marker(&mut frame, IDS[1], 300, 40);
    render_marker(&mut frame, IDS[2], 300, 200);
    render_marker(&mut frame, IDS[3], 40, 200);
    frame
}

fn config() -> SessionConfig {
    let mut config = SessionConfig::default();
    config.expected_ids = IDS;
    config.detector.max_hamming = 0;
    config
}

fn session(overlay_rgb: [u8; 3]) -> OverlaySession {
    let overlay = RgbImage::from_pixel(100, 50, Rgb(overlay_rgb));
    OverlaySession::new(&config(), overlay).expect("built-in dictionary")
}

fn count_color(img: &RgbImage, rgb: [u8; 3]) -> usize {
    img.pixels().filter(|p| p.0 == rgb).count()
}

#[test]
fn full_frame_composites_the_overlay() {
    let mut session = session([255, 0, 0]);
    let frame = reference_frame();

    let out = session.process_frame(&frame);
    assert!(out.markers_resolved);

    // quad interior carries the overlay, far corners stay untouched
    assert_eq!(out.composite.get_pixel(200, 150), &Rgb([255, 0, 0]));
    assert_eq!(out.composite.get_pixel(150, 100), &Rgb([255, 0, 0]));
    assert_eq!(out.composite.get_pixel(5, 5), &Rgb([255, 255, 255]));
    assert_eq!(out.composite.get_pixel(395, 295), &Rgb([255, 255, 255]));

    // detection boxes drawn by default
    let annotated = out.annotated.expect("draw_detections defaults on");
    assert!(count_color(&annotated, [0, 255, 0]) > 0, "no green boxes");
    assert!(count_color(&annotated, [255, 0, 0]) > 0, "no center dots");
}

#[test]
fn cache_carries_the_overlay_through_dropouts() {
    let mut session = session([255, 0, 0]);
    session.process_frame(&reference_frame());

    // markers vanish entirely; the cached reference points keep compositing
    let blank = RgbImage::from_pixel(400, 300, Rgb([255, 255, 255]));
    let out = session.process_frame(&blank);
    assert!(out.markers_resolved);
    assert_eq!(out.composite.get_pixel(200, 150), &Rgb([255, 0, 0]));
    assert_eq!(out.composite.get_pixel(5, 5), &Rgb([255, 255, 255]));
}

#[test]
fn fresh_session_without_markers_passes_frames_through() {
    let mut session = session([255, 0, 0]);
    let blank = RgbImage::from_pixel(400, 300, Rgb([255, 255, 255]));

    let out = session.process_frame(&blank);
    assert!(!out.markers_resolved);
    assert_eq!(out.composite, blank);
}

#[test]
fn partial_detection_without_cache_is_a_miss() {
    let mut session = session([255, 0, 0]);
    let mut frame = RgbImage::from_pixel(400, 300, Rgb([255, 255, 255]));
    render_marker(&mut frame, IDS[0], 40, 40);
    render_marker(&mut frame, IDS[1], 300, 40);

    let out = session.process_frame(&frame);
    assert!(!out.markers_resolved);
    assert_eq!(out.composite, frame);
}

#[test]
fn stray_marker_defeats_the_strict_gate() {
    let mut session = session([255, 0, 0]);
    let mut frame = reference_frame();
    // a fifth, unexpected marker between the top reference markers
    render_marker(&mut frame, 7, 170, 40);

    let out = session.process_frame(&frame);
    assert!(!out.markers_resolved);
    assert_eq!(out.composite, frame);
}
