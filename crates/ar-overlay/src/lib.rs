//! Perspective-correct AR overlay of a raster image onto four ArUco
//! markers detected in a video frame.
//!
//! Per frame, the pipeline is:
//! 1. [`MarkerLocator`] detects markers and resolves the four expected
//!    identities into an ordered set of reference quadrilaterals, falling
//!    back to the last complete set when detection is partial.
//! 2. [`compositor::compose`] warps the overlay image onto the inner
//!    corners of those markers and blends it into the frame through a
//!    soft-edged mask.
//!
//! The surrounding frame loop (video decoding, display) is a thin caller;
//! see the `ar-overlay` binary for an image-sequence driver.
//!
//! ## Quickstart
//!
//! ```no_run
//! use ar_overlay::{OverlaySession, SessionConfig};
//! use image::ImageReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let overlay = ImageReader::open("overlay.png")?.decode()?.to_rgb8();
//! let frame = ImageReader::open("frame_0000.png")?.decode()?.to_rgb8();
//!
//! let mut session = OverlaySession::new(&SessionConfig::default(), overlay)?;
//! let out = session.process_frame(&frame);
//! println!("markers resolved: {}", out.markers_resolved);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `ar_overlay::core`: homographies, warping, raw RGB views.
//! - `ar_overlay::aruco`: dictionaries and frame-level marker detection.
//! - `ar_overlay::locator`: role matching and the cached reference points.
//! - `ar_overlay::compositor`: destination quad, warp, mask and blend.
//! - `ar_overlay::annotate`: detection overlays for debugging displays.

pub use ar_overlay_aruco as aruco;
pub use ar_overlay_core as core;

pub mod annotate;
pub mod compositor;
pub mod locator;
mod session;

pub use locator::{MarkerCorners, MarkerLocator, ReferencePoints};
pub use session::{FrameOutput, OverlayError, OverlaySession, SessionConfig};
