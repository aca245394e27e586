//! ArUco marker dictionaries and frame-level detection.
//!
//! This crate provides:
//! - embedded built-in dictionaries (compiled into the binary),
//! - matching observed marker codes against those dictionaries under all
//!   four rotations,
//! - a whole-frame detector: adaptive threshold, contour tracing, quad
//!   candidate filtering and homography-based bit sampling.
//!
//! Detections carry the full 4-corner quadrilateral of each marker in the
//! marker's canonical orientation (top-left first), which is what the
//! overlay registration downstream keys on.

pub mod builtins;
mod detector;
mod dictionary;
mod matcher;
mod threshold;

pub use detector::{Detection, Detector, DetectorParams};
pub use dictionary::Dictionary;
pub use matcher::{rotate_code_u64, Match, Matcher};
