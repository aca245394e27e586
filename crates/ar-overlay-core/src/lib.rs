//! Core types and utilities for marker-based AR overlay.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete marker detector or image-crate type: frames are
//! borrowed raw RGB buffers, converted at the caller's boundary.

mod homography;
mod image;
mod logger;

pub use homography::{homography_from_4pt, warp_perspective_rgb, Homography};
pub use image::{sample_bilinear_rgb, sample_bilinear_rgb_u8, RgbFrame, RgbFrameView};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
