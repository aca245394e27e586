//! Session wiring: configuration, error type and the per-frame driver.

use crate::compositor;
use crate::locator::MarkerLocator;
use ar_overlay_aruco::builtins::builtin_dictionary;
use ar_overlay_aruco::{Detector, DetectorParams};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by session construction and the CLI driver.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("unknown dictionary '{0}'")]
    UnknownDictionary(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Configuration for an overlay session.
///
/// `expected_ids` is ordered by geometric role: top-left, top-right,
/// bottom-right, bottom-left.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub dictionary: String,
    pub expected_ids: [u32; 4],
    pub draw_detections: bool,
    pub detector: DetectorParams,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dictionary: "DICT_4X4_100".into(),
            expected_ids: [24, 42, 70, 66],
            draw_detections: true,
            detector: DetectorParams::default(),
        }
    }
}

/// Per-frame output of [`OverlaySession::process_frame`].
pub struct FrameOutput {
    /// The frame with the overlay composited in, or an unmodified copy of
    /// the input when no reference points could be resolved.
    pub composite: RgbImage,
    /// The frame with detection boxes drawn, when enabled in the config.
    pub annotated: Option<RgbImage>,
    /// Whether reference points resolved this frame (fresh or cached).
    pub markers_resolved: bool,
}

/// Owns the locator state and the overlay image across a frame sequence.
pub struct OverlaySession {
    locator: MarkerLocator,
    overlay: RgbImage,
}

impl OverlaySession {
    pub fn new(config: &SessionConfig, overlay: RgbImage) -> Result<Self, OverlayError> {
        let dict = builtin_dictionary(&config.dictionary)
            .ok_or_else(|| OverlayError::UnknownDictionary(config.dictionary.clone()))?;
        let detector = Detector::new(dict, config.detector.clone());
        let locator = MarkerLocator::new(detector, config.expected_ids, config.draw_detections);
        Ok(Self { locator, overlay })
    }

    /// Locate the reference markers and composite the overlay.
    pub fn process_frame(&mut self, frame: &RgbImage) -> FrameOutput {
        let (refs, annotated) = self.locator.locate(frame);
        let (composite, markers_resolved) = match refs {
            Some(refs) => (compositor::compose(frame, &self.overlay, &refs), true),
            None => (frame.clone(), false),
        };
        FrameOutput {
            composite,
            annotated,
            markers_resolved,
        }
    }
}
