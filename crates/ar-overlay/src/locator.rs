//! Marker location and the cached reference points.

use ar_overlay_aruco::{Detection, Detector};
use image::RgbImage;
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Corners of one marker in frame pixels (TL, TR, BR, BL).
pub type MarkerCorners = [Point2<f32>; 4];

/// Ordered reference quadrilaterals, one per expected marker identity,
/// indexed by role {top-left, top-right, bottom-right, bottom-left}.
///
/// Each entry is the *full* corner set of that marker, not a single point;
/// the compositor later picks one corner per role.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferencePoints {
    pub markers: [MarkerCorners; 4],
}

impl ReferencePoints {
    /// The quadrilateral the overlay corners are warped to: corner *i* of
    /// reference marker *i*, i.e. the innermost corner of each marker.
    pub fn destination_quad(&self) -> [Point2<f32>; 4] {
        [
            self.markers[0][0],
            self.markers[1][1],
            self.markers[2][2],
            self.markers[3][3],
        ]
    }
}

/// Resolves the four expected marker identities in a frame.
///
/// Owns the cached reference points: the most recent complete set, used
/// whenever a frame yields only a partial detection. The caller contract
/// is that `expected_ids` is ordered by geometric role (TL, TR, BR, BL);
/// roles are never inferred from geometry.
pub struct MarkerLocator {
    detector: Detector,
    expected_ids: [u32; 4],
    draw_detections: bool,
    cached: Option<ReferencePoints>,
}

impl MarkerLocator {
    pub fn new(detector: Detector, expected_ids: [u32; 4], draw_detections: bool) -> Self {
        Self {
            detector,
            expected_ids,
            draw_detections,
            cached: None,
        }
    }

    /// The most recent complete reference set, if any frame produced one.
    pub fn cached(&self) -> Option<&ReferencePoints> {
        self.cached.as_ref()
    }

    /// Detect markers in `frame` and resolve the expected identities.
    ///
    /// Returns the reference points (fresh or cached) or `None` when the
    /// frame is unusable and nothing is cached, plus the annotated frame
    /// when detection drawing is enabled.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame), fields(width = frame.width(), height = frame.height()))
    )]
    pub fn locate(&mut self, frame: &RgbImage) -> (Option<ReferencePoints>, Option<RgbImage>) {
        let gray = image::imageops::grayscale(frame);
        let detections = self.detector.detect(&gray);

        let annotated = self
            .draw_detections
            .then(|| crate::annotate::draw_detections(frame, &detections));

        (self.resolve(&detections), annotated)
    }

    /// Gate, role-match and apply the cache policy.
    ///
    /// Role matching only proceeds when *exactly* four markers were
    /// detected in total; any other count (even one that contains all four
    /// expected identities among strays) is treated as a miss for this
    /// frame. Whenever four reference points resolve, fresh or from cache,
    /// the cache is overwritten with exactly those four.
    pub fn resolve(&mut self, detections: &[Detection]) -> Option<ReferencePoints> {
        let candidates: &[Detection] = if detections.len() == 4 {
            detections
        } else {
            &[]
        };

        let mut roles: [Option<MarkerCorners>; 4] = [None; 4];
        for (role, id) in self.expected_ids.iter().enumerate() {
            if let Some(det) = candidates.iter().find(|d| d.id == *id) {
                roles[role] = Some(det.corners);
            }
        }

        let resolved = match roles {
            [Some(tl), Some(tr), Some(br), Some(bl)] => Some(ReferencePoints {
                markers: [tl, tr, br, bl],
            }),
            _ => {
                if self.cached.is_some() {
                    log::debug!(
                        "partial detection ({} of 4 markers), using cached reference points",
                        roles.iter().flatten().count()
                    );
                }
                self.cached.clone()
            }
        };

        if let Some(refs) = &resolved {
            self.cached = Some(refs.clone());
        }
        resolved
    }
}
