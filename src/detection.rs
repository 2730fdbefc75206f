use crate::{error::TrackError, rect::Rect};
use serde::{Deserialize, Serialize};

/*------------------------------------------------------------------------------
Detection struct
------------------------------------------------------------------------------*/

/// A single box reported by the detector for one frame.
///
/// Only well-formed boxes can be constructed, so the association step never
/// sees inverted or degenerate geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    rect: Rect<f32>,
}

impl Detection {
    pub fn new(rect: Rect<f32>) -> Result<Self, TrackError> {
        if !rect.is_well_formed() {
            return Err(TrackError::InvalidDetection(format!(
                "expected finite corners with bottom-right > top-left, \
                 got {:?}",
                rect.get_xyxy()
            )));
        }
        Ok(Self { rect })
    }

    pub fn from_corners(
        top_left: (f32, f32),
        bottom_right: (f32, f32),
    ) -> Result<Self, TrackError> {
        Self::new(Rect::from_corners(
            top_left.0,
            top_left.1,
            bottom_right.0,
            bottom_right.1,
        ))
    }

    pub fn rect(&self) -> &Rect<f32> {
        &self.rect
    }
}

/// Wire shape of a detection as delivered by the sensor source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBox {
    pub top_left: (f32, f32),
    pub bottom_right: (f32, f32),
}

impl From<&Detection> for RawBox {
    fn from(detection: &Detection) -> Self {
        RawBox {
            top_left: detection.rect.top_left(),
            bottom_right: detection.rect.bottom_right(),
        }
    }
}

impl TryFrom<RawBox> for Detection {
    type Error = TrackError;

    fn try_from(raw: RawBox) -> Result<Self, Self::Error> {
        Detection::from_corners(raw.top_left, raw.bottom_right)
    }
}

/// Convert a whole frame, skipping boxes that fail validation.
///
/// Rejected boxes are reported at `warn` level; the rest of the frame is kept.
pub fn ingest_frame(raw: &[RawBox]) -> Vec<Detection> {
    raw.iter()
        .filter_map(|b| match Detection::try_from(*b) {
            Ok(det) => Some(det),
            Err(err) => {
                tracing::warn!(%err, "dropping malformed detection");
                None
            }
        })
        .collect()
}
