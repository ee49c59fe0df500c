//! Integer pixel regions derived from drawn rectangles.

use super::ConvertError;
use crate::annotation::{AnnotationElement, ElementShape};
use serde::{Deserialize, Serialize};

/// An axis-aligned `[left, top, width, height]` box in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i64; 4]", into = "[i64; 4]")]
pub struct Region {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl Region {
    /// Rounds a rectangle element to whole pixels.
    ///
    /// `left` and `top` are rounded from the unrounded center and size, so the
    /// box does not drift by the rounding of both terms. Rotation is ignored:
    /// a rotated rectangle yields the box it would have if it were axis
    /// aligned.
    pub fn from_element(element: &AnnotationElement) -> Result<Self, ConvertError> {
        match &element.shape {
            ElementShape::Rectangle {
                center,
                width,
                height,
                ..
            } => Ok(Self {
                left: (center[0] - width / 2.0).round() as i64,
                top: (center[1] - height / 2.0).round() as i64,
                width: width.round() as i64,
                height: height.round() as i64,
            }),
            other => Err(ConvertError::NotARectangle(other.type_name())),
        }
    }

    pub fn to_array(self) -> [i64; 4] {
        [self.left, self.top, self.width, self.height]
    }
}

impl From<[i64; 4]> for Region {
    fn from([left, top, width, height]: [i64; 4]) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

impl From<Region> for [i64; 4] {
    fn from(region: Region) -> Self {
        region.to_array()
    }
}
