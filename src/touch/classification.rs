//! Contact classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The contact type assigned to a line and its points.
///
/// Only [`Classification::Unknown`] may change later. The extrapolated variants
/// mark synthetic tip points that bridge a missing sample; they carry no
/// evidence and are replaced by the next real point of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    #[default]
    Unknown,
    Pen,
    Finger,
    Palm,
    ExtrapolatedUnknown,
    ExtrapolatedPen,
    ExtrapolatedFinger,
}

impl Classification {
    /// Numeric code: 0 unknown, 1 pen, 2 finger, 3 palm, 4-6 extrapolated unknown/pen/finger.
    pub fn code(self) -> u8 {
        match self {
            Classification::Unknown => 0,
            Classification::Pen => 1,
            Classification::Finger => 2,
            Classification::Palm => 3,
            Classification::ExtrapolatedUnknown => 4,
            Classification::ExtrapolatedPen => 5,
            Classification::ExtrapolatedFinger => 6,
        }
    }

    /// True once the value can no longer change.
    pub fn is_definite(self) -> bool {
        matches!(
            self.observed(),
            Classification::Pen | Classification::Finger | Classification::Palm
        )
    }

    pub fn is_extrapolated(self) -> bool {
        matches!(
            self,
            Classification::ExtrapolatedUnknown
                | Classification::ExtrapolatedPen
                | Classification::ExtrapolatedFinger
        )
    }

    /// The extrapolated counterpart. Palm has none.
    pub fn extrapolated(self) -> Option<Self> {
        match self.observed() {
            Classification::Unknown => Some(Classification::ExtrapolatedUnknown),
            Classification::Pen => Some(Classification::ExtrapolatedPen),
            Classification::Finger => Some(Classification::ExtrapolatedFinger),
            _ => None,
        }
    }

    /// Strips the extrapolated marker.
    pub fn observed(self) -> Self {
        match self {
            Classification::ExtrapolatedUnknown => Classification::Unknown,
            Classification::ExtrapolatedPen => Classification::Pen,
            Classification::ExtrapolatedFinger => Classification::Finger,
            other => other,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Classification::Unknown => "unknown",
            Classification::Pen => "pen",
            Classification::Finger => "finger",
            Classification::Palm => "palm",
            Classification::ExtrapolatedUnknown => "extrapolated-unknown",
            Classification::ExtrapolatedPen => "extrapolated-pen",
            Classification::ExtrapolatedFinger => "extrapolated-finger",
        };
        f.write_str(name)
    }
}
