//! Touch sample normalization.
//!
//! Converts a [`TouchBatch`] in window coordinates into per-touch samples in
//! the coordinate space of the reference view. Velocity is not computed here:
//! it depends on which line a sample is matched to, so the engine derives it
//! after matching.

use super::events::{TouchBatch, TouchId, TouchPhase};
use crate::util::Point;

/// Mapping from window coordinates into the reference view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// View origin in window coordinates.
    pub origin: Point,
    /// Window pixels per view pixel.
    pub scale: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        origin: Point::new(0.0, 0.0),
        scale: 1.0,
    };

    pub fn new(origin: Point, scale: f64) -> Self {
        Self { origin, scale }
    }

    /// Maps a window-space location into view space.
    pub fn to_view(&self, location: Point) -> Point {
        let scale = if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        };
        Point::new(
            (location.x - self.origin.x) / scale,
            (location.y - self.origin.y) / scale,
        )
    }
}

/// One touch of a batch in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedSample {
    pub id: TouchId,
    pub point: Point,
    pub timestamp: f64,
    pub phase: TouchPhase,
    pub major_radius: Option<f64>,
}

/// Stateless apart from the current view mapping.
#[derive(Debug, Clone, Default)]
pub struct TouchNormalizer {
    view: ViewTransform,
}

impl TouchNormalizer {
    pub fn new(view: ViewTransform) -> Self {
        Self { view }
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    /// Replaces the reference view mapping used for subsequent batches.
    pub fn change_view(&mut self, view: ViewTransform) {
        self.view = view;
    }

    /// Produces one sample per raw touch, preserving batch order.
    pub fn normalize(&self, batch: &TouchBatch) -> Vec<NormalizedSample> {
        batch
            .touches
            .iter()
            .map(|touch| NormalizedSample {
                id: touch.id,
                point: self.view.to_view(touch.location),
                timestamp: batch.timestamp,
                phase: batch.phase,
                major_radius: touch.major_radius.filter(|r| r.is_finite() && *r >= 0.0),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::touch::RawTouch;

    #[test]
    fn identity_view_keeps_coordinates_and_order() {
        let normalizer = TouchNormalizer::default();
        let batch = TouchBatch::new(
            TouchPhase::Began,
            1.5,
            vec![RawTouch::new(7, 10.0, 20.0), RawTouch::new(3, 30.0, 40.0)],
        );
        let samples = normalizer.normalize(&batch);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].id, TouchId(7));
        assert_eq!(samples[0].point, Point::new(10.0, 20.0));
        assert_eq!(samples[1].id, TouchId(3));
        assert_eq!(samples[1].timestamp, 1.5);
        assert_eq!(samples[1].phase, TouchPhase::Began);
    }

    #[test]
    fn change_view_maps_into_new_origin_and_scale() {
        let mut normalizer = TouchNormalizer::default();
        normalizer.change_view(ViewTransform::new(Point::new(100.0, 50.0), 2.0));
        let batch = TouchBatch::new(
            TouchPhase::Moved,
            0.0,
            vec![RawTouch::new(1, 120.0, 90.0).with_radius(f64::NAN)],
        );
        let samples = normalizer.normalize(&batch);
        assert_eq!(samples[0].point, Point::new(10.0, 20.0));
        assert_eq!(samples[0].major_radius, None);
    }

    #[test]
    fn degenerate_scale_falls_back_to_identity_scale() {
        let view = ViewTransform::new(Point::new(0.0, 0.0), 0.0);
        assert_eq!(view.to_view(Point::new(5.0, 6.0)), Point::new(5.0, 6.0));
    }
}
