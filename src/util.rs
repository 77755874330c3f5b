//! Geometry helpers shared by the normalizer, the matcher and the assembler.
//!
//! This module provides:
//! - [`Point`] and [`Vector`] in view coordinates (pixels)
//! - [`Rect`] with margin expansion and hit testing
//! - Finite-difference velocity between two timed points

use serde::{Deserialize, Serialize};

// ============================================================================
// Points and vectors
// ============================================================================

/// A position in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Displacement from `other` to `self`.
    pub fn delta_from(self, other: Point) -> Vector {
        Vector {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        self.delta_from(other).length()
    }

    /// Moves the point along `v` scaled by `factor`.
    pub fn offset(self, v: Vector, factor: f64) -> Point {
        Point {
            x: self.x + v.x * factor,
            y: self.y + v.y * factor,
        }
    }
}

/// A 2D vector, used for displacements and velocities (px/s).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn scale(self, factor: f64) -> Vector {
        Vector {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

// ============================================================================
// Rectangles
// ============================================================================

/// Axis-aligned rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Builds the enclosing rectangle of `center` grown by the given margins on every side.
    pub fn around(center: Point, x_margin: f64, y_margin: f64) -> Self {
        let x_margin = x_margin.max(0.0);
        let y_margin = y_margin.max(0.0);
        Self {
            x: center.x - x_margin,
            y: center.y - y_margin,
            width: x_margin * 2.0,
            height: y_margin * 2.0,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

// ============================================================================
// Velocity
// ============================================================================

/// Finite-difference velocity between two timed points in px/s.
///
/// Returns [`Vector::ZERO`] when no time has elapsed, regardless of displacement.
/// Callers gating on speed should use [`speed_between`] instead, which reports
/// an instantaneous jump as infinitely fast.
pub fn velocity_between(from: Point, from_t: f64, to: Point, to_t: f64) -> Vector {
    let dt = to_t - from_t;
    if dt <= 0.0 {
        return Vector::ZERO;
    }
    to.delta_from(from).scale(1.0 / dt)
}

/// Speed magnitude between two timed points in px/s.
pub fn speed_between(from: Point, from_t: f64, to: Point, to_t: f64) -> f64 {
    let distance = to.distance_to(from);
    let dt = to_t - from_t;
    if dt <= 0.0 {
        if distance == 0.0 { 0.0 } else { f64::INFINITY }
    } else {
        distance / dt
    }
}
