//! Locator geometry
//!
//! Decoders report the corner points of the symbol they found. The overlay
//! always strokes a closed four-sided outline, so detections with other
//! point counts are normalized here before they enter the track state.

use serde::{Deserialize, Serialize};

/// A point in frame pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Closed four-corner outline of a detected symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad([Point; 4]);

impl Quad {
    pub fn new(corners: [Point; 4]) -> Self {
        Self(corners)
    }

    /// Build a quad from raw locator points.
    ///
    /// Four or more points take the first four. Exactly three still outline
    /// the symbol by closing the ring through the first corner. Fewer than
    /// three cannot form an outline and are rejected.
    pub fn from_locator_points(points: &[Point]) -> Option<Self> {
        match *points {
            [a, b, c, d, ..] => Some(Self([a, b, c, d])),
            [a, b, c] => Some(Self([a, b, c, a])),
            _ => None,
        }
    }

    pub fn points(&self) -> [Point; 4] {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn four_points_pass_through() {
        let corners = [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)];
        let quad = Quad::from_locator_points(&corners).unwrap();
        assert_eq!(quad.points(), corners);
    }

    #[test]
    fn three_points_close_through_first_corner() {
        let quad = Quad::from_locator_points(&[p(0.0, 0.0), p(10.0, 0.0), p(5.0, 10.0)]).unwrap();
        assert_eq!(
            quad.points(),
            [p(0.0, 0.0), p(10.0, 0.0), p(5.0, 10.0), p(0.0, 0.0)]
        );
    }

    #[test]
    fn extra_points_are_truncated() {
        let quad = Quad::from_locator_points(&[
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(2.0, 0.0),
            p(3.0, 0.0),
            p(4.0, 0.0),
        ])
        .unwrap();
        assert_eq!(
            quad.points(),
            [p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(3.0, 0.0)]
        );
    }

    #[test]
    fn too_few_points_are_rejected() {
        assert!(Quad::from_locator_points(&[]).is_none());
        assert!(Quad::from_locator_points(&[p(1.0, 1.0)]).is_none());
        assert!(Quad::from_locator_points(&[p(1.0, 1.0), p(2.0, 2.0)]).is_none());
    }
}
