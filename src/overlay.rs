//! Overlay colours and corner smoothing
//!
//! The overlay restates the freshness verdict as colour and keeps the
//! outline from jittering between frames. Corner positions blend toward
//! each new detection; colour switches immediately so a status change is
//! never shown stale.

use serde::{Deserialize, Serialize};

use crate::freshness::Freshness;
use crate::geometry::Point;

/// Blend factor per frame toward the newest detection. Higher values stick
/// tighter to the raw corners, lower values glide more.
pub const SMOOTHING_ALPHA: f32 = 0.3;

/// RGBA stroke colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl OverlayColor {
    /// Green, product is comfortably fresh.
    pub const GOOD: OverlayColor = OverlayColor {
        r: 76,
        g: 175,
        b: 80,
        a: 200,
    };
    /// Amber, inside the warning threshold.
    pub const WARNING: OverlayColor = OverlayColor {
        r: 255,
        g: 193,
        b: 7,
        a: 200,
    };
    /// Red, past expiry.
    pub const EXPIRED: OverlayColor = OverlayColor {
        r: 244,
        g: 67,
        b: 54,
        a: 200,
    };

    pub fn for_status(status: Freshness) -> Self {
        match status {
            Freshness::Good => Self::GOOD,
            Freshness::Warning => Self::WARNING,
            Freshness::Expired => Self::EXPIRED,
        }
    }
}

/// One frame of overlay output: a closed outline plus its stroke colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPolygon {
    pub points: [Point; 4],
    pub color: OverlayColor,
}

/// Exponential smoother for the overlay outline.
///
/// Holds the previously painted polygon and blends each new target toward
/// it corner by corner. The first target after a reset passes through
/// unchanged, so a newly acquired code snaps into place instead of flying
/// in from a stale position.
#[derive(Debug, Default)]
pub struct OverlaySmoother {
    previous: Option<OverlayPolygon>,
}

impl OverlaySmoother {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blend toward `target` and return what should be painted this frame.
    pub fn smooth(&mut self, target: OverlayPolygon) -> OverlayPolygon {
        let output = match &self.previous {
            Some(previous) => {
                let mut points = [Point::default(); 4];
                for (i, point) in points.iter_mut().enumerate() {
                    point.x = lerp(previous.points[i].x, target.points[i].x);
                    point.y = lerp(previous.points[i].y, target.points[i].y);
                }
                // Colour never lags; only geometry is smoothed.
                OverlayPolygon {
                    points,
                    color: target.color,
                }
            }
            None => target,
        };
        self.previous = Some(output);
        output
    }

    /// Forget the previous polygon. The next target passes through raw.
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

fn lerp(previous: f32, target: f32) -> f32 {
    previous * (1.0 - SMOOTHING_ALPHA) + target * SMOOTHING_ALPHA
}
