//! Optical code detection
//!
//! The decoder is a pure function of a single frame: it either finds a code
//! and reports its text plus locator corners, or it finds nothing. Tracking
//! across frames is the session's job, never the decoder's.

use crate::capture::camera::CameraFrame;
use crate::geometry::Point;

/// A code found in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Decoded payload text, not yet parsed.
    pub text: String,
    /// Locator corners in frame pixel coordinates, as reported by the
    /// detector. Usually four; see [`crate::geometry::Quad`] for how other
    /// counts are handled.
    pub locator_points: Vec<Point>,
}

/// Single-frame code detector.
///
/// Implementations must be cheap enough to run at frame rate and must not
/// block; a frame with no code returns `None`.
pub trait CodeDecoder: Send + Sync {
    fn decode(&self, frame: &CameraFrame) -> Option<Detection>;
}
