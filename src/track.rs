//! Tracked-code state
//!
//! At most one code is tracked at a time. The decode task overwrites the
//! track on every successful detection; the render tick retires it once the
//! decoder has been silent for longer than the silence window. Brief
//! single-frame decode misses therefore never drop the overlay.

use std::time::{Duration, Instant};

use crate::freshness::Freshness;
use crate::geometry::Quad;

/// How long a track survives without a fresh detection.
///
/// Must comfortably exceed the decode frame interval, otherwise ordinary
/// frame pacing would read as the code leaving the frame.
pub const SILENCE_WINDOW: Duration = Duration::from_millis(300);

/// A code currently visible in the camera frame.
#[derive(Debug, Clone)]
pub struct TrackedCode {
    /// Raw decoded payload text.
    pub text: String,
    /// Corner outline in frame pixel coordinates.
    pub quad: Quad,
    pub status: Freshness,
    /// When the decoder last reported this code.
    pub last_seen: Instant,
}

/// Single-slot track shared between the decode task and the render tick.
#[derive(Debug, Default)]
pub struct TrackState {
    current: Option<TrackedCode>,
}

impl TrackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the track with a fresh detection.
    ///
    /// Unconditional: a different code simply takes the slot over.
    pub fn update(&mut self, code: TrackedCode) {
        self.current = Some(code);
    }

    /// Retire the track if the decoder has been silent for longer than
    /// [`SILENCE_WINDOW`]. Returns true when a track was retired.
    pub fn expire(&mut self, now: Instant) -> bool {
        let silent = match &self.current {
            Some(code) => now.duration_since(code.last_seen) > SILENCE_WINDOW,
            None => false,
        };
        if silent {
            self.current = None;
        }
        silent
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&TrackedCode> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn code(text: &str, last_seen: Instant) -> TrackedCode {
        TrackedCode {
            text: text.to_string(),
            quad: Quad::new([
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ]),
            status: Freshness::Good,
            last_seen,
        }
    }

    #[test]
    fn update_overwrites_existing_track() {
        let mut state = TrackState::new();
        let now = Instant::now();
        state.update(code("first", now));
        state.update(code("second", now));
        assert_eq!(state.current().unwrap().text, "second");
    }

    #[test]
    fn expire_is_strictly_after_the_window() {
        let now = Instant::now();

        let mut state = TrackState::new();
        state.update(code("qr", now - SILENCE_WINDOW));
        // Exactly at the window boundary the track survives.
        assert!(!state.expire(now));
        assert!(state.current().is_some());

        state.update(code("qr", now - SILENCE_WINDOW - Duration::from_millis(1)));
        assert!(state.expire(now));
        assert!(state.current().is_none());
    }

    #[test]
    fn fresh_track_survives_expiry_sweep() {
        let now = Instant::now();
        let mut state = TrackState::new();
        state.update(code("qr", now));
        assert!(!state.expire(now + Duration::from_millis(100)));
        assert!(state.current().is_some());
    }

    #[test]
    fn expire_on_empty_state_is_a_no_op() {
        let mut state = TrackState::new();
        assert!(!state.expire(Instant::now()));
    }

    #[test]
    fn expired_state_reports_only_once() {
        let now = Instant::now();
        let mut state = TrackState::new();
        state.update(code("qr", now - Duration::from_secs(1)));
        assert!(state.expire(now));
        // Already empty; a second sweep finds nothing to retire.
        assert!(!state.expire(now));
    }

    #[test]
    fn clear_drops_the_track() {
        let mut state = TrackState::new();
        state.update(code("qr", Instant::now()));
        state.clear();
        assert!(state.current().is_none());
    }
}
