//! Overlay render loop
//!
//! Paints the tracked code's outline onto a drawing surface at display
//! refresh, independent of decode pacing. The loop owns the silence sweep:
//! a code the decoder has gone quiet on is retired here, never from the
//! decode side, so a stopped camera can never strand a stale outline.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::capture::session::{lock, ScanEvent, SessionShared};
use crate::geometry::Point;
use crate::overlay::{OverlayColor, OverlayPolygon, OverlaySmoother};

/// Drawing surface for the scan overlay.
///
/// The render loop resizes the surface to match the camera frame, clears
/// it, and strokes at most one outline per tick. Implementations only need
/// to be cheap enough for display-refresh cadence.
pub trait RenderTarget: Send {
    /// Match the surface to the camera frame dimensions.
    fn resize(&mut self, width: u32, height: u32);
    /// Erase everything painted so far.
    fn clear(&mut self);
    /// Stroke a closed four-sided outline.
    fn stroke_polygon(&mut self, points: &[Point; 4], color: OverlayColor);
}

/// Refresh-paced half of the session: sweep, smooth, repaint.
pub(crate) struct RenderLoop {
    shared: Arc<Mutex<SessionShared>>,
    target: Arc<Mutex<Box<dyn RenderTarget>>>,
    events: broadcast::Sender<ScanEvent>,
    smoother: OverlaySmoother,
    surface_size: Option<(u32, u32)>,
}

impl RenderLoop {
    pub(crate) fn new(
        shared: Arc<Mutex<SessionShared>>,
        target: Arc<Mutex<Box<dyn RenderTarget>>>,
        events: broadcast::Sender<ScanEvent>,
    ) -> Self {
        Self {
            shared,
            target,
            events,
            smoother: OverlaySmoother::new(),
            surface_size: None,
        }
    }

    /// One render pass; `run` drives this on the refresh interval.
    fn tick(&mut self, now: Instant) {
        let (frame_size, lost, current) = {
            let mut shared = lock(&self.shared);
            let lost = shared.track.expire(now);
            (shared.frame_size, lost, shared.track.current().cloned())
        };

        if lost {
            self.smoother.reset();
            let _ = self.events.send(ScanEvent::Lost);
            debug!("Tracked code lost, decoder went quiet");
        }

        let mut target = lock(&self.target);
        if let Some((width, height)) = frame_size {
            if self.surface_size != Some((width, height)) {
                target.resize(width, height);
                self.surface_size = Some((width, height));
            }
        }
        target.clear();

        if let Some(code) = current {
            let painted = self.smoother.smooth(OverlayPolygon {
                points: code.quad.points(),
                color: OverlayColor::for_status(code.status),
            });
            target.stroke_polygon(&painted.points, painted.color);
        }
    }

    pub(crate) async fn run(mut self, refresh: Duration, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticks = tokio::time::interval(refresh);
        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    // Session stop may have landed between ticks; never
                    // paint over the blanked surface.
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    self.tick(Instant::now());
                }
                _ = shutdown_rx.changed() => break,
            }
        }
        lock(&self.target).clear();
        debug!("Render loop ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::test_source::{CanvasOp, RecordingCanvas};
    use crate::freshness::Freshness;
    use crate::geometry::Quad;
    use crate::track::TrackedCode;

    fn corners(x: f32, y: f32) -> [Point; 4] {
        [
            Point::new(x, y),
            Point::new(x + 40.0, y),
            Point::new(x + 40.0, y + 40.0),
            Point::new(x, y + 40.0),
        ]
    }

    fn tracked(x: f32, y: f32, status: Freshness, last_seen: Instant) -> TrackedCode {
        TrackedCode {
            text: "qr".to_string(),
            quad: Quad::new(corners(x, y)),
            status,
            last_seen,
        }
    }

    fn render_loop() -> (RenderLoop, crate::capture::test_source::CanvasHandle, broadcast::Receiver<ScanEvent>) {
        let shared = Arc::new(Mutex::new(SessionShared::new()));
        let (canvas, handle) = RecordingCanvas::new();
        let target: Arc<Mutex<Box<dyn RenderTarget>>> = Arc::new(Mutex::new(Box::new(canvas)));
        let (events_tx, events_rx) = broadcast::channel(8);
        (RenderLoop::new(shared, target, events_tx), handle, events_rx)
    }

    #[test]
    fn paints_resize_clear_stroke_in_order() {
        let (mut render, canvas, _rx) = render_loop();
        let now = Instant::now();
        {
            let mut shared = lock(&render.shared);
            shared.frame_size = Some((640, 480));
            shared.track.update(tracked(100.0, 50.0, Freshness::Good, now));
        }

        render.tick(now);

        assert_eq!(
            canvas.ops(),
            vec![
                CanvasOp::Resize(640, 480),
                CanvasOp::Clear,
                CanvasOp::Stroke(corners(100.0, 50.0), OverlayColor::GOOD),
            ]
        );
    }

    #[test]
    fn resizes_only_when_frame_dimensions_change() {
        let (mut render, canvas, _rx) = render_loop();
        let now = Instant::now();
        lock(&render.shared).frame_size = Some((640, 480));

        render.tick(now);
        render.tick(now);
        lock(&render.shared).frame_size = Some((1280, 720));
        render.tick(now);

        let resizes: Vec<_> = canvas
            .ops()
            .into_iter()
            .filter(|op| matches!(op, CanvasOp::Resize(..)))
            .collect();
        assert_eq!(
            resizes,
            vec![CanvasOp::Resize(640, 480), CanvasOp::Resize(1280, 720)]
        );
    }

    #[test]
    fn empty_track_still_clears_but_strokes_nothing() {
        let (mut render, canvas, _rx) = render_loop();
        render.tick(Instant::now());
        render.tick(Instant::now());
        assert_eq!(canvas.ops(), vec![CanvasOp::Clear, CanvasOp::Clear]);
    }

    #[test]
    fn quiet_track_is_retired_and_lost_is_emitted() {
        let (mut render, canvas, mut rx) = render_loop();
        let now = Instant::now();
        lock(&render.shared)
            .track
            .update(tracked(0.0, 0.0, Freshness::Good, now - Duration::from_millis(400)));

        render.tick(now);

        assert!(matches!(rx.try_recv(), Ok(ScanEvent::Lost)));
        assert!(lock(&render.shared).track.current().is_none());
        // Blank pass: cleared, nothing stroked.
        assert_eq!(canvas.ops(), vec![CanvasOp::Clear]);
    }

    #[test]
    fn outline_glides_toward_a_moved_code() {
        let (mut render, canvas, _rx) = render_loop();
        let now = Instant::now();
        lock(&render.shared).track.update(tracked(0.0, 0.0, Freshness::Good, now));
        render.tick(now);

        lock(&render.shared).track.update(tracked(10.0, 0.0, Freshness::Good, now));
        render.tick(now);

        let strokes: Vec<_> = canvas
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                CanvasOp::Stroke(points, _) => Some(points),
                _ => None,
            })
            .collect();
        assert_eq!(strokes.len(), 2);
        assert_eq!(strokes[0], corners(0.0, 0.0));
        // 30 percent of the way toward x=10.
        assert!((strokes[1][0].x - 3.0).abs() < 1e-5);
    }

    #[test]
    fn status_change_recolours_immediately() {
        let (mut render, canvas, _rx) = render_loop();
        let now = Instant::now();
        lock(&render.shared).track.update(tracked(0.0, 0.0, Freshness::Good, now));
        render.tick(now);

        lock(&render.shared).track.update(tracked(0.0, 0.0, Freshness::Expired, now));
        render.tick(now);

        let colors: Vec<_> = canvas
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                CanvasOp::Stroke(_, color) => Some(color),
                _ => None,
            })
            .collect();
        assert_eq!(colors, vec![OverlayColor::GOOD, OverlayColor::EXPIRED]);
    }
}
