//! Synthetic sources for tests and demos
//!
//! Everything here runs without hardware: a camera that emits numbered
//! frames on a timer, a decoder scripted per frame number, a canvas that
//! records draw calls, and a camera that fails to open. Frames carry their
//! own sequence number in the first eight payload bytes, which is the only
//! contract between the synthetic camera and the scripted decoder.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use crate::capture::camera::{CameraConfig, CameraError, CameraFrame, CameraSource, CameraStream};
use crate::capture::decoder::{CodeDecoder, Detection};
use crate::capture::session::lock;
use crate::geometry::Point;
use crate::overlay::OverlayColor;
use crate::render::RenderTarget;

/// Synthetic camera settings.
#[derive(Debug, Clone)]
pub struct SyntheticCameraConfig {
    pub width: u32,
    pub height: u32,
    /// Pacing between frames. 33 ms approximates 30 fps.
    pub frame_interval: Duration,
    /// Stop after this many frames; `None` streams until stopped.
    pub frame_limit: Option<u64>,
}

impl Default for SyntheticCameraConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            frame_interval: Duration::from_millis(33),
            frame_limit: None,
        }
    }
}

/// Camera that synthesizes numbered frames on a timer.
///
/// The requested [`CameraConfig`] is ignored; like a fixed-mode device this
/// camera has exactly one mode, the one it was built with.
pub struct SyntheticCamera {
    config: SyntheticCameraConfig,
}

impl SyntheticCamera {
    pub fn new(config: SyntheticCameraConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CameraSource for SyntheticCamera {
    async fn open(&self, _config: &CameraConfig) -> Result<Box<dyn CameraStream>, CameraError> {
        info!(
            "Synthetic camera opened: {}x{} every {:?}",
            self.config.width, self.config.height, self.config.frame_interval
        );
        Ok(Box::new(SyntheticStream {
            config: self.config.clone(),
            frame_num: 0,
            stopped: false,
        }))
    }
}

struct SyntheticStream {
    config: SyntheticCameraConfig,
    frame_num: u64,
    stopped: bool,
}

#[async_trait]
impl CameraStream for SyntheticStream {
    async fn next_frame(&mut self) -> Option<CameraFrame> {
        if self.stopped {
            return None;
        }
        if let Some(limit) = self.config.frame_limit {
            if self.frame_num >= limit {
                return None;
            }
        }
        tokio::time::sleep(self.config.frame_interval).await;

        // Sequence number in the first eight bytes, for the scripted decoder.
        let data = Bytes::copy_from_slice(&self.frame_num.to_be_bytes());
        let frame = CameraFrame {
            width: self.config.width,
            height: self.config.height,
            data,
        };
        self.frame_num += 1;
        Some(frame)
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

/// Sequence number a synthetic frame carries in its payload.
pub fn frame_number(frame: &CameraFrame) -> Option<u64> {
    let bytes: [u8; 8] = frame.data.get(..8)?.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Decoder scripted by frame number.
///
/// Build with [`detect_at`](Self::detect_at) and
/// [`detect_range`](Self::detect_range); unscripted frames decode to
/// nothing, like camera frames with no code in view.
#[derive(Default)]
pub struct ScriptedDecoder {
    script: HashMap<u64, Detection>,
}

impl ScriptedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detect_at(mut self, frame: u64, detection: Detection) -> Self {
        self.script.insert(frame, detection);
        self
    }

    pub fn detect_range(mut self, frames: Range<u64>, detection: Detection) -> Self {
        for frame in frames {
            self.script.insert(frame, detection.clone());
        }
        self
    }
}

impl CodeDecoder for ScriptedDecoder {
    fn decode(&self, frame: &CameraFrame) -> Option<Detection> {
        self.script.get(&frame_number(frame)?).cloned()
    }
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOp {
    Resize(u32, u32),
    Clear,
    Stroke([Point; 4], OverlayColor),
}

/// Render target that records every draw call in order.
pub struct RecordingCanvas {
    ops: Arc<Mutex<Vec<CanvasOp>>>,
}

impl RecordingCanvas {
    /// The canvas goes into the session; the handle stays with the test.
    pub fn new() -> (Self, CanvasHandle) {
        let ops = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                ops: Arc::clone(&ops),
            },
            CanvasHandle { ops },
        )
    }
}

impl RenderTarget for RecordingCanvas {
    fn resize(&mut self, width: u32, height: u32) {
        lock(&self.ops).push(CanvasOp::Resize(width, height));
    }

    fn clear(&mut self) {
        lock(&self.ops).push(CanvasOp::Clear);
    }

    fn stroke_polygon(&mut self, points: &[Point; 4], color: OverlayColor) {
        lock(&self.ops).push(CanvasOp::Stroke(*points, color));
    }
}

/// Read side of a [`RecordingCanvas`].
#[derive(Clone)]
pub struct CanvasHandle {
    ops: Arc<Mutex<Vec<CanvasOp>>>,
}

impl CanvasHandle {
    /// Snapshot of all draw calls so far, in order.
    pub fn ops(&self) -> Vec<CanvasOp> {
        lock(&self.ops).clone()
    }

    /// Just the strokes, in order.
    pub fn strokes(&self) -> Vec<([Point; 4], OverlayColor)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                CanvasOp::Stroke(points, color) => Some((points, color)),
                _ => None,
            })
            .collect()
    }

    /// Number of clear passes so far.
    pub fn clears(&self) -> usize {
        self.ops()
            .into_iter()
            .filter(|op| matches!(op, CanvasOp::Clear))
            .count()
    }
}

/// Camera whose `open` always fails with a fixed error.
pub struct FailingCamera {
    error: CameraError,
}

impl FailingCamera {
    pub fn new(error: CameraError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl CameraSource for FailingCamera {
    async fn open(&self, _config: &CameraConfig) -> Result<Box<dyn CameraStream>, CameraError> {
        Err(self.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(frame_num: u64) -> CameraFrame {
        CameraFrame {
            width: 640,
            height: 480,
            data: Bytes::copy_from_slice(&frame_num.to_be_bytes()),
        }
    }

    fn detection(text: &str) -> Detection {
        Detection {
            text: text.to_string(),
            locator_points: vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ],
        }
    }

    #[tokio::test]
    async fn synthetic_camera_numbers_frames_and_honors_the_limit() {
        let camera = SyntheticCamera::new(SyntheticCameraConfig {
            frame_interval: Duration::from_millis(1),
            frame_limit: Some(3),
            ..SyntheticCameraConfig::default()
        });
        let mut stream = camera.open(&CameraConfig::default()).await.unwrap();

        for expected in 0..3 {
            let frame = stream.next_frame().await.unwrap();
            assert_eq!(frame_number(&frame), Some(expected));
            assert_eq!(frame.width, 640);
            assert_eq!(frame.height, 480);
        }
        assert!(stream.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn stopped_stream_yields_no_more_frames() {
        let camera = SyntheticCamera::new(SyntheticCameraConfig {
            frame_interval: Duration::from_millis(1),
            ..SyntheticCameraConfig::default()
        });
        let mut stream = camera.open(&CameraConfig::default()).await.unwrap();
        assert!(stream.next_frame().await.is_some());

        stream.stop();
        assert!(stream.next_frame().await.is_none());
        assert!(stream.next_frame().await.is_none());
    }

    #[test]
    fn scripted_decoder_fires_only_on_scripted_frames() {
        let decoder = ScriptedDecoder::new()
            .detect_at(1, detection("one"))
            .detect_range(5..7, detection("window"));

        assert!(decoder.decode(&frame(0)).is_none());
        assert_eq!(decoder.decode(&frame(1)).unwrap().text, "one");
        assert!(decoder.decode(&frame(4)).is_none());
        assert_eq!(decoder.decode(&frame(5)).unwrap().text, "window");
        assert_eq!(decoder.decode(&frame(6)).unwrap().text, "window");
        assert!(decoder.decode(&frame(7)).is_none());
    }

    #[test]
    fn decoder_ignores_frames_without_a_sequence_number() {
        let decoder = ScriptedDecoder::new().detect_at(0, detection("zero"));
        let short = CameraFrame {
            width: 640,
            height: 480,
            data: Bytes::from_static(&[1, 2, 3]),
        };
        assert!(decoder.decode(&short).is_none());
    }

    #[test]
    fn recording_canvas_keeps_draw_call_order() {
        let (mut canvas, handle) = RecordingCanvas::new();
        canvas.resize(640, 480);
        canvas.clear();
        canvas.stroke_polygon(
            &[
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(1.0, 1.0),
                Point::new(0.0, 1.0),
            ],
            OverlayColor::GOOD,
        );

        assert_eq!(handle.ops().len(), 3);
        assert_eq!(handle.strokes().len(), 1);
        assert_eq!(handle.clears(), 1);
        assert!(matches!(handle.ops()[0], CanvasOp::Resize(640, 480)));
    }

    #[tokio::test]
    async fn failing_camera_returns_its_error() {
        let camera = FailingCamera::new(CameraError::PermissionDenied);
        let result = camera.open(&CameraConfig::default()).await;
        assert!(matches!(result, Err(CameraError::PermissionDenied)));
    }
}
