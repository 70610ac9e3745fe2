//! Scan session lifecycle
//!
//! A [`CaptureSession`] wires a camera, a code decoder, and a render target
//! together and runs them on two cadences: a decode task paced by camera
//! frames and a render loop paced by display refresh. The two sides meet in
//! a small shared cell guarded by a mutex.
//!
//! Sessions are restartable: `start` after `stop` begins from a clean
//! track, a fresh smoother, and a blank surface.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::capture::camera::{CameraConfig, CameraError, CameraSource, CameraStream};
use crate::capture::decoder::{CodeDecoder, Detection};
use crate::context::{FlightContext, FlightContextHandle};
use crate::freshness::{self, Freshness};
use crate::geometry::Quad;
use crate::payload;
use crate::render::{RenderLoop, RenderTarget};
use crate::track::{TrackState, TrackedCode};

/// Scan session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub camera: CameraConfig,
    /// Render loop cadence. 16 ms approximates display refresh.
    pub refresh_interval: Duration,
    /// Buffered events per subscriber before a slow one starts lagging.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            refresh_interval: Duration::from_millis(16),
            event_capacity: 32,
        }
    }
}

/// Product details recovered from a successfully classified label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductScan {
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub expiry_date: NaiveDate,
}

/// What the scanner found, published on the session's broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanEvent {
    /// A code with a usable expiry date is being tracked. Re-emitted only
    /// when the text or the status changes, not per frame.
    Tracked { scan: ProductScan, status: Freshness },
    /// A code was decoded but carried no usable expiry date. Deduplicated
    /// against immediate repeats of the same text.
    Invalid { text: String },
    /// The tracked code left the frame (silence window elapsed).
    Lost,
    /// The camera failed to open or its stream ended.
    Error { message: String },
}

/// State shared between the decode task and the render loop.
pub(crate) struct SessionShared {
    pub(crate) track: TrackState,
    /// Dimensions of the most recent camera frame.
    pub(crate) frame_size: Option<(u32, u32)>,
}

impl SessionShared {
    pub(crate) fn new() -> Self {
        Self {
            track: TrackState::new(),
            frame_size: None,
        }
    }
}

/// Lock a shared cell, taking the data even if a previous holder panicked.
pub(crate) fn lock<T>(cell: &Mutex<T>) -> MutexGuard<'_, T> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Live scan pipeline: camera in, overlay and events out.
pub struct CaptureSession {
    config: SessionConfig,
    camera: Arc<dyn CameraSource>,
    decoder: Arc<dyn CodeDecoder>,
    context: FlightContextHandle,
    target: Arc<Mutex<Box<dyn RenderTarget>>>,
    shared: Arc<Mutex<SessionShared>>,
    events_tx: broadcast::Sender<ScanEvent>,
    shutdown_tx: Option<watch::Sender<bool>>,
}

impl CaptureSession {
    pub fn new(
        config: SessionConfig,
        camera: Arc<dyn CameraSource>,
        decoder: Arc<dyn CodeDecoder>,
        target: Box<dyn RenderTarget>,
        context: FlightContextHandle,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(config.event_capacity);
        Self {
            config,
            camera,
            decoder,
            context,
            target: Arc::new(Mutex::new(target)),
            shared: Arc::new(Mutex::new(SessionShared::new())),
            events_tx,
            shutdown_tx: None,
        }
    }

    /// Subscribe to scan events. Each receiver sees events from its
    /// subscription onward.
    pub fn events(&self) -> broadcast::Receiver<ScanEvent> {
        self.events_tx.subscribe()
    }

    /// Whether the session is currently running.
    pub fn is_scanning(&self) -> bool {
        self.shutdown_tx.is_some()
    }

    /// The code currently being tracked, if any.
    ///
    /// A stopped session tracks nothing, even if a final decode raced the
    /// stop.
    pub fn current(&self) -> Option<TrackedCode> {
        if self.shutdown_tx.is_none() {
            return None;
        }
        lock(&self.shared).track.current().cloned()
    }

    /// Acquire the camera and start the decode and render tasks.
    ///
    /// Calling `start` on a running session is a no-op. On camera failure
    /// nothing is left running, the error is also published as
    /// [`ScanEvent::Error`], and the session can be started again.
    pub async fn start(&mut self) -> Result<(), CameraError> {
        if self.shutdown_tx.is_some() {
            debug!("Scan session already running");
            return Ok(());
        }

        let stream = match self.camera.open(&self.config.camera).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Camera acquisition failed: {}", e);
                let _ = self.events_tx.send(ScanEvent::Error {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        // A previous run may have left a stale track behind.
        {
            let mut shared = lock(&self.shared);
            shared.track.clear();
            shared.frame_size = None;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(decode_task(
            stream,
            Arc::clone(&self.decoder),
            Arc::clone(&self.shared),
            self.context.clone(),
            self.events_tx.clone(),
            shutdown_rx.clone(),
        ));

        let render = RenderLoop::new(
            Arc::clone(&self.shared),
            Arc::clone(&self.target),
            self.events_tx.clone(),
        );
        tokio::spawn(render.run(self.config.refresh_interval, shutdown_rx));

        self.shutdown_tx = Some(shutdown_tx);
        info!(
            "Scan session started: {}x{} @ {} fps, {:?} camera",
            self.config.camera.width, self.config.camera.height, self.config.camera.fps,
            self.config.camera.facing,
        );
        Ok(())
    }

    /// Stop scanning and blank the overlay.
    ///
    /// Safe to call when already stopped. The surface is cleared before
    /// this returns; the tasks wind down cooperatively right after.
    pub fn stop(&mut self) {
        let Some(shutdown_tx) = self.shutdown_tx.take() else {
            return;
        };
        let _ = shutdown_tx.send(true);

        lock(&self.shared).track.clear();
        lock(&self.target).clear();
        info!("Scan session stopped");
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// What a single detection amounts to once parsed and classified.
#[derive(Debug, PartialEq)]
enum Evaluation {
    /// Usable expiry date and geometry; worth tracking.
    Tracked {
        scan: ProductScan,
        status: Freshness,
        quad: Quad,
    },
    /// Decoded fine but no usable expiry date.
    Invalid,
    /// Locator geometry unusable; the detection contributes nothing.
    Discarded,
}

fn evaluate_detection(
    detection: &Detection,
    context: &FlightContext,
    today: NaiveDate,
) -> Evaluation {
    let quad = match Quad::from_locator_points(&detection.locator_points) {
        Some(quad) => quad,
        None => {
            debug!(
                "Detection dropped: {} locator points cannot outline a symbol",
                detection.locator_points.len()
            );
            return Evaluation::Discarded;
        }
    };

    let parsed = match payload::parse(&detection.text) {
        Some(parsed) => parsed,
        None => return Evaluation::Invalid,
    };
    let expiry = match parsed.expiry_date() {
        Some(expiry) => expiry,
        None => return Evaluation::Invalid,
    };

    let days = freshness::days_until(expiry, today);
    let status = freshness::classify(days, context);
    Evaluation::Tracked {
        scan: ProductScan {
            product_id: parsed.product_id,
            name: parsed.name,
            expiry_date: expiry,
        },
        status,
        quad,
    }
}

/// Frame-paced half of the session: pull, decode, classify, update track.
async fn decode_task(
    mut stream: Box<dyn CameraStream>,
    decoder: Arc<dyn CodeDecoder>,
    shared: Arc<Mutex<SessionShared>>,
    context: FlightContextHandle,
    events: broadcast::Sender<ScanEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut frames: u64 = 0;
    let mut detections: u64 = 0;
    let mut tracked: u64 = 0;
    // Last payload reported as Invalid, for dedup.
    let mut last_invalid: Option<String> = None;

    loop {
        let frame = tokio::select! {
            frame = stream.next_frame() => match frame {
                Some(frame) => frame,
                None => {
                    warn!("Camera stream ended");
                    let _ = events.send(ScanEvent::Error {
                        message: "camera stream ended".to_string(),
                    });
                    break;
                }
            },
            _ = shutdown_rx.changed() => break,
        };

        // Stop may have landed while this frame was in flight.
        if *shutdown_rx.borrow() {
            break;
        }

        frames += 1;
        lock(&shared).frame_size = Some((frame.width, frame.height));

        let detection = match decoder.decode(&frame) {
            Some(detection) => detection,
            None => continue,
        };
        detections += 1;

        let today = Local::now().date_naive();
        match evaluate_detection(&detection, &context.current(), today) {
            Evaluation::Tracked { scan, status, quad } => {
                tracked += 1;
                let changed = {
                    let mut shared = lock(&shared);
                    let changed = match shared.track.current() {
                        Some(previous) => {
                            previous.text != detection.text || previous.status != status
                        }
                        None => true,
                    };
                    shared.track.update(TrackedCode {
                        text: detection.text.clone(),
                        quad,
                        status,
                        last_seen: Instant::now(),
                    });
                    changed
                };
                if changed {
                    last_invalid = None;
                    let _ = events.send(ScanEvent::Tracked { scan, status });
                }
            }
            Evaluation::Invalid => {
                if last_invalid.as_deref() != Some(detection.text.as_str()) {
                    debug!("Decoded payload carries no usable expiry: {:?}", detection.text);
                    last_invalid = Some(detection.text.clone());
                    let _ = events.send(ScanEvent::Invalid {
                        text: detection.text,
                    });
                }
            }
            Evaluation::Discarded => {}
        }

        if frames % 300 == 0 {
            debug!(
                "Decode stats: {} frames, {} detections, {} tracked",
                frames, detections, tracked
            );
        }
    }

    stream.stop();
    debug!(
        "Decode task ended: {} frames, {} detections, {} tracked",
        frames, detections, tracked
    );
}
