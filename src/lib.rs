//! Galleyscan - Real-time expiry scanning for inflight catering
//!
//! This crate provides everything needed to run a live expiry scanner:
//! - Payload parsing: structured and bare-date label payloads
//! - Freshness: expiry classification against the active flight context
//! - Capture: camera acquisition, decode loop, session lifecycle
//! - Overlay: tracked-code state, corner smoothing, render loop
//!
//! # Architecture
//!
//! The pipeline runs on two cadences:
//!
//! 1. **Decode task** - Pulls camera frames, decodes optical codes, parses
//!    payloads, and updates the shared track state
//! 2. **Render loop** - Repaints the overlay at display refresh, smooths
//!    corner motion, and retires tracks the decoder has gone quiet on
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use galleyscan::{CaptureSession, FlightContextStore, ScanEvent, SessionConfig};
//!
//! let context = FlightContextStore::default();
//! let mut session = CaptureSession::new(
//!     SessionConfig::default(),
//!     Arc::new(camera),
//!     Arc::new(decoder),
//!     Box::new(canvas),
//!     context.handle(),
//! );
//!
//! session.start().await?;
//! let mut events = session.events();
//! while let Ok(event) = events.recv().await {
//!     match event {
//!         ScanEvent::Tracked { scan, status } => println!("{:?}: {}", scan, status),
//!         other => println!("{:?}", other),
//!     }
//! }
//! ```

// Sensor capture and session lifecycle
pub mod capture;

// Flight context shared across the pipeline
pub mod context;

// Expiry classification
pub mod freshness;

// Locator geometry
pub mod geometry;

// Overlay colours and corner smoothing
pub mod overlay;

// Label payload parsing
pub mod payload;

// Render loop and drawing surface
pub mod render;

// Tracked-code state
pub mod track;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// Capture
pub use capture::camera::{
    CameraConfig, CameraError, CameraFacing, CameraFrame, CameraSource, CameraStream,
};
pub use capture::decoder::{CodeDecoder, Detection};
pub use capture::session::{CaptureSession, ProductScan, ScanEvent, SessionConfig};
#[cfg(any(test, feature = "test-source"))]
pub use capture::test_source::{
    CanvasHandle, CanvasOp, FailingCamera, RecordingCanvas, ScriptedDecoder, SyntheticCamera,
    SyntheticCameraConfig,
};

// Context and classification
pub use context::{FlightContext, FlightContextHandle, FlightContextStore, FlightType};
pub use freshness::Freshness;

// Overlay
pub use geometry::{Point, Quad};
pub use overlay::{OverlayColor, OverlayPolygon, OverlaySmoother};
pub use render::RenderTarget;
pub use track::{TrackState, TrackedCode};
