//! Capture module for camera frames and code detection
//!
//! This module owns the live side of the scanner:
//! - Camera acquisition behind the [`camera::CameraSource`] trait
//! - Optical code detection behind the [`decoder::CodeDecoder`] trait
//! - The scan session tying camera, decoder, and render loop together
//! - Synthetic sources for tests and demos (feature `test-source`)

pub mod camera;
pub mod decoder;
pub mod session;

#[cfg(any(test, feature = "test-source"))]
pub mod test_source;

// Re-export commonly used types
pub use camera::{CameraConfig, CameraError, CameraFrame, CameraSource, CameraStream};
pub use decoder::{CodeDecoder, Detection};
pub use session::{CaptureSession, ProductScan, ScanEvent, SessionConfig};
