//! Camera acquisition
//!
//! Hardware access lives behind a pair of traits so the rest of the
//! pipeline never touches a device API directly. A [`CameraSource`] opens a
//! configured [`CameraStream`]; the stream hands out frames until it is
//! stopped or the device goes away.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Why the camera could not be acquired or kept open.
///
/// Variants map to the distinct operator messages the UI shows; `Failed`
/// covers everything without a better story.
#[derive(Debug, Clone, Error)]
pub enum CameraError {
    /// The operator has not granted camera access.
    #[error("camera access denied")]
    PermissionDenied,
    /// No capture device is present.
    #[error("no camera device available")]
    NoDevice,
    /// The device cannot satisfy the requested configuration.
    #[error("camera does not support the requested mode: {0}")]
    Unsupported(String),
    /// Anything else the device layer reports.
    #[error("camera failure: {0}")]
    Failed(String),
}

/// Which physical camera to prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraFacing {
    /// Rear camera, pointed at the galley cart.
    #[default]
    Rear,
    Front,
}

/// Requested capture mode.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub facing: CameraFacing,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing: CameraFacing::Rear,
            width: 1280,
            height: 720,
            fps: 30,
        }
    }
}

/// One camera frame, pixel data plus its dimensions.
///
/// The pixel format is whatever the source and decoder agreed on; the
/// session only reads the dimensions.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

/// A camera device that can be opened into a frame stream.
#[async_trait]
pub trait CameraSource: Send + Sync {
    /// Acquire the device and start streaming.
    ///
    /// On error no resources stay behind; callers may retry with the same
    /// source. A second open while a stream is live is allowed to fail with
    /// [`CameraError::Failed`].
    async fn open(&self, config: &CameraConfig) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// A live frame stream from an opened camera.
#[async_trait]
pub trait CameraStream: Send {
    /// Next frame, or `None` once the stream has ended.
    async fn next_frame(&mut self) -> Option<CameraFrame>;

    /// Release the device. Idempotent; dropping the stream must release it
    /// too.
    fn stop(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_rear_720p() {
        let config = CameraConfig::default();
        assert_eq!(config.facing, CameraFacing::Rear);
        assert_eq!(config.width, 1280);
        assert_eq!(config.height, 720);
        assert_eq!(config.fps, 30);
    }

    #[test]
    fn error_messages_are_operator_friendly() {
        assert_eq!(
            CameraError::PermissionDenied.to_string(),
            "camera access denied"
        );
        assert_eq!(
            CameraError::NoDevice.to_string(),
            "no camera device available"
        );
        assert_eq!(
            CameraError::Unsupported("4k@120".to_string()).to_string(),
            "camera does not support the requested mode: 4k@120"
        );
        assert_eq!(
            CameraError::Failed("device wedged".to_string()).to_string(),
            "camera failure: device wedged"
        );
    }
}
