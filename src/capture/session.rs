//! Capture session: owns the camera stream for as long as the camera is on.

use std::sync::{Arc, Mutex};

use super::liveness::{Liveness, LivenessToken};
use crate::camera::{
    display_label, CameraBackend, CameraDescriptor, CameraError, CameraStream, FacingMode,
    Resolution, StreamConstraints,
};

/// Slot holding the live stream, shared with the sampler.
///
/// Empty before the first stream opens, while switching cameras, and after
/// the session closes.
pub type StreamSlot = Arc<Mutex<Option<Box<dyn CameraStream>>>>;

/// Errors that can occur when starting a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No cameras available")]
    NoCameras,

    #[error("Camera index {index} out of range ({available} available)")]
    InvalidCamera { index: usize, available: usize },

    #[error(transparent)]
    Camera(#[from] CameraError),
}

/// A running camera.
///
/// Created by [`CaptureSession::open`], torn down by [`CaptureSession::close`]
/// or drop. A closed session is never reused: start a new one instead.
pub struct CaptureSession {
    backend: Arc<dyn CameraBackend>,
    cameras: Vec<CameraDescriptor>,
    active_index: usize,
    facing: Option<FacingMode>,
    stream: StreamSlot,
    liveness: Liveness,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("active_index", &self.active_index)
            .field("facing", &self.facing)
            .field("cameras", &self.cameras.len())
            .field("alive", &self.liveness.is_alive())
            .finish_non_exhaustive()
    }
}

impl CaptureSession {
    /// Start the camera at `index` in `cameras`.
    ///
    /// # Errors
    /// * `SessionError::NoCameras` - If `cameras` is empty
    /// * `SessionError::InvalidCamera` - If `index` is out of range
    /// * `SessionError::Camera` - If the platform refuses the stream
    pub fn open(
        backend: Arc<dyn CameraBackend>,
        cameras: Vec<CameraDescriptor>,
        index: usize,
    ) -> Result<Self, SessionError> {
        if cameras.is_empty() {
            return Err(SessionError::NoCameras);
        }
        if index >= cameras.len() {
            return Err(SessionError::InvalidCamera {
                index,
                available: cameras.len(),
            });
        }

        let camera = &cameras[index];
        let constraints = StreamConstraints::capture(camera.selector());
        log::info!("Starting camera {} with {:?}", camera, constraints);
        let stream = backend.open(&constraints)?;
        log::info!("Camera stream ready at {}", stream.resolution());

        Ok(Self {
            facing: camera.facing,
            backend,
            cameras,
            active_index: index,
            stream: Arc::new(Mutex::new(Some(stream))),
            liveness: Liveness::new(),
        })
    }

    /// Move to the next camera, wrapping around.
    ///
    /// The current stream is stopped before the next one is requested, so
    /// the hardware is never claimed twice. Returns `Ok(false)` without
    /// touching the stream when there is only one camera.
    ///
    /// If the next camera fails to open the session stays on that index with
    /// no stream attached; sampling becomes a no-op until a later switch
    /// succeeds.
    pub fn switch_camera(&mut self) -> Result<bool, CameraError> {
        if self.cameras.len() <= 1 {
            return Ok(false);
        }

        let mut slot = self.stream.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(mut old) = slot.take() {
            old.stop();
        }

        self.active_index = (self.active_index + 1) % self.cameras.len();
        let camera = &self.cameras[self.active_index];
        self.facing = camera.facing;
        log::info!("Switching to camera {}", camera);

        let stream = self
            .backend
            .open(&StreamConstraints::capture(camera.selector()))?;
        *slot = Some(stream);
        Ok(true)
    }

    /// Stop the camera and end the session.
    pub fn close(self) {
        drop(self);
    }

    /// Shared handle to the stream, for the sampler.
    pub fn stream_slot(&self) -> StreamSlot {
        Arc::clone(&self.stream)
    }

    /// Token that dies when this session closes.
    pub fn liveness(&self) -> LivenessToken {
        self.liveness.token()
    }

    pub fn cameras(&self) -> &[CameraDescriptor] {
        &self.cameras
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_camera(&self) -> &CameraDescriptor {
        &self.cameras[self.active_index]
    }

    pub fn facing(&self) -> Option<FacingMode> {
        self.facing
    }

    /// Whether the picture is shown mirrored (front-facing camera).
    pub fn is_mirrored(&self) -> bool {
        self.facing == Some(FacingMode::User)
    }

    /// Label for the active camera.
    pub fn label(&self) -> String {
        display_label(Some(self.active_camera()), self.active_index)
    }

    /// Native resolution of the attached stream, if any.
    pub fn native_resolution(&self) -> Option<Resolution> {
        let slot = self.stream.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref()
            .filter(|s| s.is_active())
            .map(|s| s.resolution())
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.liveness.kill();
        let mut slot = self.stream.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(mut stream) = slot.take() {
            stream.stop();
            log::info!("Stopped camera {}", stream.device_id());
        }
    }
}
