//! Synthetic camera platform producing moving test patterns.
//!
//! Models a device with a front and a back camera that share one hardware
//! pipeline: only one stream can be open at a time, a second `open` while a
//! stream is live fails with [`CameraError::DeviceBusy`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::device::{CameraBackend, CameraStream};
use super::types::{
    CameraDescriptor, CameraError, CameraSelector, FacingMode, Frame, FrameFormat, Resolution,
    StreamConstraints,
};

#[derive(Debug, Clone)]
struct PatternCamera {
    descriptor: CameraDescriptor,
    native: Resolution,
}

/// Camera platform backed by generated frames.
#[derive(Debug)]
pub struct TestPatternBackend {
    cameras: Vec<PatternCamera>,
    expose_labels: bool,
    permission_granted: bool,
    claims: Arc<AtomicUsize>,
}

impl Default for TestPatternBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPatternBackend {
    /// A front camera (1280x720) and a back camera (1920x1080).
    pub fn new() -> Self {
        Self {
            cameras: vec![
                PatternCamera {
                    descriptor: CameraDescriptor {
                        id: "pattern-front".to_string(),
                        label: "Front Test Pattern".to_string(),
                        facing: Some(FacingMode::User),
                    },
                    native: Resolution::new(1280, 720),
                },
                PatternCamera {
                    descriptor: CameraDescriptor {
                        id: "pattern-back".to_string(),
                        label: "Back Test Pattern".to_string(),
                        facing: Some(FacingMode::Environment),
                    },
                    native: Resolution::FULL_HD,
                },
            ],
            expose_labels: true,
            permission_granted: true,
            claims: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Report inputs without labels, like a platform that hides them.
    pub fn without_labels(mut self) -> Self {
        self.expose_labels = false;
        self
    }

    /// Refuse every stream request.
    pub fn permission_denied(mut self) -> Self {
        self.permission_granted = false;
        self
    }

    /// Number of streams currently holding the hardware.
    pub fn active_streams(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }

    fn find(&self, selector: &CameraSelector) -> Result<&PatternCamera, CameraError> {
        let found = match selector {
            CameraSelector::Any => self.cameras.first(),
            CameraSelector::Facing(facing) => self
                .cameras
                .iter()
                .find(|c| c.descriptor.facing == Some(*facing)),
            CameraSelector::DeviceId(id) => self.cameras.iter().find(|c| &c.descriptor.id == id),
        };
        found.ok_or_else(|| CameraError::DeviceNotFound(format!("{:?}", selector)))
    }
}

impl CameraBackend for TestPatternBackend {
    fn video_inputs(&self) -> Result<Vec<CameraDescriptor>, CameraError> {
        Ok(self
            .cameras
            .iter()
            .map(|c| CameraDescriptor {
                label: if self.expose_labels {
                    c.descriptor.label.clone()
                } else {
                    String::new()
                },
                ..c.descriptor.clone()
            })
            .collect())
    }

    fn open(&self, constraints: &StreamConstraints) -> Result<Box<dyn CameraStream>, CameraError> {
        if !self.permission_granted {
            return Err(CameraError::PermissionDenied);
        }

        let camera = self.find(&constraints.selector)?;

        if self
            .claims
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CameraError::DeviceBusy(camera.descriptor.id.clone()));
        }

        let resolution = Resolution::new(
            constraints.width.resolve(camera.native.width),
            constraints.height.resolve(camera.native.height),
        );
        log::debug!(
            "Opened test pattern {} at {}",
            camera.descriptor.id,
            resolution
        );

        Ok(Box::new(PatternStream {
            device_id: camera.descriptor.id.clone(),
            resolution,
            claims: Arc::clone(&self.claims),
            active: true,
            frame_index: 0,
        }))
    }
}

struct PatternStream {
    device_id: String,
    resolution: Resolution,
    claims: Arc<AtomicUsize>,
    active: bool,
    frame_index: u64,
}

impl CameraStream for PatternStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        if !self.active {
            return Err(CameraError::ReadFailed(format!(
                "{} has been stopped",
                self.device_id
            )));
        }

        let width = self.resolution.width as usize;
        let height = self.resolution.height as usize;
        let blue = (self.frame_index.wrapping_mul(8) % 256) as u8;
        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            let green = (y * 255 / height.max(1)) as u8;
            for x in 0..width {
                data.extend_from_slice(&[(x * 255 / width.max(1)) as u8, green, blue]);
            }
        }
        self.frame_index += 1;

        Ok(Frame {
            data,
            width: self.resolution.width,
            height: self.resolution.height,
            format: FrameFormat::Rgb,
            timestamp: Instant::now(),
        })
    }

    fn stop(&mut self) {
        if self.active {
            self.active = false;
            self.claims.fetch_sub(1, Ordering::SeqCst);
            log::debug!("Stopped test pattern {}", self.device_id);
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for PatternStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_resolves_resolution_against_native() {
        let backend = TestPatternBackend::new();
        let stream = backend
            .open(&StreamConstraints::capture(CameraSelector::Facing(
                FacingMode::User,
            )))
            .unwrap();
        assert_eq!(stream.resolution(), Resolution::new(1280, 720));
        assert_eq!(stream.device_id(), "pattern-front");
    }

    #[test]
    fn test_second_open_is_busy() {
        let backend = TestPatternBackend::new();
        let _first = backend
            .open(&StreamConstraints::capture(CameraSelector::Any))
            .unwrap();
        let second = backend.open(&StreamConstraints::capture(CameraSelector::Any));
        assert!(matches!(second, Err(CameraError::DeviceBusy(_))));
    }

    #[test]
    fn test_stop_releases_claim() {
        let backend = TestPatternBackend::new();
        let mut stream = backend
            .open(&StreamConstraints::capture(CameraSelector::Any))
            .unwrap();
        assert_eq!(backend.active_streams(), 1);
        stream.stop();
        stream.stop();
        assert_eq!(backend.active_streams(), 0);
        assert!(!stream.is_active());
        assert!(stream.read_frame().is_err());
    }

    #[test]
    fn test_drop_releases_claim() {
        let backend = TestPatternBackend::new();
        {
            let _stream = backend
                .open(&StreamConstraints::capture(CameraSelector::Any))
                .unwrap();
            assert_eq!(backend.active_streams(), 1);
        }
        assert_eq!(backend.active_streams(), 0);
    }

    #[test]
    fn test_frame_is_well_formed() {
        let backend = TestPatternBackend::new();
        let mut stream = backend
            .open(&StreamConstraints::probe(CameraSelector::Any))
            .unwrap();
        let frame = stream.read_frame().unwrap();
        assert_eq!(frame.resolution(), Resolution::new(640, 480));
        assert!(frame.is_well_formed());
    }

    #[test]
    fn test_unknown_device_not_found() {
        let backend = TestPatternBackend::new();
        let result = backend.open(&StreamConstraints::capture(CameraSelector::DeviceId(
            "missing".to_string(),
        )));
        assert!(matches!(result, Err(CameraError::DeviceNotFound(_))));
        assert_eq!(backend.active_streams(), 0);
    }

    #[test]
    fn test_permission_denied() {
        let backend = TestPatternBackend::new().permission_denied();
        let result = backend.open(&StreamConstraints::probe(CameraSelector::Any));
        assert!(matches!(result, Err(CameraError::PermissionDenied)));
    }

    #[test]
    fn test_hidden_labels() {
        let backend = TestPatternBackend::new().without_labels();
        let inputs = backend.video_inputs().unwrap();
        assert_eq!(inputs.len(), 2);
        assert!(inputs.iter().all(|c| c.label.is_empty()));
    }
}
